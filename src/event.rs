/// A parsed line of FFmpeg's stderr, or a condition reported by the reader.
#[derive(Debug, Clone, PartialEq)]
pub enum FfmpegEvent {
  Log(LogLevel, String),
  Progress(FfmpegProgress),
  LogEOF,
  /// An error that didn't originate from the ffmpeg logs
  Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
  Info,
  Warning,
  Error,
  Fatal,
  Unknown,
}

impl LogLevel {
  pub fn is_error(&self) -> bool {
    matches!(self, LogLevel::Error | LogLevel::Fatal)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FfmpegProgress {
  /// index of the current output frame
  pub frame: u32,

  /// frames per second
  pub fps: f32,

  /// The raw time string in a format like `00:03:29.04`
  pub time: String,

  /// Processing speed as a ratio of the input duration
  pub speed: f32,
}

/// What a [`Renderer`](crate::render::Renderer) reports while it works.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
  /// Rendering began; `command` describes the engine invocation.
  Start { command: String },
  /// Share of the expected output already written, 0 to 100.
  Progress { percent: f64 },
  End,
  Error { cause: String },
}
