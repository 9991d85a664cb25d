//! Handing a synthesized filter chain to the rendering engine.

use std::{ffi::OsString, path::PathBuf};

use crate::{
  child::FfmpegChild,
  command::FfmpegCommand,
  error::{Error, Result},
  event::{FfmpegEvent, RenderEvent},
  filter::{to_filtergraph, FilterPrimitive},
  iter::FfmpegIterator,
  log_parser::parse_time_str,
  paths::ffmpeg_path,
};

/// Input window for single-caption renders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trim {
  pub start: f64,
  /// `None` runs to the end of the input.
  pub duration: Option<f64>,
}

/// Everything the engine needs for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderJob {
  pub input: PathBuf,
  pub output: PathBuf,
  /// Applied in order; never reordered.
  pub filters: Vec<FilterPrimitive>,
  pub trim: Option<Trim>,
  /// Length of the output in seconds, used to turn progress into a
  /// percentage. `None` when unknown (still images).
  pub expected_duration: Option<f64>,
}

/// The rendering engine.
///
/// Implementations report [`RenderEvent::Start`] before doing any work, then
/// any number of [`RenderEvent::Progress`], and finally exactly one of
/// [`RenderEvent::End`] or [`RenderEvent::Error`].
pub trait Renderer: Send + Sync {
  fn render(&self, job: &RenderJob, on_event: &mut dyn FnMut(RenderEvent)) -> Result<()>;
}

/// Renders with an FFmpeg executable.
#[derive(Debug, Clone)]
pub struct FfmpegRenderer {
  exe: OsString,
}

impl Default for FfmpegRenderer {
  fn default() -> Self {
    Self::new()
  }
}

impl FfmpegRenderer {
  pub fn new() -> Self {
    Self::with_path(ffmpeg_path())
  }

  pub fn with_path<S: Into<OsString>>(path_to_ffmpeg_binary: S) -> Self {
    Self {
      exe: path_to_ffmpeg_binary.into(),
    }
  }

  /// The ffmpeg invocation for `job`. Audio is copied untouched and the
  /// output is overwritten.
  pub fn command(&self, job: &RenderJob) -> FfmpegCommand {
    let mut command = FfmpegCommand::new_with_path(&self.exe);
    command.hide_banner().overwrite();
    if let Some(trim) = &job.trim {
      if trim.start > 0.0 {
        command.seek(trim.start);
      }
      if let Some(duration) = trim.duration {
        command.duration(duration);
      }
    }
    command.input(&job.input);
    if !job.filters.is_empty() {
      command.video_filter(to_filtergraph(&job.filters));
    }
    command.codec_audio("copy").arg(&job.output);
    command
  }

  fn run(
    &self,
    command: &mut FfmpegCommand,
    expected_duration: Option<f64>,
    on_event: &mut dyn FnMut(RenderEvent),
  ) -> Result<()> {
    let mut child = command
      .spawn()
      .map_err(|e| Error::Render(format!("failed to start {}: {e}", self.exe.to_string_lossy())))?;
    let events = event_stream(&mut child)?;

    let mut errors = Vec::new();
    for event in events {
      match event {
        FfmpegEvent::Progress(progress) => {
          tracing::trace!(
            frame = progress.frame,
            fps = progress.fps,
            speed = progress.speed,
            time = %progress.time,
            "ffmpeg progress"
          );
          if let Some(percent) = progress_percent(&progress.time, expected_duration) {
            on_event(RenderEvent::Progress { percent });
          }
        }
        FfmpegEvent::Log(level, line) if level.is_error() => {
          tracing::debug!(%line, "ffmpeg reported an error");
          errors.push(strip_level(&line).to_string());
        }
        FfmpegEvent::Error(e) => errors.push(e),
        _ => {}
      }
    }

    let status = child
      .wait()
      .map_err(|e| Error::Render(format!("failed to wait for ffmpeg: {e}")))?;
    if status.success() {
      Ok(())
    } else if errors.is_empty() {
      Err(Error::Render(format!("ffmpeg exited with {status}")))
    } else {
      Err(Error::Render(errors.join("\n")))
    }
  }
}

impl Renderer for FfmpegRenderer {
  fn render(&self, job: &RenderJob, on_event: &mut dyn FnMut(RenderEvent)) -> Result<()> {
    let mut command = self.command(job);
    let command_line = command.command_line();
    tracing::debug!(command = %command_line, "starting ffmpeg");
    on_event(RenderEvent::Start {
      command: command_line,
    });

    let result = self.run(&mut command, job.expected_duration, on_event);
    match &result {
      Ok(()) => on_event(RenderEvent::End),
      Err(e) => on_event(RenderEvent::Error {
        cause: e.to_string(),
      }),
    }
    result
  }
}

/// Events from `child`'s stderr. If they can't be read, the child is killed
/// and reaped before the error is returned.
fn event_stream(child: &mut FfmpegChild) -> Result<FfmpegIterator> {
  match child.iter() {
    Ok(events) => Ok(events),
    Err(e) => {
      if let Err(kill_error) = child.kill() {
        tracing::debug!(error = %kill_error, "failed to kill ffmpeg");
      }
      if let Err(wait_error) = child.wait() {
        tracing::debug!(error = %wait_error, "failed to reap ffmpeg");
      }
      Err(Error::Render(format!("{e:#}")))
    }
  }
}

/// Percentage of `expected_duration` covered by a progress `time=` value.
pub fn progress_percent(time: &str, expected_duration: Option<f64>) -> Option<f64> {
  let expected = expected_duration.filter(|d| *d > 0.0)?;
  let elapsed = parse_time_str(time)?;
  Some((elapsed / expected * 100.0).clamp(0.0, 100.0))
}

/// The message after the `[error]` / `[fatal]` marker, dropping any
/// `[Parsed_drawtext_0 @ 0x..]` context before it.
fn strip_level(line: &str) -> &str {
  ["[error]", "[fatal]"]
    .iter()
    .find_map(|marker| line.find(marker).map(|at| &line[at + marker.len()..]))
    .unwrap_or(line)
    .trim()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::filter::CanvasExpand;

  fn job(trim: Option<Trim>) -> RenderJob {
    RenderJob {
      input: PathBuf::from("in.mp4"),
      output: PathBuf::from("out.mp4"),
      filters: vec![FilterPrimitive::CanvasExpand(CanvasExpand {
        band_height: 120,
        color: "white".to_string(),
      })],
      trim,
      expected_duration: Some(10.0),
    }
  }

  fn args(command: &FfmpegCommand) -> Vec<String> {
    command
      .get_args()
      .map(|arg| arg.to_string_lossy().into_owned())
      .collect()
  }

  #[test]
  fn test_command_without_trim() {
    let renderer = FfmpegRenderer::with_path("ffmpeg");
    let args = args(&renderer.command(&job(None)));
    assert!(!args.contains(&"-ss".to_string()));
    assert!(!args.contains(&"-t".to_string()));
    let vf = args.iter().position(|a| a == "-vf").unwrap();
    assert_eq!(args[vf + 1], "pad=w=iw:h=ih+120:x=0:y=120:color=white");
    assert_eq!(args.last().unwrap(), "out.mp4");
  }

  #[test]
  fn test_trim_precedes_input() {
    let renderer = FfmpegRenderer::with_path("ffmpeg");
    let trim = Trim {
      start: 2.0,
      duration: Some(3.0),
    };
    let args = args(&renderer.command(&job(Some(trim))));
    let ss = args.iter().position(|a| a == "-ss").unwrap();
    let t = args.iter().position(|a| a == "-t").unwrap();
    let i = args.iter().position(|a| a == "-i").unwrap();
    assert!(ss < i && t < i);
    assert_eq!(args[ss + 1], "2");
    assert_eq!(args[t + 1], "3");
  }

  #[test]
  fn test_zero_start_is_not_a_seek() {
    let renderer = FfmpegRenderer::with_path("ffmpeg");
    let trim = Trim {
      start: 0.0,
      duration: None,
    };
    let args = args(&renderer.command(&job(Some(trim))));
    assert!(!args.contains(&"-ss".to_string()));
  }

  #[test]
  fn test_progress_percent() {
    assert_eq!(progress_percent("00:00:05.00", Some(10.0)), Some(50.0));
    assert_eq!(progress_percent("00:00:12.00", Some(10.0)), Some(100.0));
    assert_eq!(progress_percent("N/A", Some(10.0)), None);
    assert_eq!(progress_percent("00:00:01.00", None), None);
    assert_eq!(progress_percent("00:00:01.00", Some(0.0)), None);
  }

  #[test]
  fn test_missing_binary_reports_error_event() {
    let renderer = FfmpegRenderer::with_path("/definitely/not/ffmpeg");
    let mut events = Vec::new();
    let result = renderer.render(&job(None), &mut |event: RenderEvent| events.push(event));
    assert!(matches!(result, Err(Error::Render(_))));
    assert!(matches!(events.first(), Some(RenderEvent::Start { .. })));
    assert!(matches!(events.last(), Some(RenderEvent::Error { .. })));
    assert_eq!(events.len(), 2);
  }

  #[test]
  fn test_strip_level() {
    assert_eq!(strip_level("[error] No such filter: 'foo'"), "No such filter: 'foo'");
    assert_eq!(strip_level("plain"), "plain");
    assert_eq!(
      strip_level("[Parsed_drawtext_0 @ 0x6000025c8000] [error] Cannot find a valid font"),
      "Cannot find a valid font"
    );
    assert_eq!(
      strip_level("[AVFilterGraph @ 0x600] [fatal] No such filter: 'x'"),
      "No such filter: 'x'"
    );
  }

  #[test]
  fn test_unreadable_stderr_reaps_child() {
    // The test binary rejects ffmpeg's arguments and exits straight away
    let exe = std::env::current_exe().unwrap();
    let mut child = FfmpegCommand::new_with_path(exe).spawn().unwrap();
    child.take_stderr();

    match event_stream(&mut child) {
      Err(Error::Render(message)) => assert!(message.contains("No stderr channel")),
      Err(other) => panic!("expected render error, got {other:?}"),
      Ok(_) => panic!("expected render error"),
    }
    assert!(child.wait().is_ok());
  }
}
