use std::{
  ffi::OsStr,
  fmt, io,
  process::{Command, CommandArgs, Stdio},
};

use crate::child::FfmpegChild;

/// A wrapper around [`std::process::Command`] with argument aliases for the
/// handful of `ffmpeg` options a caption render needs.
///
/// Refer to <https://ffmpeg.org/ffmpeg.html> for the exhaustive list of
/// possible arguments.
pub struct FfmpegCommand {
  inner: Command,
}

impl FfmpegCommand {
  //// Generic option aliases
  //// https://ffmpeg.org/ffmpeg.html#Generic-options

  /// alias for `-hide_banner` argument.
  ///
  /// Suppress printing the copyright notice, build options and library
  /// versions.
  pub fn hide_banner(&mut self) -> &mut Self {
    self.arg("-hide_banner");
    self
  }

  //// Main option aliases
  //// https://ffmpeg.org/ffmpeg.html#Main-options

  /// Alias for `-i` argument, the input file path or URL.
  pub fn input<S: AsRef<OsStr>>(&mut self, path_or_url: S) -> &mut Self {
    self.arg("-i");
    self.arg(path_or_url);
    self
  }

  /// Alias for `-y` argument: overwrite output files without asking.
  pub fn overwrite(&mut self) -> &mut Self {
    self.arg("-y");
    self
  }

  /// Alias for `-ss` argument.
  ///
  /// Before `-i`, seeks the input to `seconds`; output timestamps then start
  /// at zero.
  pub fn seek(&mut self, seconds: f64) -> &mut Self {
    self.arg("-ss");
    self.arg(seconds.to_string());
    self
  }

  /// Alias for `-t` argument.
  ///
  /// Before `-i`, limits the duration of data read from the input.
  pub fn duration(&mut self, seconds: f64) -> &mut Self {
    self.arg("-t");
    self.arg(seconds.to_string());
    self
  }

  /// Alias for `-vf` argument: a single-input, single-output video filter chain.
  pub fn video_filter<S: AsRef<str>>(&mut self, filtergraph: S) -> &mut Self {
    self.arg("-vf");
    self.arg(filtergraph.as_ref());
    self
  }

  /// Alias for `-c:a` argument. Use `copy` to pass audio through untouched.
  pub fn codec_audio<S: AsRef<str>>(&mut self, codec: S) -> &mut Self {
    self.arg("-c:a");
    self.arg(codec.as_ref());
    self
  }

  /// Automatically applied in the constructor of `FfmpegCommand`.
  ///
  /// Equivalent to `ffmpeg -loglevel level+info`. The `level` flag prefixes
  /// every log line with its level in square brackets, which the log parser
  /// relies on to tell warnings from errors.
  fn set_expected_loglevel(&mut self) -> &mut Self {
    self.args(["-loglevel", "level+info"]);
    self
  }

  //// `std::process::Command` passthrough methods

  /// Adds an argument to pass to the program.
  pub fn arg<S: AsRef<OsStr>>(&mut self, arg: S) -> &mut Self {
    self.inner.arg(arg.as_ref());
    self
  }

  /// Adds multiple arguments to pass to the program.
  pub fn args<I, S>(&mut self, args: I) -> &mut Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
  {
    for arg in args {
      self.arg(arg.as_ref());
    }
    self
  }

  /// Returns an iterator of the arguments that will be passed to the program.
  pub fn get_args(&self) -> CommandArgs<'_> {
    self.inner.get_args()
  }

  /// The program and its arguments as one line, for logs and progress
  /// reporting. Arguments are lossily converted to UTF-8.
  pub fn command_line(&self) -> String {
    std::iter::once(self.inner.get_program())
      .chain(self.inner.get_args())
      .map(|part| {
        let part = part.to_string_lossy();
        if part.is_empty() || part.contains([' ', '\'', '"']) {
          format!("\"{}\"", part.replace('"', "\\\""))
        } else {
          part.into_owned()
        }
      })
      .collect::<Vec<_>>()
      .join(" ")
  }

  /// Spawn the ffmpeg command as a child process, wrapping it in a
  /// `FfmpegChild` interface.
  pub fn spawn(&mut self) -> io::Result<FfmpegChild> {
    self.inner.spawn().map(FfmpegChild::from_inner)
  }

  //// Constructors
  pub fn new_with_path<S: AsRef<OsStr>>(path_to_ffmpeg_binary: S) -> Self {
    // Only stderr is read; output always goes to a file
    let mut inner = Command::new(&path_to_ffmpeg_binary);
    inner.stdin(Stdio::null());
    inner.stderr(Stdio::piped());
    inner.stdout(Stdio::null());

    let mut ffmpeg_command = Self { inner };
    ffmpeg_command.set_expected_loglevel();
    ffmpeg_command
  }
}

impl fmt::Debug for FfmpegCommand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.inner.fmt(f)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn args(command: &FfmpegCommand) -> Vec<String> {
    command
      .get_args()
      .map(|arg| arg.to_string_lossy().into_owned())
      .collect()
  }

  #[test]
  fn test_expected_loglevel_is_first() {
    let command = FfmpegCommand::new_with_path("ffmpeg");
    assert_eq!(args(&command), vec!["-loglevel", "level+info"]);
  }

  #[test]
  fn test_trimmed_render_args() {
    let mut command = FfmpegCommand::new_with_path("ffmpeg");
    command
      .hide_banner()
      .overwrite()
      .seek(1.5)
      .duration(4.0)
      .input("in.mp4")
      .video_filter("pad=w=iw:h=ih+10:x=0:y=10:color=white")
      .codec_audio("copy")
      .arg("out.mp4");
    assert_eq!(
      args(&command)[2..],
      [
        "-hide_banner",
        "-y",
        "-ss",
        "1.5",
        "-t",
        "4",
        "-i",
        "in.mp4",
        "-vf",
        "pad=w=iw:h=ih+10:x=0:y=10:color=white",
        "-c:a",
        "copy",
        "out.mp4"
      ]
    );
  }

  #[test]
  fn test_command_line_quotes_spaces() {
    let mut command = FfmpegCommand::new_with_path("ffmpeg");
    command.input("my clip.mp4");
    assert_eq!(
      command.command_line(),
      "ffmpeg -loglevel level+info -i \"my clip.mp4\""
    );
  }
}
