use std::{
  io,
  process::{Child, ChildStderr, ExitStatus},
};

use crate::iter::FfmpegIterator;

/// A wrapper around [`std::process::Child`] containing a spawned FFmpeg command.
/// Provides an iterator over parsed progress updates, warnings and errors.
pub struct FfmpegChild {
  inner: Child,
}

impl FfmpegChild {
  /// Creates an iterator over events emitted by ffmpeg on stderr.
  ///
  /// Can only be called once per child, since it takes ownership of the
  /// stderr pipe.
  pub fn iter(&mut self) -> anyhow::Result<FfmpegIterator> {
    FfmpegIterator::new(self)
  }

  /// Escape hatch to manually control the stderr channel.
  pub fn take_stderr(&mut self) -> Option<ChildStderr> {
    self.inner.stderr.take()
  }

  /// Forcibly terminate the ffmpeg process.
  pub fn kill(&mut self) -> io::Result<()> {
    self.inner.kill()
  }

  /// Waits for the process to exit completely, returning its exit status.
  pub fn wait(&mut self) -> io::Result<ExitStatus> {
    self.inner.wait()
  }

  pub(crate) fn from_inner(inner: Child) -> Self {
    Self { inner }
  }
}
