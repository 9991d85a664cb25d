use std::{
  process::ChildStderr,
  sync::mpsc::{sync_channel, Receiver, SyncSender},
  thread::JoinHandle,
};

use anyhow::Context;

use crate::{
  child::FfmpegChild,
  event::FfmpegEvent,
  log_parser::FfmpegLogParser,
};

/// An iterator over events from an ffmpeg process: log lines and progress.
///
/// Ends after [`FfmpegEvent::LogEOF`], once the stderr pipe closes.
pub struct FfmpegIterator {
  rx: Receiver<FfmpegEvent>,
  done: bool,
}

impl FfmpegIterator {
  pub fn new(child: &mut FfmpegChild) -> anyhow::Result<Self> {
    let stderr = child.take_stderr().context("No stderr channel\n - Did you call `take_stderr` elsewhere?\n - Did you forget to call `.stderr(Stdio::piped)` on the `ChildProcess`?")?;
    let (tx, rx) = sync_channel::<FfmpegEvent>(0);
    spawn_stderr_thread(stderr, tx);
    Ok(Self { rx, done: false })
  }
}

impl Iterator for FfmpegIterator {
  type Item = FfmpegEvent;

  fn next(&mut self) -> Option<Self::Item> {
    if self.done {
      return None;
    }
    let item = self.rx.recv().ok();
    if matches!(item, None | Some(FfmpegEvent::LogEOF)) {
      self.done = true;
    }
    item
  }
}

/// Spawn a thread which reads and parses lines from ffmpeg's stderr channel.
/// The cadence is controlled by the synchronous `tx` channel, which blocks
/// until a receiver is ready to receive the next event.
pub fn spawn_stderr_thread(stderr: ChildStderr, tx: SyncSender<FfmpegEvent>) -> JoinHandle<()> {
  std::thread::spawn(move || {
    let mut parser = FfmpegLogParser::new(stderr);
    loop {
      match parser.parse_next_event() {
        Ok(FfmpegEvent::LogEOF) => {
          tx.send(FfmpegEvent::LogEOF).ok();
          break;
        }
        Ok(event) => {
          if tx.send(event).is_err() {
            break;
          }
        }
        Err(e) => {
          tx.send(FfmpegEvent::Error(format!("Error parsing ffmpeg output: {e:#}")))
            .ok();
          tx.send(FfmpegEvent::LogEOF).ok();
          break;
        }
      };
    }
  })
}
