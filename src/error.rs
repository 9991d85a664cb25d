use std::io;
use std::path::PathBuf;
use std::result::Result as StdResult;

use thiserror::Error;

/// Shorthand alias for `Result<T, Error>` using the `ffmpeg_captions` error type.
pub type Result<T> = StdResult<T, Error>;

/// Every way a caption request can fail.
///
/// Collaborator failures (probing, rendering) carry the message reported by
/// the collaborator verbatim.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
  /// The input media path does not exist. Checked before any probing.
  #[error("Input file not found: {}", .0.display())]
  InputNotFound(PathBuf),

  /// The style name is not in the catalog.
  #[error("Unknown style '{name}'. Valid styles: {}", .valid.join(", "))]
  UnknownStyle { name: String, valid: Vec<String> },

  /// A caption in a batch is missing fields or has an empty window.
  #[error("Invalid caption at index {index}: {reason}")]
  InvalidCaption { index: usize, reason: String },

  /// The geometry prober failed, or found no video stream.
  #[error("Probe failed: {0}")]
  Probe(String),

  /// The rendering engine failed.
  #[error("Render failed: {0}")]
  Render(String),

  #[error("I/O error: {0}")]
  Io(#[from] io::Error),
}

impl Error {
  pub fn invalid_caption<S: Into<String>>(index: usize, reason: S) -> Self {
    Error::InvalidCaption {
      index,
      reason: reason.into(),
    }
  }
}
