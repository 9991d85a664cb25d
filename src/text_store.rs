//! Temporary files holding wrapped caption text.
//!
//! `drawtext` reads multi-line text from a file, so every caption is written
//! out before rendering. A [`WrappedText`] owns one such file and removes it
//! when dropped, whichever way the request ends.

use std::{
  io::Write,
  path::{Path, PathBuf},
};

use crate::{error::Result, wrap::wrap};

/// Where caption text files are created and removed.
pub trait TextStore: Send + Sync {
  /// Persist `content` and return a path the renderer can read.
  fn create(&self, content: &str) -> Result<PathBuf>;

  fn delete(&self, path: &Path) -> Result<()>;
}

/// Stores text in the system temp directory, or in a chosen directory.
#[derive(Debug, Clone, Default)]
pub struct TempTextStore {
  dir: Option<PathBuf>,
}

impl TempTextStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn in_dir<P: Into<PathBuf>>(dir: P) -> Self {
    Self {
      dir: Some(dir.into()),
    }
  }
}

impl TextStore for TempTextStore {
  fn create(&self, content: &str) -> Result<PathBuf> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("caption-").suffix(".txt");
    let mut file = match &self.dir {
      Some(dir) => builder.tempfile_in(dir)?,
      None => builder.tempfile()?,
    };
    file.write_all(content.as_bytes())?;
    file.flush()?;
    let path = file.into_temp_path().keep().map_err(|e| e.error)?;
    Ok(path)
  }

  fn delete(&self, path: &Path) -> Result<()> {
    std::fs::remove_file(path)?;
    Ok(())
  }
}

/// A caption wrapped into lines and written to the store.
///
/// The file is deleted on drop. Deletion failures are logged, never raised.
pub struct WrappedText<'a> {
  store: &'a dyn TextStore,
  path: PathBuf,
}

impl<'a> WrappedText<'a> {
  pub fn create(store: &'a dyn TextStore, text: &str, wrap_length: usize) -> Result<Self> {
    let lines = wrap(text, wrap_length);
    let path = store.create(&lines.join("\n"))?;
    tracing::debug!(path = %path.display(), lines = lines.len(), "wrote caption text");
    Ok(Self { store, path })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl Drop for WrappedText<'_> {
  fn drop(&mut self) {
    match self.store.delete(&self.path) {
      Ok(()) => tracing::debug!(path = %self.path.display(), "removed caption text"),
      Err(e) => tracing::warn!(
        path = %self.path.display(),
        error = %e,
        "failed to remove caption text file"
      ),
    }
  }
}

impl std::fmt::Debug for WrappedText<'_> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("WrappedText")
      .field("path", &self.path)
      .finish()
  }
}
