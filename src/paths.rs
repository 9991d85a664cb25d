use crate::error::Result;
use std::{
  env::{current_exe, var_os},
  ffi::OsStr,
  io,
  path::{Path, PathBuf},
};

/// Environment variable overriding the FFmpeg executable.
pub const FFMPEG_PATH_ENV: &str = "FFMPEG_PATH";

/// Environment variable overriding the FFprobe executable.
pub const FFPROBE_PATH_ENV: &str = "FFPROBE_PATH";

/// Returns the path of the FFmpeg executable, to be used as the argument to
/// `Command::new`.
///
/// Resolution order: the `FFMPEG_PATH` environment variable, then a binary
/// adjacent to the Rust executable, then plain `ffmpeg` from the system path.
pub fn ffmpeg_path() -> PathBuf {
  resolve(FFMPEG_PATH_ENV, "ffmpeg")
}

/// Same resolution as [`ffmpeg_path`] for FFprobe, using `FFPROBE_PATH`.
pub fn ffprobe_path() -> PathBuf {
  resolve(FFPROBE_PATH_ENV, "ffprobe")
}

fn resolve(env_key: &str, name: &str) -> PathBuf {
  if let Some(path) = var_os(env_key).filter(|path| !path.is_empty()) {
    return PathBuf::from(path);
  }
  match sidecar_path(name) {
    Ok(sidecar) if sidecar.exists() => sidecar,
    _ => Path::new(name).to_path_buf(),
  }
}

/// The (expected) path to a binary named `name` adjacent to the Rust binary.
///
/// Windows uses the `.exe` extension, Mac and Linux have no extension.
pub fn sidecar_path<S: AsRef<OsStr>>(name: S) -> Result<PathBuf> {
  let exe = current_exe()?;
  let dir = exe
    .parent()
    .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Can't get parent of current_exe"))?;
  let mut path = dir.join(name.as_ref());
  if cfg!(windows) {
    path.set_extension("exe");
  }
  Ok(path)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_sidecar_path_is_next_to_exe() {
    let path = sidecar_path("ffmpeg").unwrap();
    let exe_dir = current_exe().unwrap().parent().unwrap().to_path_buf();
    assert_eq!(path.parent().unwrap(), exe_dir);
    assert_eq!(path.file_stem().unwrap(), "ffmpeg");
  }
}
