//! Reading frame size and duration with FFprobe.

use std::{
  ffi::OsString,
  path::Path,
  process::{Command, Stdio},
};

use serde::Deserialize;

use crate::{
  error::{Error, Result},
  paths::ffprobe_path,
};

/// Size and length of an input, as seen by the first video stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoGeometry {
  pub width: u32,
  pub height: u32,
  /// Seconds. `0.0` for still images and unknown durations.
  pub duration: f64,
}

/// Looks up the [`VideoGeometry`] of a media file.
pub trait GeometryProber: Send + Sync {
  fn probe(&self, path: &Path) -> Result<VideoGeometry>;
}

/// Runs `ffprobe` and reads its JSON report.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
  exe: OsString,
}

impl Default for FfprobeProber {
  fn default() -> Self {
    Self::new()
  }
}

impl FfprobeProber {
  pub fn new() -> Self {
    Self::with_path(ffprobe_path())
  }

  pub fn with_path<S: Into<OsString>>(path_to_ffprobe_binary: S) -> Self {
    Self {
      exe: path_to_ffprobe_binary.into(),
    }
  }
}

impl GeometryProber for FfprobeProber {
  fn probe(&self, path: &Path) -> Result<VideoGeometry> {
    let output = Command::new(&self.exe)
      .args(["-v", "error", "-select_streams", "v:0"])
      .args(["-show_entries", "stream=width,height,duration:format=duration"])
      .args(["-of", "json"])
      .arg(path)
      .stdin(Stdio::null())
      .output()
      .map_err(|e| Error::Probe(format!("failed to run {}: {e}", self.exe.to_string_lossy())))?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(Error::Probe(format!(
        "ffprobe exited with {}: {}",
        output.status,
        stderr.trim()
      )));
    }

    let geometry = parse_probe_output(&String::from_utf8_lossy(&output.stdout))?;
    tracing::debug!(
      path = %path.display(),
      width = geometry.width,
      height = geometry.height,
      duration = geometry.duration,
      "probed input"
    );
    Ok(geometry)
  }
}

#[derive(Debug, Deserialize)]
struct ProbeReport {
  #[serde(default)]
  streams: Vec<ProbeStream>,
  format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
  width: Option<u32>,
  height: Option<u32>,
  duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
  duration: Option<String>,
}

/// Extract the geometry from `ffprobe -of json` output.
///
/// The container duration wins over the stream duration; both are reported
/// as decimal strings, or omitted for still images.
pub fn parse_probe_output(json: &str) -> Result<VideoGeometry> {
  let report: ProbeReport =
    serde_json::from_str(json).map_err(|e| Error::Probe(format!("unreadable ffprobe output: {e}")))?;
  let stream = report
    .streams
    .into_iter()
    .next()
    .ok_or_else(|| Error::Probe("no video stream found".to_string()))?;

  let (width, height) = match (stream.width, stream.height) {
    (Some(width), Some(height)) if width > 0 && height > 0 => (width, height),
    _ => return Err(Error::Probe("video stream has no frame size".to_string())),
  };

  let duration = report
    .format
    .and_then(|format| format.duration)
    .or(stream.duration)
    .and_then(|duration| duration.parse::<f64>().ok())
    .filter(|duration| duration.is_finite() && *duration > 0.0)
    .unwrap_or(0.0);

  Ok(VideoGeometry {
    width,
    height,
    duration,
  })
}
