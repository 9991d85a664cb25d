//! Caption requests and their validation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
  error::{Error, Result},
  style::TOP_OVERLAY,
};

/// One timed caption, visible during `[start_time, end_time)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caption {
  pub text: String,
  pub start_time: f64,
  pub end_time: f64,
}

impl Caption {
  pub fn new<S: Into<String>>(text: S, start_time: f64, end_time: f64) -> Self {
    Self {
      text: text.into(),
      start_time,
      end_time,
    }
  }
}

/// Burn one caption over the whole (optionally trimmed) output.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionRequest {
  pub input: PathBuf,
  pub output: PathBuf,
  pub text: String,
  pub style: String,
  /// Offset into the input where the output starts, in seconds.
  pub start_time: f64,
  /// Length of the output in seconds. `None` runs to the end of the input.
  pub duration: Option<f64>,
  pub fontfile: Option<PathBuf>,
}

impl CaptionRequest {
  pub fn new<I, O, S>(input: I, output: O, text: S) -> Self
  where
    I: Into<PathBuf>,
    O: Into<PathBuf>,
    S: Into<String>,
  {
    Self {
      input: input.into(),
      output: output.into(),
      text: text.into(),
      style: TOP_OVERLAY.to_string(),
      start_time: 0.0,
      duration: None,
      fontfile: None,
    }
  }

  pub fn style<S: Into<String>>(mut self, style: S) -> Self {
    self.style = style.into();
    self
  }

  pub fn start_time(mut self, seconds: f64) -> Self {
    self.start_time = seconds;
    self
  }

  pub fn duration(mut self, seconds: f64) -> Self {
    self.duration = Some(seconds);
    self
  }

  pub fn fontfile<P: Into<PathBuf>>(mut self, path: P) -> Self {
    self.fontfile = Some(path.into());
    self
  }

  /// Checks the text and the trim window.
  pub fn validate(&self) -> Result<()> {
    if self.text.trim().is_empty() {
      return Err(Error::invalid_caption(0, "text is empty"));
    }
    if !self.start_time.is_finite() || self.start_time < 0.0 {
      return Err(Error::invalid_caption(
        0,
        format!("start time {} must be a non-negative number", self.start_time),
      ));
    }
    match self.duration {
      Some(duration) if !duration.is_finite() || duration <= 0.0 => Err(Error::invalid_caption(
        0,
        format!("duration {duration} must be greater than zero"),
      )),
      _ => Ok(()),
    }
  }
}

/// Burn several captions, each in its own visibility window.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiCaptionRequest {
  pub input: PathBuf,
  pub output: PathBuf,
  pub captions: Vec<Caption>,
  pub style: String,
  pub fontfile: Option<PathBuf>,
}

impl MultiCaptionRequest {
  pub fn new<I, O>(input: I, output: O, captions: Vec<Caption>) -> Self
  where
    I: Into<PathBuf>,
    O: Into<PathBuf>,
  {
    Self {
      input: input.into(),
      output: output.into(),
      captions,
      style: TOP_OVERLAY.to_string(),
      fontfile: None,
    }
  }

  pub fn style<S: Into<String>>(mut self, style: S) -> Self {
    self.style = style.into();
    self
  }

  pub fn fontfile<P: Into<PathBuf>>(mut self, path: P) -> Self {
    self.fontfile = Some(path.into());
    self
  }
}

/// Reject the whole batch if any caption is empty or has an empty window.
///
/// ```rust
/// use ffmpeg_captions::caption::{validate_captions, Caption};
///
/// assert!(validate_captions(&[Caption::new("A", 0.0, 3.0)]).is_ok());
/// assert!(validate_captions(&[Caption::new("A", 3.0, 3.0)]).is_err());
/// ```
pub fn validate_captions(captions: &[Caption]) -> Result<()> {
  if captions.is_empty() {
    return Err(Error::invalid_caption(0, "caption list is empty"));
  }

  for (index, caption) in captions.iter().enumerate() {
    if caption.text.trim().is_empty() {
      return Err(Error::invalid_caption(index, "text is empty"));
    }
    if !caption.start_time.is_finite() || !caption.end_time.is_finite() {
      return Err(Error::invalid_caption(index, "times must be finite numbers"));
    }
    if caption.start_time < 0.0 {
      return Err(Error::invalid_caption(
        index,
        format!("start time {} is negative", caption.start_time),
      ));
    }
    if caption.end_time <= caption.start_time {
      return Err(Error::invalid_caption(
        index,
        format!(
          "end time {} must be after start time {}",
          caption.end_time, caption.start_time
        ),
      ));
    }
  }
  Ok(())
}

/// Decode a caption list: a JSON array of `{ text, startTime, endTime }`.
///
/// A malformed entry is reported with its index.
pub fn captions_from_json(json: &str) -> Result<Vec<Caption>> {
  let value: Value = serde_json::from_str(json)
    .map_err(|e| Error::invalid_caption(0, format!("caption list is not valid JSON: {e}")))?;
  let Value::Array(entries) = value else {
    return Err(Error::invalid_caption(0, "caption list must be a JSON array"));
  };

  entries
    .into_iter()
    .enumerate()
    .map(|(index, entry)| {
      serde_json::from_value::<Caption>(entry).map_err(|e| Error::invalid_caption(index, e.to_string()))
    })
    .collect()
}

/// Read and decode a caption list file.
pub fn load_captions(path: &Path) -> Result<Vec<Caption>> {
  let json = std::fs::read_to_string(path)?;
  captions_from_json(&json)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn index_of(err: Error) -> usize {
    match err {
      Error::InvalidCaption { index, .. } => index,
      other => panic!("expected InvalidCaption, got {other:?}"),
    }
  }

  #[test]
  fn test_valid_batch() {
    let captions = vec![Caption::new("A", 0.0, 3.0), Caption::new("B", 3.0, 6.0)];
    assert!(validate_captions(&captions).is_ok());
  }

  #[test]
  fn test_zero_length_window_rejected() {
    let captions = vec![Caption::new("A", 0.0, 3.0), Caption::new("B", 4.0, 4.0)];
    assert_eq!(index_of(validate_captions(&captions).unwrap_err()), 1);
  }

  #[test]
  fn test_reversed_window_rejected() {
    let captions = vec![Caption::new("A", 5.0, 2.0)];
    assert_eq!(index_of(validate_captions(&captions).unwrap_err()), 0);
  }

  #[test]
  fn test_empty_text_rejected() {
    let captions = vec![Caption::new("A", 0.0, 1.0), Caption::new("  ", 1.0, 2.0)];
    assert_eq!(index_of(validate_captions(&captions).unwrap_err()), 1);
  }

  #[test]
  fn test_non_finite_and_negative_rejected() {
    assert!(validate_captions(&[Caption::new("A", f64::NAN, 1.0)]).is_err());
    assert!(validate_captions(&[Caption::new("A", 0.0, f64::INFINITY)]).is_err());
    assert!(validate_captions(&[Caption::new("A", -1.0, 1.0)]).is_err());
    assert!(validate_captions(&[]).is_err());
  }

  #[test]
  fn test_captions_from_json() {
    let json = r#"[
      {"text": "Hello", "startTime": 0, "endTime": 2.5},
      {"text": "World", "startTime": 2.5, "endTime": 5}
    ]"#;
    let captions = captions_from_json(json).unwrap();
    assert_eq!(
      captions,
      vec![Caption::new("Hello", 0.0, 2.5), Caption::new("World", 2.5, 5.0)]
    );
  }

  #[test]
  fn test_captions_from_json_missing_field() {
    let json = r#"[{"text": "ok", "startTime": 0, "endTime": 1}, {"text": "no end", "startTime": 1}]"#;
    let err = captions_from_json(json).unwrap_err();
    assert!(err.to_string().contains("endTime"));
    assert_eq!(index_of(err), 1);
  }

  #[test]
  fn test_captions_from_json_rejects_non_array() {
    assert!(captions_from_json(r#"{"text": "x"}"#).is_err());
    assert!(captions_from_json("not json").is_err());
  }

  #[test]
  fn test_single_request_validation() {
    let request = CaptionRequest::new("in.mp4", "out.mp4", "Hello");
    assert!(request.validate().is_ok());
    assert!(request.clone().duration(0.0).validate().is_err());
    assert!(request.clone().start_time(-2.0).validate().is_err());
    assert!(CaptionRequest::new("in.mp4", "out.mp4", "").validate().is_err());
  }
}
