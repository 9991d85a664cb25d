//! The caption pipeline: validate, probe, wrap, synthesize, render.

use std::{
  fmt,
  path::{Path, PathBuf},
};

use crate::{
  caption::{validate_captions, CaptionRequest, MultiCaptionRequest},
  error::{Error, Result},
  event::RenderEvent,
  ffprobe::{FfprobeProber, GeometryProber, VideoGeometry},
  filter::Visibility,
  layout::ScalingPolicy,
  render::{FfmpegRenderer, RenderJob, Renderer, Trim},
  style::{ScaledStyle, Style, StyleCatalog},
  synth::{synthesize, PlacedCaption},
  text_store::{TempTextStore, TextStore, WrappedText},
};

/// Where a request is in the pipeline. Logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
  Validating,
  ProbingGeometry,
  Wrapping,
  Synthesizing,
  Rendering,
  Succeeded,
  Failed,
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Stage::Validating => "validating",
      Stage::ProbingGeometry => "probing-geometry",
      Stage::Wrapping => "wrapping",
      Stage::Synthesizing => "synthesizing",
      Stage::Rendering => "rendering",
      Stage::Succeeded => "succeeded",
      Stage::Failed => "failed",
    };
    f.write_str(name)
  }
}

fn enter(stage: Stage, input: &Path) {
  tracing::debug!(%stage, input = %input.display(), "caption request");
}

/// Burns captions into media files.
///
/// Holds only read-only configuration and collaborators, so one session can
/// serve concurrent requests. Text files written for a request are removed
/// before the request returns, whether it succeeded or not.
///
/// ```rust,no_run
/// use ffmpeg_captions::{caption::CaptionRequest, event::RenderEvent, session::CaptionSession};
///
/// let session = CaptionSession::new();
/// let request = CaptionRequest::new("clip.mp4", "clip_captioned.mp4", "Hello World!")
///   .style("centered-overlay");
/// session.add_caption(&request, &mut |event: RenderEvent| println!("{event:?}"))?;
/// # Ok::<(), ffmpeg_captions::error::Error>(())
/// ```
pub struct CaptionSession {
  catalog: StyleCatalog,
  policy: ScalingPolicy,
  prober: Box<dyn GeometryProber>,
  renderer: Box<dyn Renderer>,
  text_store: Box<dyn TextStore>,
}

impl Default for CaptionSession {
  fn default() -> Self {
    Self::new()
  }
}

impl CaptionSession {
  /// Built-in styles, default policy, and FFmpeg found through
  /// [`paths`](crate::paths).
  pub fn new() -> Self {
    Self {
      catalog: StyleCatalog::default(),
      policy: ScalingPolicy::default(),
      prober: Box::new(FfprobeProber::new()),
      renderer: Box::new(FfmpegRenderer::new()),
      text_store: Box::new(TempTextStore::new()),
    }
  }

  pub fn with_catalog(mut self, catalog: StyleCatalog) -> Self {
    self.catalog = catalog;
    self
  }

  pub fn with_policy(mut self, policy: ScalingPolicy) -> Self {
    self.policy = policy;
    self
  }

  pub fn with_prober<P: GeometryProber + 'static>(mut self, prober: P) -> Self {
    self.prober = Box::new(prober);
    self
  }

  pub fn with_renderer<R: Renderer + 'static>(mut self, renderer: R) -> Self {
    self.renderer = Box::new(renderer);
    self
  }

  pub fn with_text_store<S: TextStore + 'static>(mut self, text_store: S) -> Self {
    self.text_store = Box::new(text_store);
    self
  }

  pub fn catalog(&self) -> &StyleCatalog {
    &self.catalog
  }

  pub fn policy(&self) -> &ScalingPolicy {
    &self.policy
  }

  /// Burn one caption for the whole output, optionally trimming the input
  /// to `[start_time, start_time + duration)`. Returns the output path.
  pub fn add_caption(
    &self,
    request: &CaptionRequest,
    on_event: &mut dyn FnMut(RenderEvent),
  ) -> Result<PathBuf> {
    let result = self.run_single(request, on_event);
    self.finish(&request.input, result)
  }

  /// Burn several captions, each visible only during its own window.
  /// An invalid caption fails the whole batch before anything is written.
  pub fn add_multiple_captions(
    &self,
    request: &MultiCaptionRequest,
    on_event: &mut dyn FnMut(RenderEvent),
  ) -> Result<PathBuf> {
    let result = self.run_multiple(request, on_event);
    self.finish(&request.input, result)
  }

  pub fn list_styles(&self) -> Vec<String> {
    self.catalog.list()
  }

  /// A style resolved for a frame size, or at its reference metrics when
  /// either dimension is missing. `None` for unknown names.
  pub fn get_style_config(
    &self,
    name: &str,
    video_width: Option<u32>,
    video_height: Option<u32>,
  ) -> Option<ScaledStyle> {
    let style = self.catalog.get(name).ok()?;
    match (video_width, video_height) {
      (Some(width), Some(height)) if width > 0 && height > 0 => {
        Some(self.policy.scaled_style(style, width, height))
      }
      _ => Some(ScaledStyle::from(style)),
    }
  }

  fn run_single(
    &self,
    request: &CaptionRequest,
    on_event: &mut dyn FnMut(RenderEvent),
  ) -> Result<PathBuf> {
    enter(Stage::Validating, &request.input);
    request.validate()?;
    let style = self.catalog.get(&request.style)?;
    check_input(&request.input)?;
    let fontfile = usable_fontfile(request.fontfile.as_deref());

    enter(Stage::ProbingGeometry, &request.input);
    let geometry = self.prober.probe(&request.input)?;

    enter(Stage::Wrapping, &request.input);
    let (scaled, wrap_length) = self.resolve(style, geometry);
    let wrapped = WrappedText::create(self.text_store.as_ref(), &request.text, wrap_length)?;

    enter(Stage::Synthesizing, &request.input);
    let caption = PlacedCaption {
      text: &request.text,
      textfile: wrapped.path(),
      visibility: None,
    };
    let filters = synthesize(&[caption], &scaled, wrap_length, fontfile);

    enter(Stage::Rendering, &request.input);
    let expected_duration = request.duration.or_else(|| {
      (geometry.duration > 0.0).then(|| (geometry.duration - request.start_time).max(0.0))
    });
    let job = RenderJob {
      input: request.input.clone(),
      output: request.output.clone(),
      filters,
      trim: Some(Trim {
        start: request.start_time,
        duration: request.duration,
      }),
      expected_duration,
    };
    self.renderer.render(&job, on_event)?;
    Ok(request.output.clone())
  }

  fn run_multiple(
    &self,
    request: &MultiCaptionRequest,
    on_event: &mut dyn FnMut(RenderEvent),
  ) -> Result<PathBuf> {
    enter(Stage::Validating, &request.input);
    validate_captions(&request.captions)?;
    let style = self.catalog.get(&request.style)?;
    check_input(&request.input)?;
    let fontfile = usable_fontfile(request.fontfile.as_deref());

    enter(Stage::ProbingGeometry, &request.input);
    let geometry = self.prober.probe(&request.input)?;

    enter(Stage::Wrapping, &request.input);
    let (scaled, wrap_length) = self.resolve(style, geometry);
    let wrapped = request
      .captions
      .iter()
      .map(|caption| WrappedText::create(self.text_store.as_ref(), &caption.text, wrap_length))
      .collect::<Result<Vec<_>>>()?;

    enter(Stage::Synthesizing, &request.input);
    let placed: Vec<_> = request
      .captions
      .iter()
      .zip(&wrapped)
      .map(|(caption, text)| PlacedCaption {
        text: &caption.text,
        textfile: text.path(),
        visibility: Some(Visibility {
          start: caption.start_time,
          end: caption.end_time,
        }),
      })
      .collect();
    let filters = synthesize(&placed, &scaled, wrap_length, fontfile);

    enter(Stage::Rendering, &request.input);
    let job = RenderJob {
      input: request.input.clone(),
      output: request.output.clone(),
      filters,
      trim: None,
      expected_duration: (geometry.duration > 0.0).then_some(geometry.duration),
    };
    self.renderer.render(&job, on_event)?;
    Ok(request.output.clone())
  }

  fn resolve(&self, style: &Style, geometry: VideoGeometry) -> (ScaledStyle, usize) {
    let scaled = self
      .policy
      .scaled_style(style, geometry.width, geometry.height);
    let wrap_length = self
      .policy
      .wrap_length(geometry.width, scaled.font_size, self.policy.wrap_padding);
    tracing::debug!(
      style = %scaled.name,
      scale_factor = scaled.scale_factor,
      font_size = scaled.font_size,
      wrap_length,
      "resolved style"
    );
    (scaled, wrap_length)
  }

  fn finish(&self, input: &Path, result: Result<PathBuf>) -> Result<PathBuf> {
    match &result {
      Ok(output) => {
        enter(Stage::Succeeded, input);
        tracing::info!(output = %output.display(), "captions rendered");
      }
      Err(e) => {
        enter(Stage::Failed, input);
        tracing::debug!(error = %e, "caption request failed");
      }
    }
    result
  }
}

impl fmt::Debug for CaptionSession {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CaptionSession")
      .field("catalog", &self.catalog)
      .field("policy", &self.policy)
      .finish_non_exhaustive()
  }
}

fn check_input(input: &Path) -> Result<()> {
  if input.exists() {
    Ok(())
  } else {
    Err(Error::InputNotFound(input.to_path_buf()))
  }
}

/// The font file, if one was given and exists. Checked once per request.
fn usable_fontfile(fontfile: Option<&Path>) -> Option<&Path> {
  let path = fontfile?;
  if path.exists() {
    Some(path)
  } else {
    tracing::warn!(fontfile = %path.display(), "font file not found, using the default font");
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn assert_send_sync<T: Send + Sync>() {}

  #[test]
  fn test_session_is_send_sync() {
    assert_send_sync::<CaptionSession>();
  }

  #[test]
  fn test_stage_names() {
    assert_eq!(Stage::ProbingGeometry.to_string(), "probing-geometry");
    assert_eq!(Stage::Failed.to_string(), "failed");
  }

  #[test]
  fn test_style_config_lookup() {
    let session = CaptionSession::new();
    assert_eq!(session.list_styles(), vec!["top-overlay", "centered-overlay"]);

    let unscaled = session.get_style_config("top-overlay", None, None).unwrap();
    assert_eq!(unscaled.scale_factor, 1.0);
    assert_eq!(unscaled.stroke_width, 2);

    let scaled = session
      .get_style_config("top-overlay", Some(3840), Some(2160))
      .unwrap();
    assert_eq!(scaled.font_size, 96);

    let only_width = session.get_style_config("top-overlay", Some(3840), None).unwrap();
    assert_eq!(only_width.font_size, 48);

    assert!(session.get_style_config("nope", Some(1920), Some(1080)).is_none());
  }

  #[test]
  fn test_missing_fontfile_falls_back() {
    assert_eq!(usable_fontfile(Some(Path::new("/no/such/font.ttf"))), None);
    assert_eq!(usable_fontfile(None), None);
  }
}
