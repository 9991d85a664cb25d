//! Named caption presets and their resolution-adjusted form.

use std::fmt;

use serde::Serialize;

use crate::{
  error::{Error, Result},
  layout::ScalingPolicy,
};

pub const TOP_OVERLAY: &str = "top-overlay";
pub const CENTERED_OVERLAY: &str = "centered-overlay";

/// How a caption is placed on the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaptionLayout {
  /// A solid band is added above the frame and the text is centered in it.
  TopBand,
  /// Text is drawn over the middle of the frame on a filled box.
  Centered,
}

impl fmt::Display for CaptionLayout {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CaptionLayout::TopBand => write!(f, "top-band"),
      CaptionLayout::Centered => write!(f, "centered"),
    }
  }
}

/// A caption preset, expressed at the 1920x1080 reference resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Style {
  pub name: String,
  pub layout: CaptionLayout,
  pub font_size: u32,
  pub font_color: String,
  /// Outline width in pixels. `0` disables the outline.
  pub stroke_width: u32,
  pub stroke_color: String,
  pub line_spacing: u32,
  /// Space above and below the text inside the top band.
  pub padding: Option<u32>,
  /// Band fill for [`CaptionLayout::TopBand`], box fill for [`CaptionLayout::Centered`].
  pub background_color: String,
  pub box_border_width: Option<u32>,
  /// Horizontal position expression.
  pub x: String,
  /// Vertical position expression. `None` when the position is computed
  /// from the band height.
  pub y: Option<String>,
}

/// A [`Style`] resolved against one frame size. Built per request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaledStyle {
  pub name: String,
  pub layout: CaptionLayout,
  pub scale_factor: f64,
  pub font_size: u32,
  pub font_color: String,
  pub stroke_width: u32,
  pub stroke_color: String,
  pub line_spacing: u32,
  pub padding: Option<u32>,
  pub background_color: String,
  pub box_border_width: Option<u32>,
  pub x: String,
  pub y: Option<String>,
}

impl From<&Style> for ScaledStyle {
  /// The style at its reference metrics, with a scale factor of 1.
  fn from(style: &Style) -> Self {
    Self {
      name: style.name.clone(),
      layout: style.layout,
      scale_factor: 1.0,
      font_size: style.font_size,
      font_color: style.font_color.clone(),
      stroke_width: style.stroke_width,
      stroke_color: style.stroke_color.clone(),
      line_spacing: style.line_spacing,
      padding: style.padding,
      background_color: style.background_color.clone(),
      box_border_width: style.box_border_width,
      x: style.x.clone(),
      y: style.y.clone(),
    }
  }
}

/// Read-only set of styles, looked up by name.
///
/// Listing order is insertion order.
#[derive(Debug, Clone)]
pub struct StyleCatalog {
  styles: Vec<Style>,
}

impl Default for StyleCatalog {
  /// The two built-in presets, `top-overlay` and `centered-overlay`.
  fn default() -> Self {
    Self::new(vec![
      Style {
        name: TOP_OVERLAY.to_string(),
        layout: CaptionLayout::TopBand,
        font_size: 48,
        font_color: "black".to_string(),
        stroke_width: 2,
        stroke_color: "white".to_string(),
        line_spacing: 10,
        padding: Some(30),
        background_color: "white".to_string(),
        box_border_width: None,
        x: "(w-text_w)/2".to_string(),
        y: None,
      },
      Style {
        name: CENTERED_OVERLAY.to_string(),
        layout: CaptionLayout::Centered,
        font_size: 48,
        font_color: "white".to_string(),
        stroke_width: 0,
        stroke_color: "black".to_string(),
        line_spacing: 8,
        padding: None,
        background_color: "black@0.6".to_string(),
        box_border_width: Some(12),
        x: "(w-text_w)/2".to_string(),
        y: Some("(h-text_h)/2".to_string()),
      },
    ])
  }
}

impl StyleCatalog {
  pub fn new(styles: Vec<Style>) -> Self {
    Self { styles }
  }

  /// Look up a style by name.
  ///
  /// ```rust
  /// use ffmpeg_captions::style::StyleCatalog;
  ///
  /// let catalog = StyleCatalog::default();
  /// assert_eq!(catalog.get("top-overlay").unwrap().font_size, 48);
  ///
  /// let err = catalog.get("subtitle").unwrap_err();
  /// assert!(err.to_string().contains("top-overlay, centered-overlay"));
  /// ```
  pub fn get(&self, name: &str) -> Result<&Style> {
    self
      .styles
      .iter()
      .find(|style| style.name == name)
      .ok_or_else(|| Error::UnknownStyle {
        name: name.to_string(),
        valid: self.list(),
      })
  }

  pub fn list(&self) -> Vec<String> {
    self.styles.iter().map(|style| style.name.clone()).collect()
  }

  /// [`StyleCatalog::get`] followed by [`ScalingPolicy::scaled_style`].
  pub fn scaled(
    &self,
    name: &str,
    video_width: u32,
    video_height: u32,
    policy: &ScalingPolicy,
  ) -> Result<ScaledStyle> {
    let style = self.get(name)?;
    Ok(policy.scaled_style(style, video_width, video_height))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_list_is_stable() {
    let catalog = StyleCatalog::default();
    assert_eq!(catalog.list(), vec!["top-overlay", "centered-overlay"]);
    assert_eq!(catalog.list(), catalog.list());
  }

  #[test]
  fn test_unknown_style_names_valid_choices() {
    let catalog = StyleCatalog::default();
    match catalog.get("bottom-overlay") {
      Err(Error::UnknownStyle { name, valid }) => {
        assert_eq!(name, "bottom-overlay");
        assert_eq!(valid, vec!["top-overlay", "centered-overlay"]);
      }
      other => panic!("expected UnknownStyle, got {other:?}"),
    }
  }

  #[test]
  fn test_builtin_layouts() {
    let catalog = StyleCatalog::default();
    let top = catalog.get(TOP_OVERLAY).unwrap();
    assert_eq!(top.layout, CaptionLayout::TopBand);
    assert!(top.padding.is_some());
    assert!(top.box_border_width.is_none());

    let centered = catalog.get(CENTERED_OVERLAY).unwrap();
    assert_eq!(centered.layout, CaptionLayout::Centered);
    assert!(centered.padding.is_none());
    assert!(centered.box_border_width.is_some());
    assert_eq!(centered.stroke_width, 0);
  }

  #[test]
  fn test_scaled_composes_lookup_and_scaling() {
    let catalog = StyleCatalog::default();
    let policy = ScalingPolicy::default();
    let scaled = catalog.scaled(TOP_OVERLAY, 3840, 2160, &policy).unwrap();
    assert_eq!(scaled.font_size, 96);
    assert!(catalog.scaled("nope", 1920, 1080, &policy).is_err());
  }

  #[test]
  fn test_unscaled_keeps_reference_metrics() {
    let top = StyleCatalog::default().get(TOP_OVERLAY).unwrap().clone();
    let unscaled = ScaledStyle::from(&top);
    assert_eq!(unscaled.scale_factor, 1.0);
    assert_eq!(unscaled.font_size, 48);
    assert_eq!(unscaled.stroke_width, 2);
    assert_eq!(unscaled.padding, Some(30));
  }

  #[test]
  fn test_custom_catalog() {
    let mut style = StyleCatalog::default().get(TOP_OVERLAY).unwrap().clone();
    style.name = "banner".to_string();
    let catalog = StyleCatalog::new(vec![style]);
    assert_eq!(catalog.list(), vec!["banner"]);
    assert!(catalog.get(TOP_OVERLAY).is_err());
  }
}
