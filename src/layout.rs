//! Resolution-aware layout estimates.
//!
//! Text geometry is estimated without font metrics: every glyph is assumed
//! to be `0.6 × font size` wide. The same heuristic drives both the wrap
//! budget and the height of the band reserved for a caption, so the output
//! matches across runs and machines regardless of installed fonts.

use crate::{
  style::{CaptionLayout, ScaledStyle, Style},
  wrap::line_count,
};

/// Tuning constants for the layout heuristics.
///
/// The small-video threshold and exponent are empirical; both can be
/// overridden from the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingPolicy {
  /// Reference frame width at which style metrics apply unscaled.
  pub reference_width: u32,
  /// Reference frame height at which style metrics apply unscaled.
  pub reference_height: u32,
  /// Frames whose smaller side is below this many pixels get an extra shrink.
  pub small_video_threshold: f64,
  /// Exponent of the extra shrink, `(min_side / threshold) ^ exponent`.
  pub small_video_exponent: f64,
  pub min_factor: f64,
  pub max_factor: f64,
  /// Average glyph width as a fraction of the font size.
  pub char_width_ratio: f64,
  pub min_wrap_chars: usize,
  pub max_wrap_chars: usize,
  /// Horizontal padding on each side used when computing the wrap budget.
  pub wrap_padding: u32,
}

impl Default for ScalingPolicy {
  fn default() -> Self {
    Self {
      reference_width: 1920,
      reference_height: 1080,
      small_video_threshold: 700.0,
      small_video_exponent: 1.5,
      min_factor: 0.3,
      max_factor: 3.0,
      char_width_ratio: 0.6,
      min_wrap_chars: 15,
      max_wrap_chars: 80,
      wrap_padding: 40,
    }
  }
}

impl ScalingPolicy {
  /// Override the small-video penalty.
  pub fn with_small_video_penalty(mut self, threshold: f64, exponent: f64) -> Self {
    self.small_video_threshold = threshold;
    self.small_video_exponent = exponent;
    self
  }

  /// Multiplier applied to a style's reference metrics for a frame of the
  /// given size.
  ///
  /// Centered captions are positioned with FFmpeg's own centering
  /// expressions and are never scaled.
  ///
  /// ```rust
  /// use ffmpeg_captions::{layout::ScalingPolicy, style::CaptionLayout};
  ///
  /// let policy = ScalingPolicy::default();
  /// assert_eq!(policy.scale_factor(1920, 1080, CaptionLayout::TopBand), 1.0);
  /// assert_eq!(policy.scale_factor(3840, 2160, CaptionLayout::TopBand), 2.0);
  /// assert_eq!(policy.scale_factor(320, 240, CaptionLayout::Centered), 1.0);
  /// ```
  pub fn scale_factor(&self, video_width: u32, video_height: u32, layout: CaptionLayout) -> f64 {
    match layout {
      CaptionLayout::Centered => 1.0,
      CaptionLayout::TopBand => self.resolution_factor(video_width, video_height),
    }
  }

  fn resolution_factor(&self, video_width: u32, video_height: u32) -> f64 {
    let area = f64::from(video_width) * f64::from(video_height);
    let reference_area = f64::from(self.reference_width) * f64::from(self.reference_height);
    let mut factor = (area / reference_area).sqrt();

    let min_side = f64::from(video_width.min(video_height));
    if min_side < self.small_video_threshold {
      factor *= (min_side / self.small_video_threshold).powf(self.small_video_exponent);
    }

    factor.clamp(self.min_factor, self.max_factor)
  }

  /// Resolve `style` against a frame size.
  ///
  /// Font size never drops below 1. An enabled stroke never drops below 1
  /// and a box border never below 2; a zero base stroke stays disabled.
  pub fn scaled_style(&self, style: &Style, video_width: u32, video_height: u32) -> ScaledStyle {
    let factor = self.scale_factor(video_width, video_height, style.layout);
    let scale = |value: u32, k: f64| (f64::from(value) * factor * k).round() as u32;

    ScaledStyle {
      name: style.name.clone(),
      layout: style.layout,
      scale_factor: factor,
      font_size: scale(style.font_size, 1.0).max(1),
      font_color: style.font_color.clone(),
      stroke_width: match style.stroke_width {
        0 => 0,
        width => scale(width, 0.7).max(1),
      },
      stroke_color: style.stroke_color.clone(),
      line_spacing: scale(style.line_spacing, 1.0),
      padding: style.padding.map(|padding| scale(padding, 1.0)),
      background_color: style.background_color.clone(),
      box_border_width: style.box_border_width.map(|border| scale(border, 0.8).max(2)),
      x: style.x.clone(),
      y: style.y.clone(),
    }
  }

  /// Characters that fit on one line of a `video_width` frame at `font_size`,
  /// leaving `padding` pixels on each side. Clamped to the policy's wrap range.
  ///
  /// ```rust
  /// use ffmpeg_captions::layout::ScalingPolicy;
  ///
  /// let policy = ScalingPolicy::default();
  /// // (1920 - 80) / (0.6 * 48) = 63.9
  /// assert_eq!(policy.wrap_length(1920, 48, 40), 63);
  /// assert_eq!(policy.wrap_length(100, 48, 40), 15);
  /// assert_eq!(policy.wrap_length(7680, 12, 40), 80);
  /// ```
  pub fn wrap_length(&self, video_width: u32, font_size: u32, padding: u32) -> usize {
    let char_width = self.char_width_ratio * f64::from(font_size);
    let usable = f64::from(video_width) - 2.0 * f64::from(padding);
    let chars = if char_width > 0.0 {
      (usable / char_width).floor()
    } else {
      f64::INFINITY
    };

    if chars <= self.min_wrap_chars as f64 {
      self.min_wrap_chars
    } else if chars >= self.max_wrap_chars as f64 {
      self.max_wrap_chars
    } else {
      chars as usize
    }
  }
}

/// Pixel height of `text` once wrapped at `wrap_length` characters.
///
/// ```rust
/// use ffmpeg_captions::layout::text_block_height;
///
/// assert_eq!(text_block_height("one line", 20, 48, 10), 48);
/// assert_eq!(text_block_height("two words", 4, 48, 10), 106);
/// ```
pub fn text_block_height(text: &str, wrap_length: usize, font_size: u32, line_spacing: u32) -> u32 {
  let lines = line_count(text, wrap_length) as u32;
  lines * font_size + lines.saturating_sub(1) * line_spacing
}
