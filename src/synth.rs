//! Turning wrapped captions and a resolved style into an ordered filter chain.
//!
//! Synthesis is pure: it only reads the text files' paths, never their
//! contents, and performs no I/O.

use std::path::Path;

use crate::{
  filter::{CanvasExpand, FilterPrimitive, TextBox, TextDraw, Visibility},
  layout::text_block_height,
  style::{CaptionLayout, ScaledStyle},
};

/// One caption ready to be drawn.
#[derive(Debug, Clone, Copy)]
pub struct PlacedCaption<'a> {
  /// The caption text, used to estimate its height.
  pub text: &'a str,
  /// File holding the wrapped text.
  pub textfile: &'a Path,
  /// `None` draws the caption for the whole output.
  pub visibility: Option<Visibility>,
}

/// Default vertical anchor for centered captions.
const CENTER_Y: &str = "(h-text_h)/2";

/// Build the filter chain for `captions` in `style`.
///
/// Top-band captions share one band sized for the tallest caption; the
/// [`CanvasExpand`] comes first and every caption is vertically centered in
/// it. Centered captions draw straight onto the frame with a box behind
/// them. Output order follows `captions`.
///
/// ```rust
/// use std::path::Path;
/// use ffmpeg_captions::{
///   layout::ScalingPolicy,
///   style::StyleCatalog,
///   synth::{synthesize, PlacedCaption},
/// };
///
/// let style = StyleCatalog::default()
///   .scaled("top-overlay", 1920, 1080, &ScalingPolicy::default())
///   .unwrap();
/// let caption = PlacedCaption {
///   text: "Hello World!",
///   textfile: Path::new("/tmp/caption.txt"),
///   visibility: None,
/// };
/// let filters = synthesize(&[caption], &style, 63, None);
/// assert_eq!(filters[0].to_string(), "pad=w=iw:h=ih+108:x=0:y=108:color=white");
/// assert_eq!(filters[1].as_text_draw().unwrap().y, "30");
/// ```
pub fn synthesize(
  captions: &[PlacedCaption<'_>],
  style: &ScaledStyle,
  wrap_length: usize,
  fontfile: Option<&Path>,
) -> Vec<FilterPrimitive> {
  if captions.is_empty() {
    return Vec::new();
  }

  match style.layout {
    CaptionLayout::TopBand => top_band(captions, style, wrap_length, fontfile),
    CaptionLayout::Centered => captions
      .iter()
      .map(|caption| {
        let mut draw = text_draw(caption, style, fontfile);
        draw.y = style.y.clone().unwrap_or_else(|| CENTER_Y.to_string());
        draw.text_box = Some(TextBox {
          color: style.background_color.clone(),
          border_width: style.box_border_width.unwrap_or(0),
        });
        FilterPrimitive::TextDraw(draw)
      })
      .collect(),
  }
}

fn top_band(
  captions: &[PlacedCaption<'_>],
  style: &ScaledStyle,
  wrap_length: usize,
  fontfile: Option<&Path>,
) -> Vec<FilterPrimitive> {
  let padding = style.padding.unwrap_or(0);
  let heights: Vec<u32> = captions
    .iter()
    .map(|caption| text_block_height(caption.text, wrap_length, style.font_size, style.line_spacing))
    .collect();
  let tallest = heights.iter().copied().max().unwrap_or(0);
  let band_height = tallest + 2 * padding;

  let mut filters = Vec::with_capacity(captions.len() + 1);
  filters.push(FilterPrimitive::CanvasExpand(CanvasExpand {
    band_height,
    color: style.background_color.clone(),
  }));

  for (caption, height) in captions.iter().zip(heights) {
    let mut draw = text_draw(caption, style, fontfile);
    draw.y = ((band_height - height) / 2).to_string();
    filters.push(FilterPrimitive::TextDraw(draw));
  }
  filters
}

fn text_draw(caption: &PlacedCaption<'_>, style: &ScaledStyle, fontfile: Option<&Path>) -> TextDraw {
  TextDraw {
    textfile: caption.textfile.to_path_buf(),
    fontfile: fontfile.map(Path::to_path_buf),
    font_size: style.font_size,
    font_color: style.font_color.clone(),
    stroke_width: style.stroke_width,
    stroke_color: style.stroke_color.clone(),
    line_spacing: style.line_spacing,
    x: style.x.clone(),
    y: String::new(),
    text_box: None,
    visibility: caption.visibility,
  }
}
