//! Typed drawing primitives and their FFmpeg filtergraph syntax.
//!
//! Synthesis produces a `Vec<FilterPrimitive>`; the text form is only built
//! by [`to_filtergraph`] when the renderer assembles the command line.
//! Order is significant: later primitives draw over earlier ones, and
//! coordinates of a [`TextDraw`] are evaluated against the canvas left by
//! any preceding [`CanvasExpand`].

use std::fmt;
use std::path::PathBuf;

/// One step of the video filter chain.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterPrimitive {
  CanvasExpand(CanvasExpand),
  TextDraw(TextDraw),
}

impl FilterPrimitive {
  pub fn as_canvas_expand(&self) -> Option<&CanvasExpand> {
    match self {
      FilterPrimitive::CanvasExpand(expand) => Some(expand),
      _ => None,
    }
  }

  pub fn as_text_draw(&self) -> Option<&TextDraw> {
    match self {
      FilterPrimitive::TextDraw(draw) => Some(draw),
      _ => None,
    }
  }
}

/// Grow the canvas by `band_height` pixels at the top, shifting the frame
/// down and filling the new band with `color`.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasExpand {
  pub band_height: u32,
  pub color: String,
}

/// Draw the contents of a text file.
#[derive(Debug, Clone, PartialEq)]
pub struct TextDraw {
  pub textfile: PathBuf,
  pub fontfile: Option<PathBuf>,
  pub font_size: u32,
  pub font_color: String,
  /// `0` draws no outline.
  pub stroke_width: u32,
  pub stroke_color: String,
  pub line_spacing: u32,
  pub x: String,
  pub y: String,
  pub text_box: Option<TextBox>,
  /// `None` keeps the text visible for the whole output.
  pub visibility: Option<Visibility>,
}

/// Filled box behind the text, `border_width` pixels larger on each side.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
  pub color: String,
  pub border_width: u32,
}

/// Half-open time window `[start, end)` in seconds of output time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visibility {
  pub start: f64,
  pub end: f64,
}

impl Visibility {
  /// FFmpeg expression that evaluates to 1 inside the window.
  pub fn to_expr(&self) -> String {
    format!("gte(t,{})*lt(t,{})", self.start, self.end)
  }
}

impl fmt::Display for CanvasExpand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "pad=w=iw:h=ih+{band}:x=0:y={band}:color={color}",
      band = self.band_height,
      color = escape_value(&self.color)
    )
  }
}

impl fmt::Display for TextDraw {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "drawtext=")?;
    if let Some(fontfile) = &self.fontfile {
      write!(f, "fontfile={}:", escape_value(&fontfile.to_string_lossy()))?;
    }
    write!(
      f,
      "textfile={}:expansion=none:fontsize={}:fontcolor={}",
      escape_value(&self.textfile.to_string_lossy()),
      self.font_size,
      escape_value(&self.font_color)
    )?;
    if self.stroke_width > 0 {
      write!(
        f,
        ":borderw={}:bordercolor={}",
        self.stroke_width,
        escape_value(&self.stroke_color)
      )?;
    }
    write!(
      f,
      ":line_spacing={}:x='{}':y='{}'",
      self.line_spacing, self.x, self.y
    )?;
    if let Some(text_box) = &self.text_box {
      write!(
        f,
        ":box=1:boxcolor={}:boxborderw={}",
        escape_value(&text_box.color),
        text_box.border_width
      )?;
    }
    if let Some(visibility) = &self.visibility {
      write!(f, ":enable='{}'", visibility.to_expr())?;
    }
    Ok(())
  }
}

impl fmt::Display for FilterPrimitive {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FilterPrimitive::CanvasExpand(expand) => expand.fmt(f),
      FilterPrimitive::TextDraw(draw) => draw.fmt(f),
    }
  }
}

/// Join primitives into a single-input, single-output filter chain for `-vf`.
pub fn to_filtergraph(primitives: &[FilterPrimitive]) -> String {
  primitives
    .iter()
    .map(|primitive| primitive.to_string())
    .collect::<Vec<_>>()
    .join(",")
}

/// Escape a literal option value for a filtergraph.
///
/// Two levels apply: the filter's own option parser (`\`, `'`, `:`) and then
/// the graph parser (`\`, `'`, `[`, `]`, `,`, `;`).
///
/// ```rust
/// use ffmpeg_captions::filter::escape_value;
///
/// assert_eq!(escape_value("/tmp/caption.txt"), "/tmp/caption.txt");
/// assert_eq!(escape_value("C:/fonts/a.ttf"), r"C\\:/fonts/a.ttf");
/// assert_eq!(escape_value("a,b"), r"a\,b");
/// ```
pub fn escape_value(raw: &str) -> String {
  let option_level = escape_chars(&raw.replace('\\', "/"), &['\\', '\'', ':']);
  escape_chars(&option_level, &['\\', '\'', '[', ']', ',', ';'])
}

fn escape_chars(raw: &str, special: &[char]) -> String {
  let mut escaped = String::with_capacity(raw.len() + 8);
  for ch in raw.chars() {
    if special.contains(&ch) {
      escaped.push('\\');
    }
    escaped.push(ch);
  }
  escaped
}
