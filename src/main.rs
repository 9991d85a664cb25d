use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ffmpeg_captions::{
  caption::{load_captions, CaptionRequest, MultiCaptionRequest},
  event::RenderEvent,
  layout::ScalingPolicy,
  session::CaptionSession,
  style::TOP_OVERLAY,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
  name = "ffmpeg-captions",
  version,
  about = "Burn text captions into videos and images with FFmpeg"
)]
struct Cli {
  #[command(flatten)]
  global: GlobalOptions,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Debug, Parser, Clone)]
struct GlobalOptions {
  /// Show debug logging.
  #[arg(long, global = true)]
  verbose: bool,

  /// Show a progress bar while rendering.
  #[arg(long, global = true)]
  progress: bool,

  /// Frames whose smaller side is below this many pixels get smaller text.
  #[arg(long, global = true)]
  small_threshold: Option<f64>,

  /// Strength of the small-frame shrink.
  #[arg(long, global = true)]
  small_exponent: Option<f64>,
}

#[derive(Debug, Subcommand)]
enum Commands {
  /// Add one caption to a video or image.
  Add {
    /// Input media path.
    input: PathBuf,
    /// Caption text.
    #[arg(long)]
    text: String,
    /// Caption style (see `styles`).
    #[arg(long, default_value = TOP_OVERLAY)]
    style: String,
    /// Start of the output within the input, in seconds.
    #[arg(long, default_value_t = 0.0)]
    start: f64,
    /// Length of the output in seconds.
    #[arg(long)]
    duration: Option<f64>,
    /// Font file for the caption.
    #[arg(long)]
    fontfile: Option<PathBuf>,
    /// Output path. Defaults to `<name>_captioned.<ext>` next to the input.
    #[arg(long, short)]
    output: Option<PathBuf>,
  },

  /// Add timed captions from a JSON list of `{text, startTime, endTime}`.
  Batch {
    /// Input media path.
    input: PathBuf,
    /// Caption list file.
    #[arg(long)]
    captions: PathBuf,
    #[arg(long, default_value = TOP_OVERLAY)]
    style: String,
    #[arg(long)]
    fontfile: Option<PathBuf>,
    #[arg(long, short)]
    output: Option<PathBuf>,
  },

  /// List available caption styles.
  Styles,

  /// Show a style, optionally scaled for a frame size.
  Style {
    name: String,
    #[arg(long, requires = "height")]
    width: Option<u32>,
    #[arg(long, requires = "width")]
    height: Option<u32>,
    /// Print machine-readable JSON.
    #[arg(long)]
    json: bool,
  },
}

fn main() {
  let cli = Cli::parse();
  init_tracing(cli.global.verbose);

  if let Err(e) = run(cli) {
    eprintln!("error: {e:#}");
    std::process::exit(1);
  }
}

fn init_tracing(verbose: bool) {
  let default = if verbose { "debug" } else { "warn" };
  let env_filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
  tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_target(false)
    .with_writer(std::io::stderr)
    .init();
}

fn run(cli: Cli) -> Result<()> {
  let session = CaptionSession::new().with_policy(policy(&cli.global));

  match cli.command {
    Commands::Add {
      input,
      text,
      style,
      start,
      duration,
      fontfile,
      output,
    } => {
      let output = output.unwrap_or_else(|| default_output(&input));
      let mut request = CaptionRequest::new(&input, &output, text)
        .style(style)
        .start_time(start);
      if let Some(duration) = duration {
        request = request.duration(duration);
      }
      if let Some(fontfile) = fontfile {
        request = request.fontfile(fontfile);
      }

      let mut reporter = Reporter::new(cli.global.progress);
      let written = session
        .add_caption(&request, &mut |event: RenderEvent| reporter.handle(event))
        .with_context(|| format!("failed to caption {}", input.display()))?;
      println!("{}", written.display());
    }

    Commands::Batch {
      input,
      captions,
      style,
      fontfile,
      output,
    } => {
      let list = load_captions(&captions)
        .with_context(|| format!("failed to read captions from {}", captions.display()))?;
      let output = output.unwrap_or_else(|| default_output(&input));
      let mut request = MultiCaptionRequest::new(&input, &output, list).style(style);
      if let Some(fontfile) = fontfile {
        request = request.fontfile(fontfile);
      }

      let mut reporter = Reporter::new(cli.global.progress);
      let written = session
        .add_multiple_captions(&request, &mut |event: RenderEvent| reporter.handle(event))
        .with_context(|| format!("failed to caption {}", input.display()))?;
      println!("{}", written.display());
    }

    Commands::Styles => {
      for name in session.list_styles() {
        println!("{name}");
      }
    }

    Commands::Style {
      name,
      width,
      height,
      json,
    } => {
      let Some(style) = session.get_style_config(&name, width, height) else {
        bail!(
          "unknown style '{name}'. Valid styles: {}",
          session.list_styles().join(", ")
        );
      };
      if json {
        println!("{}", serde_json::to_string_pretty(&style)?);
      } else {
        println!("name:          {}", style.name);
        println!("layout:        {}", style.layout);
        println!("scale factor:  {:.3}", style.scale_factor);
        println!("font size:     {}", style.font_size);
        println!("font color:    {}", style.font_color);
        println!("stroke:        {} {}", style.stroke_width, style.stroke_color);
        println!("line spacing:  {}", style.line_spacing);
        if let Some(padding) = style.padding {
          println!("padding:       {padding}");
        }
        println!("background:    {}", style.background_color);
        if let Some(border) = style.box_border_width {
          println!("box border:    {border}");
        }
      }
    }
  }

  Ok(())
}

fn policy(global: &GlobalOptions) -> ScalingPolicy {
  let defaults = ScalingPolicy::default();
  defaults.with_small_video_penalty(
    global
      .small_threshold
      .unwrap_or(defaults.small_video_threshold),
    global
      .small_exponent
      .unwrap_or(defaults.small_video_exponent),
  )
}

/// `<dir>/<stem>_captioned.<ext>`
fn default_output(input: &Path) -> PathBuf {
  let stem = input
    .file_stem()
    .map(|stem| stem.to_string_lossy().into_owned())
    .unwrap_or_else(|| "output".to_string());
  let name = match input.extension() {
    Some(ext) => format!("{stem}_captioned.{}", ext.to_string_lossy()),
    None => format!("{stem}_captioned"),
  };
  input.with_file_name(name)
}

/// Turns render events into a progress bar or log lines.
struct Reporter {
  bar: Option<ProgressBar>,
}

impl Reporter {
  fn new(show_progress: bool) -> Self {
    let bar = show_progress.then(|| {
      let bar = ProgressBar::new(100);
      if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}% {msg}") {
        bar.set_style(style.progress_chars("##-"));
      }
      bar
    });
    Self { bar }
  }

  fn handle(&mut self, event: RenderEvent) {
    match event {
      RenderEvent::Start { command } => {
        tracing::info!(%command, "rendering");
        if let Some(bar) = &self.bar {
          bar.set_message("rendering");
        }
      }
      RenderEvent::Progress { percent } => {
        if let Some(bar) = &self.bar {
          bar.set_position(percent.round() as u64);
        }
      }
      RenderEvent::End => {
        if let Some(bar) = self.bar.take() {
          bar.finish_with_message("done");
        }
      }
      RenderEvent::Error { cause } => {
        if let Some(bar) = self.bar.take() {
          bar.abandon_with_message(cause);
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_output() {
    assert_eq!(
      default_output(Path::new("/videos/clip.mp4")),
      PathBuf::from("/videos/clip_captioned.mp4")
    );
    assert_eq!(
      default_output(Path::new("photo")),
      PathBuf::from("photo_captioned")
    );
  }

  #[test]
  fn test_policy_overrides() {
    let cli = Cli::parse_from(["ffmpeg-captions", "--small-threshold", "500", "styles"]);
    let policy = policy(&cli.global);
    assert_eq!(policy.small_video_threshold, 500.0);
    assert_eq!(policy.small_video_exponent, 1.5);
  }

  #[test]
  fn test_style_dimensions_go_together() {
    assert!(Cli::try_parse_from(["ffmpeg-captions", "style", "top-overlay", "--width", "640"]).is_err());
    assert!(Cli::try_parse_from([
      "ffmpeg-captions",
      "style",
      "top-overlay",
      "--width",
      "640",
      "--height",
      "480"
    ])
    .is_ok());
  }
}
