//! Burn captions into video with a standalone FFmpeg binary.
//!
//! Caption layout is worked out without font metrics: text is wrapped to a
//! character budget derived from the frame width, styles are scaled to the
//! frame size, and the result is expressed as an ordered chain of typed
//! filter primitives that FFmpeg renders.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ffmpeg_captions::{
//!   caption::{Caption, MultiCaptionRequest},
//!   error::Result,
//!   event::RenderEvent,
//!   session::CaptionSession,
//! };
//!
//! fn main() -> Result<()> {
//!   let captions = vec![
//!     Caption::new("First", 0.0, 3.0),
//!     Caption::new("Second", 3.0, 6.0),
//!   ];
//!   let request = MultiCaptionRequest::new("clip.mp4", "clip_captioned.mp4", captions)
//!     .style("centered-overlay");
//!
//!   CaptionSession::new() // <- ffprobe + ffmpeg found via FFMPEG_PATH, sidecar or PATH
//!     .add_multiple_captions(&request, &mut |event: RenderEvent| {
//!       if let RenderEvent::Progress { percent } = event {
//!         eprintln!("{percent:.0}%");
//!       }
//!     })?;
//!   Ok(())
//! }
//! ```
//!


pub mod caption;
pub mod child;
pub mod command;
pub mod error;
pub mod event;
pub mod ffprobe;
pub mod filter;
pub mod iter;
pub mod layout;
pub mod log_parser;
pub mod paths;
pub mod render;
pub mod session;
pub mod style;
pub mod synth;
pub mod text_store;
pub mod wrap;
