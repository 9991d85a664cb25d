//! Internal methods for parsing FFmpeg CLI log output.

use std::io::{BufRead, BufReader, ErrorKind, Read};

use anyhow::Context;

use crate::event::{FfmpegEvent, FfmpegProgress, LogLevel};

pub struct FfmpegLogParser<R: Read> {
  reader: BufReader<R>,
}

impl<R: Read> FfmpegLogParser<R> {
  /// Consume one line from the inner reader and classify it.
  ///
  /// Line endings can be marked by three possible delimiters:
  /// - `\n` (MacOS, Linux),
  /// - `\r\n` (Windows)
  /// - `\r` (progress updates which overwrite the previous line)
  pub fn parse_next_event(&mut self) -> anyhow::Result<FfmpegEvent> {
    let mut buf = Vec::<u8>::new();
    let bytes_read = read_line(&mut self.reader, &mut buf).context("Failed to read ffmpeg stderr")?;
    if bytes_read == 0 {
      return Ok(FfmpegEvent::LogEOF);
    }

    let line = String::from_utf8_lossy(&buf);
    let line = line.trim();
    if let Some(progress) = try_parse_progress(line) {
      return Ok(FfmpegEvent::Progress(progress));
    }
    Ok(FfmpegEvent::Log(parse_log_level(line), line.to_string()))
  }

  pub fn new(inner: R) -> Self {
    Self {
      reader: BufReader::new(inner),
    }
  }
}

/// Read up to the next `\r` or `\n`, skipping empty lines. The delimiter is
/// consumed but not stored. Returns 0 only at end of input.
fn read_line<R: BufRead + ?Sized>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<usize> {
  let is_delim = |b: &u8| *b == b'\r' || *b == b'\n';
  loop {
    let (done, used) = {
      let available = match reader.fill_buf() {
        Ok(available) => available,
        Err(e) if e.kind() == ErrorKind::Interrupted => continue,
        Err(e) => return Err(e),
      };
      if available.is_empty() {
        return Ok(buf.len());
      }

      let skip = if buf.is_empty() {
        available.iter().take_while(|&b| is_delim(b)).count()
      } else {
        0
      };
      match available[skip..].iter().position(is_delim) {
        Some(i) => {
          buf.extend_from_slice(&available[skip..skip + i]);
          (true, skip + i + 1)
        }
        None => {
          buf.extend_from_slice(&available[skip..]);
          (false, available.len())
        }
      }
    };
    reader.consume(used);

    if done {
      return Ok(buf.len());
    }
  }
}

/// Classify a line by the `[level]` prefix added by `-loglevel level+info`.
pub fn parse_log_level(line: &str) -> LogLevel {
  if line.contains("[info]") {
    LogLevel::Info
  } else if line.contains("[warning]") {
    LogLevel::Warning
  } else if line.contains("[error]") {
    LogLevel::Error
  } else if line.contains("[fatal]") {
    LogLevel::Fatal
  } else {
    LogLevel::Unknown
  }
}

/// Parse a progress update line.
///
/// ## Example:
///
/// ```rust
/// use ffmpeg_captions::log_parser::try_parse_progress;
/// let line = "[info] frame= 1996 fps=1984 q=-1.0 Lsize=     372KiB time=00:01:19.72 bitrate=  38.2kbits/s speed=79.2x\n";
/// let progress = try_parse_progress(line).unwrap();
/// assert!(progress.frame == 1996);
/// assert!(progress.fps == 1984.0);
/// assert!(progress.time == "00:01:19.72");
/// assert!(progress.speed == 79.2);
/// ```
pub fn try_parse_progress(string: &str) -> Option<FfmpegProgress> {
  let string = string.strip_prefix("[info]").unwrap_or(string).trim();
  if !string.starts_with("frame=") {
    return None;
  }

  let frame = field(string, "frame=")?.parse::<u32>().ok()?;
  let fps = field(string, "fps=")?.parse::<f32>().unwrap_or(0.0);
  let time = field(string, "time=")?.to_string();
  let speed = field(string, "speed=")
    .and_then(|s| s.strip_suffix('x'))
    .and_then(|s| s.parse::<f32>().ok())
    .unwrap_or(0.0); // handles "N/A"

  Some(FfmpegProgress {
    frame,
    fps,
    time,
    speed,
  })
}

/// The whitespace-delimited value following `key`, e.g. `"120"` for `frame=  120`.
fn field<'a>(string: &'a str, key: &str) -> Option<&'a str> {
  string.split(key).nth(1)?.split_whitespace().next()
}

/// Parse a time string in the format `HOURS:MM:SS.MILLISECONDS` into a number of seconds.
///
/// <https://trac.ffmpeg.org/wiki/Seeking#Timeunitsyntax>
///
/// ## Examples
///
/// ```rust
/// use ffmpeg_captions::log_parser::parse_time_str;
/// assert!(parse_time_str("00:00:00.00") == Some(0.0));
/// assert!(parse_time_str("5") == Some(5.0));
/// assert!(parse_time_str("1:01.0") == Some(61.0));
/// assert!(parse_time_str("N/A") == None);
/// ```
pub fn parse_time_str(str: &str) -> Option<f64> {
  let negative = str.starts_with('-');
  let mut seconds = 0.0;
  for (i, part) in str.trim_start_matches('-').split(':').rev().enumerate() {
    let unit = match i {
      0 => 1.0,
      1 => 60.0,
      2 => 3600.0,
      _ => return None,
    };
    seconds += part.parse::<f64>().ok()? * unit;
  }
  Some(if negative { -seconds } else { seconds })
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Cursor;

  fn events(raw: &str) -> Vec<FfmpegEvent> {
    let mut parser = FfmpegLogParser::new(Cursor::new(raw.as_bytes().to_vec()));
    let mut events = Vec::new();
    loop {
      match parser.parse_next_event().unwrap() {
        FfmpegEvent::LogEOF => break,
        event => events.push(event),
      }
    }
    events
  }

  #[test]
  fn test_mixed_line_endings() {
    let raw = "[info] one\r\n[warning] two\n\n[error] three\r[info] frame=1 fps=0.0 q=0.0 size=0KiB time=00:00:00.04 bitrate=N/A speed=N/A\r";
    let events = events(raw);
    assert_eq!(events.len(), 4);
    assert_eq!(events[0], FfmpegEvent::Log(LogLevel::Info, "[info] one".to_string()));
    assert_eq!(events[1], FfmpegEvent::Log(LogLevel::Warning, "[warning] two".to_string()));
    assert_eq!(events[2], FfmpegEvent::Log(LogLevel::Error, "[error] three".to_string()));
    match &events[3] {
      FfmpegEvent::Progress(progress) => {
        assert_eq!(progress.frame, 1);
        assert_eq!(progress.time, "00:00:00.04");
        assert_eq!(progress.speed, 0.0);
      }
      other => panic!("expected progress, got {other:?}"),
    }
  }

  #[test]
  fn test_empty_input_is_eof() {
    assert!(events("").is_empty());
    assert!(events("\r\n\n\r").is_empty());
  }

  #[test]
  fn test_unterminated_last_line() {
    assert_eq!(
      events("[fatal] boom"),
      vec![FfmpegEvent::Log(LogLevel::Fatal, "[fatal] boom".to_string())]
    );
  }

  #[test]
  fn test_parse_progress_v7() {
    let line = "[info] frame=   120 fps= 30 q=28.0 size=     256KiB time=00:00:04.00 bitrate= 524.3kbits/s speed=1.99x elapsed=0:00:02.01";
    let progress = try_parse_progress(line).unwrap();
    assert_eq!(progress.frame, 120);
    assert_eq!(progress.fps, 30.0);
    assert_eq!(progress.time, "00:00:04.00");
    assert_eq!(progress.speed, 1.99);
  }

  #[test]
  fn test_non_progress_lines() {
    assert!(try_parse_progress("[info] Stream mapping:").is_none());
    assert!(try_parse_progress("[info] frame=abc time=00:00:01.00").is_none());
  }

  #[test]
  fn test_parse_time_str() {
    assert_eq!(parse_time_str("1:01:01.5"), Some(3661.5));
    assert_eq!(parse_time_str("-00:00:01.00"), Some(-1.0));
    assert_eq!(parse_time_str("1:2:3:4"), None);
  }
}
