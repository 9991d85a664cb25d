//! Greedy word wrapping on a character budget.
//!
//! [`wrap`] and [`line_count`] share one packing routine, so the height
//! estimate for a caption always agrees with the number of lines actually
//! written to its text file.

/// Split `text` into lines of at most `max_line_chars` characters, packing
/// whitespace-separated words greedily.
///
/// Words are never split: a word longer than the budget occupies a line of
/// its own. Empty input yields a single empty line.
///
/// ```rust
/// use ffmpeg_captions::wrap::wrap;
///
/// let lines = wrap("the quick brown fox jumps", 10);
/// assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
/// assert_eq!(wrap("", 10), vec![""]);
/// ```
pub fn wrap(text: &str, max_line_chars: usize) -> Vec<String> {
  let words: Vec<&str> = text.split_whitespace().collect();
  let mut lines = Vec::new();
  pack(&words, max_line_chars, |line| lines.push(line.join(" ")));
  lines
}

/// Number of lines [`wrap`] would produce, without building them.
///
/// ```rust
/// use ffmpeg_captions::wrap::{line_count, wrap};
///
/// let text = "a caption that is long enough to need a few lines";
/// assert_eq!(line_count(text, 12), wrap(text, 12).len());
/// ```
pub fn line_count(text: &str, max_line_chars: usize) -> usize {
  let words: Vec<&str> = text.split_whitespace().collect();
  let mut count = 0;
  pack(&words, max_line_chars, |_| count += 1);
  count
}

/// Emits one slice of words per output line. Always emits at least once.
fn pack<'a>(words: &[&'a str], max_line_chars: usize, mut emit: impl FnMut(&[&'a str])) {
  let mut start = 0;
  let mut len = 0;
  for (i, word) in words.iter().enumerate() {
    let word_len = word.chars().count();
    if i == start {
      len = word_len;
    } else if len + 1 + word_len > max_line_chars {
      emit(&words[start..i]);
      start = i;
      len = word_len;
    } else {
      len += 1 + word_len;
    }
  }
  emit(&words[start..]);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_wrap_packs_greedily() {
    assert_eq!(
      wrap("Hello World! This is a caption", 12),
      vec!["Hello World!", "This is a", "caption"]
    );
  }

  #[test]
  fn test_wrap_exact_fit_stays_on_line() {
    assert_eq!(wrap("abc def", 7), vec!["abc def"]);
    assert_eq!(wrap("abc def", 6), vec!["abc", "def"]);
  }

  #[test]
  fn test_overlong_word_is_kept_whole() {
    assert_eq!(
      wrap("a supercalifragilistic word", 5),
      vec!["a", "supercalifragilistic", "word"]
    );
    assert_eq!(wrap("supercalifragilistic", 5), vec!["supercalifragilistic"]);
  }

  #[test]
  fn test_whitespace_is_normalized() {
    assert_eq!(wrap("  one\ttwo \n three  ", 80), vec!["one two three"]);
    assert_eq!(wrap("   ", 10), vec![""]);
  }

  #[test]
  fn test_wrap_counts_chars_not_bytes() {
    // 5 chars each, 10 bytes each
    assert_eq!(wrap("ééééé ààààà", 11), vec!["ééééé ààààà"]);
  }

  #[test]
  fn test_rejoined_lines_preserve_words() {
    let texts = [
      "",
      "single",
      "Hello World!",
      "The quick brown fox jumps over the lazy dog near the riverbank at dawn",
      "  irregular   spacing\tand\nnewlines  ",
      "x xx xxx xxxx xxxxx xxxxxx xxxxxxx",
    ];
    for text in texts {
      for max in 1..40 {
        let words: Vec<&str> = text.split_whitespace().collect();
        let joined = wrap(text, max).join(" ");
        let rejoined: Vec<&str> = joined.split_whitespace().collect();
        assert_eq!(rejoined, words, "text={text:?} max={max}");
      }
    }
  }

  #[test]
  fn test_line_count_matches_wrap() {
    let texts = [
      "",
      "word",
      "two words",
      "Burn this caption into the top band of a very wide frame please",
      "aaaaaaaaaaaaaaaaaaaaaaaaa b cc ddd",
    ];
    for text in texts {
      for max in 0..50 {
        assert_eq!(line_count(text, max), wrap(text, max).len(), "text={text:?} max={max}");
      }
    }
  }

  #[test]
  fn test_lines_respect_budget_unless_single_word() {
    let text = "The quick brown fox jumps over the lazy dog";
    for max in 3..30 {
      for line in wrap(text, max) {
        let fits = line.chars().count() <= max;
        let single_word = !line.contains(' ');
        assert!(fits || single_word, "line={line:?} max={max}");
      }
    }
  }
}
