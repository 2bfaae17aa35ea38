//! Greedy word wrapping against a measured width.

/// Width of rendered text.
pub trait TextMeasure {
    /// Rendered width of `text` at `font_size`, in points.
    fn text_width(&self, text: &str, font_size: f32) -> f32;
}

/// Every character advances by the same fraction of the font size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedAdvance(pub f32);

impl Default for FixedAdvance {
    fn default() -> Self {
        FixedAdvance(0.5)
    }
}

impl TextMeasure for FixedAdvance {
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * self.0 * font_size
    }
}

/// Wrap `text` into lines no wider than `max_width`.
///
/// Words are added to the current line until the next one would overflow,
/// then a new line starts. A word wider than the box on its own is broken
/// between characters. Lines past `max_lines` are dropped.
pub fn wrap_text(
    text: &str,
    measure: &dyn TextMeasure,
    font_size: f32,
    max_width: f32,
    max_lines: usize,
) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        if measure.text_width(&candidate, font_size) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        if measure.text_width(word, font_size) <= max_width {
            current = word.to_string();
        } else {
            let mut pieces = split_word(word, measure, font_size, max_width);
            current = pieces.pop().unwrap_or_default();
            lines.extend(pieces);
        }

        if lines.len() >= max_lines {
            break;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines.truncate(max_lines);
    lines
}

/// Break one overlong word into pieces that fit.
fn split_word(word: &str, measure: &dyn TextMeasure, font_size: f32, max_width: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut prev: Option<char> = None;

    for ch in word.chars() {
        let mut candidate = piece.clone();
        candidate.push(ch);
        let breakable = prev.map_or(true, |p| can_break_between(p, ch));
        if !piece.is_empty() && breakable && measure.text_width(&candidate, font_size) > max_width {
            pieces.push(std::mem::take(&mut piece));
            piece.push(ch);
        } else {
            piece = candidate;
        }
        prev = Some(ch);
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// Bengali vowel signs and marks stay with their base consonant, and a
/// hasanta joins the next consonant.
fn can_break_between(prev: char, next: char) -> bool {
    let is_mark = matches!(next, '\u{0981}'..='\u{0983}' | '\u{09BC}' | '\u{09BE}'..='\u{09CD}' | '\u{09D7}');
    let joins = prev == '\u{09CD}' || next == '\u{200C}' || next == '\u{200D}';
    !is_mark && !joins
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1 unit per char at size 10 with advance 0.1
    const M: FixedAdvance = FixedAdvance(0.1);

    #[test]
    fn test_fits_on_one_line() {
        assert_eq!(wrap_text("ab cd", &M, 10.0, 5.0, 3), vec!["ab cd"]);
    }

    #[test]
    fn test_greedy_break() {
        assert_eq!(wrap_text("aa bb cc dd", &M, 10.0, 5.0, 5), vec!["aa bb", "cc dd"]);
        assert_eq!(wrap_text("aaa bb cc", &M, 10.0, 5.0, 5), vec!["aaa", "bb cc"]);
    }

    #[test]
    fn test_lines_beyond_limit_are_dropped() {
        let lines = wrap_text("aa bb cc dd ee", &M, 10.0, 2.0, 2);
        assert_eq!(lines, vec!["aa", "bb"]);
    }

    #[test]
    fn test_long_word_is_split() {
        assert_eq!(wrap_text("abcdefg", &M, 10.0, 3.0, 5), vec!["abc", "def", "g"]);
        assert_eq!(wrap_text("x abcdefg", &M, 10.0, 3.0, 2), vec!["x", "abc"]);
    }

    #[test]
    fn test_empty_text() {
        assert!(wrap_text("   ", &M, 10.0, 50.0, 2).is_empty());
    }

    #[test]
    fn test_marks_stay_with_base() {
        // কি = ক + ি : never separated
        let lines = wrap_text("কিকি", &M, 10.0, 1.0, 5);
        assert_eq!(lines, vec!["কি", "কি"]);
    }
}
