//! Character class helpers for Bengali list text.
//!
//! Digits are matched in both ASCII and Bengali forms (U+09E6..U+09EF)
//! because list documents mix the two freely.

/// Bengali Unicode block.
pub const BENGALI_BLOCK: std::ops::RangeInclusive<char> = '\u{0980}'..='\u{09FF}';

/// Bengali digits zero through nine.
pub const BENGALI_DIGITS: std::ops::RangeInclusive<char> = '\u{09E6}'..='\u{09EF}';

/// Whether `c` belongs to the Bengali block.
pub fn is_bengali(c: char) -> bool {
    BENGALI_BLOCK.contains(&c)
}

/// Whether `c` is an ASCII or Bengali digit.
pub fn is_digit(c: char) -> bool {
    c.is_ascii_digit() || BENGALI_DIGITS.contains(&c)
}

/// Whether the text contains any Bengali character.
pub fn has_bengali(text: &str) -> bool {
    text.chars().any(is_bengali)
}

/// Whether the text contains any ASCII or Bengali digit.
pub fn has_digit(text: &str) -> bool {
    text.chars().any(is_digit)
}

/// Length of the longest run of characters matching `pred`.
pub fn longest_run(text: &str, pred: impl Fn(char) -> bool) -> usize {
    let mut best = 0;
    let mut current = 0;
    for c in text.chars() {
        if pred(c) {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}

/// Length of the longest run of consecutive digits.
///
/// # Examples
///
/// ```
/// use voter_slip::extractors::script::longest_digit_run;
///
/// assert_eq!(longest_digit_run("নং: ১২৩৪৫৬৭"), 7);
/// assert_eq!(longest_digit_run("12-34"), 2);
/// ```
pub fn longest_digit_run(text: &str) -> usize {
    longest_run(text, is_digit)
}

/// Whether `c` is a Bengali letter or sign, not a digit.
pub fn is_bengali_letter(c: char) -> bool {
    is_bengali(c) && !BENGALI_DIGITS.contains(&c)
}

/// Length of the longest run of consecutive Bengali letters.
pub fn longest_bengali_run(text: &str) -> usize {
    longest_run(text, is_bengali_letter)
}

/// Whether the text contains a date-like character (digit, `/`, `-` or `.`).
pub fn has_date_char(text: &str) -> bool {
    text.chars()
        .any(|c| is_digit(c) || matches!(c, '/' | '-' | '.'))
}

/// Whether the text is made only of separators (colons, dashes, whitespace).
pub fn is_separator_only(text: &str) -> bool {
    text.chars().all(|c| c == ':' || c == '-' || c.is_whitespace())
}

/// Number of characters, the unit all length thresholds use.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Whether the text needs a glyph resource beyond the built-in Latin font.
pub fn needs_unicode_font(text: &str) -> bool {
    text.chars().any(|c| c as u32 > 0xFF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bengali_detection() {
        assert!(has_bengali("রহিম"));
        assert!(!has_bengali("Rahim 123"));
    }

    #[test]
    fn test_digit_forms() {
        assert!(has_digit("১"));
        assert!(has_digit("7"));
        assert!(!has_digit("নাম"));
    }

    #[test]
    fn test_runs() {
        assert_eq!(longest_digit_run("১২৩৪৫৬৭"), 7);
        assert_eq!(longest_digit_run("12 345"), 3);
        assert_eq!(longest_bengali_run("নাম:"), 3);
        assert_eq!(longest_bengali_run(""), 0);
        assert_eq!(longest_bengali_run("০০১."), 0);
    }

    #[test]
    fn test_char_len_counts_chars() {
        assert_eq!(char_len("রহিম"), 4);
        assert_eq!(char_len("abc"), 3);
    }

    #[test]
    fn test_date_and_separator_predicates() {
        assert!(has_date_char("০১/০১/১৯৮০"));
        assert!(has_date_char("-"));
        assert!(!has_date_char("কৃষক"));
        assert!(is_separator_only(": -"));
        assert!(!is_separator_only(": a"));
    }

    #[test]
    fn test_needs_unicode_font() {
        assert!(needs_unicode_font("ভোট"));
        assert!(!needs_unicode_font("Café 12"));
    }
}
