//! Field label classification for voter card tokens.
//!
//! Each label knows its keyword set, how far past it a value may appear and
//! which tokens qualify as its value. Keyword matching is case-insensitive
//! substring matching, except for the English "no", which must stand alone
//! as a word.

use super::script::{
    char_len, has_bengali, has_date_char, is_separator_only, longest_digit_run,
};
use crate::config::ExtractionConfig;

const NAME_KEYWORDS: &[&str] = &["নাম", "name"];
const VOTER_NO_KEYWORDS: &[&str] = &["ভোটার", "voter", "নং"];
const FATHER_KEYWORDS: &[&str] = &["পিতা", "father"];
const MOTHER_KEYWORDS: &[&str] = &["মাতা", "mother"];
const DOB_KEYWORDS: &[&str] = &["জন্ম", "birth", "তারিখ", "date"];
const PROFESSION_KEYWORDS: &[&str] = &["পেশা", "profession", "occupation"];
const ADDRESS_KEYWORDS: &[&str] = &["ঠিকানা", "address"];

/// Serial number marker; never a voter number label.
const SERIAL_KEYWORD: &str = "ক্রমিক";

/// Label-ish words that must never be adopted as an unlabeled name.
const NON_NAME_KEYWORDS: &[&str] = &["পিতা", "মাতা", "ঠিকানা", "পেশা", "জন্ম", "ভোটার", SERIAL_KEYWORD];

/// How far past a label its value may appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// Any later token in the block
    Remaining,
    /// At most this many following tokens
    Tokens(usize),
}

/// Classification of one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldLabel {
    /// Voter name label
    Name,
    /// Voter number label
    VoterNo,
    /// Father's name label
    Father,
    /// Mother's name label
    Mother,
    /// Date of birth label
    DateOfBirth,
    /// Profession label
    Profession,
    /// Address label
    Address,
    /// Not a label
    Unlabeled,
}

impl FieldLabel {
    /// Classify a token.
    ///
    /// Compound labels resolve to their most specific field: "পিতার নাম"
    /// (father's name) is a father label, never a name label.
    ///
    /// # Examples
    ///
    /// ```
    /// use voter_slip::extractors::labels::FieldLabel;
    ///
    /// assert_eq!(FieldLabel::classify("নাম:"), FieldLabel::Name);
    /// assert_eq!(FieldLabel::classify("পিতার নাম"), FieldLabel::Father);
    /// assert_eq!(FieldLabel::classify("ভোটার নং:"), FieldLabel::VoterNo);
    /// assert_eq!(FieldLabel::classify("রহিম"), FieldLabel::Unlabeled);
    /// ```
    pub fn classify(text: &str) -> FieldLabel {
        let lower = text.trim().to_lowercase();
        if lower.is_empty() {
            return FieldLabel::Unlabeled;
        }

        let is_father = contains_any(&lower, FATHER_KEYWORDS);
        let is_mother = contains_any(&lower, MOTHER_KEYWORDS);

        if is_father && !is_mother {
            FieldLabel::Father
        } else if is_mother && !is_father {
            FieldLabel::Mother
        } else if is_father || is_mother {
            // both parents in one token: ambiguous, prefer the earlier keyword
            let f = first_position(&lower, FATHER_KEYWORDS);
            let m = first_position(&lower, MOTHER_KEYWORDS);
            if f <= m {
                FieldLabel::Father
            } else {
                FieldLabel::Mother
            }
        } else if contains_any(&lower, NAME_KEYWORDS) {
            FieldLabel::Name
        } else if !lower.contains(SERIAL_KEYWORD)
            && (contains_any(&lower, VOTER_NO_KEYWORDS) || has_word(&lower, "no"))
        {
            FieldLabel::VoterNo
        } else if contains_any(&lower, DOB_KEYWORDS) {
            FieldLabel::DateOfBirth
        } else if contains_any(&lower, PROFESSION_KEYWORDS) {
            FieldLabel::Profession
        } else if contains_any(&lower, ADDRESS_KEYWORDS) {
            FieldLabel::Address
        } else {
            FieldLabel::Unlabeled
        }
    }

    /// Whether this is a real label.
    pub fn is_label(&self) -> bool {
        !matches!(self, FieldLabel::Unlabeled)
    }

    /// Look-ahead window for this label's value.
    pub fn window(&self, config: &ExtractionConfig) -> Window {
        match self {
            FieldLabel::VoterNo | FieldLabel::DateOfBirth | FieldLabel::Profession => {
                Window::Tokens(config.short_window)
            },
            FieldLabel::Unlabeled => Window::Tokens(0),
            _ => Window::Remaining,
        }
    }

    /// Content predicate: whether `candidate` can be this label's value.
    pub fn accepts(&self, candidate: &str, config: &ExtractionConfig) -> bool {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return false;
        }
        let len = char_len(candidate);
        match self {
            FieldLabel::Name => len > 2 && !is_separator_only(candidate),
            FieldLabel::VoterNo => longest_digit_run(candidate) >= config.min_voter_no_digits,
            FieldLabel::Father => {
                len > 2 && has_bengali(candidate) && !contains_any(candidate, MOTHER_KEYWORDS)
            },
            FieldLabel::Mother => len > 2 && has_bengali(candidate),
            FieldLabel::DateOfBirth => has_date_char(candidate),
            FieldLabel::Profession => {
                len >= 2
                    && candidate.chars().any(char::is_alphabetic)
                    && longest_digit_run(candidate) < 4
            },
            FieldLabel::Address => len > 2 && !is_separator_only(candidate),
            FieldLabel::Unlabeled => false,
        }
    }
}

/// Whether an unlabeled token may be adopted as a name: it must not carry
/// any label-ish keyword.
pub fn is_label_like(text: &str) -> bool {
    let lower = text.to_lowercase();
    FieldLabel::classify(&lower).is_label() || contains_any(&lower, NON_NAME_KEYWORDS)
}

/// The value written inline after a label, as in `"নাম: রহিম"`.
pub fn inline_value(text: &str) -> Option<&str> {
    let idx = text.find([':', '：'])?;
    let sep_len = text[idx..].chars().next().map_or(1, char::len_utf8);
    let value = text[idx + sep_len..].trim();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

fn first_position(text: &str, keywords: &[&str]) -> usize {
    keywords
        .iter()
        .filter_map(|k| text.find(k))
        .min()
        .unwrap_or(usize::MAX)
}

fn has_word(text: &str, word: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .any(|w| w == word)
}
