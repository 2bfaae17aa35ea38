//! Resolving placeholder keys to record values.
//!
//! Each record is exposed as a [`SemanticMap`]: every record field plus the
//! run-wide [`GlobalInfo`] under several spellings. A placeholder key is
//! resolved in two phases by [`ResolutionPolicy`]:
//!
//! 1. **Exact**: the key as authored, if it maps to a non-empty value.
//! 2. **Fuzzy**: both sides are normalized (upper-cased, `_` and `-`
//!    removed) and a semantic key matches when either contains the other.
//!    Among several matches the longest normalized semantic key wins, then
//!    the earliest in map order.

use crate::model::{GlobalInfo, VoterRecord};
use indexmap::IndexMap;

/// Field values of one record under every recognized key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticMap {
    entries: IndexMap<&'static str, String>,
}

impl SemanticMap {
    /// Build the map for one record.
    pub fn new(record: &VoterRecord, info: &GlobalInfo) -> Self {
        let entries = [
            ("SERIAL", record.serial_no.clone()),
            ("NAME", record.voter_name.clone()),
            ("NO", record.voter_no.clone()),
            ("FATHER", record.father_name.clone()),
            ("MOTHER", record.mother_name.clone()),
            ("DOB", record.date_of_birth.clone()),
            ("PROFESSION", record.profession.clone()),
            ("ADDRESS", record.address.clone()),
            ("VOTE_CENTER", info.center.clone()),
            ("vote_center", info.center.clone()),
            ("VOTER_AREA", info.area.clone()),
            ("voter_area", info.area.clone()),
            ("CENTER", info.center.clone()),
            ("AREA", info.area.clone()),
        ]
        .into_iter()
        .collect();
        Self { entries }
    }

    /// Value stored under an exact key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

/// How a placeholder key found its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// Authored key present in the map
    Exact(&'a str),
    /// Matched through normalized containment
    Fuzzy {
        /// The semantic key that matched
        semantic_key: &'static str,
        /// Its value
        value: &'a str,
    },
    /// Nothing drawn
    Unresolved,
}

impl<'a> Resolution<'a> {
    /// The resolved text, if any and non-empty.
    pub fn value(&self) -> Option<&'a str> {
        match *self {
            Resolution::Exact(v) | Resolution::Fuzzy { value: v, .. } if !v.is_empty() => Some(v),
            _ => None,
        }
    }
}

/// Two-phase key resolution: exact, then normalized substring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionPolicy;

impl ResolutionPolicy {
    /// Resolve `key` against `map`.
    pub fn resolve<'a>(&self, key: &str, map: &'a SemanticMap) -> Resolution<'a> {
        if let Some(value) = map.get(key).filter(|v| !v.is_empty()) {
            return Resolution::Exact(value);
        }

        let wanted = normalize(key);
        if wanted.is_empty() {
            return Resolution::Unresolved;
        }

        let mut best: Option<(usize, &'static str, &'a str)> = None;
        for (semantic_key, value) in map.iter() {
            let candidate = normalize(semantic_key);
            if !(wanted.contains(&candidate) || candidate.contains(&wanted)) {
                continue;
            }
            // strictly longer replaces, so ties keep the earliest key
            if best.map_or(true, |(len, _, _)| candidate.len() > len) {
                best = Some((candidate.len(), semantic_key, value));
            }
        }

        match best {
            Some((_, semantic_key, value)) => Resolution::Fuzzy {
                semantic_key,
                value,
            },
            None => Resolution::Unresolved,
        }
    }

    /// Resolve to drawable text; empty values draw nothing.
    pub fn value<'a>(&self, key: &str, map: &'a SemanticMap) -> Option<&'a str> {
        self.resolve(key, map).value()
    }
}

/// Upper-case and drop `_` and `-`.
pub fn normalize(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_uppercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> SemanticMap {
        let mut record = VoterRecord::new("r1", "০০১", "রহিম", "১২৩৪৫৬৭");
        record.father_name = "করিম".to_string();
        SemanticMap::new(&record, &GlobalInfo::new("X School", "Ward 5"))
    }

    #[test]
    fn test_exact_match() {
        let map = map();
        assert_eq!(ResolutionPolicy.resolve("NAME", &map), Resolution::Exact("রহিম"));
        assert_eq!(ResolutionPolicy.value("FATHER", &map), Some("করিম"));
    }

    #[test]
    fn test_lowercase_key_resolves() {
        let map = map();
        assert_eq!(ResolutionPolicy.value("vote_center", &map), Some("X School"));
        assert_eq!(ResolutionPolicy.value("Vote-Center", &map), Some("X School"));
        assert_eq!(ResolutionPolicy.value("name", &map), Some("রহিম"));
    }

    #[test]
    fn test_longest_semantic_key_wins() {
        let map = map();
        // only AREA is contained in AREAINFO
        assert_eq!(
            ResolutionPolicy.resolve("AREA_INFO", &map),
            Resolution::Fuzzy {
                semantic_key: "AREA",
                value: "Ward 5"
            }
        );
        // NAME, AREA and VOTER_AREA all match; VOTERAREA is longest
        assert_eq!(
            ResolutionPolicy.resolve("VOTER_AREA_NAME", &map),
            Resolution::Fuzzy {
                semantic_key: "VOTER_AREA",
                value: "Ward 5"
            }
        );
        assert_eq!(ResolutionPolicy.value("VOTER_NAME", &map), Some("রহিম"));
    }

    #[test]
    fn test_unresolved_draws_nothing() {
        let map = map();
        assert_eq!(ResolutionPolicy.resolve("PHOTO", &map), Resolution::Unresolved);
        assert_eq!(ResolutionPolicy.value("", &map), None);
    }

    #[test]
    fn test_empty_global_info_draws_nothing() {
        let record = VoterRecord::new("r1", "1", "A", "1234567");
        let map = SemanticMap::new(&record, &GlobalInfo::default());
        assert_eq!(ResolutionPolicy.value("VOTE_CENTER", &map), None);
        assert_eq!(ResolutionPolicy.value("CENTER", &map), None);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("vote_center"), "VOTECENTER");
        assert_eq!(normalize("voter-area"), "VOTERAREA");
    }
}
