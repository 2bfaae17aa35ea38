//! Core data model: positioned tokens, voter records and run-wide context.
//!
//! [`VoterRecord`] serializes with the field names of the bulk interchange
//! format (`voter_name_bn`, `voter_no_bd`, ...), so the same type is used for
//! import, export and composition.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sentinel stored in every optional field that could not be resolved.
pub const NOT_AVAILABLE: &str = "N/A";

/// A positioned run of text from one page, in points, origin bottom-left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextToken {
    /// Text content
    pub text: String,
    /// Baseline origin x
    pub x: f32,
    /// Baseline origin y (increasing upward)
    pub y: f32,
    /// Reported run width
    #[serde(default)]
    pub width: f32,
    /// Reported run height
    #[serde(default)]
    pub height: f32,
}

impl TextToken {
    /// Create a token.
    pub fn new(text: impl Into<String>, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
            height,
        }
    }

    /// Create a token with no reported extent.
    pub fn at(text: impl Into<String>, x: f32, y: f32) -> Self {
        Self::new(text, x, y, 0.0, 0.0)
    }
}

/// Tokens of one source page together with the page view size.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageTokens {
    /// Page width in points
    #[serde(default)]
    pub width: f32,
    /// Page height in points
    #[serde(default)]
    pub height: f32,
    /// Tokens in extraction order
    pub tokens: Vec<TextToken>,
}

/// One recovered voter entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRecord {
    /// Unique, meaningless identifier
    pub id: String,
    /// Serial number within the list
    pub serial_no: String,
    /// Voter name
    #[serde(rename = "voter_name_bn")]
    pub voter_name: String,
    /// Voter (national id) number
    #[serde(rename = "voter_no_bd")]
    pub voter_no: String,
    /// Father's name
    #[serde(rename = "father_name_bn")]
    pub father_name: String,
    /// Mother's name
    #[serde(rename = "mother_name_bn")]
    pub mother_name: String,
    /// Profession
    #[serde(rename = "profession_bn", default = "not_available")]
    pub profession: String,
    /// Date of birth, as printed
    #[serde(rename = "date_of_birth_bn", default = "not_available")]
    pub date_of_birth: String,
    /// Address
    #[serde(rename = "address_bn", default = "not_available")]
    pub address: String,
}

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

impl VoterRecord {
    /// Build a record from its mandatory fields; every optional field gets the sentinel.
    pub fn new(
        id: impl Into<String>,
        serial_no: impl Into<String>,
        voter_name: impl Into<String>,
        voter_no: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            serial_no: serial_no.into(),
            voter_name: voter_name.into(),
            voter_no: voter_no.into(),
            father_name: not_available(),
            mother_name: not_available(),
            profession: not_available(),
            date_of_birth: not_available(),
            address: not_available(),
        }
    }

    /// All text fields, used for script detection before rendering.
    pub fn text_fields(&self) -> [&str; 8] {
        [
            &self.serial_no,
            &self.voter_name,
            &self.voter_no,
            &self.father_name,
            &self.mother_name,
            &self.profession,
            &self.date_of_birth,
            &self.address,
        ]
    }
}

/// Operator-supplied context drawn on every slip.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GlobalInfo {
    /// Vote center name
    #[serde(default)]
    pub center: String,
    /// Voter area name
    #[serde(default)]
    pub area: String,
}

impl GlobalInfo {
    /// Create global info.
    pub fn new(center: impl Into<String>, area: impl Into<String>) -> Self {
        Self {
            center: center.into(),
            area: area.into(),
        }
    }
}

const REQUIRED_FIELDS: [&str; 5] = [
    "serial_no",
    "voter_name_bn",
    "voter_no_bd",
    "father_name_bn",
    "mother_name_bn",
];

const OPTIONAL_FIELDS: [&str; 3] = ["profession_bn", "date_of_birth_bn", "address_bn"];

/// Parse a bulk record import.
///
/// The document must be a JSON array whose elements carry every mandatory
/// field. A missing `id` becomes `json_{n}` (1-based); missing optional fields
/// become [`NOT_AVAILABLE`]. Any violation fails the whole import.
pub fn records_from_json(input: &str) -> Result<Vec<VoterRecord>> {
    let value: Value = serde_json::from_str(input)
        .map_err(|e| Error::MalformedImport(format!("not valid JSON: {}", e)))?;
    let items = value
        .as_array()
        .ok_or_else(|| Error::MalformedImport("expected an array of voter records".to_string()))?;

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let obj = item.as_object().ok_or_else(|| {
            Error::MalformedImport(format!("element {} is not an object", index))
        })?;

        let required = |field: &str| -> Result<String> {
            obj.get(field).and_then(scalar_text).ok_or_else(|| {
                Error::MalformedImport(format!(
                    "element {} is missing required field '{}'",
                    index, field
                ))
            })
        };
        let optional = |field: &str| -> String {
            obj.get(field)
                .and_then(scalar_text)
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(not_available)
        };

        let serial_no = required(REQUIRED_FIELDS[0])?;
        let voter_name = required(REQUIRED_FIELDS[1])?;
        let voter_no = required(REQUIRED_FIELDS[2])?;
        let father_name = required(REQUIRED_FIELDS[3])?;
        let mother_name = required(REQUIRED_FIELDS[4])?;
        if voter_name.trim().is_empty() || voter_no.trim().is_empty() {
            return Err(Error::MalformedImport(format!(
                "element {} has an empty voter name or number",
                index
            )));
        }

        let id = obj
            .get("id")
            .and_then(scalar_text)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("json_{}", index + 1));

        records.push(VoterRecord {
            id,
            serial_no,
            voter_name,
            voter_no,
            father_name: or_not_available(father_name),
            mother_name: or_not_available(mother_name),
            profession: optional(OPTIONAL_FIELDS[0]),
            date_of_birth: optional(OPTIONAL_FIELDS[1]),
            address: optional(OPTIONAL_FIELDS[2]),
        });
    }

    log::debug!("Imported {} records", records.len());
    Ok(records)
}

/// Serialize records to the interchange format, pretty printed.
pub fn records_to_json(records: &[VoterRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn or_not_available(s: String) -> String {
    if s.trim().is_empty() {
        not_available()
    } else {
        s
    }
}

/// Four fully populated demonstration records.
pub fn sample_records() -> Vec<VoterRecord> {
    let rows = [
        (
            "1",
            "০০১",
            "আবদুর রহিম",
            "১৯৮৭৬৫৪৩২০০০১",
            "নুরুল ইসলাম",
            "রাহেলা বেগম",
            "০১-০১-১৯৮০",
            "কৃষক",
            "গ্রাম: পশ্চিম পাড়া, কাউয়ারখোপ, রামু",
        ),
        (
            "2",
            "০০২",
            "ফাতেমা খাতুন",
            "১৯৯০১২৩৪৫০০০২",
            "স্বর্গীয় আবদুল জব্বার",
            "নূরজাহান বিবি",
            "১৫-০৫-১৯৯০",
            "গৃহিণী",
            "গ্রাম: পশ্চিম পাড়া, কাউয়ারখোপ, রামু",
        ),
        (
            "3",
            "০০৩",
            "মো. রফিকুল ইসলাম",
            "১৯৮৫৪৪৩৩২০০০৩",
            "আজিজুর রহমান",
            "সালেহা খাতুন",
            "১০-১০-১৯৮৫",
            "শিক্ষক",
            "গ্রাম: ধুফুলনির চর, কাউয়ারখোপ, রামু",
        ),
        (
            "4",
            "০০৪",
            "মোসাম্মৎ আয়েশা",
            "২০০০৭৭৮৮৯০০০৪",
            "আবুল কালাম",
            "ফরিদা ইয়াসমিন",
            "২০-১২-২০০০",
            "শিক্ষার্থী",
            "গ্রাম: কাউয়ারখোপ, রামু, কক্সবাজার",
        ),
    ];

    rows.iter()
        .map(|r| VoterRecord {
            id: r.0.to_string(),
            serial_no: r.1.to_string(),
            voter_name: r.2.to_string(),
            voter_no: r.3.to_string(),
            father_name: r.4.to_string(),
            mother_name: r.5.to_string(),
            date_of_birth: r.6.to_string(),
            profession: r.7.to_string(),
            address: r.8.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"[
        {"serial_no": "1", "voter_name_bn": "রহিম", "voter_no_bd": "১২৩৪৫৬৭",
         "father_name_bn": "করিম", "mother_name_bn": "ফাতেমা"},
        {"id": "custom", "serial_no": "2", "voter_name_bn": "Karim", "voter_no_bd": "7654321",
         "father_name_bn": "", "mother_name_bn": "Amina", "address_bn": "Ramu"}
    ]"#;

    #[test]
    fn test_import_assigns_ids_and_sentinels() {
        let records = records_from_json(VALID).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "json_1");
        assert_eq!(records[0].profession, NOT_AVAILABLE);
        assert_eq!(records[0].date_of_birth, NOT_AVAILABLE);
        assert_eq!(records[1].id, "custom");
        assert_eq!(records[1].father_name, NOT_AVAILABLE);
        assert_eq!(records[1].address, "Ramu");
    }

    #[test]
    fn test_import_rejects_non_array() {
        let err = records_from_json(r#"{"serial_no": "1"}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedImport(_)));
    }

    #[test]
    fn test_import_rejects_missing_field() {
        let input = r#"[{"serial_no": "1", "voter_name_bn": "A", "voter_no_bd": "1234567",
                         "father_name_bn": "B"}]"#;
        let err = records_from_json(input).unwrap_err();
        let msg = format!("{}", err);
        assert!(msg.contains("mother_name_bn"));
        assert!(msg.contains("element 0"));
    }

    #[test]
    fn test_import_rejects_invalid_json() {
        assert!(matches!(
            records_from_json("[{").unwrap_err(),
            Error::MalformedImport(_)
        ));
    }

    #[test]
    fn test_export_uses_interchange_names() {
        let json = records_to_json(&sample_records()).unwrap();
        assert!(json.contains("\"voter_name_bn\""));
        assert!(json.contains("\"voter_no_bd\""));
        assert!(json.contains("\"date_of_birth_bn\""));
        assert!(!json.contains("\"voter_name\""));
    }

    #[test]
    fn test_export_then_import_preserves_records() {
        let samples = sample_records();
        let json = records_to_json(&samples).unwrap();
        assert_eq!(records_from_json(&json).unwrap(), samples);
    }

    #[test]
    fn test_new_record_defaults() {
        let r = VoterRecord::new("a", "1", "Name", "1234567");
        assert_eq!(r.father_name, NOT_AVAILABLE);
        assert_eq!(r.address, NOT_AVAILABLE);
    }

    #[test]
    fn test_token_deserialize_without_extent() {
        let t: TextToken = serde_json::from_str(r#"{"text": "নাম:", "x": 1, "y": 2}"#).unwrap();
        assert_eq!(t, TextToken::at("নাম:", 1.0, 2.0));
    }
}
