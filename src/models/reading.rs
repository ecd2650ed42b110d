//! Reading record models
//!
//! A participant's reading data is a mapping from a day key (YYYY-MM-DD)
//! to at most one [`ReadingRecord`]. Records written by callers go through
//! [`ReadingPayload::normalize`] so that stored values are always a
//! non-negative page count and trimmed strings.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// One day's reading record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingRecord {
    /// Pages read that day
    #[serde(default, deserialize_with = "deserialize_pages")]
    pub pages: u32,
    /// Title of the book being read
    #[serde(default)]
    pub book_title: String,
    /// Free-form note
    #[serde(default)]
    pub thought: String,
}

impl ReadingRecord {
    pub fn new(pages: u32, book_title: impl Into<String>, thought: impl Into<String>) -> Self {
        Self {
            pages,
            book_title: book_title.into(),
            thought: thought.into(),
        }
    }
}

/// Reading data of one participant (or of the anonymous local user)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingData {
    /// Day key (YYYY-MM-DD) -> record
    #[serde(default)]
    pub daily: BTreeMap<String, ReadingRecord>,
}

impl ReadingData {
    pub fn is_empty(&self) -> bool {
        self.daily.is_empty()
    }

    /// Insert or replace the record for `date_key`
    pub fn upsert(&mut self, date_key: impl Into<String>, record: ReadingRecord) {
        self.daily.insert(date_key.into(), record);
    }
}

/// Raw page count as supplied by a caller: a JSON number or a string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PagesInput {
    Number(f64),
    Text(String),
}

impl PagesInput {
    /// Coerce to a non-negative page count
    ///
    /// Numbers are truncated toward zero; strings are read like a base-10
    /// `parseInt` (leading whitespace, optional sign, leading digits).
    /// Anything unparseable or negative yields 0.
    pub fn to_pages(&self) -> u32 {
        match self {
            PagesInput::Number(n) => clamp_pages(*n),
            PagesInput::Text(s) => parse_int_prefix(s).map(|n| clamp_pages(n as f64)).unwrap_or(0),
        }
    }
}

impl From<u32> for PagesInput {
    fn from(value: u32) -> Self {
        PagesInput::Number(f64::from(value))
    }
}

impl From<i64> for PagesInput {
    fn from(value: i64) -> Self {
        PagesInput::Number(value as f64)
    }
}

impl From<f64> for PagesInput {
    fn from(value: f64) -> Self {
        PagesInput::Number(value)
    }
}

impl From<&str> for PagesInput {
    fn from(value: &str) -> Self {
        PagesInput::Text(value.to_string())
    }
}

impl From<String> for PagesInput {
    fn from(value: String) -> Self {
        PagesInput::Text(value)
    }
}

/// Caller-supplied record before normalization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingPayload {
    #[serde(default)]
    pub pages: Option<PagesInput>,
    #[serde(default)]
    pub book_title: Option<String>,
    #[serde(default)]
    pub thought: Option<String>,
}

impl ReadingPayload {
    pub fn new(
        pages: impl Into<PagesInput>,
        book_title: impl Into<String>,
        thought: impl Into<String>,
    ) -> Self {
        Self {
            pages: Some(pages.into()),
            book_title: Some(book_title.into()),
            thought: Some(thought.into()),
        }
    }

    /// Coerce into the stored record shape
    pub fn normalize(&self) -> ReadingRecord {
        ReadingRecord {
            pages: self.pages.as_ref().map(PagesInput::to_pages).unwrap_or(0),
            book_title: self.book_title.as_deref().unwrap_or("").trim().to_string(),
            thought: self.thought.as_deref().unwrap_or("").trim().to_string(),
        }
    }
}

fn clamp_pages(n: f64) -> u32 {
    if !n.is_finite() || n <= 0.0 {
        0
    } else if n >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        n.trunc() as u32
    }
}

/// Parse the leading integer of a string, `parseInt(s, 10)` style
fn parse_int_prefix(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    // Overlong digit runs saturate rather than fail
    let value = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}

fn deserialize_pages<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<PagesInput> = Option::deserialize(deserializer)?;
    Ok(raw.map(|p| p.to_pages()).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_from_number() {
        assert_eq!(PagesInput::from(25u32).to_pages(), 25);
        assert_eq!(PagesInput::from(3.9).to_pages(), 3);
        assert_eq!(PagesInput::from(-4i64).to_pages(), 0);
        assert_eq!(PagesInput::from(f64::NAN).to_pages(), 0);
    }

    #[test]
    fn test_pages_from_text_like_parse_int() {
        assert_eq!(PagesInput::from("12").to_pages(), 12);
        assert_eq!(PagesInput::from("  12abc").to_pages(), 12);
        assert_eq!(PagesInput::from("+7").to_pages(), 7);
        assert_eq!(PagesInput::from("3.9").to_pages(), 3);
        assert_eq!(PagesInput::from("-5").to_pages(), 0);
        assert_eq!(PagesInput::from("abc").to_pages(), 0);
        assert_eq!(PagesInput::from("").to_pages(), 0);
        assert_eq!(PagesInput::from("-").to_pages(), 0);
    }

    #[test]
    fn test_normalize_trims_and_defaults() {
        let payload = ReadingPayload::new("30", "  Dune  ", "\tgreat read\n");
        let record = payload.normalize();
        assert_eq!(record, ReadingRecord::new(30, "Dune", "great read"));

        let record = ReadingPayload::default().normalize();
        assert_eq!(record, ReadingRecord::new(0, "", ""));
    }

    #[test]
    fn test_payload_accepts_number_or_string_pages() {
        let payload: ReadingPayload =
            serde_json::from_str(r#"{"pages":"15","bookTitle":"A","thought":"B"}"#).unwrap();
        assert_eq!(payload.normalize().pages, 15);

        let payload: ReadingPayload = serde_json::from_str(r#"{"pages":15}"#).unwrap();
        let record = payload.normalize();
        assert_eq!(record.pages, 15);
        assert_eq!(record.book_title, "");
    }

    #[test]
    fn test_record_deserialization_is_lenient() {
        let record: ReadingRecord = serde_json::from_str(r#"{"pages":"8"}"#).unwrap();
        assert_eq!(record, ReadingRecord::new(8, "", ""));

        let record: ReadingRecord = serde_json::from_str(r#"{"pages":null,"bookTitle":"X"}"#).unwrap();
        assert_eq!(record.pages, 0);
        assert_eq!(record.book_title, "X");
    }

    #[test]
    fn test_reading_data_shape() {
        let mut data = ReadingData::default();
        assert!(data.is_empty());
        data.upsert("2026-02-11", ReadingRecord::new(10, "A", ""));
        data.upsert("2026-02-11", ReadingRecord::new(20, "B", ""));
        data.upsert("2026-02-12", ReadingRecord::new(5, "B", ""));
        assert_eq!(data.daily.len(), 2);
        assert_eq!(data.daily["2026-02-11"].pages, 20);
        assert_eq!(data.daily["2026-02-12"].pages, 5);

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["daily"]["2026-02-12"]["bookTitle"], "B");

        let empty: ReadingData = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }
}
