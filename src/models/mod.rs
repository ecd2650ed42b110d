//! Reading challenge data models
//!
//! This module defines the data structures shared by both storage
//! backends: the challenge configuration, participants, notices and
//! per-day reading records.

pub mod config;
pub mod notice;
pub mod participant;
pub mod reading;

pub use config::*;
pub use notice::*;
pub use participant::*;
pub use reading::*;

/// Today's date in the local calendar, formatted as `YYYY-MM-DD`
pub fn today_key() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Truncate a timestamp or date string to at most `len` characters
///
/// Remote timestamps arrive as full ISO-8601 strings; callers only keep
/// the date (10) or second (19) precision prefix.
pub fn truncate_chars(value: &str, len: usize) -> String {
    value.chars().take(len).collect()
}
