//! Challenge configuration model
//!
//! The challenge configuration is a singleton: one start date, the
//! challenge length in days, and the daily page goal.

use serde::{Deserialize, Serialize};

use super::today_key;

/// Fixed id of the singleton configuration row
pub const CONFIG_ID: &str = "default";

/// Default challenge length in days
pub const DEFAULT_TOTAL_DAYS: u32 = 66;

/// Default daily page goal
pub const DEFAULT_GOAL_PAGES: u32 = 20;

/// Challenge configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeConfig {
    /// First day of the challenge (YYYY-MM-DD)
    #[serde(default = "today_key")]
    pub start_date: String,
    /// Challenge length in days
    #[serde(default = "default_total_days")]
    pub total_days: u32,
    /// Daily page goal
    #[serde(default = "default_goal_pages")]
    pub goal_pages: u32,
}

fn default_total_days() -> u32 {
    DEFAULT_TOTAL_DAYS
}

fn default_goal_pages() -> u32 {
    DEFAULT_GOAL_PAGES
}

impl Default for ChallengeConfig {
    /// Computed fresh on every call: the start date is today
    fn default() -> Self {
        Self {
            start_date: today_key(),
            total_days: DEFAULT_TOTAL_DAYS,
            goal_pages: DEFAULT_GOAL_PAGES,
        }
    }
}

impl ChallengeConfig {
    /// Create a configuration with explicit values
    pub fn new(start_date: impl Into<String>, total_days: u32, goal_pages: u32) -> Self {
        Self {
            start_date: start_date.into(),
            total_days,
            goal_pages,
        }
    }

    /// Days value to persist remotely; zero means "not set" and falls back to the default
    pub fn total_days_or_default(&self) -> u32 {
        if self.total_days == 0 {
            DEFAULT_TOTAL_DAYS
        } else {
            self.total_days
        }
    }

    /// Goal value to persist remotely; zero means "not set" and falls back to the default
    pub fn goal_pages_or_default(&self) -> u32 {
        if self.goal_pages == 0 {
            DEFAULT_GOAL_PAGES
        } else {
            self.goal_pages
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChallengeConfig::default();
        assert_eq!(config.total_days, 66);
        assert_eq!(config.goal_pages, 20);
        assert_eq!(config.start_date, today_key());
    }

    #[test]
    fn test_serde_camel_case_keys() {
        let config = ChallengeConfig::new("2026-03-01", 30, 10);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["startDate"], "2026-03-01");
        assert_eq!(json["totalDays"], 30);
        assert_eq!(json["goalPages"], 10);
        assert!(json.get("start_date").is_none());
    }

    #[test]
    fn test_missing_fields_fall_back_per_field() {
        let config: ChallengeConfig = serde_json::from_str(r#"{"startDate":"2026-01-05"}"#).unwrap();
        assert_eq!(config.start_date, "2026-01-05");
        assert_eq!(config.total_days, DEFAULT_TOTAL_DAYS);
        assert_eq!(config.goal_pages, DEFAULT_GOAL_PAGES);

        let config: ChallengeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.start_date, today_key());
    }

    #[test]
    fn test_zero_values_fall_back_for_remote() {
        let config = ChallengeConfig::new("2026-03-01", 0, 0);
        assert_eq!(config.total_days_or_default(), 66);
        assert_eq!(config.goal_pages_or_default(), 20);

        let config = ChallengeConfig::new("2026-03-01", 100, 5);
        assert_eq!(config.total_days_or_default(), 100);
        assert_eq!(config.goal_pages_or_default(), 5);
    }
}
