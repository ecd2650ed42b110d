//! Gateway configuration
//!
//! Decides which backend a [`DataGateway`](crate::gateway::DataGateway)
//! routes to. Settings come from a TOML file and/or environment variables:
//!
//! ```toml
//! [remote]
//! url = "https://xyzcompany.supabase.co"
//! anon_key = "public-anon-key"
//! timeout_secs = 30
//!
//! [local]
//! path = "/home/user/.local/share/reading66/reading66.db"
//! ```
//!
//! Environment overrides: `SUPABASE_URL`, `SUPABASE_ANON_KEY`,
//! `READING66_DB_PATH`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

pub const ENV_REMOTE_URL: &str = "SUPABASE_URL";
pub const ENV_REMOTE_KEY: &str = "SUPABASE_ANON_KEY";
pub const ENV_LOCAL_PATH: &str = "READING66_DB_PATH";

/// Default remote request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Remote PostgREST endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// Project URL, without the `/rest/v1` suffix
    #[serde(default)]
    pub url: String,
    /// Access credential sent as `apikey` and bearer token
    #[serde(default)]
    pub anon_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl RemoteSettings {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Both the endpoint and the credential are present
    pub fn is_complete(&self) -> bool {
        !self.url.trim().is_empty() && !self.anon_key.trim().is_empty()
    }
}

/// Local store location
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalSettings {
    /// SQLite file; in-memory store when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Settings a gateway is built from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewaySettings {
    #[serde(default)]
    pub remote: Option<RemoteSettings>,
    #[serde(default)]
    pub local: LocalSettings,
}

impl GatewaySettings {
    /// Local store only, kept in memory
    pub fn local_only() -> Self {
        Self::default()
    }

    /// Remote backend at `url` with credential `anon_key`
    pub fn with_remote(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            remote: Some(RemoteSettings::new(url, anon_key)),
            local: LocalSettings::default(),
        }
    }

    /// Set the local SQLite file
    pub fn with_local_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.local.path = Some(path.into());
        self
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("Loading gateway settings from: {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Settings from environment variables alone
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `SUPABASE_URL`, `SUPABASE_ANON_KEY` and `READING66_DB_PATH`
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(ENV_REMOTE_URL).filter(|v| !v.is_empty());
        let key = lookup(ENV_REMOTE_KEY).filter(|v| !v.is_empty());

        if url.is_some() || key.is_some() {
            let remote = self
                .remote
                .get_or_insert_with(|| RemoteSettings::new("", ""));
            if let Some(url) = url {
                remote.url = url;
            }
            if let Some(key) = key {
                remote.anon_key = key;
            }
        }

        if let Some(path) = lookup(ENV_LOCAL_PATH).filter(|v| !v.is_empty()) {
            self.local.path = Some(PathBuf::from(path));
        }
        self
    }

    /// Remote settings, only when both endpoint and credential are present
    pub fn remote_settings(&self) -> Option<&RemoteSettings> {
        self.remote.as_ref().filter(|r| r.is_complete())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_is_local_only() {
        let settings = GatewaySettings::default();
        assert!(settings.remote_settings().is_none());
        assert!(settings.local.path.is_none());
    }

    #[test]
    fn test_parse_full_toml() {
        let settings = GatewaySettings::from_toml_str(
            r#"
            [remote]
            url = "https://example.supabase.co"
            anon_key = "anon"
            timeout_secs = 5

            [local]
            path = "/tmp/reading66.db"
            "#,
        )
        .unwrap();

        let remote = settings.remote_settings().unwrap();
        assert_eq!(remote.url, "https://example.supabase.co");
        assert_eq!(remote.anon_key, "anon");
        assert_eq!(remote.timeout_secs, 5);
        assert_eq!(settings.local.path, Some(PathBuf::from("/tmp/reading66.db")));
    }

    #[test]
    fn test_timeout_defaults() {
        let settings = GatewaySettings::from_toml_str(
            r#"
            [remote]
            url = "https://example.supabase.co"
            anon_key = "anon"
            "#,
        )
        .unwrap();
        assert_eq!(settings.remote.unwrap().timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_incomplete_remote_is_ignored() {
        let settings = GatewaySettings::from_toml_str(
            r#"
            [remote]
            url = "https://example.supabase.co"
            "#,
        )
        .unwrap();
        assert!(settings.remote.is_some());
        assert!(settings.remote_settings().is_none());

        let settings = GatewaySettings::with_remote("https://example.supabase.co", "   ");
        assert!(settings.remote_settings().is_none());
    }

    #[test]
    fn test_invalid_toml() {
        let result = GatewaySettings::from_toml_str("[remote\nurl=");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = GatewaySettings::from_file("/nonexistent/reading66.toml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reading66.toml");
        std::fs::write(&path, "[local]\npath = \"data.db\"\n").unwrap();

        let settings = GatewaySettings::from_file(&path).unwrap();
        assert_eq!(settings.local.path, Some(PathBuf::from("data.db")));
        assert!(settings.remote_settings().is_none());
    }

    #[test]
    fn test_env_overrides() {
        let settings = GatewaySettings::default().with_overrides_from(lookup(&[
            (ENV_REMOTE_URL, "https://env.supabase.co"),
            (ENV_REMOTE_KEY, "env-key"),
            (ENV_LOCAL_PATH, "/var/lib/reading66.db"),
        ]));

        let remote = settings.remote_settings().unwrap();
        assert_eq!(remote.url, "https://env.supabase.co");
        assert_eq!(remote.anon_key, "env-key");
        assert_eq!(settings.local.path, Some(PathBuf::from("/var/lib/reading66.db")));
    }

    #[test]
    fn test_env_overrides_merge_with_file_values() {
        let settings = GatewaySettings::with_remote("https://file.supabase.co", "file-key")
            .with_overrides_from(lookup(&[(ENV_REMOTE_KEY, "env-key")]));

        let remote = settings.remote_settings().unwrap();
        assert_eq!(remote.url, "https://file.supabase.co");
        assert_eq!(remote.anon_key, "env-key");
    }

    #[test]
    fn test_env_url_without_key_stays_local() {
        let settings = GatewaySettings::default()
            .with_overrides_from(lookup(&[(ENV_REMOTE_URL, "https://env.supabase.co")]));
        assert!(settings.remote_settings().is_none());
    }
}
