//! Notice model

use serde::{Deserialize, Serialize};

/// A notice shown to all participants, listed newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    /// Opaque id (remote: assigned by the backend, local: `n<millis>`)
    pub id: String,
    /// Notice body
    pub text: String,
    /// Creation time: `YYYY-MM-DDTHH:MM:SS` remotely, `YYYY-MM-DD` locally
    #[serde(default)]
    pub created_at: String,
}

impl Notice {
    pub fn new(id: impl Into<String>, text: impl Into<String>, created_at: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            created_at: created_at.into(),
        }
    }
}
