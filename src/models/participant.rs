//! Participant model

use serde::{Deserialize, Serialize};

/// A challenge participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Opaque id (remote: assigned by the backend, local: `u<millis>`)
    pub id: String,
    /// Display name
    pub name: String,
    /// Plaintext password, empty when not set
    #[serde(default)]
    pub password: String,
    /// Creation day (YYYY-MM-DD), only kept by the local store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Participant {
    pub fn new(id: impl Into<String>, name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            password: password.into(),
            created_at: None,
        }
    }
}
