//! Storage backend trait
//!
//! Both backends expose the same participant-scoped operations. Every
//! method reports failures; deciding whether a failure is swallowed (reads)
//! or surfaced (writes) is the gateway's job, not the backend's.

use async_trait::async_trait;

use super::error::StorageError;
use crate::models::{ChallengeConfig, Notice, Participant, ReadingData, ReadingRecord};

/// Which backend a gateway routes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Hosted PostgREST tables
    Remote,
    /// Local key-value store
    Local,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Remote => "remote",
            BackendKind::Local => "local",
        }
    }
}

/// Persistence operations shared by the remote and local backends
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Backend identity, used for logging and mode checks
    fn kind(&self) -> BackendKind;

    /// Load the singleton configuration, `None` when never saved
    async fn load_config(&self) -> Result<Option<ChallengeConfig>, StorageError>;

    /// Overwrite the singleton configuration
    async fn save_config(&self, config: &ChallengeConfig) -> Result<(), StorageError>;

    /// All participants in creation order
    async fn list_participants(&self) -> Result<Vec<Participant>, StorageError>;

    /// Create a participant and return it with its generated id
    async fn insert_participant(&self, name: &str, password: &str) -> Result<Participant, StorageError>;

    /// Delete a participant together with its reading records
    async fn delete_participant(&self, id: &str) -> Result<(), StorageError>;

    /// All notices, newest first
    async fn list_notices(&self) -> Result<Vec<Notice>, StorageError>;

    /// Create a notice and return it with its generated id
    async fn insert_notice(&self, text: &str) -> Result<Notice, StorageError>;

    async fn delete_notice(&self, id: &str) -> Result<(), StorageError>;

    /// Reading data of one participant; empty when none recorded
    async fn load_reading_data(&self, participant_id: &str) -> Result<ReadingData, StorageError>;

    /// Insert or replace the record for `(participant_id, date_key)`
    async fn upsert_reading_record(
        &self,
        participant_id: &str,
        date_key: &str,
        record: &ReadingRecord,
    ) -> Result<(), StorageError>;

    /// Delete every reading record of one participant
    async fn delete_reading_data(&self, participant_id: &str) -> Result<(), StorageError>;
}
