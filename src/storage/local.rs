//! Local storage backend
//!
//! Keeps every collection as one JSON document under a fixed key of a
//! [`KeyValueStore`]:
//!
//! | key                 | content                               |
//! |---------------------|---------------------------------------|
//! | `reading66_config`  | challenge configuration               |
//! | `reading66_users`   | participant list, creation order      |
//! | `reading66_notices` | notice list, newest first             |
//! | `reading66_data`    | participant id -> reading data        |
//! | `reading66`         | anonymous single-user reading data    |
//!
//! Reads report corrupt documents as serialization errors. Writes that
//! must read-modify-write a corrupt document start over from an empty one.
//! Every read-modify-write runs under one write guard shared by all clones
//! of a backend.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::backend::{BackendKind, StorageBackend};
use super::error::StorageError;
use super::kv::KeyValueStore;
use crate::models::{today_key, ChallengeConfig, Notice, Participant, ReadingData, ReadingRecord};

pub const CONFIG_KEY: &str = "reading66_config";
pub const USERS_KEY: &str = "reading66_users";
pub const NOTICES_KEY: &str = "reading66_notices";
pub const DATA_KEY: &str = "reading66_data";
pub const SINGLE_USER_KEY: &str = "reading66";

/// Participant id -> reading data
type ParticipantData = BTreeMap<String, ReadingData>;

/// Backend over a local key-value store
#[derive(Clone)]
pub struct LocalBackend {
    store: Arc<dyn KeyValueStore>,
    /// Serializes read-modify-write cycles on the shared documents
    write_guard: Arc<Mutex<()>>,
}

impl LocalBackend {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_guard: Arc::new(Mutex::new(())),
        }
    }

    fn lock_writes(&self) -> Result<MutexGuard<'_, ()>, StorageError> {
        self.write_guard.lock().map_err(|_| StorageError::LockError)
    }

    /// Read-modify-write the document under `key` while holding the write guard
    fn update_json<T, R, F>(&self, key: &str, f: F) -> Result<R, StorageError>
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut T) -> R,
    {
        let _guard = self.lock_writes()?;
        let mut value: T = self.read_for_update(key)?;
        let out = f(&mut value);
        self.write_json(key, &value)?;
        Ok(out)
    }

    /// Parse the document under `key`; `None` when absent
    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.store.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Document under `key` for a read-modify-write cycle
    ///
    /// Store failures propagate; an unparseable document is replaced by
    /// the default value.
    fn read_for_update<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T, StorageError> {
        match self.read_json(key) {
            Ok(value) => Ok(value.unwrap_or_default()),
            Err(StorageError::Serialization(e)) => {
                warn!(key, error = %e, "Discarding unparseable local document");
                Ok(T::default())
            }
            Err(e) => Err(e),
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, &raw)
    }

    /// Reading data of the anonymous local user
    pub fn load_single_user_data(&self) -> Result<ReadingData, StorageError> {
        Ok(self.read_json(SINGLE_USER_KEY)?.unwrap_or_default())
    }

    /// Insert or replace one day of the anonymous user's reading data
    pub fn save_single_user_record(&self, date_key: &str, record: &ReadingRecord) -> Result<(), StorageError> {
        self.update_json(SINGLE_USER_KEY, |data: &mut ReadingData| {
            data.upsert(date_key, record.clone())
        })
    }

    /// Remove the anonymous user's reading data entirely
    pub fn clear_single_user_data(&self) -> Result<(), StorageError> {
        let _guard = self.lock_writes()?;
        self.store.remove(SINGLE_USER_KEY)
    }
}

/// Time-based local id, bumped until it does not collide with `existing`
fn next_local_id<'a>(prefix: &str, existing: impl Iterator<Item = &'a str> + Clone) -> String {
    let mut millis = chrono::Utc::now().timestamp_millis();
    loop {
        let candidate = format!("{}{}", prefix, millis);
        if !existing.clone().any(|id| id == candidate) {
            return candidate;
        }
        millis += 1;
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn load_config(&self) -> Result<Option<ChallengeConfig>, StorageError> {
        self.read_json(CONFIG_KEY)
    }

    async fn save_config(&self, config: &ChallengeConfig) -> Result<(), StorageError> {
        let _guard = self.lock_writes()?;
        self.write_json(CONFIG_KEY, config)
    }

    async fn list_participants(&self) -> Result<Vec<Participant>, StorageError> {
        Ok(self.read_json(USERS_KEY)?.unwrap_or_default())
    }

    async fn insert_participant(&self, name: &str, password: &str) -> Result<Participant, StorageError> {
        let participant = self.update_json(USERS_KEY, |users: &mut Vec<Participant>| {
            let id = next_local_id("u", users.iter().map(|u| u.id.as_str()));
            let participant = Participant::new(id, name, password);
            users.push(Participant {
                created_at: Some(today_key()),
                ..participant.clone()
            });
            participant
        })?;
        debug!(id = %participant.id, "Added local participant");
        Ok(participant)
    }

    async fn delete_participant(&self, id: &str) -> Result<(), StorageError> {
        let _guard = self.lock_writes()?;
        let mut users: Vec<Participant> = self.read_for_update(USERS_KEY)?;
        users.retain(|u| u.id != id);
        self.write_json(USERS_KEY, &users)?;

        // Cascade is best-effort: a corrupt mapping is left as is
        match self.read_json::<ParticipantData>(DATA_KEY) {
            Ok(Some(mut all)) => {
                if all.remove(id).is_some() {
                    self.write_json(DATA_KEY, &all)?;
                }
            }
            Ok(None) => {}
            Err(StorageError::Serialization(e)) => {
                warn!(participant_id = id, error = %e, "Skipping reading data cleanup");
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    async fn list_notices(&self) -> Result<Vec<Notice>, StorageError> {
        Ok(self.read_json(NOTICES_KEY)?.unwrap_or_default())
    }

    async fn insert_notice(&self, text: &str) -> Result<Notice, StorageError> {
        self.update_json(NOTICES_KEY, |notices: &mut Vec<Notice>| {
            let id = next_local_id("n", notices.iter().map(|n| n.id.as_str()));
            let notice = Notice::new(id, text, today_key());
            notices.insert(0, notice.clone()); // newest first
            notice
        })
    }

    async fn delete_notice(&self, id: &str) -> Result<(), StorageError> {
        self.update_json(NOTICES_KEY, |notices: &mut Vec<Notice>| {
            notices.retain(|n| n.id != id)
        })
    }

    async fn load_reading_data(&self, participant_id: &str) -> Result<ReadingData, StorageError> {
        let all: ParticipantData = self.read_json(DATA_KEY)?.unwrap_or_default();
        Ok(all.get(participant_id).cloned().unwrap_or_default())
    }

    async fn upsert_reading_record(
        &self,
        participant_id: &str,
        date_key: &str,
        record: &ReadingRecord,
    ) -> Result<(), StorageError> {
        self.update_json(DATA_KEY, |all: &mut ParticipantData| {
            all.entry(participant_id.to_string())
                .or_default()
                .upsert(date_key, record.clone())
        })
    }

    async fn delete_reading_data(&self, participant_id: &str) -> Result<(), StorageError> {
        self.update_json(DATA_KEY, |all: &mut ParticipantData| {
            all.remove(participant_id);
        })
    }
}
