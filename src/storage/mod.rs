//! Storage module for reading66
//!
//! Two interchangeable backends behind [`StorageBackend`]: a hosted
//! PostgREST database and a local key-value store (SQLite file or memory).

mod backend;
mod database;
mod error;
mod kv;
mod local;
mod remote;

pub use backend::{BackendKind, StorageBackend};
pub use database::SqliteStore;
pub use error::{ErrorResponse, StorageError};
pub use kv::{KeyValueStore, MemoryStore};
pub use local::{LocalBackend, CONFIG_KEY, DATA_KEY, NOTICES_KEY, SINGLE_USER_KEY, USERS_KEY};
pub use remote::RemoteBackend;
