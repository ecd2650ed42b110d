// Reading66 Data Library
// Persistence layer for the 66-day reading challenge: configuration,
// participants, notices and daily reading records, stored either in a
// hosted PostgREST database or in a local key-value store.

pub mod config;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod storage;

pub use config::{ConfigError, GatewaySettings, LocalSettings, RemoteSettings};
pub use gateway::DataGateway;
pub use models::{
    ChallengeConfig, Notice, PagesInput, Participant, ReadingData, ReadingPayload, ReadingRecord,
};
pub use storage::{
    BackendKind, KeyValueStore, MemoryStore, SqliteStore, StorageBackend, StorageError,
};
