//! Remote storage backend
//!
//! Talks to a PostgREST endpoint (the REST layer Supabase exposes) over four
//! tables:
//!
//! - `challenge_config(id, start_date, total_days, goal_pages, updated_at)`
//! - `participants(id, name, password, created_at)`
//! - `notices(id, text, created_at)`
//! - `reading_records(participant_id, record_date, pages, book_title, thought)`,
//!   unique on `(participant_id, record_date)`
//!
//! Deleting a participant relies on the `reading_records.participant_id`
//! foreign key being declared `ON DELETE CASCADE`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use super::backend::{BackendKind, StorageBackend};
use super::error::StorageError;
use crate::config::RemoteSettings;
use crate::models::{
    today_key, truncate_chars, ChallengeConfig, Notice, Participant, ReadingData, ReadingRecord,
    CONFIG_ID, DEFAULT_GOAL_PAGES, DEFAULT_TOTAL_DAYS,
};

const CONFIG_TABLE: &str = "challenge_config";
const PARTICIPANTS_TABLE: &str = "participants";
const NOTICES_TABLE: &str = "notices";
const RECORDS_TABLE: &str = "reading_records";

const PARTICIPANT_COLUMNS: &str = "id,name,password";
const NOTICE_COLUMNS: &str = "id,text,created_at";
const RECORD_COLUMNS: &str = "record_date,pages,book_title,thought";

/// PostgREST error body
#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConfigRow {
    start_date: Option<String>,
    total_days: Option<i64>,
    goal_pages: Option<i64>,
}

#[derive(Debug, Serialize)]
struct ConfigUpsert<'a> {
    id: &'a str,
    start_date: &'a str,
    total_days: u32,
    goal_pages: u32,
    updated_at: String,
}

#[derive(Debug, Deserialize)]
struct ParticipantRow {
    #[serde(deserialize_with = "deserialize_opaque_id")]
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

#[derive(Debug, Serialize)]
struct ParticipantInsert<'a> {
    name: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct NoticeRow {
    #[serde(deserialize_with = "deserialize_opaque_id")]
    id: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

#[derive(Debug, Serialize)]
struct NoticeInsert<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct RecordRow {
    #[serde(default)]
    record_date: Option<String>,
    #[serde(default)]
    pages: Option<i64>,
    #[serde(default)]
    book_title: Option<String>,
    #[serde(default)]
    thought: Option<String>,
}

#[derive(Debug, Serialize)]
struct RecordUpsert<'a> {
    participant_id: &'a str,
    record_date: &'a str,
    pages: u32,
    book_title: &'a str,
    thought: &'a str,
}

impl From<ConfigRow> for ChallengeConfig {
    fn from(row: ConfigRow) -> Self {
        Self {
            start_date: row
                .start_date
                .filter(|d| !d.is_empty())
                .map(|d| truncate_chars(&d, 10))
                .unwrap_or_else(today_key),
            total_days: row
                .total_days
                .and_then(|d| u32::try_from(d).ok())
                .unwrap_or(DEFAULT_TOTAL_DAYS),
            goal_pages: row
                .goal_pages
                .and_then(|g| u32::try_from(g).ok())
                .unwrap_or(DEFAULT_GOAL_PAGES),
        }
    }
}

impl From<ParticipantRow> for Participant {
    fn from(row: ParticipantRow) -> Self {
        Participant::new(
            row.id,
            row.name.unwrap_or_default(),
            row.password.unwrap_or_default(),
        )
    }
}

impl From<NoticeRow> for Notice {
    fn from(row: NoticeRow) -> Self {
        Notice::new(
            row.id,
            row.text.unwrap_or_default(),
            row.created_at
                .map(|c| truncate_chars(&c, 19))
                .unwrap_or_default(),
        )
    }
}

/// Ids are uuids or bigints depending on the table definition
fn deserialize_opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("unsupported id value: {}", other))),
    }
}

fn rows_to_reading_data(rows: Vec<RecordRow>) -> ReadingData {
    let mut data = ReadingData::default();
    for row in rows {
        let key = row
            .record_date
            .map(|d| truncate_chars(&d, 10))
            .unwrap_or_default();
        if key.is_empty() {
            continue;
        }
        let pages = row
            .pages
            .map(|p| u32::try_from(p.max(0)).unwrap_or(u32::MAX))
            .unwrap_or(0);
        data.upsert(
            key,
            ReadingRecord::new(
                pages,
                row.book_title.unwrap_or_default(),
                row.thought.unwrap_or_default(),
            ),
        );
    }
    data
}

/// PostgREST client
pub struct RemoteBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RemoteBackend {
    /// Build the HTTP client for `settings`
    ///
    /// Fails when the client cannot be constructed (e.g. TLS backend
    /// initialization error).
    pub fn new(settings: &RemoteSettings) -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.url.trim_end_matches('/').to_string(),
            api_key: settings.anon_key.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header(ACCEPT, "application/json")
    }

    /// Turn a non-2xx response into the backend's error message
    async fn check(response: Response) -> Result<Response, StorageError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<PostgrestError>(&body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| format!("HTTP {}: {}", status, body));
        Err(StorageError::Backend(message))
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, StorageError> {
        debug!(table, "select");
        let response = self.request(Method::GET, table).query(query).send().await?;
        let rows = Self::check(response).await?.json().await?;
        Ok(rows)
    }

    /// Insert one row and return it as stored
    async fn insert_returning<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        columns: &str,
        body: &B,
    ) -> Result<T, StorageError> {
        debug!(table, "insert");
        let response = self
            .request(Method::POST, table)
            .query(&[("select", columns)])
            .header(CONTENT_TYPE, "application/json")
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        let rows: Vec<T> = Self::check(response).await?.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StorageError::Backend(format!("Insert into {} returned no row", table)))
    }

    async fn upsert<B: Serialize + ?Sized>(
        &self,
        table: &str,
        on_conflict: &str,
        body: &B,
    ) -> Result<(), StorageError> {
        debug!(table, on_conflict, "upsert");
        let response = self
            .request(Method::POST, table)
            .query(&[("on_conflict", on_conflict)])
            .header(CONTENT_TYPE, "application/json")
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn delete_where(&self, table: &str, column: &str, value: &str) -> Result<(), StorageError> {
        debug!(table, column, "delete");
        let filter = format!("eq.{}", value);
        let response = self
            .request(Method::DELETE, table)
            .query(&[(column, filter.as_str())])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for RemoteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    async fn load_config(&self) -> Result<Option<ChallengeConfig>, StorageError> {
        let id_filter = format!("eq.{}", CONFIG_ID);
        let rows: Vec<ConfigRow> = self
            .select(CONFIG_TABLE, &[("select", "*"), ("id", id_filter.as_str())])
            .await?;
        Ok(rows.into_iter().next().map(ChallengeConfig::from))
    }

    async fn save_config(&self, config: &ChallengeConfig) -> Result<(), StorageError> {
        let row = ConfigUpsert {
            id: CONFIG_ID,
            start_date: &config.start_date,
            total_days: config.total_days_or_default(),
            goal_pages: config.goal_pages_or_default(),
            updated_at: chrono::Utc::now().to_rfc3339(),
        };
        self.upsert(CONFIG_TABLE, "id", &row).await
    }

    async fn list_participants(&self) -> Result<Vec<Participant>, StorageError> {
        let rows: Vec<ParticipantRow> = self
            .select(
                PARTICIPANTS_TABLE,
                &[("select", PARTICIPANT_COLUMNS), ("order", "created_at.asc")],
            )
            .await?;
        Ok(rows.into_iter().map(Participant::from).collect())
    }

    async fn insert_participant(&self, name: &str, password: &str) -> Result<Participant, StorageError> {
        let row: ParticipantRow = self
            .insert_returning(
                PARTICIPANTS_TABLE,
                PARTICIPANT_COLUMNS,
                &ParticipantInsert { name, password },
            )
            .await?;
        Ok(row.into())
    }

    async fn delete_participant(&self, id: &str) -> Result<(), StorageError> {
        self.delete_where(PARTICIPANTS_TABLE, "id", id).await
    }

    async fn list_notices(&self) -> Result<Vec<Notice>, StorageError> {
        let rows: Vec<NoticeRow> = self
            .select(
                NOTICES_TABLE,
                &[("select", NOTICE_COLUMNS), ("order", "created_at.desc")],
            )
            .await?;
        Ok(rows.into_iter().map(Notice::from).collect())
    }

    async fn insert_notice(&self, text: &str) -> Result<Notice, StorageError> {
        let row: NoticeRow = self
            .insert_returning(NOTICES_TABLE, NOTICE_COLUMNS, &NoticeInsert { text })
            .await?;
        Ok(row.into())
    }

    async fn delete_notice(&self, id: &str) -> Result<(), StorageError> {
        self.delete_where(NOTICES_TABLE, "id", id).await
    }

    async fn load_reading_data(&self, participant_id: &str) -> Result<ReadingData, StorageError> {
        let filter = format!("eq.{}", participant_id);
        let rows: Vec<RecordRow> = self
            .select(
                RECORDS_TABLE,
                &[("select", RECORD_COLUMNS), ("participant_id", filter.as_str())],
            )
            .await?;
        Ok(rows_to_reading_data(rows))
    }

    async fn upsert_reading_record(
        &self,
        participant_id: &str,
        date_key: &str,
        record: &ReadingRecord,
    ) -> Result<(), StorageError> {
        let row = RecordUpsert {
            participant_id,
            record_date: date_key,
            pages: record.pages,
            book_title: &record.book_title,
            thought: &record.thought,
        };
        self.upsert(RECORDS_TABLE, "participant_id,record_date", &row)
            .await
    }

    async fn delete_reading_data(&self, participant_id: &str) -> Result<(), StorageError> {
        self.delete_where(RECORDS_TABLE, "participant_id", participant_id)
            .await
    }
}
