//! 数据网关
//!
//! 读书挑战的统一数据入口。构造时根据 [`GatewaySettings`] 选定后端：
//! 远程配置完整（URL + 密钥）且 HTTP 客户端可用时走远程 PostgREST，
//! 否则走本地键值存储。
//!
//! 错误策略只在本模块实现一次：
//! - 读操作：后端或解析错误记录 warn 日志后返回默认值（空列表 / 空映射 / 默认配置）
//! - 写操作：错误原样返回给调用方
//!
//! 未指定参与者的阅读数据（匿名单用户）始终保存在本地存储中。

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::GatewaySettings;
use crate::models::{ChallengeConfig, Notice, Participant, ReadingData, ReadingPayload};
use crate::storage::{
    BackendKind, KeyValueStore, LocalBackend, RemoteBackend, SqliteStore, StorageBackend,
    StorageError,
};

/// 读操作失败时记录日志并返回默认值
fn read_or_default<T: Default>(operation: &str, result: Result<T, StorageError>) -> T {
    result.unwrap_or_else(|e| {
        warn!(operation, error = %e, "Read failed, using default");
        T::default()
    })
}

/// 空字符串的参与者 ID 视为未指定
fn participant(participant_id: Option<&str>) -> Option<&str> {
    participant_id.filter(|id| !id.is_empty())
}

/// 数据网关
pub struct DataGateway {
    /// 当前选定的后端
    backend: Arc<dyn StorageBackend>,
    /// 本地后端（匿名单用户数据始终走这里）
    local: LocalBackend,
}

impl DataGateway {
    /// 根据配置创建网关
    ///
    /// # Arguments
    /// * `settings` - 网关配置（决定远程 / 本地）
    /// * `store` - 本地键值存储
    pub fn new(settings: &GatewaySettings, store: Arc<dyn KeyValueStore>) -> Self {
        let local = LocalBackend::new(store);

        let backend: Arc<dyn StorageBackend> = match settings.remote_settings() {
            Some(remote) => match RemoteBackend::new(remote) {
                Ok(backend) => Arc::new(backend),
                Err(e) => {
                    warn!(error = %e, "Remote client unavailable, falling back to local store");
                    Arc::new(local.clone())
                }
            },
            None => Arc::new(local.clone()),
        };

        info!(backend = backend.kind().as_str(), "Data gateway ready");
        Self { backend, local }
    }

    /// 仅使用本地存储
    pub fn local(store: Arc<dyn KeyValueStore>) -> Self {
        Self::new(&GatewaySettings::local_only(), store)
    }

    /// 根据配置创建网关，并打开配置中的本地 SQLite 文件
    ///
    /// 未配置 `local.path` 时使用内存存储。
    pub fn from_settings(settings: &GatewaySettings) -> Result<Self, StorageError> {
        let store: Arc<dyn KeyValueStore> = match settings.local.path.as_deref() {
            Some(path) => Arc::new(SqliteStore::open(path)?),
            None => Arc::new(SqliteStore::open_in_memory()?),
        };
        Ok(Self::new(settings, store))
    }

    /// 打开指定路径的本地 SQLite 存储，仅本地模式
    pub fn open_local(path: &Path) -> Result<Self, StorageError> {
        Self::from_settings(&GatewaySettings::local_only().with_local_path(path))
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// 是否使用远程后端
    pub fn uses_remote_backend(&self) -> bool {
        self.backend_kind() == BackendKind::Remote
    }

    // ---------- 配置 ----------

    /// 获取挑战配置，不存在或读取失败时返回默认配置（开始日期为今天）
    pub async fn get_config(&self) -> ChallengeConfig {
        read_or_default("get_config", self.backend.load_config().await).unwrap_or_default()
    }

    /// 保存挑战配置（整体覆盖）
    pub async fn save_config(&self, config: &ChallengeConfig) -> Result<(), StorageError> {
        self.backend.save_config(config).await
    }

    // ---------- 参与者 ----------

    /// 获取参与者列表（按创建顺序）
    pub async fn get_users(&self) -> Vec<Participant> {
        read_or_default("get_users", self.backend.list_participants().await)
    }

    /// 添加参与者，返回带生成 ID 的参与者
    pub async fn add_participant(&self, name: &str, password: &str) -> Result<Participant, StorageError> {
        self.backend.insert_participant(name, password).await
    }

    /// 删除参与者及其全部阅读记录
    pub async fn delete_participant(&self, id: &str) -> Result<(), StorageError> {
        self.backend.delete_participant(id).await
    }

    // ---------- 公告 ----------

    /// 获取公告列表（最新在前）
    pub async fn get_notices(&self) -> Vec<Notice> {
        read_or_default("get_notices", self.backend.list_notices().await)
    }

    pub async fn add_notice(&self, text: &str) -> Result<Notice, StorageError> {
        self.backend.insert_notice(text).await
    }

    pub async fn delete_notice(&self, id: &str) -> Result<(), StorageError> {
        self.backend.delete_notice(id).await
    }

    // ---------- 阅读记录 ----------

    /// 获取阅读数据
    ///
    /// - 指定参与者：读取该参与者的记录
    /// - 未指定参与者：本地模式读取匿名单用户数据；远程模式没有匿名用户，返回空映射
    pub async fn get_reading_data(&self, participant_id: Option<&str>) -> ReadingData {
        match participant(participant_id) {
            Some(id) => read_or_default(
                "get_reading_data",
                self.backend.load_reading_data(id).await,
            ),
            None if self.uses_remote_backend() => ReadingData::default(),
            None => read_or_default("get_reading_data", self.local.load_single_user_data()),
        }
    }

    /// 保存某天的阅读记录（同一参与者同一天只保留一条）
    ///
    /// 页数规整为非负整数，书名与感想去除首尾空白。未指定参与者
    /// （或 ID 为空字符串）时写入本地匿名单用户数据。
    pub async fn save_reading_record(
        &self,
        participant_id: Option<&str>,
        date_key: &str,
        payload: &ReadingPayload,
    ) -> Result<(), StorageError> {
        let record = payload.normalize();
        match participant(participant_id) {
            Some(id) => self.backend.upsert_reading_record(id, date_key, &record).await,
            None => self.local.save_single_user_record(date_key, &record),
        }
    }

    /// 删除阅读数据
    ///
    /// 指定参与者时删除该参与者的全部记录；否则移除本地匿名单用户数据。
    pub async fn delete_all_reading_data(&self, participant_id: Option<&str>) -> Result<(), StorageError> {
        match participant(participant_id) {
            Some(id) => self.backend.delete_reading_data(id).await,
            None => self.local.clear_single_user_data(),
        }
    }

    /// 获取本地匿名单用户数据，不受后端选择影响
    pub async fn get_single_user_reading_data(&self) -> ReadingData {
        read_or_default(
            "get_single_user_reading_data",
            self.local.load_single_user_data(),
        )
    }
}
