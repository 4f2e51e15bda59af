//! Repository Ports - 出站端口
//!
//! 定义数据持久化的抽象接口
//! 具体实现在 infrastructure 层（SQLite）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{Annotation, MatchConfidence};

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

// ============================================================================
// Annotation Repository
// ============================================================================

/// 待插入的批注（id 与时间戳由存储层生成）
#[derive(Debug, Clone)]
pub struct NewAnnotation {
    pub file_path: String,
    pub heading: String,
    pub content_hash: String,
    pub cell_index: i64,
    pub text: String,
}

/// 批注仓储端口
///
/// 两级匹配的底层查询：先按 (file, heading, hash) 精确检索，
/// 落空时退回 (file, heading) 模糊检索
#[async_trait]
pub trait AnnotationRepositoryPort: Send + Sync {
    /// 精确检索：file、heading、content_hash 全部相等，按 created_at 排序
    async fn find_exact(
        &self,
        file_path: &str,
        heading: &str,
        content_hash: &str,
    ) -> Result<Vec<Annotation>, RepositoryError>;

    /// 模糊检索：file 与 heading 相等（不看 content_hash），按 created_at 排序
    async fn find_by_heading(
        &self,
        file_path: &str,
        heading: &str,
    ) -> Result<Vec<Annotation>, RepositoryError>;

    /// 记录一次成功匹配：刷新 last_matched_at 并改写 confidence
    async fn mark_matched(
        &self,
        ids: &[i64],
        confidence: MatchConfidence,
    ) -> Result<(), RepositoryError>;

    /// 插入批注；(file_path, heading, content_hash, text) 重复时返回 Duplicate
    async fn insert(&self, annotation: &NewAnnotation) -> Result<i64, RepositoryError>;

    /// 删除一条批注
    async fn delete(&self, id: i64) -> Result<(), RepositoryError>;
}

// ============================================================================
// Favorite Repository
// ============================================================================

/// 收藏仓储端口（按规范化路径的集合成员关系）
#[async_trait]
pub trait FavoriteRepositoryPort: Send + Sync {
    async fn is_starred(&self, path: &str) -> Result<bool, RepositoryError>;

    /// 幂等：已收藏时重复插入被吞掉，不报错
    async fn star(&self, path: &str) -> Result<(), RepositoryError>;

    async fn unstar(&self, path: &str) -> Result<(), RepositoryError>;

    /// 按收藏时间倒序
    async fn list_starred(&self) -> Result<Vec<String>, RepositoryError>;
}

// ============================================================================
// Settings Repository
// ============================================================================

/// 设置仓储端口（key -> value 文本）
#[async_trait]
pub trait SettingsRepositoryPort: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError>;

    /// upsert
    async fn set(&self, key: &str, value: &str) -> Result<(), RepositoryError>;
}

/// settings 表中使用的键名
pub mod setting_keys {
    pub const HOME_DIRECTORY: &str = "home_directory";
    pub const VOICE_SPEED: &str = "voice_speed";
    pub const OPENAI_API_KEY: &str = "openai_api_key";
    pub const TREE_STATE: &str = "tree_state";
    pub const FAVORITES_STATE: &str = "favorites_state";
}

// ============================================================================
// Session Repository
// ============================================================================

/// 会话单例快照（session_state 表恒有至多一行，id = 1）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub current_directory: Option<String>,
    pub current_file: Option<String>,
    pub current_cell: i64,
}

/// 已持久化的会话行
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub snapshot: SessionSnapshot,
    pub last_updated: DateTime<Utc>,
}

/// 会话仓储端口
#[async_trait]
pub trait SessionRepositoryPort: Send + Sync {
    /// upsert 单例行（恒定主键）
    async fn save(&self, snapshot: &SessionSnapshot) -> Result<(), RepositoryError>;

    async fn load(&self) -> Result<Option<SessionRecord>, RepositoryError>;
}
