//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（Repository、SpeechEngine、ChatEngine）
//! - annotations: 批注服务（组合根）
//! - narration: 朗读调度器
//! - session: 会话与树状态持久化（含防抖）
//! - workspace: 目录浏览、收藏夹、设置
//! - error: 应用层错误定义

pub mod annotations;
pub mod error;
pub mod narration;
pub mod paths;
pub mod ports;
pub mod session;
pub mod workspace;

pub use annotations::{AnnotationService, AskAiResult, AttachOutcome, FileDetails, ResolvedCell};
pub use error::ApplicationError;
pub use narration::{NarrationItem, NarrationScheduler};
pub use session::{Debouncer, SessionService, TreeKind, DEFAULT_DEBOUNCE};
pub use workspace::{DirectoryEntry, DirectoryListing, FavoriteEntry, WorkspaceService};

pub use ports::{
    setting_keys,
    // Chat engine
    ChatContext,
    ChatEnginePort,
    ChatError,
    // Repositories
    AnnotationRepositoryPort,
    FavoriteRepositoryPort,
    NewAnnotation,
    RepositoryError,
    SessionRecord,
    SessionRepositoryPort,
    SessionSnapshot,
    SettingsRepositoryPort,
    // Speech engine
    SpeechEnginePort,
    SpeechError,
    SpeechJob,
};
