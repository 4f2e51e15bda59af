//! Lenk - Markdown 批注与朗读引擎
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - segmenter: 文档分段（标题切分 / 空行切分）
//! - annotation: Cell 内容指纹、标题提取、匹配置信度
//! - tree: 目录树展开状态
//!
//! 应用层 (application/):
//! - Ports: 端口定义（Repositories, SpeechEngine, ChatEngine）
//! - AnnotationService: 两级批注匹配、AI 提问、带批注导出
//! - NarrationScheduler: 串行朗读队列与按需读取
//! - SessionService: 会话与树状态持久化（防抖）
//! - WorkspaceService: 目录浏览、收藏夹、设置
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: axum RESTful API + 静态 Web UI
//! - Persistence: SQLite 存储
//! - Adapters: say 子进程合成引擎、OpenAI 客户端

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
