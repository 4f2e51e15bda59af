//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod chat_engine;
mod repositories;
mod speech_engine;

pub use chat_engine::{ChatContext, ChatEnginePort, ChatError};
pub use repositories::{
    setting_keys, AnnotationRepositoryPort, FavoriteRepositoryPort, NewAnnotation,
    RepositoryError, SessionRecord, SessionRepositoryPort, SessionSnapshot,
    SettingsRepositoryPort,
};
pub use speech_engine::{SpeechEnginePort, SpeechError, SpeechJob};
