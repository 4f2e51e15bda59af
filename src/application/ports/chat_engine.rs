//! Chat Engine Port - 对话补全服务抽象
//!
//! 针对某个 Cell 提问的出站端口，具体实现在
//! infrastructure/adapters 层（OpenAI HTTP 客户端）

use async_trait::async_trait;
use thiserror::Error;

/// 对话补全错误
///
/// 调用方（AnnotationService）不向外传播这些错误，
/// 而是把错误文本当作应答存储，保证交互历史完整
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("API key not configured")]
    MissingApiKey,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 提问时携带的上下文
#[derive(Debug, Clone)]
pub struct ChatContext {
    /// 用户问题
    pub question: String,
    /// 当前 Cell 的原始内容
    pub cell_text: String,
    /// 整个文件的内容
    pub file_content: String,
    /// 该 Cell 已有批注的正文，按创建时间排序
    pub prior_annotations: Vec<String>,
}

/// 对话补全引擎端口
#[async_trait]
pub trait ChatEnginePort: Send + Sync {
    /// 返回应答文本
    async fn ask(&self, context: ChatContext) -> Result<String, ChatError>;
}
