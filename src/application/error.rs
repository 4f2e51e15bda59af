//! 应用层错误定义
//!
//! 统一的服务层错误类型

use thiserror::Error;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 文件或路径不存在/不可读
    #[error("{resource} not found: {path}")]
    NotFound { resource: &'static str, path: String },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Cell 序号超出当前分段范围
    #[error("Cell index out of range: {index} (total cells: {total})")]
    OutOfRange { index: usize, total: usize },

    /// 仓储错误
    #[error("Repository error: {0}")]
    RepositoryError(String),

    /// 外部服务错误
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    /// IO 错误
    #[error("IO error: {0}")]
    IoError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource: &'static str, path: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            path: path.into(),
        }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<crate::application::ports::RepositoryError> for ApplicationError {
    fn from(err: crate::application::ports::RepositoryError) -> Self {
        Self::RepositoryError(err.to_string())
    }
}

impl From<std::io::Error> for ApplicationError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}
