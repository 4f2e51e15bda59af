//! Infrastructure Layer - 基础设施层
//!
//! 六边形架构的出站适配器与入站 HTTP 表面:
//! - persistence: sqlx sqlite 仓储实现
//! - adapters: 语音合成子进程 / 对话补全 HTTP 客户端
//! - http: axum 服务器、路由与 handler

pub mod adapters;
pub mod http;
pub mod persistence;
