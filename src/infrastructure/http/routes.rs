//! HTTP Routes
//!
//! API 路由定义
//!
//! API Endpoints:
//! - /api/ping              GET   健康检查
//! - /api/tree              GET   目录列举 (?path=&markdown_only=)
//! - /api/tree/state        GET   读取树展开状态 (?kind=tree|favorites)
//! - /api/tree/state        POST  保存树展开状态（防抖）
//! - /api/favorites         GET   收藏列表
//! - /api/favorites/toggle  POST  切换收藏
//! - /api/file              GET   文件详情：分段 + 批注解析 (?path=)
//! - /api/comments          POST  追加批注
//! - /api/export            POST  导出带批注副本
//! - /api/session           GET   读取会话
//! - /api/session           POST  合并更新会话
//! - /api/settings          GET   读取设置
//! - /api/settings          POST  更新设置
//! - /api/ai/chat           POST  针对 Cell 的 AI 提问
//! - /api/narration/toggle  POST  切换自动朗读
//! - /api/narration/stop    POST  停止朗读
//! - /api/narration/read    POST  按需读取相邻批注

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/tree", get(handlers::list_tree))
        .route(
            "/tree/state",
            get(handlers::get_tree_state).post(handlers::save_tree_state),
        )
        .route("/favorites", get(handlers::list_favorites))
        .route("/favorites/toggle", post(handlers::toggle_favorite))
        .route("/file", get(handlers::get_file))
        .route("/comments", post(handlers::add_comment))
        .route("/export", post(handlers::export_file))
        .route(
            "/session",
            get(handlers::get_session).post(handlers::update_session),
        )
        .route(
            "/settings",
            get(handlers::get_settings).post(handlers::update_settings),
        )
        .route("/ai/chat", post(handlers::ai_chat))
        .nest("/narration", narration_routes())
}

/// Narration 路由
fn narration_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/toggle", post(handlers::toggle_narration))
        .route("/stop", post(handlers::stop_narration))
        .route("/read", post(handlers::read_comment))
}
