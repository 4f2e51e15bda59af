//! Session Handlers
//!
//! "当前目录 / 当前文件 / 当前 Cell" 单例会话

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::ports::SessionSnapshot;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

#[derive(Debug, Serialize)]
pub struct SessionDto {
    pub current_directory: Option<String>,
    pub current_file: Option<String>,
    pub current_cell: i64,
}

impl From<SessionSnapshot> for SessionDto {
    fn from(snapshot: SessionSnapshot) -> Self {
        Self {
            current_directory: snapshot.current_directory,
            current_file: snapshot.current_file,
            current_cell: snapshot.current_cell,
        }
    }
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionDto>, ApiError> {
    let snapshot = state.session.load().await?;
    Ok(Json(snapshot.into()))
}

#[derive(Debug, Deserialize)]
pub struct UpdateSessionRequest {
    #[serde(default)]
    pub current_directory: Option<String>,
    #[serde(default)]
    pub current_file: Option<String>,
    #[serde(default)]
    pub current_cell: Option<i64>,
}

/// 合并式更新：缺省字段沿用既有会话值
pub async fn update_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateSessionRequest>,
) -> Result<Json<SessionDto>, ApiError> {
    let merged = state
        .session
        .update(req.current_directory, req.current_file, req.current_cell)
        .await?;
    Ok(Json(merged.into()))
}
