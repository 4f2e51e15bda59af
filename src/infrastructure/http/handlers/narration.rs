//! Narration Handlers
//!
//! 朗读开关、停止与按需读取

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

#[derive(Debug, Serialize)]
pub struct NarrationStatusResponse {
    pub enabled: bool,
    pub narrating: bool,
    pub queued: usize,
}

pub async fn toggle_narration(
    State(state): State<Arc<AppState>>,
) -> Json<NarrationStatusResponse> {
    let enabled = !state.narration.is_enabled();
    state.narration.set_enabled(enabled);
    Json(NarrationStatusResponse {
        enabled,
        narrating: state.narration.is_narrating(),
        queued: state.narration.queue_len(),
    })
}

pub async fn stop_narration(
    State(state): State<Arc<AppState>>,
) -> Json<NarrationStatusResponse> {
    state.narration.stop();
    Json(NarrationStatusResponse {
        enabled: state.narration.is_enabled(),
        narrating: false,
        queued: 0,
    })
}

#[derive(Debug, Deserialize)]
pub struct ReadCommentRequest {
    pub path: String,
    pub cell_index: usize,
    /// +1 下一条，-1 上一条
    pub direction: i32,
}

#[derive(Debug, Serialize)]
pub struct ReadCommentResponse {
    /// 读取的批注序号（0 起始）；该 Cell 没有批注时为 None
    pub index: Option<usize>,
    pub total: usize,
}

pub async fn read_comment(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReadCommentRequest>,
) -> Result<Json<ReadCommentResponse>, ApiError> {
    let read = state
        .annotations
        .read_comment_relative(&req.path, req.cell_index, req.direction)
        .await?;

    Ok(Json(match read {
        Some((index, total)) => ReadCommentResponse {
            index: Some(index),
            total,
        },
        None => ReadCommentResponse {
            index: None,
            total: 0,
        },
    }))
}
