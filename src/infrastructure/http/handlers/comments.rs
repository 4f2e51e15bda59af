//! Comment Handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::AttachOutcome;
use crate::infrastructure::http::dto::AnnotationDto;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub path: String,
    pub cell_index: usize,
    pub comment_text: String,
}

#[derive(Debug, Serialize)]
pub struct AddCommentResponse {
    /// false 表示完全相同的批注已存在，被静默拒绝
    pub added: bool,
    pub annotations: Vec<AnnotationDto>,
}

pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddCommentRequest>,
) -> Result<Json<AddCommentResponse>, ApiError> {
    if req.comment_text.trim().is_empty() {
        return Err(ApiError::BadRequest("comment_text cannot be empty".to_string()));
    }

    let (outcome, annotations) = state
        .annotations
        .add_comment_for_cell(&req.path, req.cell_index, &req.comment_text)
        .await?;

    Ok(Json(AddCommentResponse {
        added: matches!(outcome, AttachOutcome::Inserted(_)),
        annotations: annotations.iter().map(AnnotationDto::from).collect(),
    }))
}
