//! AI Chat Handler
//!
//! 针对某个 Cell 的 AI 提问；问题与应答都成为普通批注

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::infrastructure::http::dto::AnnotationDto;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AiChatRequest {
    pub path: String,
    pub cell_index: usize,
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AiChatResponse {
    pub answer: String,
    pub annotations: Vec<AnnotationDto>,
}

pub async fn ai_chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AiChatRequest>,
) -> Result<Json<AiChatResponse>, ApiError> {
    if req.question.trim().is_empty() {
        return Err(ApiError::BadRequest("question cannot be empty".to_string()));
    }

    let result = state
        .annotations
        .ask_ai(&req.path, req.cell_index, &req.question)
        .await?;

    Ok(Json(AiChatResponse {
        answer: result.answer,
        annotations: result.annotations.iter().map(AnnotationDto::from).collect(),
    }))
}
