//! File Handlers
//!
//! 文件详情（分段 + 批注解析）与带批注导出

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::infrastructure::http::dto::FileDetailsDto;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FileQuery {
    pub path: String,
}

pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FileQuery>,
) -> Result<Json<FileDetailsDto>, ApiError> {
    let details = state.annotations.file_details(&query.path).await?;
    Ok(Json(FileDetailsDto::from(&details)))
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub exported_path: String,
}

pub async fn export_file(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExportRequest>,
) -> Result<Json<ExportResponse>, ApiError> {
    let exported_path = state.annotations.export_annotated(&req.path).await?;
    Ok(Json(ExportResponse { exported_path }))
}
