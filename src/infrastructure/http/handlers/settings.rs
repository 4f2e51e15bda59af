//! Settings Handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::workspace::WorkspaceSettings;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// API key 刻意不回显，只报告是否已配置
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<WorkspaceSettings>, ApiError> {
    let settings = state.workspace.current_settings().await?;
    Ok(Json(settings))
}

#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    #[serde(default)]
    pub home_directory: Option<String>,
    #[serde(default)]
    pub voice_speed: Option<u32>,
    #[serde(default)]
    pub openai_api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateSettingsResponse {
    pub updated: bool,
}

pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateSettingsRequest>,
) -> Result<Json<UpdateSettingsResponse>, ApiError> {
    state
        .workspace
        .update_settings(
            req.home_directory.as_deref(),
            req.voice_speed,
            req.openai_api_key.as_deref(),
        )
        .await?;
    Ok(Json(UpdateSettingsResponse { updated: true }))
}
