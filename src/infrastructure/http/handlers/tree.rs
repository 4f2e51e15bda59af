//! Tree Handlers
//!
//! 目录列举与目录树展开状态的持久化

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::{DirectoryListing, TreeKind};
use crate::domain::tree::TreeViewState;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// List Directory
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListTreeQuery {
    pub path: Option<String>,
    #[serde(default)]
    pub markdown_only: bool,
}

pub async fn list_tree(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListTreeQuery>,
) -> Result<Json<DirectoryListing>, ApiError> {
    let listing = state
        .workspace
        .list_directory(query.path.as_deref(), query.markdown_only)
        .await?;
    Ok(Json(listing))
}

// ============================================================================
// Tree View State
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TreeStateQuery {
    pub kind: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveTreeStateRequest {
    pub kind: String,
    #[serde(default)]
    pub open_paths: Vec<String>,
    #[serde(default)]
    pub selected_path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SaveTreeStateResponse {
    pub saved: bool,
}

fn parse_kind(raw: &str) -> Result<TreeKind, ApiError> {
    TreeKind::from_str(raw)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown tree kind: {}", raw)))
}

pub async fn get_tree_state(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TreeStateQuery>,
) -> Result<Json<TreeViewState>, ApiError> {
    let kind = parse_kind(&query.kind)?;
    let view_state = state.session.load_tree_state(kind).await?;
    Ok(Json(view_state))
}

/// 展开状态保存走防抖路径：突发的展开/折叠只落盘最后一次
pub async fn save_tree_state(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveTreeStateRequest>,
) -> Result<Json<SaveTreeStateResponse>, ApiError> {
    let kind = parse_kind(&req.kind)?;
    state.session.schedule_tree_state_save(
        kind,
        TreeViewState {
            open_paths: req.open_paths,
            selected_path: req.selected_path,
        },
    );
    Ok(Json(SaveTreeStateResponse { saved: true }))
}
