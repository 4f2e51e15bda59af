//! Favorites Handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::FavoriteEntry;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

#[derive(Debug, Serialize)]
pub struct FavoritesResponse {
    pub favorites: Vec<FavoriteEntry>,
}

pub async fn list_favorites(
    State(state): State<Arc<AppState>>,
) -> Result<Json<FavoritesResponse>, ApiError> {
    let favorites = state.workspace.favorites().await?;
    Ok(Json(FavoritesResponse { favorites }))
}

#[derive(Debug, Deserialize)]
pub struct ToggleFavoriteRequest {
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct ToggleFavoriteResponse {
    pub path: String,
    pub starred: bool,
}

pub async fn toggle_favorite(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ToggleFavoriteRequest>,
) -> Result<Json<ToggleFavoriteResponse>, ApiError> {
    let starred = state.workspace.toggle_star(&req.path).await?;
    Ok(Json(ToggleFavoriteResponse {
        path: req.path,
        starred,
    }))
}
