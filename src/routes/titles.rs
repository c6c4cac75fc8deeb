use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{CatalogId, MediaType},
    routes::AppState,
    services::presentation::DisplayItem,
};

/// Handler for a single title with streaming availability
pub async fn get_title(
    State(state): State<Arc<AppState>>,
    Path((media_type, id)): Path<(MediaType, String)>,
) -> AppResult<Json<DisplayItem>> {
    let id = CatalogId::parse(&id);
    let item = state.recommendations.title(media_type, &id).await?;
    Ok(Json(item))
}
