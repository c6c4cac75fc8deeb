use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{CatalogRequest, MediaType, TimeWindow},
    routes::{default_page, default_true, rank_options, AppState},
    services::presentation::DisplayItem,
};

#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    #[serde(default)]
    pub time_window: TimeWindow,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_true")]
    pub include_non_streaming: bool,
    #[serde(default)]
    pub max_results: Option<usize>,
}

/// Handler for the trending list endpoint
pub async fn trending(
    State(state): State<Arc<AppState>>,
    Path(media_type): Path<MediaType>,
    Query(query): Query<TrendingQuery>,
) -> AppResult<Json<Vec<DisplayItem>>> {
    let options = rank_options(query.page, query.include_non_streaming, query.max_results)?;
    let request = CatalogRequest::trending(media_type, query.time_window, query.page);

    let items = state.recommendations.trending(&request, &options).await?;
    Ok(Json(items))
}
