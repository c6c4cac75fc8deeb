use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{CatalogRequest, MediaType, TimeWindow},
    routes::{client_id, default_page, default_true, rank_options, AppState},
    services::presentation::DisplayBuckets,
};

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    #[serde(default = "default_media_type")]
    pub media_type: MediaType,
    #[serde(default)]
    pub time_window: TimeWindow,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_true")]
    pub include_non_streaming: bool,
    #[serde(default)]
    pub max_results: Option<usize>,
}

fn default_media_type() -> MediaType {
    MediaType::Tv
}

/// Handler for the dashboard recommendations endpoint
///
/// When the caller sends `x-client-id`, a response that finished after a newer
/// request from the same client is discarded with 409.
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
    Query(query): Query<RecommendationQuery>,
) -> AppResult<Json<DisplayBuckets>> {
    let options = rank_options(query.page, query.include_non_streaming, query.max_results)?;
    let request = CatalogRequest::trending(query.media_type, query.time_window, query.page);

    let ticket = client_id(&headers)
        .map(|client| state.sequencer.begin(&format!("{}:recommendations", client)));

    tracing::info!(
        request_id = %request_id,
        media_type = %request.media_type,
        time_window = request.time_window.as_str(),
        page = request.page,
        "Processing recommendation request"
    );

    let buckets = state.recommendations.recommend(&request, &options).await?;

    if let Some(ticket) = ticket {
        if !state.sequencer.is_current(&ticket) {
            tracing::info!(
                request_id = %request_id,
                sequence = ticket.sequence(),
                "Discarding superseded recommendation response"
            );
            return Err(AppError::Superseded);
        }
    }

    Ok(Json(buckets))
}
