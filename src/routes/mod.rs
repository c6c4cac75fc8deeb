use axum::{
    http::{HeaderMap, StatusCode},
    middleware,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    error::{AppError, AppResult},
    middleware::{make_span_with_request_id, request_id_middleware},
    services::{ranking::RankOptions, RecommendationService, RequestSequencer},
};

pub mod recommendations;
pub mod titles;
pub mod trending;

/// Header the browser UI sends to scope last-request-wins per client
pub const CLIENT_ID_HEADER: &str = "x-client-id";

const MAX_CLIENT_ID_LEN: usize = 64;

/// Upper bound accepted for `max_results`
pub const MAX_RESULTS_LIMIT: usize = 100;

/// Shared application state
pub struct AppState {
    pub recommendations: RecommendationService,
    pub sequencer: RequestSequencer,
}

impl AppState {
    pub fn new(recommendations: RecommendationService) -> Self {
        Self {
            recommendations,
            sequencer: RequestSequencer::new(),
        }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/recommendations", get(recommendations::recommend))
        .route("/trending/:media_type", get(trending::trending))
        .route("/titles/:media_type/:id", get(titles::get_title))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Reads the optional client scope for request sequencing
///
/// Values that are blank, too long or not visible ASCII are ignored, so the
/// request runs unsequenced.
pub(crate) fn client_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(CLIENT_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| {
            !v.is_empty()
                && v.len() <= MAX_CLIENT_ID_LEN
                && v.bytes().all(|b| b.is_ascii_graphic())
        })
}

/// Validates paging and limit parameters shared by the listing endpoints
pub(crate) fn rank_options(
    page: u32,
    include_non_streaming: bool,
    max_results: Option<usize>,
) -> AppResult<RankOptions> {
    if page == 0 {
        return Err(AppError::InvalidInput("page must be at least 1".to_string()));
    }
    if let Some(max) = max_results {
        if max > MAX_RESULTS_LIMIT {
            return Err(AppError::InvalidInput(format!(
                "max_results cannot exceed {}",
                MAX_RESULTS_LIMIT
            )));
        }
    }

    Ok(RankOptions {
        include_non_streaming,
        max_results,
    })
}

pub(crate) fn default_page() -> u32 {
    1
}

pub(crate) fn default_true() -> bool {
    true
}
