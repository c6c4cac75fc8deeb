use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Provider unreachable or answered with a non-success status
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Provider throttled the request (HTTP 429)
    #[error("Upstream rate limited: {0}")]
    UpstreamRateLimited(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A newer request for the same section started before this one finished
    #[error("Request superseded by a newer request")]
    Superseded,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for failures that should degrade to an empty result rather than surface
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            AppError::UpstreamUnavailable(_)
                | AppError::UpstreamRateLimited(_)
                | AppError::HttpClient(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Superseded => (StatusCode::CONFLICT, "superseded".to_string()),
            AppError::Cache(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::UpstreamRateLimited(msg) => (StatusCode::TOO_MANY_REQUESTS, msg),
            AppError::UpstreamUnavailable(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::HttpClient(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_errors_are_flagged() {
        assert!(AppError::UpstreamUnavailable("503".to_string()).is_upstream());
        assert!(AppError::UpstreamRateLimited("429".to_string()).is_upstream());
        assert!(!AppError::NotFound("x".to_string()).is_upstream());
        assert!(!AppError::Superseded.is_upstream());
    }

    #[test]
    fn test_status_mapping() {
        let response = AppError::Superseded.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = AppError::UpstreamRateLimited("slow down".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let response = AppError::InvalidInput("bad".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
