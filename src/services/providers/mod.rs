/// Catalog data provider abstraction
///
/// The fetch layer talks to a metadata provider (TMDB) for trending lists,
/// details and streaming availability, and optionally to an awards source
/// (OMDb). Both sit behind traits so the pipeline can be driven by mocks.
use std::time::Duration;

use crate::{
    error::AppResult,
    models::{CatalogId, CatalogRequest, MediaType, RawRecord, RegionOffers},
};

pub mod omdb;
pub mod tmdb;

pub use omdb::OmdbAwardsProvider;
pub use tmdb::TmdbProvider;

/// Trait for content metadata providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Fetch one page of trending titles
    ///
    /// Returns raw provider records; records may lack an `id` and must be
    /// filtered by the caller.
    async fn fetch_trending(&self, request: &CatalogRequest) -> AppResult<Vec<RawRecord>>;

    /// Fetch full details for a single title
    async fn fetch_details(&self, media_type: MediaType, id: &CatalogId) -> AppResult<RawRecord>;

    /// Fetch the offers for the configured watch region
    ///
    /// `None` when the title is not offered in that region at all.
    async fn fetch_watch_providers(
        &self,
        media_type: MediaType,
        id: &CatalogId,
    ) -> AppResult<Option<RegionOffers>>;

    /// Resolve the IMDB ID used to look up award data
    async fn fetch_imdb_id(&self, media_type: MediaType, id: &CatalogId)
        -> AppResult<Option<String>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Trait for award metadata sources
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AwardsProvider: Send + Sync {
    /// Fetch the award summary for an IMDB ID, `None` when the source has nothing
    async fn fetch_awards(&self, imdb_id: &str) -> AppResult<Option<String>>;

    fn name(&self) -> &'static str;
}

/// Per-request timeout shared by every provider client
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Builds a provider HTTP client bounded by `timeout`
pub(crate) fn http_client(provider: &str, timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, provider, "Falling back to default HTTP client");
            reqwest::Client::new()
        })
}

/// Maps a provider HTTP status to the upstream error taxonomy
pub(crate) fn status_error(
    provider: &str,
    status: reqwest::StatusCode,
    body: &str,
) -> crate::error::AppError {
    use crate::error::AppError;

    match status {
        reqwest::StatusCode::TOO_MANY_REQUESTS => AppError::UpstreamRateLimited(format!(
            "{} API returned status {}",
            provider, status
        )),
        reqwest::StatusCode::NOT_FOUND => {
            AppError::NotFound(format!("{} API returned status {}", provider, status))
        }
        _ => AppError::UpstreamUnavailable(format!(
            "{} API returned status {}: {}",
            provider, status, body
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use reqwest::StatusCode;

    #[test]
    fn test_status_error_rate_limited() {
        let err = status_error("TMDB", StatusCode::TOO_MANY_REQUESTS, "");
        assert!(matches!(err, AppError::UpstreamRateLimited(_)));
    }

    #[test]
    fn test_status_error_server_errors_are_unavailable() {
        for status in [
            StatusCode::SERVICE_UNAVAILABLE,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::UNAUTHORIZED,
        ] {
            let err = status_error("TMDB", status, "oops");
            assert!(matches!(err, AppError::UpstreamUnavailable(_)), "{}", status);
        }
    }

    #[test]
    fn test_status_error_not_found() {
        let err = status_error("TMDB", StatusCode::NOT_FOUND, "");
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
