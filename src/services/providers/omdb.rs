/// OMDb awards provider
///
/// OMDb exposes a free-text `Awards` field per IMDB title. We only fetch that
/// field; parsing into counts happens in the normalizer.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::OmdbTitle,
    services::providers::{http_client, status_error, AwardsProvider, REQUEST_TIMEOUT},
};
use reqwest::Client as HttpClient;
use std::time::Duration;

const AWARDS_CACHE_TTL: u64 = 604800; // 1 week

#[derive(Clone)]
pub struct OmdbAwardsProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Cache,
}

impl OmdbAwardsProvider {
    pub fn new(cache: Cache, api_key: String, api_url: String) -> Self {
        Self {
            http_client: http_client("omdb", REQUEST_TIMEOUT),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            cache,
        }
    }

    /// Replaces the default per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http_client = http_client("omdb", timeout);
        self
    }
}

#[async_trait::async_trait]
impl AwardsProvider for OmdbAwardsProvider {
    async fn fetch_awards(&self, imdb_id: &str) -> AppResult<Option<String>> {
        if imdb_id.trim().is_empty() {
            return Err(AppError::InvalidInput("IMDB ID cannot be empty".to_string()));
        }

        cached!(
            self.cache,
            CacheKey::Awards(imdb_id.to_string()),
            AWARDS_CACHE_TTL,
            async move {
                let url = format!("{}/", self.api_url);
                let response = self
                    .http_client
                    .get(&url)
                    .query(&[("apikey", self.api_key.as_str()), ("i", imdb_id)])
                    .send()
                    .await
                    .map_err(|e| {
                        AppError::UpstreamUnavailable(format!("OMDb request failed: {}", e))
                    })?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(status_error("OMDb", status, &body));
                }

                let title: OmdbTitle = response.json().await.map_err(|e| {
                    AppError::UpstreamUnavailable(format!("OMDb response was invalid: {}", e))
                })?;

                if title.response != "True" {
                    tracing::debug!(
                        imdb_id = %imdb_id,
                        error = ?title.error,
                        provider = "omdb",
                        "No OMDb record"
                    );
                    return Ok(None);
                }

                let awards = title
                    .awards
                    .filter(|text| !text.trim().is_empty() && text.trim() != "N/A");

                tracing::debug!(
                    imdb_id = %imdb_id,
                    has_awards = awards.is_some(),
                    provider = "omdb",
                    "Awards fetched"
                );

                Ok(awards)
            }
        )
    }

    fn name(&self) -> &'static str {
        "omdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> OmdbAwardsProvider {
        OmdbAwardsProvider::new(Cache::in_memory(), "omdb_key".to_string(), server.uri())
    }

    #[tokio::test]
    async fn test_fetch_awards_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("i", "tt1375666"))
            .and(query_param("apikey", "omdb_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Title": "Inception",
                "Awards": "Won 4 Oscars. 159 wins & 220 nominations total",
                "Response": "True"
            })))
            .mount(&server)
            .await;

        let awards = provider_for(&server).fetch_awards("tt1375666").await.unwrap();
        assert_eq!(
            awards.as_deref(),
            Some("Won 4 Oscars. 159 wins & 220 nominations total")
        );
    }

    #[tokio::test]
    async fn test_fetch_awards_not_applicable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Title": "Obscure",
                "Awards": "N/A",
                "Response": "True"
            })))
            .mount(&server)
            .await;

        let awards = provider_for(&server).fetch_awards("tt0000001").await.unwrap();
        assert!(awards.is_none());
    }

    #[tokio::test]
    async fn test_fetch_awards_unknown_title() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Response": "False",
                "Error": "Incorrect IMDb ID."
            })))
            .mount(&server)
            .await;

        let awards = provider_for(&server).fetch_awards("tt9").await.unwrap();
        assert!(awards.is_none());
    }

    #[tokio::test]
    async fn test_stalled_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"Awards": "Won 1 Oscar.", "Response": "True"}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let provider = provider_for(&server).with_timeout(Duration::from_millis(200));
        let started = std::time::Instant::now();
        let result = provider.fetch_awards("tt1375666").await;

        assert!(matches!(result, Err(AppError::UpstreamUnavailable(_))));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_fetch_awards_empty_id() {
        let server = MockServer::start().await;
        let result = provider_for(&server).fetch_awards("  ").await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
