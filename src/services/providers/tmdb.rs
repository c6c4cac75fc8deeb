/// TMDB (The Movie Database) provider
///
/// API Flow:
/// 1. Trending: /trending/{media}/{window}?page=N → list records (genre_ids only)
/// 2. Details: /{media}/{id} → full record (genres with names)
/// 3. Availability: /{media}/{id}/watch/providers → offers keyed by region
/// 4. External IDs: /{media}/{id}/external_ids → IMDB ID for award lookups
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{
        CatalogId, CatalogRequest, ExternalIds, MediaType, PagedResponse, RawRecord,
        RegionOffers, WatchProvidersResponse,
    },
    services::providers::{http_client, status_error, CatalogProvider, REQUEST_TIMEOUT},
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use std::{num::NonZeroU32, sync::Arc};

const TRENDING_CACHE_TTL: u64 = 3600; // 1 hour
const AVAIL_CACHE_TTL: u64 = 86400; // 1 day
const REQUESTS_PER_SECOND: u32 = 40;

type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

fn rate_limiter(requests_per_second: u32) -> Arc<Limiter> {
    let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
    Arc::new(RateLimiter::direct(Quota::per_second(rate)))
}

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    watch_region: String,
    cache: Cache,
    trending_ttl: u64,
    availability_ttl: u64,
    rate_limiter: Arc<Limiter>,
}

impl TmdbProvider {
    pub fn new(cache: Cache, api_key: String, api_url: String, watch_region: String) -> Self {
        let http_client = http_client("tmdb", REQUEST_TIMEOUT);

        Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            watch_region: watch_region.to_uppercase(),
            cache,
            trending_ttl: TRENDING_CACHE_TTL,
            availability_ttl: AVAIL_CACHE_TTL,
            rate_limiter: rate_limiter(REQUESTS_PER_SECOND),
        }
    }

    /// Overrides the default cache freshness windows (seconds)
    pub fn with_cache_ttls(mut self, trending_ttl: u64, availability_ttl: u64) -> Self {
        self.trending_ttl = trending_ttl;
        self.availability_ttl = availability_ttl;
        self
    }

    /// Caps outbound requests per second; cache hits are not counted
    pub fn with_rate_limit(mut self, requests_per_second: u32) -> Self {
        self.rate_limiter = rate_limiter(requests_per_second);
        self
    }

    /// GET `path` and decode the JSON body, mapping failures onto the upstream taxonomy
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);

        self.rate_limiter.until_ready().await;

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|e| {
                AppError::UpstreamUnavailable(format!("TMDB request to {} failed: {}", path, e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                path = %path,
                status = %status,
                provider = "tmdb",
                "TMDB request failed"
            );
            return Err(status_error("TMDB", status, &body));
        }

        response.json::<T>().await.map_err(|e| {
            AppError::UpstreamUnavailable(format!("TMDB response from {} was invalid: {}", path, e))
        })
    }
}

#[async_trait::async_trait]
impl CatalogProvider for TmdbProvider {
    async fn fetch_trending(&self, request: &CatalogRequest) -> AppResult<Vec<RawRecord>> {
        cached!(
            self.cache,
            CacheKey::Trending {
                media_type: request.media_type,
                time_window: request.time_window,
                page: request.page,
            },
            self.trending_ttl,
            async move {
                let path = format!(
                    "/trending/{}/{}",
                    request.media_type,
                    request.time_window.as_str()
                );
                // A missing list is an outage for this endpoint, not a missing title
                let page: PagedResponse<serde_json::Value> = self
                    .get_json(&path, &[("page", request.page.to_string())])
                    .await
                    .map_err(|e| match e {
                        AppError::NotFound(msg) => AppError::UpstreamUnavailable(msg),
                        other => other,
                    })?;

                let total = page.results.len();
                let records: Vec<RawRecord> = page
                    .results
                    .into_iter()
                    .filter_map(|value| match serde_json::from_value::<RawRecord>(value) {
                        Ok(record) => Some(record),
                        Err(e) => {
                            tracing::debug!(
                                error = %e,
                                provider = "tmdb",
                                "Dropping malformed record"
                            );
                            None
                        }
                    })
                    .collect();

                tracing::info!(
                    media_type = %request.media_type,
                    time_window = request.time_window.as_str(),
                    page = request.page,
                    results = records.len(),
                    malformed = total - records.len(),
                    provider = "tmdb",
                    "Trending page fetched"
                );

                Ok::<_, AppError>(records)
            }
        )
    }

    async fn fetch_details(&self, media_type: MediaType, id: &CatalogId) -> AppResult<RawRecord> {
        cached!(
            self.cache,
            CacheKey::Details(media_type, id.clone()),
            self.availability_ttl,
            async move {
                let path = format!("/{}/{}", media_type, id);
                let mut record: RawRecord = self.get_json(&path, &[]).await?;
                // Detail payloads omit media_type
                record.media_type = Some(media_type.as_str().to_string());

                tracing::info!(
                    media_type = %media_type,
                    id = %id,
                    provider = "tmdb",
                    "Details fetched"
                );

                Ok::<_, AppError>(record)
            }
        )
    }

    async fn fetch_watch_providers(
        &self,
        media_type: MediaType,
        id: &CatalogId,
    ) -> AppResult<Option<RegionOffers>> {
        cached!(
            self.cache,
            CacheKey::WatchProviders(media_type, id.clone()),
            self.availability_ttl,
            async move {
                let path = format!("/{}/{}/watch/providers", media_type, id);
                let mut response: WatchProvidersResponse = self.get_json(&path, &[]).await?;
                let offers = response.results.remove(&self.watch_region);

                tracing::debug!(
                    media_type = %media_type,
                    id = %id,
                    region = %self.watch_region,
                    offered = offers.is_some(),
                    provider = "tmdb",
                    "Watch providers fetched"
                );

                Ok::<_, AppError>(offers)
            }
        )
    }

    async fn fetch_imdb_id(
        &self,
        media_type: MediaType,
        id: &CatalogId,
    ) -> AppResult<Option<String>> {
        cached!(
            self.cache,
            CacheKey::ImdbId(media_type, id.clone()),
            self.availability_ttl,
            async move {
                let path = format!("/{}/{}/external_ids", media_type, id);
                let ids: ExternalIds = self.get_json(&path, &[]).await?;
                Ok::<_, AppError>(ids.imdb_id.filter(|imdb| !imdb.trim().is_empty()))
            }
        )
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
