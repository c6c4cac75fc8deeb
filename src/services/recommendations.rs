use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{CatalogId, CatalogRequest, MediaType},
    services::{
        catalog::CatalogFetcher,
        normalizer::{normalize, normalize_batch},
        presentation::{
            present, present_buckets, present_item, DisplayBuckets, DisplayItem,
            PresentationSettings,
        },
        ranking::{rank, rank_buckets, Bucket, RankOptions, RankingPolicy},
    },
};

/// Generates the dashboard recommendation buckets
///
/// Fetch → normalize → rank → present. Upstream outages and throttling become
/// empty results with a warning so the UI degrades to "no recommendations".
#[derive(Clone)]
pub struct RecommendationService {
    fetcher: CatalogFetcher,
    policy: RankingPolicy,
    presentation: PresentationSettings,
}

impl RecommendationService {
    pub fn new(
        fetcher: CatalogFetcher,
        policy: RankingPolicy,
        presentation: PresentationSettings,
    ) -> Self {
        Self {
            fetcher,
            policy,
            presentation,
        }
    }

    pub async fn recommend(
        &self,
        request: &CatalogRequest,
        options: &RankOptions,
    ) -> AppResult<DisplayBuckets> {
        self.recommend_at(request, options, Utc::now()).await
    }

    /// Same as [`recommend`](Self::recommend) with an explicit clock for the recency bucket
    pub async fn recommend_at(
        &self,
        request: &CatalogRequest,
        options: &RankOptions,
        now: DateTime<Utc>,
    ) -> AppResult<DisplayBuckets> {
        let records = match self.fetcher.fetch(request).await {
            Ok(records) => records,
            Err(e) if e.is_upstream() => {
                degrade(&e, request);
                return Ok(DisplayBuckets::default());
            }
            Err(e) => return Err(e),
        };

        let items = normalize_batch(&records, request.media_type);
        let buckets = rank_buckets(&items, options, &self.policy, now);

        tracing::info!(
            media_type = %request.media_type,
            candidates = items.len(),
            award_winners = buckets.award_winners.len(),
            highly_available = buckets.highly_available.len(),
            recent = buckets.recent.len(),
            all = buckets.all.len(),
            "Recommendations ranked"
        );

        Ok(present_buckets(&buckets, &self.presentation))
    }

    /// Trending list ordered like the "all" bucket
    pub async fn trending(
        &self,
        request: &CatalogRequest,
        options: &RankOptions,
    ) -> AppResult<Vec<DisplayItem>> {
        let records = match self.fetcher.fetch(request).await {
            Ok(records) => records,
            Err(e) if e.is_upstream() => {
                degrade(&e, request);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let items = normalize_batch(&records, request.media_type);
        let ranked = rank(&items, Bucket::All, options, &self.policy, Utc::now());
        Ok(present(&ranked, &self.presentation))
    }

    /// A single enriched title; errors are surfaced to the caller
    pub async fn title(&self, media_type: MediaType, id: &CatalogId) -> AppResult<DisplayItem> {
        let record = self.fetcher.fetch_one(media_type, id).await?;
        let item = normalize(&record, media_type);
        Ok(present_item(&item, &self.presentation))
    }
}

fn degrade(error: &AppError, request: &CatalogRequest) {
    tracing::warn!(
        error = %error,
        media_type = %request.media_type,
        time_window = request.time_window.as_str(),
        page = request.page,
        "Catalog provider unavailable, returning empty results"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProviderOffer, RawAwards, RawRecord, RegionOffers, TimeWindow};
    use crate::services::providers::MockCatalogProvider;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn offers(count: u64) -> RegionOffers {
        RegionOffers {
            flatrate: (0..count)
                .map(|i| ProviderOffer {
                    provider_id: i + 1,
                    provider_name: format!("Service {}", i + 1),
                    logo_path: Some(format!("/logo{}.png", i + 1)),
                    display_priority: Some(i as i64),
                })
                .collect(),
            ..Default::default()
        }
    }

    fn service_with(catalog: MockCatalogProvider) -> RecommendationService {
        RecommendationService::new(
            CatalogFetcher::new(Arc::new(catalog), None),
            RankingPolicy::default(),
            PresentationSettings::default(),
        )
    }

    fn request() -> CatalogRequest {
        CatalogRequest::trending(MediaType::Movie, TimeWindow::Week, 1)
    }

    #[tokio::test]
    async fn test_upstream_unavailable_yields_empty_buckets() {
        let mut catalog = MockCatalogProvider::new();
        catalog
            .expect_fetch_trending()
            .returning(|_| Err(AppError::UpstreamUnavailable("status 503".to_string())));

        let buckets = service_with(catalog)
            .recommend(&request(), &RankOptions::default())
            .await
            .unwrap();

        assert!(buckets.is_empty());
    }

    #[tokio::test]
    async fn test_rate_limited_yields_empty_trending() {
        let mut catalog = MockCatalogProvider::new();
        catalog
            .expect_fetch_trending()
            .returning(|_| Err(AppError::UpstreamRateLimited("status 429".to_string())));

        let items = service_with(catalog)
            .trending(&request(), &RankOptions::default())
            .await
            .unwrap();

        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_non_upstream_errors_propagate() {
        let mut catalog = MockCatalogProvider::new();
        catalog
            .expect_fetch_trending()
            .returning(|_| Err(AppError::Internal("boom".to_string())));

        let result = service_with(catalog)
            .recommend(&request(), &RankOptions::default())
            .await;

        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_full_pipeline() {
        let mut catalog = MockCatalogProvider::new();
        catalog.expect_fetch_trending().returning(|_| {
            Ok(vec![
                RawRecord {
                    id: Some(CatalogId::Numeric(1)),
                    title: Some("Winner".to_string()),
                    vote_average: Some(9.5),
                    release_date: Some("2024-03-01".to_string()),
                    poster_path: Some("/winner.jpg".to_string()),
                    awards: Some(RawAwards::Counts {
                        wins: 2,
                        nominations: 3,
                    }),
                    ..Default::default()
                },
                RawRecord {
                    id: Some(CatalogId::Numeric(2)),
                    title: Some("Classic".to_string()),
                    vote_average: Some(9.5),
                    release_date: Some("1999-03-31".to_string()),
                    ..Default::default()
                },
                RawRecord {
                    title: Some("No id".to_string()),
                    vote_average: Some(10.0),
                    ..Default::default()
                },
            ])
        });
        catalog.expect_fetch_watch_providers().returning(|_, id| {
            if *id == CatalogId::Numeric(1) {
                Ok(Some(offers(3)))
            } else {
                Ok(None)
            }
        });
        catalog.expect_name().return_const("mock");

        let buckets = service_with(catalog)
            .recommend_at(&request(), &RankOptions::default(), now())
            .await
            .unwrap();

        let all: Vec<_> = buckets.all.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(all, vec!["Winner", "Classic"]);
        assert_eq!(buckets.award_winners.len(), 1);
        assert_eq!(buckets.highly_available.len(), 1);
        assert_eq!(buckets.recent.len(), 1);
        assert_eq!(buckets.recent[0].title, "Winner");
        assert_eq!(
            buckets.all[0].poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/winner.jpg")
        );
        assert_eq!(buckets.all[0].streaming_platforms.len(), 3);
    }

    #[tokio::test]
    async fn test_title_not_found_propagates() {
        let mut catalog = MockCatalogProvider::new();
        catalog
            .expect_fetch_details()
            .returning(|_, _| Err(AppError::NotFound("status 404".to_string())));

        let result = service_with(catalog)
            .title(MediaType::Tv, &CatalogId::Numeric(404))
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
