use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::models::CatalogItem;

/// Named subsets of a fetched batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    AwardWinners,
    HighlyAvailable,
    Recent,
    All,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [
        Bucket::AwardWinners,
        Bucket::HighlyAvailable,
        Bucket::Recent,
        Bucket::All,
    ];
}

/// Tuning constants for bucket membership and size
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingPolicy {
    /// Maximum age, in days, of a release in the recent bucket
    pub recent_window_days: i64,
    pub high_availability_min_platforms: usize,
    pub award_min_wins: u32,
    pub award_winners_limit: usize,
    pub highly_available_limit: usize,
    pub recent_limit: usize,
    pub all_limit: usize,
}

impl Default for RankingPolicy {
    fn default() -> Self {
        Self {
            recent_window_days: 365,
            high_availability_min_platforms: 3,
            award_min_wins: 1,
            award_winners_limit: 10,
            highly_available_limit: 15,
            recent_limit: 12,
            all_limit: 20,
        }
    }
}

impl RankingPolicy {
    pub fn default_limit(&self, bucket: Bucket) -> usize {
        match bucket {
            Bucket::AwardWinners => self.award_winners_limit,
            Bucket::HighlyAvailable => self.highly_available_limit,
            Bucket::Recent => self.recent_limit,
            Bucket::All => self.all_limit,
        }
    }

    fn qualifies(&self, bucket: Bucket, item: &CatalogItem, now: DateTime<Utc>) -> bool {
        match bucket {
            Bucket::AwardWinners => item.award_wins() >= self.award_min_wins.max(1),
            Bucket::HighlyAvailable => {
                item.streaming_platforms.len() >= self.high_availability_min_platforms
            }
            Bucket::Recent => match item.release_date {
                // A window too large for chrono has no upper bound
                Some(date) => Duration::try_days(self.recent_window_days)
                    .map_or(true, |window| now.date_naive().signed_duration_since(date) <= window),
                None => false,
            },
            Bucket::All => true,
        }
    }
}

/// Caller-side knobs for one ranking call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankOptions {
    /// When false, items with no known streaming platform are dropped first
    pub include_non_streaming: bool,
    /// Overrides the bucket's default limit
    pub max_results: Option<usize>,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            include_non_streaming: true,
            max_results: None,
        }
    }
}

/// Materialized result of ranking one batch into every bucket
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankedBuckets {
    pub award_winners: Vec<CatalogItem>,
    pub highly_available: Vec<CatalogItem>,
    pub recent: Vec<CatalogItem>,
    pub all: Vec<CatalogItem>,
}

impl RankedBuckets {
    pub fn get(&self, bucket: Bucket) -> &[CatalogItem] {
        match bucket {
            Bucket::AwardWinners => &self.award_winners,
            Bucket::HighlyAvailable => &self.highly_available,
            Bucket::Recent => &self.recent,
            Bucket::All => &self.all,
        }
    }
}

/// Ranks `items` into one bucket
///
/// Filters by eligibility and bucket membership, then sorts by vote average
/// descending (missing counts as 0) keeping input order on ties, then
/// truncates. The input slice is left untouched and `now` is the only clock,
/// so equal inputs always give equal output.
pub fn rank(
    items: &[CatalogItem],
    bucket: Bucket,
    options: &RankOptions,
    policy: &RankingPolicy,
    now: DateTime<Utc>,
) -> Vec<CatalogItem> {
    let limit = options
        .max_results
        .unwrap_or_else(|| policy.default_limit(bucket));

    let mut selected: Vec<&CatalogItem> = items
        .iter()
        .filter(|item| options.include_non_streaming || !item.streaming_platforms.is_empty())
        .filter(|item| policy.qualifies(bucket, item, now))
        .collect();

    // sort_by is stable: equal scores keep fetch order
    selected.sort_by(|a, b| compare_score(b, a));

    selected.into_iter().take(limit).cloned().collect()
}

/// Ranks `items` into every bucket from one snapshot
pub fn rank_buckets(
    items: &[CatalogItem],
    options: &RankOptions,
    policy: &RankingPolicy,
    now: DateTime<Utc>,
) -> RankedBuckets {
    RankedBuckets {
        award_winners: rank(items, Bucket::AwardWinners, options, policy, now),
        highly_available: rank(items, Bucket::HighlyAvailable, options, policy, now),
        recent: rank(items, Bucket::Recent, options, policy, now),
        all: rank(items, Bucket::All, options, policy, now),
    }
}

fn score(item: &CatalogItem) -> f64 {
    item.vote_average.filter(|v| !v.is_nan()).unwrap_or(0.0)
}

fn compare_score(a: &CatalogItem, b: &CatalogItem) -> Ordering {
    score(a).total_cmp(&score(b))
}
