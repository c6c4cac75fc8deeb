use serde::Deserialize;

use crate::services::{
    presentation::{ImageUrlTemplate, PresentationSettings},
    ranking::RankingPolicy,
};

/// Upper bound for `RECENT_WINDOW_DAYS` (about a century)
pub const MAX_RECENT_WINDOW_DAYS: i64 = 36_500;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// TMDB v3 API key
    pub tmdb_api_key: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// OMDb API key; award enrichment is skipped when unset
    #[serde(default)]
    pub omdb_api_key: Option<String>,

    /// OMDb API base URL
    #[serde(default = "default_omdb_api_url")]
    pub omdb_api_url: String,

    /// Region whose streaming offers are considered (ISO 3166-1)
    #[serde(default = "default_watch_region")]
    pub watch_region: String,

    /// Redis connection URL; an in-process cache is used when unset
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Image CDN pattern with `{size}` and `{path}` tokens
    #[serde(default = "default_image_url_template")]
    pub image_url_template: String,

    #[serde(default = "default_poster_size")]
    pub poster_size: String,

    #[serde(default = "default_backdrop_size")]
    pub backdrop_size: String,

    #[serde(default = "default_logo_size")]
    pub logo_size: String,

    /// Entry bound for the in-process cache
    #[serde(default = "default_memory_cache_capacity")]
    pub memory_cache_capacity: u64,

    /// Outbound TMDB request budget
    #[serde(default = "default_tmdb_requests_per_second")]
    pub tmdb_requests_per_second: u32,

    /// Seconds a trending page stays fresh
    #[serde(default = "default_trending_cache_ttl")]
    pub trending_cache_ttl: u64,

    /// Seconds availability, details and award lookups stay fresh
    #[serde(default = "default_availability_cache_ttl")]
    pub availability_cache_ttl: u64,

    #[serde(default = "default_recent_window_days")]
    pub recent_window_days: i64,

    #[serde(default = "default_high_availability_min_platforms")]
    pub high_availability_min_platforms: usize,

    #[serde(default = "default_award_min_wins")]
    pub award_min_wins: u32,

    #[serde(default = "default_award_winners_limit")]
    pub award_winners_limit: usize,

    #[serde(default = "default_highly_available_limit")]
    pub highly_available_limit: usize,

    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,

    #[serde(default = "default_all_limit")]
    pub all_limit: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_omdb_api_url() -> String {
    "https://www.omdbapi.com".to_string()
}

fn default_watch_region() -> String {
    "US".to_string()
}

fn default_image_url_template() -> String {
    "https://image.tmdb.org/t/p/{size}{path}".to_string()
}

fn default_poster_size() -> String {
    "w500".to_string()
}

fn default_backdrop_size() -> String {
    "w1280".to_string()
}

fn default_logo_size() -> String {
    "w92".to_string()
}

fn default_memory_cache_capacity() -> u64 {
    10_000
}

fn default_tmdb_requests_per_second() -> u32 {
    40
}

fn default_trending_cache_ttl() -> u64 {
    3600 // 1 hour
}

fn default_availability_cache_ttl() -> u64 {
    86400 // 1 day
}

fn default_recent_window_days() -> i64 {
    RankingPolicy::default().recent_window_days
}

fn default_high_availability_min_platforms() -> usize {
    RankingPolicy::default().high_availability_min_platforms
}

fn default_award_min_wins() -> u32 {
    RankingPolicy::default().award_min_wins
}

fn default_award_winners_limit() -> usize {
    RankingPolicy::default().award_winners_limit
}

fn default_highly_available_limit() -> usize {
    RankingPolicy::default().highly_available_limit
}

fn default_recent_limit() -> usize {
    RankingPolicy::default().recent_limit
}

fn default_all_limit() -> usize {
    RankingPolicy::default().all_limit
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the ranker cannot work with
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0..=MAX_RECENT_WINDOW_DAYS).contains(&self.recent_window_days) {
            anyhow::bail!(
                "RECENT_WINDOW_DAYS must be between 0 and {}, got {}",
                MAX_RECENT_WINDOW_DAYS,
                self.recent_window_days
            );
        }
        if self.memory_cache_capacity == 0 {
            anyhow::bail!("MEMORY_CACHE_CAPACITY must be at least 1");
        }
        if self.tmdb_requests_per_second == 0 {
            anyhow::bail!("TMDB_REQUESTS_PER_SECOND must be at least 1");
        }
        Ok(())
    }

    /// Thresholds and bucket sizes for the ranker
    pub fn ranking_policy(&self) -> RankingPolicy {
        RankingPolicy {
            recent_window_days: self.recent_window_days,
            high_availability_min_platforms: self.high_availability_min_platforms,
            award_min_wins: self.award_min_wins,
            award_winners_limit: self.award_winners_limit,
            highly_available_limit: self.highly_available_limit,
            recent_limit: self.recent_limit,
            all_limit: self.all_limit,
        }
    }

    pub fn presentation_settings(&self) -> PresentationSettings {
        PresentationSettings {
            template: ImageUrlTemplate::new(self.image_url_template.clone()),
            poster_size: self.poster_size.clone(),
            backdrop_size: self.backdrop_size.clone(),
            logo_size: self.logo_size.clone(),
        }
    }
}
