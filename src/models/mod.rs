use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt::Display};

pub mod provider;

pub use provider::{
    ExternalIds, OmdbTitle, PagedResponse, ProviderOffer, RawAwards, RawGenre, RawRecord,
    RegionOffers, WatchProvidersResponse,
};

/// Identifier assigned by the source catalog
///
/// TMDB hands out integers; other catalogs use opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CatalogId {
    Numeric(u64),
    Text(String),
}

impl Display for CatalogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogId::Numeric(id) => write!(f, "{}", id),
            CatalogId::Text(id) => write!(f, "{}", id),
        }
    }
}

impl CatalogId {
    /// Parses a path segment, preferring the numeric form
    pub fn parse(value: &str) -> Self {
        value
            .parse::<u64>()
            .map(CatalogId::Numeric)
            .unwrap_or_else(|_| CatalogId::Text(value.to_string()))
    }
}

impl From<u64> for CatalogId {
    fn from(id: u64) -> Self {
        CatalogId::Numeric(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    /// Path segment used by the provider API
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }

    /// Parses the provider's `media_type` field; anything else (e.g. "person") is `None`
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "movie" => Some(MediaType::Movie),
            "tv" => Some(MediaType::Tv),
            _ => None,
        }
    }
}

impl Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trending window supported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    Day,
    #[default]
    Week,
}

impl TimeWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
        }
    }
}

/// What to ask the provider for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CatalogRequest {
    pub media_type: MediaType,
    pub time_window: TimeWindow,
    /// 1-based page number
    pub page: u32,
}

impl CatalogRequest {
    pub fn trending(media_type: MediaType, time_window: TimeWindow, page: u32) -> Self {
        Self {
            media_type,
            time_window,
            page: page.max(1),
        }
    }
}

/// A platform the item can be streamed on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamingPlatform {
    pub platform_id: u64,
    pub platform_name: String,
    /// Path fragment of the platform logo on the image CDN
    pub logo_ref: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Awards {
    pub wins: u32,
    pub nominations: u32,
}

/// Canonical catalog entry consumed by ranking and presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: CatalogId,
    pub title: String,
    pub media_type: MediaType,
    pub release_date: Option<NaiveDate>,
    /// Provider scale, 0 to 10
    pub vote_average: Option<f64>,
    pub genres: BTreeSet<String>,
    pub streaming_platforms: Vec<StreamingPlatform>,
    pub awards: Option<Awards>,
    pub overview: Option<String>,
    pub popularity: Option<f64>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
}

impl CatalogItem {
    /// Key that is unique within one fetch batch
    pub fn batch_key(&self) -> (CatalogId, MediaType) {
        (self.id.clone(), self.media_type)
    }

    /// Award wins, counting missing award data as zero
    pub fn award_wins(&self) -> u32 {
        self.awards.map(|a| a.wins).unwrap_or(0)
    }
}
