use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::models::{Awards, CatalogId, CatalogItem, MediaType};
use crate::services::ranking::RankedBuckets;

const SIZE_TOKEN: &str = "{size}";
const PATH_TOKEN: &str = "{path}";

/// CDN URL pattern with `{size}` and `{path}` placeholders
///
/// e.g. `https://image.tmdb.org/t/p/{size}{path}`. Provider paths already start
/// with a slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUrlTemplate {
    pattern: String,
}

impl ImageUrlTemplate {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    /// Substitutes `size` and `path` into the pattern
    pub fn render(&self, path: &str, size: &str) -> String {
        self.pattern
            .replace(SIZE_TOKEN, size)
            .replace(PATH_TOKEN, path)
    }

    fn render_opt(&self, path: Option<&str>, size: &str) -> Option<String> {
        path.map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| self.render(p, size))
    }
}

impl Default for ImageUrlTemplate {
    fn default() -> Self {
        Self::new("https://image.tmdb.org/t/p/{size}{path}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentationSettings {
    pub template: ImageUrlTemplate,
    pub poster_size: String,
    pub backdrop_size: String,
    pub logo_size: String,
}

impl Default for PresentationSettings {
    fn default() -> Self {
        Self {
            template: ImageUrlTemplate::default(),
            poster_size: "w500".to_string(),
            backdrop_size: "w1280".to_string(),
            logo_size: "w92".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayPlatform {
    pub platform_id: u64,
    pub platform_name: String,
    pub logo_url: Option<String>,
}

/// Display-ready record handed to the UI
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayItem {
    pub id: CatalogId,
    pub title: String,
    pub media_type: MediaType,
    pub release_date: Option<NaiveDate>,
    pub vote_average: Option<f64>,
    pub genres: BTreeSet<String>,
    pub streaming_platforms: Vec<DisplayPlatform>,
    pub awards: Option<Awards>,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
}

/// Bucket arrays in the shape the UI consumes
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayBuckets {
    pub award_winners: Vec<DisplayItem>,
    pub highly_available: Vec<DisplayItem>,
    pub recent: Vec<DisplayItem>,
    pub all: Vec<DisplayItem>,
}

impl DisplayBuckets {
    pub fn is_empty(&self) -> bool {
        self.award_winners.is_empty()
            && self.highly_available.is_empty()
            && self.recent.is_empty()
            && self.all.is_empty()
    }
}

pub fn present_item(item: &CatalogItem, settings: &PresentationSettings) -> DisplayItem {
    let template = &settings.template;

    DisplayItem {
        id: item.id.clone(),
        title: item.title.clone(),
        media_type: item.media_type,
        release_date: item.release_date,
        vote_average: item.vote_average,
        genres: item.genres.clone(),
        streaming_platforms: item
            .streaming_platforms
            .iter()
            .map(|p| DisplayPlatform {
                platform_id: p.platform_id,
                platform_name: p.platform_name.clone(),
                logo_url: template.render_opt(p.logo_ref.as_deref(), &settings.logo_size),
            })
            .collect(),
        awards: item.awards,
        overview: item.overview.clone(),
        poster_url: template.render_opt(item.poster_path.as_deref(), &settings.poster_size),
        backdrop_url: template.render_opt(item.backdrop_path.as_deref(), &settings.backdrop_size),
    }
}

/// Maps ranked items to display records
///
/// Items whose title is blank are dropped; the normalizer's placeholder means
/// this does not happen for normalized input.
pub fn present(items: &[CatalogItem], settings: &PresentationSettings) -> Vec<DisplayItem> {
    items
        .iter()
        .filter(|item| !item.title.trim().is_empty())
        .map(|item| present_item(item, settings))
        .collect()
}

pub fn present_buckets(buckets: &RankedBuckets, settings: &PresentationSettings) -> DisplayBuckets {
    DisplayBuckets {
        award_winners: present(&buckets.award_winners, settings),
        highly_available: present(&buckets.highly_available, settings),
        recent: present(&buckets.recent, settings),
        all: present(&buckets.all, settings),
    }
}
