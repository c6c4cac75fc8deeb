// ============================================================================
// TMDB API Types
// ============================================================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::CatalogId;

/// Paginated list response (`/trending/...`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResponse<T> {
    #[serde(default)]
    pub page: u32,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

/// Provider record as returned by list and detail endpoints
///
/// List endpoints carry `genre_ids`, detail endpoints carry `genres`. Movies use
/// `title`/`release_date`, shows use `name`/`first_air_date`. The last two
/// fields are not part of the provider payload; the fetcher attaches them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub id: Option<CatalogId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default)]
    pub genres: Vec<RawGenre>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub popularity: Option<f64>,
    /// Offers for the configured watch region
    #[serde(default)]
    pub watch_providers: Option<RegionOffers>,
    #[serde(default)]
    pub awards: Option<RawAwards>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawGenre {
    pub id: u32,
    pub name: String,
}

/// Award data in either of the shapes we accept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAwards {
    Counts {
        wins: u32,
        #[serde(default)]
        nominations: u32,
    },
    /// Free-text summary, e.g. "Won 2 Oscars. Another 10 wins & 30 nominations."
    Summary(String),
}

/// Response from `/{media}/{id}/watch/providers`, keyed by region code
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatchProvidersResponse {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub results: HashMap<String, RegionOffers>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionOffers {
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub flatrate: Vec<ProviderOffer>,
    #[serde(default)]
    pub free: Vec<ProviderOffer>,
    #[serde(default)]
    pub ads: Vec<ProviderOffer>,
    #[serde(default)]
    pub rent: Vec<ProviderOffer>,
    #[serde(default)]
    pub buy: Vec<ProviderOffer>,
}

impl RegionOffers {
    /// Offers that can be watched without a per-title purchase
    pub fn streaming(&self) -> impl Iterator<Item = &ProviderOffer> {
        self.flatrate.iter().chain(&self.free).chain(&self.ads)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderOffer {
    pub provider_id: u64,
    pub provider_name: String,
    #[serde(default)]
    pub logo_path: Option<String>,
    #[serde(default)]
    pub display_priority: Option<i64>,
}

/// Response from `/{media}/{id}/external_ids`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalIds {
    #[serde(default)]
    pub imdb_id: Option<String>,
}

// ============================================================================
// OMDb API Types
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct OmdbTitle {
    #[serde(rename = "Response")]
    pub response: String,
    #[serde(rename = "Awards", default)]
    pub awards: Option<String>,
    #[serde(rename = "Error", default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trending_tv_record_deserializes() {
        let json = r#"{
            "id": 1396,
            "name": "Breaking Bad",
            "media_type": "tv",
            "genre_ids": [18, 80],
            "vote_average": 8.9,
            "first_air_date": "2008-01-20",
            "poster_path": "/ggFHVNu6YYI5L9pCfOacjizRGt.jpg"
        }"#;

        let record: RawRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, Some(CatalogId::Numeric(1396)));
        assert_eq!(record.name.as_deref(), Some("Breaking Bad"));
        assert_eq!(record.title, None);
        assert_eq!(record.genre_ids, vec![18, 80]);
        assert!(record.genres.is_empty());
        assert!(record.watch_providers.is_none());
    }

    #[test]
    fn test_record_without_id_still_deserializes() {
        let record: RawRecord = serde_json::from_str(r#"{"title": "Orphan"}"#).unwrap();
        assert!(record.id.is_none());
    }

    #[test]
    fn test_null_vote_average() {
        let record: RawRecord = serde_json::from_str(r#"{"id": 3, "vote_average": null}"#).unwrap();
        assert_eq!(record.vote_average, None);
    }

    #[test]
    fn test_raw_awards_shapes() {
        let counts: RawAwards = serde_json::from_str(r#"{"wins": 2}"#).unwrap();
        assert_eq!(
            counts,
            RawAwards::Counts {
                wins: 2,
                nominations: 0
            }
        );

        let summary: RawAwards = serde_json::from_str(r#""Won 1 Oscar.""#).unwrap();
        assert_eq!(summary, RawAwards::Summary("Won 1 Oscar.".to_string()));
    }

    #[test]
    fn test_watch_providers_response() {
        let json = r#"{
            "id": 1396,
            "results": {
                "US": {
                    "link": "https://www.themoviedb.org/tv/1396/watch?locale=US",
                    "flatrate": [
                        {"provider_id": 8, "provider_name": "Netflix",
                         "logo_path": "/netflix.jpg", "display_priority": 0}
                    ],
                    "buy": [
                        {"provider_id": 2, "provider_name": "Apple TV",
                         "logo_path": "/apple.jpg", "display_priority": 4}
                    ]
                }
            }
        }"#;

        let response: WatchProvidersResponse = serde_json::from_str(json).unwrap();
        let us = response.results.get("US").unwrap();
        assert_eq!(us.flatrate.len(), 1);
        assert_eq!(us.buy.len(), 1);
        assert!(us.rent.is_empty());

        let streaming: Vec<_> = us.streaming().map(|o| o.provider_name.as_str()).collect();
        assert_eq!(streaming, vec!["Netflix"]);
    }

    #[test]
    fn test_omdb_title() {
        let json = r#"{
            "Title": "Inception",
            "Awards": "Won 4 Oscars. 159 wins & 220 nominations total",
            "Response": "True"
        }"#;
        let title: OmdbTitle = serde_json::from_str(json).unwrap();
        assert_eq!(title.response, "True");
        assert!(title.awards.unwrap().starts_with("Won 4"));
    }
}
