use chrono::NaiveDate;
use std::collections::{BTreeSet, HashSet};

use crate::models::{
    Awards, CatalogItem, MediaType, RawAwards, RawRecord, RegionOffers, StreamingPlatform,
};

/// Title used when a record carries neither `name` nor `title`
pub const UNTITLED: &str = "Untitled";

/// TMDB genre IDs (movie and TV lists combined)
const GENRES: &[(u32, &str)] = &[
    (12, "Adventure"),
    (14, "Fantasy"),
    (16, "Animation"),
    (18, "Drama"),
    (27, "Horror"),
    (28, "Action"),
    (35, "Comedy"),
    (36, "History"),
    (37, "Western"),
    (53, "Thriller"),
    (80, "Crime"),
    (99, "Documentary"),
    (878, "Science Fiction"),
    (9648, "Mystery"),
    (10402, "Music"),
    (10749, "Romance"),
    (10751, "Family"),
    (10752, "War"),
    (10759, "Action & Adventure"),
    (10762, "Kids"),
    (10763, "News"),
    (10764, "Reality"),
    (10765, "Sci-Fi & Fantasy"),
    (10766, "Soap"),
    (10767, "Talk"),
    (10768, "War & Politics"),
    (10770, "TV Movie"),
];

pub fn genre_name(id: u32) -> Option<&'static str> {
    GENRES
        .iter()
        .find(|(genre_id, _)| *genre_id == id)
        .map(|(_, name)| *name)
}

/// Maps a provider record onto the canonical item shape
///
/// Never fails. The record's own `media_type` wins over `context` when it names
/// a movie or show. A missing `id` is the caller's problem (see [`normalize_batch`]);
/// here it falls back to `0` so the function stays total.
pub fn normalize(raw: &RawRecord, context: MediaType) -> CatalogItem {
    let media_type = raw
        .media_type
        .as_deref()
        .and_then(MediaType::parse)
        .unwrap_or(context);

    let (preferred_title, other_title, preferred_date, other_date) = match media_type {
        MediaType::Tv => (&raw.name, &raw.title, &raw.first_air_date, &raw.release_date),
        MediaType::Movie => (&raw.title, &raw.name, &raw.release_date, &raw.first_air_date),
    };

    let title = non_blank(preferred_title)
        .or_else(|| non_blank(other_title))
        .unwrap_or(UNTITLED)
        .to_string();

    let release_date = parse_date(preferred_date).or_else(|| parse_date(other_date));

    let mut genres: BTreeSet<String> = raw.genres.iter().map(|g| g.name.clone()).collect();
    genres.extend(
        raw.genre_ids
            .iter()
            .filter_map(|id| genre_name(*id))
            .map(str::to_string),
    );

    CatalogItem {
        id: raw.id.clone().unwrap_or(crate::models::CatalogId::Numeric(0)),
        title,
        media_type,
        release_date,
        vote_average: raw.vote_average.filter(|v| v.is_finite()),
        genres,
        streaming_platforms: raw
            .watch_providers
            .as_ref()
            .map(streaming_platforms)
            .unwrap_or_default(),
        awards: raw.awards.as_ref().and_then(awards),
        overview: non_blank(&raw.overview).map(str::to_string),
        popularity: raw.popularity.filter(|p| p.is_finite()),
        poster_path: non_blank(&raw.poster_path).map(str::to_string),
        backdrop_path: non_blank(&raw.backdrop_path).map(str::to_string),
    }
}

/// Normalizes a batch, dropping records without an `id` and later duplicates
/// of an `(id, media_type)` pair already seen in the batch
pub fn normalize_batch(records: &[RawRecord], context: MediaType) -> Vec<CatalogItem> {
    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(records.len());
    let mut malformed = 0usize;
    let mut duplicates = 0usize;

    for record in records {
        if record.id.is_none() {
            malformed += 1;
            continue;
        }

        let item = normalize(record, context);
        if !seen.insert(item.batch_key()) {
            duplicates += 1;
            continue;
        }
        items.push(item);
    }

    if malformed > 0 || duplicates > 0 {
        tracing::debug!(
            malformed,
            duplicates,
            kept = items.len(),
            "Dropped records during normalization"
        );
    }

    items
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(value: &Option<String>) -> Option<NaiveDate> {
    non_blank(value).and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok())
}

/// Subscription-style offers, ordered by the provider's display priority
///
/// Rent and buy offers are not counted as streaming availability.
fn streaming_platforms(offers: &RegionOffers) -> Vec<StreamingPlatform> {
    let mut ranked: Vec<_> = offers.streaming().enumerate().collect();
    // Stable on ties; offers without a priority go last
    ranked.sort_by_key(|(position, offer)| (offer.display_priority.unwrap_or(i64::MAX), *position));

    let mut seen = HashSet::new();
    ranked
        .into_iter()
        .filter(|(_, offer)| seen.insert(offer.provider_id))
        .map(|(_, offer)| StreamingPlatform {
            platform_id: offer.provider_id,
            platform_name: offer.provider_name.clone(),
            logo_ref: offer.logo_path.clone(),
        })
        .collect()
}

fn awards(raw: &RawAwards) -> Option<Awards> {
    match raw {
        RawAwards::Counts { wins, nominations } => Some(Awards {
            wins: *wins,
            nominations: *nominations,
        }),
        RawAwards::Summary(text) => parse_awards_summary(text),
    }
}

/// Parses an award summary such as "Won 2 Oscars. Another 10 wins & 30 nominations."
///
/// Headline counts ("Won N ...", "Nominated for N ...") are added to the
/// trailing counts unless the summary says "total", in which case the trailing
/// counts already include them. Returns `None` when no count can be found.
pub fn parse_awards_summary(text: &str) -> Option<Awards> {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();

    let mut headline_wins = 0u32;
    let mut headline_nominations = 0u32;
    let mut wins = 0u32;
    let mut nominations = 0u32;
    let mut found = false;

    for (i, word) in words.iter().enumerate() {
        let Ok(count) = word.parse::<u32>() else {
            continue;
        };
        let next = words.get(i + 1).map(String::as_str).unwrap_or("");
        let prev = if i > 0 { words[i - 1].as_str() } else { "" };

        if next.starts_with("win") {
            wins = wins.saturating_add(count);
        } else if next.starts_with("nomination") {
            nominations = nominations.saturating_add(count);
        } else if prev == "won" {
            headline_wins = headline_wins.saturating_add(count);
        } else if prev == "for" {
            headline_nominations = headline_nominations.saturating_add(count);
        } else {
            continue;
        }
        found = true;
    }

    if !found {
        return None;
    }

    let is_total = words.iter().any(|w| w == "total");
    if is_total {
        Some(Awards {
            wins: wins.max(headline_wins),
            nominations: nominations.max(headline_nominations),
        })
    } else {
        Some(Awards {
            wins: wins.saturating_add(headline_wins),
            nominations: nominations.saturating_add(headline_nominations),
        })
    }
}
