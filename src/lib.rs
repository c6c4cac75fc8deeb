//! Trending, recommendation and availability backend for a TV/movie tracker.
//!
//! Request flow: the catalog fetcher pulls trending records from TMDB and
//! attaches streaming availability (and, optionally, OMDb award data); the
//! normalizer maps them onto [`models::CatalogItem`]; the ranker splits them
//! into buckets; the presentation adapter adds CDN URLs for the UI.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
