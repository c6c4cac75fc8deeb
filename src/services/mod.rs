pub mod catalog;
pub mod normalizer;
pub mod presentation;
pub mod providers;
pub mod ranking;
pub mod recommendations;
pub mod sequencer;

pub use catalog::CatalogFetcher;
pub use recommendations::RecommendationService;
pub use sequencer::RequestSequencer;
