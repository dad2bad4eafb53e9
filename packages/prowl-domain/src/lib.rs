pub mod fingerprint;
pub mod keywords;
pub mod models;
pub mod normalize;
pub mod platform;
pub mod router;
pub mod strategy;
pub mod taxonomy;
pub mod time_serde;

pub use fingerprint::fingerprint;
pub use models::{ContentTarget, NewSearchAttempt, SearchAttempt};
pub use normalize::{NormalizedProduct, normalize_items};
pub use platform::{ContentSearchStatus, ParseEnumError, Platform, SearchStatus};
pub use router::PlatformRouter;
pub use strategy::{
	FallbackInput, Mutation, StrategyAction, StrategySuggestion, fallback_suggestion,
	heuristic_quality,
};
