pub mod fetcher;
pub mod providers;
pub mod recent_searches;
pub mod recommendation_cache;
pub mod recommendations;
pub mod rotation;
pub mod seed_resolver;
pub mod seed_store;
pub mod session;
pub mod signals;

pub use recommendations::{PipelineHandle, PipelineOutcome, PipelineSettings, RecommendationService};
pub use session::Session;
pub use signals::{Signal, SignalBus, SignalKind};
