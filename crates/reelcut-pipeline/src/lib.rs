//! Segment resolution and materialization pipeline.
//!
//! Turns unreliable oracle proposals into a small set of valid, bounded,
//! extracted clips:
//!
//! ```text
//! oracle text -> parser -> resolver (+ transitions) -> validator
//!             -> selector -> materializer -> Vec<MaterializedClip>
//! ```
//!
//! When the format-specific request yields nothing usable the
//! orchestrator falls back to the oracle's generic highlight summary.

pub mod config;
pub mod error;
pub mod events;
pub mod gateway;
pub mod insights;
pub mod logging;
pub mod materializer;
pub mod orchestrator;
pub mod parser;
pub mod resolver;
pub mod retry;
pub mod selector;
pub mod standard;
pub mod transitions;
pub mod validator;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use events::{
    CollectingSink, EventSink, FanoutSink, MetricsSink, NoopSink, PipelineEvent, TracingSink,
};
pub use gateway::OracleGateway;
pub use insights::{AdStrategy, MarketingInsights};
pub use logging::{init_tracing, UnitLogger};
pub use materializer::{MaterializeReport, Materializer};
pub use orchestrator::{FormatOutcome, PathTaken, Pipeline};
pub use parser::{parse_candidates, ParseOutcome};
pub use resolver::{resolve, Resolution, Resolved};
pub use selector::select;
pub use transitions::{TransitionPoint, TransitionReport, TransitionSet};
pub use validator::{Coherence, CoherenceValidator};
