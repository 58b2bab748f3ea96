//! Hub orchestration module.

mod orchestrator;
mod stats;

pub use orchestrator::{HubPipeline, PipelineConfig};
pub use stats::HubStats;
