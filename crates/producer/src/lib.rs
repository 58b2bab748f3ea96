//! # Producer
//!
//! Mock redundant sensor producers.
//!
//! - `scheduler`: frequency to period conversion and fixed-rate pacing
//! - `MockProducer`: one task per sensor kind, sending the same synthetic
//!   record to every active copy each period, with optional fault injection
//!
//! ## Usage Example
//!
//! ```ignore
//! use producer::{producers_from_blueprint, FaultInjection};
//! use tokio_util::sync::CancellationToken;
//!
//! let cancel = CancellationToken::new();
//! for p in producers_from_blueprint(&blueprint, false, Some(FaultInjection::default()), None)? {
//!     p.spawn(cancel.clone());
//! }
//! ```

mod error;
mod metrics;
mod mock;
pub mod scheduler;

// Re-exports
pub use error::{ProducerError, Result, SchedulerError};
pub use metrics::{ProducerMetrics, ProducerSnapshot};
pub use mock::{
    producers_from_blueprint, synthetic_record, FaultInjection, MockProducer, MockProducerConfig,
};
pub use scheduler::{period_from_frequency, sleep_for, PeriodicTask};
