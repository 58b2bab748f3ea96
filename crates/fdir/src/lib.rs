//! # FDIR
//!
//! Fault detection, isolation and recovery over N-modular redundant sensors.
//!
//! Each sensor kind gets one [`FdirWorker`] owning a [`RedundancyGroup`]
//! (N input endpoints, one output endpoint). Every cycle the worker:
//!
//! 1. tries to receive one record from each of the `expected` active copies
//!    before a shared deadline,
//! 2. runs the count-based [`select`] rule,
//! 3. forwards at most one record to the GNC.
//!
//! The expected copy count only ever goes down. [`FdirHub`] starts and
//! stops one worker per configured group.

mod cycle;
mod error;
mod group;
mod hub;
mod metrics;
mod selector;
mod worker;

pub use cycle::CycleState;
pub use error::FdirError;
pub use group::RedundancyGroup;
pub use hub::{FdirHub, HubOptions, WorkerHandle};
pub use metrics::{WorkerMetrics, WorkerMetricsSnapshot};
pub use selector::{select, Decision, FdirSelector, Selection};
pub use worker::{CycleReport, FdirWorker, SendOutcome, WorkerOptions, WorkerState, WorkerSummary};
