//! # GNC Consumer
//!
//! Receiving end of the FDIR hub: binds one GNC port per sensor kind,
//! waits for readiness on all of them and decodes each datagram.
//! Actuation is a logged placeholder.

mod consumer;
mod error;

pub use consumer::{
    actuators, ConsumedRecord, ConsumerMetrics, ConsumerSnapshot, GncConsumer,
    DEFAULT_POLL_TIMEOUT,
};
pub use error::ConsumerError;
