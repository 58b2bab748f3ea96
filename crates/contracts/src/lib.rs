//! # Contracts
//!
//! Frozen interface contracts (ICD) shared by every crate of the FDIR hub.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Record Model
//! - Each sensor kind has a fixed-size record; the size never changes at runtime
//! - Redundant copies of a kind are addressed by index `0..N-1`, index 0 is the primary
//! - `N` is capped by [`MAX_REDUNDANCY`]

mod blueprint;
mod copy_id;
mod endpoint;
mod error;
mod sensor;

pub use blueprint::*;
pub use copy_id::CopyId;
pub use endpoint::*;
pub use error::*;
pub use sensor::*;
