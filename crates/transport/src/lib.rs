//! # Transport
//!
//! Connectionless datagram endpoints over UDP/IPv4.
//!
//! - Input endpoints bind their address with `SO_REUSEADDR` and receive.
//! - Output endpoints only remember the destination and send.
//! - [`poll_ready`] waits on several input endpoints at once.
//!
//! Loss, duplication and reordering are left to the caller.

mod endpoint;
mod error;
mod poll;

pub use endpoint::Endpoint;
pub use error::TransportError;
pub use poll::poll_ready;
