//! # Framing
//!
//! Fixed-layout binary encoding of sensor records.
//!
//! A record is sent unframed: the datagram length is the message boundary.
//! The layout follows the LP64 C struct layout of each record:
//!
//! | kind | fields | size |
//! |------|--------|------|
//! | IMU | `vel_inc[3] ang_inc[3] t_inc` (f64), `validity` (i32), 4 pad | 64 |
//! | GNSS | `position[3] velocity[3] dop` (f64), `validity` (i32), 4 pad | 64 |
//! | Star tracker | `time_tag quaternion[4]` (f64) | 40 |
//!
//! Numbers are little-endian. Padding is written as zero and ignored on decode.

mod codec;
mod error;

pub use codec::{decode, encode, encode_into};
pub use error::FramingError;
