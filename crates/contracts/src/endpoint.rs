//! Endpoint configuration - what the transport needs to open a socket

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;

/// Endpoint direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Binds `address` and receives datagrams
    Input,
    /// Sends datagrams to `address`, never binds it
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => f.write_str("input"),
            Direction::Output => f.write_str("output"),
        }
    }
}

/// Endpoint configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Human-readable name used in logs (e.g. `imu[1]`, `imu->gnc`)
    pub label: String,

    /// Local bind address (input) or destination (output)
    pub address: SocketAddr,

    /// Direction
    pub direction: Direction,
}

impl EndpointConfig {
    /// Create input endpoint config
    pub fn input(label: impl Into<String>, address: SocketAddr) -> Self {
        Self {
            label: label.into(),
            address,
            direction: Direction::Input,
        }
    }

    /// Create output endpoint config
    pub fn output(label: impl Into<String>, address: SocketAddr) -> Self {
        Self {
            label: label.into(),
            address,
            direction: Direction::Output,
        }
    }
}

impl fmt::Display for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {})", self.label, self.direction, self.address)
    }
}
