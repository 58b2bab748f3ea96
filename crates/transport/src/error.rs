//! Transport error types

use contracts::Direction;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Transport errors
#[derive(Debug, Error)]
pub enum TransportError {
    /// Socket creation, option or bind failure
    #[error("failed to set up endpoint {endpoint}: {source}")]
    Setup {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// Non-blocking receive found no datagram
    #[error("no datagram available")]
    WouldBlock,

    /// Bounded receive hit its deadline
    #[error("receive timed out after {0:?}")]
    Timeout(Duration),

    /// Endpoint was closed
    #[error("endpoint {0} is closed")]
    Closed(String),

    /// Send on an input endpoint or receive on an output endpoint
    #[error("endpoint {endpoint} is {direction}-only")]
    WrongDirection {
        endpoint: String,
        direction: Direction,
    },

    /// Any other I/O failure
    #[error("io error: {0}")]
    Io(io::Error),
}

impl TransportError {
    pub(crate) fn setup(endpoint: impl Into<String>, source: io::Error) -> Self {
        Self::Setup {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// Whether the error only means "nothing arrived (yet)"
    pub fn is_empty_read(&self) -> bool {
        matches!(self, Self::WouldBlock | Self::Timeout(_))
    }
}

impl From<io::Error> for TransportError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::WouldBlock {
            Self::WouldBlock
        } else {
            Self::Io(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn would_block_io_error_maps_to_variant() {
        let err: TransportError = io::Error::from(io::ErrorKind::WouldBlock).into();
        assert!(matches!(err, TransportError::WouldBlock));
        assert!(err.is_empty_read());

        let err: TransportError = io::Error::from(io::ErrorKind::ConnectionRefused).into();
        assert!(matches!(err, TransportError::Io(_)));
        assert!(!err.is_empty_read());
    }
}
