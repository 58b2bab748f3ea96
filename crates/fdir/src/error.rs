//! FDIR error types

use contracts::{ContractError, SensorKind, MAX_REDUNDANCY};
use thiserror::Error;
use transport::TransportError;

/// FDIR errors
#[derive(Debug, Error)]
pub enum FdirError {
    /// Group cardinality outside 1..=MAX_REDUNDANCY
    #[error("{kind}: redundancy {count} outside 1..={MAX_REDUNDANCY}")]
    InvalidRedundancy { kind: SensorKind, count: usize },

    /// Endpoint used against its direction when assembling a group
    #[error("{kind}: endpoint {endpoint} has the wrong direction for its role")]
    MisdirectedEndpoint { kind: SensorKind, endpoint: String },

    /// Endpoint could not be opened
    #[error("{kind}: {source}")]
    Endpoint {
        kind: SensorKind,
        #[source]
        source: TransportError,
    },

    /// Blueprint lacks what the group needs
    #[error("{kind}: {source}")]
    Config {
        kind: SensorKind,
        #[source]
        source: ContractError,
    },

    /// Blueprint has no groups at all
    #[error("no redundancy groups configured")]
    NoGroups,

    /// Worker task panicked or was aborted
    #[error("{kind} worker did not finish cleanly: {message}")]
    WorkerJoin { kind: SensorKind, message: String },
}

impl FdirError {
    /// Sensor kind the error belongs to, if any
    pub fn kind(&self) -> Option<SensorKind> {
        match self {
            Self::InvalidRedundancy { kind, .. }
            | Self::MisdirectedEndpoint { kind, .. }
            | Self::Endpoint { kind, .. }
            | Self::Config { kind, .. }
            | Self::WorkerJoin { kind, .. } => Some(*kind),
            Self::NoGroups => None,
        }
    }
}
