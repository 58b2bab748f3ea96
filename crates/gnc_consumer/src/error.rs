//! Consumer error types

use contracts::{ContractError, SensorKind};
use thiserror::Error;
use transport::TransportError;

/// GNC consumer errors
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// GNC input endpoint could not be opened
    #[error("{kind}: {source}")]
    Endpoint {
        kind: SensorKind,
        #[source]
        source: TransportError,
    },

    /// Blueprint lacks a GNC port for a kind
    #[error(transparent)]
    Config(#[from] ContractError),

    /// Nothing to listen on
    #[error("no GNC endpoints configured")]
    NoEndpoints,
}
