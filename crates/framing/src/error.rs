//! Framing error types

use contracts::SensorKind;
use thiserror::Error;

/// Framing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FramingError {
    /// Buffer length differs from the kind's fixed record size
    #[error("{kind} record size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        kind: SensorKind,
        expected: usize,
        actual: usize,
    },
}
