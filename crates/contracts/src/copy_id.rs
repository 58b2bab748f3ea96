//! CopyId - identifies one redundant copy of a sensor kind

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::SensorKind;

/// One redundant copy of a sensor kind.
///
/// Index 0 is the nominal primary copy.
///
/// # Examples
/// ```
/// use contracts::{CopyId, SensorKind};
///
/// let id = CopyId::new(SensorKind::Gnss, 2);
/// assert_eq!(id.to_string(), "gnss[2]");
/// assert!(!id.is_primary());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CopyId {
    pub kind: SensorKind,
    pub index: usize,
}

impl CopyId {
    #[inline]
    pub const fn new(kind: SensorKind, index: usize) -> Self {
        Self { kind, index }
    }

    #[inline]
    pub const fn is_primary(&self) -> bool {
        self.index == 0
    }
}

impl fmt::Display for CopyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.kind, self.index)
    }
}
