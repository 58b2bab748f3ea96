//! Count-based copy selection with sticky degradation

use contracts::SelectionPolicy;

use crate::CycleState;

/// Outcome of the pure selection rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Expected copy count for the next cycle
    pub expected: usize,
    /// Chosen copy index, `None` when nothing arrived
    pub chosen: Option<usize>,
}

/// Selection rule
///
/// | received | chosen | next expected |
/// |---|---|---|
/// | `== expected` | 0 | unchanged |
/// | `1..expected` | `received` | `received` |
/// | 0 | none | unchanged |
///
/// # Panics
/// When `received > expected`. Workers only listen to `expected` inputs, so
/// this is a logic error, not a runtime condition.
pub fn select(expected: usize, received: usize) -> Selection {
    assert!(
        received <= expected,
        "fdir selector invariant violated: received {received} copies, expected at most {expected}"
    );

    if received == 0 {
        Selection {
            expected,
            chosen: None,
        }
    } else if received == expected {
        Selection {
            expected,
            chosen: Some(0),
        }
    } else {
        Selection {
            expected: received,
            chosen: Some(received),
        }
    }
}

/// One cycle's decision, with the copy that is actually forwarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub expected_before: usize,
    pub expected_after: usize,
    pub received: usize,
    /// Index produced by the selection rule
    pub chosen: Option<usize>,
    /// Index whose record goes out, `None` when nothing is forwarded
    pub forward: Option<usize>,
}

impl Decision {
    pub fn degraded(&self) -> bool {
        self.expected_after < self.expected_before
    }
}

/// Per-worker selector state: the sticky expected count
#[derive(Debug, Clone)]
pub struct FdirSelector {
    redundancy: usize,
    expected: usize,
    policy: SelectionPolicy,
}

impl FdirSelector {
    pub fn new(redundancy: usize, policy: SelectionPolicy) -> Self {
        Self {
            redundancy,
            expected: redundancy,
            policy,
        }
    }

    /// Configured cardinality
    pub fn redundancy(&self) -> usize {
        self.redundancy
    }

    /// Copies expected next cycle
    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// Decide on a filled cycle and update the expected count
    pub fn decide(&mut self, cycle: &CycleState) -> Decision {
        let expected_before = self.expected;
        let received = cycle.count();
        let selection = select(expected_before, received);
        self.expected = selection.expected;

        let lowest = cycle.lowest_received();
        let forward = match (self.policy, selection.chosen) {
            (_, None) => None,
            (SelectionPolicy::Sticky, Some(index)) if cycle.get(index).is_some() => Some(index),
            (_, Some(_)) => lowest,
        };

        Decision {
            expected_before,
            expected_after: self.expected,
            received,
            chosen: selection.chosen,
            forward,
        }
    }
}
