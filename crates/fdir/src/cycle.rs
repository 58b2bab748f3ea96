//! Per-cycle receive buffer

use contracts::SensorRecord;

/// Records received in one cycle, keyed by copy index
///
/// Owned by exactly one worker and reset at the start of every cycle.
#[derive(Debug, Clone)]
pub struct CycleState {
    slots: Vec<Option<SensorRecord>>,
}

impl CycleState {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Clear every slot
    pub fn reset(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    /// Store the record of copy `index`; out-of-range indices are ignored
    pub fn insert(&mut self, index: usize, record: SensorRecord) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) => {
                *slot = Some(record);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, index: usize) -> Option<&SensorRecord> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Number of copies that arrived
    pub fn count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Lowest index holding a record
    pub fn lowest_received(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_some)
    }
}
