use serde::Serialize;
use strum_macros::{Display, EnumIter};

/// Independently tracked asynchronous queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter)]
pub enum Slot {
    #[strum(serialize = "apps")]
    Apps,
    #[strum(serialize = "ranking")]
    Ranking,
    #[strum(serialize = "date-bounds")]
    DateBounds,
    #[strum(serialize = "monitoring")]
    Monitoring,
}

impl Slot {
    const COUNT: usize = 4;

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Display)]
pub enum FetchState {
    #[default]
    Idle,
    InFlight,
    Settled,
    Failed,
}

#[derive(Debug, Clone, Copy, Default)]
struct Tracker {
    generation: u64,
    state: FetchState,
}

/// Per-slot generation counters. Only the most recently issued
/// generation of a slot may settle it.
#[derive(Debug, Clone, Default)]
pub(crate) struct SlotTable {
    trackers: [Tracker; Slot::COUNT],
}

impl SlotTable {
    /// Supersedes whatever is in flight for `slot` and returns the new generation.
    pub fn issue(&mut self, slot: Slot) -> u64 {
        let t = &mut self.trackers[slot.index()];
        t.generation += 1;
        t.state = FetchState::InFlight;
        t.generation
    }

    /// Orphans any in-flight request without issuing a new one.
    /// Returns `true` if something was in flight.
    pub fn invalidate(&mut self, slot: Slot) -> bool {
        let t = &mut self.trackers[slot.index()];
        let was_in_flight = t.state == FetchState::InFlight;
        t.generation += 1;
        if was_in_flight {
            t.state = FetchState::Idle;
        }
        was_in_flight
    }

    pub fn is_current(&self, slot: Slot, generation: u64) -> bool {
        self.trackers[slot.index()].generation == generation
    }

    pub fn settle(&mut self, slot: Slot, ok: bool) {
        self.trackers[slot.index()].state = if ok {
            FetchState::Settled
        } else {
            FetchState::Failed
        };
    }

    pub fn state(&self, slot: Slot) -> FetchState {
        self.trackers[slot.index()].state
    }

    #[cfg(test)]
    pub fn generation(&self, slot: Slot) -> u64 {
        self.trackers[slot.index()].generation
    }

    #[cfg(test)]
    pub fn any_in_flight(&self) -> bool {
        use strum::IntoEnumIterator;

        Slot::iter().any(|s| self.state(s) == FetchState::InFlight)
    }
}
