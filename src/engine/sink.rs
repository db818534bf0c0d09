//! Destinations for settlement records.

use crate::types::SettlementEvent;

/// Receives every record the engine emits, in emission order.
pub trait EventSink {
    fn emit(&mut self, event: SettlementEvent);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    #[inline]
    fn emit(&mut self, _event: SettlementEvent) {}
}

/// Collects records in memory.
#[derive(Debug, Clone, Default)]
pub struct VecSink {
    pub events: Vec<SettlementEvent>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Take the collected records, leaving the sink empty.
    pub fn drain(&mut self) -> Vec<SettlementEvent> {
        std::mem::take(&mut self.events)
    }
}

impl EventSink for VecSink {
    fn emit(&mut self, event: SettlementEvent) {
        self.events.push(event);
    }
}
