use crate::event::{EventDocument, EventKind};

/// How batch events are routed, derived from the configured buffer capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferPolicy {
    /// Capacity 0: batch events are only flushed at epoch end.
    EpochOnly,
    /// Capacity 1: batch events bypass the buffer.
    #[default]
    Immediate,
    /// Capacity n > 1: flush once n events are pending.
    Bounded(usize),
}

impl BufferPolicy {
    pub fn from_capacity(capacity: usize) -> Self {
        match capacity {
            0 => BufferPolicy::EpochOnly,
            1 => BufferPolicy::Immediate,
            n => BufferPolicy::Bounded(n),
        }
    }

    pub fn capacity(&self) -> usize {
        match self {
            BufferPolicy::EpochOnly => 0,
            BufferPolicy::Immediate => 1,
            BufferPolicy::Bounded(n) => *n,
        }
    }

    /// Whether a buffer holding `pending` events has to be flushed now.
    pub fn is_full(&self, pending: usize) -> bool {
        match self {
            BufferPolicy::Bounded(n) => pending >= *n,
            BufferPolicy::EpochOnly | BufferPolicy::Immediate => false,
        }
    }
}

/// Pending batch events, in the order they were raised.
#[derive(Debug, Default)]
pub struct EventBuffer {
    events: Vec<(EventKind, EventDocument)>,
}

impl EventBuffer {
    pub fn new() -> Self {
        EventBuffer { events: Vec::new() }
    }

    pub fn push(&mut self, kind: EventKind, document: EventDocument) {
        self.events.push((kind, document));
    }

    pub fn iter(&self) -> impl Iterator<Item = &(EventKind, EventDocument)> {
        self.events.iter()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}
