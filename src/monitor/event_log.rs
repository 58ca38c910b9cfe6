//! Bounded history of accepted events

use std::collections::VecDeque;
use tracing::debug;

use super::filter::Filter;
use crate::midi::Event;

/// Default number of events kept
pub const DEFAULT_CAPACITY: usize = 1000;

/// Largest capacity accepted from configuration
pub const MAX_CAPACITY: usize = 1_000_000;

/// Arrival-ordered event history that never grows past its capacity
#[derive(Debug, Clone)]
pub struct EventLog {
    events: VecDeque<Event>,
    capacity: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventLog {
    /// Storage grows on demand, so a large capacity costs nothing up front
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity,
        }
    }

    /// Append the event if `filter` accepts it, dropping the oldest entries
    /// once over capacity. Returns whether it was kept.
    pub fn append(&mut self, event: Event, filter: &Filter) -> bool {
        if !filter.accepts(&event) {
            return false;
        }

        self.events.push_back(event);
        while self.events.len() > self.capacity {
            self.events.pop_front();
        }
        !self.events.is_empty()
    }

    pub fn clear(&mut self) {
        debug!("Clearing {} logged events", self.events.len());
        self.events.clear();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn latest(&self) -> Option<&Event> {
        self.events.back()
    }

    /// Events oldest to newest
    pub fn snapshot(&self) -> impl DoubleEndedIterator<Item = &Event> + ExactSizeIterator + '_ {
        self.events.iter()
    }

    /// The `limit` most recent events, newest first
    pub fn newest_first(&self, limit: usize) -> impl Iterator<Item = &Event> + '_ {
        self.events.iter().rev().take(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::{MessageKind, MidiMessage, RawMessage};

    fn cc(value: u8) -> Event {
        Event::decode(RawMessage::from(vec![0xB0, 1, value % 128]))
    }

    fn value_of(event: &Event) -> u8 {
        match event.message {
            MidiMessage::ControlChange { value, .. } => value,
            _ => panic!("expected a control change"),
        }
    }

    #[test]
    fn test_append_accepted() {
        let mut log = EventLog::default();
        assert_eq!(log.capacity(), DEFAULT_CAPACITY);

        assert!(log.append(cc(1), &Filter::new()));
        assert_eq!(log.len(), 1);
        assert_eq!(log.latest().map(Event::kind), Some(MessageKind::ControlChange));
    }

    #[test]
    fn test_rejected_event_not_logged() {
        let mut log = EventLog::new(10);
        let mut filter = Filter::new();
        filter.toggle_kind(MessageKind::ControlChange);

        assert!(!log.append(cc(1), &filter));
        assert!(log.is_empty());
    }

    #[test]
    fn test_capacity_keeps_most_recent() {
        let mut log = EventLog::new(1000);
        let filter = Filter::new();

        for i in 0..1500u32 {
            log.append(cc((i % 128) as u8), &filter);
        }

        assert_eq!(log.len(), 1000);
        // Oldest surviving entry is #500
        let first = log.snapshot().next().map(value_of);
        assert_eq!(first, Some((500 % 128) as u8));
        let last = log.snapshot().last().map(value_of);
        assert_eq!(last, Some((1499 % 128) as u8));
    }

    #[test]
    fn test_small_capacity_bound() {
        let mut log = EventLog::new(3);
        let filter = Filter::new();
        for v in 0..10 {
            log.append(cc(v), &filter);
            assert!(log.len() <= 3);
        }

        let values: Vec<u8> = log.snapshot().map(value_of).collect();
        assert_eq!(values, vec![7, 8, 9]);

        let newest: Vec<u8> = log.newest_first(2).map(value_of).collect();
        assert_eq!(newest, vec![9, 8]);
    }

    #[test]
    fn test_huge_capacity_allocates_lazily() {
        let mut log = EventLog::new(usize::MAX);
        let filter = Filter::new();
        for v in 0..5 {
            assert!(log.append(cc(v), &filter));
        }

        assert_eq!(log.capacity(), usize::MAX);
        assert_eq!(log.len(), 5);
    }

    #[test]
    fn test_clear_ignores_filter() {
        let mut log = EventLog::new(10);
        let mut filter = Filter::new();
        log.append(cc(1), &filter);
        log.append(cc(2), &filter);

        filter.toggle_kind(MessageKind::ControlChange);
        log.clear();
        assert!(log.is_empty());
    }
}
