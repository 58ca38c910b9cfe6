//! Live MIDI monitoring engine
//!
//! Wires the decoder, the active-note tracker, the filter and the bounded
//! event log together. Every message updates the tracker; only messages the
//! filter accepts are logged.
//!
//! The engine is synchronous and not shared between threads: the integration
//! layer owns one [`Monitor`] and feeds it from a single task.

pub mod active_notes;
pub mod event_log;
pub mod filter;


use chrono::{DateTime, Local};
use tracing::trace;

use crate::midi::{Event, RawMessage};

pub use active_notes::{ActiveNotes, NoteKey};
pub use event_log::{EventLog, DEFAULT_CAPACITY, MAX_CAPACITY};
pub use filter::{Column, Filter};

/// Decoder, tracker, filter and log behind one entry point
#[derive(Debug, Clone)]
pub struct Monitor {
    filter: Filter,
    active_notes: ActiveNotes,
    log: EventLog,
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, Filter::default())
    }
}

impl Monitor {
    /// Create an engine with a fixed log capacity and initial filter
    pub fn new(capacity: usize, filter: Filter) -> Self {
        Self {
            filter,
            active_notes: ActiveNotes::new(),
            log: EventLog::new(capacity),
        }
    }

    /// Decode and process a message captured now
    pub fn ingest(&mut self, raw: RawMessage) -> Option<&Event> {
        self.ingest_at(raw, Local::now())
    }

    /// Decode and process a message captured at `timestamp`
    ///
    /// Returns the logged event, or None when the filter rejected it.
    pub fn ingest_at(&mut self, raw: RawMessage, timestamp: DateTime<Local>) -> Option<&Event> {
        self.process(Event::decode_at(raw, timestamp))
    }

    /// Process an already decoded event
    pub fn process(&mut self, event: Event) -> Option<&Event> {
        trace!("Ingest: {}", event);
        self.active_notes.apply(&event);

        if self.log.append(event, &self.filter) {
            self.log.latest()
        } else {
            None
        }
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Mutable filter access; changes only affect events ingested afterwards
    pub fn filter_mut(&mut self) -> &mut Filter {
        &mut self.filter
    }

    pub fn active_notes(&self) -> &ActiveNotes {
        &self.active_notes
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Empty the event log; the active notes are kept
    pub fn clear_log(&mut self) {
        self.log.clear();
    }
}
