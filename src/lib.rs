//! MIDI Viewer
//!
//! Live MIDI input monitor: decodes incoming messages, tracks which notes
//! are sounding and keeps a filterable, bounded event log for display.

pub mod config;
pub mod device;
pub mod midi;
pub mod monitor;
pub mod paths;
pub mod viewer;

pub use midi::{note_name, Event, MessageKind, MidiMessage, RawMessage};
pub use monitor::{ActiveNotes, Column, EventLog, Filter, Monitor, NoteKey};
