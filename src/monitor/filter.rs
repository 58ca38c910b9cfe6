//! Event visibility filter
//!
//! Hidden channels and message kinds decide which events reach the log.
//! Hidden columns and the note-name flag only change how events are drawn.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::midi::{Event, MessageKind};

/// Table column of the event view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Column {
    Time,
    Chan,
    Event,
    Note,
    Vel,
    Ctrl,
    Val,
}

impl Column {
    /// Display order
    pub const ALL: [Column; 7] = [
        Column::Time,
        Column::Chan,
        Column::Event,
        Column::Note,
        Column::Vel,
        Column::Ctrl,
        Column::Val,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Column::Time => "Time",
            Column::Chan => "Chan",
            Column::Event => "Event",
            Column::Note => "Note",
            Column::Vel => "Vel",
            Column::Ctrl => "Ctrl",
            Column::Val => "Val",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown column: '{0}'")]
pub struct ParseColumnError(pub String);

impl FromStr for Column {
    type Err = ParseColumnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Column::ALL
            .into_iter()
            .find(|col| col.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseColumnError(s.to_string()))
    }
}

/// What the viewer shows
///
/// Everything is visible unless its channel, kind or column has been toggled
/// into a hidden set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    hidden_channels: HashSet<u8>,
    hidden_kinds: HashSet<MessageKind>,
    hidden_columns: HashSet<Column>,
    show_note_names: bool,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            hidden_channels: HashSet::new(),
            hidden_kinds: HashSet::new(),
            hidden_columns: HashSet::new(),
            show_note_names: true,
        }
    }
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an event should be logged and displayed
    ///
    /// Events without a channel (system and unknown messages) are never
    /// rejected by the channel set.
    pub fn accepts(&self, event: &Event) -> bool {
        let channel_hidden = event
            .channel()
            .is_some_and(|ch| self.hidden_channels.contains(&ch));

        !channel_hidden && !self.hidden_kinds.contains(&event.kind())
    }

    /// Toggle a channel's visibility (0-15)
    pub fn toggle_channel(&mut self, channel: u8) {
        let hidden = toggle(&mut self.hidden_channels, channel);
        debug!("Channel {} {}", u16::from(channel) + 1, visibility(hidden));
    }

    pub fn toggle_kind(&mut self, kind: MessageKind) {
        let hidden = toggle(&mut self.hidden_kinds, kind);
        debug!("Message kind '{}' {}", kind, visibility(hidden));
    }

    pub fn toggle_column(&mut self, column: Column) {
        let hidden = toggle(&mut self.hidden_columns, column);
        debug!("Column '{}' {}", column, visibility(hidden));
    }

    pub fn set_show_note_names(&mut self, show: bool) {
        self.show_note_names = show;
    }

    /// Make everything visible again and restore note names
    pub fn reset(&mut self) {
        *self = Self::default();
        debug!("Filter reset");
    }

    pub fn is_channel_visible(&self, channel: u8) -> bool {
        !self.hidden_channels.contains(&channel)
    }

    pub fn is_kind_visible(&self, kind: MessageKind) -> bool {
        !self.hidden_kinds.contains(&kind)
    }

    pub fn is_column_visible(&self, column: Column) -> bool {
        !self.hidden_columns.contains(&column)
    }

    pub fn show_note_names(&self) -> bool {
        self.show_note_names
    }

    /// True when any channel or kind is hidden
    pub fn is_filtering(&self) -> bool {
        !self.hidden_channels.is_empty() || !self.hidden_kinds.is_empty()
    }

    /// Visible columns in display order
    pub fn visible_columns(&self) -> impl Iterator<Item = Column> + '_ {
        Column::ALL
            .into_iter()
            .filter(|col| self.is_column_visible(*col))
    }

    pub fn hidden_channels(&self) -> Vec<u8> {
        sorted(&self.hidden_channels)
    }

    pub fn hidden_kinds(&self) -> Vec<MessageKind> {
        sorted(&self.hidden_kinds)
    }

    pub fn hidden_columns(&self) -> Vec<Column> {
        sorted(&self.hidden_columns)
    }
}

/// Flip membership; returns whether the item is now hidden
fn toggle<T: Eq + std::hash::Hash>(set: &mut HashSet<T>, item: T) -> bool {
    if set.remove(&item) {
        false
    } else {
        set.insert(item);
        true
    }
}

fn sorted<T: Copy + Ord>(set: &HashSet<T>) -> Vec<T> {
    let mut items: Vec<T> = set.iter().copied().collect();
    items.sort();
    items
}

fn visibility(hidden: bool) -> &'static str {
    if hidden {
        "hidden"
    } else {
        "visible"
    }
}
