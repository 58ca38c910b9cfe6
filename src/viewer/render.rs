//! Text rendering of events, active notes and filter state

use colored::Colorize;
use serde::Serialize;

use super::theme::Theme;
use crate::midi::{note_name, Event};
use crate::monitor::{Column, Filter, Monitor, NoteKey};

const TIME_FORMAT: &str = "%H:%M:%S%.3f";

fn column_width(column: Column) -> usize {
    match column {
        Column::Time => 12,
        Column::Chan => 5,
        Column::Event => 16,
        Column::Note => 8,
        Column::Vel => 6,
        Column::Ctrl => 7,
        Column::Val => 6,
    }
}

fn format_note(note: u8, names: bool) -> String {
    if names {
        note_name(note)
    } else {
        note.to_string()
    }
}

/// Plain text of one table cell
pub fn cell_text(event: &Event, column: Column, note_names: bool) -> String {
    let fields = event.fields();
    match column {
        Column::Time => event.timestamp.format(TIME_FORMAT).to_string(),
        Column::Chan => event
            .channel()
            .map(|ch| (ch + 1).to_string())
            .unwrap_or_default(),
        Column::Event => event.kind().label().to_string(),
        Column::Note => fields
            .note
            .map(|n| format_note(n, note_names))
            .unwrap_or_default(),
        Column::Vel => fields.velocity.map(|v| v.to_string()).unwrap_or_default(),
        Column::Ctrl => fields.controller.map(|c| c.to_string()).unwrap_or_default(),
        Column::Val => fields.value.map(|v| v.to_string()).unwrap_or_default(),
    }
}

/// Serializable view of an event for `--json` output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRecord {
    pub time: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocity: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<i32>,
    pub summary: String,
    pub raw: String,
}

impl EventRecord {
    pub fn new(event: &Event, note_names: bool) -> Self {
        let fields = event.fields();
        Self {
            time: event.timestamp.format(TIME_FORMAT).to_string(),
            kind: event.kind().label(),
            channel: event.channel().map(|ch| ch + 1),
            note: fields.note.map(|n| format_note(n, note_names)),
            velocity: fields.velocity,
            controller: fields.controller,
            value: fields.value,
            summary: event.summary(note_names),
            raw: event.raw.to_hex(),
        }
    }
}

/// Turns engine state into terminal lines
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    theme: Theme,
}

impl Renderer {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }

    pub fn header(&self, device: &str, paused: bool, filtering: bool) -> String {
        let mut line = self
            .theme
            .primary
            .paint(&format!("MIDI Monitor - {}", device))
            .bold()
            .to_string();

        if paused {
            line.push_str(&format!(" {}", self.theme.warning.paint("[PAUSED]").bold()));
        }
        if filtering {
            line.push_str(&format!(" {}", self.theme.muted.paint("[FILTERED]")));
        }
        line
    }

    pub fn column_header(&self, filter: &Filter) -> String {
        let cells: Vec<String> = filter
            .visible_columns()
            .map(|col| {
                let text = format!("{:<width$}", col.label(), width = column_width(col));
                self.theme.secondary.paint(&text).bold().underline().to_string()
            })
            .collect();
        format!("  {}", cells.join("  "))
    }

    pub fn row(&self, event: &Event, filter: &Filter) -> String {
        let kind_color = self.theme.kind_color(event.kind());
        let cells: Vec<String> = filter
            .visible_columns()
            .map(|col| {
                let text = format!(
                    "{:<width$}",
                    cell_text(event, col, filter.show_note_names()),
                    width = column_width(col)
                );
                let painted = match col {
                    Column::Time => self.theme.muted.paint(&text),
                    Column::Chan => self.theme.primary.paint(&text),
                    Column::Event => kind_color.paint(&text).bold(),
                    _ => self.theme.foreground.paint(&text),
                };
                painted.to_string()
            })
            .collect();
        format!("  {}", cells.join("  "))
    }

    pub fn active_notes(&self, notes: &[NoteKey], filter: &Filter) -> String {
        let label = self.theme.secondary.paint("Active Notes: ").bold();

        if notes.is_empty() {
            return format!("{}{}", label, self.theme.muted.paint("(none)"));
        }

        let names: Vec<String> = notes
            .iter()
            .map(|key| {
                format!(
                    "Ch{}:{}",
                    u16::from(key.channel) + 1,
                    format_note(key.note, filter.show_note_names())
                )
            })
            .collect();
        format!("{}{}", label, self.theme.success.paint(&names.join(" ")).bold())
    }

    /// Header, the `limit` newest events (newest first) and active notes
    pub fn table(&self, monitor: &Monitor, device: &str, paused: bool, limit: usize) -> String {
        let filter = monitor.filter();
        let mut lines = vec![
            self.header(device, paused, filter.is_filtering()),
            self.column_header(filter),
        ];

        lines.extend(
            monitor
                .log()
                .newest_first(limit)
                .map(|event| self.row(event, filter)),
        );

        lines.push(String::new());
        lines.push(self.active_notes(&monitor.active_notes().snapshot(), filter));
        lines.join("\n")
    }

    /// Current option toggles, grouped like the options screen
    pub fn filter_summary(&self, filter: &Filter) -> String {
        let check = |visible: bool| if visible { "[x]" } else { "[ ]" };
        let mut out = String::new();

        out.push_str(&format!("{}\n", "Channels".bold()));
        let channels: Vec<String> = (0..16u8)
            .map(|ch| format!("{} {:>2}", check(filter.is_channel_visible(ch)), ch + 1))
            .collect();
        for chunk in channels.chunks(8) {
            out.push_str(&format!("  {}\n", chunk.join("  ")));
        }

        out.push_str(&format!("{}\n", "Message Types".bold()));
        for kind in crate::midi::MessageKind::ALL {
            out.push_str(&format!("  {} {}\n", check(filter.is_kind_visible(kind)), kind));
        }

        out.push_str(&format!("{}\n", "Columns".bold()));
        for column in Column::ALL {
            out.push_str(&format!(
                "  {} {}\n",
                check(filter.is_column_visible(column)),
                column
            ));
        }

        out.push_str(&format!("{}\n", "Settings".bold()));
        out.push_str(&format!(
            "  {} Musical Notes",
            check(filter.show_note_names())
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::{MessageKind, RawMessage};
    use chrono::{Local, TimeZone};

    fn plain() -> Renderer {
        colored::control::set_override(false);
        Renderer::default()
    }

    fn event(data: &[u8]) -> Event {
        let ts = Local
            .with_ymd_and_hms(2024, 5, 1, 13, 4, 5)
            .single()
            .expect("valid timestamp");
        Event::decode_at(RawMessage::copy_from_slice(data), ts)
    }

    #[test]
    fn test_cell_text() {
        let note = event(&[0x90, 61, 100]);
        assert_eq!(cell_text(&note, Column::Time, true), "13:04:05.000");
        assert_eq!(cell_text(&note, Column::Chan, true), "1");
        assert_eq!(cell_text(&note, Column::Event, true), "Note On");
        assert_eq!(cell_text(&note, Column::Note, true), "C#4");
        assert_eq!(cell_text(&note, Column::Note, false), "61");
        assert_eq!(cell_text(&note, Column::Vel, true), "100");
        assert_eq!(cell_text(&note, Column::Ctrl, true), "");

        let clock = event(&[0xF8]);
        assert_eq!(cell_text(&clock, Column::Chan, true), "");
        assert_eq!(cell_text(&clock, Column::Val, true), "");

        let bend = event(&[0xEF, 0x00, 0x00]);
        assert_eq!(cell_text(&bend, Column::Chan, true), "16");
        assert_eq!(cell_text(&bend, Column::Val, true), "-8192");
    }

    #[test]
    fn test_row_respects_hidden_columns() {
        let renderer = plain();
        let mut filter = Filter::new();
        for col in [Column::Time, Column::Note, Column::Vel, Column::Val] {
            filter.toggle_column(col);
        }

        let row = renderer.row(&event(&[0xB3, 7, 90]), &filter);
        assert_eq!(row, "  4      CC                7      ");
    }

    #[test]
    fn test_active_notes_line() {
        let renderer = plain();
        let mut filter = Filter::new();

        assert_eq!(renderer.active_notes(&[], &filter), "Active Notes: (none)");

        let notes = [NoteKey::new(0, 60), NoteKey::new(9, 36)];
        assert_eq!(
            renderer.active_notes(&notes, &filter),
            "Active Notes: Ch1:C4 Ch10:C2"
        );

        filter.set_show_note_names(false);
        assert_eq!(
            renderer.active_notes(&notes, &filter),
            "Active Notes: Ch1:60 Ch10:36"
        );
    }

    #[test]
    fn test_header_flags() {
        let renderer = plain();
        assert_eq!(renderer.header("Keys", false, false), "MIDI Monitor - Keys");
        assert_eq!(
            renderer.header("Keys", true, true),
            "MIDI Monitor - Keys [PAUSED] [FILTERED]"
        );
    }

    #[test]
    fn test_table_newest_first() {
        let renderer = plain();
        let mut monitor = Monitor::default();
        monitor.filter_mut().toggle_column(Column::Time);
        monitor.ingest(RawMessage::from(vec![0x90, 60, 100]));
        monitor.ingest(RawMessage::from(vec![0x80, 60, 0]));

        let table = renderer.table(&monitor, "Keys", false, 10);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "MIDI Monitor - Keys");
        assert!(lines[2].contains("Note Off"));
        assert!(lines[3].contains("Note On"));
        assert_eq!(lines.last().copied(), Some("Active Notes: (none)"));
    }

    #[test]
    fn test_filter_summary() {
        let renderer = plain();
        let mut filter = Filter::new();
        filter.toggle_channel(9);
        filter.toggle_kind(MessageKind::Clock);

        let summary = renderer.filter_summary(&filter);
        assert!(summary.contains("[ ] 10"));
        assert!(summary.contains("[x]  1"));
        assert!(summary.contains("[ ] Clock"));
        assert!(summary.contains("[x] Note On"));
        assert!(summary.ends_with("[x] Musical Notes"));
    }

    #[test]
    fn test_event_record_json() {
        let record = EventRecord::new(&event(&[0x90, 60, 100]), true);
        let json = serde_json::to_value(&record).expect("serializable");

        assert_eq!(json["kind"], "Note On");
        assert_eq!(json["channel"], 1);
        assert_eq!(json["note"], "C4");
        assert_eq!(json["velocity"], 100);
        assert_eq!(json["raw"], "90 3C 64");
        assert!(json.get("controller").is_none());
    }
}
