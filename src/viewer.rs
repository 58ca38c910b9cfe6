//! Terminal viewer
//!
//! Owns the monitoring engine and is its only writer. A single loop
//! serializes device captures and operator commands, so no engine state is
//! ever touched from two threads.

pub mod commands;
pub mod render;
pub mod theme;

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::device::{Capture, InputDevice};
use crate::monitor::Monitor;

use commands::{Command, HELP};
use render::{EventRecord, Renderer};

/// Result of applying an operator command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Text to show the operator
    Text(String),
    /// State changed, nothing to print
    Done,
    Quit,
}

/// Viewer state: the engine plus the capture pause flag
pub struct Session {
    monitor: Monitor,
    renderer: Renderer,
    device_name: String,
    paused: bool,
    json: bool,
}

impl Session {
    pub fn new(monitor: Monitor, renderer: Renderer, device_name: impl Into<String>) -> Self {
        Self {
            monitor,
            renderer,
            device_name: device_name.into(),
            paused: false,
            json: false,
        }
    }

    /// Emit JSON lines instead of table rows
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Opening lines: header, column titles and a hint
    pub fn banner(&self) -> String {
        let filter = self.monitor.filter();
        let mut lines = vec![self
            .renderer
            .header(&self.device_name, self.paused, filter.is_filtering())];
        if !self.json {
            lines.push(self.renderer.column_header(filter));
        }
        lines.push("Type 'help' for commands.".to_string());
        lines.join("\n")
    }

    /// Feed one captured message; returns the line to print if it was logged
    ///
    /// While paused the message is discarded without being decoded.
    pub fn on_capture(&mut self, capture: Capture) -> Option<String> {
        if self.paused {
            return None;
        }

        self.monitor.ingest_at(capture.raw, capture.received_at)?;
        let event = self.monitor.log().latest()?;
        let filter = self.monitor.filter();

        if self.json {
            let record = EventRecord::new(event, filter.show_note_names());
            match serde_json::to_string(&record) {
                Ok(line) => Some(line),
                Err(e) => {
                    warn!("Failed to serialize event: {}", e);
                    None
                }
            }
        } else {
            Some(self.renderer.row(event, filter))
        }
    }

    pub fn apply(&mut self, command: Command) -> Reply {
        debug!("Command: {:?}", command);

        match command {
            Command::TogglePause => {
                self.paused = !self.paused;
                info!("Capture {}", if self.paused { "paused" } else { "resumed" });
                Reply::Text(self.status())
            }
            Command::Clear => {
                self.monitor.clear_log();
                Reply::Text("Events cleared".to_string())
            }
            Command::ToggleChannel(ch) => {
                self.monitor.filter_mut().toggle_channel(ch);
                Reply::Text(self.status())
            }
            Command::ToggleKind(kind) => {
                self.monitor.filter_mut().toggle_kind(kind);
                Reply::Text(self.status())
            }
            Command::ToggleColumn(column) => {
                self.monitor.filter_mut().toggle_column(column);
                if self.json {
                    Reply::Done
                } else {
                    Reply::Text(self.renderer.column_header(self.monitor.filter()))
                }
            }
            Command::ShowNoteNames(show) => {
                self.monitor.filter_mut().set_show_note_names(show);
                Reply::Done
            }
            Command::Reset => {
                self.monitor.filter_mut().reset();
                Reply::Text(self.status())
            }
            Command::Show(limit) => Reply::Text(self.renderer.table(
                &self.monitor,
                &self.device_name,
                self.paused,
                limit,
            )),
            Command::Notes => Reply::Text(self.renderer.active_notes(
                &self.monitor.active_notes().snapshot(),
                self.monitor.filter(),
            )),
            Command::Filters => {
                Reply::Text(self.renderer.filter_summary(self.monitor.filter()))
            }
            Command::Help => Reply::Text(HELP.to_string()),
            Command::Quit => Reply::Quit,
        }
    }

    fn status(&self) -> String {
        self.renderer.header(
            &self.device_name,
            self.paused,
            self.monitor.filter().is_filtering(),
        )
    }
}

/// Read prompt lines on a blocking thread and forward them to the loop
fn spawn_prompt(tx: mpsc::Sender<String>) -> Result<()> {
    std::thread::Builder::new()
        .name("viewer-prompt".to_string())
        .spawn(move || {
            let mut editor = match DefaultEditor::new() {
                Ok(editor) => editor,
                Err(e) => {
                    warn!("Prompt unavailable, use Ctrl+C to quit: {}", e);
                    return;
                }
            };

            loop {
                match editor.readline("") {
                    Ok(line) => {
                        let _ = editor.add_history_entry(line.as_str());
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                        let _ = tx.blocking_send("quit".to_string());
                        break;
                    }
                    Err(e) => {
                        warn!("Prompt error: {}", e);
                        let _ = tx.blocking_send("quit".to_string());
                        break;
                    }
                }
            }
        })?;

    Ok(())
}

/// Run the viewer until the operator quits or Ctrl+C is pressed
pub async fn run(
    mut session: Session,
    mut device: InputDevice,
    mut captures: mpsc::Receiver<Capture>,
) -> Result<()> {
    let (line_tx, mut lines) = mpsc::channel::<String>(16);
    spawn_prompt(line_tx)?;

    println!("{}", session.banner());

    loop {
        tokio::select! {
            Some(capture) = captures.recv() => {
                if let Some(line) = session.on_capture(capture) {
                    println!("{}", line);
                }
            }

            Some(line) = lines.recv() => {
                match Command::parse(&line) {
                    Ok(Some(command)) => match session.apply(command) {
                        Reply::Text(text) => println!("{}", text),
                        Reply::Done => {}
                        Reply::Quit => break,
                    },
                    Ok(None) => {}
                    Err(e) => println!("{}", e),
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }

            else => break,
        }
    }

    let dropped = device.dropped();
    if dropped > 0 {
        warn!("{} messages were dropped while the viewer was busy", dropped);
    }
    device.disconnect();
    info!("Viewer stopped ({} events logged)", session.monitor().log().len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::{MessageKind, RawMessage};
    use crate::monitor::Filter;
    use chrono::Local;

    fn session() -> Session {
        colored::control::set_override(false);
        Session::new(Monitor::default(), Renderer::default(), "Test Keys")
    }

    fn capture(data: &[u8]) -> Capture {
        Capture {
            received_at: Local::now(),
            raw: RawMessage::copy_from_slice(data),
        }
    }

    #[test]
    fn test_capture_prints_accepted_rows() {
        let mut session = session();

        let line = session.on_capture(capture(&[0x90, 60, 100]));
        assert!(line.is_some_and(|l| l.contains("Note On") && l.contains("C4")));

        session.apply(Command::ToggleKind(MessageKind::Clock));
        assert_eq!(session.on_capture(capture(&[0xF8])), None);
        assert_eq!(session.monitor().log().len(), 1);
    }

    #[test]
    fn test_pause_stops_engine_updates() {
        let mut session = session();
        assert!(!session.is_paused());
        assert_eq!(
            session.apply(Command::TogglePause),
            Reply::Text("MIDI Monitor - Test Keys [PAUSED]".to_string())
        );

        assert_eq!(session.on_capture(capture(&[0x90, 60, 100])), None);
        assert!(session.monitor().log().is_empty());
        assert!(session.monitor().active_notes().is_empty());

        // Filters can still change while paused
        session.apply(Command::ToggleChannel(0));
        session.apply(Command::TogglePause);
        assert!(!session.is_paused());
        assert_eq!(session.on_capture(capture(&[0x90, 60, 100])), None);
        assert!(session.monitor().active_notes().contains(0, 60));
    }

    #[test]
    fn test_clear_and_reset() {
        let mut session = session();
        session.on_capture(capture(&[0x90, 60, 100]));
        session.apply(Command::ToggleChannel(3));
        session.apply(Command::ShowNoteNames(false));

        assert_eq!(
            session.apply(Command::Clear),
            Reply::Text("Events cleared".to_string())
        );
        assert!(session.monitor().log().is_empty());

        session.apply(Command::Reset);
        assert_eq!(session.monitor().filter(), &Filter::new());
    }

    #[test]
    fn test_notes_and_quit() {
        let mut session = session();
        session.on_capture(capture(&[0x99, 36, 90]));

        assert_eq!(
            session.apply(Command::Notes),
            Reply::Text("Active Notes: Ch10:C2".to_string())
        );
        assert_eq!(session.apply(Command::Quit), Reply::Quit);
    }

    #[test]
    fn test_json_output() {
        let mut session = session().with_json(true);
        let line = session
            .on_capture(capture(&[0xB0, 7, 100]))
            .expect("accepted event");

        let value: serde_json::Value = serde_json::from_str(&line).expect("valid json");
        assert_eq!(value["kind"], "CC");
        assert_eq!(value["controller"], 7);
        assert_eq!(value["value"], 100);
    }
}
