//! MIDI input devices
//!
//! Port discovery and selection, and the connection that hands captured
//! messages to the viewer loop.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use colored::*;
use midir::{Ignore, MidiInput, MidiInputConnection};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::midi::RawMessage;

/// Client name announced to the MIDI backend
const CLIENT_NAME: &str = "MIDI-Viewer";

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("no input devices available")]
    NoInputDevices,

    #[error("no input port matches '{0}'")]
    NoMatch(String),
}

/// Information about a MIDI input port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub index: usize,
    pub name: String,
    pub is_virtual: bool,
}

impl PortInfo {
    pub fn new(index: usize, name: impl Into<String>) -> Self {
        let name = name.into();
        let is_virtual = ["Virtual", "loopMIDI", "IAC", "Through"]
            .iter()
            .any(|marker| name.contains(marker));

        Self {
            index,
            name,
            is_virtual,
        }
    }
}

/// One message as received, stamped by the driver callback
#[derive(Debug, Clone)]
pub struct Capture {
    pub received_at: DateTime<Local>,
    pub raw: RawMessage,
}

/// Discover input ports
pub fn discover_input_ports() -> Result<Vec<PortInfo>> {
    let midi_in = MidiInput::new(&format!("{}-Discovery", CLIENT_NAME))
        .context("Failed to initialise MIDI input")?;

    let ports = midi_in
        .ports()
        .iter()
        .enumerate()
        .filter_map(|(index, port)| {
            midi_in
                .port_name(port)
                .ok()
                .map(|name| PortInfo::new(index, name))
        })
        .collect();

    Ok(ports)
}

/// Pick a port by numeric index or case-insensitive name substring
pub fn select_port<'a>(ports: &'a [PortInfo], pattern: &str) -> Result<&'a PortInfo, DeviceError> {
    if ports.is_empty() {
        return Err(DeviceError::NoInputDevices);
    }

    let pattern = pattern.trim();
    if let Ok(index) = pattern.parse::<usize>() {
        return ports
            .iter()
            .find(|p| p.index == index)
            .ok_or_else(|| DeviceError::NoMatch(pattern.to_string()));
    }

    let needle = pattern.to_lowercase();
    ports
        .iter()
        .find(|p| p.name.to_lowercase().contains(&needle))
        .ok_or_else(|| DeviceError::NoMatch(pattern.to_string()))
}

/// Print input ports in a formatted way
pub fn print_ports(ports: &[PortInfo]) {
    println!("\n{}", "=== MIDI Input Ports ===".bold().cyan());

    if ports.is_empty() {
        println!("  {}", "No input ports found".dimmed());
    }

    for port in ports {
        let marker = if port.is_virtual {
            "[VIRTUAL]".yellow()
        } else {
            "[PHYSICAL]".green()
        };
        println!("  {:>2}: {} {}", port.index, marker, port.name);
    }

    println!();
}

/// Open connection to an input port
///
/// Messages are forwarded without blocking the driver thread. When the
/// consumer falls behind, messages are dropped and counted.
pub struct InputDevice {
    name: String,
    connection: Option<MidiInputConnection<()>>,
    dropped: Arc<AtomicU64>,
}

impl InputDevice {
    pub fn connect(port: &PortInfo, tx: mpsc::Sender<Capture>) -> Result<Self> {
        let mut midi_in =
            MidiInput::new(CLIENT_NAME).context("Failed to initialise MIDI input")?;
        // Let SysEx, clock and active sensing through
        midi_in.ignore(Ignore::None);

        let midir_port = midi_in
            .ports()
            .into_iter()
            .nth(port.index)
            .ok_or_else(|| DeviceError::NoMatch(port.name.clone()))?;

        info!("Connecting to: {}", port.name);

        let dropped = Arc::new(AtomicU64::new(0));
        let dropped_cb = dropped.clone();

        let connection = midi_in
            .connect(
                &midir_port,
                "midi-viewer-in",
                move |_timestamp, data, _| {
                    let capture = Capture {
                        received_at: Local::now(),
                        raw: RawMessage::copy_from_slice(data),
                    };

                    if tx.try_send(capture).is_err() {
                        let total = dropped_cb.fetch_add(1, Ordering::Relaxed) + 1;
                        if total.is_power_of_two() {
                            warn!("Viewer is falling behind, {} messages dropped", total);
                        }
                    }
                },
                (),
            )
            .map_err(|e| anyhow::anyhow!("Failed to connect to '{}': {}", port.name, e))?;

        info!("Connected to: {}", port.name);

        Ok(Self {
            name: port.name.clone(),
            connection: Some(connection),
            dropped,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn disconnect(&mut self) {
        if let Some(conn) = self.connection.take() {
            conn.close();
            info!("Disconnected from: {}", self.name);
        }
    }
}

impl Drop for InputDevice {
    fn drop(&mut self) {
        debug!("Dropping input device '{}'", self.name);
        self.disconnect();
    }
}
