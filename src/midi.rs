//! MIDI message decoding
//!
//! Turns raw bytes captured from an input port into classified [`Event`]s.
//! Decoding is total: anything that does not match a known message shape
//! becomes [`MidiMessage::Unknown`] with the original bytes kept for display.

pub mod note;

use bytes::Bytes;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use note::note_name;

/// Center of the 14-bit pitch bend range
pub const PITCH_BEND_CENTER: u16 = 8192;

/// One complete MIDI message exactly as received from the device
///
/// Cloning is cheap and never copies the underlying buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RawMessage(Bytes);

impl RawMessage {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self(data.into())
    }

    /// Copy a borrowed buffer (e.g. from a driver callback)
    pub fn copy_from_slice(data: &[u8]) -> Self {
        Self(Bytes::copy_from_slice(data))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Hex rendering used for diagnostics
    pub fn to_hex(&self) -> String {
        format_hex(&self.0)
    }
}

impl From<Vec<u8>> for RawMessage {
    fn from(data: Vec<u8>) -> Self {
        Self(Bytes::from(data))
    }
}

impl From<&'static [u8]> for RawMessage {
    fn from(data: &'static [u8]) -> Self {
        Self(Bytes::from_static(data))
    }
}

/// Closed set of message kinds the viewer distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MessageKind {
    #[serde(rename = "Note On")]
    NoteOn,
    #[serde(rename = "Note Off")]
    NoteOff,
    #[serde(rename = "CC")]
    ControlChange,
    #[serde(rename = "Program Change")]
    ProgramChange,
    #[serde(rename = "Pitch Bend")]
    PitchBend,
    #[serde(rename = "Poly Aftertouch")]
    PolyAftertouch,
    #[serde(rename = "Aftertouch")]
    Aftertouch,
    #[serde(rename = "SysEx")]
    SysEx,
    #[serde(rename = "Clock")]
    Clock,
    #[serde(rename = "Start")]
    Start,
    #[serde(rename = "Stop")]
    Stop,
    #[serde(rename = "Continue")]
    Continue,
    #[serde(rename = "Active Sense")]
    ActiveSense,
    #[serde(rename = "Reset")]
    Reset,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl MessageKind {
    /// All kinds, in classification priority order
    pub const ALL: [MessageKind; 15] = [
        MessageKind::NoteOn,
        MessageKind::NoteOff,
        MessageKind::ControlChange,
        MessageKind::ProgramChange,
        MessageKind::PitchBend,
        MessageKind::PolyAftertouch,
        MessageKind::Aftertouch,
        MessageKind::SysEx,
        MessageKind::Clock,
        MessageKind::Start,
        MessageKind::Stop,
        MessageKind::Continue,
        MessageKind::ActiveSense,
        MessageKind::Reset,
        MessageKind::Unknown,
    ];

    /// Display label, also the identifier used by filters and config
    pub fn label(self) -> &'static str {
        match self {
            MessageKind::NoteOn => "Note On",
            MessageKind::NoteOff => "Note Off",
            MessageKind::ControlChange => "CC",
            MessageKind::ProgramChange => "Program Change",
            MessageKind::PitchBend => "Pitch Bend",
            MessageKind::PolyAftertouch => "Poly Aftertouch",
            MessageKind::Aftertouch => "Aftertouch",
            MessageKind::SysEx => "SysEx",
            MessageKind::Clock => "Clock",
            MessageKind::Start => "Start",
            MessageKind::Stop => "Stop",
            MessageKind::Continue => "Continue",
            MessageKind::ActiveSense => "Active Sense",
            MessageKind::Reset => "Reset",
            MessageKind::Unknown => "Unknown",
        }
    }

    /// Whether messages of this kind are scoped to a channel
    pub fn is_channel_voice(self) -> bool {
        matches!(
            self,
            MessageKind::NoteOn
                | MessageKind::NoteOff
                | MessageKind::ControlChange
                | MessageKind::ProgramChange
                | MessageKind::PitchBend
                | MessageKind::PolyAftertouch
                | MessageKind::Aftertouch
        )
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Returned when a string names no message kind
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown message kind: '{0}'")]
pub struct ParseKindError(pub String);

impl FromStr for MessageKind {
    type Err = ParseKindError;

    /// Accepts labels case-insensitively plus a few short aliases
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        let alias = match wanted.as_str() {
            "on" | "noteon" => Some(MessageKind::NoteOn),
            "off" | "noteoff" => Some(MessageKind::NoteOff),
            "pc" | "program" => Some(MessageKind::ProgramChange),
            "pb" | "bend" => Some(MessageKind::PitchBend),
            "poly" => Some(MessageKind::PolyAftertouch),
            "at" => Some(MessageKind::Aftertouch),
            "sense" => Some(MessageKind::ActiveSense),
            _ => None,
        };

        alias
            .or_else(|| {
                MessageKind::ALL
                    .into_iter()
                    .find(|kind| kind.label().to_lowercase() == wanted)
            })
            .ok_or_else(|| ParseKindError(s.to_string()))
    }
}

/// Decoded MIDI message with kind-specific fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidiMessage {
    /// Note On: channel (0-15), note (0-127), velocity (0-127, 0 means release)
    NoteOn { channel: u8, note: u8, velocity: u8 },

    /// Note Off: channel (0-15), note (0-127), release velocity (0-127)
    NoteOff { channel: u8, note: u8, velocity: u8 },

    /// Control Change: channel (0-15), controller (0-127), value (0-127)
    ControlChange { channel: u8, controller: u8, value: u8 },

    /// Program Change: channel (0-15), program (0-127)
    ProgramChange { channel: u8, program: u8 },

    /// Pitch Bend: signed deviation from center plus the raw 14-bit value
    PitchBend { channel: u8, relative: i16, absolute: u16 },

    /// Polyphonic Key Pressure: channel (0-15), note (0-127), pressure (0-127)
    PolyAftertouch { channel: u8, note: u8, pressure: u8 },

    /// Channel Pressure: channel (0-15), pressure (0-127)
    Aftertouch { channel: u8, pressure: u8 },

    /// System Exclusive; payload between F0 and the closing F7, uninterpreted
    SysEx { payload: Bytes },

    Clock,
    Start,
    Stop,
    Continue,
    ActiveSense,
    Reset,

    /// Anything that matched no known shape
    Unknown,
}

impl MidiMessage {
    /// Classify raw bytes. Never fails.
    pub fn decode(raw: &RawMessage) -> Self {
        let data = raw.as_bytes();
        let Some(&status) = data.first() else {
            return MidiMessage::Unknown;
        };

        // Running status and stray data bytes are not reassembled here
        if status < 0x80 {
            return MidiMessage::Unknown;
        }

        let body = &data[1..];
        if status < 0xF0 && body.iter().any(|&b| b >= 0x80) {
            return MidiMessage::Unknown;
        }

        let channel = status & 0x0F;
        match (status & 0xF0, body) {
            (0x90, &[note, velocity]) => MidiMessage::NoteOn { channel, note, velocity },
            (0x80, &[note, velocity]) => MidiMessage::NoteOff { channel, note, velocity },
            (0xB0, &[controller, value]) => MidiMessage::ControlChange {
                channel,
                controller,
                value,
            },
            (0xC0, &[program]) => MidiMessage::ProgramChange { channel, program },
            (0xE0, &[lsb, msb]) => {
                let absolute = (u16::from(msb) << 7) | u16::from(lsb);
                MidiMessage::PitchBend {
                    channel,
                    relative: absolute as i16 - PITCH_BEND_CENTER as i16,
                    absolute,
                }
            }
            (0xA0, &[note, pressure]) => MidiMessage::PolyAftertouch {
                channel,
                note,
                pressure,
            },
            (0xD0, &[pressure]) => MidiMessage::Aftertouch { channel, pressure },
            (0xF0, _) => Self::decode_system(raw),
            _ => MidiMessage::Unknown,
        }
    }

    fn decode_system(raw: &RawMessage) -> Self {
        let data = raw.as_bytes();
        match data {
            [0xF0, ..] => {
                let end = if data.len() > 1 && data[data.len() - 1] == 0xF7 {
                    data.len() - 1
                } else {
                    data.len()
                };
                MidiMessage::SysEx {
                    payload: raw.0.slice(1..end),
                }
            }
            [0xF8] => MidiMessage::Clock,
            [0xFA] => MidiMessage::Start,
            [0xFC] => MidiMessage::Stop,
            [0xFB] => MidiMessage::Continue,
            [0xFE] => MidiMessage::ActiveSense,
            [0xFF] => MidiMessage::Reset,
            _ => MidiMessage::Unknown,
        }
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            MidiMessage::NoteOn { .. } => MessageKind::NoteOn,
            MidiMessage::NoteOff { .. } => MessageKind::NoteOff,
            MidiMessage::ControlChange { .. } => MessageKind::ControlChange,
            MidiMessage::ProgramChange { .. } => MessageKind::ProgramChange,
            MidiMessage::PitchBend { .. } => MessageKind::PitchBend,
            MidiMessage::PolyAftertouch { .. } => MessageKind::PolyAftertouch,
            MidiMessage::Aftertouch { .. } => MessageKind::Aftertouch,
            MidiMessage::SysEx { .. } => MessageKind::SysEx,
            MidiMessage::Clock => MessageKind::Clock,
            MidiMessage::Start => MessageKind::Start,
            MidiMessage::Stop => MessageKind::Stop,
            MidiMessage::Continue => MessageKind::Continue,
            MidiMessage::ActiveSense => MessageKind::ActiveSense,
            MidiMessage::Reset => MessageKind::Reset,
            MidiMessage::Unknown => MessageKind::Unknown,
        }
    }

    /// Get the channel for channel messages (0-15), None for system messages
    pub fn channel(&self) -> Option<u8> {
        match *self {
            MidiMessage::NoteOn { channel, .. }
            | MidiMessage::NoteOff { channel, .. }
            | MidiMessage::ControlChange { channel, .. }
            | MidiMessage::ProgramChange { channel, .. }
            | MidiMessage::PitchBend { channel, .. }
            | MidiMessage::PolyAftertouch { channel, .. }
            | MidiMessage::Aftertouch { channel, .. } => Some(channel),
            _ => None,
        }
    }
}

/// Per-column values of an event, empty where the kind has none
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fields {
    pub note: Option<u8>,
    pub velocity: Option<u8>,
    pub controller: Option<u8>,
    pub value: Option<i32>,
}

/// A decoded message stamped with its capture time
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub timestamp: DateTime<Local>,
    pub message: MidiMessage,
    pub raw: RawMessage,
}

impl Event {
    /// Decode a message captured now
    pub fn decode(raw: RawMessage) -> Self {
        Self::decode_at(raw, Local::now())
    }

    /// Decode a message captured at `timestamp`
    pub fn decode_at(raw: RawMessage, timestamp: DateTime<Local>) -> Self {
        let message = MidiMessage::decode(&raw);
        Self {
            timestamp,
            message,
            raw,
        }
    }

    pub fn kind(&self) -> MessageKind {
        self.message.kind()
    }

    pub fn channel(&self) -> Option<u8> {
        self.message.channel()
    }

    pub fn fields(&self) -> Fields {
        match self.message {
            MidiMessage::NoteOn { note, velocity, .. }
            | MidiMessage::NoteOff { note, velocity, .. } => Fields {
                note: Some(note),
                velocity: Some(velocity),
                ..Fields::default()
            },
            MidiMessage::PolyAftertouch { note, pressure, .. } => Fields {
                note: Some(note),
                value: Some(pressure.into()),
                ..Fields::default()
            },
            MidiMessage::ControlChange { controller, value, .. } => Fields {
                controller: Some(controller),
                value: Some(value.into()),
                ..Fields::default()
            },
            MidiMessage::ProgramChange { program, .. } => Fields {
                value: Some(program.into()),
                ..Fields::default()
            },
            MidiMessage::Aftertouch { pressure, .. } => Fields {
                value: Some(pressure.into()),
                ..Fields::default()
            },
            MidiMessage::PitchBend { relative, .. } => Fields {
                value: Some(relative.into()),
                ..Fields::default()
            },
            _ => Fields::default(),
        }
    }

    /// One-line description of the data bytes
    pub fn summary(&self, note_names: bool) -> String {
        let note = |n: u8| {
            if note_names {
                note_name(n)
            } else {
                n.to_string()
            }
        };

        match self.message {
            MidiMessage::NoteOn { note: n, velocity, .. }
            | MidiMessage::NoteOff { note: n, velocity, .. } => {
                format!("Note: {}, Velocity: {}", note(n), velocity)
            }
            MidiMessage::ControlChange { controller, value, .. } => {
                format!("Controller: {}, Value: {}", controller, value)
            }
            MidiMessage::ProgramChange { program, .. } => format!("Program: {}", program),
            MidiMessage::PitchBend { relative, absolute, .. } => {
                format!("Value: {} (abs: {})", relative, absolute)
            }
            MidiMessage::PolyAftertouch { note: n, pressure, .. } => {
                format!("Note: {}, Pressure: {}", note(n), pressure)
            }
            MidiMessage::Aftertouch { pressure, .. } => format!("Pressure: {}", pressure),
            _ => self.raw.to_hex(),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.channel() {
            Some(ch) => write!(f, "{} ch:{} {}", self.kind(), ch + 1, self.summary(false)),
            None => write!(f, "{} {}", self.kind(), self.summary(false)),
        }
    }
}

/// Format MIDI bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
