//! Color palettes for the terminal view

use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};

use crate::midi::MessageKind;

/// Selectable palette
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ThemeName {
    #[default]
    Dark,
    Light,
}

/// 24-bit color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn paint(self, text: &str) -> ColoredString {
        text.truecolor(self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub primary: Rgb,
    pub secondary: Rgb,
    pub foreground: Rgb,
    pub muted: Rgb,
    pub success: Rgb,
    pub warning: Rgb,
    pub error: Rgb,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            primary: Rgb(0x7a, 0xa2, 0xf7),
            secondary: Rgb(0xbb, 0x9a, 0xf7),
            foreground: Rgb(0xc0, 0xca, 0xf5),
            muted: Rgb(0x56, 0x5f, 0x89),
            success: Rgb(0x9e, 0xce, 0x6a),
            warning: Rgb(0xe0, 0xaf, 0x68),
            error: Rgb(0xf7, 0x76, 0x8e),
        }
    }

    pub fn light() -> Self {
        Self {
            primary: Rgb(0x2e, 0x7d, 0xe9),
            secondary: Rgb(0x98, 0x54, 0xf1),
            foreground: Rgb(0x37, 0x60, 0xbf),
            muted: Rgb(0x89, 0x90, 0xb3),
            success: Rgb(0x58, 0x75, 0x39),
            warning: Rgb(0x8c, 0x6c, 0x3e),
            error: Rgb(0xf5, 0x2a, 0x65),
        }
    }

    /// Color code by message kind
    pub fn kind_color(&self, kind: MessageKind) -> Rgb {
        match kind {
            MessageKind::NoteOn => self.success,
            MessageKind::NoteOff => self.error,
            MessageKind::ControlChange => self.warning,
            MessageKind::PitchBend | MessageKind::Aftertouch | MessageKind::PolyAftertouch => {
                self.primary
            }
            MessageKind::Unknown => self.muted,
            _ => self.secondary,
        }
    }
}

impl From<ThemeName> for Theme {
    fn from(name: ThemeName) -> Self {
        match name {
            ThemeName::Dark => Theme::dark(),
            ThemeName::Light => Theme::light(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme::dark()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_themes_differ() {
        assert_ne!(Theme::dark(), Theme::light());
        assert_eq!(Theme::from(ThemeName::default()), Theme::dark());
    }

    #[test]
    fn test_note_kinds_are_distinct() {
        let theme = Theme::dark();
        assert_ne!(
            theme.kind_color(MessageKind::NoteOn),
            theme.kind_color(MessageKind::NoteOff)
        );
    }
}
