//! Operator commands typed at the viewer prompt

use anyhow::{anyhow, bail, Context, Result};

use crate::midi::MessageKind;
use crate::monitor::Column;

/// Rows printed by `show` without an explicit count
pub const DEFAULT_SHOW_ROWS: usize = 20;

pub const HELP: &str = "\
Commands:
  pause              pause/unpause event capture
  clear              clear logged events
  ch <1-16>          toggle a channel
  kind <type>        toggle a message type (e.g. \"note on\", cc, clock)
  col <column>       toggle a column (Time Chan Event Note Vel Ctrl Val)
  names on|off       show note names (C4) or numbers (60)
  reset              show everything again
  show [n]           print the n newest events and active notes
  notes              print active notes
  filters            print current filter toggles
  help               this text
  quit               exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    TogglePause,
    Clear,
    /// Channel 0-15
    ToggleChannel(u8),
    ToggleKind(MessageKind),
    ToggleColumn(Column),
    ShowNoteNames(bool),
    Reset,
    Show(usize),
    Notes,
    Filters,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line; blank lines yield None
    pub fn parse(line: &str) -> Result<Option<Command>> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_lowercase().as_str() {
            "" => return Ok(None),
            "pause" | "p" => Command::TogglePause,
            "clear" | "c" => Command::Clear,
            "ch" | "channel" => {
                let ch: u8 = rest
                    .parse()
                    .with_context(|| format!("invalid channel '{}'", rest))?;
                if !(1..=16).contains(&ch) {
                    bail!("channel must be 1-16, got {}", ch);
                }
                Command::ToggleChannel(ch - 1)
            }
            "kind" | "type" => Command::ToggleKind(rest.parse()?),
            "col" | "column" => Command::ToggleColumn(rest.parse()?),
            "names" => match rest.to_lowercase().as_str() {
                "on" | "true" | "yes" => Command::ShowNoteNames(true),
                "off" | "false" | "no" => Command::ShowNoteNames(false),
                other => bail!("expected 'on' or 'off', got '{}'", other),
            },
            "reset" => Command::Reset,
            "show" | "s" => {
                if rest.is_empty() {
                    Command::Show(DEFAULT_SHOW_ROWS)
                } else {
                    Command::Show(
                        rest.parse()
                            .with_context(|| format!("invalid row count '{}'", rest))?,
                    )
                }
            }
            "notes" | "n" => Command::Notes,
            "filters" | "options" | "o" => Command::Filters,
            "help" | "h" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            other => return Err(anyhow!("unknown command '{}' (try 'help')", other)),
        };

        Ok(Some(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Option<Command> {
        Command::parse(line).expect("valid command")
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse("pause"), Some(Command::TogglePause));
        assert_eq!(parse("  CLEAR "), Some(Command::Clear));
        assert_eq!(parse("reset"), Some(Command::Reset));
        assert_eq!(parse("q"), Some(Command::Quit));
        assert_eq!(parse(""), None);
        assert_eq!(parse("   "), None);
    }

    #[test]
    fn test_channel_is_one_based() {
        assert_eq!(parse("ch 1"), Some(Command::ToggleChannel(0)));
        assert_eq!(parse("ch 16"), Some(Command::ToggleChannel(15)));
        assert!(Command::parse("ch 0").is_err());
        assert!(Command::parse("ch 17").is_err());
        assert!(Command::parse("ch").is_err());
    }

    #[test]
    fn test_kind_and_column() {
        assert_eq!(
            parse("kind note on"),
            Some(Command::ToggleKind(MessageKind::NoteOn))
        );
        assert_eq!(
            parse("kind Active Sense"),
            Some(Command::ToggleKind(MessageKind::ActiveSense))
        );
        assert_eq!(parse("col vel"), Some(Command::ToggleColumn(Column::Vel)));
        assert!(Command::parse("kind bogus").is_err());
        assert!(Command::parse("col bogus").is_err());
    }

    #[test]
    fn test_names_and_show() {
        assert_eq!(parse("names off"), Some(Command::ShowNoteNames(false)));
        assert_eq!(parse("names ON"), Some(Command::ShowNoteNames(true)));
        assert!(Command::parse("names maybe").is_err());

        assert_eq!(parse("show"), Some(Command::Show(DEFAULT_SHOW_ROWS)));
        assert_eq!(parse("show 5"), Some(Command::Show(5)));
        assert!(Command::parse("show lots").is_err());
    }

    #[test]
    fn test_unknown_command() {
        let err = Command::parse("dance").unwrap_err();
        assert!(err.to_string().contains("unknown command"));
    }
}
