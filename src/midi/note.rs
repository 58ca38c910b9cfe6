//! Note number to pitch name conversion

const PITCH_CLASSES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Convert a MIDI note number (0-127) to its musical name
///
/// Middle C (60) is "C4", so note 0 is "C-1" and note 127 is "G9".
pub fn note_name(note: u8) -> String {
    let octave = i32::from(note / 12) - 1;
    format!("{}{}", PITCH_CLASSES[usize::from(note % 12)], octave)
}
