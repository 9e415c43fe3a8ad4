//! # Display Module
//!
//! Text rendering of readouts for the terminal.

use pitchlab_core::{NoteInfo, Readout};

/// One-line tuner readout, e.g. `440.0 Hz  A4   La   +0.0 c`.
pub fn format_readout(readout: &Readout) -> String {
    let mut line = match readout.frequency {
        Some(frequency) => format!("{frequency:>7.1} Hz  {}", format_note(&readout.note)),
        None => format!("{:>7} Hz  {}", "--", format_note(&readout.note)),
    };
    if let Some(cents) = readout.target_cents {
        line.push_str(&format!("  target {cents:+.1} c"));
    }
    line
}

/// Note, solfège and cents in fixed-width columns.
pub fn format_note(note: &NoteInfo) -> String {
    format!("{:<4} {:<4} {:+5.1} c", note.note, note.solfege, note.cents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitchlab_core::tuning;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_a4() {
        let readout = Readout {
            estimate: Some(440.0),
            frequency: Some(440.0),
            note: tuning::get_note_info(440.0),
            target_cents: None,
        };
        assert_eq!(format_readout(&readout), "  440.0 Hz  A4   La    +0.0 c");
    }

    #[test]
    fn renders_empty_readout() {
        let readout = Readout {
            estimate: None,
            frequency: None,
            note: NoteInfo::none(),
            target_cents: None,
        };
        assert_eq!(format_readout(&readout), "     -- Hz  --   --    +0.0 c");
    }

    #[test]
    fn renders_target_deviation() {
        let readout = Readout {
            estimate: Some(445.0),
            frequency: Some(445.0),
            note: tuning::get_note_info(445.0),
            target_cents: Some(19.56),
        };
        assert!(format_readout(&readout).ends_with("target +19.6 c"));
    }
}
