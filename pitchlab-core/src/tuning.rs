//! # Musical Tuning Module
//!
//! Maps frequencies onto twelve-tone equal temperament with A4 = 440 Hz.
//!
//! ## Features
//! - Nearest-semitone note name with scientific octave numbering ("A4", "C#-1")
//! - Fixed-do chromatic solfège (Do, Di, Re, ... Ti)
//! - Cent deviation from the nearest semitone, in (-50, 50]
//! - MIDI number and note name conversions

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::BTreeMap;

/// Reference pitch of A4 in Hz.
pub const A4_FREQUENCY: f32 = 440.0;

/// MIDI note number of A4.
pub const A4_MIDI: i32 = 69;

/// Frequencies below this are treated as "no signal".
pub const MIN_NOTE_FREQUENCY: f32 = 20.0;

/// Label used for both the note and the solfège when there is no note.
pub const NO_NOTE: &str = "--";

/// Note letter and solfège syllable of one pitch class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PitchClass {
    pub letter: &'static str,
    pub solfege: &'static str,
}

const fn class(letter: &'static str, solfege: &'static str) -> PitchClass {
    PitchClass { letter, solfege }
}

/// The twelve pitch classes, indexed by `midi mod 12` (0 = C).
pub const PITCH_CLASSES: [PitchClass; 12] = [
    class("C", "Do"),
    class("C#", "Di"),
    class("D", "Re"),
    class("D#", "Ri"),
    class("E", "Mi"),
    class("F", "Fa"),
    class("F#", "Fi"),
    class("G", "Sol"),
    class("G#", "Si"),
    class("A", "La"),
    class("A#", "Li"),
    class("B", "Ti"),
];

/// Nearest equal-tempered note for a frequency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteInfo {
    /// Letter and octave, e.g. "A4", or "--".
    pub note: String,
    /// Solfège syllable, or "--".
    pub solfege: &'static str,
    /// Deviation from the nearest semitone in cents.
    pub cents: f32,
    /// MIDI number of the nearest semitone; absent when there is no note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub midi: Option<i32>,
}

impl NoteInfo {
    /// The "no note" result.
    pub fn none() -> Self {
        Self {
            note: NO_NOTE.to_string(),
            solfege: NO_NOTE,
            cents: 0.0,
            midi: None,
        }
    }

    /// Whether this is the "no note" result rather than a real note.
    pub fn is_none(&self) -> bool {
        self.midi.is_none()
    }
}

/// Lookup from note name ("A4", "C#3") to MIDI number over the MIDI range 0–127.
static NOTE_MAP: Lazy<BTreeMap<String, i32>> = Lazy::new(|| {
    (0..=127)
        .map(|midi| (note_info_for_midi(midi).note, midi))
        .collect()
});

/// Maps a frequency to its nearest semitone.
///
/// Input that is not finite, not positive, or below [`MIN_NOTE_FREQUENCY`]
/// yields [`NoteInfo::none`].
///
/// # Arguments
/// * `frequency_hz` - Frequency in Hz
///
/// # Returns
/// * `NoteInfo` - Note name, solfège and cents deviation
pub fn get_note_info(frequency_hz: f32) -> NoteInfo {
    if !frequency_hz.is_finite() || frequency_hz < MIN_NOTE_FREQUENCY {
        return NoteInfo::none();
    }

    let semitones = 12.0 * (frequency_hz as f64 / A4_FREQUENCY as f64).log2() + A4_MIDI as f64;
    // Half-way values go to the lower semitone so the remainder lies in (-0.5, 0.5].
    let mut midi = (semitones - 0.5).ceil() as i32;
    let mut cents = ((semitones - midi as f64) * 100.0) as f32;
    // Narrowing to f32 can land a remainder just above -0.5 on -50 exactly.
    if cents <= -50.0 {
        midi -= 1;
        cents += 100.0;
    }

    NoteInfo {
        cents,
        ..note_info_for_midi(midi)
    }
}

/// The note exactly on a MIDI number (zero cents).
pub fn note_info_for_midi(midi: i32) -> NoteInfo {
    let class = PITCH_CLASSES[midi.rem_euclid(12) as usize];
    let octave = midi.div_euclid(12) - 1;
    NoteInfo {
        note: format!("{}{}", class.letter, octave),
        solfege: class.solfege,
        cents: 0.0,
        midi: Some(midi),
    }
}

/// Equal-tempered frequency of a MIDI number.
pub fn frequency_for_midi(midi: i32) -> f32 {
    A4_FREQUENCY * 2.0_f32.powf((midi - A4_MIDI) as f32 / 12.0)
}

/// Gets the MIDI number of a note name such as "A4" or "C#3".
///
/// Only sharps are recognized, matching the labels produced by [`get_note_info`].
pub fn midi_from_name(name: &str) -> Option<i32> {
    NOTE_MAP.get(name.trim()).copied()
}

/// Calculates the deviation from a target frequency in cents.
///
/// Positive values are sharp, negative values flat.
pub fn cents_between(freq: f32, target_freq: f32) -> f32 {
    1200.0 * (freq / target_freq).log2()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn a4_is_exact() {
        assert_eq!(
            get_note_info(440.0),
            NoteInfo {
                note: "A4".to_string(),
                solfege: "La",
                cents: 0.0,
                midi: Some(69),
            }
        );
    }

    #[test]
    fn a_sharp_4() {
        let info = get_note_info(466.16);
        assert_eq!(info.note, "A#4");
        assert_eq!(info.solfege, "Li");
        assert!(info.cents.abs() < 0.1, "cents {}", info.cents);
    }

    #[test]
    fn middle_c_and_neighbours() {
        assert_eq!(get_note_info(261.63).note, "C4");
        assert_eq!(get_note_info(261.63).solfege, "Do");
        assert_eq!(get_note_info(392.0).solfege, "Sol");
        assert_eq!(get_note_info(493.88).note, "B4");
    }

    #[test]
    fn sentinel_for_no_signal() {
        for f in [0.0, -5.0, 19.99, f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            assert_eq!(get_note_info(f), NoteInfo::none(), "input {f}");
        }
        assert_eq!(get_note_info(0.0).note, "--");
        assert_eq!(get_note_info(-5.0).solfege, "--");
    }

    #[test]
    fn sharp_and_flat_deviation() {
        // 10 cents sharp of A4, then 10 cents flat.
        let sharp = get_note_info(440.0 * 2.0_f32.powf(10.0 / 1200.0));
        assert_eq!(sharp.note, "A4");
        assert!((sharp.cents - 10.0).abs() < 0.01);

        let flat = get_note_info(440.0 * 2.0_f32.powf(-10.0 / 1200.0));
        assert_eq!(flat.note, "A4");
        assert!((flat.cents + 10.0).abs() < 0.01);
    }

    #[test]
    fn cents_stay_in_half_open_range() {
        let mut f = 20.0_f32;
        while f < 10_000.0 {
            let info = get_note_info(f);
            assert!(info.cents > -50.0 && info.cents <= 50.0, "{f} Hz -> {}", info.cents);
            f *= 1.0137;
        }
    }

    #[test]
    fn octaves_are_monotonic() {
        let letter = |n: &str| {
            n.trim_end_matches(|c: char| c.is_ascii_digit() || c == '-')
                .to_string()
        };
        let octave = |n: &str| n[letter(n).len()..].parse::<i32>().unwrap();

        for midi in -24..120 {
            let low = note_info_for_midi(midi);
            let high = note_info_for_midi(midi + 12);
            assert_eq!(low.solfege, high.solfege);
            assert_eq!(letter(&low.note), letter(&high.note));
            assert_eq!(octave(&low.note) + 1, octave(&high.note));
        }

        // E0 is the lowest note above the no-signal floor.
        for midi in 16..100 {
            let low = get_note_info(frequency_for_midi(midi));
            let high = get_note_info(frequency_for_midi(midi + 12));
            assert_eq!(low.midi, Some(midi));
            assert_eq!(high.midi, Some(midi + 12));
            assert_eq!(letter(&low.note), letter(&high.note));
        }
    }

    #[test]
    fn octave_numbering() {
        assert_eq!(note_info_for_midi(60).note, "C4");
        assert_eq!(note_info_for_midi(59).note, "B3");
        assert_eq!(note_info_for_midi(1).note, "C#-1");
        assert_eq!(note_info_for_midi(-11).note, "C#-2");
        assert_eq!(note_info_for_midi(-11).solfege, "Di");
    }

    #[test]
    fn names_round_trip_through_the_map() {
        assert_eq!(midi_from_name("A4"), Some(69));
        assert_eq!(midi_from_name(" C#-1 "), Some(1));
        assert_eq!(midi_from_name("G9"), Some(127));
        assert_eq!(midi_from_name("H2"), None);
    }

    #[test]
    fn cents_between_octave() {
        assert!((cents_between(880.0, 440.0) - 1200.0).abs() < 1e-3);
        assert!((cents_between(440.0, 440.0)).abs() < 1e-6);
    }
}
