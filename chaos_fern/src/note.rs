// Note events produced by the generator and consumed by the encoder.
//
// A `NoteEvent` is the whole hand-off between the two halves of the crate:
// the encoder never sees coefficients or chaos state, only an ordered slice
// of these. The legal ranges below are the generator's output contract and
// the encoder's input check.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Lowest piano key the generator emits.
pub const PITCH_MIN: u8 = 25;
/// Highest piano key the generator emits.
pub const PITCH_MAX: u8 = 88;
/// Shortest note, in ticks.
pub const DURATION_MIN: u32 = 100;
/// Longest note, in ticks.
pub const DURATION_MAX: u32 = 1375;

pub const PITCH_RANGE: RangeInclusive<u8> = PITCH_MIN..=PITCH_MAX;
pub const DURATION_RANGE: RangeInclusive<u32> = DURATION_MIN..=DURATION_MAX;

/// Base frequency of the tone-generator key table (A0).
const LOW_A_HZ: f64 = 27.5;
/// Semitone ratio used by the tone-generator key table.
const TWELFTH_ROOT: f64 = 1.05946;

/// One monophonic note: a piano key held for a number of ticks.
///
/// The key doubles as the MIDI note number in the encoded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteEvent {
    pub pitch_key: u8,
    pub duration_ticks: u32,
}

impl NoteEvent {
    pub fn new(pitch_key: u8, duration_ticks: u32) -> Self {
        NoteEvent {
            pitch_key,
            duration_ticks,
        }
    }

    /// True if both fields are inside the generator's output ranges.
    pub fn is_in_range(&self) -> bool {
        PITCH_RANGE.contains(&self.pitch_key) && DURATION_RANGE.contains(&self.duration_ticks)
    }

    /// Frequency in Hz for this key on the square-wave tone output.
    pub fn frequency_hz(&self) -> u32 {
        key_frequency_hz(self.pitch_key)
    }
}

/// Tone frequency for a piano key, rounded half up.
///
/// The key is shifted by four and split into an octave above A0 and a
/// semitone offset within it; the semitone is one below the remainder.
pub fn key_frequency_hz(key: u8) -> u32 {
    let shifted = i32::from(key) + 4;
    let octave = shifted / 12;
    let semitone = shifted % 12 - 1;
    let freq = LOW_A_HZ * 2f64.powi(octave) * TWELFTH_ROOT.powi(semitone);
    (freq + 0.5) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_check() {
        assert!(NoteEvent::new(PITCH_MIN, DURATION_MIN).is_in_range());
        assert!(NoteEvent::new(PITCH_MAX, DURATION_MAX).is_in_range());
        assert!(!NoteEvent::new(PITCH_MIN - 1, 500).is_in_range());
        assert!(!NoteEvent::new(PITCH_MAX + 1, 500).is_in_range());
        assert!(!NoteEvent::new(60, DURATION_MIN - 1).is_in_range());
        assert!(!NoteEvent::new(60, DURATION_MAX + 1).is_in_range());
    }

    #[test]
    fn key_frequencies() {
        // 29 -> octave 2, semitone 4: 27.5 * 4 * 1.05946^4 = 138.6
        assert_eq!(key_frequency_hz(PITCH_MIN), 139);
        // 92 -> octave 7, semitone 7: 27.5 * 128 * 1.05946^7 = 5273.9
        assert_eq!(key_frequency_hz(PITCH_MAX), 5274);
        // 12 -> octave 1, semitone -1: 55 / 1.05946 = 51.9
        assert_eq!(key_frequency_hz(8), 52);
    }

    #[test]
    fn frequency_rises_with_key_within_octave() {
        let freqs: Vec<u32> = (32..43).map(key_frequency_hz).collect();
        assert!(freqs.windows(2).all(|w| w[0] < w[1]), "{freqs:?}");
    }
}
