// Fixed-schema feature record for one piece

use serde::Serialize;
use std::fmt;

/// Feature columns in output order. `file` precedes them in every table.
pub const FEATURE_COLUMNS: [&str; 23] = [
    "average_tempo",
    "average_bpm",
    "tempo_deviation",
    "tempo_complexity",
    "tempo_change_count",
    "total_duration",
    "note_count",
    "tick_count",
    "note_density",
    "notes_per_second",
    "unique_note_count",
    "pitch_range",
    "overlapping_notes",
    "chord_density",
    "odd_time_signature_count",
    "average_polyphony",
    "max_polyphony",
    "hand_independence",
    "note_interval_std",
    "note_to_note_transition",
    "note_to_chord_transition",
    "chord_to_note_transition",
    "chord_to_chord_transition",
];

/// A single feature cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue {
    Count(u64),
    /// NaN marks a statistic that is undefined for this piece
    Real(f64),
}

impl FeatureValue {
    pub fn is_undefined(&self) -> bool {
        matches!(self, FeatureValue::Real(x) if x.is_nan())
    }
}

impl fmt::Display for FeatureValue {
    /// Undefined values render as an empty cell
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            FeatureValue::Count(n) => write!(f, "{}", n),
            FeatureValue::Real(x) if x.is_nan() => Ok(()),
            FeatureValue::Real(x) => write!(f, "{}", x),
        }
    }
}

/// Complexity statistics for one piece.
///
/// Field order matches `FEATURE_COLUMNS`; serde serializes NaN as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    pub file: String,

    // Tempo
    /// Mean microseconds per beat over the forward-filled tempo column
    pub average_tempo: f64,
    pub average_bpm: f64,
    /// Sample standard deviation of the filled tempo column
    pub tempo_deviation: f64,
    /// tempo_deviation / average_tempo
    pub tempo_complexity: f64,
    pub tempo_change_count: u64,

    // Size and density
    /// Sum of the `time` column
    pub total_duration: f64,
    pub note_count: u64,
    pub tick_count: u64,
    pub note_density: f64,
    pub notes_per_second: f64,

    // Pitch
    pub unique_note_count: u64,
    pub pitch_range: f64,

    // Simultaneity
    /// Adjacent same-tick note_on pairs with differing pitch
    pub overlapping_notes: u64,
    pub chord_density: f64,
    pub odd_time_signature_count: u64,
    pub average_polyphony: f64,
    pub max_polyphony: f64,
    /// Fraction of onsets shared by more than one track
    pub hand_independence: f64,
    pub note_interval_std: f64,

    // Pitch-centroid movement between consecutive onsets
    pub note_to_note_transition: f64,
    pub note_to_chord_transition: f64,
    pub chord_to_note_transition: f64,
    pub chord_to_chord_transition: f64,
}

impl FeatureVector {
    /// Values in `FEATURE_COLUMNS` order
    pub fn values(&self) -> [FeatureValue; 23] {
        use FeatureValue::{Count, Real};
        [
            Real(self.average_tempo),
            Real(self.average_bpm),
            Real(self.tempo_deviation),
            Real(self.tempo_complexity),
            Count(self.tempo_change_count),
            Real(self.total_duration),
            Count(self.note_count),
            Count(self.tick_count),
            Real(self.note_density),
            Real(self.notes_per_second),
            Count(self.unique_note_count),
            Real(self.pitch_range),
            Count(self.overlapping_notes),
            Real(self.chord_density),
            Count(self.odd_time_signature_count),
            Real(self.average_polyphony),
            Real(self.max_polyphony),
            Real(self.hand_independence),
            Real(self.note_interval_std),
            Real(self.note_to_note_transition),
            Real(self.note_to_chord_transition),
            Real(self.chord_to_note_transition),
            Real(self.chord_to_chord_transition),
        ]
    }

    /// Look a feature up by column name
    pub fn get(&self, column: &str) -> Option<FeatureValue> {
        FEATURE_COLUMNS
            .iter()
            .position(|&c| c == column)
            .map(|idx| self.values()[idx])
    }

    /// Bit-level equality, NaN included
    pub fn same_bits(&self, other: &Self) -> bool {
        self.file == other.file
            && self
                .values()
                .iter()
                .zip(other.values().iter())
                .all(|(a, b)| match (a, b) {
                    (FeatureValue::Count(x), FeatureValue::Count(y)) => x == y,
                    (FeatureValue::Real(x), FeatureValue::Real(y)) => x.to_bits() == y.to_bits(),
                    _ => false,
                })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined_renders_as_empty_cell() {
        assert_eq!(FeatureValue::Real(f64::NAN).to_string(), "");
        assert_eq!(FeatureValue::Real(2.5).to_string(), "2.5");
        assert_eq!(FeatureValue::Count(7).to_string(), "7");
        assert!(FeatureValue::Real(f64::NAN).is_undefined());
        assert!(!FeatureValue::Count(0).is_undefined());
    }
}
