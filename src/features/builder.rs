// Assembles one feature vector from one event table

use super::extractors::{self, TempoStats};
use super::FeatureVector;
use crate::events::{Event, EventTable};

/// Why a table could not produce a feature vector
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// Without tempo information the piece cannot be tempo-normalised
    #[error("table has no tempo column")]
    MissingTempoColumn,

    #[error("table has no events")]
    EmptyTable,
}

/// Table in the single order every extractor observes: canonical tick order,
/// tempo forward-filled.
struct PreparedTable<'a> {
    events: Vec<&'a Event>,
    filled_tempo: Vec<Option<u32>>,
}

impl<'a> PreparedTable<'a> {
    fn new(table: &'a EventTable) -> Self {
        let mut events: Vec<&Event> = table.events().iter().collect();
        // Stable, and total over row content, so input row order never matters
        events.sort_by(|a, b| a.canonical_cmp(b));

        let mut last_tempo = None;
        let filled_tempo = events
            .iter()
            .map(|e| {
                if e.tempo.is_some() {
                    last_tempo = e.tempo;
                }
                last_tempo
            })
            .collect();

        Self {
            events,
            filled_tempo,
        }
    }

    fn note_ons(&self) -> Vec<&'a Event> {
        self.events.iter().copied().filter(|e| e.is_note_on()).collect()
    }
}

/// Turns an event table into a feature vector. Stateless; one builder can
/// serve any number of threads.
#[derive(Debug, Default, Clone, Copy)]
pub struct FeatureVectorBuilder;

impl FeatureVectorBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Validate, normalise, and run every extractor in dependency order.
    pub fn build(&self, file: &str, table: &EventTable) -> Result<FeatureVector, BuildError> {
        let columns = table.columns();
        if !columns.tempo {
            return Err(BuildError::MissingTempoColumn);
        }
        if table.is_empty() {
            return Err(BuildError::EmptyTable);
        }

        let prepared = PreparedTable::new(table);
        let rows = &prepared.events;
        let note_ons = prepared.note_ons();

        // Independent statistics
        let tempo: TempoStats = extractors::tempo_stats(&prepared.filled_tempo);
        let tempo_change_count = extractors::tempo_change_count(rows);
        let total_duration = extractors::total_duration(rows, columns);
        let tick_count = extractors::max_tick(rows);
        let note_count = note_ons.len() as u64;
        let pitch = extractors::pitch_stats(&note_ons);
        let overlapping_notes = extractors::overlapping_notes(&note_ons);
        let odd_time_signature_count = extractors::odd_time_signature_count(rows, columns);

        let groups = extractors::group_by_tick(&note_ons);
        let polyphony = extractors::polyphony(&groups);
        let hand_independence = extractors::hand_independence(&groups);
        let note_interval_std = extractors::note_interval_std(&note_ons);
        let transitions = extractors::transitions(&note_ons, columns);

        // Derived from the above
        let tempo_complexity = extractors::tempo_complexity(&tempo);
        let note_density = extractors::note_density(note_count, tick_count);
        let notes_per_second = extractors::notes_per_second(note_count, total_duration);
        let chord_density = if note_count == 0 {
            f64::NAN
        } else {
            extractors::chord_density(overlapping_notes, note_count)
        };

        Ok(FeatureVector {
            file: file.to_string(),
            average_tempo: tempo.average_tempo,
            average_bpm: tempo.average_bpm,
            tempo_deviation: tempo.tempo_deviation,
            tempo_complexity,
            tempo_change_count,
            total_duration,
            note_count,
            tick_count,
            note_density,
            notes_per_second,
            unique_note_count: pitch.unique_note_count,
            pitch_range: pitch.pitch_range,
            overlapping_notes,
            chord_density,
            odd_time_signature_count,
            average_polyphony: polyphony.average_polyphony,
            max_polyphony: polyphony.max_polyphony,
            hand_independence,
            note_interval_std,
            note_to_note_transition: transitions.note_to_note,
            note_to_chord_transition: transitions.note_to_chord,
            chord_to_note_transition: transitions.chord_to_note,
            chord_to_chord_transition: transitions.chord_to_chord,
        })
    }
}

/// Build a feature vector with the default builder
pub fn extract_features(file: &str, table: &EventTable) -> Result<FeatureVector, BuildError> {
    FeatureVectorBuilder::new().build(file, table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ColumnSet, EventKind};

    fn chord_piece() -> EventTable {
        EventTable::from_events(vec![
            Event::set_tempo(0, 0, 500_000).with_time(0),
            Event::note_on(0, 1, 60, 80).with_time(0),
            Event::note_on(0, 1, 64, 80).with_time(0),
            Event::note_on(10, 1, 67, 80).with_time(10),
            Event::note_on(10, 1, 72, 80).with_time(0),
            Event::note_off(20, 1, 60).with_time(10),
        ])
    }

    #[test]
    fn test_rejects_table_without_tempo_column() {
        let table = EventTable::new(vec![Event::note_on(0, 0, 60, 80)], ColumnSet::default());
        assert_eq!(
            extract_features("a.csv", &table),
            Err(BuildError::MissingTempoColumn)
        );
    }

    #[test]
    fn test_rejects_empty_table() {
        let table = EventTable::new(Vec::new(), ColumnSet::all());
        assert_eq!(extract_features("a.csv", &table), Err(BuildError::EmptyTable));
    }

    #[test]
    fn test_tempo_is_forward_filled_over_every_row() {
        let table = EventTable::from_events(vec![
            Event::note_on(0, 0, 60, 80),
            Event::set_tempo(0, 0, 400_000),
            Event::note_on(10, 0, 62, 80),
            Event::set_tempo(20, 0, 800_000),
            Event::note_on(20, 0, 64, 80),
        ]);
        let features = extract_features("fill.csv", &table).unwrap();
        // Canonical order puts each tempo first at its tick: 400k x3, 800k x2
        assert_eq!(features.average_tempo, 560_000.0);
        assert_eq!(features.tempo_change_count, 1);
    }

    #[test]
    fn test_chord_piece_statistics() {
        let f = extract_features("chords.csv", &chord_piece()).unwrap();
        assert_eq!(f.note_count, 4);
        assert_eq!(f.tick_count, 20);
        assert_eq!(f.overlapping_notes, 2);
        assert_eq!(f.chord_density, 0.5);
        assert_eq!(f.average_polyphony, 2.0);
        assert_eq!(f.max_polyphony, 2.0);
        assert_eq!(f.unique_note_count, 4);
        assert_eq!(f.pitch_range, 12.0);
        assert_eq!(f.note_density, 0.2);
        assert_eq!(f.total_duration, 20.0);
        assert_eq!(f.notes_per_second, 200.0);
        assert_eq!(f.chord_to_chord_transition, 7.5);
        assert_eq!(f.hand_independence, 0.0);
    }

    #[test]
    fn test_notes_without_time_column_leave_duration_undefined() {
        let table = EventTable::from_events(vec![
            Event::set_tempo(0, 0, 500_000),
            Event::new(5, 0, EventKind::Other("end_of_track".into())),
        ]);
        let f = extract_features("meta.csv", &table).unwrap();
        assert!(f.total_duration.is_nan());
        assert!(f.notes_per_second.is_nan());
        assert_eq!(f.average_bpm, 120.0);
    }
}
