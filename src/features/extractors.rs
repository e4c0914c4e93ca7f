// Musical-complexity extractors
//
// Every function here is pure. Inputs are views over a table that is
// already in canonical tick order with tempo forward-filled.

use crate::events::{ColumnSet, Event, EventKind};

/// Division that yields NaN instead of inf when the denominator is zero or undefined.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || denominator.is_nan() || numerator.is_nan() {
        f64::NAN
    } else {
        numerator / denominator
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample (n - 1) standard deviation, NaN below two values.
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

// ============================================================================
// Tempo
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoStats {
    pub average_tempo: f64,
    pub tempo_deviation: f64,
    pub average_bpm: f64,
}

/// Statistics over the forward-filled tempo column.
///
/// Rows before the first set_tempo carry no value and are skipped.
/// A single value has deviation 0; no value at all leaves everything NaN.
pub fn tempo_stats(filled_tempo: &[Option<u32>]) -> TempoStats {
    let values: Vec<f64> = filled_tempo.iter().flatten().map(|&t| t as f64).collect();

    let average_tempo = mean(&values);
    let tempo_deviation = match values.len() {
        0 => f64::NAN,
        1 => 0.0,
        _ => sample_std(&values),
    };

    TempoStats {
        average_tempo,
        tempo_deviation,
        average_bpm: ratio(60_000_000.0, average_tempo),
    }
}

/// Coefficient of variation of the tempo
pub fn tempo_complexity(stats: &TempoStats) -> f64 {
    ratio(stats.tempo_deviation, stats.average_tempo)
}

/// set_tempo events whose value differs from the previous set_tempo
pub fn tempo_change_count(events: &[&Event]) -> u64 {
    let mut previous: Option<u32> = None;
    let mut changes = 0;
    for tempo in events
        .iter()
        .filter(|e| e.kind == EventKind::SetTempo)
        .filter_map(|e| e.tempo)
    {
        if previous.is_some_and(|p| p != tempo) {
            changes += 1;
        }
        previous = Some(tempo);
    }
    changes
}

// ============================================================================
// Size and density
// ============================================================================

/// Sum of `time` across all rows; NaN when the table has no time column.
pub fn total_duration(events: &[&Event], columns: ColumnSet) -> f64 {
    if !columns.time {
        return f64::NAN;
    }
    events.iter().filter_map(|e| e.time).map(|t| t as f64).sum()
}

pub fn max_tick(events: &[&Event]) -> u64 {
    events.iter().map(|e| e.tick).max().unwrap_or(0)
}

/// note_on rows per tick of piece length
pub fn note_density(note_on_count: u64, max_tick: u64) -> f64 {
    if note_on_count == 0 {
        return f64::NAN;
    }
    ratio(note_on_count as f64, max_tick as f64)
}

/// note_on rows per thousand units of summed `time`
pub fn notes_per_second(note_on_count: u64, total_duration: f64) -> f64 {
    if note_on_count == 0 {
        return f64::NAN;
    }
    ratio(note_on_count as f64, total_duration / 1000.0)
}

// ============================================================================
// Pitch
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchStats {
    pub unique_note_count: u64,
    /// max - min pitch, NaN without notes
    pub pitch_range: f64,
}

pub fn pitch_stats(note_ons: &[&Event]) -> PitchStats {
    let mut seen = [false; 256];
    let mut lowest: Option<u8> = None;
    let mut highest: Option<u8> = None;

    for note in note_ons.iter().filter_map(|e| e.note) {
        seen[note as usize] = true;
        lowest = Some(lowest.map_or(note, |l| l.min(note)));
        highest = Some(highest.map_or(note, |h| h.max(note)));
    }

    let pitch_range = match (lowest, highest) {
        (Some(lo), Some(hi)) => (hi - lo) as f64,
        _ => f64::NAN,
    };

    PitchStats {
        unique_note_count: seen.iter().filter(|&&s| s).count() as u64,
        pitch_range,
    }
}

// ============================================================================
// Simultaneity
// ============================================================================

/// Adjacent note_on pairs sharing a tick with differing pitch.
///
/// Only neighbours in sorted order are compared, so a three-note chord
/// counts two pairs, not three.
pub fn overlapping_notes(note_ons: &[&Event]) -> u64 {
    note_ons
        .windows(2)
        .filter(|pair| {
            let (prev, next) = (pair[0], pair[1]);
            prev.tick == next.tick
                && matches!((prev.note, next.note), (Some(a), Some(b)) if a != b)
        })
        .count() as u64
}

pub fn chord_density(overlapping_notes: u64, note_on_count: u64) -> f64 {
    ratio(overlapping_notes as f64, note_on_count as f64)
}

/// time_signature rows with an odd numerator; 0 without a numerator column
pub fn odd_time_signature_count(events: &[&Event], columns: ColumnSet) -> u64 {
    if !columns.numerator {
        return 0;
    }
    events
        .iter()
        .filter(|e| e.kind == EventKind::TimeSignature)
        .filter_map(|e| e.numerator)
        .filter(|n| n % 2 == 1)
        .count() as u64
}

/// note_on rows sharing one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickGroup<'a> {
    pub tick: u64,
    pub rows: Vec<&'a Event>,
}

/// Group consecutive rows of a tick-sorted slice by tick
pub fn group_by_tick<'a>(rows: &[&'a Event]) -> Vec<TickGroup<'a>> {
    let mut groups: Vec<TickGroup<'a>> = Vec::new();
    for &row in rows {
        match groups.last_mut() {
            Some(group) if group.tick == row.tick => group.rows.push(row),
            _ => groups.push(TickGroup {
                tick: row.tick,
                rows: vec![row],
            }),
        }
    }
    groups
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Polyphony {
    pub average_polyphony: f64,
    pub max_polyphony: f64,
}

pub fn polyphony(groups: &[TickGroup]) -> Polyphony {
    let sizes: Vec<f64> = groups.iter().map(|g| g.rows.len() as f64).collect();
    Polyphony {
        average_polyphony: mean(&sizes),
        max_polyphony: sizes.iter().copied().reduce(f64::max).unwrap_or(f64::NAN),
    }
}

/// Fraction of tick groups whose notes span more than one track
pub fn hand_independence(groups: &[TickGroup]) -> f64 {
    let independent = groups
        .iter()
        .filter(|g| {
            let first = g.rows[0].track;
            g.rows.iter().any(|r| r.track != first)
        })
        .count();
    ratio(independent as f64, groups.len() as f64)
}

/// Spread of the gaps between successive note_on ticks
pub fn note_interval_std(note_ons: &[&Event]) -> f64 {
    let gaps: Vec<f64> = note_ons
        .windows(2)
        .map(|pair| (pair[1].tick - pair[0].tick) as f64)
        .collect();
    sample_std(&gaps)
}

// ============================================================================
// Note / chord transitions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transitions {
    pub note_to_note: f64,
    pub note_to_chord: f64,
    pub chord_to_note: f64,
    pub chord_to_chord: f64,
}

/// Sum of pitch-centroid movement between consecutive onsets, bucketed by
/// whether each onset is a single note or a chord (two or more pitches).
///
/// Only sounding notes (velocity above zero) form onsets.
pub fn transitions(note_ons: &[&Event], columns: ColumnSet) -> Transitions {
    let sounding: Vec<&Event> = note_ons
        .iter()
        .copied()
        .filter(|e| e.note.is_some())
        .filter(|e| !columns.velocity || e.velocity.is_some_and(|v| v > 0))
        .collect();

    let onsets: Vec<(bool, f64)> = group_by_tick(&sounding)
        .iter()
        .map(|group| {
            let pitches: Vec<f64> = group
                .rows
                .iter()
                .filter_map(|e| e.note)
                .map(|n| n as f64)
                .collect();
            (pitches.len() >= 2, mean(&pitches))
        })
        .collect();

    let mut totals = Transitions::default();
    for pair in onsets.windows(2) {
        let (from_chord, from_centroid) = pair[0];
        let (to_chord, to_centroid) = pair[1];
        let distance = (to_centroid - from_centroid).abs();

        let bucket = match (from_chord, to_chord) {
            (false, false) => &mut totals.note_to_note,
            (false, true) => &mut totals.note_to_chord,
            (true, false) => &mut totals.chord_to_note,
            (true, true) => &mut totals.chord_to_chord,
        };
        *bucket += distance;
    }
    totals
}
