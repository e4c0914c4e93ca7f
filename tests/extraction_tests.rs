// Feature extraction behaviour over whole tables

use scaleup_lib::events::{read_event_csv, Event, EventKind, EventTable};
use scaleup_lib::features::{extract_features, BuildError, FeatureValue, FEATURE_COLUMNS};

fn with_tempo(mut notes: Vec<Event>) -> EventTable {
    notes.insert(0, Event::set_tempo(0, 0, 500_000));
    EventTable::from_events(notes)
}

/// A piece with tempo changes, a meter change, two hands, and chords
fn busy_piece() -> Vec<Event> {
    vec![
        Event::set_tempo(0, 0, 500_000).with_time(0),
        Event::time_signature(0, 0, 3, 4).with_time(0),
        Event::note_on(0, 1, 60, 80).with_time(0),
        Event::note_on(0, 1, 64, 80).with_time(0),
        Event::note_on(0, 2, 48, 70).with_time(0),
        Event::note_off(120, 1, 60).with_time(120),
        Event::note_on(120, 1, 67, 75).with_time(0),
        Event::set_tempo(240, 0, 450_000).with_time(120),
        Event::note_on(240, 2, 43, 60).with_time(0),
        Event::note_on(240, 2, 55, 60).with_time(0),
        Event::new(300, 1, EventKind::Other("control_change".to_string())).with_time(60),
        Event::note_on(480, 1, 72, 0).with_time(180),
        Event::time_signature(480, 0, 4, 4).with_time(0),
        Event::note_on(600, 1, 71, 90).with_time(120),
        Event::note_off(720, 1, 71).with_time(120),
    ]
}

#[test]
fn test_average_bpm_matches_average_tempo() {
    let vector = extract_features("busy.csv", &EventTable::from_events(busy_piece())).unwrap();
    assert_eq!(vector.average_bpm, 60_000_000.0 / vector.average_tempo);
    assert_eq!(vector.tempo_change_count, 1);
    assert_eq!(vector.odd_time_signature_count, 1);
}

#[test]
fn test_row_order_does_not_change_features() {
    let events = busy_piece();
    let baseline = extract_features("busy.csv", &EventTable::from_events(events.clone())).unwrap();

    let mut reversed = events.clone();
    reversed.reverse();
    let reversed = extract_features("busy.csv", &EventTable::from_events(reversed)).unwrap();
    assert!(baseline.same_bits(&reversed), "{:?}\n{:?}", baseline, reversed);

    // Interleave from both ends
    let mut shuffled = Vec::with_capacity(events.len());
    let (mut lo, mut hi) = (0usize, events.len());
    while lo < hi {
        hi -= 1;
        shuffled.push(events[hi].clone());
        if lo < hi {
            shuffled.push(events[lo].clone());
            lo += 1;
        }
    }
    let shuffled = extract_features("busy.csv", &EventTable::from_events(shuffled)).unwrap();
    assert!(baseline.same_bits(&shuffled), "{:?}\n{:?}", baseline, shuffled);
}

#[test]
fn test_repeated_builds_are_bit_identical() {
    let table = EventTable::from_events(busy_piece());
    let first = extract_features("busy.csv", &table).unwrap();
    let second = extract_features("busy.csv", &table).unwrap();
    assert!(first.same_bits(&second));
}

#[test]
fn test_no_note_ons_still_emits_record() {
    let table = EventTable::from_events(vec![
        Event::set_tempo(0, 0, 400_000).with_time(0),
        Event::note_off(96, 1, 60).with_time(96),
    ]);
    let vector = extract_features("silent.csv", &table).unwrap();

    for column in [
        "note_density",
        "chord_density",
        "notes_per_second",
        "pitch_range",
        "average_polyphony",
        "max_polyphony",
    ] {
        assert!(
            vector.get(column).is_some_and(|v| v.is_undefined()),
            "{} should be undefined",
            column
        );
    }
    assert_eq!(vector.average_tempo, 400_000.0);
    assert_eq!(vector.average_bpm, 150.0);
    assert_eq!(vector.total_duration, 96.0);
    assert_eq!(vector.note_count, 0);
    assert_eq!(vector.unique_note_count, 0);
}

#[test]
fn test_single_note_on() {
    let vector = extract_features("one.csv", &with_tempo(vec![Event::note_on(10, 1, 60, 64)])).unwrap();
    assert_eq!(vector.average_polyphony, 1.0);
    assert_eq!(vector.max_polyphony, 1.0);
    assert_eq!(vector.hand_independence, 0.0);
    assert_eq!(vector.note_to_note_transition, 0.0);
    assert_eq!(vector.note_to_chord_transition, 0.0);
    assert_eq!(vector.chord_to_note_transition, 0.0);
    assert_eq!(vector.chord_to_chord_transition, 0.0);
    assert!(vector.note_interval_std.is_nan());
}

#[test]
fn test_adjacent_same_tick_pairs_and_polyphony() {
    let table = with_tempo(vec![
        Event::note_on(0, 1, 60, 64),
        Event::note_on(0, 1, 64, 64),
        Event::note_on(10, 1, 67, 64),
        Event::note_on(10, 1, 72, 64),
    ]);
    let vector = extract_features("pairs.csv", &table).unwrap();
    assert_eq!(vector.overlapping_notes, 2);
    assert_eq!(vector.chord_density, 0.5);
    assert_eq!(vector.average_polyphony, 2.0);
    assert_eq!(vector.max_polyphony, 2.0);
    assert_eq!(vector.chord_to_chord_transition, 7.5);
}

#[test]
fn test_note_to_chord_transition_uses_centroid() {
    let table = with_tempo(vec![
        Event::note_on(0, 1, 60, 64),
        Event::note_on(10, 1, 64, 64),
        Event::note_on(10, 1, 67, 64),
    ]);
    let vector = extract_features("move.csv", &table).unwrap();
    assert_eq!(vector.note_to_chord_transition, 5.5);
    assert_eq!(vector.note_to_note_transition, 0.0);
    assert_eq!(vector.chord_to_note_transition, 0.0);
    assert_eq!(vector.chord_to_chord_transition, 0.0);
}

#[test]
fn test_steady_tempo_has_no_complexity() {
    let table = with_tempo(vec![
        Event::note_on(0, 1, 60, 64),
        Event::note_on(48, 1, 62, 64),
    ]);
    let vector = extract_features("steady.csv", &table).unwrap();
    assert_eq!(vector.tempo_deviation, 0.0);
    assert_eq!(vector.tempo_complexity, 0.0);
    assert_eq!(vector.tempo_change_count, 0);
}

#[test]
fn test_csv_without_tempo_header_is_rejected() {
    let csv = "tick,track,type,note,velocity,time\n0,1,note_on,60,64,0\n";
    let table = read_event_csv(csv.as_bytes()).unwrap();
    assert_eq!(
        extract_features("no_tempo.csv", &table),
        Err(BuildError::MissingTempoColumn)
    );
}

#[test]
fn test_csv_with_widened_integers_and_sparse_tempo() {
    let csv = "\
tick,track,type,note,velocity,tempo,numerator,denominator,time,channel
0,0,set_tempo,,,600000.0,,,0,
0,0,time_signature,,,,5.0,4.0,0,
0,1,note_on,60.0,70.0,,,,0,0
480,1,note_on,62.0,70.0,,,,480,0
960,0,set_tempo,,,400000.0,,,480,
960,1,note_on,64.0,70.0,,,,0,0
";
    let table = read_event_csv(csv.as_bytes()).unwrap();
    let vector = extract_features("sparse.csv", &table).unwrap();

    assert_eq!(vector.odd_time_signature_count, 1);
    assert_eq!(vector.tempo_change_count, 1);
    assert_eq!(vector.note_count, 3);
    assert_eq!(vector.tick_count, 960);
    assert_eq!(vector.total_duration, 960.0);
    // Four rows carry 600000 after filling, the two at tick 960 carry 400000
    let expected = (4.0 * 600_000.0 + 2.0 * 400_000.0) / 6.0;
    assert!((vector.average_tempo - expected).abs() < 1e-6);
}

#[test]
fn test_values_follow_schema_order() {
    let vector = extract_features("busy.csv", &EventTable::from_events(busy_piece())).unwrap();
    let values = vector.values();
    assert_eq!(values.len(), FEATURE_COLUMNS.len());
    assert_eq!(values[6], FeatureValue::Count(vector.note_count));
    assert_eq!(vector.get("note_count"), Some(FeatureValue::Count(vector.note_count)));
    assert_eq!(vector.get("not_a_feature"), None);
}
