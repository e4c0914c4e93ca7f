// Standard MIDI File -> event table flattening

use super::{Event, EventKind, EventTable, LoadError, Result};
use std::path::Path;

/// Decode a MIDI file from disk into an event table.
pub fn import_midi(path: &Path) -> Result<EventTable> {
    let data = std::fs::read(path)?;
    events_from_smf(&data)
}

/// Flatten every track of an in-memory SMF into one table.
///
/// Ticks are cumulative per track; `time` keeps the raw delta. Tracks are
/// concatenated in file order and left unsorted, the feature builder sorts.
pub fn events_from_smf(data: &[u8]) -> Result<EventTable> {
    let smf = midly::Smf::parse(data).map_err(|e| LoadError::Midi(e.to_string()))?;

    let mut events = Vec::new();
    for (track_idx, track) in smf.tracks.iter().enumerate() {
        let track_idx = track_idx as u32;
        let mut current_tick: u64 = 0;

        for event in track {
            let delta = event.delta.as_int() as u64;
            current_tick += delta;
            events.push(convert_event(&event.kind, current_tick, track_idx).with_time(delta));
        }
    }

    log::debug!(
        "Flattened {} MIDI tracks into {} events",
        smf.tracks.len(),
        events.len()
    );

    Ok(EventTable::from_events(events))
}

fn convert_event(kind: &midly::TrackEventKind, tick: u64, track: u32) -> Event {
    match kind {
        midly::TrackEventKind::Midi { message, .. } => match message {
            midly::MidiMessage::NoteOn { key, vel } => {
                Event::note_on(tick, track, key.as_int(), vel.as_int())
            }
            midly::MidiMessage::NoteOff { key, vel } => Event {
                velocity: Some(vel.as_int()),
                ..Event::note_off(tick, track, key.as_int())
            },
            midly::MidiMessage::Controller { .. } => other(tick, track, "control_change"),
            midly::MidiMessage::ProgramChange { .. } => other(tick, track, "program_change"),
            midly::MidiMessage::PitchBend { .. } => other(tick, track, "pitchwheel"),
            midly::MidiMessage::Aftertouch { .. } => other(tick, track, "polytouch"),
            midly::MidiMessage::ChannelAftertouch { .. } => other(tick, track, "aftertouch"),
        },
        midly::TrackEventKind::Meta(meta) => match meta {
            midly::MetaMessage::Tempo(t) => Event::set_tempo(tick, track, t.as_int()),
            midly::MetaMessage::TimeSignature(numerator, denominator_pow, _, _) => {
                // Denominator is stored as a power of two
                let denominator = 1u32
                    .checked_shl(*denominator_pow as u32)
                    .and_then(|d| u8::try_from(d).ok())
                    .unwrap_or(u8::MAX);
                Event::time_signature(tick, track, *numerator, denominator)
            }
            midly::MetaMessage::KeySignature(..) => other(tick, track, "key_signature"),
            midly::MetaMessage::EndOfTrack => other(tick, track, "end_of_track"),
            midly::MetaMessage::TrackName(_) => other(tick, track, "track_name"),
            _ => other(tick, track, "meta"),
        },
        midly::TrackEventKind::SysEx(_) | midly::TrackEventKind::Escape(_) => {
            other(tick, track, "sysex")
        }
    }
}

fn other(tick: u64, track: u32, tag: &str) -> Event {
    Event::new(tick, track, EventKind::Other(tag.to_string()))
}
