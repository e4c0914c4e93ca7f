// Decoded event log for one piece

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Event type tag as written by the MIDI decoder
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    NoteOn,
    NoteOff,
    SetTempo,
    TimeSignature,
    /// Any other message, tag kept verbatim (e.g. "control_change", "end_of_track")
    Other(String),
}

impl EventKind {
    pub fn parse(tag: &str) -> Self {
        match tag.trim() {
            "note_on" => EventKind::NoteOn,
            "note_off" => EventKind::NoteOff,
            "set_tempo" => EventKind::SetTempo,
            "time_signature" => EventKind::TimeSignature,
            other => EventKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::NoteOn => "note_on",
            EventKind::NoteOff => "note_off",
            EventKind::SetTempo => "set_tempo",
            EventKind::TimeSignature => "time_signature",
            EventKind::Other(tag) => tag,
        }
    }

    /// Position among rows sharing a tick: meta changes first, releases before strikes.
    fn rank(&self) -> u8 {
        match self {
            EventKind::SetTempo => 0,
            EventKind::TimeSignature => 1,
            EventKind::Other(_) => 2,
            EventKind::NoteOff => 3,
            EventKind::NoteOn => 4,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a decoded MIDI track
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Cumulative position in ticks
    pub tick: u64,
    pub track: u32,
    pub kind: EventKind,
    /// Pitch 0-127, note events only
    pub note: Option<u8>,
    /// Velocity 0-127, note events only. 0 on a note_on is a release.
    pub velocity: Option<u8>,
    /// Microseconds per beat, set_tempo only
    pub tempo: Option<u32>,
    pub numerator: Option<u8>,
    pub denominator: Option<u8>,
    /// Delta time in the source unit
    pub time: Option<u64>,
}

impl Event {
    /// Bare event with every optional attribute unset
    pub fn new(tick: u64, track: u32, kind: EventKind) -> Self {
        Self {
            tick,
            track,
            kind,
            note: None,
            velocity: None,
            tempo: None,
            numerator: None,
            denominator: None,
            time: None,
        }
    }

    pub fn note_on(tick: u64, track: u32, note: u8, velocity: u8) -> Self {
        Self {
            note: Some(note),
            velocity: Some(velocity),
            ..Self::new(tick, track, EventKind::NoteOn)
        }
    }

    pub fn note_off(tick: u64, track: u32, note: u8) -> Self {
        Self {
            note: Some(note),
            velocity: Some(0),
            ..Self::new(tick, track, EventKind::NoteOff)
        }
    }

    pub fn set_tempo(tick: u64, track: u32, tempo: u32) -> Self {
        Self {
            tempo: Some(tempo),
            ..Self::new(tick, track, EventKind::SetTempo)
        }
    }

    pub fn time_signature(tick: u64, track: u32, numerator: u8, denominator: u8) -> Self {
        Self {
            numerator: Some(numerator),
            denominator: Some(denominator),
            ..Self::new(tick, track, EventKind::TimeSignature)
        }
    }

    pub fn with_time(mut self, time: u64) -> Self {
        self.time = Some(time);
        self
    }

    pub fn is_note_on(&self) -> bool {
        self.kind == EventKind::NoteOn
    }

    /// Total order used to normalise a table before extraction.
    ///
    /// Tick first, then the row content, so two tables holding the same rows
    /// in different input orders sort identically.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.tick
            .cmp(&other.tick)
            .then_with(|| self.kind.rank().cmp(&other.kind.rank()))
            .then_with(|| self.kind.as_str().cmp(other.kind.as_str()))
            .then_with(|| self.track.cmp(&other.track))
            .then_with(|| self.note.cmp(&other.note))
            .then_with(|| self.velocity.cmp(&other.velocity))
            .then_with(|| self.tempo.cmp(&other.tempo))
            .then_with(|| self.numerator.cmp(&other.numerator))
            .then_with(|| self.denominator.cmp(&other.denominator))
            .then_with(|| self.time.cmp(&other.time))
    }
}

/// Which optional columns the source table carried.
///
/// `tick` and `type` are always present; a table without them never loads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSet {
    pub tempo: bool,
    pub time: bool,
    pub note: bool,
    pub velocity: bool,
    pub track: bool,
    pub numerator: bool,
    pub denominator: bool,
}

impl ColumnSet {
    /// Every optional column present
    pub fn all() -> Self {
        Self {
            tempo: true,
            time: true,
            note: true,
            velocity: true,
            track: true,
            numerator: true,
            denominator: true,
        }
    }

    /// Treat a column as present when any event carries a value for it
    pub fn infer(events: &[Event]) -> Self {
        let mut columns = Self {
            track: true,
            ..Self::default()
        };
        for event in events {
            columns.tempo |= event.tempo.is_some();
            columns.time |= event.time.is_some();
            columns.note |= event.note.is_some();
            columns.velocity |= event.velocity.is_some();
            columns.numerator |= event.numerator.is_some();
            columns.denominator |= event.denominator.is_some();
        }
        columns
    }
}

/// Ordered sequence of timed events for one piece
#[derive(Debug, Clone, PartialEq)]
pub struct EventTable {
    events: Vec<Event>,
    columns: ColumnSet,
}

impl EventTable {
    pub fn new(events: Vec<Event>, columns: ColumnSet) -> Self {
        Self { events, columns }
    }

    pub fn from_events(events: Vec<Event>) -> Self {
        let columns = ColumnSet::infer(&events);
        Self { events, columns }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn columns(&self) -> ColumnSet {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
