// Tabular event log reader/writer

use super::{ColumnSet, Event, EventKind, EventTable, LoadError, Result};
use std::io::{Read, Write};
use std::path::Path;

/// Column order written by `write_event_csv`
pub const EVENT_CSV_HEADER: [&str; 9] = [
    "tick",
    "track",
    "type",
    "note",
    "velocity",
    "tempo",
    "numerator",
    "denominator",
    "time",
];

/// Header positions of the columns the engine understands
#[derive(Debug, Default)]
struct HeaderMap {
    tick: Option<usize>,
    kind: Option<usize>,
    track: Option<usize>,
    note: Option<usize>,
    velocity: Option<usize>,
    tempo: Option<usize>,
    numerator: Option<usize>,
    denominator: Option<usize>,
    time: Option<usize>,
}

impl HeaderMap {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut map = Self::default();
        for (idx, name) in headers.iter().enumerate() {
            let slot = match name.trim() {
                "tick" => &mut map.tick,
                "type" => &mut map.kind,
                "track" => &mut map.track,
                "note" => &mut map.note,
                "velocity" => &mut map.velocity,
                "tempo" => &mut map.tempo,
                "numerator" => &mut map.numerator,
                "denominator" => &mut map.denominator,
                "time" => &mut map.time,
                _ => continue,
            };
            // First occurrence wins on duplicated headers
            if slot.is_none() {
                *slot = Some(idx);
            }
        }
        map
    }

    fn columns(&self) -> ColumnSet {
        ColumnSet {
            tempo: self.tempo.is_some(),
            time: self.time.is_some(),
            note: self.note.is_some(),
            velocity: self.velocity.is_some(),
            track: self.track.is_some(),
            numerator: self.numerator.is_some(),
            denominator: self.denominator.is_some(),
        }
    }
}

/// Read an event log from any reader. The header decides the column set.
pub fn read_event_csv<R: Read>(reader: R) -> Result<EventTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let map = HeaderMap::from_headers(&headers);

    let tick_idx = map.tick.ok_or(LoadError::MissingColumn("tick"))?;
    let kind_idx = map.kind.ok_or(LoadError::MissingColumn("type"))?;

    let mut events = Vec::new();
    for (row_idx, record) in csv_reader.records().enumerate() {
        let record = record?;
        // Data rows are numbered from 1, the header being row 0
        let row = row_idx + 1;

        let tick = parse_cell::<u64>(&record, Some(tick_idx), row, "tick")?
            .ok_or(LoadError::InvalidValue {
                row,
                column: "tick",
                value: String::new(),
            })?;
        let kind = EventKind::parse(record.get(kind_idx).unwrap_or(""));

        events.push(Event {
            tick,
            track: parse_cell::<u32>(&record, map.track, row, "track")?.unwrap_or(0),
            kind,
            note: parse_data_byte(&record, map.note, row, "note")?,
            velocity: parse_data_byte(&record, map.velocity, row, "velocity")?,
            tempo: parse_cell::<u32>(&record, map.tempo, row, "tempo")?,
            numerator: parse_cell::<u8>(&record, map.numerator, row, "numerator")?,
            denominator: parse_cell::<u8>(&record, map.denominator, row, "denominator")?,
            time: parse_cell::<u64>(&record, map.time, row, "time")?,
        });
    }

    Ok(EventTable::new(events, map.columns()))
}

/// Load an event log CSV from disk
pub fn load_event_csv(path: &Path) -> Result<EventTable> {
    let file = std::fs::File::open(path)?;
    read_event_csv(std::io::BufReader::new(file))
}

/// Write a table with the canonical header. Absent values become empty cells.
pub fn write_event_csv<W: Write>(table: &EventTable, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(EVENT_CSV_HEADER)?;

    for event in table.events() {
        csv_writer.write_record([
            event.tick.to_string(),
            event.track.to_string(),
            event.kind.as_str().to_string(),
            optional_cell(event.note),
            optional_cell(event.velocity),
            optional_cell(event.tempo),
            optional_cell(event.numerator),
            optional_cell(event.denominator),
            optional_cell(event.time),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

fn optional_cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Integer cells parsed from integer or float text ("60" and "60.0" both load).
trait FromCell: Sized {
    fn from_f64(value: f64) -> Option<Self>;
}

macro_rules! impl_from_cell {
    ($($ty:ty),*) => {
        $(impl FromCell for $ty {
            fn from_f64(value: f64) -> Option<Self> {
                if value.fract() == 0.0 && value >= 0.0 && value <= <$ty>::MAX as f64 {
                    Some(value as $ty)
                } else {
                    None
                }
            }
        })*
    };
}

impl_from_cell!(u8, u32, u64);

fn parse_cell<T: FromCell + std::str::FromStr>(
    record: &csv::StringRecord,
    idx: Option<usize>,
    row: usize,
    column: &'static str,
) -> Result<Option<T>> {
    let Some(idx) = idx else {
        return Ok(None);
    };
    let raw = record.get(idx).unwrap_or("").trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    if let Ok(value) = raw.parse::<T>() {
        return Ok(Some(value));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(T::from_f64)
        .map(Some)
        .ok_or_else(|| LoadError::InvalidValue {
            row,
            column,
            value: raw.to_string(),
        })
}

/// MIDI data bytes (pitch, velocity) are 7-bit
fn parse_data_byte(
    record: &csv::StringRecord,
    idx: Option<usize>,
    row: usize,
    column: &'static str,
) -> Result<Option<u8>> {
    match parse_cell::<u8>(record, idx, row, column)? {
        Some(value) if value > 127 => Err(LoadError::InvalidValue {
            row,
            column,
            value: value.to_string(),
        }),
        other => Ok(other),
    }
}
