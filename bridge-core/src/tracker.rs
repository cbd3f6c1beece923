//! Per-aircraft state machine driven by a data-driven subtype merge table (C3).
//!
//! Pure logic — no I/O. Each call to [`Tracker::process_line`] parses one SBS
//! line, merges whichever fields that subtype is allowed to touch into the
//! stored record for its ICAO, and — if the result is complete — returns an
//! immutable snapshot for the caller to hand to the encoder. The stored
//! record keeps mutating across calls; the snapshot handed out never does.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::timestamp::TimestampAdjuster;
use crate::types::Aircraft;

/// Minimum number of comma-separated fields a line must have to be considered.
const MIN_FIELDS: usize = 22;

/// What a single SBS line decided to do.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    /// Not a surveillance record at all: too few fields, or the first field
    /// wasn't exactly `"MSG"`. Silently ignored per §4.3.
    NotSbs,
    /// Looked like a line but a field failed to parse. Carries a message
    /// suitable for a debug/warn log; the whole line was dropped.
    Malformed(String),
    /// Merged into the tracker table; the stored record is still incomplete.
    Updated,
    /// Merged into the tracker table and the result is complete — ready to
    /// be handed to the encoder.
    Ready(Aircraft),
}

/// Which fields a given SBS subtype is allowed to overwrite. Absent parsed
/// values never overwrite present state regardless of what this table says;
/// fields this table doesn't name for a subtype are left untouched even if
/// the line happened to carry something at that column.
#[derive(Debug, Clone, Copy, Default)]
struct FieldMask {
    callsign: bool,
    altitude: bool,
    lat: bool,
    lon: bool,
    heading: bool,
    speed: bool,
}

/// Indexed by subtype 1..=8; index 0 and anything out of range behaves like
/// an empty mask ("touch only": timestamp updates, nothing else changes).
const MERGE_TABLE: [FieldMask; 9] = [
    FieldMask {
        callsign: false,
        altitude: false,
        lat: false,
        lon: false,
        heading: false,
        speed: false,
    }, // 0: unused
    FieldMask {
        callsign: true,
        altitude: false,
        lat: false,
        lon: false,
        heading: false,
        speed: false,
    }, // 1: identification
    FieldMask {
        callsign: false,
        altitude: false,
        lat: true,
        lon: true,
        heading: true,
        speed: true,
    }, // 2: surface position
    FieldMask {
        callsign: false,
        altitude: true,
        lat: true,
        lon: true,
        heading: false,
        speed: false,
    }, // 3: airborne position
    FieldMask {
        callsign: false,
        altitude: false,
        lat: false,
        lon: false,
        heading: true,
        speed: true,
    }, // 4: airborne velocity
    FieldMask {
        callsign: true,
        altitude: true,
        lat: false,
        lon: false,
        heading: false,
        speed: false,
    }, // 5: altitude
    FieldMask {
        callsign: true,
        altitude: false,
        lat: false,
        lon: false,
        heading: false,
        speed: false,
    }, // 6: squawk
    FieldMask {
        callsign: false,
        altitude: true,
        lat: false,
        lon: false,
        heading: false,
        speed: false,
    }, // 7: air-to-air
    FieldMask {
        callsign: false,
        altitude: false,
        lat: false,
        lon: false,
        heading: false,
        speed: false,
    }, // 8: all-call reply, touch only
];

fn merge_mask_for(subtype: u8) -> FieldMask {
    MERGE_TABLE
        .get(subtype as usize)
        .copied()
        .unwrap_or_default()
}

/// One parsed SBS line's worth of optional fields, prior to merging.
struct ParsedFields {
    icao: String,
    subtype: u8,
    callsign: Option<String>,
    altitude_ft: Option<i64>,
    speed_kn: Option<f64>,
    heading_deg: Option<f64>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    timestamp: DateTime<Utc>,
}

fn non_empty(field: &str) -> Option<&str> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn parse_line(line: &str, adjuster: &TimestampAdjuster) -> Result<Option<ParsedFields>, String> {
    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() < MIN_FIELDS || parts[0] != "MSG" {
        return Ok(None);
    }

    let subtype: u8 = parts[1]
        .trim()
        .parse()
        .map_err(|_| format!("bad subtype field: {:?}", parts[1]))?;

    let icao = parts[4].trim().to_uppercase();

    let date_time = format!("{} {}", parts[6], parts[7]);
    // A timestamp parse failure falls back to the adjuster's start time
    // rather than dropping the line (§4.2); the fallback flag is intended
    // for the caller's diagnostics, not for rejecting the line.
    let (timestamp, _timestamp_fallback) = adjuster.adjust(&date_time);

    let callsign = non_empty(parts[10]).map(|s| s.to_string());

    let altitude_ft = match non_empty(parts[11]) {
        Some(s) => Some(
            s.parse::<i64>()
                .map_err(|_| format!("bad altitude field: {s:?}"))?,
        ),
        None => None,
    };
    let speed_kn = match non_empty(parts[12]) {
        Some(s) => Some(
            s.parse::<f64>()
                .map_err(|_| format!("bad speed field: {s:?}"))?,
        ),
        None => None,
    };
    let heading_deg = match non_empty(parts[13]) {
        Some(s) => Some(
            s.parse::<f64>()
                .map_err(|_| format!("bad heading field: {s:?}"))?,
        ),
        None => None,
    };
    let latitude = match non_empty(parts[14]) {
        Some(s) => Some(
            s.parse::<f64>()
                .map_err(|_| format!("bad latitude field: {s:?}"))?,
        ),
        None => None,
    };
    let longitude = match non_empty(parts[15]) {
        Some(s) => Some(
            s.parse::<f64>()
                .map_err(|_| format!("bad longitude field: {s:?}"))?,
        ),
        None => None,
    };

    Ok(Some(ParsedFields {
        icao,
        subtype,
        callsign,
        altitude_ft,
        speed_kn,
        heading_deg,
        latitude,
        longitude,
        timestamp,
    }))
}

/// Per-ICAO aircraft record table, fed one SBS line at a time.
pub struct Tracker {
    table: HashMap<String, Aircraft>,
    adjuster: TimestampAdjuster,
}

impl Tracker {
    pub fn new() -> Self {
        Tracker {
            table: HashMap::new(),
            adjuster: TimestampAdjuster::new(),
        }
    }

    /// Build a tracker with an explicit adjuster — used by tests that need
    /// deterministic timestamps.
    pub fn with_adjuster(adjuster: TimestampAdjuster) -> Self {
        Tracker {
            table: HashMap::new(),
            adjuster,
        }
    }

    /// Current record for an ICAO, if one has been seen.
    pub fn get(&self, icao: &str) -> Option<&Aircraft> {
        self.table.get(icao)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Parse and merge one line. Never panics and never returns an `Err` —
    /// all failure modes are represented in [`LineOutcome`] for the caller
    /// to log at the appropriate level.
    pub fn process_line(&mut self, line: &str) -> LineOutcome {
        let fields = match parse_line(line, &self.adjuster) {
            Ok(Some(fields)) => fields,
            Ok(None) => return LineOutcome::NotSbs,
            Err(message) => return LineOutcome::Malformed(message),
        };

        let mask = merge_mask_for(fields.subtype);

        let prior = self
            .table
            .entry(fields.icao.clone())
            .or_insert_with(|| Aircraft::new(fields.icao.clone(), fields.timestamp));

        let mut next = prior.clone();
        next.timestamp = fields.timestamp;

        if mask.callsign {
            if let Some(callsign) = fields.callsign {
                next.callsign = Some(callsign);
            }
        }
        if mask.altitude {
            if let Some(altitude) = fields.altitude_ft {
                next.altitude_ft = Some(altitude);
            }
        }
        if mask.lat {
            if let Some(lat) = fields.latitude {
                next.latitude = Some(lat);
            }
        }
        if mask.lon {
            if let Some(lon) = fields.longitude {
                next.longitude = Some(lon);
            }
        }
        if mask.heading {
            if let Some(heading) = fields.heading_deg {
                next.heading_deg = Some(heading);
            }
        }
        if mask.speed {
            if let Some(speed) = fields.speed_kn {
                next.speed_kn = Some(speed);
            }
        }

        *prior = next.clone();

        if next.is_complete() {
            LineOutcome::Ready(next)
        } else {
            LineOutcome::Updated
        }
    }
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
