//! Shared types and error enum for bridge-core.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// All errors produced by bridge-core.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("invalid ICAO address: {0}")]
    InvalidIcao(String),
    #[error("malformed SBS line: {0}")]
    MalformedLine(String),
    #[error("numeric field parse failure: {0}")]
    NumericParse(String),
    #[error("attempted to encode incomplete record for icao {0}")]
    IncompleteRecord(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

// ---------------------------------------------------------------------------
// ICAO address
// ---------------------------------------------------------------------------

/// Convert a 6-character ICAO field to the 24-bit MMSI the encoder needs.
///
/// The tracker accepts whatever string an SBS line puts in the ICAO column
/// (see `Aircraft::icao`); only the encoder requires it to actually be hex,
/// since a record with a non-hex address can still be tracked, just never
/// published.
pub fn icao_to_mmsi(icao: &str) -> Option<u32> {
    if icao.len() != 6 {
        return None;
    }
    u32::from_str_radix(icao, 16).ok()
}

// ---------------------------------------------------------------------------
// Aircraft record
// ---------------------------------------------------------------------------

/// The per-ICAO kinematic record the tracker maintains and the encoder consumes.
///
/// All fields but `icao` are optional because a single SBS line only ever
/// carries a partial update; a record only becomes encodable once every
/// optional field has been filled in by some subtype and passes range checks
/// (see [`Aircraft::is_complete`]). `icao` is kept as the raw upper-cased
/// field text rather than parsed hex — a non-hex address is still a valid
/// tracker key, it is just rejected later by the encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct Aircraft {
    pub icao: String,
    pub callsign: Option<String>,
    pub altitude_ft: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub heading_deg: Option<f64>,
    pub speed_kn: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl Aircraft {
    /// A freshly sighted aircraft: only the key is known.
    pub fn new(icao: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Aircraft {
            icao: icao.into(),
            callsign: None,
            altitude_ft: None,
            latitude: None,
            longitude: None,
            heading_deg: None,
            speed_kn: None,
            timestamp,
        }
    }

    /// A record is complete iff every optional field is present and in range.
    /// Only complete records are handed to the encoder.
    pub fn is_complete(&self) -> bool {
        let callsign_ok = self
            .callsign
            .as_deref()
            .map(|c| !c.is_empty() && c.len() <= 8)
            .unwrap_or(false);
        let altitude_ok = self.altitude_ft.map(|a| a >= 0).unwrap_or(false);
        let lat_ok = self
            .latitude
            .map(|l| (-90.0..=90.0).contains(&l))
            .unwrap_or(false);
        let lon_ok = self
            .longitude
            .map(|l| (-180.0..=180.0).contains(&l))
            .unwrap_or(false);
        let heading_ok = self
            .heading_deg
            .map(|h| (0.0..360.0).contains(&h))
            .unwrap_or(false);
        let speed_ok = self.speed_kn.map(|s| s >= 0.0).unwrap_or(false);

        callsign_ok && altitude_ok && lat_ok && lon_ok && heading_ok && speed_ok
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icao_to_mmsi() {
        assert_eq!(icao_to_mmsi("4B1A00"), Some(0x4B1A00));
        assert_eq!(icao_to_mmsi("4b1a00"), Some(0x4B1A00));
    }

    #[test]
    fn test_icao_to_mmsi_rejects_non_hex() {
        assert_eq!(icao_to_mmsi("ZZZZZZ"), None);
        assert_eq!(icao_to_mmsi("ABC"), None);
    }

    #[test]
    fn test_incomplete_record_missing_field() {
        let mut a = Aircraft::new("000001", Utc::now());
        a.callsign = Some("AFR123".to_string());
        assert!(!a.is_complete());
    }

    #[test]
    fn test_complete_record() {
        let mut a = Aircraft::new("000001", Utc::now());
        a.callsign = Some("AFR123".to_string());
        a.altitude_ft = Some(35000);
        a.latitude = Some(48.8566);
        a.longitude = Some(2.3522);
        a.heading_deg = Some(90.0);
        a.speed_kn = Some(450.0);
        assert!(a.is_complete());
    }

    #[test]
    fn test_heading_exclusive_upper_bound() {
        let mut a = Aircraft::new("000001", Utc::now());
        a.callsign = Some("AFR123".to_string());
        a.altitude_ft = Some(0);
        a.latitude = Some(0.0);
        a.longitude = Some(0.0);
        a.speed_kn = Some(0.0);
        a.heading_deg = Some(360.0);
        assert!(!a.is_complete(), "heading of exactly 360 is out of range");
        a.heading_deg = Some(359.999);
        assert!(a.is_complete());
    }
}
