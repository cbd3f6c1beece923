//! AIS Type 9 ("Standard SAR Aircraft Position Report") encoder (C4).
//!
//! A pure function from a complete [`Aircraft`] record to a checksummed
//! AIVDM NMEA sentence. Carries no state, so it's trivially safe to call
//! concurrently on distinct records.

use chrono::Timelike;

use crate::sixbit;
use crate::types::{icao_to_mmsi, Aircraft, BridgeError};

/// Render `value mod 2^length` as a zero-padded binary string of `length`
/// bits. `rem_euclid` gives a non-negative result for negative inputs too,
/// which is exactly the two's-complement representation the spec calls for.
fn bits(value: i64, length: u32) -> String {
    let modulus = 1i64 << length;
    let wrapped = value.rem_euclid(modulus);
    format!("{wrapped:0width$b}", width = length as usize)
}

/// Encode a complete aircraft record as a single AIVDM sentence.
///
/// Returns [`BridgeError::IncompleteRecord`] if called on a record that
/// isn't complete, and [`BridgeError::InvalidIcao`] if the record's ICAO
/// isn't valid hex (e.g. a non-hex SBS field that was tracked but never
/// meant to be published).
pub fn encode(aircraft: &Aircraft) -> Result<String, BridgeError> {
    if !aircraft.is_complete() {
        return Err(BridgeError::IncompleteRecord(aircraft.icao.clone()));
    }
    let mmsi =
        icao_to_mmsi(&aircraft.icao).ok_or_else(|| BridgeError::InvalidIcao(aircraft.icao.clone()))?;

    let altitude_m = (aircraft.altitude_ft.unwrap() as f64 * 0.3048).round() as i64;
    let altitude_m = altitude_m.clamp(0, 4095);

    let sog = (aircraft.speed_kn.unwrap().floor() as i64).clamp(0, 1023);

    let lon_units = (aircraft.longitude.unwrap() * 600_000.0).round() as i64;
    let lat_units = (aircraft.latitude.unwrap() * 600_000.0).round() as i64;

    let cog = (aircraft.heading_deg.unwrap() * 10.0).round() as i64;

    let second = aircraft.timestamp.second() as i64;

    let mut payload_bits = String::with_capacity(168);
    payload_bits.push_str(&bits(9, 6)); // message type
    payload_bits.push_str(&bits(0, 2)); // repeat indicator
    payload_bits.push_str(&bits(mmsi as i64, 30)); // mmsi
    payload_bits.push_str(&bits(altitude_m, 12)); // altitude
    payload_bits.push_str(&bits(sog, 10)); // sog
    payload_bits.push_str(&bits(1, 1)); // position accuracy
    payload_bits.push_str(&bits(lon_units, 28)); // longitude
    payload_bits.push_str(&bits(lat_units, 27)); // latitude
    payload_bits.push_str(&bits(cog, 12)); // cog
    payload_bits.push_str(&bits(second, 6)); // timestamp utc second
    payload_bits.push_str(&bits(0, 8)); // regional reserved
    payload_bits.push_str(&bits(0, 1)); // dte
    payload_bits.push_str(&bits(0, 3)); // spare
    payload_bits.push_str(&bits(0, 1)); // assigned
    payload_bits.push_str(&bits(0, 1)); // raim
    payload_bits.push_str(&bits(0, 20)); // radio status

    if payload_bits.len() != 168 {
        payload_bits.truncate(168);
        while payload_bits.len() < 168 {
            payload_bits.push('0');
        }
    }

    let (payload, pad) = sixbit::encode(&payload_bits);
    let body = format!("AIVDM,1,1,,A,{payload},{pad}");
    let checksum = sixbit::checksum(&body);
    Ok(format!("!{body}*{checksum}"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
