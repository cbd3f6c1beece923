//! ITU-R M.1371 sixbit ASCII armouring and NMEA 0183 checksum helpers.
//!
//! Shared by the AIS Type 9 encoder and by tests that need to decode a
//! produced sentence back into bits to check invariants.

/// Map a 6-bit value (0..=63) to its AIVDM payload character.
fn sixbit_to_char(code: u8) -> char {
    let shifted = if code < 40 { code + 48 } else { code + 56 };
    shifted as char
}

/// Map an AIVDM payload character back to its 6-bit value. Returns `None` for
/// bytes outside the armoured range.
fn char_to_sixbit(c: u8) -> Option<u8> {
    match c {
        48..=87 => Some(c - 48),  // '0'..'W'
        96..=119 => Some(c - 56), // '`'..'w'
        _ => None,
    }
}

/// Pad a bit string on the right to a multiple of 6, then armour it.
/// Returns the payload and the pad count (0..=5) used.
pub fn encode(bits: &str) -> (String, u8) {
    let pad = (6 - (bits.len() % 6)) % 6;
    let mut padded = String::with_capacity(bits.len() + pad);
    padded.push_str(bits);
    for _ in 0..pad {
        padded.push('0');
    }

    let mut payload = String::with_capacity(padded.len() / 6);
    for sextet in padded.as_bytes().chunks(6) {
        let value = sextet
            .iter()
            .fold(0u8, |acc, &b| (acc << 1) | (b - b'0'));
        payload.push(sixbit_to_char(value));
    }

    (payload, pad as u8)
}

/// Inverse of [`encode`]: recover the original bit string given the payload
/// and the pad count that was used to produce it.
pub fn decode(payload: &str, pad: u8) -> Option<String> {
    let mut bits = String::with_capacity(payload.len() * 6);
    for &byte in payload.as_bytes() {
        let value = char_to_sixbit(byte)?;
        bits.push_str(&format!("{:06b}", value));
    }
    let keep = bits.len() - pad as usize;
    Some(bits[..keep].to_string())
}

/// 8-bit XOR checksum of every byte in `body`, rendered as two upper-case hex digits.
pub fn checksum(body: &str) -> String {
    let cs = body.bytes().fold(0u8, |acc, b| acc ^ b);
    format!("{cs:02X}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
