//! CRC-8 checksum used by Sensirion sensors.
//!
//! Every 2-byte data word sent by the SCD4x is followed by one checksum byte
//! computed with polynomial `0x31` (x⁸ + x⁵ + x⁴ + 1), initial value `0xFF`,
//! no reflection and no final XOR.

/// Generator polynomial
pub const CRC8_POLYNOMIAL: u8 = 0x31;

/// Initial register value
pub const CRC8_INIT: u8 = 0xFF;

/// Length of a checked data word on the wire (2 data bytes + 1 CRC byte)
pub const WORD_LEN: usize = 3;

/// Compute the CRC-8 over `data`.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = CRC8_INIT;
    for byte in data {
        crc ^= byte;
        for _ in 0..8 {
            if crc & 0x80 != 0 {
                crc = (crc << 1) ^ CRC8_POLYNOMIAL;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// Validate a 3-byte wire word and return its big-endian value.
///
/// Returns `None` when the slice is not exactly [`WORD_LEN`] bytes or when
/// the trailing checksum byte does not match the two data bytes.
pub fn check_word(word: &[u8]) -> Option<u16> {
    let &[hi, lo, crc] = word else {
        return None;
    };

    (crc8(&[hi, lo]) == crc).then(|| u16::from_be_bytes([hi, lo]))
}

/// Encode a data word as it appears on the wire.
pub fn encode_word(value: u16) -> [u8; WORD_LEN] {
    let [hi, lo] = value.to_be_bytes();
    [hi, lo, crc8(&[hi, lo])]
}
