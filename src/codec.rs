//! Catastrophic-trip threshold codec.
//!
//! The PCH thermal block stores temperatures as a 9-bit unsigned field in
//! half-degree steps with a -50 °C offset:
//!
//! ```text
//!   degrees = raw / 2 - 50        raw = (degrees + 50) * 2
//! ```
//!
//! Decoding drops the half-degree bit, so the two functions are inverse
//! over whole degrees in [`MIN_DEGREES_C`]`..=`[`MAX_DEGREES_C`].
//! Bounding the input is the caller's job; encode never fails.

/// Mask for the packed 9-bit temperature field.
pub const RAW_MASK: u16 = 0x1ff;

/// Lowest whole degree the field can represent (raw 0).
pub const MIN_DEGREES_C: i16 = -50;

/// Highest whole degree the field can represent (raw 510).
pub const MAX_DEGREES_C: i16 = 205;

const OFFSET_C: i32 = 50;

/// Decode a raw register value into whole degrees Celsius.
///
/// Bits above the 9-bit field are ignored.
pub const fn decode(raw: u16) -> i16 {
    (((raw & RAW_MASK) as i32) / 2 - OFFSET_C) as i16
}

/// Encode whole degrees Celsius into the packed 9-bit field.
///
/// Values outside the representable range wrap into the field.
pub const fn encode(degrees: i16) -> u16 {
    (((degrees as i32 + OFFSET_C) * 2) as u16) & RAW_MASK
}
