//! Fixed-point encodings of physical quantities and the packet checksum.
//!
//! Each quantity has its own transform:
//!
//! | Quantity | Wire | Resolution |
//! |---|---|---|
//! | angle (rad) | `u16`, normalized to [0, 2π) then floored | 0.5° |
//! | angular rate (rad/s) | sign byte + `u8` magnitude, rounded | π/1800 rad/s |
//! | latitude/longitude (°) | sign byte + `u32` magnitude, rounded | 1e-6° |
//! | altitude (m) | sign byte + `u16` magnitude, rounded | 0.1 m |
//!
//! Sign bytes are `0` for non-negative and `1` for negative values. All
//! multi-byte integers are big-endian; the callers in [`crate::packet`]
//! place them with `bytes::BufMut`.

use std::f64::consts::{PI, TAU};

use crc::{Crc, CRC_8_SMBUS};

use crate::error::{FrameError, Result};

const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_SMBUS);

/// Encoded angle steps per revolution (0.5° each).
pub const ANGLE_STEPS: u16 = 720;

/// Angular rate resolution in rad/s per magnitude unit.
pub const ANGULAR_VELOCITY_RESOLUTION: f64 = PI / 1800.0;

/// Largest encodable angular rate magnitude, in rad/s.
pub const MAX_ANGULAR_VELOCITY: f64 = u8::MAX as f64 * ANGULAR_VELOCITY_RESOLUTION;

/// Latitude/longitude resolution in degrees.
pub const LATLON_RESOLUTION: f64 = 1e-6;

/// Altitude resolution in meters.
pub const ALTITUDE_RESOLUTION: f64 = 0.1;

pub const SIGN_POSITIVE: u8 = 0;
pub const SIGN_NEGATIVE: u8 = 1;

/// CRC-8/SMBUS over `bytes` (poly 0x07, init 0x00).
pub fn compute_checksum(bytes: &[u8]) -> u8 {
    CRC8.checksum(bytes)
}

/// Encode an angle in radians, wrapping it into [0, 2π) first.
///
/// Angles just below 2π floor to `ANGLE_STEPS - 1`, never wrap to 0.
pub fn encode_angle(angle: f64) -> Result<u16> {
    if !angle.is_finite() {
        return Err(FrameError::ValueOutOfRange {
            field: "angle",
            value: angle,
        });
    }

    let mut normalized = angle % TAU;
    if normalized < 0.0 {
        normalized += TAU;
    }
    let steps = (normalized * 360.0 / PI).floor();
    Ok((steps as u16).min(ANGLE_STEPS - 1))
}

pub fn decode_angle(encoded: u16) -> f64 {
    f64::from(encoded) / 360.0 * PI
}

/// Encode an angular rate in rad/s as `[sign, magnitude]`.
pub fn encode_angular_velocity(velocity: f64) -> Result<[u8; 2]> {
    let (sign, magnitude) = encode_sign_magnitude(
        "angular velocity",
        velocity,
        1800.0 / PI,
        u32::from(u8::MAX),
    )?;
    Ok([sign, magnitude as u8])
}

pub fn decode_angular_velocity(sign: u8, magnitude: u8) -> Result<f64> {
    Ok(decode_sign("angular velocity sign", sign)?
        * f64::from(magnitude)
        * ANGULAR_VELOCITY_RESOLUTION)
}

/// Encode a latitude or longitude in degrees as `(sign, micro-degrees)`.
pub fn encode_latlon(degrees: f64) -> Result<(u8, u32)> {
    encode_sign_magnitude("latitude/longitude", degrees, 1e6, u32::MAX)
}

pub fn decode_latlon(sign: u8, magnitude: u32) -> Result<f64> {
    Ok(decode_sign("latitude/longitude sign", sign)? * f64::from(magnitude) * LATLON_RESOLUTION)
}

/// Encode an altitude in meters as `(sign, decimeters)`.
pub fn encode_altitude(meters: f64) -> Result<(u8, u16)> {
    let (sign, magnitude) = encode_sign_magnitude("altitude", meters, 10.0, u32::from(u16::MAX))?;
    Ok((sign, magnitude as u16))
}

pub fn decode_altitude(sign: u8, magnitude: u16) -> Result<f64> {
    Ok(decode_sign("altitude sign", sign)? * f64::from(magnitude) * ALTITUDE_RESOLUTION)
}

fn encode_sign_magnitude(
    field: &'static str,
    value: f64,
    scale: f64,
    max: u32,
) -> Result<(u8, u32)> {
    let out_of_range = || FrameError::ValueOutOfRange { field, value };
    if !value.is_finite() {
        return Err(out_of_range());
    }

    // f64::round rounds half away from zero.
    let magnitude = (value.abs() * scale).round();
    if magnitude > f64::from(max) {
        return Err(out_of_range());
    }

    let sign = if value < 0.0 && magnitude > 0.0 {
        SIGN_NEGATIVE
    } else {
        SIGN_POSITIVE
    };
    Ok((sign, magnitude as u32))
}

fn decode_sign(field: &'static str, sign: u8) -> Result<f64> {
    match sign {
        SIGN_POSITIVE => Ok(1.0),
        SIGN_NEGATIVE => Ok(-1.0),
        value => Err(FrameError::InvalidField { field, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEG: f64 = PI / 180.0;

    #[test]
    fn checksum_matches_reference_vectors() {
        assert_eq!(compute_checksum(&[0x00, 0x00]), 0x00);
        assert_eq!(compute_checksum(&[0x01, 0x00]), 0x15);
        assert_eq!(compute_checksum(&[0x02, 0x00, 0x02]), 0xD8);
        assert_eq!(compute_checksum(&[0x05, 0x01, 0x01]), 0xD2);
    }

    #[test]
    fn encode_angle_normalizes_its_input() {
        // -150.1° wraps to 209.9°, i.e. 419 half-degree steps.
        assert_eq!(encode_angle(-150.1 * DEG).unwrap(), 0x01A3);
        assert_eq!(encode_angle(209.9 * DEG).unwrap(), 0x01A3);
        assert_eq!(encode_angle(4.0 * PI + 10.2 * DEG).unwrap(), 20);
    }

    #[test]
    fn encode_angle_handles_upper_limit_properly() {
        assert_eq!(encode_angle(TAU - 1e-9).unwrap(), 0x02CF);
        assert_eq!(encode_angle(TAU).unwrap(), 0);
        assert_eq!(encode_angle(-1e-12).unwrap(), ANGLE_STEPS - 1);
    }

    #[test]
    fn encode_angle_floors_toward_zero() {
        assert_eq!(encode_angle(0.1).unwrap(), 11);
        assert_eq!(encode_angle(0.3).unwrap(), 34);
        assert_eq!(encode_angle(0.2).unwrap(), 22);
        assert_eq!(encode_angle(0.49 * DEG).unwrap(), 0);
        assert_eq!(encode_angle(0.5 * DEG + 1e-12).unwrap(), 1);
    }

    #[test]
    fn encode_angle_rejects_non_finite_values() {
        assert!(matches!(
            encode_angle(f64::NAN),
            Err(FrameError::ValueOutOfRange { field: "angle", .. })
        ));
        assert!(encode_angle(f64::INFINITY).is_err());
    }

    #[test]
    fn decoded_angle_is_within_half_a_degree() {
        for degrees in [0.0, 12.3, 90.0, 179.75, 270.4, 359.9] {
            let angle = degrees * DEG;
            let decoded = decode_angle(encode_angle(angle).unwrap());
            assert!(angle - decoded >= 0.0);
            assert!(angle - decoded < 0.5 * DEG);
        }
    }

    #[test]
    fn angular_velocity_uses_sign_and_rounded_magnitude() {
        assert_eq!(encode_angular_velocity(0.1).unwrap(), [0x00, 0x39]);
        assert_eq!(encode_angular_velocity(-0.2).unwrap(), [0x01, 0x73]);
        assert_eq!(encode_angular_velocity(0.3).unwrap(), [0x00, 0xAC]);
        assert_eq!(encode_angular_velocity(-1e-6).unwrap(), [0x00, 0x00]);
    }

    #[test]
    fn angular_velocity_decodes_with_sign() {
        assert!((decode_angular_velocity(0, 0x39).unwrap() - 0.09948).abs() < 1e-4);
        assert!((decode_angular_velocity(1, 0x73).unwrap() + 0.200713).abs() < 1e-4);
        assert!(matches!(
            decode_angular_velocity(2, 0x01),
            Err(FrameError::InvalidField { value: 2, .. })
        ));
    }

    #[test]
    fn angular_velocity_rejects_values_beyond_one_byte() {
        assert!(encode_angular_velocity(MAX_ANGULAR_VELOCITY).is_ok());
        assert!(matches!(
            encode_angular_velocity(0.5),
            Err(FrameError::ValueOutOfRange { .. })
        ));
        assert!(encode_angular_velocity(-0.5).is_err());
        assert!(encode_angular_velocity(f64::NAN).is_err());
    }

    #[test]
    fn latlon_uses_micro_degrees() {
        assert_eq!(encode_latlon(-0.1).unwrap(), (1, 100_000));
        assert_eq!(encode_latlon(0.2).unwrap(), (0, 200_000));
        assert_eq!(encode_latlon(48.858_370).unwrap(), (0, 48_858_370));
        assert!((decode_latlon(1, 100_000).unwrap() + 0.1).abs() < 1e-9);
        assert!((decode_latlon(0, 179_999_999).unwrap() - 179.999_999).abs() < 1e-9);
    }

    #[test]
    fn latlon_rejects_unencodable_values() {
        assert!(encode_latlon(5000.0).is_err());
        assert!(encode_latlon(f64::NEG_INFINITY).is_err());
        assert!(decode_latlon(7, 0).is_err());
    }

    #[test]
    fn altitude_uses_decimeters() {
        assert_eq!(encode_altitude(-0.3).unwrap(), (1, 3));
        assert_eq!(encode_altitude(1234.56).unwrap(), (0, 12346));
        assert!((decode_altitude(1, 3).unwrap() + 0.3).abs() < 1e-9);
        assert!((decode_altitude(0, 12346).unwrap() - 1234.6).abs() < 1e-9);
    }

    #[test]
    fn altitude_rejects_values_beyond_two_bytes() {
        assert!(encode_altitude(6553.5).is_ok());
        assert!(matches!(
            encode_altitude(7000.0),
            Err(FrameError::ValueOutOfRange {
                field: "altitude",
                ..
            })
        ));
        assert!(encode_altitude(-7000.0).is_err());
    }
}
