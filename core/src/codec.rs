//! Numeric codecs for uplink payloads
//!
//! Pure conversions from `f32` measurements to 16-bit wire encodings. Every
//! function is total: out-of-range input saturates to the nearest
//! representable value instead of failing, so the message builder has no
//! error path.
//!
//! Two families live here:
//!
//! - **Scaled fixed-point** (`encode_s16`, `encode_u16`): the value is
//!   pre-multiplied by a power-of-two scale, rounded half-up and saturated.
//!   Format 0x2b uses these through [`encode_voltage`] and
//!   [`encode_temperature`].
//! - **Compact floats** (`uflt16`, `sflt16`): 4-bit exponent plus 12/11-bit
//!   fraction for values in `[0, 1)` / `(-1, 1)`. Other Catena message
//!   formats carry these; format 0x2b does not.
//!
//! All arithmetic is single precision through `libm`, so results are
//! bit-identical on the target and on the host tooling.

/// Fractional bits carried by voltage fields (12)
pub const VOLTAGE_SCALE: f32 = 4096.0;

/// Fractional bits carried by temperature fields (8)
pub const TEMPERATURE_SCALE: f32 = 256.0;

/// Exponent bias shared by both compact float encodings
const FLT16_BIAS: i32 = 15;

/// Largest biased exponent that fits the 4-bit field
const FLT16_MAX_EXP: i32 = 15;

/// Encode a value in `[0, 1)` as an unsigned compact float
///
/// Layout: bits 15..12 biased exponent, bits 11..0 fraction.
///
/// - negative input encodes as `0`
/// - input `>= 1.0` encodes as `0xFFFF`
/// - a fraction that rounds up to `1 << 12` carries into the exponent
pub fn uflt16_from_f32(f: f32) -> u16 {
    if f < 0.0 {
        return 0;
    }
    if f >= 1.0 {
        return 0xFFFF;
    }

    let (mantissa, exp) = libm::frexpf(f);

    // useful exponent range is [0, -15]; anything smaller is pinned at 0
    let mut exp = (exp + FLT16_BIAS).max(0);

    let mut fraction = (libm::ldexpf(mantissa, 12) + 0.5) as u16;
    if fraction >= 1 << 12 {
        fraction = 1 << 11;
        exp += 1;
    }

    if exp > FLT16_MAX_EXP {
        return 0xFFFF;
    }

    ((exp as u16) << 12) | fraction
}

/// Encode a value in `(-1, 1)` as a signed compact float
///
/// Layout: bit 15 sign, bits 14..11 biased exponent, bits 10..0 fraction.
/// This is sign/magnitude, not two's complement.
///
/// - input `<= -1.0` encodes as `0xFFFF`
/// - input `>= 1.0` encodes as `0x7FFF`
/// - exponent overflow after rounding saturates to `0x7FFF`, keeping the sign
pub fn sflt16_from_f32(f: f32) -> u16 {
    if f <= -1.0 {
        return 0xFFFF;
    }
    if f >= 1.0 {
        return 0x7FFF;
    }

    let (mut mantissa, exp) = libm::frexpf(f);

    let mut sign = 0u16;
    if mantissa < 0.0 {
        sign = 0x8000;
        mantissa = -mantissa;
    }

    let mut exp = (exp + FLT16_BIAS).max(0);

    let mut fraction = (libm::ldexpf(mantissa, 11) + 0.5) as u16;
    if fraction >= 1 << 11 {
        fraction = 1 << 10;
        exp += 1;
    }

    if exp > FLT16_MAX_EXP {
        return 0x7FFF | sign;
    }

    sign | ((exp as u16) << 11) | fraction
}

/// Decode an unsigned compact float
pub fn uflt16_to_f32(raw: u16) -> f32 {
    let exp = i32::from(raw >> 12);
    let fraction = f32::from(raw & 0x0FFF);
    libm::ldexpf(fraction, exp - FLT16_BIAS - 12)
}

/// Decode a signed compact float
pub fn sflt16_to_f32(raw: u16) -> f32 {
    let exp = i32::from((raw >> 11) & 0x0F);
    let fraction = f32::from(raw & 0x07FF);
    let magnitude = libm::ldexpf(fraction, exp - FLT16_BIAS - 11);
    if raw & 0x8000 != 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Round half-up and saturate into a signed 16-bit field
///
/// Returns the two's-complement bit pattern. NaN encodes as 0.
pub fn encode_s16(v: f32) -> u16 {
    let rounded = libm::floorf(v + 0.5);

    if rounded > 32767.0 {
        0x7FFF
    } else if rounded < -32768.0 {
        0x8000
    } else {
        rounded as i16 as u16
    }
}

/// Round half-up and saturate into an unsigned 16-bit field
///
/// NaN encodes as 0.
pub fn encode_u16(v: f32) -> u16 {
    let rounded = libm::floorf(v + 0.5);

    if rounded > 65535.0 {
        0xFFFF
    } else if rounded < 0.0 {
        0
    } else {
        rounded as u16
    }
}

/// Encode volts as signed fixed-point with 12 fractional bits
pub fn encode_voltage(volts: f32) -> u16 {
    encode_s16(volts * VOLTAGE_SCALE)
}

/// Encode degrees as signed fixed-point with 8 fractional bits
pub fn encode_temperature(degrees: f32) -> u16 {
    encode_s16(degrees * TEMPERATURE_SCALE)
}

/// Inverse of [`encode_voltage`]
pub fn decode_voltage(raw: u16) -> f32 {
    f32::from(raw as i16) / VOLTAGE_SCALE
}

/// Inverse of [`encode_temperature`]
pub fn decode_temperature(raw: u16) -> f32 {
    f32::from(raw as i16) / TEMPERATURE_SCALE
}
