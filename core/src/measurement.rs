//! Sparse measurement record carried by a format 0x2b uplink
//!
//! Every field is independently optional: `None` means the sensor had
//! nothing valid this cycle and the field is left out of the message.

use core::fmt::{self, Write as _};

use heapless::String;

/// Compost probe reading
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CompostTemp {
    /// Temperature in degrees Celsius
    pub degrees: f32,
}

/// Optional fields of a format 0x2b message, in flag-bit order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Field {
    /// Battery voltage (bit 0)
    Vbat,
    /// Bus voltage (bit 1)
    Vbus,
    /// Boot counter (bit 2)
    Boot,
    /// Compost temperature (bit 3)
    CompostTemp,
}

impl Field {
    /// All fields in increasing flag-bit order
    pub const ALL: [Field; 4] = [Field::Vbat, Field::Vbus, Field::Boot, Field::CompostTemp];

    /// Mask of every flag bit the format defines
    pub const FLAG_MASK: u8 = 0x0F;

    /// Text key used by test-vector input and the record log line
    pub const fn key(self) -> &'static str {
        match self {
            Field::Vbat => "Vbat",
            Field::Vbus => "Vbus",
            Field::Boot => "Boot",
            Field::CompostTemp => "CompostTemp",
        }
    }

    /// Look up a field by its text key (case-sensitive)
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }

    /// Flag bit set in byte 1 when the field is present
    pub const fn flag(self) -> u8 {
        match self {
            Field::Vbat => 1 << 0,
            Field::Vbus => 1 << 1,
            Field::Boot => 1 << 2,
            Field::CompostTemp => 1 << 3,
        }
    }

    /// Encoded width in bytes
    pub const fn width(self) -> usize {
        match self {
            Field::Boot => 1,
            Field::Vbat | Field::Vbus | Field::CompostTemp => 2,
        }
    }
}

/// One sensor record
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// Battery voltage in volts
    pub vbat: Option<f32>,
    /// Bus voltage in volts
    pub vbus: Option<f32>,
    /// Boot counter, low 8 bits
    pub boot: Option<u8>,
    /// Compost probe reading
    pub compost_temp: Option<CompostTemp>,
}

impl Measurement {
    /// Empty record, no valid fields
    pub const fn new() -> Self {
        Self {
            vbat: None,
            vbus: None,
            boot: None,
            compost_temp: None,
        }
    }

    /// True when no field is valid
    pub fn is_empty(&self) -> bool {
        self.flags() == 0
    }

    /// Whether `field` holds a valid value
    pub fn has(&self, field: Field) -> bool {
        match field {
            Field::Vbat => self.vbat.is_some(),
            Field::Vbus => self.vbus.is_some(),
            Field::Boot => self.boot.is_some(),
            Field::CompostTemp => self.compost_temp.is_some(),
        }
    }

    /// Flags byte this record encodes to
    pub fn flags(&self) -> u8 {
        Field::ALL
            .into_iter()
            .filter(|&field| self.has(field))
            .fold(0, |flags, field| flags | field.flag())
    }

    /// Reset every field to invalid
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

/// Renders the record as cut-and-pasteable test-vector input:
/// `Vbat 3.3 Boot 7 .`, or just `.` when empty.
impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(v) = self.vbat {
            write!(f, "{} {} ", Field::Vbat.key(), Significant(v))?;
        }
        if let Some(v) = self.vbus {
            write!(f, "{} {} ", Field::Vbus.key(), Significant(v))?;
        }
        if let Some(v) = self.boot {
            write!(f, "{} {} ", Field::Boot.key(), v)?;
        }
        if let Some(t) = self.compost_temp {
            write!(f, "{} {} ", Field::CompostTemp.key(), Significant(t.degrees))?;
        }
        f.write_str(".")
    }
}

const SIGNIFICANT_DIGITS: i32 = 6;

/// A reading printed the way C's `%g` prints it: six significant digits,
/// no trailing zeros, exponent form below 1e-4 or from 1e6 up
struct Significant(f32);

impl fmt::Display for Significant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        if v.is_nan() {
            return f.write_str("nan");
        }
        if v.is_infinite() {
            return f.write_str(if v < 0.0 { "-inf" } else { "inf" });
        }

        // the decimal exponent after rounding picks the notation
        let mut sci: String<32> = String::new();
        write!(sci, "{:.*e}", (SIGNIFICANT_DIGITS - 1) as usize, v)?;
        let (mantissa, exp) = sci.split_once('e').ok_or(fmt::Error)?;
        let exp: i32 = exp.parse().map_err(|_| fmt::Error)?;

        if (-4..SIGNIFICANT_DIGITS).contains(&exp) {
            let mut fixed: String<32> = String::new();
            write!(fixed, "{:.*}", (SIGNIFICANT_DIGITS - 1 - exp) as usize, v)?;
            f.write_str(trim_fraction(&fixed))
        } else {
            let sign = if exp < 0 { '-' } else { '+' };
            write!(f, "{}e{}{:02}", trim_fraction(mantissa), sign, exp.unsigned_abs())
        }
    }
}

fn trim_fraction(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}
