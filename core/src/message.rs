//! Format 0x2b uplink message (port 1)
//!
//! Wire layout:
//!
//! | byte | content                                          |
//! |------|--------------------------------------------------|
//! | 0    | format tag, always `0x2b`                        |
//! | 1    | flags, bit *i* set iff field *i* is present      |
//! | 2..  | present fields in bit order, big-endian, no pads |
//!
//! | bit | field       | encoding                          | bytes |
//! |-----|-------------|-----------------------------------|-------|
//! | 0   | Vbat        | signed 4.12 fixed-point volts     | 2     |
//! | 1   | Vbus        | signed 4.12 fixed-point volts     | 2     |
//! | 2   | Boot        | raw counter, low 8 bits           | 1     |
//! | 3   | CompostTemp | signed 8.8 fixed-point degrees C  | 2     |
//!
//! The flags byte is reserved up front and patched once every field has
//! been visited, so the bit set always agrees with the bytes that follow.

use core::fmt;

use heapless::Vec;

use crate::codec::{decode_temperature, decode_voltage, encode_temperature, encode_voltage};
use crate::measurement::{CompostTemp, Field, Measurement};

/// Format tag written to byte 0
pub const FORMAT_TAG: u8 = 0x2b;

/// LoRaWAN application port the format is sent on
pub const PORT: u8 = 1;

/// Tag + flags + every optional field
pub const MAX_MESSAGE_LEN: usize = 2 + 2 + 2 + 1 + 2;

/// Encoded format 0x2b message
pub type Message = Vec<u8, MAX_MESSAGE_LEN>;

/// Builder ran out of room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CapacityError;

impl fmt::Display for CapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Message buffer full")
    }
}

impl core::error::Error for CapacityError {}

/// Position of a reserved byte, redeemed with [`MessageBuilder::patch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot(usize);

/// Ordered byte sequence that can reserve a byte and fill it in later
#[derive(Debug, Default)]
pub struct MessageBuilder<const N: usize> {
    buf: Vec<u8, N>,
}

impl<const N: usize> MessageBuilder<N> {
    /// Empty builder
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Drop every byte written so far
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Bytes written so far, reserved slots included
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True before the first byte is written
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The message as built so far
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append one byte
    pub fn push(&mut self, byte: u8) -> Result<(), CapacityError> {
        self.buf.push(byte).map_err(|_| CapacityError)
    }

    /// Append a 16-bit value, most significant byte first
    ///
    /// Either both bytes are written or neither is.
    pub fn push_be16(&mut self, value: u16) -> Result<(), CapacityError> {
        self.buf
            .extend_from_slice(&value.to_be_bytes())
            .map_err(|_| CapacityError)
    }

    /// Append a placeholder zero byte and return its position
    pub fn reserve(&mut self) -> Result<Slot, CapacityError> {
        let slot = Slot(self.buf.len());
        self.push(0)?;
        Ok(slot)
    }

    /// Overwrite a previously reserved byte
    pub fn patch(&mut self, slot: Slot, byte: u8) {
        debug_assert!(slot.0 < self.buf.len(), "slot from another builder");
        if let Some(b) = self.buf.get_mut(slot.0) {
            *b = byte;
        }
    }

    /// Hand over the finished message
    pub fn finish(self) -> Vec<u8, N> {
        self.buf
    }
}

/// Encode `m` into `builder`, replacing whatever it held
///
/// Fails only if `N` is smaller than the message; use [`encode`] for a
/// buffer that always fits.
pub fn encode_into<const N: usize>(
    m: &Measurement,
    builder: &mut MessageBuilder<N>,
) -> Result<(), CapacityError> {
    builder.clear();
    builder.push(FORMAT_TAG)?;
    let flags_slot = builder.reserve()?;

    let mut flags = 0u8;

    if let Some(v) = m.vbat {
        flags |= Field::Vbat.flag();
        builder.push_be16(encode_voltage(v))?;
    }

    if let Some(v) = m.vbus {
        flags |= Field::Vbus.flag();
        builder.push_be16(encode_voltage(v))?;
    }

    if let Some(boot) = m.boot {
        flags |= Field::Boot.flag();
        builder.push(boot)?;
    }

    if let Some(t) = m.compost_temp {
        flags |= Field::CompostTemp.flag();
        builder.push_be16(encode_temperature(t.degrees))?;
    }

    builder.patch(flags_slot, flags);
    Ok(())
}

/// Encode `m` as a format 0x2b message
pub fn encode(m: &Measurement) -> Message {
    let mut builder = MessageBuilder::<MAX_MESSAGE_LEN>::new();
    // MAX_MESSAGE_LEN is the size with every field present
    encode_into(m, &mut builder).expect("message capacity covers every field");
    builder.finish()
}

/// Encoded length of `m`
pub fn encoded_len(m: &Measurement) -> usize {
    2 + Field::ALL
        .into_iter()
        .filter(|&field| m.has(field))
        .map(Field::width)
        .sum::<usize>()
}

/// Message decoding errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// No bytes at all
    Empty,
    /// Byte 0 is not the format 0x2b tag
    UnknownFormat(u8),
    /// Tag present but no flags byte
    MissingFlags,
    /// Flags byte sets bits the format does not define
    ReservedFlags(u8),
    /// Flags promise a field the buffer is too short to hold
    Truncated(Field),
    /// Bytes left over after the last flagged field
    TrailingBytes(usize),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Empty message"),
            Self::UnknownFormat(tag) => write!(f, "Unknown message format {:#04x}", tag),
            Self::MissingFlags => write!(f, "Missing flags byte"),
            Self::ReservedFlags(flags) => write!(f, "Reserved flag bits set in {:#04x}", flags),
            Self::Truncated(field) => write!(f, "Message truncated in {}", field.key()),
            Self::TrailingBytes(n) => write!(f, "{} trailing bytes after last field", n),
        }
    }
}

impl core::error::Error for DecodeError {}

/// Decode a format 0x2b message back into a record
///
/// Values come back quantized: `3.3` V decodes as `13517 / 4096`.
pub fn decode(bytes: &[u8]) -> Result<Measurement, DecodeError> {
    let (&tag, rest) = bytes.split_first().ok_or(DecodeError::Empty)?;
    if tag != FORMAT_TAG {
        return Err(DecodeError::UnknownFormat(tag));
    }

    let (&flags, mut body) = rest.split_first().ok_or(DecodeError::MissingFlags)?;
    if flags & !Field::FLAG_MASK != 0 {
        return Err(DecodeError::ReservedFlags(flags));
    }

    let mut m = Measurement::new();
    for field in Field::ALL {
        if flags & field.flag() == 0 {
            continue;
        }
        if body.len() < field.width() {
            return Err(DecodeError::Truncated(field));
        }
        let (raw, rest) = body.split_at(field.width());
        body = rest;

        match field {
            Field::Vbat => m.vbat = Some(decode_voltage(be16(raw))),
            Field::Vbus => m.vbus = Some(decode_voltage(be16(raw))),
            Field::Boot => m.boot = Some(raw[0]),
            Field::CompostTemp => {
                m.compost_temp = Some(CompostTemp {
                    degrees: decode_temperature(be16(raw)),
                })
            }
        }
    }

    if !body.is_empty() {
        return Err(DecodeError::TrailingBytes(body.len()));
    }
    Ok(m)
}

fn be16(raw: &[u8]) -> u16 {
    u16::from_be_bytes([raw[0], raw[1]])
}
