//! Hardware abstraction traits for the compost monitor sensor node
//!
//! This crate defines the boundary between the uplink codec and the
//! board support code. BSPs implement these traits for their ADC, one-wire
//! bus, flash-backed counters and LoRaWAN radio; nothing here touches
//! hardware directly.
//!
//! Errors reuse `embedded_io::ErrorType` so a BSP can share one error type
//! between its sensor drivers and its transport.

#![no_std]
#![deny(unsafe_code)]
#![deny(warnings)]

pub use embedded_io::{Error, ErrorKind, ErrorType};

/// A sensor producing one scalar per sample
///
/// Used for the battery and bus voltage dividers (volts) and for the
/// compost temperature probe (degrees Celsius).
pub trait ScalarSensor: ErrorType {
    /// Take one sample
    ///
    /// Returns `Ok(None)` when the sensor is not fitted or has nothing to
    /// report this cycle (e.g. no USB power on the bus rail).
    fn sample(&mut self) -> Result<Option<f32>, Self::Error>;
}

/// Persistent boot/reset counter, normally kept in flash
pub trait BootCounter {
    /// Current boot count, or `None` if the backing store is unavailable
    fn boot_count(&self) -> Option<u32>;
}

/// Radio uplink that accepts an application payload on a port
pub trait Uplink: ErrorType {
    /// Queue `payload` for transmission on `port`
    fn send(&mut self, port: u8, payload: &[u8]) -> Result<(), Self::Error>;
}

/// Sensor fault reported by BSP drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Device did not answer on its bus
    NotResponding,
    /// Bus transfer completed but the checksum did not match
    CrcMismatch,
    /// Conversion finished with a reading outside the device's range
    OutOfRange,
}

impl core::fmt::Display for SensorError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotResponding => write!(f, "Sensor not responding"),
            Self::CrcMismatch => write!(f, "Sensor CRC mismatch"),
            Self::OutOfRange => write!(f, "Sensor reading out of range"),
        }
    }
}

impl core::error::Error for SensorError {}

impl embedded_io::Error for SensorError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotResponding => ErrorKind::TimedOut,
            Self::CrcMismatch | Self::OutOfRange => ErrorKind::InvalidData,
        }
    }
}
