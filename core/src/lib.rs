//! Platform-agnostic core logic for the compost temperature monitor
//!
//! This crate turns sensor readings into the dense uplink payload sent
//! over LoRaWAN. It has NO hardware dependencies: boards reach it through
//! the traits in `hal-abstractions`.
//!
//! - [`codec`]: fixed-point and compact-float quantizers
//! - [`measurement`]: the sparse sensor record
//! - [`message`]: format 0x2b builder and decoder
//! - [`telemetry`]: one sample/encode/uplink cycle

#![no_std]
#![deny(unsafe_code)]
#![deny(warnings)]

#[macro_use]
mod fmt;

pub mod codec;
pub mod measurement;
pub mod message;
pub mod telemetry;

pub use measurement::{CompostTemp, Field, Measurement};
pub use message::{decode, encode, DecodeError, Message, FORMAT_TAG, PORT};
pub use telemetry::{Telemetry, TelemetryConfig};
