//! Test-vector tooling for the format 0x2b uplink codec
//!
//! Reads hand-written `key value ... .` records, encodes them with
//! `compost-core`, and prints each record next to its hex bytes. The
//! output doubles as input: record lines are valid encoder input and the
//! hex lines feed the decoder.

pub mod config;
pub mod driver;
pub mod error;
pub mod render;
pub mod tokens;

pub use config::{DriverConfig, Mode};
pub use driver::{Decoder, Encoder, Summary, BANNER};
pub use error::{DriverError, Result};
