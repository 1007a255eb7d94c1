//! Driver error types

use compost_core::DecodeError;
use thiserror::Error;

/// Fatal test-vector driver errors
///
/// Unknown keys are not errors: they are reported and skipped.
#[derive(Debug, Error)]
pub enum DriverError {
    /// A value token did not parse as the field's number type
    #[error("parse error: {token}")]
    Parse { token: String },

    /// A line that starts like a hex vector holds a non-hex token
    #[error("line {line}: invalid hex byte '{token}'")]
    Hex { line: usize, token: String },

    /// A hex vector is not a valid format 0x2b message
    #[error("line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: DecodeError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DriverError {
    pub fn parse(token: impl Into<String>) -> Self {
        Self::Parse {
            token: token.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DriverError>;
