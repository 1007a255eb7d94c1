//! Driver configuration

use std::path::PathBuf;

/// Direction the driver runs in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// `key value ... .` records in, record line + hex vector out
    #[default]
    Encode,
    /// Hex vectors in, record lines out
    Decode,
}

/// Test-vector driver configuration
#[derive(Debug, Clone, Default)]
pub struct DriverConfig {
    pub mode: Mode,
    /// Read from this file instead of stdin
    pub input: Option<PathBuf>,
    /// Print the input prompt to stderr before reading
    pub banner: bool,
}
