//! Logging shims
//!
//! Forward to `defmt` when the `defmt` feature is on; otherwise evaluate
//! the arguments by reference and discard them so callers stay warning-free.
#![allow(unused_macros)]

#[cfg(feature = "defmt")]
macro_rules! debug {
    ($($arg:tt)+) => {
        defmt::debug!($($arg)+)
    };
}

#[cfg(not(feature = "defmt"))]
macro_rules! debug {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        $( let _ = &$arg; )*
    }};
}

#[cfg(feature = "defmt")]
macro_rules! warn {
    ($($arg:tt)+) => {
        defmt::warn!($($arg)+)
    };
}

#[cfg(not(feature = "defmt"))]
macro_rules! warn {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {{
        $( let _ = &$arg; )*
    }};
}

#[cfg(feature = "defmt")]
pub(crate) use defmt::Debug2Format;

/// Mirrors `defmt::Debug2Format` so call sites compile with `defmt` off
#[cfg(not(feature = "defmt"))]
#[allow(dead_code)]
pub(crate) struct Debug2Format<'a, T: ?Sized>(pub &'a T);
