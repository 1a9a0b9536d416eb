//! Granule and orbit-file model.
//!
//! Names follow the Sentinel-1 conventions: granule identifiers carry the
//! platform and acquisition window at fixed offsets, orbit file names carry
//! their validity interval at fixed offsets.

mod types;
pub mod window;

pub use types::*;
pub use window::{adjust_window, SearchWindow, WindowMode, ANX_MARGIN_SECS, ORBITAL_PERIOD_SECS};

use thiserror::Error;

/// Errors raised while parsing names and timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Timestamp is not in `YYYYMMDDTHHMMSS` form.
    #[error("Invalid timestamp '{value}': {reason}")]
    Timestamp { value: String, reason: String },

    /// Granule name too short or not ASCII at the expected offsets.
    #[error("Invalid granule name: {0}")]
    Granule(String),

    /// Orbit file name does not carry a validity interval.
    #[error("Invalid orbit file name: {0}")]
    OrbitFile(String),

    /// Unknown orbit product type.
    #[error("Unknown orbit type: {0}")]
    UnknownOrbitType(String),

    /// Window arithmetic left the representable range.
    #[error("Timestamp out of range: {0}")]
    OutOfRange(String),
}
