//! Search window computation.
//!
//! An orbit file is only usable for an acquisition if it also covers the
//! ascending node crossing (ANX) that precedes the acquisition. The window is
//! therefore widened by one orbital period plus a margin at the start, and by
//! the margin alone at the end.

use serde::{Deserialize, Serialize};

use super::{ParseError, Timestamp};

/// Nominal orbital period: a 12-day repeat cycle split into 175 orbits.
pub const ORBITAL_PERIOD_SECS: i64 = (12 * 86_400 + 175 / 2) / 175;

/// Margin added on both sides of the acquisition.
pub const ANX_MARGIN_SECS: i64 = 60;

/// How the acquisition window is turned into a search window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowMode {
    /// Include the preceding ANX plus a margin on both ends.
    #[default]
    AnxMargin,
    /// Use the acquisition start/end as-is.
    Raw,
}

/// Inclusive search window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl WindowMode {
    pub fn apply(&self, start: Timestamp, end: Timestamp) -> Result<SearchWindow, ParseError> {
        match self {
            Self::AnxMargin => Ok(SearchWindow {
                start: start.shifted(-(ORBITAL_PERIOD_SECS + ANX_MARGIN_SECS))?,
                end: end.shifted(ANX_MARGIN_SECS)?,
            }),
            Self::Raw => Ok(SearchWindow { start, end }),
        }
    }
}

/// Widen a raw acquisition window given as `YYYYMMDDTHHMMSS` strings.
pub fn adjust_window(start: &str, end: &str) -> Result<(String, String), ParseError> {
    let window = WindowMode::AnxMargin.apply(Timestamp::parse(start)?, Timestamp::parse(end)?)?;
    Ok((window.start.to_string(), window.end.to_string()))
}
