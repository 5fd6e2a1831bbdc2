use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Browser window the engine lays the page out in before printing.
///
/// Only affects layout: the printed page size comes from the paper size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const DEFAULT: Viewport = Viewport::new(1280, 1024);

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewportParseError {
    #[error("viewport '{0}' is not of the form WIDTHxHEIGHT, e.g. 1280x1024")]
    Shape(String),
    #[error("viewport {axis} '{value}' is not a positive pixel count")]
    Dimension { axis: &'static str, value: String },
}

fn dimension(axis: &'static str, raw: &str) -> Result<u32, ViewportParseError> {
    match raw.trim().parse::<u32>() {
        Ok(px) if px > 0 => Ok(px),
        _ => Err(ViewportParseError::Dimension {
            axis,
            value: raw.trim().to_string(),
        }),
    }
}

impl FromStr for Viewport {
    type Err = ViewportParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .filter(|(_, rest)| !rest.contains(['x', 'X']))
            .ok_or_else(|| ViewportParseError::Shape(s.to_string()))?;
        Ok(Viewport::new(dimension("width", w)?, dimension("height", h)?))
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
