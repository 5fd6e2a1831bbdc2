use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Points (1/72 inch) per inch; the engine lays out paper in points.
const POINTS_PER_INCH: f64 = 72.0;

/// Length units understood by the engine's paper settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeUnit {
    #[serde(rename = "mm")]
    Millimeters,
    #[serde(rename = "cm")]
    Centimeters,
    #[serde(rename = "in")]
    Inches,
    #[serde(rename = "px")]
    Pixels,
}

impl SizeUnit {
    pub const ALL: [SizeUnit; 4] = [
        SizeUnit::Millimeters,
        SizeUnit::Centimeters,
        SizeUnit::Inches,
        SizeUnit::Pixels,
    ];

    /// Suffix the engine expects after a numeric value.
    pub const fn suffix(self) -> &'static str {
        match self {
            SizeUnit::Millimeters => "mm",
            SizeUnit::Centimeters => "cm",
            SizeUnit::Inches => "in",
            SizeUnit::Pixels => "px",
        }
    }

    /// Conversion factor from this unit to engine points.
    pub fn points_per_unit(self) -> f64 {
        match self {
            SizeUnit::Millimeters => POINTS_PER_INCH / 25.4,
            SizeUnit::Centimeters => POINTS_PER_INCH / 2.54,
            SizeUnit::Inches => POINTS_PER_INCH,
            SizeUnit::Pixels => 1.0,
        }
    }
}

impl std::fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for SizeUnit {
    type Err = LengthParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        SizeUnit::ALL
            .into_iter()
            .find(|unit| unit.suffix() == lower)
            .ok_or_else(|| LengthParseError::UnknownUnit(s.trim().to_string()))
    }
}

/// A numeric length paired with its unit, e.g. `0.5in` or `210mm`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Length {
    pub value: f64,
    pub unit: SizeUnit,
}

impl Length {
    pub const fn new(value: f64, unit: SizeUnit) -> Self {
        Self { value, unit }
    }

    pub const fn inches(value: f64) -> Self {
        Self::new(value, SizeUnit::Inches)
    }

    pub const fn millimeters(value: f64) -> Self {
        Self::new(value, SizeUnit::Millimeters)
    }

    pub const fn zero() -> Self {
        Self::new(0.0, SizeUnit::Pixels)
    }

    pub fn to_points(self) -> f64 {
        self.value * self.unit.points_per_unit()
    }

    pub fn is_valid(self) -> bool {
        self.value.is_finite() && self.value >= 0.0
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum LengthParseError {
    #[error("Invalid length '{0}': expected a number followed by mm, cm, in or px (e.g., 0.5in)")]
    InvalidFormat(String),
    #[error("Unknown unit '{0}': expected one of mm, cm, in, px")]
    UnknownUnit(String),
    #[error("Length must not be negative: {0}")]
    Negative(String),
}

impl FromStr for Length {
    type Err = LengthParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let split = trimmed
            .find(|c: char| c.is_ascii_alphabetic())
            .ok_or_else(|| LengthParseError::InvalidFormat(trimmed.to_string()))?;
        let (number, unit) = trimmed.split_at(split);

        let value: f64 = number
            .trim()
            .parse()
            .map_err(|_| LengthParseError::InvalidFormat(trimmed.to_string()))?;
        if !value.is_finite() {
            return Err(LengthParseError::InvalidFormat(trimmed.to_string()));
        }
        if value < 0.0 {
            return Err(LengthParseError::Negative(trimmed.to_string()));
        }

        Ok(Length::new(value, unit.parse()?))
    }
}

impl TryFrom<String> for Length {
    type Error = LengthParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Length> for String {
    fn from(length: Length) -> Self {
        length.to_string()
    }
}

impl std::fmt::Display for Length {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.value, self.unit)
    }
}
