use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::units::{Length, LengthParseError, SizeUnit};

/// Physical paper dimensions, portrait.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaperSize {
    pub width: Length,
    pub height: Length,
}

impl PaperSize {
    pub const LETTER: PaperSize = PaperSize::new(Length::inches(8.5), Length::inches(11.0));
    pub const LEGAL: PaperSize = PaperSize::new(Length::inches(8.5), Length::inches(14.0));
    pub const TABLOID: PaperSize = PaperSize::new(Length::inches(11.0), Length::inches(17.0));
    pub const A3: PaperSize = PaperSize::new(Length::millimeters(297.0), Length::millimeters(420.0));
    pub const A4: PaperSize = PaperSize::new(Length::millimeters(210.0), Length::millimeters(297.0));
    pub const A5: PaperSize = PaperSize::new(Length::millimeters(148.0), Length::millimeters(210.0));

    pub const fn new(width: Length, height: Length) -> Self {
        Self { width, height }
    }

    /// Dimensions as laid out for the given orientation.
    pub fn oriented(self, orientation: Orientation) -> (Length, Length) {
        match orientation {
            Orientation::Portrait => (self.width, self.height),
            Orientation::Landscape => (self.height, self.width),
        }
    }
}

#[derive(Debug, Error)]
pub enum PaperSizeParseError {
    #[error("Unknown paper size '{0}': use letter, legal, tabloid, a3, a4, a5 or WIDTH,HEIGHT (e.g., 210mm,297mm)")]
    Unknown(String),
    #[error("Invalid paper dimension: {0}")]
    Dimension(#[from] LengthParseError),
}

impl FromStr for PaperSize {
    type Err = PaperSizeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "letter" => return Ok(PaperSize::LETTER),
            "legal" => return Ok(PaperSize::LEGAL),
            "tabloid" => return Ok(PaperSize::TABLOID),
            "a3" => return Ok(PaperSize::A3),
            "a4" => return Ok(PaperSize::A4),
            "a5" => return Ok(PaperSize::A5),
            _ => {}
        }

        let (width, height) = trimmed
            .split_once(',')
            .ok_or_else(|| PaperSizeParseError::Unknown(trimmed.to_string()))?;
        Ok(PaperSize::new(width.parse()?, height.parse()?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }
}

/// Page margins around the printable area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: Length,
    pub right: Length,
    pub bottom: Length,
    pub left: Length,
}

impl Margins {
    pub const NONE: Margins = Margins::uniform(Length::zero());

    pub const fn uniform(length: Length) -> Self {
        Self {
            top: length,
            right: length,
            bottom: length,
            left: length,
        }
    }

    pub fn vertical_points(&self) -> f64 {
        self.top.to_points() + self.bottom.to_points()
    }

    pub fn horizontal_points(&self) -> f64 {
        self.left.to_points() + self.right.to_points()
    }

    pub fn iter(&self) -> impl Iterator<Item = Length> {
        [self.top, self.right, self.bottom, self.left].into_iter()
    }
}

impl FromStr for Margins {
    type Err = LengthParseError;

    /// Accepts one length for every side or four in `top,right,bottom,left` order.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').collect();
        match parts.as_slice() {
            [all] => Ok(Margins::uniform(all.parse()?)),
            [top, right, bottom, left] => Ok(Margins {
                top: top.parse()?,
                right: right.parse()?,
                bottom: bottom.parse()?,
                left: left.parse()?,
            }),
            _ => Err(LengthParseError::InvalidFormat(s.trim().to_string())),
        }
    }
}

impl Default for Margins {
    fn default() -> Self {
        Margins::uniform(Length::new(0.5, SizeUnit::Inches))
    }
}
