use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Named colours used by the experiment, with their X11 RGB values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamedColor {
    White,
    Black,
    Gray,
    DarkBlue,
    Purple,
    Tan,
    Red,
}

#[derive(Debug, Error, PartialEq)]
#[error("unknown colour name: {0}")]
pub struct UnknownColor(pub String);

impl NamedColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
            Self::Gray => "gray",
            Self::DarkBlue => "darkblue",
            Self::Purple => "purple",
            Self::Tan => "tan",
            Self::Red => "red",
        }
    }

    pub fn rgba(&self) -> [u8; 4] {
        match self {
            Self::White => [255, 255, 255, 255],
            Self::Black => [0, 0, 0, 255],
            Self::Gray => [128, 128, 128, 255],
            Self::DarkBlue => [0, 0, 139, 255],
            Self::Purple => [128, 0, 128, 255],
            Self::Tan => [210, 180, 140, 255],
            Self::Red => [255, 0, 0, 255],
        }
    }
}

impl fmt::Display for NamedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NamedColor {
    type Err = UnknownColor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "white" => Self::White,
            "black" => Self::Black,
            "gray" | "grey" => Self::Gray,
            "darkblue" => Self::DarkBlue,
            "purple" => Self::Purple,
            "tan" => Self::Tan,
            "red" => Self::Red,
            _ => return Err(UnknownColor(s.to_string())),
        })
    }
}
