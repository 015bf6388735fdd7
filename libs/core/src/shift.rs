//! Shift codes and their fixed presentation attributes.

use serde::{Deserialize, Serialize};

/// One of the five shift codes a cell can hold.
///
/// Serialized as the single-letter code stored in schedule documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum ShiftCode {
    /// Early shift, 05:00 to 08:00.
    #[serde(rename = "M")]
    Morning,
    /// Day shift, 08:00 to 17:00.
    #[serde(rename = "C")]
    Day,
    /// Evening shift, 17:00 to 20:00.
    #[serde(rename = "T")]
    Evening,
    /// Night shift, 20:00 to 05:00.
    #[serde(rename = "N")]
    Night,
    /// Not working.
    #[default]
    #[serde(rename = "L")]
    Off,
}

impl ShiftCode {
    /// All codes in cycle order, starting at Day.
    pub const CYCLE: [ShiftCode; 5] = [
        ShiftCode::Day,
        ShiftCode::Evening,
        ShiftCode::Night,
        ShiftCode::Morning,
        ShiftCode::Off,
    ];

    /// The stored single-letter code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Morning => "M",
            Self::Day => "C",
            Self::Evening => "T",
            Self::Night => "N",
            Self::Off => "L",
        }
    }

    /// Parses a stored code. Returns `None` for anything outside the five codes.
    pub fn from_code(s: &str) -> Option<Self> {
        match s {
            "M" => Some(Self::Morning),
            "C" => Some(Self::Day),
            "T" => Some(Self::Evening),
            "N" => Some(Self::Night),
            "L" => Some(Self::Off),
            _ => None,
        }
    }

    /// Reads a stored JSON value, treating anything unrecognised as Off.
    pub fn from_stored(value: &serde_json::Value) -> Self {
        value
            .as_str()
            .and_then(Self::from_code)
            .unwrap_or(Self::Off)
    }

    /// Background color used when rendering the cell.
    pub fn color(&self) -> &'static str {
        match self {
            Self::Day => "#b3e5fc",
            Self::Evening => "#ffcc80",
            Self::Night => "#b39ddb",
            Self::Morning => "#aed581",
            Self::Off => "#eeeeee",
        }
    }

    /// Color as an RGB triple.
    pub fn rgb(&self) -> (u8, u8, u8) {
        let hex = &self.color()[1..];
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0xff);
        (channel(0), channel(2), channel(4))
    }

    /// Working hours covered by the shift, if any.
    pub fn hours(&self) -> Option<&'static str> {
        match self {
            Self::Morning => Some("05-08"),
            Self::Day => Some("08-17"),
            Self::Evening => Some("17-20"),
            Self::Night => Some("20-05"),
            Self::Off => None,
        }
    }

    /// The code that follows this one in the manual-edit cycle.
    pub fn next(self) -> Self {
        match self {
            Self::Day => Self::Evening,
            Self::Evening => Self::Night,
            Self::Night => Self::Morning,
            Self::Morning => Self::Off,
            Self::Off => Self::Day,
        }
    }

    pub fn is_working(&self) -> bool {
        !matches!(self, Self::Off)
    }
}

impl std::fmt::Display for ShiftCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for ShiftCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s.trim()).ok_or_else(|| format!("unknown shift code: {s:?}"))
    }
}
