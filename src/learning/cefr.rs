use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::RuleError;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(try_from = "String")]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    pub const ALL: [CefrLevel; 6] = [
        CefrLevel::A1,
        CefrLevel::A2,
        CefrLevel::B1,
        CefrLevel::B2,
        CefrLevel::C1,
        CefrLevel::C2,
    ];

    /// Placement band for a test percentage. Input is clamped to `0..=100`.
    pub fn from_percentage(percentage: f64) -> Self {
        let p = if percentage.is_nan() {
            0.0
        } else {
            percentage.clamp(0.0, 100.0)
        };

        match p {
            p if p < 20.0 => Self::A1,
            p if p < 40.0 => Self::A2,
            p if p < 60.0 => Self::B1,
            p if p < 75.0 => Self::B2,
            p if p < 90.0 => Self::C1,
            _ => Self::C2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::C1 => "C1",
            Self::C2 => "C2",
        }
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CefrLevel {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A1" => Ok(Self::A1),
            "A2" => Ok(Self::A2),
            "B1" => Ok(Self::B1),
            "B2" => Ok(Self::B2),
            "C1" => Ok(Self::C1),
            "C2" => Ok(Self::C2),
            _ => Err(RuleError::UnknownLevel(s.to_string())),
        }
    }
}

impl TryFrom<String> for CefrLevel {
    type Error = RuleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
