use serde::{Deserialize, Serialize};

/// One of the two teams on the field. Every robot and every goal belongs to a side.
///
/// A side scores by putting balls into the goal of the opposite side.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Yellow,
    Blue,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Yellow, Side::Blue];

    /// Returns the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Yellow => Side::Blue,
            Side::Blue => Side::Yellow,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Yellow => write!(f, "YELLOW"),
            Side::Blue => write!(f, "BLUE"),
        }
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yellow" => Ok(Side::Yellow),
            "blue" => Ok(Side::Blue),
            other => Err(format!("unknown side: {other}")),
        }
    }
}
