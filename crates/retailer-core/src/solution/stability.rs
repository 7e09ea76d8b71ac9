use serde::{Deserialize, Serialize};
use std::fmt;

/// Package stability levels, least stable first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stability {
    /// Development version
    Dev,
    /// Alpha release
    Alpha,
    /// Beta release
    Beta,
    /// Release candidate
    #[serde(rename = "RC", alias = "rc")]
    RC,
    /// Stable release
    Stable,
}

impl Stability {
    /// The loosest stability, used when simulating installs.
    pub const LOOSEST: Stability = Stability::Dev;

    /// Parse a stability flag; unknown or empty values fall back to stable.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "dev" => Stability::Dev,
            "alpha" => Stability::Alpha,
            "beta" => Stability::Beta,
            "rc" => Stability::RC,
            _ => Stability::Stable,
        }
    }

    pub fn is_stable(&self) -> bool {
        *self == Stability::Stable
    }
}

impl Default for Stability {
    fn default() -> Self {
        Stability::Stable
    }
}

impl std::str::FromStr for Stability {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Stability::parse(s))
    }
}

impl fmt::Display for Stability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stability::Dev => write!(f, "dev"),
            Stability::Alpha => write!(f, "alpha"),
            Stability::Beta => write!(f, "beta"),
            Stability::RC => write!(f, "RC"),
            Stability::Stable => write!(f, "stable"),
        }
    }
}
