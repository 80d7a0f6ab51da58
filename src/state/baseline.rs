//! First-run behavior for an identifier that has no seen-set entry yet
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Decides how results from a baseline run are classified
///
/// A baseline run is the first run that returns results for an identifier
/// with no existing ledger entry. The policy is applied in exactly one
/// place, the diff engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaselinePolicy {
    /// Every first-run result is new and gets alerted
    #[default]
    Alert,

    /// First-run results are recorded silently; alerts start on the next run
    Seed,
}

impl BaselinePolicy {
    /// Returns true if baseline results should be reported
    pub fn alerts_on_baseline(&self) -> bool {
        matches!(self, Self::Alert)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alert => "alert",
            Self::Seed => "seed",
        }
    }
}

impl fmt::Display for BaselinePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BaselinePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alert" => Ok(Self::Alert),
            "seed" => Ok(Self::Seed),
            other => Err(format!("expected 'alert' or 'seed', got '{}'", other)),
        }
    }
}
