//! The fixed enumeration of subject tracks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::ValidationError;

/// A named subject track a user may be associated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Track {
    #[serde(rename = "Pennsic University")]
    PennsicUniversity,
    #[serde(rename = "Middle Eastern")]
    MiddleEastern,
    #[serde(rename = "European Dance")]
    EuropeanDance,
    #[serde(rename = "Performing Arts and Music")]
    PerformingArts,
    #[serde(rename = "Heraldry")]
    Heraldry,
    #[serde(rename = "Glass Arts")]
    GlassArts,
    #[serde(rename = "Youth Point")]
    YouthPoint,
    #[serde(rename = "Games")]
    Games,
}

impl Track {
    pub const ALL: [Track; 8] = [
        Track::PennsicUniversity,
        Track::MiddleEastern,
        Track::EuropeanDance,
        Track::PerformingArts,
        Track::Heraldry,
        Track::GlassArts,
        Track::YouthPoint,
        Track::Games,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Track::PennsicUniversity => "Pennsic University",
            Track::MiddleEastern => "Middle Eastern",
            Track::EuropeanDance => "European Dance",
            Track::PerformingArts => "Performing Arts and Music",
            Track::Heraldry => "Heraldry",
            Track::GlassArts => "Glass Arts",
            Track::YouthPoint => "Youth Point",
            Track::Games => "Games",
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Track {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Track::ALL
            .into_iter()
            .find(|track| track.name() == s)
            .ok_or_else(|| ValidationError::single("tracks", format!("unknown track '{s}'")))
    }
}
