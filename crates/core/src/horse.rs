//! Horses as they appear in a catalog: the subject's profile, the ancestors
//! filling its pedigree, and the progeny listed under each dam.

use crate::race::{LifetimeMark, RaceList, RaceSummary};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream identifier of a horse.
pub type HorseId = u64;

/// Name/id pair used for sire and dam references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorseRef {
    #[serde(default)]
    pub id: Option<HorseId>,
    pub name: String,
}

impl HorseRef {
    pub fn new(id: HorseId, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
        }
    }

    pub fn unknown() -> Self {
        Self {
            id: None,
            name: Ancestor::UNKNOWN_NAME.into(),
        }
    }
}

/// Sex and age class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Colt,
    Filly,
    Stallion,
    Mare,
    Gelding,
}

impl Gender {
    pub fn is_female(self) -> bool {
        matches!(self, Self::Filly | Self::Mare)
    }

    pub fn is_male(self) -> bool {
        !self.is_female()
    }

    /// Single-letter catalog abbreviation.
    pub fn abbreviation(self) -> &'static str {
        match self {
            Self::Colt => "c",
            Self::Filly => "f",
            Self::Stallion => "h",
            Self::Mare => "m",
            Self::Gelding => "g",
        }
    }

    /// Juvenile noun used in "her first colt/filly".
    pub fn foal_word(self) -> &'static str {
        if self.is_female() { "filly" } else { "colt" }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            Self::Colt => "colt",
            Self::Filly => "filly",
            Self::Stallion => "stallion",
            Self::Mare => "mare",
            Self::Gelding => "gelding",
        };
        write!(f, "{word}")
    }
}

/// A lifetime or stakes record line from a profile document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordLine {
    pub label: String,
    #[serde(flatten)]
    pub summary: RaceSummary,
    #[serde(default)]
    pub mark: Option<LifetimeMark>,
}

/// A horse's profile document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorseProfile {
    pub id: HorseId,
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub foaled: Option<NaiveDate>,
    #[serde(default)]
    pub sire: Option<HorseRef>,
    #[serde(default)]
    pub dam: Option<HorseRef>,
    #[serde(default)]
    pub records: Vec<RecordLine>,
}

impl HorseProfile {
    /// Lifetime mark from the profile's `Lifetime` record line.
    pub fn lifetime_mark(&self) -> Option<LifetimeMark> {
        self.records
            .iter()
            .find(|r| r.label.eq_ignore_ascii_case("lifetime"))
            .and_then(|r| r.mark)
    }
}

/// A horse occupying a pedigree slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ancestor {
    /// `None` for an unknown ancestor.
    pub id: Option<HorseId>,
    pub name: String,
    pub sire_id: Option<HorseId>,
    pub dam_id: Option<HorseId>,
    /// Lineage slot of this ancestor's sire, when inside the array.
    pub sire_slot: Option<usize>,
    /// Lineage slot of this ancestor's dam, when inside the array.
    pub dam_slot: Option<usize>,
    /// Formatted lifetime mark, empty when unraced or unknown.
    pub mark: String,
    /// Filled only for dam-line slots.
    pub progeny: Vec<Progeny>,
    /// Filled only for dam-line slots.
    pub races: RaceList,
}

impl Ancestor {
    pub const UNKNOWN_NAME: &'static str = "Unknown";

    pub fn unknown() -> Self {
        Self {
            name: Self::UNKNOWN_NAME.into(),
            ..Self::default()
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.id.is_none()
    }

    /// Name with the mark appended, as printed in the pedigree grid.
    pub fn label(&self) -> String {
        if self.mark.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.mark)
        }
    }
}

/// One foal from a progeny-list document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progeny {
    pub id: HorseId,
    pub name: String,
    #[serde(default)]
    pub sire: Option<HorseRef>,
    pub age: u32,
    pub gender: Gender,
    #[serde(default)]
    pub stable: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub earnings: f64,
    #[serde(default)]
    pub award_winner: bool,
    #[serde(default)]
    pub conference_winner: bool,
    /// Attached lazily; `None` until fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub races: Option<RaceList>,
}

impl Progeny {
    pub fn sire_name(&self) -> &str {
        self.sire
            .as_ref()
            .map(|s| s.name.as_str())
            .unwrap_or(Ancestor::UNKNOWN_NAME)
    }

    pub fn starts(&self) -> usize {
        self.races.as_ref().map(RaceList::len).unwrap_or(0)
    }

    pub fn is_winner(&self) -> bool {
        self.wins > 0
    }

    pub fn is_stakes_winner(&self) -> bool {
        self.races
            .as_ref()
            .is_some_and(|races| races.stakes_wins().next().is_some())
    }

    /// Award winner or stakes winner.
    pub fn is_notable(&self) -> bool {
        self.award_winner || self.is_stakes_winner()
    }

    pub fn mark(&self) -> Option<LifetimeMark> {
        self.races.as_ref().and_then(RaceList::lifetime_mark)
    }
}
