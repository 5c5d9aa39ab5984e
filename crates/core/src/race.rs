//! Race records and the derived queries the narrative is built from.
//!
//! A [`RaceList`] is an ordered, id-unique sequence of [`Race`] results. All
//! performance facts printed in a catalog (marks, earnings, win counts, key
//! race citations) are derived from it rather than stored separately.

use crate::format::{format_money, format_time};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Share of the purse paid to finishing positions 1 through 5.
pub const PAYOUT_TABLE: [f64; 5] = [0.50, 0.25, 0.12, 0.08, 0.05];

/// A horse ages one year per this many calendar months.
pub const MONTHS_PER_AGE_YEAR: i32 = 3;

/// Racing gait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gait {
    Trot,
    Pace,
}

impl Gait {
    /// Prefix printed in front of a mark: pacers carry `p,`.
    pub fn mark_prefix(self) -> &'static str {
        match self {
            Self::Pace => "p,",
            Self::Trot => "",
        }
    }
}

impl fmt::Display for Gait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trot => write!(f, "trot"),
            Self::Pace => write!(f, "pace"),
        }
    }
}

/// A single parsed race result. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Race {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub stake: bool,
    #[serde(default)]
    pub elim: bool,
    /// Age-bracket tag as published, e.g. `2yo`, `3YO`, `Open`.
    #[serde(default)]
    pub age_bracket: String,
    /// Condition text, e.g. `Open`, `Preferred`, `NW2`.
    #[serde(default)]
    pub condition: String,
    pub gait: Gait,
    #[serde(default)]
    pub surface: String,
    #[serde(default)]
    pub track_condition: String,
    #[serde(default)]
    pub purse: f64,
    /// Finish position; `None` for scratches and unplaced starts.
    #[serde(default)]
    pub finish: Option<u32>,
    /// Final time in seconds.
    #[serde(default)]
    pub time: Option<f64>,
    pub date: NaiveDate,
}

impl Race {
    /// Purse share earned by this start.
    pub fn earnings(&self) -> f64 {
        match self.finish {
            Some(pos @ 1..=5) => self.purse * PAYOUT_TABLE[(pos - 1) as usize],
            _ => 0.0,
        }
    }

    pub fn is_win(&self) -> bool {
        self.finish == Some(1)
    }

    /// Finished within the first `places` positions.
    pub fn placed_within(&self, places: u32) -> bool {
        self.finish.is_some_and(|pos| pos >= 1 && pos <= places)
    }

    /// A stakes placing in the top three, or a win in an open or
    /// preferred class.
    pub fn is_key_race(&self) -> bool {
        if self.stake && !self.elim && self.placed_within(3) {
            return true;
        }
        let condition = self.condition.to_ascii_lowercase();
        self.is_win() && (condition.contains("open") || condition.contains("preferred"))
    }

    /// Age encoded in the bracket tag (`2yo` → 2), if any.
    pub fn explicit_age(&self) -> Option<u32> {
        let digits: String = self
            .age_bracket
            .trim()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    }
}

/// Fastest winning time, annotated with gait and age.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LifetimeMark {
    pub gait: Gait,
    pub age: Option<u32>,
    pub seconds: f64,
}

impl fmt::Display for LifetimeMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.gait.mark_prefix())?;
        if let Some(age) = self.age {
            write!(f, "{age},")?;
        }
        write!(f, "{}", format_time(self.seconds))
    }
}

/// Starts, wins, seconds, thirds and earnings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceSummary {
    pub starts: usize,
    pub firsts: usize,
    pub seconds: usize,
    pub thirds: usize,
    pub earnings: f64,
}

impl fmt::Display for RaceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}, {}",
            self.starts,
            self.firsts,
            self.seconds,
            self.thirds,
            format_money(self.earnings)
        )
    }
}

/// Ordered sequence of races, unique by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RaceList {
    races: Vec<Race>,
}

impl RaceList {
    /// Build a list, keeping the first occurrence of each race id.
    pub fn new(races: impl IntoIterator<Item = Race>) -> Self {
        let mut list = Self::default();
        list.extend(races);
        list
    }

    /// Append a race unless its id is already present.
    pub fn push(&mut self, race: Race) -> bool {
        if self.races.iter().any(|r| r.id == race.id) {
            return false;
        }
        self.races.push(race);
        true
    }

    pub fn extend(&mut self, races: impl IntoIterator<Item = Race>) {
        let mut seen: HashSet<u64> = self.races.iter().map(|r| r.id).collect();
        for race in races {
            if seen.insert(race.id) {
                self.races.push(race);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.races.len()
    }

    pub fn is_empty(&self) -> bool {
        self.races.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Race> {
        self.races.iter()
    }

    pub fn get(&self, id: u64) -> Option<&Race> {
        self.races.iter().find(|r| r.id == id)
    }

    /// Fastest timed start matching `filter`.
    pub fn fastest_race_where(&self, filter: impl Fn(&Race) -> bool) -> Option<&Race> {
        self.races
            .iter()
            .filter(|r| filter(r))
            .filter(|r| r.time.is_some_and(|t| t > 0.0))
            .min_by(|a, b| {
                let (ta, tb) = (a.time.unwrap_or(f64::MAX), b.time.unwrap_or(f64::MAX));
                ta.total_cmp(&tb)
            })
    }

    pub fn fastest_race(&self) -> Option<&Race> {
        self.fastest_race_where(|_| true)
    }

    /// Fastest timed win matching `filter`.
    pub fn fastest_win_where(&self, filter: impl Fn(&Race) -> bool) -> Option<&Race> {
        self.fastest_race_where(|r| r.is_win() && filter(r))
    }

    pub fn fastest_win(&self) -> Option<&Race> {
        self.fastest_win_where(|_| true)
    }

    pub fn win_count(&self) -> usize {
        self.races.iter().filter(|r| r.is_win()).count()
    }

    pub fn earnings(&self) -> f64 {
        self.races.iter().map(Race::earnings).sum()
    }

    pub fn stakes_wins(&self) -> impl Iterator<Item = &Race> {
        self.races.iter().filter(|r| r.stake && !r.elim && r.is_win())
    }

    pub fn key_races(&self) -> impl Iterator<Item = &Race> {
        self.races.iter().filter(|r| r.is_key_race())
    }

    /// Age of the horse when it ran `race`.
    ///
    /// Uses the race's own bracket tag when it names an age; otherwise the
    /// nearest race (by date) with an explicit age is the reference and the
    /// difference in dates is converted to age-years.
    pub fn infer_age(&self, race: &Race) -> Option<u32> {
        if let Some(age) = race.explicit_age() {
            return Some(age);
        }
        let reference = self
            .races
            .iter()
            .filter(|r| r.explicit_age().is_some())
            .min_by_key(|r| (r.date - race.date).num_days().abs())?;
        let ref_age = i64::from(reference.explicit_age()?);
        let months = months_between(reference.date, race.date);
        let age = ref_age + i64::from(months.div_euclid(MONTHS_PER_AGE_YEAR));
        u32::try_from(age).ok().filter(|a| *a > 0)
    }

    /// Fastest win formatted as a lifetime mark.
    pub fn lifetime_mark(&self) -> Option<LifetimeMark> {
        let race = self.fastest_win()?;
        Some(LifetimeMark {
            gait: race.gait,
            age: self.infer_age(race),
            seconds: race.time?,
        })
    }

    pub fn summary(&self) -> RaceSummary {
        let mut summary = RaceSummary {
            starts: self.races.len(),
            earnings: self.earnings(),
            ..RaceSummary::default()
        };
        for race in &self.races {
            match race.finish {
                Some(1) => summary.firsts += 1,
                Some(2) => summary.seconds += 1,
                Some(3) => summary.thirds += 1,
                _ => {}
            }
        }
        summary
    }
}

impl<'a> IntoIterator for &'a RaceList {
    type Item = &'a Race;
    type IntoIter = std::slice::Iter<'a, Race>;

    fn into_iter(self) -> Self::IntoIter {
        self.races.iter()
    }
}

/// Whole calendar months from `from` to `to` (negative when `to` is earlier).
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    let mut months = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    if months > 0 && to.day() < from.day() {
        months -= 1;
    } else if months < 0 && to.day() > from.day() {
        months += 1;
    }
    months
}
