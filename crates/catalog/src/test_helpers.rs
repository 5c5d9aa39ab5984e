//! In-memory registry used by the catalog tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use studbook_core::error::FetchError;
use studbook_core::{
    Gait, Gender, HorseId, HorseProfile, HorseRecords, HorseRef, LineageEntry, Progeny, Race,
    RaceList,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Call {
    Profile,
    Races,
    Lineage,
    Progeny,
}

/// Canned documents plus a per-call fetch counter.
#[derive(Default)]
pub struct FixtureRegistry {
    profiles: HashMap<HorseId, HorseProfile>,
    races: HashMap<HorseId, RaceList>,
    lineages: HashMap<HorseId, Vec<LineageEntry>>,
    progeny: HashMap<HorseId, Vec<Progeny>>,
    failing: Mutex<HashSet<HorseId>>,
    calls: Mutex<HashMap<(Call, HorseId), usize>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FixtureRegistry {
    /// A subject with the given lineage; every known ancestor gets a profile.
    pub fn from_lineage(subject: HorseId, lineage: &[LineageEntry]) -> Self {
        let mut registry = Self::default();
        registry.insert_profile(Self::profile_for(subject, "Subject", Gender::Colt, 1));
        for (slot, entry) in lineage.iter().enumerate() {
            if let Some(id) = entry.id {
                let gender = if slot % 2 == 0 { Gender::Stallion } else { Gender::Mare };
                registry.insert_profile(Self::profile_for(id, &entry.name, gender, 12));
            }
        }
        registry.lineages.insert(subject, lineage.to_vec());
        registry
    }

    pub fn profile_for(id: HorseId, name: &str, gender: Gender, age: u32) -> HorseProfile {
        HorseProfile {
            id,
            name: name.into(),
            age,
            gender,
            color: "Bay".into(),
            foaled: NaiveDate::from_ymd_opt(2024, 3, 14),
            sire: None,
            dam: None,
            records: Vec::new(),
        }
    }

    pub fn foal(id: HorseId, name: &str, age: u32) -> Progeny {
        Progeny {
            id,
            name: name.into(),
            sire: Some(HorseRef::new(900, "Art Major")),
            age,
            gender: Gender::Filly,
            stable: String::new(),
            status: String::new(),
            wins: 0,
            earnings: 0.0,
            award_winner: false,
            conference_winner: false,
            races: None,
        }
    }

    pub fn race(id: u64, name: &str, finish: u32, purse: f64) -> Race {
        Race {
            id,
            name: name.into(),
            stake: false,
            elim: false,
            age_bracket: "3yo".into(),
            condition: String::new(),
            gait: Gait::Pace,
            surface: "dirt".into(),
            track_condition: "fast".into(),
            purse,
            finish: Some(finish),
            time: Some(112.4),
            date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap_or_default(),
        }
    }

    pub fn insert_profile(&mut self, profile: HorseProfile) {
        self.profiles.insert(profile.id, profile);
    }

    /// Serve `profile` when `requested` is asked for.
    pub fn alias_profile(&mut self, requested: HorseId, profile: HorseProfile) {
        self.profiles.insert(requested, profile);
    }

    pub fn insert_races(&mut self, id: HorseId, races: RaceList) {
        self.races.insert(id, races);
    }

    pub fn insert_progeny(&mut self, id: HorseId, progeny: Vec<Progeny>) {
        self.progeny.insert(id, progeny);
    }

    pub fn profile_mut(&mut self, id: HorseId) -> Option<&mut HorseProfile> {
        self.profiles.get_mut(&id)
    }

    /// Make every later request for `id` fail with a 500.
    pub fn fail_profile(&self, id: HorseId) {
        self.failing.lock().unwrap().insert(id);
    }

    fn count(&self, call: Call, id: HorseId) -> Result<(), FetchError> {
        *self.calls.lock().unwrap().entry((call, id)).or_default() += 1;
        if self.failing.lock().unwrap().contains(&id) {
            return Err(FetchError::Status {
                status_code: 500,
                url: format!("fixture://horses/{id}"),
            });
        }
        Ok(())
    }

    /// Hold the call open across one yield so overlapping calls are visible.
    async fn in_flight(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    /// Most calls observed in progress at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn calls_of(&self, call: Call, id: HorseId) -> usize {
        self.calls.lock().unwrap().get(&(call, id)).copied().unwrap_or(0)
    }

    pub fn profile_fetches(&self, id: HorseId) -> usize {
        self.calls_of(Call::Profile, id)
    }

    pub fn race_fetches(&self, id: HorseId) -> usize {
        self.calls_of(Call::Races, id)
    }

    pub fn progeny_fetches(&self, id: HorseId) -> usize {
        self.calls_of(Call::Progeny, id)
    }

    pub fn lineage_fetches(&self, id: HorseId) -> usize {
        self.calls_of(Call::Lineage, id)
    }

    pub fn total_profile_fetches(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|((call, _), _)| *call == Call::Profile)
            .map(|(_, n)| n)
            .sum()
    }
}

#[async_trait]
impl HorseRecords for FixtureRegistry {
    async fn profile(&self, id: HorseId) -> Result<HorseProfile, FetchError> {
        self.count(Call::Profile, id)?;
        self.in_flight().await;
        self.profiles.get(&id).cloned().ok_or_else(|| FetchError::Status {
            status_code: 404,
            url: format!("fixture://horses/{id}"),
        })
    }

    async fn races(&self, id: HorseId) -> Result<RaceList, FetchError> {
        self.count(Call::Races, id)?;
        self.in_flight().await;
        Ok(self.races.get(&id).cloned().unwrap_or_default())
    }

    async fn lineage(&self, id: HorseId) -> Result<Vec<LineageEntry>, FetchError> {
        self.count(Call::Lineage, id)?;
        self.in_flight().await;
        Ok(self.lineages.get(&id).cloned().unwrap_or_default())
    }

    async fn progeny(&self, id: HorseId) -> Result<Vec<Progeny>, FetchError> {
        self.count(Call::Progeny, id)?;
        self.in_flight().await;
        Ok(self.progeny.get(&id).cloned().unwrap_or_default())
    }
}
