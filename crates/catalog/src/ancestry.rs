//! Genealogy aggregation.
//!
//! Walks the lineage array in small concurrent batches and fills each slot
//! with an [`Ancestor`]. Every distinct horse is fetched once per run: the
//! aggregator memoizes profiles, race histories and progeny lists by id, and
//! batch results land in pre-indexed positions so completion order never
//! affects the output.

use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use studbook_core::error::FetchError;
use studbook_core::lineage::{self, is_dam_line_slot};
use studbook_core::{Ancestor, HorseId, HorseProfile, HorseRecords, LineageEntry, Progeny, RaceList};
use tracing::debug;

/// Fetch `ids` in batches of `concurrency`, keeping input order.
async fn fetch_batched<T, F, Fut>(
    ids: &[HorseId],
    concurrency: usize,
    fetch: F,
) -> Result<Vec<(HorseId, T)>, FetchError>
where
    F: Fn(HorseId) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut out = Vec::with_capacity(ids.len());
    for batch in ids.chunks(concurrency.max(1)) {
        let results = join_all(batch.iter().map(|&id| fetch(id))).await;
        for (&id, result) in batch.iter().zip(results) {
            out.push((id, result?));
        }
    }
    Ok(out)
}

/// Ids not yet in `known`, first occurrence only.
fn missing<V>(ids: impl IntoIterator<Item = HorseId>, known: &HashMap<HorseId, V>) -> Vec<HorseId> {
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| !known.contains_key(id) && seen.insert(*id))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Lookup {
    Profile(HorseId),
    Progeny(HorseId),
    Races(HorseId),
}

enum Fetched {
    Profile(HorseId, HorseProfile),
    Progeny(HorseId, Vec<Progeny>),
    Races(HorseId, RaceList),
}

/// Memoizing fetcher for one catalog page.
pub struct Aggregator<'a> {
    records: &'a dyn HorseRecords,
    concurrency: usize,
    profiles: HashMap<HorseId, HorseProfile>,
    races: HashMap<HorseId, RaceList>,
    progeny: HashMap<HorseId, Vec<Progeny>>,
}

impl<'a> Aggregator<'a> {
    pub fn new(records: &'a dyn HorseRecords, concurrency: usize) -> Self {
        Self {
            records,
            concurrency: concurrency.max(1),
            profiles: HashMap::new(),
            races: HashMap::new(),
            progeny: HashMap::new(),
        }
    }

    /// Record documents already fetched for `id` so they are not fetched again.
    pub fn seed(&mut self, profile: HorseProfile, races: RaceList) {
        self.races.insert(profile.id, races);
        self.profiles.insert(profile.id, profile);
    }

    /// Fill every lineage slot.
    ///
    /// Each unseen id gets one profile fetch; unseen dam-line ids also get
    /// their progeny list and race history. The lookups are queued in slot
    /// order and issued `concurrency` at a time, whatever their kind.
    pub async fn populate_ancestors(
        &mut self,
        lineage: &[LineageEntry],
    ) -> Result<Vec<Ancestor>, FetchError> {
        let ids = lineage::slot_ids(lineage);
        let lookups = self.pending_lookups(&ids);

        let records = self.records;
        for batch in lookups.chunks(self.concurrency) {
            let results = join_all(batch.iter().map(|&lookup| async move {
                Ok::<_, FetchError>(match lookup {
                    Lookup::Profile(id) => Fetched::Profile(id, records.profile(id).await?),
                    Lookup::Progeny(id) => Fetched::Progeny(id, records.progeny(id).await?),
                    Lookup::Races(id) => Fetched::Races(id, records.races(id).await?),
                })
            }))
            .await;
            for result in results {
                match result? {
                    Fetched::Profile(id, profile) => {
                        self.profiles.insert(id, profile);
                    }
                    Fetched::Progeny(id, list) => {
                        self.progeny.insert(id, list);
                    }
                    Fetched::Races(id, list) => {
                        self.races.insert(id, list);
                    }
                }
            }
            debug!(lookups = batch.len(), "Lineage batch loaded");
        }

        Ok((0..lineage.len())
            .map(|i| self.ancestor_at(i, lineage, &ids))
            .collect())
    }

    /// Lookups still needed for `ids`, in slot order, each at most once.
    fn pending_lookups(&self, ids: &[Option<HorseId>]) -> Vec<Lookup> {
        let mut queued = HashSet::new();
        let mut lookups = Vec::new();
        for (slot, id) in ids.iter().enumerate() {
            let Some(id) = *id else { continue };
            let mut wanted = vec![];
            if !self.profiles.contains_key(&id) {
                wanted.push(Lookup::Profile(id));
            }
            if is_dam_line_slot(slot) {
                if !self.progeny.contains_key(&id) {
                    wanted.push(Lookup::Progeny(id));
                }
                if !self.races.contains_key(&id) {
                    wanted.push(Lookup::Races(id));
                }
            }
            lookups.extend(wanted.into_iter().filter(|lookup| queued.insert(*lookup)));
        }
        lookups
    }

    fn ancestor_at(&self, index: usize, lineage: &[LineageEntry], ids: &[Option<HorseId>]) -> Ancestor {
        let len = lineage.len();
        let sire_slot = lineage::sire_slot(index, len);
        let dam_slot = lineage::dam_slot(index, len);
        let Some(id) = ids[index] else {
            let name = lineage[index].name.trim();
            return Ancestor {
                name: if name.is_empty() { Ancestor::UNKNOWN_NAME.into() } else { name.to_string() },
                sire_slot,
                dam_slot,
                ..Ancestor::default()
            };
        };

        let profile = self.profiles.get(&id);
        let slot_id = |slot: Option<usize>| slot.and_then(|s| ids[s]);
        let mut ancestor = Ancestor {
            id: Some(id),
            name: profile.map_or_else(|| lineage[index].name.clone(), |p| p.name.clone()),
            sire_id: profile
                .and_then(|p| p.sire.as_ref()?.id)
                .or_else(|| slot_id(sire_slot)),
            dam_id: profile
                .and_then(|p| p.dam.as_ref()?.id)
                .or_else(|| slot_id(dam_slot)),
            sire_slot,
            dam_slot,
            mark: profile
                .and_then(HorseProfile::lifetime_mark)
                .map(|m| m.to_string())
                .unwrap_or_default(),
            ..Ancestor::default()
        };
        if is_dam_line_slot(index) {
            ancestor.progeny = self.progeny.get(&id).cloned().unwrap_or_default();
            ancestor.races = self.races.get(&id).cloned().unwrap_or_default();
        }
        ancestor
    }

    /// Attach race histories to `foals`, fetching each unseen id once.
    pub async fn attach_races(&mut self, foals: &mut [Progeny]) -> Result<(), FetchError> {
        let ids = missing(foals.iter().map(|f| f.id), &self.races);
        let records = self.records;
        for (id, races) in fetch_batched(&ids, self.concurrency, |id| records.races(id)).await? {
            self.races.insert(id, races);
        }
        for foal in foals.iter_mut() {
            foal.races = self.races.get(&foal.id).cloned();
        }
        Ok(())
    }

    /// Progeny of each id with races attached, keyed by parent id.
    pub async fn produce_of(
        &mut self,
        parents: &[HorseId],
    ) -> Result<HashMap<HorseId, Vec<Progeny>>, FetchError> {
        let ids = missing(parents.iter().copied(), &self.progeny);
        let records = self.records;
        for (id, list) in fetch_batched(&ids, self.concurrency, |id| records.progeny(id)).await? {
            self.progeny.insert(id, list);
        }

        let mut out = HashMap::new();
        for parent in parents {
            let mut foals = self.progeny.get(parent).cloned().unwrap_or_default();
            self.attach_races(&mut foals).await?;
            out.insert(*parent, foals);
        }
        Ok(out)
    }

    /// Two extra generations below each broodmare: her foals and the foals
    /// of her daughters.
    pub async fn broodmare_produce(
        &mut self,
        broodmares: &[HorseId],
    ) -> Result<BroodmareProduce, FetchError> {
        let foals = self.produce_of(broodmares).await?;
        let daughters: Vec<HorseId> = broodmares
            .iter()
            .flat_map(|id| foals.get(id).into_iter().flatten())
            .filter(|f| f.gender.is_female())
            .map(|f| f.id)
            .collect();
        let grandfoals = self.produce_of(&daughters).await?;
        Ok(BroodmareProduce { foals, grandfoals })
    }
}

/// Produce of expanded broodmares, two levels deep.
#[derive(Debug, Clone, Default)]
pub struct BroodmareProduce {
    /// Broodmare id → her foals.
    pub foals: HashMap<HorseId, Vec<Progeny>>,
    /// Daughter id → her foals.
    pub grandfoals: HashMap<HorseId, Vec<Progeny>>,
}

impl BroodmareProduce {
    /// Notable foals of `mare`.
    pub fn notable_foals(&self, mare: HorseId) -> Vec<&Progeny> {
        self.foals
            .get(&mare)
            .into_iter()
            .flatten()
            .filter(|f| f.is_notable())
            .collect()
    }

    /// Notable foals of the daughters of `mare`.
    pub fn notable_grandfoals(&self, mare: HorseId) -> Vec<&Progeny> {
        self.foals
            .get(&mare)
            .into_iter()
            .flatten()
            .filter(|f| f.gender.is_female())
            .flat_map(|daughter| self.grandfoals.get(&daughter.id).into_iter().flatten())
            .filter(|f| f.is_notable())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::FixtureRegistry;
    use studbook_core::HorseRef;
    use studbook_core::lineage::LINEAGE_LEN;

    fn lineage_with_repeat() -> Vec<LineageEntry> {
        // Slot 2 (paternal grandsire) and slot 4 (maternal grandsire) are
        // the same stallion.
        let mut entries: Vec<LineageEntry> = (0..LINEAGE_LEN as u64)
            .map(|i| HorseRef::new(100 + i, format!("Horse {i}")))
            .collect();
        entries[4] = HorseRef::new(102, "Horse 2");
        entries[11] = HorseRef::unknown();
        entries
    }

    #[tokio::test]
    async fn repeated_ancestor_is_fetched_once() {
        let registry = FixtureRegistry::from_lineage(1, &lineage_with_repeat());
        let mut aggregator = Aggregator::new(&registry, 3);
        let ancestors = aggregator.populate_ancestors(&lineage_with_repeat()).await.unwrap();

        assert_eq!(ancestors.len(), LINEAGE_LEN);
        assert_eq!(ancestors[2].id, ancestors[4].id);
        assert_eq!(registry.profile_fetches(102), 1);
        // 14 slots, one repeat, one unknown.
        assert_eq!(registry.total_profile_fetches(), 12);
    }

    #[tokio::test]
    async fn lookups_of_every_kind_share_the_batch_limit() {
        let registry = FixtureRegistry::from_lineage(1, &lineage_with_repeat());
        let mut aggregator = Aggregator::new(&registry, 3);
        aggregator.populate_ancestors(&lineage_with_repeat()).await.unwrap();

        // Slot 1 is on the dam line: its profile, progeny and races still
        // go out with at most two other lookups.
        assert_eq!(registry.peak_in_flight(), 3);
        assert_eq!(registry.race_fetches(101), 1);
    }

    #[tokio::test]
    async fn dam_line_slots_carry_produce() {
        let registry = FixtureRegistry::from_lineage(1, &lineage_with_repeat());
        let mut aggregator = Aggregator::new(&registry, 3);
        let ancestors = aggregator.populate_ancestors(&lineage_with_repeat()).await.unwrap();

        for slot in lineage::dam_line_slots(LINEAGE_LEN) {
            assert_eq!(registry.progeny_fetches(ancestors[slot].id.unwrap()), 1);
        }
        assert_eq!(registry.progeny_fetches(100), 0);
        assert_eq!(ancestors[0].sire_slot, Some(2));
        assert_eq!(ancestors[1].dam_slot, Some(5));
        assert_eq!(ancestors[6].sire_slot, None);
    }

    #[tokio::test]
    async fn unknown_slot_stays_unknown() {
        let registry = FixtureRegistry::from_lineage(1, &lineage_with_repeat());
        let mut aggregator = Aggregator::new(&registry, 3);
        let ancestors = aggregator.populate_ancestors(&lineage_with_repeat()).await.unwrap();
        assert!(ancestors[11].is_unknown());
        assert_eq!(ancestors[11].name, "Unknown");
    }

    #[tokio::test]
    async fn seeded_races_are_not_refetched() {
        let registry = FixtureRegistry::from_lineage(1, &lineage_with_repeat());
        let mut aggregator = Aggregator::new(&registry, 3);
        let profile = registry.profile(1).await.unwrap();
        let races = registry.races(1).await.unwrap();
        aggregator.seed(profile, races);

        let mut foals = vec![FixtureRegistry::foal(1, "Subject", 2)];
        aggregator.attach_races(&mut foals).await.unwrap();
        aggregator.attach_races(&mut foals).await.unwrap();
        assert_eq!(registry.race_fetches(1), 1);
        assert!(foals[0].races.is_some());
    }

    #[tokio::test]
    async fn fetch_errors_propagate() {
        let registry = FixtureRegistry::from_lineage(1, &lineage_with_repeat());
        registry.fail_profile(107);
        let mut aggregator = Aggregator::new(&registry, 3);
        let result = aggregator.populate_ancestors(&lineage_with_repeat()).await;
        assert!(matches!(result, Err(FetchError::Status { status_code: 500, .. })));
    }
}
