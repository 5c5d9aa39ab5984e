//! Lineage array indexing.
//!
//! A pedigree of `G` generations is stored as a flat array of
//! `2^(G+1) - 2` slots forming an implicit complete binary tree:
//!
//! | Slot      | Meaning                     |
//! |-----------|-----------------------------|
//! | 0 / 1     | sire / dam                  |
//! | 2i+2      | sire of the horse in slot i |
//! | 2i+3      | dam of the horse in slot i  |
//!
//! The dam line (dam, granddam, great-granddam) sits at slots 1, 5, 13:
//! exactly the slots where `log2(i + 3) - 1` is an integer.

use crate::horse::{HorseId, HorseRef};
use serde::{Deserialize, Serialize};

/// Generations shown in a catalog pedigree.
pub const GENERATIONS: u32 = 3;

/// Number of slots for [`GENERATIONS`]: `2^(G+1) - 2`.
pub const LINEAGE_LEN: usize = lineage_len(GENERATIONS);

/// One ordered name/id pair of a lineage document.
pub type LineageEntry = HorseRef;

/// Slot count for a pedigree of `generations` generations.
pub const fn lineage_len(generations: u32) -> usize {
    (1usize << (generations + 1)) - 2
}

/// Whether `index` is a dam-line slot (dam, granddam, ...).
pub fn is_dam_line_slot(index: usize) -> bool {
    (index + 3).is_power_of_two()
}

/// Generation of a slot, 1 for parents, 2 for grandparents, ...
pub fn generation_of(index: usize) -> u32 {
    (index + 2).ilog2()
}

/// Zero-based position of a slot within its generation's column.
pub fn position_in_generation(index: usize) -> usize {
    index + 2 - (1usize << generation_of(index))
}

/// Slot of the sire of the horse in `index`, if inside an array of `len`.
pub fn sire_slot(index: usize, len: usize) -> Option<usize> {
    let slot = 2 * index + 2;
    (slot < len).then_some(slot)
}

/// Slot of the dam of the horse in `index`, if inside an array of `len`.
pub fn dam_slot(index: usize, len: usize) -> Option<usize> {
    let slot = 2 * index + 3;
    (slot < len).then_some(slot)
}

/// Dam-line slots of an array of `len`, in lineage order.
pub fn dam_line_slots(len: usize) -> Vec<usize> {
    (0..len).filter(|i| is_dam_line_slot(*i)).collect()
}

/// Id of each slot of a lineage document, padded or truncated to `len`.
pub fn normalize(entries: Vec<LineageEntry>, len: usize) -> Vec<LineageEntry> {
    let mut out: Vec<LineageEntry> = entries.into_iter().take(len).collect();
    out.resize_with(len, HorseRef::unknown);
    out
}

/// Ids in a normalized lineage, `None` for unknown slots.
pub fn slot_ids(entries: &[LineageEntry]) -> Vec<Option<HorseId>> {
    entries.iter().map(|e| e.id).collect()
}

/// 1-based dam number of a dam-line slot: slot 1 is the 1st dam.
pub fn dam_number(index: usize) -> Option<u32> {
    is_dam_line_slot(index).then(|| generation_of(index))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotPosition {
    pub generation: u32,
    pub position: usize,
}

impl SlotPosition {
    pub fn of(index: usize) -> Self {
        Self {
            generation: generation_of(index),
            position: position_in_generation(index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_generations_have_fourteen_slots() {
        assert_eq!(LINEAGE_LEN, 14);
        assert_eq!(lineage_len(1), 2);
        assert_eq!(lineage_len(4), 30);
    }

    #[test]
    fn exactly_one_dam_line_slot_per_generation() {
        for generations in 1..=6 {
            let len = lineage_len(generations);
            let slots = dam_line_slots(len);
            assert_eq!(slots.len(), generations as usize);
            let gens: Vec<u32> = slots.iter().map(|s| generation_of(*s)).collect();
            assert_eq!(gens, (1..=generations).collect::<Vec<_>>());
        }
    }

    #[test]
    fn dam_line_matches_log2_rule() {
        for index in 0..62usize {
            let value = ((index + 3) as f64).log2() - 1.0;
            assert_eq!(is_dam_line_slot(index), value.fract() == 0.0, "slot {index}");
        }
        assert_eq!(dam_line_slots(LINEAGE_LEN), vec![1, 5, 13]);
    }

    #[test]
    fn dam_line_slots_follow_dam_links() {
        let mut slot = 1;
        let mut chain = vec![slot];
        while let Some(next) = dam_slot(slot, LINEAGE_LEN) {
            chain.push(next);
            slot = next;
        }
        assert_eq!(chain, dam_line_slots(LINEAGE_LEN));
    }

    #[test]
    fn generations_and_positions() {
        assert_eq!(SlotPosition::of(0), SlotPosition { generation: 1, position: 0 });
        assert_eq!(SlotPosition::of(1), SlotPosition { generation: 1, position: 1 });
        assert_eq!(SlotPosition::of(2), SlotPosition { generation: 2, position: 0 });
        assert_eq!(SlotPosition::of(5), SlotPosition { generation: 2, position: 3 });
        assert_eq!(SlotPosition::of(6), SlotPosition { generation: 3, position: 0 });
        assert_eq!(SlotPosition::of(13), SlotPosition { generation: 3, position: 7 });
    }

    #[test]
    fn parents_of_a_slot_sit_below_it_in_the_next_column() {
        for index in 0..6 {
            let sire = sire_slot(index, LINEAGE_LEN).unwrap();
            let dam = dam_slot(index, LINEAGE_LEN).unwrap();
            assert_eq!(generation_of(sire), generation_of(index) + 1);
            assert_eq!(position_in_generation(sire), 2 * position_in_generation(index));
            assert_eq!(position_in_generation(dam), 2 * position_in_generation(index) + 1);
        }
        assert_eq!(sire_slot(6, LINEAGE_LEN), None);
    }

    #[test]
    fn dam_numbers() {
        assert_eq!(dam_number(1), Some(1));
        assert_eq!(dam_number(5), Some(2));
        assert_eq!(dam_number(13), Some(3));
        assert_eq!(dam_number(0), None);
    }

    #[test]
    fn normalize_pads_with_unknowns() {
        let entries = vec![HorseRef::new(1, "A"), HorseRef::new(2, "B")];
        let out = normalize(entries, 4);
        assert_eq!(out.len(), 4);
        assert_eq!(slot_ids(&out), vec![Some(1), Some(2), None, None]);
    }
}
