//! Upstream document shapes.
//!
//! The profile and progeny rows deserialize straight into the core types;
//! these wrappers cover the envelopes around them.

use serde::{Deserialize, Serialize};
use studbook_core::{HorseRef, Progeny, Race};

/// One page of a race-history document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RacePage {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "first_page")]
    pub pages: u32,
    #[serde(default)]
    pub races: Vec<Race>,
}

fn first_page() -> u32 {
    1
}

/// Ordered ancestor name/id pairs, sire first, generation by generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PedigreeDocument {
    #[serde(default)]
    pub ancestors: Vec<HorseRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgenyDocument {
    #[serde(default)]
    pub progeny: Vec<Progeny>,
}

// ── Resource keys ─────────────────────────────────────────────────────────

pub fn profile_key(id: u64) -> String {
    format!("horses/{id}")
}

pub fn races_key(id: u64, page: u32) -> String {
    format!("horses/{id}/races?page={page}")
}

pub fn pedigree_key(id: u64) -> String {
    format!("horses/{id}/pedigree")
}

pub fn progeny_key(id: u64) -> String {
    format!("horses/{id}/progeny")
}

pub const ACCOUNT_KEY: &str = "account";
