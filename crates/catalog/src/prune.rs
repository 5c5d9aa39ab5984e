//! Page-fit pruning.
//!
//! While the narrative is taller than the space left on the page, drop
//! content in this order:
//!
//! 1. A dam section ("Nth Dam" heading + biography) with no foal paragraph
//!    directly after it goes, heading and biography together.
//! 2. Otherwise the last paragraph at the lowest priority still present.
//!
//! Step 2 only reaches `Required` paragraphs once nothing else is left;
//! step 1 drops an orphaned section's Required pair regardless.

use crate::priority::{PrioritizedParagraph, Role};

/// Height of the paragraphs stacked with a gap after each.
pub fn total_height(paragraphs: &[PrioritizedParagraph]) -> f32 {
    paragraphs.iter().map(PrioritizedParagraph::footprint).sum()
}

/// Remove paragraphs until the rest fit in `budget` points.
pub fn prune(mut paragraphs: Vec<PrioritizedParagraph>, budget: f32) -> Vec<PrioritizedParagraph> {
    while !paragraphs.is_empty() && total_height(&paragraphs) > budget {
        if let Some(start) = orphaned_dam_section(&paragraphs) {
            paragraphs.drain(start..start + 2);
            continue;
        }
        if let Some(index) = lowest_priority(&paragraphs) {
            paragraphs.remove(index);
        }
    }
    paragraphs
}

/// Index of the heading of the first dam section with no foal after it.
fn orphaned_dam_section(paragraphs: &[PrioritizedParagraph]) -> Option<usize> {
    paragraphs.windows(2).enumerate().find_map(|(i, pair)| {
        let is_section = pair[0].role == Role::DamHeading && pair[1].role == Role::DamBiography;
        let has_foal = paragraphs.get(i + 2).is_some_and(|next| next.role == Role::Foal);
        (is_section && !has_foal).then_some(i)
    })
}

/// Last paragraph carrying the minimum priority present.
fn lowest_priority(paragraphs: &[PrioritizedParagraph]) -> Option<usize> {
    let min = paragraphs.iter().map(|p| p.priority).min()?;
    paragraphs.iter().rposition(|p| p.priority == min)
}
