//! Priority-tagged narrative paragraphs.

use serde::{Deserialize, Serialize};
use studbook_layout::Paragraph;

/// How badly a paragraph wants to stay on the page.
///
/// Ordered from least to most important so `min()` finds the next
/// candidate for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    OnlyIfNeeded,
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
    Required,
}

/// What a paragraph is, as far as pruning cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// "1st Dam", "2nd Dam", ...
    DamHeading,
    /// The dam's own summary right after her heading.
    DamBiography,
    /// One of a dam's foals.
    Foal,
    /// Sire summary, notable progeny, production record.
    Trailing,
}

#[derive(Debug, Clone)]
pub struct PrioritizedParagraph {
    pub paragraph: Paragraph,
    pub priority: Priority,
    pub role: Role,
}

impl PrioritizedParagraph {
    pub fn new(paragraph: Paragraph, priority: Priority, role: Role) -> Self {
        Self {
            paragraph,
            priority,
            role,
        }
    }

    /// Rendered height including the gap that follows it.
    pub fn footprint(&self) -> f32 {
        self.paragraph.height() + studbook_layout::LINE_GAP
    }
}
