//! One catalog page per subject.
//!
//! Fetches the subject, aggregates its pedigree, builds and prunes the
//! narrative, and records the result onto a [`RecordedPage`].

use crate::ancestry::{Aggregator, BroodmareProduce};
use crate::narrative::{NarrativeInput, build_narrative};
use crate::pedigree::draw_pedigree;
use crate::prune::prune;
use chrono::{Local, NaiveDate};
use std::collections::HashSet;
use studbook_config::CatalogConfig;
use studbook_core::error::{CatalogError, Error};
use studbook_core::lineage::{self, LINEAGE_LEN};
use studbook_core::{Ancestor, HorseId, HorseProfile, HorseRecords, RaceList};
use studbook_layout::{Canvas, Cursor, Font, LINE_GAP, PageGeometry, RecordedPage, TextOp};
use tracing::{debug, info};

/// Space between the header and the grid, and the grid and the narrative.
const SECTION_GAP: f32 = 8.0;

/// Per-run page settings.
#[derive(Debug, Clone)]
pub struct PageOptions {
    pub consignor: Option<String>,
    pub full_pedigree: bool,
    pub fetch_concurrency: usize,
    pub geometry: PageGeometry,
    /// Reference date for ages and seasons; today when unset.
    pub today: Option<NaiveDate>,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            consignor: None,
            full_pedigree: false,
            fetch_concurrency: 3,
            geometry: PageGeometry::HALF_LETTER,
            today: None,
        }
    }
}

impl PageOptions {
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self {
            consignor: config.consignor.clone(),
            full_pedigree: config.full_pedigree,
            fetch_concurrency: config.fetch_concurrency.max(1),
            ..Self::default()
        }
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}

/// A laid-out page waiting to be written into the document.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub subject_id: HorseId,
    pub name: String,
    pub page: RecordedPage,
    /// Narrative paragraphs printed.
    pub kept: usize,
    /// Narrative paragraphs pruned to fit.
    pub dropped: usize,
}

/// Build the page for `subject_id`.
pub async fn generate_page(
    records: &dyn HorseRecords,
    subject_id: HorseId,
    hip: Option<&str>,
    options: &PageOptions,
) -> Result<RenderedPage, Error> {
    let (profile, races, lineage) = tokio::try_join!(
        records.profile(subject_id),
        records.races(subject_id),
        records.lineage(subject_id),
    )?;
    if profile.id != subject_id {
        return Err(CatalogError::IdentityMismatch {
            requested: subject_id,
            found: profile.id,
        }
        .into());
    }
    let lineage = lineage::normalize(lineage, LINEAGE_LEN);

    let mut aggregator = Aggregator::new(records, options.fetch_concurrency);
    aggregator.seed(profile.clone(), races.clone());
    let mut ancestors = aggregator.populate_ancestors(&lineage).await?;
    for slot in lineage::dam_line_slots(ancestors.len()) {
        aggregator.attach_races(&mut ancestors[slot].progeny).await?;
    }
    let subject_progeny = aggregator
        .produce_of(&[subject_id])
        .await?
        .remove(&subject_id)
        .unwrap_or_default();
    let broodmares = if options.full_pedigree {
        let mares = broodmares_to_expand(&ancestors, subject_id);
        debug!(subject = subject_id, count = mares.len(), "Expanding broodmares");
        aggregator.broodmare_produce(&mares).await?
    } else {
        BroodmareProduce::default()
    };

    let geometry = options.geometry;
    let width = geometry.content_width();
    let mut page = RecordedPage::new();
    let header_bottom = draw_header(&mut page, &profile, &races, hip, options);
    let grid_top = Cursor::new(geometry.margin_left, header_bottom + SECTION_GAP);
    let grid_bottom = draw_pedigree(&ancestors, grid_top, width, &mut page);

    let narrative = build_narrative(&NarrativeInput {
        subject: &profile,
        ancestors: &ancestors,
        subject_progeny: &subject_progeny,
        broodmares: &broodmares,
        today: options.today(),
        width,
    });
    let total = narrative.len();
    let narrative_top = grid_bottom + SECTION_GAP;
    let kept = prune(narrative, geometry.content_bottom() - narrative_top);

    let mut cursor = Cursor::new(geometry.margin_left, narrative_top);
    for paragraph in &kept {
        paragraph.paragraph.write(&mut cursor, &mut page);
        cursor.advance(paragraph.footprint());
    }

    info!(
        subject = subject_id,
        name = %profile.name,
        kept = kept.len(),
        dropped = total - kept.len(),
        "Page assembled"
    );
    Ok(RenderedPage {
        subject_id,
        name: profile.name,
        page,
        kept: kept.len(),
        dropped: total - kept.len(),
    })
}

/// Female foals of the dam line that are neither the subject nor a dam-line
/// ancestor, in lineage order.
fn broodmares_to_expand(ancestors: &[Ancestor], subject: HorseId) -> Vec<HorseId> {
    let dam_line = lineage::dam_line_slots(ancestors.len());
    let dam_ids: HashSet<HorseId> = dam_line.iter().filter_map(|&s| ancestors[s].id).collect();
    let mut seen = HashSet::new();
    dam_line
        .iter()
        .flat_map(|&slot| &ancestors[slot].progeny)
        .filter(|f| f.gender.is_female() && f.id != subject && !dam_ids.contains(&f.id))
        .filter(|f| seen.insert(f.id))
        .map(|f| f.id)
        .collect()
}

// ── Header ────────────────────────────────────────────────────────────────

fn draw_header(
    canvas: &mut dyn Canvas,
    profile: &HorseProfile,
    races: &RaceList,
    hip: Option<&str>,
    options: &PageOptions,
) -> f32 {
    let g = options.geometry;
    let mut y = g.margin_top;
    let mut line = |text: String, font: Font, size: f32| {
        if text.is_empty() {
            return;
        }
        let width = font.width_of(&text, size);
        canvas.draw_text(TextOp {
            x: g.margin_left + ((g.content_width() - width) / 2.0).max(0.0),
            y,
            text,
            font,
            size,
        });
        y += font.height_at(size) + LINE_GAP * 2.0;
    };

    if let Some(consignor) = &options.consignor {
        line(format!("Consigned by {consignor}"), Font::Italic, 8.0);
    }
    if let Some(hip) = hip {
        line(format!("HIP {hip}"), Font::Bold, 12.0);
    }
    line(profile.name.to_uppercase(), Font::Bold, 16.0);

    let mark = profile.lifetime_mark().or_else(|| races.lifetime_mark());
    let age = age_text(profile.age);
    let mark_line = match mark {
        Some(mark) => format!("{mark}  {age}"),
        None => age,
    };
    line(mark_line, Font::Regular, 9.0);

    let mut description = format!("{} {}", profile.color, profile.gender);
    if let Some(foaled) = profile.foaled {
        description.push_str(&format!("; foaled {}", foaled.format("%B %-d, %Y")));
    }
    line(description.trim().to_string(), Font::Regular, 8.0);
    line(format!("Registry #{}", profile.id), Font::Regular, 7.0);
    y
}

fn age_text(age: u32) -> String {
    match age {
        0 => "Weanling".into(),
        1 => "Yearling".into(),
        n => format!("{n}-year-old"),
    }
}
