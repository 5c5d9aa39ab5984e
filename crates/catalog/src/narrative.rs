//! Catalog narrative: dam sections, foal lines and the trailing section.
//!
//! Produces the prioritized paragraphs that sit below the pedigree grid.
//! Nothing here fetches; the aggregator has already attached races to every
//! foal that is printed.

use crate::ancestry::BroodmareProduce;
use crate::priority::{PrioritizedParagraph, Priority, Role};
use chrono::{Datelike, Months, NaiveDate};
use std::collections::HashSet;
use studbook_core::format::{format_money, ordinal};
use studbook_core::lineage::{dam_line_slots, dam_number};
use studbook_core::{Ancestor, HorseId, HorseProfile, Progeny, Race, RaceList};
use studbook_layout::{Component, Paragraph};

/// Most key races cited per horse.
const MAX_CITED_RACES: usize = 3;

/// Most notable progeny listed under a sire.
const MAX_NOTABLE_PROGENY: usize = 6;

const FOAL_INDENT: f32 = 6.0;
const HANGING_INDENT: f32 = 12.0;
const SECTION_PADDING: f32 = 3.0;

/// Everything the narrative reads.
pub struct NarrativeInput<'a> {
    pub subject: &'a HorseProfile,
    /// Lineage slots with dam-line foals' races attached.
    pub ancestors: &'a [Ancestor],
    /// The subject's own foals, races attached.
    pub subject_progeny: &'a [Progeny],
    /// Produce of expanded broodmares; empty unless a full pedigree was asked for.
    pub broodmares: &'a BroodmareProduce,
    pub today: NaiveDate,
    pub width: f32,
}

/// All narrative paragraphs in print order.
pub fn build_narrative(input: &NarrativeInput<'_>) -> Vec<PrioritizedParagraph> {
    let mut out = Vec::new();
    let dam_line = dam_line_slots(input.ancestors.len());
    let dam_line_ids: HashSet<HorseId> = dam_line
        .iter()
        .filter_map(|&slot| input.ancestors[slot].id)
        .collect();

    for (step, &slot) in dam_line.iter().enumerate() {
        let dam = &input.ancestors[slot];
        if dam.is_unknown() {
            continue;
        }
        // The horse this dam leads to: the subject for the 1st dam, the
        // previous dam for every later one.
        let next_id = match step {
            0 => Some(input.subject.id),
            _ => input.ancestors[dam_line[step - 1]].id,
        };
        out.extend(dam_section(input, slot, next_id, &dam_line_ids));
    }

    if input.subject.gender.is_male() {
        out.extend(sire_summary(input));
    } else {
        out.extend(production_record(input));
    }
    out
}

// ── Dam sections ──────────────────────────────────────────────────────────

fn dam_section(
    input: &NarrativeInput<'_>,
    slot: usize,
    next_id: Option<HorseId>,
    dam_line_ids: &HashSet<HorseId>,
) -> Vec<PrioritizedParagraph> {
    let dam = &input.ancestors[slot];
    let number = dam_number(slot).unwrap_or(1);
    let mut out = Vec::with_capacity(dam.progeny.len() + 2);

    let heading = Paragraph::new(input.width)
        .with_padding_top(SECTION_PADDING)
        .push(Component::bold(format!("{} Dam", ordinal(number))).uppercase());
    out.push(PrioritizedParagraph::new(heading, Priority::Required, Role::DamHeading));

    let biography = dam_biography(input, dam, next_id);
    out.push(PrioritizedParagraph::new(biography, Priority::Required, Role::DamBiography));

    for foal in sorted_foals(&dam.progeny) {
        let as_above = dam_line_ids.contains(&foal.id);
        let (paragraph, priority) = foal_paragraph(input, foal, as_above);
        out.push(PrioritizedParagraph::new(paragraph, priority, Role::Foal));
    }
    out
}

fn dam_biography(input: &NarrativeInput<'_>, dam: &Ancestor, next_id: Option<HorseId>) -> Paragraph {
    let mut p = Paragraph::new(input.width).with_indent(FOAL_INDENT);
    p.add(Component::bold(dam.name.clone()).uppercase());
    if !dam.mark.is_empty() {
        p.add(format!(" {}", dam.mark));
    }
    let sire = dam
        .sire_slot
        .map(|slot| &input.ancestors[slot])
        .filter(|sire| !sire.is_unknown());
    match sire {
        Some(sire) => p.add(format!(" by {}.", sire.name)),
        None => p.add("."),
    };
    add_record(&mut p, &dam.races);

    let foals = &dam.progeny;
    match foals.as_slice() {
        [only] if Some(only.id) == next_id => {
            p.add(Component::bold(format!(" {}", only.name)).uppercase());
            p.add(format!(" is her first foal, a {}.", only.gender.foal_word()));
        }
        [] => {}
        _ => {
            let winners = foals.iter().filter(|f| f.is_winner()).count();
            p.add(format!(
                " From {}, {}.",
                plural(foals.len(), "foal"),
                plural(winners, "winner")
            ));
        }
    }
    p
}

/// Foals by earnings, then age, then name.
fn sorted_foals(foals: &[Progeny]) -> Vec<&Progeny> {
    let mut sorted: Vec<&Progeny> = foals.iter().collect();
    sorted.sort_by(|a, b| {
        b.earnings
            .total_cmp(&a.earnings)
            .then(b.age.cmp(&a.age))
            .then_with(|| a.name.cmp(&b.name))
    });
    sorted
}

/// How much a foal line is worth keeping.
pub fn foal_priority(foal: &Progeny, subject: HorseId) -> Priority {
    if foal.id == subject {
        return Priority::Required;
    }
    if foal.is_stakes_winner() {
        return Priority::VeryHigh;
    }
    let key_race = foal.races.as_ref().is_some_and(|r| r.key_races().next().is_some());
    if foal.award_winner || key_race {
        return Priority::High;
    }
    let starts = foal.starts();
    if (starts > 0 && foal.earnings / starts as f64 >= 2_500.0) || foal.conference_winner {
        return Priority::Medium;
    }
    if foal.earnings >= 10_000.0 || (foal.age >= 3 && foal.earnings > 0.0) || foal.wins > 0 {
        return Priority::Low;
    }
    if foal.age >= 5 {
        return Priority::VeryLow;
    }
    Priority::OnlyIfNeeded
}

fn foal_paragraph(input: &NarrativeInput<'_>, foal: &Progeny, as_above: bool) -> (Paragraph, Priority) {
    let mut priority = foal_priority(foal, input.subject.id);
    let mut p = Paragraph::new(input.width)
        .with_first_line_indent(FOAL_INDENT)
        .with_indent(HANGING_INDENT);

    p.add(foal_name(foal, ""));
    if as_above {
        p.add(" (as above).");
        return (p, priority);
    }
    add_foal_facts(&mut p, foal);
    p.add(format!(" ({}, by {}).", foal.gender.abbreviation(), foal.sire_name()));
    add_awards(&mut p, foal);
    if let Some(races) = &foal.races {
        add_key_races(&mut p, races);
    }

    if foal.gender.is_female() && foal.id != input.subject.id {
        let produce = input.broodmares.notable_foals(foal.id);
        let grand_produce = input.broodmares.notable_grandfoals(foal.id);
        if !produce.is_empty() {
            p.add(format!(" Dam of: {}.", notable_list(&produce)));
        }
        if !grand_produce.is_empty() {
            p.add(format!(" Granddam of: {}.", notable_list(&grand_produce)));
        }
        if !produce.is_empty() || !grand_produce.is_empty() {
            priority = priority.max(Priority::High);
        }
    }
    (p, priority)
}

/// Winners print in bold capitals.
fn foal_name(foal: &Progeny, lead: &str) -> Component {
    let text = format!("{lead}{}", foal.name);
    if foal.is_winner() {
        Component::bold(text).uppercase()
    } else {
        Component::new(text)
    }
}

fn add_foal_facts(p: &mut Paragraph, foal: &Progeny) {
    if let Some(mark) = foal.mark() {
        p.add(format!(" {mark}"));
    }
    if foal.earnings > 0.0 {
        p.add(format!(" ({})", format_money(foal.earnings)));
    }
}

fn add_awards(p: &mut Paragraph, foal: &Progeny) {
    if foal.award_winner {
        p.add(" Award winner.");
    }
    if foal.conference_winner {
        p.add(" Conference award winner.");
    }
}

/// "NAME mark ($X)" for each notable descendant.
fn notable_list(foals: &[&Progeny]) -> String {
    foals
        .iter()
        .map(|f| {
            let mut item = f.name.to_uppercase();
            if let Some(mark) = f.mark() {
                item.push_str(&format!(" {mark}"));
            }
            if f.earnings > 0.0 {
                item.push_str(&format!(" ({})", format_money(f.earnings)));
            }
            item
        })
        .collect::<Vec<_>>()
        .join(", ")
}

// ── Race citations ────────────────────────────────────────────────────────

fn add_record(p: &mut Paragraph, races: &RaceList) {
    let summary = races.summary();
    if summary.starts == 0 {
        return;
    }
    if summary.firsts > 0 {
        p.add(format!(
            " Winner of {}, {}.",
            plural(summary.firsts, "race"),
            format_money(summary.earnings)
        ));
    } else {
        p.add(format!(
            " {}, {}.",
            plural(summary.starts, "start"),
            format_money(summary.earnings)
        ));
    }
    add_key_races(p, races);
}

/// "Winner of A, B." then "Placed in C." from the first few key races.
fn add_key_races(p: &mut Paragraph, races: &RaceList) {
    let cited: Vec<&Race> = races.key_races().take(MAX_CITED_RACES).collect();
    let (won, placed): (Vec<&Race>, Vec<&Race>) = cited.into_iter().partition(|r| r.is_win());
    if !won.is_empty() {
        p.add(format!(" Winner of {}.", race_names(&won)));
    }
    if !placed.is_empty() {
        p.add(format!(" Placed in {}.", race_names(&placed)));
    }
}

fn race_names(races: &[&Race]) -> String {
    races.iter().map(|r| r.name.as_str()).collect::<Vec<_>>().join(", ")
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 { format!("1 {noun}") } else { format!("{n} {noun}s") }
}

// ── Trailing section ──────────────────────────────────────────────────────

/// Stud record plus notable progeny of a male subject.
fn sire_summary(input: &NarrativeInput<'_>) -> Vec<PrioritizedParagraph> {
    let progeny = input.subject_progeny;
    if progeny.is_empty() {
        return Vec::new();
    }
    let starters = progeny.iter().filter(|f| f.starts() > 0 || f.earnings > 0.0).count();
    let winners = progeny.iter().filter(|f| f.is_winner()).count();
    let earnings: f64 = progeny.iter().map(|f| f.earnings).sum();

    let mut summary = Paragraph::new(input.width).with_padding_top(SECTION_PADDING);
    summary.add(Component::bold("Sire of").uppercase());
    summary.add(format!(
        " {}, {}, {}.",
        plural(starters, "starter"),
        plural(winners, "winner"),
        format_money(earnings)
    ));
    let mut out = vec![PrioritizedParagraph::new(summary, Priority::VeryHigh, Role::Trailing)];

    let mut notable: Vec<&Progeny> = progeny
        .iter()
        .filter(|f| f.award_winner || f.conference_winner || f.is_stakes_winner() || f.earnings >= 50_000.0)
        .collect();
    notable.sort_by(|a, b| b.earnings.total_cmp(&a.earnings));
    for foal in notable.into_iter().take(MAX_NOTABLE_PROGENY) {
        let mut p = Paragraph::new(input.width)
            .with_first_line_indent(FOAL_INDENT)
            .with_indent(HANGING_INDENT);
        p.add(Component::bold(foal.name.clone()).uppercase());
        add_foal_facts(&mut p, foal);
        p.add(format!(" ({}).", foal.gender.abbreviation()));
        add_awards(&mut p, foal);
        if let Some(races) = &foal.races {
            add_key_races(&mut p, races);
        }
        out.push(PrioritizedParagraph::new(p, Priority::VeryHigh, Role::Trailing));
    }
    out
}

/// One line per foal of a female subject, oldest first.
fn production_record(input: &NarrativeInput<'_>) -> Vec<PrioritizedParagraph> {
    let mut foals: Vec<&Progeny> = input.subject_progeny.iter().collect();
    foals.sort_by(|a, b| b.age.cmp(&a.age).then_with(|| a.name.cmp(&b.name)));

    foals
        .into_iter()
        .map(|foal| {
            let mut p = Paragraph::new(input.width).with_indent(HANGING_INDENT);
            p.add(Component::italic(format!("{}:", birth_season(input.today, foal.age))));
            p.add(foal_name(foal, " "));
            add_foal_facts(&mut p, foal);
            p.add(format!(" ({}, by {}).", foal.gender.abbreviation(), foal.sire_name()));
            add_awards(&mut p, foal);
            let priority = if foal.is_winner() { Priority::High } else { Priority::Low };
            PrioritizedParagraph::new(p, priority, Role::Trailing)
        })
        .collect()
}

/// Season a foal of `age` age-years was born in, counting back three
/// months per age-year from `today`.
pub fn birth_season(today: NaiveDate, age: u32) -> String {
    let born = today
        .checked_sub_months(Months::new(age.saturating_mul(3)))
        .unwrap_or(today);
    let season = match born.month() {
        12 | 1 | 2 => "Winter",
        3..=5 => "Spring",
        6..=8 => "Summer",
        _ => "Fall",
    };
    format!("{season} {}", born.year())
}
