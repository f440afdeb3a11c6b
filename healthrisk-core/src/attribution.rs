//! Attribution accumulator
//!
//! Scoring state is an explicit value threaded through one engine call and
//! folded into a [`Tally`] at the end. Nothing is shared between calls.
//!
//! Global invariants enforced:
//! - `raw_score == sum(subtotals)` after every write
//! - Every subtotal equals the sum of its category's attribution entries
//! - Keys are unique within a category (a later write replaces the earlier one)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Assessment domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Diabetes,
    Cardiac,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Diabetes => "diabetes",
            Domain::Cardiac => "cardiac",
        }
    }

    /// Categories of this domain, in fixed tie-break order
    pub fn categories(&self) -> [Category; 3] {
        match self {
            Domain::Diabetes => [
                Category::ImmediateGlycemic,
                Category::TreatmentSymptoms,
                Category::Baseline,
            ],
            Domain::Cardiac => [Category::Immediate, Category::Lifestyle, Category::Baseline],
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk category a factor's points are attributed to
///
/// Declaration order is the order used for map iteration and tie-breaking:
/// immediate first, then treatment/lifestyle, then baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    ImmediateGlycemic,
    Immediate,
    TreatmentSymptoms,
    Lifestyle,
    Baseline,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::ImmediateGlycemic => "immediate_glycemic",
            Category::Immediate => "immediate",
            Category::TreatmentSymptoms => "treatment_symptoms",
            Category::Lifestyle => "lifestyle",
            Category::Baseline => "baseline",
        }
    }

    /// Plain-language name used in summaries and comparisons
    pub fn label(&self) -> &'static str {
        match self {
            Category::ImmediateGlycemic => "blood glucose levels",
            Category::Immediate => "heart symptoms",
            Category::TreatmentSymptoms => "treatment and symptoms",
            Category::Lifestyle => "lifestyle factors",
            Category::Baseline => "baseline health factors",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-factor points, grouped by category
pub type Attribution = BTreeMap<Category, BTreeMap<String, u32>>;

/// Final state of an accumulator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    /// Pre-cap sum of every applied factor
    pub raw_score: u32,
    /// Sum of the ceilings of every factor assessed through a tier table
    pub max_possible: u32,
    pub subtotals: BTreeMap<Category, u32>,
    pub attribution: Attribution,
}

/// Running composite total plus category/key attribution
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    total: u32,
    max_possible: u32,
    subtotals: BTreeMap<Category, u32>,
    attribution: Attribution,
}

impl Accumulator {
    /// Start with a zero subtotal for each category so every category shows
    /// up in the result even when nothing applies to it
    pub fn new(categories: &[Category]) -> Self {
        let mut acc = Accumulator::default();
        for category in categories {
            acc.subtotals.insert(*category, 0);
            acc.attribution.insert(*category, BTreeMap::new());
        }
        acc
    }

    /// Add `points` under `category`/`key` when `is_applicable`, otherwise
    /// record the key with zero points.
    ///
    /// A zero record never replaces an existing entry. An applicable write
    /// replaces whatever the key held before, and the totals follow.
    /// Tier exclusivity is the caller's job.
    pub fn apply(&mut self, category: Category, key: &str, is_applicable: bool, points: u32) {
        let entries = self.attribution.entry(category).or_default();
        let subtotal = self.subtotals.entry(category).or_insert(0);

        if !is_applicable {
            entries.entry(key.to_string()).or_insert(0);
            return;
        }

        if let Some(previous) = entries.insert(key.to_string(), points) {
            *subtotal -= previous;
            self.total -= previous;
        }
        *subtotal += points;
        self.total += points;
    }

    /// Record one factor resolved through a tier table.
    ///
    /// `points` is the tier the input fell into (zero included); `ceiling` is
    /// the highest tier of the table and feeds the maximum possible score.
    pub fn apply_tier(&mut self, category: Category, key: &str, points: u32, ceiling: u32) {
        debug_assert!(points <= ceiling);
        self.max_possible += ceiling;
        self.apply(category, key, true, points);
    }

    /// Record a yes/no factor worth `points` when present
    pub fn apply_flag(&mut self, category: Category, key: &str, present: bool, points: u32) {
        self.max_possible += points;
        self.apply(category, key, present, points);
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn finish(self) -> Tally {
        Tally {
            raw_score: self.total,
            max_possible: self.max_possible,
            subtotals: self.subtotals,
            attribution: self.attribution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_seeds_every_category() {
        let tally = Accumulator::new(&Domain::Cardiac.categories()).finish();
        assert_eq!(tally.raw_score, 0);
        assert_eq!(tally.subtotals.len(), 3);
        assert_eq!(tally.subtotals[&Category::Lifestyle], 0);
        assert!(tally.attribution[&Category::Immediate].is_empty());
    }

    #[test]
    fn test_apply_adds_points() {
        let mut acc = Accumulator::new(&Domain::Diabetes.categories());
        acc.apply(Category::ImmediateGlycemic, "glucose", true, 15);
        acc.apply(Category::ImmediateGlycemic, "trend", true, 5);
        acc.apply(Category::Baseline, "age", true, 2);
        assert_eq!(acc.total(), 22);

        let tally = acc.finish();
        assert_eq!(tally.subtotals[&Category::ImmediateGlycemic], 20);
        assert_eq!(tally.subtotals[&Category::Baseline], 2);
        assert_eq!(tally.attribution[&Category::ImmediateGlycemic]["trend"], 5);
    }

    #[test]
    fn test_inapplicable_records_zero() {
        let mut acc = Accumulator::new(&Domain::Cardiac.categories());
        acc.apply(Category::Lifestyle, "diabetes", false, 10);
        let tally = acc.finish();
        assert_eq!(tally.raw_score, 0);
        assert_eq!(tally.attribution[&Category::Lifestyle]["diabetes"], 0);
    }

    #[test]
    fn test_zero_record_does_not_clobber() {
        let mut acc = Accumulator::new(&Domain::Cardiac.categories());
        acc.apply(Category::Immediate, "chest_pain", true, 20);
        acc.apply(Category::Immediate, "chest_pain", false, 10);
        assert_eq!(acc.total(), 20);
        assert_eq!(acc.finish().attribution[&Category::Immediate]["chest_pain"], 20);
    }

    #[test]
    fn test_later_write_replaces_key_and_totals() {
        let mut acc = Accumulator::new(&Domain::Cardiac.categories());
        acc.apply(Category::Immediate, "chest_pain", true, 10);
        acc.apply(Category::Immediate, "chest_pain", true, 20);
        assert_eq!(acc.total(), 20);

        let tally = acc.finish();
        assert_eq!(tally.subtotals[&Category::Immediate], 20);
        assert_eq!(tally.attribution[&Category::Immediate].len(), 1);
    }

    #[test]
    fn test_max_possible_counts_ceilings_once() {
        let mut acc = Accumulator::new(&Domain::Diabetes.categories());
        acc.apply_tier(Category::ImmediateGlycemic, "glucose", 8, 25);
        acc.apply_tier(Category::ImmediateGlycemic, "trend", 0, 15);
        acc.apply_flag(Category::Baseline, "family_history", false, 5);

        let tally = acc.finish();
        assert_eq!(tally.max_possible, 45);
        assert_eq!(tally.raw_score, 8);
        assert_eq!(tally.attribution[&Category::ImmediateGlycemic]["trend"], 0);
    }

    #[test]
    fn test_category_order_is_fixed() {
        let diabetes = Domain::Diabetes.categories();
        assert_eq!(diabetes[0], Category::ImmediateGlycemic);
        assert_eq!(diabetes[2], Category::Baseline);
        assert!(Category::Immediate < Category::Lifestyle);
        assert!(Category::Lifestyle < Category::Baseline);
    }
}
