//! Risk result model and level classification
//!
//! Global invariants enforced:
//! - `composite_score == min(raw_score, 100)`
//! - `raw_score == sum(category_subscores)`
//! - Percentages use the pre-cap subtotals over the capped composite,
//!   rounded to one decimal; all zero when the composite is zero
//! - Deterministic classification (contiguous, inclusive upper bounds)

use crate::attribution::{Attribution, Category, Domain, Tally};
use crate::input::{BmiCategory, CardiacInput, DiabetesInput};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Upper bound of the composite score
pub const SCORE_CAP: u32 = 100;

/// Risk level classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "Low Risk")]
    Low, // <= 25
    #[serde(rename = "Moderate Risk")]
    Moderate, // 26-50
    #[serde(rename = "High Risk")]
    High, // 51-75
    #[serde(rename = "Critical Risk")]
    Critical, // > 75
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low Risk",
            RiskLevel::Moderate => "Moderate Risk",
            RiskLevel::High => "High Risk",
            RiskLevel::Critical => "Critical Risk",
        }
    }

    /// High or Critical
    pub fn is_elevated(&self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::Critical)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a composite score
///
/// Inclusive upper bounds: 25 Low, 50 Moderate, 75 High, otherwise Critical
pub fn classify(score: u32) -> RiskLevel {
    match score {
        0..=25 => RiskLevel::Low,
        26..=50 => RiskLevel::Moderate,
        51..=75 => RiskLevel::High,
        _ => RiskLevel::Critical,
    }
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Each subtotal as a percentage of the capped composite
pub fn percentage_breakdown(
    subtotals: &BTreeMap<Category, u32>,
    composite: u32,
) -> BTreeMap<Category, f64> {
    subtotals
        .iter()
        .map(|(category, points)| {
            let pct = if composite > 0 {
                round_to(f64::from(*points) / f64::from(composite) * 100.0, 1)
            } else {
                0.0
            };
            (*category, pct)
        })
        .collect()
}

/// Metrics derived from the input while scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    /// Rounded to two decimals; absent when no body measurements were given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bmi: Option<f64>,
    pub bmi_category: BmiCategory,
}

/// The validated input a result was scored from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessedInput {
    Diabetes(DiabetesInput),
    Cardiac(CardiacInput),
}

impl AssessedInput {
    pub fn domain(&self) -> Domain {
        match self {
            AssessedInput::Diabetes(_) => Domain::Diabetes,
            AssessedInput::Cardiac(_) => Domain::Cardiac,
        }
    }
}

/// Output of one engine invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    pub domain: Domain,
    /// Capped to `SCORE_CAP`
    pub composite_score: u32,
    /// Sum of the category subscores before capping
    pub raw_score: u32,
    pub max_possible_score: u32,
    pub risk_level: RiskLevel,
    pub category_subscores: BTreeMap<Category, u32>,
    pub attribution: Attribution,
    pub percentage_breakdown: BTreeMap<Category, f64>,
    pub derived_metrics: DerivedMetrics,
    pub input: AssessedInput,
}

impl RiskResult {
    /// Cap, classify and normalize a finished tally
    pub fn from_tally(tally: Tally, derived_metrics: DerivedMetrics, input: AssessedInput) -> Self {
        let composite_score = tally.raw_score.min(SCORE_CAP);
        let percentage_breakdown = percentage_breakdown(&tally.subtotals, composite_score);

        RiskResult {
            domain: input.domain(),
            composite_score,
            raw_score: tally.raw_score,
            max_possible_score: tally.max_possible,
            risk_level: classify(composite_score),
            category_subscores: tally.subtotals,
            attribution: tally.attribution,
            percentage_breakdown,
            derived_metrics,
            input,
        }
    }

    /// Achieved points over the maximum possible, rounded to two decimals
    pub fn normalized_percentage(&self) -> f64 {
        if self.max_possible_score == 0 {
            return 0.0;
        }
        round_to(
            f64::from(self.raw_score) / f64::from(self.max_possible_score) * 100.0,
            2,
        )
    }

    pub fn subscore(&self, category: Category) -> u32 {
        self.category_subscores.get(&category).copied().unwrap_or(0)
    }

    pub fn percentage(&self, category: Category) -> f64 {
        self.percentage_breakdown.get(&category).copied().unwrap_or(0.0)
    }

    /// Points recorded for one factor, if the factor was assessed
    pub fn points(&self, category: Category, key: &str) -> Option<u32> {
        self.attribution
            .get(&category)
            .and_then(|entries| entries.get(key))
            .copied()
    }

    /// Category with the largest percentage (first in fixed order on ties)
    pub fn primary_category(&self) -> Category {
        let categories = self.domain.categories();
        let mut best = categories[0];
        for category in &categories[1..] {
            if self.percentage(*category) > self.percentage(best) {
                best = *category;
            }
        }
        best
    }
}
