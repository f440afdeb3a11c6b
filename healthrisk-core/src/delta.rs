//! Comparison of an assessment against a prior one
//!
//! Global invariants enforced:
//! - `delta == current - previous`, so swapping arguments negates it
//! - Direction is the sign of `delta`
//! - Top category is the largest absolute percentage-point swing, first in
//!   fixed category order on ties
//! - Pure: no I/O, and a missing prior result is not an error

use crate::attribution::{Category, Domain};
use crate::error::CompareError;
use crate::input::{CardiacInput, DiabetesInput};
use crate::risk::{round_to, AssessedInput, RiskLevel, RiskResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

/// Sign of the score change
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Increased,
    Decreased,
    NoChange,
}

impl Direction {
    pub fn from_delta(delta: i64) -> Self {
        match delta {
            d if d > 0 => Direction::Increased,
            d if d < 0 => Direction::Decreased,
            _ => Direction::NoChange,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Increased => "increased",
            Direction::Decreased => "decreased",
            Direction::NoChange => "no_change",
        }
    }
}

/// Risk level change between the two assessments
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LevelTransition {
    pub from: RiskLevel,
    pub to: RiskLevel,
}

/// One input field whose value differs between the two assessments
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldChange {
    pub field: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparisonResult {
    pub domain: Domain,
    pub previous_score: u32,
    pub current_score: u32,
    pub delta: i64,
    pub direction: Direction,
    pub top_category: Category,
    /// Percentage-point change per category (current minus previous)
    pub category_swings: BTreeMap<Category, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_transition: Option<LevelTransition>,
    pub field_changes: Vec<FieldChange>,
    pub reasons: Vec<String>,
}

impl ComparisonResult {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize comparison to JSON")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("failed to deserialize comparison from JSON")
    }
}

/// Compare a current result against a previous one of the same domain
pub fn compare(current: &RiskResult, previous: &RiskResult) -> Result<ComparisonResult, CompareError> {
    if current.domain != previous.domain {
        return Err(CompareError::DomainMismatch {
            current: current.domain.as_str(),
            previous: previous.domain.as_str(),
        });
    }
    let domain = current.domain;

    let delta = i64::from(current.composite_score) - i64::from(previous.composite_score);
    let direction = Direction::from_delta(delta);

    let categories = domain.categories();
    let category_swings: BTreeMap<Category, f64> = categories
        .iter()
        .map(|c| (*c, round_to(current.percentage(*c) - previous.percentage(*c), 1)))
        .collect();

    let mut top_category = categories[0];
    for category in &categories[1..] {
        if category_swings[category].abs() > category_swings[&top_category].abs() {
            top_category = *category;
        }
    }

    let level_transition = (current.risk_level != previous.risk_level).then(|| LevelTransition {
        from: previous.risk_level,
        to: current.risk_level,
    });

    let mut changes = Vec::new();
    match (&current.input, &previous.input) {
        (AssessedInput::Diabetes(now), AssessedInput::Diabetes(before)) => {
            diabetes_changes(now, before, current, previous, &mut changes)
        }
        (AssessedInput::Cardiac(now), AssessedInput::Cardiac(before)) => {
            cardiac_changes(now, before, current, previous, &mut changes)
        }
        _ => {
            return Err(CompareError::DomainMismatch {
                current: current.input.domain().as_str(),
                previous: previous.input.domain().as_str(),
            })
        }
    }

    let mut reasons = vec![headline(
        delta,
        direction,
        top_category,
        category_swings[&top_category],
    )];
    reasons.extend(changes.iter().map(|c| c.sentence.clone()));

    Ok(ComparisonResult {
        domain,
        previous_score: previous.composite_score,
        current_score: current.composite_score,
        delta,
        direction,
        top_category,
        category_swings,
        level_transition,
        field_changes: changes.into_iter().map(|c| c.change).collect(),
        reasons,
    })
}

/// Compare against an optional prior result; `None` means nothing to compare
pub fn compare_with_previous(
    current: &RiskResult,
    previous: Option<&RiskResult>,
) -> Result<Option<ComparisonResult>, CompareError> {
    previous.map(|p| compare(current, p)).transpose()
}

fn headline(delta: i64, direction: Direction, top: Category, swing: f64) -> String {
    let points = delta.unsigned_abs();
    let unit = if points == 1 { "point" } else { "points" };
    if swing == 0.0 {
        return match direction {
            Direction::Increased => {
                format!("Risk increased by {points} {unit} with no category shifting its share of the score.")
            }
            Direction::Decreased => {
                format!("Risk decreased by {points} {unit} with no category shifting its share of the score.")
            }
            Direction::NoChange => {
                "Risk score is unchanged and no category shifted its share of the score.".to_string()
            }
        };
    }
    let shift = if swing > 0.0 { "grew" } else { "shrank" };
    match direction {
        Direction::Increased => format!(
            "Risk increased by {points} {unit}; the largest shift was in {} ({swing:+.1} percentage points).",
            top.label()
        ),
        Direction::Decreased => format!(
            "Risk decreased by {points} {unit}; the largest shift was in {} ({swing:+.1} percentage points).",
            top.label()
        ),
        Direction::NoChange => format!(
            "Risk score is unchanged, but the share from {} {shift} by {:.1} percentage points.",
            top.label(),
            swing.abs()
        ),
    }
}

struct Change {
    change: FieldChange,
    sentence: String,
}

fn push_if_changed<T: PartialEq + Display>(
    out: &mut Vec<Change>,
    field: &str,
    before: T,
    now: T,
) {
    if before != now {
        out.push(Change {
            sentence: format!("{field} changed from {before} to {now}."),
            change: FieldChange {
                field: field.to_string(),
                from: before.to_string(),
                to: now.to_string(),
            },
        });
    }
}

/// Numeric change with a gloss picked by the direction of movement
fn push_numeric(
    out: &mut Vec<Change>,
    field: &str,
    before: f64,
    now: f64,
    unit: &str,
    rising: &str,
    falling: &str,
) {
    if before == now {
        return;
    }
    let gloss = if now > before { rising } else { falling };
    out.push(Change {
        sentence: format!("{field} changed from {before}{unit} to {now}{unit}, {gloss}."),
        change: FieldChange {
            field: field.to_string(),
            from: before.to_string(),
            to: now.to_string(),
        },
    });
}

fn diabetes_changes(
    now: &DiabetesInput,
    before: &DiabetesInput,
    current: &RiskResult,
    previous: &RiskResult,
    out: &mut Vec<Change>,
) {
    push_if_changed(
        out,
        "Measurement context",
        before.measurement_context,
        now.measurement_context,
    );
    push_numeric(
        out,
        "Glucose",
        before.glucose_value,
        now.glucose_value,
        " mg/dL",
        "a higher reading that raises glycemic risk",
        "a lower reading that eases glycemic risk",
    );
    push_if_changed(out, "Trend", before.trend, now.trend);
    push_if_changed(out, "Symptoms", before.symptoms, now.symptoms);
    push_if_changed(out, "Medication", before.medication_type, now.medication_type);
    push_if_changed(out, "Meal type", before.meal_type, now.meal_type);
    push_if_changed(
        out,
        "Physical activity",
        before.physical_activity,
        now.physical_activity,
    );
    if let (Some(b), Some(n)) = (previous.derived_metrics.bmi, current.derived_metrics.bmi) {
        push_numeric(
            out,
            "BMI",
            b,
            n,
            "",
            "adding strain on insulin sensitivity",
            "easing strain on insulin sensitivity",
        );
    }
}

fn cardiac_changes(
    now: &CardiacInput,
    before: &CardiacInput,
    current: &RiskResult,
    previous: &RiskResult,
    out: &mut Vec<Change>,
) {
    push_if_changed(out, "Chest pain", before.chest_pain, now.chest_pain);
    push_if_changed(
        out,
        "Shortness of breath",
        before.shortness_of_breath,
        now.shortness_of_breath,
    );
    match (before.heart_rate, now.heart_rate) {
        (Some(b), Some(n)) => push_numeric(
            out,
            "Heart rate",
            f64::from(b),
            f64::from(n),
            " bpm",
            "raising cardiac workload",
            "easing cardiac workload",
        ),
        (b, n) => push_if_changed(out, "Heart rate", describe_rate(b), describe_rate(n)),
    }
    push_if_changed(out, "Blood pressure", before.blood_pressure, now.blood_pressure);
    push_if_changed(out, "Smoking", before.smoking, now.smoking);
    push_if_changed(
        out,
        "Physical activity",
        before.physical_activity,
        now.physical_activity,
    );
    push_if_changed(out, "Diet", before.diet, now.diet);
    push_if_changed(out, "BMI category", before.bmi_category, now.bmi_category);
    if let (Some(b), Some(n)) = (previous.derived_metrics.bmi, current.derived_metrics.bmi) {
        push_numeric(
            out,
            "BMI",
            b,
            n,
            "",
            "adding cardiac workload",
            "easing cardiac workload",
        );
    }
}

fn describe_rate(rate: Option<u32>) -> String {
    match rate {
        Some(bpm) => format!("{bpm} bpm"),
        None => "not recorded".to_string(),
    }
}
