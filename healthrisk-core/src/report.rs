//! Ranked statements and assessment rendering
//!
//! Explanations and recommendations are generated in a single pass that tags
//! each statement with a kind and a priority. The full and the priority views
//! are both slices of that pass.
//!
//! Global invariants enforced:
//! - Deterministic output ordering
//! - Priority selection is stable (ties keep generation order)

use crate::attribution::Category;
use crate::delta::ComparisonResult;
use crate::recommend::GuidanceCard;
use crate::risk::RiskResult;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// What a generated statement is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    /// Overall risk statement
    Overall,
    /// Category heading
    Header,
    /// Driven by one attributed factor
    Factor,
    /// Closing guidance chosen by risk level
    Guidance,
    Disclaimer,
}

/// One generated sentence with its rank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub kind: StatementKind,
    /// Higher is more important
    pub priority: u32,
    pub text: String,
}

const OVERALL_PRIORITY: u32 = 1000;
const FACTOR_BASE_PRIORITY: u32 = 100;
const GUIDANCE_PRIORITY: u32 = 50;
const PROTECTIVE_PRIORITY: u32 = 10;

impl Statement {
    pub fn overall(text: impl Into<String>) -> Self {
        Statement {
            kind: StatementKind::Overall,
            priority: OVERALL_PRIORITY,
            text: text.into(),
        }
    }

    pub fn header(text: impl Into<String>) -> Self {
        Statement {
            kind: StatementKind::Header,
            priority: 0,
            text: text.into(),
        }
    }

    /// Factor statement ranked by the points its factor contributed
    ///
    /// Zero-point (protective) factors rank below the closing guidance.
    pub fn factor(points: u32, text: impl Into<String>) -> Self {
        let priority = if points > 0 {
            FACTOR_BASE_PRIORITY + points
        } else {
            PROTECTIVE_PRIORITY
        };
        Statement {
            kind: StatementKind::Factor,
            priority,
            text: text.into(),
        }
    }

    pub fn guidance(text: impl Into<String>) -> Self {
        Statement {
            kind: StatementKind::Guidance,
            priority: GUIDANCE_PRIORITY,
            text: text.into(),
        }
    }

    pub fn disclaimer(text: impl Into<String>) -> Self {
        Statement {
            kind: StatementKind::Disclaimer,
            priority: 0,
            text: text.into(),
        }
    }
}

/// Every statement's text, in generation order
pub fn texts(statements: &[Statement]) -> Vec<String> {
    statements.iter().map(|s| s.text.clone()).collect()
}

/// The `limit` highest-priority statements, most important first
///
/// Headers are structural and never selected. A disclaimer, when present, is
/// appended after the selection and does not count toward `limit`.
pub fn select_priority(statements: &[Statement], limit: usize) -> Vec<String> {
    let mut ranked: Vec<&Statement> = statements
        .iter()
        .filter(|s| !matches!(s.kind, StatementKind::Header | StatementKind::Disclaimer))
        .collect();
    ranked.sort_by(|a, b| b.priority.cmp(&a.priority));

    let mut selected: Vec<String> = ranked
        .into_iter()
        .take(limit)
        .map(|s| s.text.clone())
        .collect();
    selected.extend(
        statements
            .iter()
            .filter(|s| s.kind == StatementKind::Disclaimer)
            .map(|s| s.text.clone()),
    );
    selected
}

/// Drop disclaimer statements
pub fn without_disclaimer(statements: Vec<Statement>) -> Vec<Statement> {
    statements
        .into_iter()
        .filter(|s| s.kind != StatementKind::Disclaimer)
        .collect()
}

/// Everything produced for one assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    pub result: RiskResult,
    pub normalized_percentage: f64,
    pub summary: String,
    pub explanation: Vec<String>,
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub guidance: Vec<GuidanceCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ComparisonResult>,
}

/// Render a report as text
pub fn render_text(report: &AssessmentReport) -> String {
    let result = &report.result;
    let mut output = String::new();

    if let Some(subject) = &report.subject {
        output.push_str(&format!("Subject: {subject}\n"));
    }
    output.push_str(&format!(
        "{} risk: {} / 100 ({})\n",
        capitalize(result.domain.as_str()),
        result.composite_score,
        result.risk_level
    ));
    if result.raw_score > result.composite_score {
        output.push_str(&format!("Raw score {} capped at 100\n", result.raw_score));
    }
    output.push_str(&format!(
        "Normalized: {:.2}% of {} possible points\n",
        report.normalized_percentage, result.max_possible_score
    ));
    if let Some(bmi) = result.derived_metrics.bmi {
        output.push_str(&format!(
            "BMI: {:.2} ({})\n",
            bmi, result.derived_metrics.bmi_category
        ));
    } else {
        output.push_str(&format!("BMI category: {}\n", result.derived_metrics.bmi_category));
    }
    output.push('\n');

    output.push_str(&format!("{:<20} {:>6} {:>7}\n", "CATEGORY", "POINTS", "SHARE"));
    for category in result.domain.categories() {
        output.push_str(&category_row(result, category));
    }
    output.push('\n');

    output.push_str(&format!("Summary: {}\n", report.summary));

    push_section(&mut output, "Explanation", &report.explanation);
    push_section(&mut output, "Recommendations", &report.recommendations);

    if !report.guidance.is_empty() {
        output.push_str("\nGuidance:\n");
        for card in &report.guidance {
            output.push_str(&format!("  {}\n", card.issue));
            output.push_str(&format!("    diet:     {}\n", card.diet));
            output.push_str(&format!("    exercise: {}\n", card.exercise));
            output.push_str(&format!("    tip:      {}\n", card.tip));
        }
    }

    if let Some(cmp) = &report.comparison {
        output.push_str(&format!(
            "\nCompared with previous: {} -> {} ({:+})\n",
            cmp.previous_score, cmp.current_score, cmp.delta
        ));
        for reason in &cmp.reasons {
            output.push_str(&format!("  - {reason}\n"));
        }
    }

    if let Some(id) = &report.record_id {
        output.push_str(&format!("\nSaved as {id}\n"));
    }

    output
}

/// Render a report as pretty JSON
pub fn render_json(report: &AssessmentReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize report to JSON")
}

fn category_row(result: &RiskResult, category: Category) -> String {
    format!(
        "{:<20} {:>6} {:>6.1}%\n",
        category.as_str(),
        result.subscore(category),
        result.percentage(category)
    )
}

fn push_section(output: &mut String, title: &str, lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    output.push_str(&format!("\n{title}:\n"));
    for line in lines {
        output.push_str(&format!("  {line}\n"));
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
