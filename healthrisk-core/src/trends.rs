//! History metrics for one subject in one domain
//!
//! Global invariants enforced:
//! - Records are read in ascending sequence order
//! - Metrics are derived, never stored
//! - `risk_change == latest - previous`; trend follows its sign

use crate::attribution::Domain;
use crate::risk::round_to;
use crate::store::StoredAssessment;
use serde::{Deserialize, Serialize};

/// Direction of the composite score over the last two assessments
///
/// A falling score is an improvement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Stable,
    Worsening,
}

impl TrendDirection {
    pub fn from_change(change: i64) -> Self {
        match change {
            c if c < 0 => TrendDirection::Improving,
            c if c > 0 => TrendDirection::Worsening,
            _ => TrendDirection::Stable,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Improving => "improving",
            TrendDirection::Stable => "stable",
            TrendDirection::Worsening => "worsening",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistorySummary {
    pub subject: String,
    pub domain: Domain,
    pub latest_risk_score: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_risk_score: Option<u32>,
    /// Mean composite score over every record, two decimals
    pub average_risk_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_change: Option<i64>,
    pub trend_direction: TrendDirection,
    pub total_assessments: usize,
    pub last_assessed_at: u64,
}

/// Summarize a subject's history; `None` when there are no records
///
/// `records` must belong to one subject and domain and be ordered oldest
/// first, as `AssessmentStore::history` returns them.
pub fn summarize_history(records: &[StoredAssessment]) -> Option<HistorySummary> {
    let latest = records.last()?;
    let previous = records.len().checked_sub(2).map(|i| &records[i]);

    let total: u64 = records
        .iter()
        .map(|r| u64::from(r.result.composite_score))
        .sum();
    let average = round_to(total as f64 / records.len() as f64, 2);

    let risk_change = previous.map(|p| {
        i64::from(latest.result.composite_score) - i64::from(p.result.composite_score)
    });

    Some(HistorySummary {
        subject: latest.subject.clone(),
        domain: latest.result.domain,
        latest_risk_score: latest.result.composite_score,
        previous_risk_score: previous.map(|p| p.result.composite_score),
        average_risk_score: average,
        risk_change,
        trend_direction: TrendDirection::from_change(risk_change.unwrap_or(0)),
        total_assessments: records.len(),
        last_assessed_at: latest.recorded_at,
    })
}

/// Render a summary as text
pub fn render_text(summary: &HistorySummary) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{} history for {} ({} assessments)\n",
        summary.domain, summary.subject, summary.total_assessments
    ));
    output.push_str(&format!("  latest:   {}\n", summary.latest_risk_score));
    match summary.previous_risk_score {
        Some(previous) => output.push_str(&format!("  previous: {previous}\n")),
        None => output.push_str("  previous: -\n"),
    }
    output.push_str(&format!("  average:  {:.2}\n", summary.average_risk_score));
    if let Some(change) = summary.risk_change {
        output.push_str(&format!("  change:   {change:+}\n"));
    }
    output.push_str(&format!("  trend:    {}\n", summary.trend_direction.as_str()));
    output
}
