//! healthrisk core library - explainable diabetes and cardiac risk scoring

// Global invariants enforced in this crate:
// - Scoring is a pure function of one validated input record
// - No global mutable state
// - Every point of a composite score is attributed to exactly one factor
// - Category, factor and statement ordering is fixed
// - Identical input yields byte-for-byte identical output

pub mod attribution;
pub mod cardiac;
pub mod config;
pub mod delta;
pub mod diabetes;
pub mod error;
pub mod explain;
pub mod input;
pub mod recommend;
pub mod report;
pub mod risk;
pub mod store;
pub mod trends;

pub use attribution::{Category, Domain};
pub use cardiac::score_cardiac;
pub use config::ResolvedConfig;
pub use delta::{compare, compare_with_previous, ComparisonResult};
pub use diabetes::score_diabetes;
pub use error::{CompareError, InputError};
pub use explain::{explain, summarize};
pub use input::{CardiacInput, CardiacRecord, DiabetesInput, DiabetesRecord};
pub use recommend::recommend;
pub use report::{render_json, render_text, AssessmentReport};
pub use risk::{AssessedInput, RiskLevel, RiskResult};
pub use store::{AssessmentStore, FileStore, MemoryStore, RecordId};

/// Which views of the generated statements go into a report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    /// Priority view size for the explanation (None: full explanation)
    pub explanation_limit: Option<usize>,
    /// Priority view size for recommendations (None: all recommendations)
    pub recommendation_limit: Option<usize>,
    pub include_disclaimer: bool,
    pub include_guidance: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            explanation_limit: None,
            recommendation_limit: None,
            include_disclaimer: true,
            include_guidance: true,
        }
    }
}

impl From<&ResolvedConfig> for ReportOptions {
    fn from(config: &ResolvedConfig) -> Self {
        ReportOptions {
            explanation_limit: config.explanation_limit,
            recommendation_limit: Some(config.recommendation_limit),
            include_disclaimer: config.include_disclaimer,
            include_guidance: true,
        }
    }
}

/// Score a validated input with the engine for its domain
pub fn score(input: &AssessedInput) -> Result<RiskResult, InputError> {
    match input {
        AssessedInput::Diabetes(input) => score_diabetes(input),
        AssessedInput::Cardiac(input) => score_cardiac(input),
    }
}

/// Assemble the full report for a scored result
///
/// `previous` is the subject's prior result in the same domain, if any.
pub fn build_report(
    result: RiskResult,
    previous: Option<&RiskResult>,
    options: &ReportOptions,
) -> Result<AssessmentReport, CompareError> {
    let comparison = compare_with_previous(&result, previous)?;

    let explanation_statements = explain::statements(&result);
    let explanation = match options.explanation_limit {
        Some(limit) => report::select_priority(&explanation_statements, limit),
        None => report::texts(&explanation_statements),
    };

    let mut recommendation_statements = recommend::statements(&result);
    if !options.include_disclaimer {
        recommendation_statements = report::without_disclaimer(recommendation_statements);
    }
    let recommendations = match options.recommendation_limit {
        Some(limit) => report::select_priority(&recommendation_statements, limit),
        None => report::texts(&recommendation_statements),
    };

    let guidance = if options.include_guidance {
        recommend::guidance(&result)
    } else {
        Vec::new()
    };

    Ok(AssessmentReport {
        subject: None,
        record_id: None,
        normalized_percentage: result.normalized_percentage(),
        summary: summarize(&result),
        explanation,
        recommendations,
        guidance,
        comparison,
        result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{
        BloodPressure, BmiCategory, Breathlessness, ChestPain, Diet, PhysicalActivity, Smoking,
    };

    fn cardiac(smoking: Smoking) -> RiskResult {
        score_cardiac(&CardiacInput {
            chest_pain: ChestPain::Sometimes,
            shortness_of_breath: Breathlessness::None,
            heart_rate: Some(72),
            blood_pressure: BloodPressure::High,
            smoking,
            physical_activity: PhysicalActivity::Sometimes,
            diet: Diet::Mixed,
            diabetes: false,
            age: 50,
            bmi_category: BmiCategory::Overweight,
            family_history: true,
            body: None,
        })
        .unwrap()
    }

    #[test]
    fn test_score_dispatches_on_domain() {
        let result = cardiac(Smoking::Never);
        let rescored = score(&result.input).unwrap();
        assert_eq!(rescored, result);
    }

    #[test]
    fn test_build_report_default_views() {
        let result = cardiac(Smoking::Current);
        let full_recs = recommend(&result);
        let report = build_report(result.clone(), None, &ReportOptions::default()).unwrap();

        assert_eq!(report.explanation, explain(&result));
        assert_eq!(report.recommendations, full_recs);
        assert_eq!(
            report.recommendations.last().map(String::as_str),
            Some(recommend::DISCLAIMER)
        );
        assert!(report.comparison.is_none());
        assert_eq!(report.summary, summarize(&result));
    }

    #[test]
    fn test_build_report_priority_views_without_disclaimer() {
        let result = cardiac(Smoking::Current);
        let options = ReportOptions {
            explanation_limit: Some(2),
            recommendation_limit: Some(1),
            include_disclaimer: false,
            include_guidance: false,
        };
        let report = build_report(result, None, &options).unwrap();
        assert_eq!(report.explanation.len(), 2);
        assert_eq!(report.recommendations.len(), 1);
        assert!(!report
            .recommendations
            .iter()
            .any(|r| r == recommend::DISCLAIMER));
        assert!(report.guidance.is_empty());
    }

    #[test]
    fn test_build_report_compares_with_previous() {
        let previous = cardiac(Smoking::Never);
        let current = cardiac(Smoking::Current);
        let report = build_report(current, Some(&previous), &ReportOptions::default()).unwrap();
        let cmp = report.comparison.unwrap();
        assert_eq!(cmp.delta, 10);
        assert_eq!(cmp.top_category, Category::Lifestyle);
    }

    #[test]
    fn test_options_from_resolved_config() {
        let config = ResolvedConfig::defaults(std::path::Path::new("/p")).unwrap();
        let options = ReportOptions::from(&config);
        assert_eq!(options.recommendation_limit, Some(3));
        assert_eq!(options.explanation_limit, None);
        assert!(options.include_disclaimer);
    }
}
