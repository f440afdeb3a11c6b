//! Recommendations and lifestyle guidance
//!
//! Recommendations are derived strictly from attribution: no diagnosis and no
//! medication instructions. Guidance cards pair an issue with diet, exercise
//! and a practical tip.
//!
//! Global invariants enforced:
//! - Deterministic, side-effect free
//! - One generation pass; `recommend_priority` slices it by rank

use crate::attribution::{Category, Domain};
use crate::cardiac::keys as cardiac_keys;
use crate::diabetes::keys as diabetes_keys;
use crate::input::{BmiCategory, GlucoseContext};
use crate::report::{self, Statement};
use crate::risk::{AssessedInput, RiskLevel, RiskResult};
use serde::{Deserialize, Serialize};

/// Closing line of every recommendation set
pub const DISCLAIMER: &str =
    "These recommendations provide general health guidance and are not a medical diagnosis.";

/// Full recommendation set, in generation order
pub fn recommend(result: &RiskResult) -> Vec<String> {
    report::texts(&statements(result))
}

/// The `limit` most important recommendations, followed by the disclaimer
pub fn recommend_priority(result: &RiskResult, limit: usize) -> Vec<String> {
    report::select_priority(&statements(result), limit)
}

/// The ranked statements both views are cut from
pub fn statements(result: &RiskResult) -> Vec<Statement> {
    let mut out = Vec::new();
    match result.domain {
        Domain::Diabetes => diabetes_statements(result, &mut out),
        Domain::Cardiac => cardiac_statements(result, &mut out),
    }
    out.push(Statement::disclaimer(DISCLAIMER));
    out
}

fn diabetes_statements(result: &RiskResult, out: &mut Vec<Statement>) {
    let level = result.risk_level;

    let c = Category::ImmediateGlycemic;
    let glucose = result.points(c, diabetes_keys::GLUCOSE).unwrap_or(0);
    if glucose >= 15 {
        let context = match &result.input {
            AssessedInput::Diabetes(input) => Some(input.measurement_context),
            AssessedInput::Cardiac(_) => None,
        };
        out.push(Statement::factor(
            glucose,
            match context {
                Some(GlucoseContext::PostMeal) => "High post-meal glucose is a major contributor to your risk, suggesting difficulty processing dietary carbohydrates.",
                _ => "Elevated fasting glucose is a major contributor to your risk, indicating reduced overnight blood sugar regulation.",
            },
        ));
    } else if glucose > 0 {
        out.push(Statement::factor(
            glucose,
            "Borderline glucose levels benefit from consistent dietary and activity management.",
        ));
    }
    let trend = result.points(c, diabetes_keys::TREND).unwrap_or(0);
    out.push(Statement::factor(
        trend,
        match trend {
            0 => "Your improving glucose trend shows recent lifestyle or treatment efforts are working.",
            5 => "Your glucose trend is stable; consistent habits can strengthen that control.",
            _ => "Your glucose trend is worsening, so current lifestyle or treatment strategies may need adjustment.",
        },
    ));

    let c = Category::TreatmentSymptoms;
    match result.points(c, diabetes_keys::SYMPTOMS).unwrap_or(0) {
        0 => {}
        8 => out.push(Statement::factor(
            8,
            "Mild symptoms indicate ongoing glucose fluctuations that consistent management can improve.",
        )),
        points => out.push(Statement::factor(
            points,
            "Severe symptoms are contributing to your risk; regular monitoring and timely clinical review are important.",
        )),
    }
    if result.points(c, diabetes_keys::MEDICATION) == Some(0) && level.is_elevated() {
        // Untreated with elevated risk ranks with the heaviest factors
        out.push(Statement::factor(
            10,
            "No current medication alongside elevated risk suggests closer medical follow-up.",
        ));
    }
    let meal = result.points(c, diabetes_keys::MEAL_TYPE).unwrap_or(0);
    out.push(Statement::factor(
        meal,
        match meal {
            0 => "Low-carbohydrate meals are helping reduce glucose variability.",
            2 => "Balanced meals support glucose control; keep portions consistent.",
            _ => "High-carbohydrate meals drive glucose spikes; reducing refined carbohydrates can stabilize blood sugar.",
        },
    ));

    let c = Category::Baseline;
    let bmi = result.points(c, diabetes_keys::BMI).unwrap_or(0);
    if bmi > 0 {
        out.push(Statement::factor(
            bmi,
            "Body weight is influencing insulin sensitivity; gradual weight management can significantly reduce risk.",
        ));
    }
    let activity = result.points(c, diabetes_keys::PHYSICAL_ACTIVITY).unwrap_or(0);
    out.push(Statement::factor(
        activity,
        match activity {
            0 => "Your active lifestyle supports glucose control.",
            2 => "Inconsistent activity contributes to risk; a regular exercise routine improves glucose uptake.",
            _ => "Lack of physical activity contributes to insulin resistance; introduce regular light-to-moderate activity.",
        },
    ));
    let family = result.points(c, diabetes_keys::FAMILY_HISTORY).unwrap_or(0);
    if family > 0 {
        out.push(Statement::factor(
            family,
            "Family history increases susceptibility, making consistent preventive habits especially important.",
        ));
    }

    out.push(Statement::guidance(match level {
        RiskLevel::Low => "Your diabetes risk is currently low. Maintaining healthy routines protects you long term.",
        RiskLevel::Moderate => "Your diabetes risk is moderate. Preventive habits and regular monitoring can stop progression.",
        RiskLevel::High | RiskLevel::Critical => "Your overall diabetes risk is elevated. Consistent monitoring and sustained lifestyle improvements are strongly advised.",
    }));
}

fn cardiac_statements(result: &RiskResult, out: &mut Vec<Statement>) {
    let rules: [(Category, &str, &str); 11] = [
        (
            Category::Immediate,
            cardiac_keys::BLOOD_PRESSURE,
            "Blood pressure contributes to your cardiac risk; regular monitoring and less salt can help.",
        ),
        (
            Category::Immediate,
            cardiac_keys::HEART_RATE,
            "Heart rate patterns indicate cardiac strain; stress management and adequate rest help.",
        ),
        (
            Category::Immediate,
            cardiac_keys::CHEST_PAIN,
            "Chest discomfort contributes to risk; track symptoms and avoid physical overexertion.",
        ),
        (
            Category::Immediate,
            cardiac_keys::BREATHLESSNESS,
            "Shortness of breath adds to cardiac workload; pace activity gradually and keep monitoring it.",
        ),
        (
            Category::Lifestyle,
            cardiac_keys::SMOKING,
            "Smoking contributes significantly to cardiac risk; reducing or eliminating tobacco improves heart health.",
        ),
        (
            Category::Lifestyle,
            cardiac_keys::ACTIVITY,
            "Low or inconsistent activity affects heart strength; regular moderate exercise helps.",
        ),
        (
            Category::Lifestyle,
            cardiac_keys::DIET,
            "Dietary habits influence heart health; favour fruits, vegetables and healthy fats.",
        ),
        (
            Category::Lifestyle,
            cardiac_keys::DIABETES,
            "Diabetes increases cardiovascular strain; stable blood glucose helps protect the heart.",
        ),
        (
            Category::Baseline,
            cardiac_keys::BMI,
            "Body weight affects cardiac workload; gradual weight management reduces long-term strain.",
        ),
        (
            Category::Baseline,
            cardiac_keys::FAMILY_HISTORY,
            "Family history increases susceptibility to heart disease; preventive monitoring is especially important.",
        ),
        (
            Category::Baseline,
            cardiac_keys::AGE,
            "Age-related cardiovascular changes make regular checkups worthwhile.",
        ),
    ];
    for (category, key, text) in rules {
        if let Some(points) = result.points(category, key).filter(|p| *p > 0) {
            out.push(Statement::factor(points, text));
        }
    }

    out.push(Statement::guidance(match result.risk_level {
        RiskLevel::Low => "Overall cardiac risk is currently low. Consistent healthy habits help sustain this.",
        RiskLevel::Moderate => "Overall cardiac risk is moderate. Preventive lifestyle measures and periodic monitoring are advised.",
        RiskLevel::High | RiskLevel::Critical => "Overall cardiac risk is elevated. Consistent follow-up and sustained lifestyle improvements are important.",
    }));
}

/// Practical lifestyle card for one issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidanceCard {
    pub issue: String,
    pub diet: String,
    pub exercise: String,
    pub tip: String,
}

impl GuidanceCard {
    fn new(issue: &str, diet: &str, exercise: &str, tip: &str) -> Self {
        GuidanceCard {
            issue: issue.to_string(),
            diet: diet.to_string(),
            exercise: exercise.to_string(),
            tip: tip.to_string(),
        }
    }
}

/// Guidance cards for every issue the result shows
pub fn guidance(result: &RiskResult) -> Vec<GuidanceCard> {
    let mut cards = Vec::new();
    match &result.input {
        AssessedInput::Diabetes(_) => diabetes_cards(result, &mut cards),
        AssessedInput::Cardiac(_) => cardiac_cards(result, &mut cards),
    }
    cards
}

fn diabetes_cards(result: &RiskResult, cards: &mut Vec<GuidanceCard>) {
    let AssessedInput::Diabetes(input) = &result.input else {
        return;
    };
    let glucose = result
        .points(Category::ImmediateGlycemic, diabetes_keys::GLUCOSE)
        .unwrap_or(0);

    if glucose >= 15 {
        cards.push(match input.measurement_context {
            GlucoseContext::Fasting => GuidanceCard::new(
                "High fasting glucose",
                "Avoid late-night meals and reduce carbohydrates at dinner; prefer vegetables and lean protein.",
                "Add a 10-15 minute light walk after dinner.",
                "Consistent dinner timing helps stabilize overnight glucose.",
            ),
            GlucoseContext::PostMeal => GuidanceCard::new(
                "High post-meal glucose spike",
                "Reduce refined carbs and sugary foods; choose low-glycemic, high-fibre foods.",
                "Take a 10-20 minute walk after meals.",
                "Post-meal movement helps reduce glucose spikes.",
            ),
        });
    }
    if result.points(Category::ImmediateGlycemic, diabetes_keys::TREND) == Some(15) {
        cards.push(GuidanceCard::new(
            "Glucose levels worsening over time",
            "Keep meal timing consistent and avoid frequent snacking.",
            "Aim for at least 30 minutes of moderate activity daily.",
            "Consistency is more effective than intensity.",
        ));
    }
    if result.points(Category::TreatmentSymptoms, diabetes_keys::MEAL_TYPE) == Some(5) {
        cards.push(GuidanceCard::new(
            "High carbohydrate intake",
            "Replace refined carbs with whole grains, vegetables and protein-rich foods.",
            "Pair meals with light activity such as walking.",
            "Lower-carb meals reduce glucose fluctuations.",
        ));
    }
    if result.points(Category::Baseline, diabetes_keys::PHYSICAL_ACTIVITY) == Some(5) {
        cards.push(GuidanceCard::new(
            "Low physical activity",
            "Avoid excess calories and focus on portion control.",
            "Start with 15-20 minutes of walking daily and increase gradually.",
            "Even light movement improves insulin sensitivity.",
        ));
    }
    if matches!(
        result.derived_metrics.bmi_category,
        BmiCategory::Overweight | BmiCategory::Obese
    ) {
        cards.push(GuidanceCard::new(
            "Elevated body weight",
            "Focus on balanced meals with controlled portions and minimal processed food.",
            "Choose low-impact exercise like walking or cycling.",
            "Gradual weight loss improves glucose control.",
        ));
    }
    if result
        .points(Category::TreatmentSymptoms, diabetes_keys::SYMPTOMS)
        .unwrap_or(0)
        > 0
    {
        cards.push(GuidanceCard::new(
            "Symptoms related to glucose imbalance",
            "Avoid sugary foods and stay hydrated.",
            "Avoid strenuous exercise until glucose stabilizes.",
            "Monitor glucose closely and seek medical advice if symptoms persist.",
        ));
    }
}

fn cardiac_cards(result: &RiskResult, cards: &mut Vec<GuidanceCard>) {
    let points = |category: Category, key: &str| result.points(category, key).unwrap_or(0);

    if points(Category::Immediate, cardiac_keys::CHEST_PAIN) > 0 {
        cards.push(GuidanceCard::new(
            "Chest pain or discomfort",
            "Reduce sodium and avoid heavy meals.",
            "Avoid strenuous activity until cleared by a doctor.",
            "Seek immediate medical attention if chest pain worsens.",
        ));
    }
    if points(Category::Lifestyle, cardiac_keys::SMOKING) == 10 {
        cards.push(GuidanceCard::new(
            "Current smoking",
            "Eat more antioxidant-rich fruits and vegetables.",
            "Start with light walking to improve circulation.",
            "Quitting smoking is the most important step for heart health.",
        ));
    }
    if points(Category::Lifestyle, cardiac_keys::ACTIVITY) == 10 {
        cards.push(GuidanceCard::new(
            "Lack of physical activity",
            "Focus on heart-healthy foods like fish, nuts and vegetables.",
            "Start with 10-15 minutes of walking daily.",
            "Regular activity strengthens the heart muscle.",
        ));
    }
    if points(Category::Lifestyle, cardiac_keys::DIET) == 5 {
        cards.push(GuidanceCard::new(
            "High-fat diet",
            "Choose lean proteins and whole grains and limit saturated fats.",
            "Increase activity to help process dietary fats.",
            "Mediterranean-style eating is heart-protective.",
        ));
    }
    if points(Category::Baseline, cardiac_keys::BMI) > 0 {
        cards.push(GuidanceCard::new(
            "Elevated body weight",
            "Favour controlled portions and minimally processed food.",
            "Choose low-impact exercise like walking, swimming or cycling.",
            "Gradual weight loss lowers blood pressure and cardiac workload.",
        ));
    }
    if points(Category::Immediate, cardiac_keys::BLOOD_PRESSURE) > 0 {
        cards.push(GuidanceCard::new(
            "Elevated blood pressure",
            "Reduce sodium and increase potassium-rich foods.",
            "Regular moderate exercise helps lower blood pressure.",
            "Monitor blood pressure regularly and take medication as prescribed.",
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cardiac::score_cardiac;
    use crate::diabetes::score_diabetes;
    use crate::input::{
        BloodPressure, Breathlessness, CardiacInput, ChestPain, DiabetesInput, DiabetesStatus,
        Diet, MealType, Medication, PhysicalActivity, Smoking, Symptoms, Trend,
    };

    fn diabetes_input() -> DiabetesInput {
        DiabetesInput {
            glucose_value: 210.0,
            measurement_context: GlucoseContext::PostMeal,
            trend: Trend::Worsening,
            symptoms: Symptoms::Mild,
            medication_type: Medication::None,
            meal_type: MealType::HighCarb,
            diabetes_status: DiabetesStatus::Type2,
            age: 52,
            weight_kg: 82.0,
            height_cm: 168.0,
            family_history: true,
            physical_activity: PhysicalActivity::Never,
        }
    }

    fn cardiac_input() -> CardiacInput {
        CardiacInput {
            chest_pain: ChestPain::None,
            shortness_of_breath: Breathlessness::Exertion,
            heart_rate: Some(72),
            blood_pressure: BloodPressure::High,
            smoking: Smoking::Current,
            physical_activity: PhysicalActivity::Active,
            diet: Diet::Mixed,
            diabetes: false,
            age: 45,
            bmi_category: BmiCategory::Normal,
            family_history: false,
            body: None,
        }
    }

    #[test]
    fn test_diabetes_recommendations_end_with_disclaimer() {
        let result = score_diabetes(&diabetes_input()).unwrap();
        let recs = recommend(&result);
        assert_eq!(recs.last().map(String::as_str), Some(DISCLAIMER));
        assert!(recs[0].starts_with("High post-meal glucose"));
        assert!(recs.iter().any(|r| r.starts_with("No current medication")));
        assert!(recs.iter().any(|r| r.starts_with("Your overall diabetes risk is elevated")));
    }

    #[test]
    fn test_untreated_note_only_when_elevated() {
        let mut input = diabetes_input();
        input.glucose_value = 90.0;
        input.measurement_context = GlucoseContext::Fasting;
        input.trend = Trend::Improving;
        let result = score_diabetes(&input).unwrap();
        assert!(!result.risk_level.is_elevated());
        assert!(!recommend(&result)
            .iter()
            .any(|r| r.starts_with("No current medication")));
    }

    #[test]
    fn test_recommend_priority_limit() {
        let result = score_diabetes(&diabetes_input()).unwrap();
        let top = recommend_priority(&result, 3);
        assert_eq!(top.len(), 4);
        assert!(top[0].starts_with("High post-meal glucose"));
        assert!(top[1].starts_with("Your glucose trend is worsening"));
        assert_eq!(top[3], DISCLAIMER);
    }

    #[test]
    fn test_cardiac_recommendations_follow_attribution() {
        let result = score_cardiac(&cardiac_input()).unwrap();
        let recs = recommend(&result);
        assert!(recs[0].starts_with("Blood pressure"));
        assert!(recs.iter().any(|r| r.starts_with("Smoking")));
        assert!(recs.iter().any(|r| r.starts_with("Age-related")));
        assert!(!recs.iter().any(|r| r.starts_with("Chest discomfort")));
        assert!(recs
            .iter()
            .any(|r| r.starts_with("Overall cardiac risk is moderate")));
    }

    #[test]
    fn test_diabetes_guidance_cards() {
        let result = score_diabetes(&diabetes_input()).unwrap();
        let issues: Vec<String> = guidance(&result).into_iter().map(|c| c.issue).collect();
        assert_eq!(
            issues,
            vec![
                "High post-meal glucose spike",
                "Glucose levels worsening over time",
                "High carbohydrate intake",
                "Low physical activity",
                "Elevated body weight",
                "Symptoms related to glucose imbalance",
            ]
        );
    }

    #[test]
    fn test_cardiac_guidance_cards() {
        let result = score_cardiac(&cardiac_input()).unwrap();
        let issues: Vec<String> = guidance(&result).into_iter().map(|c| c.issue).collect();
        assert_eq!(issues, vec!["Current smoking", "Elevated blood pressure"]);
    }
}
