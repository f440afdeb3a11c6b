//! Diabetes risk engine
//!
//! Three independently summed categories:
//! - immediate glycemic: glucose tier + trend
//! - treatment & symptoms: symptoms + medication + meal type
//! - baseline: diabetes status + age + BMI + family history + activity
//!
//! Global invariants enforced:
//! - Input is validated before any points are applied
//! - Every tiered rule is one exhaustive `match` (one tier per factor)
//! - Pure: no I/O, no shared state

use crate::attribution::{Accumulator, Category, Domain};
use crate::error::InputError;
use crate::input::{
    BmiCategory, DiabetesInput, DiabetesStatus, GlucoseContext, MealType, Medication,
    PhysicalActivity, Symptoms, Trend,
};
use crate::risk::{round_to, AssessedInput, DerivedMetrics, RiskResult};
use tracing::debug;

/// Attribution keys
pub mod keys {
    pub const GLUCOSE: &str = "glucose";
    pub const TREND: &str = "trend";
    pub const SYMPTOMS: &str = "symptoms";
    pub const MEDICATION: &str = "medication";
    pub const MEAL_TYPE: &str = "meal_type";
    pub const DIABETES_STATUS: &str = "diabetes_status";
    pub const AGE: &str = "age";
    pub const BMI: &str = "bmi";
    pub const FAMILY_HISTORY: &str = "family_history";
    pub const PHYSICAL_ACTIVITY: &str = "physical_activity";
}

const GLUCOSE_MAX: u32 = 25;
const TREND_MAX: u32 = 15;
const SYMPTOMS_MAX: u32 = 15;
const MEDICATION_MAX: u32 = 10;
const MEAL_MAX: u32 = 5;
const STATUS_MAX: u32 = 10;
const AGE_MAX: u32 = 5;
const BMI_MAX: u32 = 5;
const FAMILY_HISTORY_POINTS: u32 = 5;
const ACTIVITY_MAX: u32 = 5;

/// Glucose tier points (mg/dL)
///
/// Fasting: < 100 → 0, 100-125 → 8, 126-160 → 15, > 160 → 25
/// Post-meal: < 140 → 0, 140-180 → 8, 181-250 → 15, > 250 → 25
pub fn glucose_points(value: f64, context: GlucoseContext) -> u32 {
    let (normal, elevated, high) = match context {
        GlucoseContext::Fasting => (100.0, 125.0, 160.0),
        GlucoseContext::PostMeal => (140.0, 180.0, 250.0),
    };
    if value < normal {
        0
    } else if value <= elevated {
        8
    } else if value <= high {
        15
    } else {
        GLUCOSE_MAX
    }
}

pub fn trend_points(trend: Trend) -> u32 {
    match trend {
        Trend::Improving => 0,
        Trend::Stable => 5,
        Trend::Worsening => TREND_MAX,
    }
}

pub fn symptom_points(symptoms: Symptoms) -> u32 {
    match symptoms {
        Symptoms::None => 0,
        Symptoms::Mild => 8,
        Symptoms::Severe => SYMPTOMS_MAX,
    }
}

pub fn medication_points(medication: Medication) -> u32 {
    match medication {
        Medication::None => 0,
        Medication::Oral => 5,
        Medication::Insulin => MEDICATION_MAX,
    }
}

pub fn meal_points(meal: MealType) -> u32 {
    match meal {
        MealType::LowCarb => 0,
        MealType::Balanced => 2,
        MealType::HighCarb => MEAL_MAX,
    }
}

pub fn status_points(status: DiabetesStatus) -> u32 {
    match status {
        DiabetesStatus::NonDiabetic => 0,
        DiabetesStatus::Prediabetic => 4,
        DiabetesStatus::Type2 => 7,
        DiabetesStatus::Type1 => STATUS_MAX,
    }
}

/// < 30 → 0, 30-45 → 2, > 45 → 5
pub fn age_points(age: u32) -> u32 {
    match age {
        0..=29 => 0,
        30..=45 => 2,
        _ => AGE_MAX,
    }
}

pub fn bmi_points(category: BmiCategory) -> u32 {
    match category {
        BmiCategory::Underweight | BmiCategory::Normal => 0,
        BmiCategory::Overweight => 2,
        BmiCategory::Obese => BMI_MAX,
    }
}

pub fn activity_points(activity: PhysicalActivity) -> u32 {
    match activity {
        PhysicalActivity::Active => 0,
        PhysicalActivity::Sometimes => 2,
        PhysicalActivity::Never => ACTIVITY_MAX,
    }
}

/// Score a diabetes assessment
///
/// Numeric fields are re-checked so a hand-built `DiabetesInput` cannot
/// bypass validation; scoring is all-or-nothing.
pub fn score_diabetes(input: &DiabetesInput) -> Result<RiskResult, InputError> {
    input.validate()?;

    let bmi = input.bmi();
    let bmi_category = BmiCategory::from_bmi(bmi);

    let mut acc = Accumulator::new(&Domain::Diabetes.categories());

    let glycemic = Category::ImmediateGlycemic;
    acc.apply_tier(
        glycemic,
        keys::GLUCOSE,
        glucose_points(input.glucose_value, input.measurement_context),
        GLUCOSE_MAX,
    );
    acc.apply_tier(glycemic, keys::TREND, trend_points(input.trend), TREND_MAX);

    let treatment = Category::TreatmentSymptoms;
    acc.apply_tier(treatment, keys::SYMPTOMS, symptom_points(input.symptoms), SYMPTOMS_MAX);
    acc.apply_tier(
        treatment,
        keys::MEDICATION,
        medication_points(input.medication_type),
        MEDICATION_MAX,
    );
    acc.apply_tier(treatment, keys::MEAL_TYPE, meal_points(input.meal_type), MEAL_MAX);

    let baseline = Category::Baseline;
    acc.apply_tier(
        baseline,
        keys::DIABETES_STATUS,
        status_points(input.diabetes_status),
        STATUS_MAX,
    );
    acc.apply_tier(baseline, keys::AGE, age_points(input.age), AGE_MAX);
    acc.apply_tier(baseline, keys::BMI, bmi_points(bmi_category), BMI_MAX);
    acc.apply_flag(
        baseline,
        keys::FAMILY_HISTORY,
        input.family_history,
        FAMILY_HISTORY_POINTS,
    );
    acc.apply_tier(
        baseline,
        keys::PHYSICAL_ACTIVITY,
        activity_points(input.physical_activity),
        ACTIVITY_MAX,
    );

    let result = RiskResult::from_tally(
        acc.finish(),
        DerivedMetrics {
            bmi: Some(round_to(bmi, 2)),
            bmi_category,
        },
        AssessedInput::Diabetes(input.clone()),
    );

    debug!(
        domain = "diabetes",
        raw_score = result.raw_score,
        composite = result.composite_score,
        level = result.risk_level.as_str(),
        "scored assessment"
    );

    Ok(result)
}
