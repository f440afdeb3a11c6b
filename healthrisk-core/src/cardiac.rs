//! Cardiac risk engine
//!
//! Same shape as the diabetes engine with cardiac categories:
//! - immediate: chest pain, breathlessness, heart rate, blood pressure
//! - lifestyle: smoking, activity, diet, diabetes
//! - baseline: age, BMI category, family history
//!
//! Global invariants enforced:
//! - Input is validated before any points are applied
//! - Every tiered rule is one exhaustive `match`
//! - A missing heart rate contributes nothing and is not attributed

use crate::attribution::{Accumulator, Category, Domain};
use crate::error::InputError;
use crate::input::{
    BloodPressure, BmiCategory, Breathlessness, CardiacInput, ChestPain, Diet, PhysicalActivity,
    Smoking,
};
use crate::risk::{round_to, AssessedInput, DerivedMetrics, RiskResult};
use tracing::debug;

/// Attribution keys
pub mod keys {
    pub const CHEST_PAIN: &str = "chest_pain";
    pub const BREATHLESSNESS: &str = "breathlessness";
    pub const HEART_RATE: &str = "heart_rate";
    pub const BLOOD_PRESSURE: &str = "blood_pressure";
    pub const SMOKING: &str = "smoking";
    pub const ACTIVITY: &str = "activity";
    pub const DIET: &str = "diet";
    pub const DIABETES: &str = "diabetes";
    pub const AGE: &str = "age";
    pub const BMI: &str = "bmi";
    pub const FAMILY_HISTORY: &str = "family_history";
}

const CHEST_PAIN_MAX: u32 = 20;
const BREATH_MAX: u32 = 15;
const HEART_RATE_MAX: u32 = 10;
const BLOOD_PRESSURE_MAX: u32 = 10;
const SMOKING_MAX: u32 = 10;
const ACTIVITY_MAX: u32 = 10;
const DIET_MAX: u32 = 5;
const DIABETES_POINTS: u32 = 10;
const AGE_MAX: u32 = 10;
const BMI_MAX: u32 = 10;
const FAMILY_HISTORY_POINTS: u32 = 5;

pub fn chest_pain_points(pain: ChestPain) -> u32 {
    match pain {
        ChestPain::None => 0,
        ChestPain::Sometimes => 10,
        ChestPain::Severe => CHEST_PAIN_MAX,
    }
}

pub fn breath_points(breath: Breathlessness) -> u32 {
    match breath {
        Breathlessness::None => 0,
        Breathlessness::Exertion => 8,
        Breathlessness::Rest => BREATH_MAX,
    }
}

/// 100-120 bpm → 5, above 120 → 10
pub fn heart_rate_points(bpm: u32) -> u32 {
    match bpm {
        0..=99 => 0,
        100..=120 => 5,
        _ => HEART_RATE_MAX,
    }
}

pub fn blood_pressure_points(bp: BloodPressure) -> u32 {
    match bp {
        BloodPressure::Normal => 0,
        BloodPressure::High => 5,
        BloodPressure::VeryHigh => BLOOD_PRESSURE_MAX,
    }
}

pub fn smoking_points(smoking: Smoking) -> u32 {
    match smoking {
        Smoking::Never => 0,
        Smoking::Former => 5,
        Smoking::Current => SMOKING_MAX,
    }
}

pub fn activity_points(activity: PhysicalActivity) -> u32 {
    match activity {
        PhysicalActivity::Active => 0,
        PhysicalActivity::Sometimes => 5,
        PhysicalActivity::Never => ACTIVITY_MAX,
    }
}

pub fn diet_points(diet: Diet) -> u32 {
    match diet {
        Diet::Healthy => 0,
        Diet::Mixed => 3,
        Diet::HighFat => DIET_MAX,
    }
}

/// 40-55 → 5, above 55 → 10
pub fn age_points(age: u32) -> u32 {
    match age {
        0..=39 => 0,
        40..=55 => 5,
        _ => AGE_MAX,
    }
}

pub fn bmi_points(category: BmiCategory) -> u32 {
    match category {
        BmiCategory::Underweight | BmiCategory::Normal => 0,
        BmiCategory::Overweight => 5,
        BmiCategory::Obese => BMI_MAX,
    }
}

/// Score a cardiac assessment
pub fn score_cardiac(input: &CardiacInput) -> Result<RiskResult, InputError> {
    input.validate()?;

    let mut acc = Accumulator::new(&Domain::Cardiac.categories());

    let immediate = Category::Immediate;
    acc.apply_tier(
        immediate,
        keys::CHEST_PAIN,
        chest_pain_points(input.chest_pain),
        CHEST_PAIN_MAX,
    );
    acc.apply_tier(
        immediate,
        keys::BREATHLESSNESS,
        breath_points(input.shortness_of_breath),
        BREATH_MAX,
    );
    if let Some(bpm) = input.heart_rate {
        acc.apply_tier(immediate, keys::HEART_RATE, heart_rate_points(bpm), HEART_RATE_MAX);
    }
    acc.apply_tier(
        immediate,
        keys::BLOOD_PRESSURE,
        blood_pressure_points(input.blood_pressure),
        BLOOD_PRESSURE_MAX,
    );

    let lifestyle = Category::Lifestyle;
    acc.apply_tier(lifestyle, keys::SMOKING, smoking_points(input.smoking), SMOKING_MAX);
    acc.apply_tier(
        lifestyle,
        keys::ACTIVITY,
        activity_points(input.physical_activity),
        ACTIVITY_MAX,
    );
    acc.apply_tier(lifestyle, keys::DIET, diet_points(input.diet), DIET_MAX);
    acc.apply_flag(lifestyle, keys::DIABETES, input.diabetes, DIABETES_POINTS);

    let baseline = Category::Baseline;
    acc.apply_tier(baseline, keys::AGE, age_points(input.age), AGE_MAX);
    acc.apply_tier(baseline, keys::BMI, bmi_points(input.bmi_category), BMI_MAX);
    acc.apply_flag(
        baseline,
        keys::FAMILY_HISTORY,
        input.family_history,
        FAMILY_HISTORY_POINTS,
    );

    let result = RiskResult::from_tally(
        acc.finish(),
        DerivedMetrics {
            bmi: input.bmi().map(|bmi| round_to(bmi, 2)),
            bmi_category: input.bmi_category,
        },
        AssessedInput::Cardiac(input.clone()),
    );

    debug!(
        domain = "cardiac",
        raw_score = result.raw_score,
        composite = result.composite_score,
        level = result.risk_level.as_str(),
        "scored assessment"
    );

    Ok(result)
}
