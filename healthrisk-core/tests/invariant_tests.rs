//! Invariant Tests
//!
//! Properties that must hold for every valid input, checked with generated
//! inputs across both domains.

use healthrisk_core::delta::Direction;
use healthrisk_core::input::{
    BloodPressure, BmiCategory, Breathlessness, CardiacInput, ChestPain, DiabetesInput,
    DiabetesStatus, Diet, GlucoseContext, MealType, Medication, PhysicalActivity, Smoking,
    Symptoms, Trend,
};
use healthrisk_core::risk::{classify, SCORE_CAP};
use healthrisk_core::{compare, score_cardiac, score_diabetes, RiskLevel, RiskResult};
use proptest::prelude::*;
use proptest::sample::select;

fn diabetes_input() -> impl Strategy<Value = DiabetesInput> {
    (
        20.0f64..450.0,
        select(GlucoseContext::ALL),
        select(Trend::ALL),
        select(Symptoms::ALL),
        select(Medication::ALL),
        select(MealType::ALL),
        select(DiabetesStatus::ALL),
        1u32..100,
        30.0f64..180.0,
        120.0f64..210.0,
        any::<bool>(),
        select(PhysicalActivity::ALL),
    )
        .prop_map(
            |(
                glucose_value,
                measurement_context,
                trend,
                symptoms,
                medication_type,
                meal_type,
                diabetes_status,
                age,
                weight_kg,
                height_cm,
                family_history,
                physical_activity,
            )| DiabetesInput {
                glucose_value,
                measurement_context,
                trend,
                symptoms,
                medication_type,
                meal_type,
                diabetes_status,
                age,
                weight_kg,
                height_cm,
                family_history,
                physical_activity,
            },
        )
}

fn cardiac_input() -> impl Strategy<Value = CardiacInput> {
    (
        select(ChestPain::ALL),
        select(Breathlessness::ALL),
        proptest::option::of(40u32..200),
        select(BloodPressure::ALL),
        select(Smoking::ALL),
        select(PhysicalActivity::ALL),
        select(Diet::ALL),
        any::<bool>(),
        1u32..100,
        select(BmiCategory::ALL),
        any::<bool>(),
    )
        .prop_map(
            |(
                chest_pain,
                shortness_of_breath,
                heart_rate,
                blood_pressure,
                smoking,
                physical_activity,
                diet,
                diabetes,
                age,
                bmi_category,
                family_history,
            )| CardiacInput {
                chest_pain,
                shortness_of_breath,
                heart_rate,
                blood_pressure,
                smoking,
                physical_activity,
                diet,
                diabetes,
                age,
                bmi_category,
                family_history,
                body: None,
            },
        )
}

/// The next more severe value, if any
fn bump<T: Copy + PartialEq>(all: &[T], value: T) -> Option<T> {
    let index = all.iter().position(|v| *v == value)?;
    all.get(index + 1).copied()
}

fn check_result_shape(result: &RiskResult) {
    assert!(result.composite_score <= SCORE_CAP);
    assert_eq!(result.composite_score, result.raw_score.min(SCORE_CAP));
    assert_eq!(result.risk_level, classify(result.composite_score));

    let subtotal_sum: u32 = result.category_subscores.values().sum();
    assert_eq!(subtotal_sum, result.raw_score);

    for (category, factors) in &result.attribution {
        let attributed: u32 = factors.values().sum();
        assert_eq!(attributed, result.subscore(*category));
    }

    assert!(result.raw_score <= result.max_possible_score);

    if result.composite_score == 0 {
        assert!(result.percentage_breakdown.values().all(|p| *p == 0.0));
    } else if result.raw_score <= SCORE_CAP {
        let total: f64 = result.percentage_breakdown.values().sum();
        assert!((total - 100.0).abs() <= 0.3, "percentages sum to {total}");
    }
}

fn check_not_lower(base: &RiskResult, raised: &RiskResult) {
    assert!(
        raised.composite_score >= base.composite_score,
        "raising a factor lowered the score: {} -> {}",
        base.composite_score,
        raised.composite_score
    );
}

#[test]
fn test_level_thresholds() {
    let expected = [
        (0, RiskLevel::Low),
        (25, RiskLevel::Low),
        (26, RiskLevel::Moderate),
        (50, RiskLevel::Moderate),
        (51, RiskLevel::High),
        (75, RiskLevel::High),
        (76, RiskLevel::Critical),
        (100, RiskLevel::Critical),
    ];
    for (score, level) in expected {
        assert_eq!(classify(score), level, "score {score}");
    }
}

proptest! {
    #[test]
    fn diabetes_results_are_bounded_and_additive(input in diabetes_input()) {
        let result = score_diabetes(&input).unwrap();
        check_result_shape(&result);
        prop_assert_eq!(result.max_possible_score, 100);
    }

    #[test]
    fn cardiac_results_are_bounded_and_additive(input in cardiac_input()) {
        let result = score_cardiac(&input).unwrap();
        check_result_shape(&result);
        // an unrecorded heart rate contributes no ceiling
        let expected_max = if input.heart_rate.is_some() { 115 } else { 105 };
        prop_assert_eq!(result.max_possible_score, expected_max);
    }

    #[test]
    fn scoring_is_deterministic(input in cardiac_input()) {
        prop_assert_eq!(score_cardiac(&input).unwrap(), score_cardiac(&input).unwrap());
    }

    #[test]
    fn raising_a_diabetes_factor_never_lowers_the_score(
        input in diabetes_input(),
        glucose_step in 0.0f64..100.0,
        age_step in 0u32..40,
        weight_step in 0.0f64..40.0,
    ) {
        let base = score_diabetes(&input).unwrap();

        let mut raised = input.clone();
        raised.glucose_value += glucose_step;
        check_not_lower(&base, &score_diabetes(&raised).unwrap());

        let mut raised = input.clone();
        raised.age += age_step;
        check_not_lower(&base, &score_diabetes(&raised).unwrap());

        let mut raised = input.clone();
        raised.weight_kg += weight_step;
        check_not_lower(&base, &score_diabetes(&raised).unwrap());

        let mut raised = input.clone();
        raised.family_history = true;
        check_not_lower(&base, &score_diabetes(&raised).unwrap());

        if let Some(trend) = bump(Trend::ALL, input.trend) {
            let mut raised = input.clone();
            raised.trend = trend;
            check_not_lower(&base, &score_diabetes(&raised).unwrap());
        }
        if let Some(symptoms) = bump(Symptoms::ALL, input.symptoms) {
            let mut raised = input.clone();
            raised.symptoms = symptoms;
            check_not_lower(&base, &score_diabetes(&raised).unwrap());
        }
        if let Some(medication) = bump(Medication::ALL, input.medication_type) {
            let mut raised = input.clone();
            raised.medication_type = medication;
            check_not_lower(&base, &score_diabetes(&raised).unwrap());
        }
        if let Some(meal) = bump(MealType::ALL, input.meal_type) {
            let mut raised = input.clone();
            raised.meal_type = meal;
            check_not_lower(&base, &score_diabetes(&raised).unwrap());
        }
        if let Some(status) = bump(DiabetesStatus::ALL, input.diabetes_status) {
            let mut raised = input.clone();
            raised.diabetes_status = status;
            check_not_lower(&base, &score_diabetes(&raised).unwrap());
        }
        if let Some(activity) = bump(PhysicalActivity::ALL, input.physical_activity) {
            let mut raised = input.clone();
            raised.physical_activity = activity;
            check_not_lower(&base, &score_diabetes(&raised).unwrap());
        }
    }

    #[test]
    fn raising_a_cardiac_factor_never_lowers_the_score(
        input in cardiac_input(),
        rate_step in 0u32..60,
        age_step in 0u32..40,
    ) {
        let base = score_cardiac(&input).unwrap();

        if let Some(rate) = input.heart_rate {
            let mut raised = input.clone();
            raised.heart_rate = Some(rate + rate_step);
            check_not_lower(&base, &score_cardiac(&raised).unwrap());
        }

        let mut raised = input.clone();
        raised.age += age_step;
        check_not_lower(&base, &score_cardiac(&raised).unwrap());

        let mut raised = input.clone();
        raised.diabetes = true;
        raised.family_history = true;
        check_not_lower(&base, &score_cardiac(&raised).unwrap());

        if let Some(pain) = bump(ChestPain::ALL, input.chest_pain) {
            let mut raised = input.clone();
            raised.chest_pain = pain;
            check_not_lower(&base, &score_cardiac(&raised).unwrap());
        }
        if let Some(breath) = bump(Breathlessness::ALL, input.shortness_of_breath) {
            let mut raised = input.clone();
            raised.shortness_of_breath = breath;
            check_not_lower(&base, &score_cardiac(&raised).unwrap());
        }
        if let Some(bp) = bump(BloodPressure::ALL, input.blood_pressure) {
            let mut raised = input.clone();
            raised.blood_pressure = bp;
            check_not_lower(&base, &score_cardiac(&raised).unwrap());
        }
        if let Some(smoking) = bump(Smoking::ALL, input.smoking) {
            let mut raised = input.clone();
            raised.smoking = smoking;
            check_not_lower(&base, &score_cardiac(&raised).unwrap());
        }
        if let Some(diet) = bump(Diet::ALL, input.diet) {
            let mut raised = input.clone();
            raised.diet = diet;
            check_not_lower(&base, &score_cardiac(&raised).unwrap());
        }
        if let Some(bmi) = bump(BmiCategory::ALL, input.bmi_category) {
            let mut raised = input.clone();
            raised.bmi_category = bmi;
            check_not_lower(&base, &score_cardiac(&raised).unwrap());
        }
        if let Some(activity) = bump(PhysicalActivity::ALL, input.physical_activity) {
            let mut raised = input.clone();
            raised.physical_activity = activity;
            check_not_lower(&base, &score_cardiac(&raised).unwrap());
        }
    }

    #[test]
    fn comparison_delta_is_antisymmetric(a in diabetes_input(), b in diabetes_input()) {
        let a = score_diabetes(&a).unwrap();
        let b = score_diabetes(&b).unwrap();
        let ab = compare(&a, &b).unwrap();
        let ba = compare(&b, &a).unwrap();

        prop_assert_eq!(ab.delta, -ba.delta);
        prop_assert_eq!(ab.delta, i64::from(a.composite_score) - i64::from(b.composite_score));
        let expected = match ab.delta {
            d if d > 0 => Direction::Increased,
            d if d < 0 => Direction::Decreased,
            _ => Direction::NoChange,
        };
        prop_assert_eq!(ab.direction, expected);
        prop_assert_eq!(ab.field_changes.len(), ba.field_changes.len());
    }

    #[test]
    fn cardiac_comparison_delta_is_antisymmetric(a in cardiac_input(), b in cardiac_input()) {
        let a = score_cardiac(&a).unwrap();
        let b = score_cardiac(&b).unwrap();
        let ab = compare(&a, &b).unwrap();
        let ba = compare(&b, &a).unwrap();

        prop_assert_eq!(ab.delta, -ba.delta);
        prop_assert_eq!(ab.delta, i64::from(a.composite_score) - i64::from(b.composite_score));
        let expected = match ab.delta {
            d if d > 0 => Direction::Increased,
            d if d < 0 => Direction::Decreased,
            _ => Direction::NoChange,
        };
        prop_assert_eq!(ab.direction, expected);
        prop_assert_eq!(ab.field_changes.len(), ba.field_changes.len());
    }
}
