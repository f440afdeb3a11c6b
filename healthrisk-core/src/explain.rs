//! Doctor-style explanation of a scored result
//!
//! Every factor bullet is chosen from the points recorded in the result's
//! attribution, never by re-scoring the input. The input is only consulted
//! for the reading to quote (glucose value, age).
//!
//! Global invariants enforced:
//! - Deterministic, side-effect free
//! - One generation pass; `explain_priority` slices it by rank

use crate::attribution::{Category, Domain};
use crate::cardiac::keys as cardiac_keys;
use crate::diabetes::keys as diabetes_keys;
use crate::input::{BmiCategory, GlucoseContext};
use crate::report::{self, Statement};
use crate::risk::{AssessedInput, RiskLevel, RiskResult};

/// Urgency qualifier by composite score: > 50, > 25, otherwise
pub fn urgency(score: u32) -> &'static str {
    if score > 50 {
        "Requires immediate attention"
    } else if score > 25 {
        "Needs monitoring"
    } else {
        "Well managed"
    }
}

/// One-line summary naming the largest category and the urgency
pub fn summarize(result: &RiskResult) -> String {
    if result.composite_score == 0 {
        return format!(
            "{} (Score: 0). No primary concern identified. {}.",
            result.risk_level,
            urgency(0)
        );
    }
    let primary = result.primary_category();
    format!(
        "{} (Score: {}). Primary concern: {} ({:.1}%). {}.",
        result.risk_level,
        result.composite_score,
        primary.label(),
        result.percentage(primary),
        urgency(result.composite_score)
    )
}

/// Full explanation, in reading order
pub fn explain(result: &RiskResult) -> Vec<String> {
    report::texts(&statements(result))
}

/// The `limit` most important explanation statements
pub fn explain_priority(result: &RiskResult, limit: usize) -> Vec<String> {
    report::select_priority(&statements(result), limit)
}

/// The ranked statements both views are cut from
pub fn statements(result: &RiskResult) -> Vec<Statement> {
    let mut out = Vec::new();
    match result.domain {
        Domain::Diabetes => diabetes_statements(result, &mut out),
        Domain::Cardiac => cardiac_statements(result, &mut out),
    }
    out
}

fn header(result: &RiskResult, category: Category, title: &str) -> Statement {
    Statement::header(format!(
        "{title} contribute {:.1}% of your risk:",
        result.percentage(category)
    ))
}

fn diabetes_statements(result: &RiskResult, out: &mut Vec<Statement>) {
    out.push(Statement::overall(format!(
        "Your overall diabetes risk is classified as {} with a score of {}.",
        result.risk_level, result.composite_score
    )));

    let (glucose_value, context, age) = match &result.input {
        AssessedInput::Diabetes(input) => (
            Some(input.glucose_value),
            Some(input.measurement_context),
            Some(input.age),
        ),
        AssessedInput::Cardiac(_) => (None, None, None),
    };

    let c = Category::ImmediateGlycemic;
    out.push(header(result, c, "Blood glucose factors"));
    let glucose = result.points(c, diabetes_keys::GLUCOSE).unwrap_or(0);
    if let (Some(value), Some(context)) = (glucose_value, context) {
        let when = match context {
            GlucoseContext::Fasting => "fasting",
            GlucoseContext::PostMeal => "post-meal",
        };
        let text = match glucose {
            0 => format!("Your {when} glucose of {value} mg/dL is within the normal range."),
            8 => format!(
                "Your {when} glucose of {value} mg/dL is borderline, a sign that insulin is becoming less effective."
            ),
            15 => format!(
                "Your {when} glucose of {value} mg/dL is high, showing your body is struggling to regulate blood sugar."
            ),
            _ => format!(
                "Your {when} glucose of {value} mg/dL is very high and is the strongest single driver of your risk."
            ),
        };
        out.push(Statement::factor(glucose, text));
    }
    let trend = result.points(c, diabetes_keys::TREND).unwrap_or(0);
    out.push(Statement::factor(
        trend,
        match trend {
            0 => "Your glucose trend is improving, so recent changes are helping your body manage blood sugar.",
            5 => "Your glucose trend is stable: control is being maintained, though not yet optimally.",
            _ => "Your glucose trend is worsening, meaning your body's ability to use insulin is declining over time.",
        },
    ));

    let c = Category::TreatmentSymptoms;
    out.push(header(result, c, "Treatment and symptoms"));
    let symptoms = result.points(c, diabetes_keys::SYMPTOMS).unwrap_or(0);
    out.push(Statement::factor(
        symptoms,
        match symptoms {
            0 => "You report no symptoms. Diabetes can still be silent while affecting blood vessels and organs.",
            8 => "Mild symptoms suggest blood sugar swings are starting to affect your energy and body functions.",
            _ => "Severe symptoms such as thirst, frequent urination or fatigue point to sustained high blood sugar.",
        },
    ));
    let medication = result.points(c, diabetes_keys::MEDICATION).unwrap_or(0);
    out.push(Statement::factor(
        medication,
        match medication {
            0 => "You are not on diabetes medication.",
            5 => "Oral medication indicates insulin resistance that needs pharmaceutical support.",
            _ => "Insulin therapy means your body cannot produce enough insulin on its own and carries a risk of low blood sugar episodes.",
        },
    ));
    let meal = result.points(c, diabetes_keys::MEAL_TYPE).unwrap_or(0);
    out.push(Statement::factor(
        meal,
        match meal {
            0 => "Your low-carb meals reduce the glucose load your body has to handle.",
            2 => "Balanced meals moderate blood sugar swings, though carbohydrates still need insulin to process.",
            _ => "High-carbohydrate meals spike blood sugar faster than your body can process it.",
        },
    ));

    let c = Category::Baseline;
    out.push(header(result, c, "Baseline health factors"));
    let status = result.points(c, diabetes_keys::DIABETES_STATUS).unwrap_or(0);
    out.push(Statement::factor(
        status,
        match status {
            0 => "You are currently non-diabetic; the remaining factors are about prevention.",
            4 => "Being prediabetic puts you at high risk of developing type 2 diabetes without intervention.",
            7 => "Type 2 diabetes means your cells resist insulin and your pancreas cannot fully compensate.",
            _ => "Type 1 diabetes means your pancreas no longer produces insulin, requiring lifelong replacement.",
        },
    ));
    if let Some(age) = age {
        let points = result.points(c, diabetes_keys::AGE).unwrap_or(0);
        let text = match points {
            0 => format!("Your age ({age}) is protective; insulin sensitivity is typically at its peak."),
            2 => format!("At {age}, age is becoming a minor factor as insulin efficiency gradually declines."),
            _ => format!("Age ({age}) adds risk because insulin production naturally declines over time."),
        };
        out.push(Statement::factor(points, text));
    }
    let bmi = result.points(c, diabetes_keys::BMI).unwrap_or(0);
    out.push(Statement::factor(
        bmi,
        match result.derived_metrics.bmi_category {
            BmiCategory::Underweight => "Being underweight does not raise diabetes risk the way excess weight does, but may point to other issues.",
            BmiCategory::Normal => "Your normal weight supports healthy insulin sensitivity.",
            BmiCategory::Overweight => "Being overweight makes cells more resistant to insulin.",
            BmiCategory::Obese => "Obesity causes chronic inflammation and severely impairs how your body uses insulin.",
        },
    ));
    let family = result.points(c, diabetes_keys::FAMILY_HISTORY).unwrap_or(0);
    out.push(Statement::factor(
        family,
        if family > 0 {
            "A family history of diabetes means you may have inherited a higher susceptibility."
        } else {
            "No family history of diabetes is protective."
        },
    ));
    let activity = result.points(c, diabetes_keys::PHYSICAL_ACTIVITY).unwrap_or(0);
    out.push(Statement::factor(
        activity,
        match activity {
            0 => "Your active lifestyle improves insulin sensitivity and glucose uptake.",
            2 => "Inconsistent activity limits the insulin benefit that regular exercise provides.",
            _ => "Lack of physical activity worsens insulin resistance.",
        },
    ));

    out.push(Statement::guidance(if result.risk_level == RiskLevel::Low {
        "Your low score shows diabetes risk is well managed. Keep up your current habits and regular monitoring."
    } else {
        "Many of these factors can improve with consistent lifestyle changes: regular exercise, lower-carb meals and gradual weight loss all reduce insulin resistance."
    }));
}

fn cardiac_statements(result: &RiskResult, out: &mut Vec<Statement>) {
    out.push(Statement::overall(format!(
        "Your cardiac risk is classified as {} with a score of {}.",
        result.risk_level, result.composite_score
    )));

    let c = Category::Immediate;
    out.push(header(result, c, "Immediate cardiac symptoms"));
    push_positive(out, result, c, cardiac_keys::CHEST_PAIN, |p| match p {
        20 => "Severe chest pain indicates significant cardiac stress and possible restricted blood flow to the heart.",
        _ => "Occasional chest pain suggests intermittent cardiac stress.",
    });
    push_positive(out, result, c, cardiac_keys::BREATHLESSNESS, |p| match p {
        15 => "Shortness of breath at rest suggests your heart is struggling to pump efficiently.",
        _ => "Shortness of breath on exertion shows your heart has trouble meeting higher oxygen demand.",
    });
    push_positive(out, result, c, cardiac_keys::HEART_RATE, |p| match p {
        10 => "A heart rate above 120 bpm forces your heart to work much harder.",
        _ => "A heart rate of 100-120 bpm indicates increased cardiac workload.",
    });
    push_positive(out, result, c, cardiac_keys::BLOOD_PRESSURE, |p| match p {
        10 => "Very high blood pressure damages artery walls and makes the heart pump against heavy resistance.",
        _ => "High blood pressure increases cardiac workload and speeds up artery damage.",
    });

    let c = Category::Lifestyle;
    out.push(header(result, c, "Lifestyle and medical factors"));
    push_positive(out, result, c, cardiac_keys::SMOKING, |p| match p {
        10 => "Current smoking damages blood vessels, promotes clots and reduces oxygen in the blood.",
        _ => "Past smoking left lasting cardiovascular effects, though quitting has lowered your ongoing risk.",
    });
    push_positive(out, result, c, cardiac_keys::ACTIVITY, |p| match p {
        10 => "Lack of physical activity weakens the heart and feeds other risk factors.",
        _ => "Inconsistent activity means your heart misses the regular exercise it needs.",
    });
    push_positive(out, result, c, cardiac_keys::DIET, |p| match p {
        5 => "A high-fat diet raises cholesterol and promotes plaque in the coronary arteries.",
        _ => "A mixed diet adds moderate risk through occasional high-fat meals.",
    });
    push_positive(out, result, c, cardiac_keys::DIABETES, |_| {
        "Diabetes accelerates artery damage through high glucose and inflammation."
    });

    let c = Category::Baseline;
    out.push(header(result, c, "Baseline health factors"));
    push_positive(out, result, c, cardiac_keys::AGE, |p| match p {
        10 => "Age above 55 raises risk as arteries stiffen and plaque accumulates.",
        _ => "Age between 40 and 55 begins to raise cardiac risk.",
    });
    push_positive(out, result, c, cardiac_keys::BMI, |p| match p {
        10 => "Obesity raises blood pressure and makes the heart supply a larger body mass.",
        _ => "Being overweight increases cardiac workload.",
    });
    push_positive(out, result, c, cardiac_keys::FAMILY_HISTORY, |_| {
        "A family history of heart disease indicates a genetic predisposition."
    });

    out.push(Statement::guidance(match result.risk_level {
        RiskLevel::Low => "Your low cardiac risk shows heart health is well managed. Keep exercising, eating well and attending routine checkups.",
        RiskLevel::Critical => "Your cardiac risk is critical and needs prompt medical evaluation.",
        RiskLevel::Moderate | RiskLevel::High => "Regular cardio exercise, a heart-healthy diet, avoiding tobacco and managing stress all help protect your cardiovascular system.",
    }));
}

/// Push a factor statement only when the factor contributed points
fn push_positive(
    out: &mut Vec<Statement>,
    result: &RiskResult,
    category: Category,
    key: &str,
    text: impl Fn(u32) -> &'static str,
) {
    if let Some(points) = result.points(category, key).filter(|p| *p > 0) {
        out.push(Statement::factor(points, text(points)));
    }
}
