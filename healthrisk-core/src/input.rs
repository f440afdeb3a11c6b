//! Assessment inputs
//!
//! Two layers per domain:
//! - `*Record`: the wire form handed over by a boundary layer. Categorical
//!   fields are plain strings and every field may be absent.
//! - `*Input`: the typed, validated record the engines score. Categorical
//!   fields are closed enums, numeric fields have been checked.
//!
//! Global invariants enforced:
//! - Unknown categorical values are rejected, never defaulted
//! - Non-positive or non-finite numbers are rejected with the field name
//! - Validation happens once, before any scoring

use crate::error::InputError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest height (in metres) used for BMI, keeps the division defined
pub const MIN_HEIGHT_M: f64 = 0.1;

/// Declare a closed categorical field.
///
/// Variants are listed in ascending severity; the derived `Ord` relies on it.
macro_rules! categorical {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Wire field name used in validation errors
            pub const FIELD: &'static str = $field;
            /// Legal wire spellings, in severity order
            pub const VALUES: &'static [&'static str] = &[$($text),+];
            /// Every variant, in severity order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }

            /// Parse the canonical wire spelling
            pub fn parse(value: &str) -> Result<Self, InputError> {
                match value {
                    $($text => Ok($name::$variant),)+
                    _ => Err(InputError::UnknownValue {
                        field: $field,
                        value: value.to_string(),
                        expected: Self::VALUES,
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = InputError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

categorical! {
    /// When the glucose reading was taken
    GlucoseContext, "measurement_context" {
        Fasting => "fasting",
        PostMeal => "post-meal",
    }
}

categorical! {
    /// Direction of recent glucose readings
    Trend, "trend" {
        Improving => "improving",
        Stable => "stable",
        Worsening => "worsening",
    }
}

categorical! {
    Symptoms, "symptoms" {
        None => "none",
        Mild => "mild",
        Severe => "severe",
    }
}

categorical! {
    Medication, "medication_type" {
        None => "none",
        Oral => "oral",
        Insulin => "insulin",
    }
}

categorical! {
    MealType, "meal_type" {
        LowCarb => "low-carb",
        Balanced => "balanced",
        HighCarb => "high-carb",
    }
}

categorical! {
    DiabetesStatus, "diabetes_status" {
        NonDiabetic => "non-diabetic",
        Prediabetic => "prediabetic",
        Type2 => "type2",
        Type1 => "type1",
    }
}

categorical! {
    PhysicalActivity, "physical_activity" {
        Active => "active",
        Sometimes => "sometimes",
        Never => "never",
    }
}

categorical! {
    ChestPain, "chest_pain" {
        None => "none",
        Sometimes => "sometimes",
        Severe => "severe",
    }
}

categorical! {
    Breathlessness, "shortness_of_breath" {
        None => "none",
        Exertion => "exertion",
        Rest => "rest",
    }
}

categorical! {
    BloodPressure, "blood_pressure" {
        Normal => "normal",
        High => "high",
        VeryHigh => "very_high",
    }
}

categorical! {
    Smoking, "smoking" {
        Never => "never",
        Former => "former",
        Current => "current",
    }
}

categorical! {
    Diet, "diet" {
        Healthy => "healthy",
        Mixed => "mixed",
        HighFat => "high_fat",
    }
}

categorical! {
    /// WHO body-mass-index bands
    BmiCategory, "bmi_category" {
        Underweight => "underweight",
        Normal => "normal",
        Overweight => "overweight",
        Obese => "obese",
    }
}

impl BmiCategory {
    /// Classify a BMI value
    ///
    /// Bands: < 18.5 underweight, < 25 normal, < 30 overweight, otherwise obese
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }
}

/// Body mass index from weight (kg) and height (cm)
///
/// Height is clamped to `MIN_HEIGHT_M` so the result is always finite.
pub fn body_mass_index(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = (height_cm / 100.0).max(MIN_HEIGHT_M);
    weight_kg / (height_m * height_m)
}

fn require<T>(field: &'static str, value: Option<T>) -> Result<T, InputError> {
    value.ok_or(InputError::Missing { field })
}

fn require_category<T>(
    field: &'static str,
    value: Option<&str>,
    parse: fn(&str) -> Result<T, InputError>,
) -> Result<T, InputError> {
    parse(require(field, value)?)
}

fn check_positive(field: &'static str, value: f64) -> Result<f64, InputError> {
    if !value.is_finite() {
        return Err(InputError::NotFinite { field });
    }
    if value <= 0.0 {
        return Err(InputError::NonPositive { field, value });
    }
    Ok(value)
}

fn check_positive_int(field: &'static str, value: i64) -> Result<u32, InputError> {
    if value <= 0 {
        return Err(InputError::NonPositive {
            field,
            value: value as f64,
        });
    }
    u32::try_from(value).map_err(|_| InputError::OutOfRange {
        field,
        value,
        max: u32::MAX,
    })
}

/// Validated diabetes assessment input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DiabetesRecord")]
pub struct DiabetesInput {
    pub glucose_value: f64,
    pub measurement_context: GlucoseContext,
    pub trend: Trend,
    pub symptoms: Symptoms,
    pub medication_type: Medication,
    pub meal_type: MealType,
    pub diabetes_status: DiabetesStatus,
    pub age: u32,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub family_history: bool,
    pub physical_activity: PhysicalActivity,
}

impl DiabetesInput {
    /// Check numeric fields (categorical fields are valid by type)
    pub fn validate(&self) -> Result<(), InputError> {
        check_positive("glucose_value", self.glucose_value)?;
        check_positive_int("age", i64::from(self.age))?;
        check_positive("weight_kg", self.weight_kg)?;
        check_positive("height_cm", self.height_cm)?;
        Ok(())
    }

    pub fn bmi(&self) -> f64 {
        body_mass_index(self.weight_kg, self.height_cm)
    }

    pub fn bmi_category(&self) -> BmiCategory {
        BmiCategory::from_bmi(self.bmi())
    }
}

/// Wire form of a diabetes assessment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiabetesRecord {
    pub glucose_value: Option<f64>,
    pub measurement_context: Option<String>,
    pub trend: Option<String>,
    pub symptoms: Option<String>,
    pub medication_type: Option<String>,
    pub meal_type: Option<String>,
    pub diabetes_status: Option<String>,
    pub age: Option<i64>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub family_history: Option<bool>,
    pub physical_activity: Option<String>,
}

impl DiabetesRecord {
    /// Validate every field and build the typed input
    ///
    /// Fields are checked in declaration order; the first failure is returned.
    pub fn validate(&self) -> Result<DiabetesInput, InputError> {
        let input = DiabetesInput {
            glucose_value: check_positive(
                "glucose_value",
                require("glucose_value", self.glucose_value)?,
            )?,
            measurement_context: require_category(
                GlucoseContext::FIELD,
                self.measurement_context.as_deref(),
                GlucoseContext::parse,
            )?,
            trend: require_category(Trend::FIELD, self.trend.as_deref(), Trend::parse)?,
            symptoms: require_category(Symptoms::FIELD, self.symptoms.as_deref(), Symptoms::parse)?,
            medication_type: require_category(
                Medication::FIELD,
                self.medication_type.as_deref(),
                Medication::parse,
            )?,
            meal_type: require_category(MealType::FIELD, self.meal_type.as_deref(), MealType::parse)?,
            diabetes_status: require_category(
                DiabetesStatus::FIELD,
                self.diabetes_status.as_deref(),
                DiabetesStatus::parse,
            )?,
            age: check_positive_int("age", require("age", self.age)?)?,
            weight_kg: check_positive("weight_kg", require("weight_kg", self.weight_kg)?)?,
            height_cm: check_positive("height_cm", require("height_cm", self.height_cm)?)?,
            family_history: require("family_history", self.family_history)?,
            physical_activity: require_category(
                PhysicalActivity::FIELD,
                self.physical_activity.as_deref(),
                PhysicalActivity::parse,
            )?,
        };
        Ok(input)
    }
}

impl TryFrom<DiabetesRecord> for DiabetesInput {
    type Error = InputError;

    fn try_from(record: DiabetesRecord) -> Result<Self, Self::Error> {
        record.validate()
    }
}

/// Height and weight, when the caller supplied them
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyMeasurements {
    pub height_cm: f64,
    pub weight_kg: f64,
}

impl BodyMeasurements {
    pub fn bmi(&self) -> f64 {
        body_mass_index(self.weight_kg, self.height_cm)
    }

    /// Accept `category` only if it matches the one these measurements give
    pub fn check_category(&self, category: BmiCategory) -> Result<BmiCategory, InputError> {
        let derived = BmiCategory::from_bmi(self.bmi());
        if derived != category {
            return Err(InputError::Conflict {
                field: BmiCategory::FIELD,
                value: category.as_str(),
                derived: derived.as_str(),
            });
        }
        Ok(category)
    }
}

/// Validated cardiac assessment input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CardiacRecord")]
pub struct CardiacInput {
    pub chest_pain: ChestPain,
    pub shortness_of_breath: Breathlessness,
    pub heart_rate: Option<u32>,
    pub blood_pressure: BloodPressure,
    pub smoking: Smoking,
    pub physical_activity: PhysicalActivity,
    pub diet: Diet,
    pub diabetes: bool,
    pub age: u32,
    pub bmi_category: BmiCategory,
    pub family_history: bool,
    #[serde(flatten)]
    pub body: Option<BodyMeasurements>,
}

impl CardiacInput {
    /// Check numeric fields (categorical fields are valid by type)
    pub fn validate(&self) -> Result<(), InputError> {
        if let Some(rate) = self.heart_rate {
            check_positive_int("heart_rate", i64::from(rate))?;
        }
        check_positive_int("age", i64::from(self.age))?;
        if let Some(body) = &self.body {
            check_positive("height_cm", body.height_cm)?;
            check_positive("weight_kg", body.weight_kg)?;
            body.check_category(self.bmi_category)?;
        }
        Ok(())
    }

    /// BMI when height and weight were supplied
    pub fn bmi(&self) -> Option<f64> {
        self.body.as_ref().map(BodyMeasurements::bmi)
    }
}

/// Wire form of a cardiac assessment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardiacRecord {
    pub chest_pain: Option<String>,
    pub shortness_of_breath: Option<String>,
    pub heart_rate: Option<i64>,
    pub blood_pressure: Option<String>,
    pub smoking: Option<String>,
    pub physical_activity: Option<String>,
    pub diet: Option<String>,
    pub diabetes: Option<bool>,
    pub age: Option<i64>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub bmi_category: Option<String>,
    pub family_history: Option<bool>,
}

impl CardiacRecord {
    /// Validate every field and build the typed input
    ///
    /// BMI category resolution: an explicit `bmi_category` wins, otherwise it is
    /// derived from height and weight, otherwise it is `normal`.
    pub fn validate(&self) -> Result<CardiacInput, InputError> {
        let chest_pain = require_category(ChestPain::FIELD, self.chest_pain.as_deref(), ChestPain::parse)?;
        let shortness_of_breath = require_category(
            Breathlessness::FIELD,
            self.shortness_of_breath.as_deref(),
            Breathlessness::parse,
        )?;
        let heart_rate = self
            .heart_rate
            .map(|rate| check_positive_int("heart_rate", rate))
            .transpose()?;
        let blood_pressure = require_category(
            BloodPressure::FIELD,
            self.blood_pressure.as_deref(),
            BloodPressure::parse,
        )?;
        let smoking = require_category(Smoking::FIELD, self.smoking.as_deref(), Smoking::parse)?;
        let physical_activity = require_category(
            PhysicalActivity::FIELD,
            self.physical_activity.as_deref(),
            PhysicalActivity::parse,
        )?;
        let diet = require_category(Diet::FIELD, self.diet.as_deref(), Diet::parse)?;
        let age = check_positive_int("age", require("age", self.age)?)?;

        let body = match (self.height_cm, self.weight_kg) {
            (Some(height_cm), Some(weight_kg)) => Some(BodyMeasurements {
                height_cm: check_positive("height_cm", height_cm)?,
                weight_kg: check_positive("weight_kg", weight_kg)?,
            }),
            (Some(_), None) => return Err(InputError::Missing { field: "weight_kg" }),
            (None, Some(_)) => return Err(InputError::Missing { field: "height_cm" }),
            (None, None) => None,
        };

        let bmi_category = match (self.bmi_category.as_deref(), &body) {
            (Some(text), Some(body)) => body.check_category(BmiCategory::parse(text)?)?,
            (Some(text), None) => BmiCategory::parse(text)?,
            (None, Some(body)) => BmiCategory::from_bmi(body.bmi()),
            (None, None) => BmiCategory::Normal,
        };

        Ok(CardiacInput {
            chest_pain,
            shortness_of_breath,
            heart_rate,
            blood_pressure,
            smoking,
            physical_activity,
            diet,
            diabetes: self.diabetes.unwrap_or(false),
            age,
            bmi_category,
            family_history: self.family_history.unwrap_or(false),
            body,
        })
    }
}

impl TryFrom<CardiacRecord> for CardiacInput {
    type Error = InputError;

    fn try_from(record: CardiacRecord) -> Result<Self, Self::Error> {
        record.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diabetes_record() -> DiabetesRecord {
        DiabetesRecord {
            glucose_value: Some(210.0),
            measurement_context: Some("post-meal".to_string()),
            trend: Some("worsening".to_string()),
            symptoms: Some("mild".to_string()),
            medication_type: Some("oral".to_string()),
            meal_type: Some("high-carb".to_string()),
            diabetes_status: Some("type2".to_string()),
            age: Some(52),
            weight_kg: Some(82.0),
            height_cm: Some(168.0),
            family_history: Some(true),
            physical_activity: Some("never".to_string()),
        }
    }

    #[test]
    fn test_parse_canonical_spellings() {
        assert_eq!(GlucoseContext::parse("post-meal").unwrap(), GlucoseContext::PostMeal);
        assert_eq!(MealType::parse("low-carb").unwrap(), MealType::LowCarb);
        assert_eq!(DiabetesStatus::parse("type1").unwrap(), DiabetesStatus::Type1);
        assert_eq!(BloodPressure::parse("very_high").unwrap(), BloodPressure::VeryHigh);
        assert_eq!("high_fat".parse::<Diet>().unwrap(), Diet::HighFat);
    }

    #[test]
    fn test_parse_rejects_unknown_spelling() {
        let err = Trend::parse("rising").unwrap_err();
        assert_eq!(err.field(), "trend");
        assert!(matches!(err, InputError::UnknownValue { .. }));
        // No case folding: only canonical spellings are legal
        assert!(Symptoms::parse("Severe").is_err());
    }

    #[test]
    fn test_severity_ordering_follows_declaration() {
        assert!(Trend::Improving < Trend::Stable);
        assert!(Trend::Stable < Trend::Worsening);
        assert!(BmiCategory::Overweight < BmiCategory::Obese);
        assert_eq!(ChestPain::ALL.len(), 3);
    }

    #[test]
    fn test_bmi_category_bands() {
        assert_eq!(BmiCategory::from_bmi(18.4), BmiCategory::Underweight);
        assert_eq!(BmiCategory::from_bmi(18.5), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(24.99), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(25.0), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(29.99), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(30.0), BmiCategory::Obese);
    }

    #[test]
    fn test_bmi_clamps_tiny_height() {
        // 1 cm would give 0.01 m; clamped to 0.1 m
        let bmi = body_mass_index(10.0, 1.0);
        assert!((bmi - 1000.0).abs() < 1e-9);
        assert!(body_mass_index(70.0, 0.0).is_finite());
    }

    #[test]
    fn test_diabetes_record_validates() {
        let input = diabetes_record().validate().unwrap();
        assert_eq!(input.measurement_context, GlucoseContext::PostMeal);
        assert_eq!(input.age, 52);
        assert_eq!(input.bmi_category(), BmiCategory::Overweight);
    }

    #[test]
    fn test_diabetes_record_rejects_unknown_category() {
        let mut record = diabetes_record();
        record.medication_type = Some("injection".to_string());
        let err = record.validate().unwrap_err();
        assert_eq!(err.field(), "medication_type");
    }

    #[test]
    fn test_diabetes_record_rejects_missing_field() {
        let mut record = diabetes_record();
        record.trend = None;
        assert_eq!(record.validate().unwrap_err(), InputError::Missing { field: "trend" });
    }

    #[test]
    fn test_diabetes_record_rejects_non_positive_numbers() {
        let mut record = diabetes_record();
        record.height_cm = Some(0.0);
        assert_eq!(record.validate().unwrap_err().field(), "height_cm");

        let mut record = diabetes_record();
        record.age = Some(-3);
        assert_eq!(record.validate().unwrap_err().field(), "age");

        let mut record = diabetes_record();
        record.glucose_value = Some(f64::NAN);
        assert_eq!(
            record.validate().unwrap_err(),
            InputError::NotFinite { field: "glucose_value" }
        );
    }

    #[test]
    fn test_diabetes_input_deserializes_through_validation() {
        let json = r#"{
            "glucose_value": 90, "measurement_context": "fasting", "trend": "improving",
            "symptoms": "none", "medication_type": "none", "meal_type": "low-carb",
            "diabetes_status": "non-diabetic", "age": 25, "weight_kg": 65,
            "height_cm": 170, "family_history": false, "physical_activity": "active"
        }"#;
        let input: DiabetesInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.meal_type, MealType::LowCarb);

        let bad = json.replace("\"fasting\"", "\"before_meal\"");
        let err = serde_json::from_str::<DiabetesInput>(&bad).unwrap_err();
        assert!(err.to_string().contains("measurement_context"));
    }

    #[test]
    fn test_diabetes_input_serialization_round_trips() {
        let input = diabetes_record().validate().unwrap();
        let json = serde_json::to_string(&input).unwrap();
        assert!(json.contains("\"post-meal\""));
        let back: DiabetesInput = serde_json::from_str(&json).unwrap();
        assert_eq!(back, input);
    }

    #[test]
    fn test_cardiac_record_defaults() {
        let record = CardiacRecord {
            chest_pain: Some("none".to_string()),
            shortness_of_breath: Some("none".to_string()),
            blood_pressure: Some("normal".to_string()),
            smoking: Some("never".to_string()),
            physical_activity: Some("active".to_string()),
            diet: Some("healthy".to_string()),
            age: Some(35),
            ..CardiacRecord::default()
        };
        let input = record.validate().unwrap();
        assert_eq!(input.bmi_category, BmiCategory::Normal);
        assert!(!input.diabetes);
        assert!(!input.family_history);
        assert!(input.heart_rate.is_none());
        assert!(input.bmi().is_none());
    }

    #[test]
    fn test_cardiac_bmi_category_derived_from_body() {
        let record = CardiacRecord {
            chest_pain: Some("none".to_string()),
            shortness_of_breath: Some("none".to_string()),
            blood_pressure: Some("normal".to_string()),
            smoking: Some("never".to_string()),
            physical_activity: Some("active".to_string()),
            diet: Some("healthy".to_string()),
            age: Some(35),
            height_cm: Some(170.0),
            weight_kg: Some(95.0),
            ..CardiacRecord::default()
        };
        let input = record.validate().unwrap();
        assert_eq!(input.bmi_category, BmiCategory::Obese);

        let mut agreeing = record.clone();
        agreeing.bmi_category = Some("obese".to_string());
        assert_eq!(agreeing.validate().unwrap().bmi_category, BmiCategory::Obese);

        let mut contradicting = record.clone();
        contradicting.weight_kg = Some(110.0);
        contradicting.bmi_category = Some("normal".to_string());
        assert_eq!(
            contradicting.validate().unwrap_err(),
            InputError::Conflict {
                field: "bmi_category",
                value: "normal",
                derived: "obese",
            }
        );

        let mut half = record;
        half.weight_kg = None;
        assert_eq!(half.validate().unwrap_err(), InputError::Missing { field: "weight_kg" });
    }

    #[test]
    fn test_cardiac_record_rejects_zero_heart_rate() {
        let record = CardiacRecord {
            chest_pain: Some("none".to_string()),
            shortness_of_breath: Some("none".to_string()),
            heart_rate: Some(0),
            blood_pressure: Some("normal".to_string()),
            smoking: Some("never".to_string()),
            physical_activity: Some("active".to_string()),
            diet: Some("healthy".to_string()),
            age: Some(35),
            ..CardiacRecord::default()
        };
        assert_eq!(record.validate().unwrap_err().field(), "heart_rate");
    }

    #[test]
    fn test_oversized_integer_is_out_of_range() {
        let record = CardiacRecord {
            chest_pain: Some("none".to_string()),
            shortness_of_breath: Some("none".to_string()),
            heart_rate: Some(5_000_000_000),
            blood_pressure: Some("normal".to_string()),
            smoking: Some("never".to_string()),
            physical_activity: Some("active".to_string()),
            diet: Some("healthy".to_string()),
            age: Some(35),
            ..CardiacRecord::default()
        };
        assert!(matches!(
            record.validate().unwrap_err(),
            InputError::OutOfRange {
                field: "heart_rate",
                value: 5_000_000_000,
                ..
            }
        ));
    }
}
