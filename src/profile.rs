//! User profile and derived physiological metrics
//!
//! Raw inputs live in [`ProfileInputs`]; [`UserProfile`] owns them together
//! with the derived metrics (BMI, BMR, max heart rate) and recomputes the
//! latter on every change, so the two can never drift apart.
//!
//! The simulation never fails on an incomplete profile. Missing values
//! fall back to population defaults through the `*_or_default` accessors.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::ProfileError;
use crate::models::{ActivityLevel, Gender};

/// Weight assumed when the profile has none (kg)
pub const DEFAULT_WEIGHT_KG: f64 = 70.0;

/// Max heart rate assumed when age is unknown (bpm)
pub const DEFAULT_MAX_HEART_RATE: u16 = 190;

/// BMR assumed for calorie estimates when it cannot be derived
pub const DEFAULT_BMR: i32 = 1500;

const AGE_RANGE: (u32, u32) = (10, 100);
const WEIGHT_RANGE: (f64, f64) = (30.0, 300.0);
const HEIGHT_RANGE: (f64, f64) = (100.0, 250.0);

/// Raw, user-entered profile values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileInputs {
    pub name: String,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
    #[serde(default)]
    pub fitness_goals: BTreeSet<String>,
    #[serde(default)]
    pub medical_conditions: BTreeSet<String>,
}

/// Metrics derived from the profile inputs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    /// Body mass index, one decimal place
    pub bmi: Option<Decimal>,
    /// Basal metabolic rate (kcal/day), Mifflin-St Jeor
    pub bmr: Option<i32>,
    /// Age-predicted maximum heart rate (220 - age)
    pub max_heart_rate: Option<u16>,
}

impl DerivedMetrics {
    pub fn compute(inputs: &ProfileInputs) -> Self {
        let bmi = match (inputs.weight_kg, inputs.height_cm) {
            (Some(weight), Some(height)) if height > 0.0 => {
                let height_m = height / 100.0;
                Decimal::from_f64(weight / (height_m * height_m)).map(|bmi| bmi.round_dp(1))
            }
            _ => None,
        };

        let bmr = match (inputs.weight_kg, inputs.height_cm, inputs.age) {
            (Some(weight), Some(height), Some(age)) => {
                let base = 10.0 * weight + 6.25 * height - 5.0 * f64::from(age);
                let adjustment = if inputs.gender == Some(Gender::Male) { 5.0 } else { -161.0 };
                Some((base + adjustment).round() as i32)
            }
            _ => None,
        };

        let max_heart_rate = inputs
            .age
            .filter(|age| *age > 0 && *age < 220)
            .map(|age| (220 - age) as u16);

        Self {
            bmi,
            bmr,
            max_heart_rate,
        }
    }
}

/// A user profile whose derived metrics always match its inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ProfileInputs", into = "ProfileInputs")]
pub struct UserProfile {
    inputs: ProfileInputs,
    derived: DerivedMetrics,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self::new(ProfileInputs::default())
    }
}

impl From<ProfileInputs> for UserProfile {
    fn from(inputs: ProfileInputs) -> Self {
        Self::new(inputs)
    }
}

impl From<UserProfile> for ProfileInputs {
    fn from(profile: UserProfile) -> Self {
        profile.inputs
    }
}

impl UserProfile {
    pub fn new(inputs: ProfileInputs) -> Self {
        let derived = DerivedMetrics::compute(&inputs);
        Self { inputs, derived }
    }

    pub fn inputs(&self) -> &ProfileInputs {
        &self.inputs
    }

    pub fn derived(&self) -> &DerivedMetrics {
        &self.derived
    }

    /// Apply several input changes, then recompute derived metrics once
    pub fn update<F>(&mut self, apply: F)
    where
        F: FnOnce(&mut ProfileInputs),
    {
        apply(&mut self.inputs);
        self.recompute();
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.inputs.name = name.into();
    }

    pub fn set_age(&mut self, age: Option<u32>) {
        self.update(|inputs| inputs.age = age);
    }

    pub fn set_gender(&mut self, gender: Option<Gender>) {
        self.update(|inputs| inputs.gender = gender);
    }

    pub fn set_weight_kg(&mut self, weight_kg: Option<f64>) {
        self.update(|inputs| inputs.weight_kg = weight_kg);
    }

    pub fn set_height_cm(&mut self, height_cm: Option<f64>) {
        self.update(|inputs| inputs.height_cm = height_cm);
    }

    pub fn set_activity_level(&mut self, level: Option<ActivityLevel>) {
        self.inputs.activity_level = level;
    }

    pub fn add_fitness_goal(&mut self, goal: impl Into<String>) {
        self.inputs.fitness_goals.insert(goal.into());
    }

    pub fn add_medical_condition(&mut self, condition: impl Into<String>) {
        self.inputs.medical_conditions.insert(condition.into());
    }

    fn recompute(&mut self) {
        self.derived = DerivedMetrics::compute(&self.inputs);
    }

    pub fn name(&self) -> &str {
        &self.inputs.name
    }

    pub fn age(&self) -> Option<u32> {
        self.inputs.age
    }

    pub fn gender(&self) -> Option<Gender> {
        self.inputs.gender
    }

    pub fn is_male(&self) -> bool {
        self.inputs.gender == Some(Gender::Male)
    }

    pub fn is_female(&self) -> bool {
        self.inputs.gender == Some(Gender::Female)
    }

    pub fn weight_kg_or_default(&self) -> f64 {
        self.inputs
            .weight_kg
            .filter(|w| w.is_finite() && *w > 0.0)
            .unwrap_or(DEFAULT_WEIGHT_KG)
    }

    pub fn max_heart_rate_or_default(&self) -> u16 {
        self.derived.max_heart_rate.unwrap_or(DEFAULT_MAX_HEART_RATE)
    }

    pub fn activity_level_or_default(&self) -> ActivityLevel {
        self.inputs.activity_level.unwrap_or_default()
    }

    /// Resting baseline used by the heart rate model
    pub fn baseline_heart_rate(&self) -> f64 {
        if self.is_male() {
            70.0
        } else {
            75.0
        }
    }

    /// Case-insensitive medical condition lookup
    pub fn has_condition(&self, condition: &str) -> bool {
        self.inputs
            .medical_conditions
            .iter()
            .any(|c| c.eq_ignore_ascii_case(condition))
    }

    /// Estimated daily calorie needs (kcal)
    pub fn daily_calorie_needs(&self) -> u32 {
        let bmr = f64::from(self.derived.bmr.unwrap_or(DEFAULT_BMR));
        (bmr * self.activity_level_or_default().calorie_factor())
            .round()
            .max(0.0) as u32
    }

    /// Estimated daily water needs (ml), 35 ml per kg
    pub fn daily_water_ml(&self) -> u32 {
        (self.weight_kg_or_default() * 35.0).round() as u32
    }

    /// Check the profile is complete enough to leave onboarding
    pub fn validate(&self) -> Result<(), ProfileError> {
        let inputs = &self.inputs;

        if inputs.name.trim().is_empty() {
            return Err(missing("name"));
        }

        let age = inputs.age.ok_or_else(|| missing("age"))?;
        check_range("age", f64::from(age), (f64::from(AGE_RANGE.0), f64::from(AGE_RANGE.1)))?;

        if inputs.gender.is_none() {
            return Err(missing("gender"));
        }

        let weight = inputs.weight_kg.ok_or_else(|| missing("weight"))?;
        check_range("weight", weight, WEIGHT_RANGE)?;

        let height = inputs.height_cm.ok_or_else(|| missing("height"))?;
        check_range("height", height, HEIGHT_RANGE)?;

        Ok(())
    }
}

fn missing(field: &str) -> ProfileError {
    ProfileError::MissingField {
        field: field.to_string(),
    }
}

fn check_range(field: &str, value: f64, (min, max): (f64, f64)) -> Result<(), ProfileError> {
    if !value.is_finite() {
        return Err(ProfileError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
    if value < min || value > max {
        return Err(ProfileError::OutOfRange {
            field: field.to_string(),
            min,
            max,
            value,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn create_test_profile() -> UserProfile {
        UserProfile::new(ProfileInputs {
            name: "Test Athlete".to_string(),
            age: Some(30),
            gender: Some(Gender::Male),
            weight_kg: Some(70.0),
            height_cm: Some(175.0),
            activity_level: Some(ActivityLevel::Moderate),
            ..ProfileInputs::default()
        })
    }

    #[test]
    fn test_derived_metrics() {
        let profile = create_test_profile();
        let derived = profile.derived();

        assert_eq!(derived.bmi, Some(dec!(22.9))); // 70 / 1.75² = 22.857
        assert_eq!(derived.bmr, Some(1649)); // 700 + 1093.75 - 150 + 5
        assert_eq!(derived.max_heart_rate, Some(190));
    }

    #[test]
    fn test_derived_metrics_follow_inputs() {
        let mut profile = create_test_profile();

        profile.set_gender(Some(Gender::Female));
        assert_eq!(profile.derived().bmr, Some(1483)); // 1643.75 - 161

        profile.set_age(Some(50));
        assert_eq!(profile.derived().max_heart_rate, Some(170));
        assert_eq!(profile.derived().bmr, Some(1383));

        profile.set_weight_kg(None);
        assert_eq!(profile.derived().bmi, None);
        assert_eq!(profile.derived().bmr, None);
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let profile = UserProfile::default();

        assert_eq!(profile.weight_kg_or_default(), 70.0);
        assert_eq!(profile.max_heart_rate_or_default(), 190);
        assert_eq!(profile.activity_level_or_default(), ActivityLevel::Moderate);
        assert_eq!(profile.baseline_heart_rate(), 75.0);
        assert_eq!(profile.daily_calorie_needs(), 2250); // 1500 * 1.5
        assert_eq!(profile.daily_water_ml(), 2450);
    }

    #[test]
    fn test_daily_needs_scale_with_activity() {
        let mut profile = create_test_profile();
        profile.set_activity_level(Some(ActivityLevel::Athlete));
        assert_eq!(profile.daily_calorie_needs(), 3133); // 1649 * 1.9 = 3133.1

        profile.set_activity_level(Some(ActivityLevel::Sedentary));
        assert_eq!(profile.daily_calorie_needs(), 1979); // 1649 * 1.2 = 1978.8
    }

    #[test]
    fn test_condition_lookup_ignores_case() {
        let mut profile = create_test_profile();
        profile.add_medical_condition("Diabetes");

        assert!(profile.has_condition("diabetes"));
        assert!(!profile.has_condition("Hypertension"));
    }

    #[test]
    fn test_validation() {
        let profile = create_test_profile();
        assert!(profile.validate().is_ok());

        let mut missing_name = profile.clone();
        missing_name.set_name("  ");
        assert_eq!(
            missing_name.validate(),
            Err(ProfileError::MissingField { field: "name".to_string() })
        );

        let mut too_young = profile.clone();
        too_young.set_age(Some(8));
        assert!(matches!(
            too_young.validate(),
            Err(ProfileError::OutOfRange { ref field, .. }) if field == "age"
        ));

        let mut heavy = profile;
        heavy.set_weight_kg(Some(320.0));
        assert!(matches!(
            heavy.validate(),
            Err(ProfileError::OutOfRange { ref field, .. }) if field == "weight"
        ));
    }

    #[test]
    fn test_serde_recomputes_derived() {
        let json = r#"{
            "name": "Ana",
            "age": 40,
            "gender": "female",
            "weight_kg": 60.0,
            "height_cm": 165.0,
            "activity_level": "athlete"
        }"#;

        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.derived().max_heart_rate, Some(180));
        assert_eq!(profile.activity_level_or_default(), ActivityLevel::Athlete);
        assert!(profile.inputs().medical_conditions.is_empty());
    }
}
