use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Resting heart rate every session starts from (bpm)
pub const RESTING_HEART_RATE: u16 = 72;

/// Baseline core temperature (°C); also the lower clamp
pub const BASELINE_CORE_TEMP: f64 = 37.0;

/// Upper clamp for simulated core temperature (°C)
pub const MAX_CORE_TEMP: f64 = 39.5;

/// Exercise types the simulator knows intensity profiles for
///
/// Unrecognised names are kept as [`ExerciseType::Other`] and simulated
/// with moderate defaults instead of being rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExerciseType {
    Running,
    Cycling,
    Swimming,
    Strength,
    Yoga,
    Other(String),
}

impl ExerciseType {
    /// Heart-rate climb multiplier used for the target heart rate
    pub fn intensity_multiplier(&self) -> f64 {
        match self {
            ExerciseType::Running => 2.2,
            ExerciseType::Cycling => 1.8,
            ExerciseType::Swimming => 2.0,
            ExerciseType::Strength => 1.5,
            ExerciseType::Yoga => 1.2,
            ExerciseType::Other(_) => 1.5,
        }
    }

    /// Carbohydrate scaling for energy recommendations
    pub fn carb_multiplier(&self) -> f64 {
        match self {
            ExerciseType::Running => 1.2,
            ExerciseType::Cycling => 1.0,
            ExerciseType::Swimming => 1.1,
            ExerciseType::Strength => 0.8,
            ExerciseType::Yoga => 0.5,
            ExerciseType::Other(_) => 1.0,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ExerciseType::Running => "running",
            ExerciseType::Cycling => "cycling",
            ExerciseType::Swimming => "swimming",
            ExerciseType::Strength => "strength",
            ExerciseType::Yoga => "yoga",
            ExerciseType::Other(name) => name,
        }
    }
}

impl Default for ExerciseType {
    fn default() -> Self {
        ExerciseType::Running
    }
}

impl FromStr for ExerciseType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Ok(match normalized.as_str() {
            "running" | "run" => ExerciseType::Running,
            "cycling" | "bike" => ExerciseType::Cycling,
            "swimming" | "swim" => ExerciseType::Swimming,
            "strength" => ExerciseType::Strength,
            "yoga" => ExerciseType::Yoga,
            _ => ExerciseType::Other(normalized),
        })
    }
}

impl From<String> for ExerciseType {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(exercise) => exercise,
            Err(never) => match never {},
        }
    }
}

impl From<ExerciseType> for String {
    fn from(value: ExerciseType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            _ => Err(format!("Invalid gender: {}", s)),
        }
    }
}

/// Self-reported activity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    Athlete,
}

impl ActivityLevel {
    /// Multiplier applied to BMR for daily calorie needs
    pub fn calorie_factor(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Athlete => 1.9,
            _ => 1.5,
        }
    }

    /// Fatigue accumulation multiplier; trained athletes tire slower
    pub fn fatigue_multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Athlete => 0.7,
            _ => 1.0,
        }
    }
}

impl Default for ActivityLevel {
    fn default() -> Self {
        ActivityLevel::Moderate
    }
}

impl FromStr for ActivityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sedentary" => Ok(ActivityLevel::Sedentary),
            "light" => Ok(ActivityLevel::Light),
            "moderate" => Ok(ActivityLevel::Moderate),
            "active" => Ok(ActivityLevel::Active),
            "athlete" => Ok(ActivityLevel::Athlete),
            _ => Err(format!("Invalid activity level: {}", s)),
        }
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::Light => "light",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::Active => "active",
            ActivityLevel::Athlete => "athlete",
        };
        f.write_str(label)
    }
}

/// Heart rate zone label, derived from the percentage of the working range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeartRateZone {
    Rest,
    WarmUp,
    FatBurn,
    Aerobic,
    Cardio,
    Peak,
}

impl fmt::Display for HeartRateZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HeartRateZone::Rest => "rest",
            HeartRateZone::WarmUp => "warm-up",
            HeartRateZone::FatBurn => "fat-burn",
            HeartRateZone::Aerobic => "aerobic",
            HeartRateZone::Cardio => "cardio",
            HeartRateZone::Peak => "peak",
        };
        f.write_str(label)
    }
}

/// Simulated biometric state vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiometricState {
    /// Heart rate in beats per minute
    pub heart_rate: u16,

    /// Zone derived from the latest heart rate
    pub heart_rate_zone: HeartRateZone,

    /// Sweat rate in litres per hour
    pub sweat_rate: f64,

    /// Core temperature in °C, within [37.0, 39.5]
    pub core_temp_c: f64,

    /// Hydration percentage, within [0, 100]
    pub hydration_level: f64,

    /// Glycogen stores percentage, within [0, 100]
    pub glycogen_stores: f64,

    /// Accumulated fatigue percentage, within [0, 100]
    pub fatigue: f64,
}

impl Default for BiometricState {
    fn default() -> Self {
        Self {
            heart_rate: RESTING_HEART_RATE,
            heart_rate_zone: HeartRateZone::Rest,
            sweat_rate: 0.0,
            core_temp_c: BASELINE_CORE_TEMP,
            hydration_level: 100.0,
            glycogen_stores: 100.0,
            fatigue: 0.0,
        }
    }
}

/// Remaining protection per category, in ticks
///
/// Set when the user completes a recommendation; while a counter is
/// non-zero the matching depletion term is suppressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownState {
    pub hydration: u32,
    pub energy: u32,
    pub temperature: u32,
}

impl CooldownState {
    /// Decrement all counters by one tick, floored at zero
    pub fn decrement(self) -> Self {
        Self {
            hydration: self.hydration.saturating_sub(1),
            energy: self.energy.saturating_sub(1),
            temperature: self.temperature.saturating_sub(1),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.hydration == 0 && self.energy == 0 && self.temperature == 0
    }
}

/// Elapsed second at which each re-triggerable advisory last fired
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastTriggered {
    pub hydration: Option<u64>,
    pub energy: Option<u64>,
    pub temperature: Option<u64>,
}

/// One history entry, rounded for charting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    /// Elapsed seconds at which the tick was evaluated
    pub time: u64,
    pub heart_rate: u16,
    pub hydration: u8,
    pub glycogen: u8,
    pub fatigue: u8,
}

impl HistorySnapshot {
    pub fn from_state(time: u64, state: &BiometricState) -> Self {
        Self {
            time,
            heart_rate: state.heart_rate,
            hydration: round_percent(state.hydration_level),
            glycogen: round_percent(state.glycogen_stores),
            fatigue: round_percent(state.fatigue),
        }
    }
}

fn round_percent(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

/// Format elapsed seconds as `mm:ss`, or `hh:mm:ss` from one hour on
pub fn format_elapsed(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exercise_type_parsing_is_lenient() {
        assert_eq!("Running".parse::<ExerciseType>().unwrap(), ExerciseType::Running);
        assert_eq!("yoga".parse::<ExerciseType>().unwrap(), ExerciseType::Yoga);

        let other: ExerciseType = "Rowing".parse().unwrap();
        assert_eq!(other, ExerciseType::Other("rowing".to_string()));
        assert_eq!(other.intensity_multiplier(), 1.5);
        assert_eq!(other.carb_multiplier(), 1.0);
        assert_eq!(other.to_string(), "rowing");
    }

    #[test]
    fn test_exercise_type_serde_as_string() {
        let json = serde_json::to_string(&ExerciseType::Swimming).unwrap();
        assert_eq!(json, "\"swimming\"");

        let parsed: ExerciseType = serde_json::from_str("\"pilates\"").unwrap();
        assert_eq!(parsed, ExerciseType::Other("pilates".to_string()));
    }

    #[test]
    fn test_zone_labels() {
        assert_eq!(HeartRateZone::WarmUp.to_string(), "warm-up");
        assert_eq!(HeartRateZone::FatBurn.to_string(), "fat-burn");
        assert_eq!(
            serde_json::to_string(&HeartRateZone::FatBurn).unwrap(),
            "\"fat-burn\""
        );
    }

    #[test]
    fn test_resting_defaults() {
        let state = BiometricState::default();
        assert_eq!(state.heart_rate, 72);
        assert_eq!(state.heart_rate_zone, HeartRateZone::Rest);
        assert_eq!(state.core_temp_c, 37.0);
        assert_eq!(state.hydration_level, 100.0);
        assert_eq!(state.glycogen_stores, 100.0);
        assert_eq!(state.fatigue, 0.0);
    }

    #[test]
    fn test_cooldown_decrement_floors_at_zero() {
        let cooldowns = CooldownState {
            hydration: 2,
            energy: 0,
            temperature: 1,
        };

        let next = cooldowns.decrement();
        assert_eq!(next, CooldownState { hydration: 1, energy: 0, temperature: 0 });
        assert!(next.decrement().is_idle());
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(75), "01:15");
        assert_eq!(format_elapsed(3599), "59:59");
        assert_eq!(format_elapsed(3661), "01:01:01");
    }

    #[test]
    fn test_snapshot_rounds_values() {
        let state = BiometricState {
            hydration_level: 88.6,
            glycogen_stores: 70.4,
            fatigue: 2.5,
            ..BiometricState::default()
        };

        let snapshot = HistorySnapshot::from_state(12, &state);
        assert_eq!(snapshot.time, 12);
        assert_eq!(snapshot.hydration, 89);
        assert_eq!(snapshot.glycogen, 70);
        assert_eq!(snapshot.fatigue, 3);
    }
}
