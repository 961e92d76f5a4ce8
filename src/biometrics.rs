//! Biometric simulation model
//!
//! A closed-form, per-tick update of the simulated physiology. Given the
//! previous state, the elapsed exercise time, the exercise type, the user
//! profile and the active cooldowns, [`BiometricEngine::advance`] produces
//! the next state deterministically.
//!
//! # Model
//!
//! Heart rate climbs linearly towards a ceiling of 85% of max HR:
//!
//! ```text
//! target = min(baseline + t * multiplier * k, max_hr * 0.85)
//! hr'    = hr + (target - hr) * smoothing
//! ```
//!
//! The position of the new heart rate within the working range
//! (baseline to max HR) drives everything else: zone, sweat rate,
//! hydration and glycogen depletion, core temperature and fatigue.

use serde::{Deserialize, Serialize};

use crate::config::SimulationSettings;
use crate::models::{
    BiometricState, CooldownState, ExerciseType, BASELINE_CORE_TEMP, MAX_CORE_TEMP,
};
use crate::profile::UserProfile;
use crate::zones::ZoneCalculator;

/// Heart rate ceiling as a fraction of max HR
const TARGET_CEILING: f64 = 0.85;

/// Sweat rate at full intensity for a 70 kg person (L/hr)
const BASE_SWEAT_RATE: f64 = 0.5;
const REFERENCE_WEIGHT_KG: f64 = 70.0;

const HYDRATION_LOSS_PER_SWEAT: f64 = 0.5;
const GLYCOGEN_BURN_RATE: f64 = 0.3;
const HEATING_RATE: f64 = 0.015;
const COOLING_RATE: f64 = 0.02;
const FATIGUE_RATE: f64 = 0.03;

/// Result of one biometric update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiometricUpdate {
    /// State after the tick
    pub state: BiometricState,

    /// Cooldowns after the tick's decrement
    pub cooldowns: CooldownState,

    /// Heart rate the model is converging towards
    pub target_heart_rate: f64,

    /// Unclamped percentage of the working range
    pub hr_percentage: f64,
}

/// Per-tick biometric state update
#[derive(Debug, Clone)]
pub struct BiometricEngine {
    damping: f64,
    smoothing: f64,
}

impl Default for BiometricEngine {
    fn default() -> Self {
        Self::new(&SimulationSettings::default())
    }
}

impl BiometricEngine {
    pub fn new(settings: &SimulationSettings) -> Self {
        Self {
            damping: settings.hr_damping,
            smoothing: settings.hr_smoothing,
        }
    }

    /// Target heart rate at `elapsed` seconds into the session
    pub fn target_heart_rate(
        &self,
        elapsed: u64,
        exercise: &ExerciseType,
        profile: &UserProfile,
    ) -> f64 {
        let baseline = profile.baseline_heart_rate();
        let max_hr = f64::from(profile.max_heart_rate_or_default());
        let climb = elapsed as f64 * exercise.intensity_multiplier() * self.damping;
        (baseline + climb).min(max_hr * TARGET_CEILING)
    }

    /// Advance the biometric state by one tick
    pub fn advance(
        &self,
        previous: &BiometricState,
        elapsed: u64,
        exercise: &ExerciseType,
        profile: &UserProfile,
        cooldowns: CooldownState,
    ) -> BiometricUpdate {
        let baseline = profile.baseline_heart_rate();
        let max_hr = f64::from(profile.max_heart_rate_or_default());

        let target = self.target_heart_rate(elapsed, exercise, profile);
        let current = f64::from(previous.heart_rate);
        let heart_rate = current + (target - current) * self.smoothing;

        let hr_percentage = ZoneCalculator::hr_percentage(heart_rate, baseline, max_hr);
        let zone = ZoneCalculator::zone_for_percentage(hr_percentage);

        let intensity = (hr_percentage / 100.0).max(0.0);
        let body_weight_factor = profile.weight_kg_or_default() / REFERENCE_WEIGHT_KG;
        let sweat_rate = BASE_SWEAT_RATE * intensity * body_weight_factor;

        let hydration_level = if cooldowns.hydration == 0 {
            (previous.hydration_level - sweat_rate * HYDRATION_LOSS_PER_SWEAT).max(0.0)
        } else {
            previous.hydration_level
        };

        let glycogen_stores = if cooldowns.energy == 0 {
            (previous.glycogen_stores - intensity * GLYCOGEN_BURN_RATE).max(0.0)
        } else {
            previous.glycogen_stores
        };

        let core_temp_c = if cooldowns.temperature == 0 {
            (previous.core_temp_c + intensity * HEATING_RATE).min(MAX_CORE_TEMP)
        } else {
            (previous.core_temp_c - COOLING_RATE).max(BASELINE_CORE_TEMP)
        };

        let fatigue_multiplier = profile.activity_level_or_default().fatigue_multiplier();
        let fatigue = (previous.fatigue + intensity * FATIGUE_RATE * fatigue_multiplier).min(100.0);

        BiometricUpdate {
            state: BiometricState {
                heart_rate: heart_rate.round().clamp(0.0, f64::from(u16::MAX)) as u16,
                heart_rate_zone: zone,
                sweat_rate,
                core_temp_c: core_temp_c.clamp(BASELINE_CORE_TEMP, MAX_CORE_TEMP),
                hydration_level: hydration_level.clamp(0.0, 100.0),
                glycogen_stores: glycogen_stores.clamp(0.0, 100.0),
                fatigue: fatigue.clamp(0.0, 100.0),
            },
            cooldowns: cooldowns.decrement(),
            target_heart_rate: target,
            hr_percentage,
        }
    }
}
