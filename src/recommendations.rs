//! Rule-based recommendation engine
//!
//! Every tick the engine looks at the freshly updated biometrics and emits
//! a set of advisories. Three of them are *actionable* (hydration, energy,
//! cooling): they persist until the user completes them, may only fire
//! again once their re-trigger window has passed, and completing one
//! applies a remedial change to the biometric state plus a cooldown.
//! All other advisories are recomputed from scratch every tick.
//!
//! | Category     | Trigger                         | Window |
//! |--------------|---------------------------------|--------|
//! | Hydration    | hydration < 90%                 | 60 s   |
//! | Energy       | glycogen < 70%                  | 90 s   |
//! | Cooling      | core temperature > 38.0 °C      | 120 s  |
//! | Intensity    | peak zone                       | -      |
//! | Performance  | cardio zone                     | -      |
//! | Glucose      | Diabetes and glycogen < 40%     | -      |
//! | Blood press. | Hypertension and HR > 160 bpm   | -      |
//! | Electrolyte  | report flags low electrolytes   | -      |

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{CooldownDurations, RetriggerWindows};
use crate::error::SessionError;
use crate::medical::ReportAnalysis;
use crate::models::{
    format_elapsed, BiometricState, CooldownState, ExerciseType, HeartRateZone, LastTriggered,
    BASELINE_CORE_TEMP, RESTING_HEART_RATE,
};
use crate::profile::UserProfile;
use crate::zones::ZoneCalculator;

const HYDRATION_THRESHOLD: f64 = 90.0;
const ENERGY_THRESHOLD: f64 = 70.0;
const COOLING_THRESHOLD: f64 = 38.0;
const GLUCOSE_THRESHOLD: f64 = 40.0;
const HYPERTENSION_HR_LIMIT: u16 = 160;
const SENIOR_AGE: u32 = 50;

const HYDRATION_RESTORE: f64 = 20.0;
const GLYCOGEN_RESTORE: f64 = 25.0;
const COOLING_TEMP_DROP: f64 = 0.3;
const COOLING_HR_DROP: u16 = 10;

/// Identifier unique to one firing of a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecommendationId(pub u64);

impl fmt::Display for RecommendationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic id source, owned by the session
#[derive(Debug, Clone, Default)]
pub struct IdSequence {
    last: u64,
}

impl IdSequence {
    pub fn next_id(&mut self) -> RecommendationId {
        self.last += 1;
        RecommendationId(self.last)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecommendationCategory {
    Status,
    Hydration,
    Energy,
    Cooling,
    Intensity,
    Performance,
    Glucose,
    BloodPressure,
    Electrolyte,
}

impl RecommendationCategory {
    /// Categories the user can act on and complete
    pub fn is_actionable(&self) -> bool {
        matches!(
            self,
            RecommendationCategory::Hydration
                | RecommendationCategory::Energy
                | RecommendationCategory::Cooling
        )
    }
}

impl fmt::Display for RecommendationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RecommendationCategory::Status => "status",
            RecommendationCategory::Hydration => "hydration",
            RecommendationCategory::Energy => "energy",
            RecommendationCategory::Cooling => "cooling",
            RecommendationCategory::Intensity => "intensity",
            RecommendationCategory::Performance => "performance",
            RecommendationCategory::Glucose => "glucose",
            RecommendationCategory::BloodPressure => "blood-pressure",
            RecommendationCategory::Electrolyte => "electrolyte",
        };
        f.write_str(label)
    }
}

/// One advisory shown to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: RecommendationId,
    pub category: RecommendationCategory,
    pub title: String,
    pub message: String,
    pub actionable: bool,
    pub completed: bool,
    /// Elapsed second at which it fired
    pub issued_at: u64,
}

impl Recommendation {
    fn new(
        ids: &mut IdSequence,
        category: RecommendationCategory,
        title: &str,
        message: String,
        issued_at: u64,
    ) -> Self {
        Self {
            id: ids.next_id(),
            category,
            title: title.to_string(),
            message,
            actionable: category.is_actionable(),
            completed: false,
            issued_at,
        }
    }

    pub fn is_open(&self) -> bool {
        self.actionable && !self.completed
    }
}

/// Everything the rules look at for one tick
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub state: &'a BiometricState,
    pub profile: &'a UserProfile,
    pub exercise: &'a ExerciseType,
    pub elapsed: u64,
    pub report: Option<&'a ReportAnalysis>,
}

/// Result of one evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Full recommendation set for the tick
    pub recommendations: Vec<Recommendation>,

    /// Last-triggered times including this tick's firings
    pub last_triggered: LastTriggered,

    /// Actionable categories that fired on this tick
    pub fired: Vec<RecommendationCategory>,
}

/// Recommendation rules with re-trigger suppression
#[derive(Debug, Clone, Default)]
pub struct RecommendationEngine {
    windows: RetriggerWindows,
}

impl RecommendationEngine {
    pub fn new(windows: RetriggerWindows) -> Self {
        Self { windows }
    }

    /// Evaluate all rules for the current tick
    ///
    /// `existing` is the previous tick's set. Its actionable entries,
    /// completed or not, are carried over; everything else is rebuilt.
    pub fn evaluate(
        &self,
        ctx: &EvaluationContext<'_>,
        existing: &[Recommendation],
        last_triggered: LastTriggered,
        ids: &mut IdSequence,
    ) -> Evaluation {
        let mut last = last_triggered;
        let mut fired = Vec::new();

        let mut recommendations = vec![status(ctx, ids)];
        recommendations.extend(existing.iter().filter(|r| r.actionable).cloned());

        let has_open = |category| existing.iter().any(|r| r.category == category && r.is_open());
        let now = ctx.elapsed;

        if ctx.state.hydration_level < HYDRATION_THRESHOLD
            && !has_open(RecommendationCategory::Hydration)
            && window_open(last.hydration, now, self.windows.hydration)
        {
            recommendations.push(hydration(ctx, ids));
            last.hydration = Some(now);
            fired.push(RecommendationCategory::Hydration);
        }

        if ctx.state.glycogen_stores < ENERGY_THRESHOLD
            && !has_open(RecommendationCategory::Energy)
            && window_open(last.energy, now, self.windows.energy)
        {
            recommendations.push(energy(ctx, ids));
            last.energy = Some(now);
            fired.push(RecommendationCategory::Energy);
        }

        if ctx.state.core_temp_c > COOLING_THRESHOLD
            && !has_open(RecommendationCategory::Cooling)
            && window_open(last.temperature, now, self.windows.temperature)
        {
            recommendations.push(cooling(ctx, ids));
            last.temperature = Some(now);
            fired.push(RecommendationCategory::Cooling);
        }

        recommendations.extend(advisories(ctx, ids));

        Evaluation {
            recommendations,
            last_triggered: last,
            fired,
        }
    }
}

fn window_open(last: Option<u64>, now: u64, window: u64) -> bool {
    match last {
        None => true,
        Some(at) => now.saturating_sub(at) > window,
    }
}

/// Address the user by name when one is known
fn personalize(profile: &UserProfile, sentence: &str) -> String {
    let name = profile.name().trim();
    if name.is_empty() {
        let mut chars = sentence.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    } else {
        format!("{}, {}", name, sentence)
    }
}

fn status(ctx: &EvaluationContext<'_>, ids: &mut IdSequence) -> Recommendation {
    Recommendation::new(
        ids,
        RecommendationCategory::Status,
        "Session Status",
        format!(
            "{} for {} - {} zone",
            ctx.exercise,
            format_elapsed(ctx.elapsed),
            ctx.state.heart_rate_zone
        ),
        ctx.elapsed,
    )
}

fn hydration(ctx: &EvaluationContext<'_>, ids: &mut IdSequence) -> Recommendation {
    let level = ctx.state.hydration_level;
    let water_ml = ((100.0 - level) * ctx.profile.weight_kg_or_default() * 0.015).round();
    let severity = if level < 70.0 {
        "URGENT: "
    } else if level < 80.0 {
        "Important: "
    } else {
        ""
    };

    let sentence = format!(
        "drink {:.0}ml of water now. Hydration is at {:.0}%.",
        water_ml, level
    );

    Recommendation::new(
        ids,
        RecommendationCategory::Hydration,
        "Hydration Alert",
        format!("{}{}", severity, personalize(ctx.profile, &sentence)),
        ctx.elapsed,
    )
}

fn energy(ctx: &EvaluationContext<'_>, ids: &mut IdSequence) -> Recommendation {
    let base = if ctx.profile.is_female() { 25.0 } else { 30.0 };
    let carbs_g = (base * ctx.exercise.carb_multiplier()).round();

    let mut message = personalize(
        ctx.profile,
        &format!(
            "take in {:.0}g of fast-acting carbohydrates. Glycogen is at {:.0}%.",
            carbs_g, ctx.state.glycogen_stores
        ),
    );
    if ctx.profile.has_condition("Diabetes") {
        message.push_str(" Check your blood glucose before refuelling.");
    }

    Recommendation::new(
        ids,
        RecommendationCategory::Energy,
        "Energy Boost Needed",
        message,
        ctx.elapsed,
    )
}

fn cooling(ctx: &EvaluationContext<'_>, ids: &mut IdSequence) -> Recommendation {
    let mut message = personalize(
        ctx.profile,
        &format!(
            "ease off and cool down. Core temperature is {:.1}°C.",
            ctx.state.core_temp_c
        ),
    );
    if ctx.profile.age().map_or(false, |age| age > SENIOR_AGE) {
        message.push_str(" Take extra care: heat tolerance drops with age.");
    }

    Recommendation::new(
        ids,
        RecommendationCategory::Cooling,
        "Overheating Risk",
        message,
        ctx.elapsed,
    )
}

/// Non-actionable advisories, rebuilt every tick
fn advisories(ctx: &EvaluationContext<'_>, ids: &mut IdSequence) -> Vec<Recommendation> {
    let mut advisories = Vec::new();
    let state = ctx.state;

    match state.heart_rate_zone {
        HeartRateZone::Peak => {
            let (low, high) = ZoneCalculator::target_band(ctx.profile.max_heart_rate_or_default());
            advisories.push(Recommendation::new(
                ids,
                RecommendationCategory::Intensity,
                "Reduce Intensity",
                format!(
                    "Heart rate is in the peak zone. Ease back to {}-{} bpm (70-85% of max).",
                    low, high
                ),
                ctx.elapsed,
            ));
        }
        HeartRateZone::Cardio => {
            advisories.push(Recommendation::new(
                ids,
                RecommendationCategory::Performance,
                "Great Work",
                personalize(
                    ctx.profile,
                    "you're in the cardio zone, ideal for building endurance. Keep it up!",
                ),
                ctx.elapsed,
            ));
        }
        _ => {}
    }

    if ctx.profile.has_condition("Diabetes") && state.glycogen_stores < GLUCOSE_THRESHOLD {
        advisories.push(Recommendation::new(
            ids,
            RecommendationCategory::Glucose,
            "Blood Sugar Alert",
            "Monitor blood glucose. Consider 15g quick carbs.".to_string(),
            ctx.elapsed,
        ));
    }

    if ctx.profile.has_condition("Hypertension") && state.heart_rate > HYPERTENSION_HR_LIMIT {
        advisories.push(Recommendation::new(
            ids,
            RecommendationCategory::BloodPressure,
            "Heart Rate Elevated",
            format!(
                "Heart rate above {} bpm. Reduce intensity to manage blood pressure.",
                HYPERTENSION_HR_LIMIT
            ),
            ctx.elapsed,
        ));
    }

    if ctx.report.map_or(false, |report| report.low_electrolytes) {
        advisories.push(Recommendation::new(
            ids,
            RecommendationCategory::Electrolyte,
            "Electrolyte Attention",
            "Your medical report shows low baseline electrolytes. Consider an electrolyte drink."
                .to_string(),
            ctx.elapsed,
        ));
    }

    advisories
}

/// Mark a recommendation completed and apply its remedial action
///
/// Completion is one-way. Non-actionable or already completed
/// recommendations are rejected without touching the state.
pub fn apply_completion(
    recommendation: &mut Recommendation,
    state: &mut BiometricState,
    cooldowns: &mut CooldownState,
    durations: &CooldownDurations,
) -> Result<(), SessionError> {
    if !recommendation.actionable {
        return Err(SessionError::NotActionable {
            id: recommendation.id,
        });
    }
    if recommendation.completed {
        return Err(SessionError::AlreadyCompleted {
            id: recommendation.id,
        });
    }

    match recommendation.category {
        RecommendationCategory::Hydration => {
            state.hydration_level = (state.hydration_level + HYDRATION_RESTORE).min(100.0);
            cooldowns.hydration = durations.hydration;
        }
        RecommendationCategory::Energy => {
            state.glycogen_stores = (state.glycogen_stores + GLYCOGEN_RESTORE).min(100.0);
            cooldowns.energy = durations.energy;
        }
        RecommendationCategory::Cooling => {
            state.core_temp_c = (state.core_temp_c - COOLING_TEMP_DROP).max(BASELINE_CORE_TEMP);
            state.heart_rate = state
                .heart_rate
                .saturating_sub(COOLING_HR_DROP)
                .max(RESTING_HEART_RATE);
            cooldowns.temperature = durations.temperature;
        }
        _ => {
            return Err(SessionError::NotActionable {
                id: recommendation.id,
            })
        }
    }

    recommendation.completed = true;
    Ok(())
}
