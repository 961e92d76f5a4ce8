//! Session state aggregate
//!
//! [`Simulation`] owns every piece of mutable session state: the profile,
//! the biometric vector, cooldowns, re-trigger bookkeeping, the current
//! recommendations and alerts, and the history buffer. It is a plain
//! synchronous state machine (idle / running); the async driver in
//! [`crate::clock`] only decides *when* [`Simulation::tick`] runs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::alerts::{check_alerts, Alert};
use crate::biometrics::BiometricEngine;
use crate::config::AppConfig;
use crate::error::SessionError;
use crate::history::{HistoryBuffer, SessionSummary};
use crate::medical::ReportAnalysis;
use crate::models::{BiometricState, CooldownState, ExerciseType, HistorySnapshot, LastTriggered};
use crate::profile::UserProfile;
use crate::recommendations::{
    apply_completion, EvaluationContext, IdSequence, Recommendation, RecommendationEngine,
    RecommendationId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Idle,
    Running,
}

/// Observable result of one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickUpdate {
    pub session_id: Uuid,
    /// Elapsed seconds after the tick
    pub elapsed: u64,
    pub state: BiometricState,
    pub recommendations: Vec<Recommendation>,
    pub alerts: Vec<Alert>,
    pub snapshot: HistorySnapshot,
}

/// The single owned state aggregate of the simulator
#[derive(Debug, Clone)]
pub struct Simulation {
    config: AppConfig,
    biometrics: BiometricEngine,
    recommender: RecommendationEngine,

    phase: SessionPhase,
    session_id: Option<Uuid>,
    generation: u64,

    profile: UserProfile,
    exercise: ExerciseType,
    report: Option<ReportAnalysis>,

    elapsed: u64,
    state: BiometricState,
    cooldowns: CooldownState,
    last_triggered: LastTriggered,
    recommendations: Vec<Recommendation>,
    alerts: Vec<Alert>,
    history: HistoryBuffer,
    ids: IdSequence,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl Simulation {
    pub fn new(config: AppConfig) -> Self {
        Self {
            biometrics: BiometricEngine::new(&config.simulation),
            recommender: RecommendationEngine::new(config.retrigger),
            history: HistoryBuffer::new(config.simulation.history_capacity),
            config,
            phase: SessionPhase::Idle,
            session_id: None,
            generation: 0,
            profile: UserProfile::default(),
            exercise: ExerciseType::default(),
            report: None,
            elapsed: 0,
            state: BiometricState::default(),
            cooldowns: CooldownState::default(),
            last_triggered: LastTriggered::default(),
            recommendations: Vec::new(),
            alerts: Vec::new(),
            ids: IdSequence::default(),
        }
    }

    /// Begin a session: idle -> running
    ///
    /// Everything from a previous session is reset, including the history.
    pub fn start(&mut self, profile: UserProfile) -> Result<Uuid, SessionError> {
        if self.phase == SessionPhase::Running {
            return Err(SessionError::AlreadyRunning);
        }

        let session_id = Uuid::new_v4();
        self.reset_session_state();
        self.history.clear();
        self.profile = profile;
        self.session_id = Some(session_id);
        self.generation += 1;
        self.phase = SessionPhase::Running;

        tracing::info!(
            session_id = %session_id,
            exercise = %self.exercise,
            generation = self.generation,
            "Session started"
        );

        Ok(session_id)
    }

    /// End the session: running -> idle
    ///
    /// Biometrics return to resting defaults. The history is kept for
    /// export until the next start. Stopping an idle session does nothing.
    pub fn stop(&mut self) {
        if self.phase == SessionPhase::Idle {
            tracing::debug!("Stop requested while idle");
            return;
        }

        tracing::info!(
            session_id = ?self.session_id,
            elapsed = self.elapsed,
            "Session stopped"
        );

        self.reset_session_state();
        self.generation += 1;
        self.phase = SessionPhase::Idle;
    }

    fn reset_session_state(&mut self) {
        self.elapsed = 0;
        self.state = BiometricState::default();
        self.cooldowns = CooldownState::default();
        self.last_triggered = LastTriggered::default();
        self.recommendations.clear();
        self.alerts.clear();
    }

    /// Advance one second: update, recommend, alert, record
    ///
    /// Returns `None` when idle.
    pub fn tick(&mut self) -> Option<TickUpdate> {
        if self.phase != SessionPhase::Running {
            return None;
        }
        let session_id = self.session_id?;
        let t = self.elapsed;

        let update = self.biometrics.advance(
            &self.state,
            t,
            &self.exercise,
            &self.profile,
            self.cooldowns,
        );
        self.state = update.state;
        self.cooldowns = update.cooldowns;

        let ctx = EvaluationContext {
            state: &self.state,
            profile: &self.profile,
            exercise: &self.exercise,
            elapsed: t,
            report: self.report.as_ref(),
        };
        let evaluation =
            self.recommender
                .evaluate(&ctx, &self.recommendations, self.last_triggered, &mut self.ids);
        for category in &evaluation.fired {
            tracing::debug!(session_id = %session_id, t, %category, "Recommendation fired");
        }
        self.recommendations = evaluation.recommendations;
        self.last_triggered = evaluation.last_triggered;

        self.alerts = check_alerts(&self.state, &self.profile);

        let snapshot = HistorySnapshot::from_state(t, &self.state);
        self.history.push(snapshot);
        self.elapsed = t + 1;

        tracing::trace!(
            session_id = %session_id,
            t,
            heart_rate = self.state.heart_rate,
            zone = %self.state.heart_rate_zone,
            hydration = self.state.hydration_level,
            glycogen = self.state.glycogen_stores,
            core_temp = self.state.core_temp_c,
            "Tick"
        );

        Some(TickUpdate {
            session_id,
            elapsed: self.elapsed,
            state: self.state.clone(),
            recommendations: self.recommendations.clone(),
            alerts: self.alerts.clone(),
            snapshot,
        })
    }

    /// Complete an actionable recommendation and apply its remedy
    pub fn complete_recommendation(&mut self, id: RecommendationId) -> Result<(), SessionError> {
        let recommendation = self
            .recommendations
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(SessionError::RecommendationNotFound { id })?;

        apply_completion(
            recommendation,
            &mut self.state,
            &mut self.cooldowns,
            &self.config.cooldowns,
        )?;

        tracing::info!(
            session_id = ?self.session_id,
            %id,
            category = %recommendation.category,
            "Recommendation completed"
        );
        Ok(())
    }

    /// Change the exercise type
    ///
    /// While running this is rejected unless the configuration allows it;
    /// an accepted change applies from the next tick with the full elapsed
    /// time, so the target heart rate jumps and the smoothing absorbs it.
    pub fn set_exercise_type(&mut self, exercise: ExerciseType) -> Result<(), SessionError> {
        if self.phase == SessionPhase::Running
            && !self.config.simulation.allow_exercise_change_while_running
        {
            tracing::warn!(requested = %exercise, current = %self.exercise, "Exercise change rejected");
            return Err(SessionError::ExerciseLocked);
        }
        self.exercise = exercise;
        Ok(())
    }

    /// Attach (or clear) the medical report analysis
    pub fn set_report_analysis(&mut self, report: Option<ReportAnalysis>) {
        self.report = report;
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    /// Bumped on every start and stop; tick drivers compare against it
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn exercise(&self) -> &ExerciseType {
        &self.exercise
    }

    pub fn report(&self) -> Option<&ReportAnalysis> {
        self.report.as_ref()
    }

    pub fn state(&self) -> &BiometricState {
        &self.state
    }

    pub fn cooldowns(&self) -> CooldownState {
        self.cooldowns
    }

    pub fn last_triggered(&self) -> LastTriggered {
        self.last_triggered
    }

    pub fn recommendations(&self) -> &[Recommendation] {
        &self.recommendations
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn summary(&self) -> Option<SessionSummary> {
        SessionSummary::from_history(&self.history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;
    use crate::profile::ProfileInputs;
    use crate::recommendations::RecommendationCategory;

    fn test_profile() -> UserProfile {
        UserProfile::new(ProfileInputs {
            name: "Jordan".to_string(),
            age: Some(30),
            gender: Some(Gender::Male),
            weight_kg: Some(70.0),
            height_cm: Some(178.0),
            ..ProfileInputs::default()
        })
    }

    #[test]
    fn test_start_resets_and_runs() {
        let mut sim = Simulation::default();
        assert_eq!(sim.phase(), SessionPhase::Idle);
        assert!(sim.tick().is_none());

        sim.start(test_profile()).unwrap();
        assert!(sim.is_running());
        assert_eq!(sim.generation(), 1);

        let update = sim.tick().unwrap();
        assert_eq!(update.elapsed, 1);
        assert_eq!(update.snapshot.time, 0);
        assert_eq!(update.state.heart_rate, 72);
        assert_eq!(sim.history().len(), 1);
        assert_eq!(update.recommendations[0].category, RecommendationCategory::Status);
    }

    #[test]
    fn test_double_start_is_rejected() {
        let mut sim = Simulation::default();
        sim.start(test_profile()).unwrap();
        assert_eq!(sim.start(test_profile()), Err(SessionError::AlreadyRunning));
        assert_eq!(sim.generation(), 1);
    }

    #[test]
    fn test_stop_restores_defaults_and_keeps_history() {
        let mut sim = Simulation::default();
        sim.start(test_profile()).unwrap();
        for _ in 0..150 {
            sim.tick();
        }
        assert_ne!(sim.state(), &BiometricState::default());

        sim.stop();
        assert_eq!(sim.phase(), SessionPhase::Idle);
        assert_eq!(sim.elapsed(), 0);
        assert_eq!(sim.state(), &BiometricState::default());
        assert!(sim.recommendations().is_empty());
        assert!(sim.cooldowns().is_idle());
        assert_eq!(sim.last_triggered(), LastTriggered::default());
        assert_eq!(sim.history().len(), 60);
        assert!(sim.tick().is_none());

        // Idempotent
        let generation = sim.generation();
        sim.stop();
        assert_eq!(sim.generation(), generation);
    }

    #[test]
    fn test_exercise_locked_while_running() {
        let mut sim = Simulation::default();
        sim.set_exercise_type(ExerciseType::Cycling).unwrap();
        sim.start(test_profile()).unwrap();

        assert_eq!(
            sim.set_exercise_type(ExerciseType::Yoga),
            Err(SessionError::ExerciseLocked)
        );
        assert_eq!(sim.exercise(), &ExerciseType::Cycling);

        sim.stop();
        sim.set_exercise_type(ExerciseType::Yoga).unwrap();
        assert_eq!(sim.exercise(), &ExerciseType::Yoga);
    }

    #[test]
    fn test_exercise_change_allowed_by_config() {
        let mut config = AppConfig::default();
        config.simulation.allow_exercise_change_while_running = true;
        let mut sim = Simulation::new(config);

        sim.start(test_profile()).unwrap();
        sim.set_exercise_type(ExerciseType::Swimming).unwrap();
        assert_eq!(sim.exercise(), &ExerciseType::Swimming);
    }

    #[test]
    fn test_complete_unknown_recommendation() {
        let mut sim = Simulation::default();
        sim.start(test_profile()).unwrap();
        sim.tick();

        let err = sim.complete_recommendation(RecommendationId(9999)).unwrap_err();
        assert_eq!(err, SessionError::RecommendationNotFound { id: RecommendationId(9999) });

        let status_id = sim.recommendations()[0].id;
        assert_eq!(
            sim.complete_recommendation(status_id),
            Err(SessionError::NotActionable { id: status_id })
        );
    }

    #[test]
    fn test_history_capacity_from_config() {
        let mut config = AppConfig::default();
        config.simulation.history_capacity = 30;
        let mut sim = Simulation::new(config);

        sim.start(test_profile()).unwrap();
        for _ in 0..45 {
            sim.tick();
        }
        assert_eq!(sim.history().len(), 30);
        assert_eq!(sim.history().iter().next().unwrap().time, 15);
        assert_eq!(sim.summary().unwrap().last_time, 44);
    }

    #[test]
    fn test_report_analysis_reaches_recommendations() {
        let mut sim = Simulation::default();
        sim.set_report_analysis(Some(ReportAnalysis {
            low_electrolytes: true,
            ..ReportAnalysis::default()
        }));
        sim.start(test_profile()).unwrap();

        let update = sim.tick().unwrap();
        assert!(update
            .recommendations
            .iter()
            .any(|r| r.category == RecommendationCategory::Electrolyte));
    }
}
