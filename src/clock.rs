//! Real-time tick driver
//!
//! [`SessionClock`] wraps the [`Simulation`] aggregate in an async mutex and
//! installs exactly one recurring task per running session. Each tick
//! locks the aggregate, checks that the session generation it was
//! installed for is still current, and only then advances the state.
//! `stop` takes the same lock to bump the generation, so once it returns
//! no further tick can land, and a driver left over from an earlier
//! session can never tick into a new one.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::Instrument;
use uuid::Uuid;

use crate::error::SessionError;
use crate::medical::ReportAnalysis;
use crate::models::ExerciseType;
use crate::profile::UserProfile;
use crate::recommendations::RecommendationId;
use crate::session::{Simulation, TickUpdate};

/// Buffered tick updates per subscriber before it starts lagging
const UPDATE_CHANNEL_CAPACITY: usize = 256;

/// Async session controller with a one-tick-per-interval driver
pub struct SessionClock {
    simulation: Arc<Mutex<Simulation>>,
    updates: broadcast::Sender<TickUpdate>,
    driver: Option<JoinHandle<()>>,
    period: Duration,
}

impl SessionClock {
    pub fn new(simulation: Simulation) -> Self {
        let period = Duration::from_millis(simulation.config().simulation.tick_interval_ms.max(1));
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            simulation: Arc::new(Mutex::new(simulation)),
            updates,
            driver: None,
            period,
        }
    }

    /// Receive every tick update from now on
    pub fn subscribe(&self) -> broadcast::Receiver<TickUpdate> {
        self.updates.subscribe()
    }

    /// Shared handle to the state aggregate
    pub fn simulation(&self) -> Arc<Mutex<Simulation>> {
        Arc::clone(&self.simulation)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start a session and install its tick driver
    pub async fn start(&mut self, profile: UserProfile) -> Result<Uuid, SessionError> {
        let (session_id, generation) = {
            let mut sim = self.simulation.lock().await;
            let session_id = sim.start(profile)?;
            (session_id, sim.generation())
        };

        // A previous driver already saw its generation retired; abort it anyway
        if let Some(stale) = self.driver.take() {
            stale.abort();
        }

        let simulation = Arc::clone(&self.simulation);
        let updates = self.updates.clone();
        let period = self.period;
        let span = tracing::info_span!("session", session_id = %session_id, generation);
        self.driver = Some(tokio::spawn(
            run_driver(simulation, updates, generation, period).instrument(span),
        ));

        tracing::debug!(session_id = %session_id, generation, ?period, "Tick driver installed");
        Ok(session_id)
    }

    /// Stop the session and cancel its driver
    ///
    /// No tick is applied after this returns.
    pub async fn stop(&mut self) {
        {
            let mut sim = self.simulation.lock().await;
            sim.stop();
        }

        if let Some(driver) = self.driver.take() {
            driver.abort();
            tracing::debug!("Tick driver cancelled");
        }
    }

    pub async fn complete_recommendation(&self, id: RecommendationId) -> Result<(), SessionError> {
        self.simulation.lock().await.complete_recommendation(id)
    }

    pub async fn set_exercise_type(&self, exercise: ExerciseType) -> Result<(), SessionError> {
        self.simulation.lock().await.set_exercise_type(exercise)
    }

    pub async fn set_report_analysis(&self, report: Option<ReportAnalysis>) {
        self.simulation.lock().await.set_report_analysis(report);
    }

    pub async fn is_running(&self) -> bool {
        self.simulation.lock().await.is_running()
    }

    pub async fn elapsed(&self) -> u64 {
        self.simulation.lock().await.elapsed()
    }

    /// Copy of the aggregate at this instant
    pub async fn snapshot(&self) -> Simulation {
        self.simulation.lock().await.clone()
    }
}

impl Drop for SessionClock {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }
}

async fn run_driver(
    simulation: Arc<Mutex<Simulation>>,
    updates: broadcast::Sender<TickUpdate>,
    generation: u64,
    period: Duration,
) {
    let mut interval = time::interval_at(Instant::now() + period, period);
    // Late ticks are delivered in a burst rather than skipped or merged
    interval.set_missed_tick_behavior(MissedTickBehavior::Burst);

    loop {
        interval.tick().await;

        let mut sim = simulation.lock().await;
        if sim.generation() != generation || !sim.is_running() {
            tracing::debug!(generation, current = sim.generation(), "Driver retired");
            break;
        }

        if let Some(update) = sim.tick() {
            // No subscribers is fine; the state still advanced
            let _ = updates.send(update);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BiometricState, Gender};
    use crate::profile::ProfileInputs;

    fn test_profile() -> UserProfile {
        UserProfile::new(ProfileInputs {
            name: "Riley".to_string(),
            age: Some(35),
            gender: Some(Gender::Female),
            weight_kg: Some(62.0),
            height_cm: Some(168.0),
            ..ProfileInputs::default()
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_tick_per_second() {
        let mut clock = SessionClock::new(Simulation::default());
        let mut rx = clock.subscribe();

        clock.start(test_profile()).await.unwrap();
        time::sleep(Duration::from_millis(5_500)).await;

        assert_eq!(clock.elapsed().await, 5);
        for expected in 1..=5 {
            let update = rx.try_recv().unwrap();
            assert_eq!(update.elapsed, expected);
            assert_eq!(update.snapshot.time, expected - 1);
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_tick_after_stop() {
        let mut clock = SessionClock::new(Simulation::default());
        let mut rx = clock.subscribe();

        clock.start(test_profile()).await.unwrap();
        time::sleep(Duration::from_millis(3_500)).await;
        clock.stop().await;

        while rx.try_recv().is_ok() {}
        time::sleep(Duration::from_secs(10)).await;

        assert!(rx.try_recv().is_err());
        assert!(!clock.is_running().await);
        assert_eq!(clock.elapsed().await, 0);
        assert_eq!(clock.snapshot().await.state(), &BiometricState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_installs_single_driver() {
        let mut clock = SessionClock::new(Simulation::default());

        clock.start(test_profile()).await.unwrap();
        time::sleep(Duration::from_millis(2_500)).await;
        clock.stop().await;

        clock.start(test_profile()).await.unwrap();
        time::sleep(Duration::from_millis(4_500)).await;

        // Two drivers would have doubled the count
        assert_eq!(clock.elapsed().await, 4);
        assert_eq!(clock.snapshot().await.history().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_through_clock() {
        let mut clock = SessionClock::new(Simulation::default());
        clock.start(test_profile()).await.unwrap();
        time::sleep(Duration::from_millis(1_500)).await;

        let status_id = clock.snapshot().await.recommendations()[0].id;
        assert_eq!(
            clock.complete_recommendation(status_id).await,
            Err(SessionError::NotActionable { id: status_id })
        );
        assert_eq!(
            clock.set_exercise_type(ExerciseType::Yoga).await,
            Err(SessionError::ExerciseLocked)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_tick_interval() {
        let mut config = crate::config::AppConfig::default();
        config.simulation.tick_interval_ms = 100;
        let mut clock = SessionClock::new(Simulation::new(config));
        assert_eq!(clock.period(), Duration::from_millis(100));

        clock.start(test_profile()).await.unwrap();
        time::sleep(Duration::from_millis(1_050)).await;
        assert_eq!(clock.elapsed().await, 10);
    }
}
