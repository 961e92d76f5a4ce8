// Library interface for BioSync modules
// This allows integration tests and the CLI to drive the simulation

pub mod alerts;
pub mod biometrics;
pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod history;
pub mod logging;
pub mod medical;
pub mod models;
pub mod profile;
pub mod recommendations;
pub mod session;
pub mod zones;

// Re-export commonly used types for convenience
pub use models::*;
pub use alerts::{Alert, AlertKind, AlertSeverity};
pub use biometrics::BiometricEngine;
pub use clock::SessionClock;
pub use config::AppConfig;
pub use error::{BioSyncError, Result};
pub use export::{ExportFormat, SessionExport};
pub use history::{HistoryBuffer, SessionSummary};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use medical::{ReportAnalysis, ReportAnalyzer};
pub use profile::{ProfileInputs, UserProfile};
pub use recommendations::{Recommendation, RecommendationCategory, RecommendationId};
pub use session::{SessionPhase, Simulation, TickUpdate};
pub use zones::ZoneCalculator;
