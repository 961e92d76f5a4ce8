//! Unified error hierarchy for BioSync
//!
//! The simulation core never fails; errors come from profile validation,
//! session lifecycle misuse, recommendation completion, configuration
//! loading and export I/O.

use std::path::PathBuf;
use thiserror::Error;

use crate::recommendations::RecommendationId;

/// Top-level error type for all BioSync operations
#[derive(Debug, Error)]
pub enum BioSyncError {
    /// Profile validation errors
    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    /// Session lifecycle and interaction errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// History export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Onboarding profile validation errors
#[derive(Debug, Error, PartialEq)]
pub enum ProfileError {
    /// Required field left empty
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Numeric field outside its accepted range
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },

    /// Value that could not be interpreted
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

/// Session state machine errors
#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    /// `start` called while a session is already running
    #[error("A session is already running")]
    AlreadyRunning,

    /// Exercise type change requested while running and not allowed
    #[error("Exercise type cannot be changed while a session is running")]
    ExerciseLocked,

    /// No recommendation with the given id in the current session
    #[error("Recommendation not found: {id}")]
    RecommendationNotFound { id: RecommendationId },

    /// Recommendation exists but carries no remedial action
    #[error("Recommendation {id} is not actionable")]
    NotActionable { id: RecommendationId },

    /// Completion is one-way; a second completion is rejected
    #[error("Recommendation {id} is already completed")]
    AlreadyCompleted { id: RecommendationId },
}

/// Export errors
#[derive(Debug, Error)]
pub enum ExportError {
    /// Unsupported format
    #[error("Unsupported export format: {format}")]
    UnsupportedFormat { format: String },

    /// Nothing recorded yet
    #[error("No history to export")]
    EmptyHistory,

    /// Serialization failure
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Writing the output failed
    #[error("Export failed to {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        ExportError::Serialization(err.to_string())
    }
}

/// Result type alias for BioSync operations
pub type Result<T> = std::result::Result<T, BioSyncError>;

impl BioSyncError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            BioSyncError::Profile(_) => ErrorSeverity::Warning,
            BioSyncError::Session(SessionError::AlreadyCompleted { .. }) => ErrorSeverity::Info,
            BioSyncError::Session(_) => ErrorSeverity::Warning,
            BioSyncError::Export(ExportError::EmptyHistory) => ErrorSeverity::Warning,
            BioSyncError::Internal(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Find the BioSync error behind an `anyhow` chain, context included
    pub fn find_in_chain(err: &anyhow::Error) -> Option<&BioSyncError> {
        err.chain().find_map(|cause| cause.downcast_ref::<BioSyncError>())
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            BioSyncError::Profile(ProfileError::MissingField { field }) => {
                format!("Please fill in your {} to continue.", field)
            }
            BioSyncError::Profile(ProfileError::OutOfRange { field, min, max, .. }) => {
                format!("Your {} should be between {} and {}.", field, min, max)
            }
            BioSyncError::Session(SessionError::AlreadyRunning) => {
                "Stop the current session before starting a new one.".to_string()
            }
            BioSyncError::Session(SessionError::ExerciseLocked) => {
                "Stop the session to switch exercise type.".to_string()
            }
            BioSyncError::Export(ExportError::EmptyHistory) => {
                "Run a session before exporting its history.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}
