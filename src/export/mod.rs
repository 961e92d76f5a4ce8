//! Session history export
//!
//! Snapshots can be written as CSV (one row per tick) or as a JSON
//! document that also carries session metadata and the summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ExportError;
use crate::history::SessionSummary;
use crate::models::{ExerciseType, HistorySnapshot};
use crate::session::Simulation;

pub mod csv;
pub mod json;

/// Export format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// Infer the format from a file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ExportError> {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        extension.parse()
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(ExportError::UnsupportedFormat {
                format: s.to_string(),
            }),
        }
    }
}

/// A session's history together with its metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionExport {
    pub session_id: Option<Uuid>,
    pub exported_at: DateTime<Utc>,
    pub exercise: ExerciseType,
    pub athlete: String,
    pub summary: Option<SessionSummary>,
    pub history: Vec<HistorySnapshot>,
}

impl SessionExport {
    pub fn from_simulation(simulation: &Simulation) -> Self {
        Self {
            session_id: simulation.session_id(),
            exported_at: Utc::now(),
            exercise: simulation.exercise().clone(),
            athlete: simulation.profile().name().to_string(),
            summary: simulation.summary(),
            history: simulation.history().to_vec(),
        }
    }
}

/// Write the session's history in the requested format
pub fn export_session<P: AsRef<Path>>(
    export: &SessionExport,
    format: ExportFormat,
    output_path: P,
) -> Result<(), ExportError> {
    if export.history.is_empty() {
        return Err(ExportError::EmptyHistory);
    }

    let path = output_path.as_ref();
    let result = match format {
        ExportFormat::Csv => csv::export_history(&export.history, path),
        ExportFormat::Json => json::export_json(export, path),
    };

    match &result {
        Ok(()) => tracing::info!(
            path = %path.display(),
            ?format,
            rows = export.history.len(),
            "Session history exported"
        ),
        Err(err) => tracing::error!(path = %path.display(), error = %err, "Export failed"),
    }

    result
}
