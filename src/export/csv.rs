use std::path::Path;

use crate::error::ExportError;
use crate::models::HistorySnapshot;

/// Export history snapshots to CSV, one row per tick
pub fn export_history<P: AsRef<Path>>(
    history: &[HistorySnapshot],
    output_path: P,
) -> Result<(), ExportError> {
    let path = output_path.as_ref();
    let mut writer = ::csv::Writer::from_path(path).map_err(|e| ExportError::WriteFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    for snapshot in history {
        writer.serialize(snapshot)?;
    }

    writer.flush().map_err(|e| ExportError::WriteFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    Ok(())
}

/// Render history snapshots as an in-memory CSV string
pub fn history_to_string(history: &[HistorySnapshot]) -> Result<String, ExportError> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    for snapshot in history {
        writer.serialize(snapshot)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Serialization(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Serialization(e.to_string()))
}
