use std::io::Write;
use std::path::Path;

use crate::error::ExportError;

/// Export any serializable data structure to JSON
pub fn export_json<T, P>(data: &T, output_path: P) -> Result<(), ExportError>
where
    T: serde::Serialize,
    P: AsRef<Path>,
{
    let json_data = serde_json::to_string_pretty(data)?;

    let path = output_path.as_ref();
    let mut file = std::fs::File::create(path).map_err(|e| ExportError::WriteFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    file.write_all(json_data.as_bytes())
        .map_err(|e| ExportError::WriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    Ok(())
}
