//! Plain-text export of an interpretation

use std::path::{Path, PathBuf};

use crate::api::InterpretationRecord;

/// Name used when saving the export to disk
pub const EXPORT_FILE_NAME: &str = "medical-interpretation.txt";

/// Text shared by the copy and download actions
pub fn export_text(record: &InterpretationRecord) -> String {
    format!(
        "Document Type: {}\nConfidence: {}%\n\n{}",
        record.document_type,
        record.confidence_percent(),
        record.summary
    )
}

/// Write the export into `dir`, returning the file path
pub async fn write_export(record: &InterpretationRecord, dir: &Path) -> std::io::Result<PathBuf> {
    let path = dir.join(EXPORT_FILE_NAME);
    tokio::fs::write(&path, export_text(record)).await?;
    tracing::info!(path = %path.display(), interpretation_id = %record.id, "Exported interpretation");
    Ok(path)
}
