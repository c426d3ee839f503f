// src/save.rs

use std::{io, path::Path};
use tracing::{error, info};

use crate::csv_io::write_table;
use crate::table::Table;

/// Result of one save attempt. Failures are reported, never raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { rows: usize },
    /// The target is locked or not writable.
    PermissionDenied,
    Failed(String),
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved { .. })
    }
}

/// True if any error in the chain is an I/O permission failure,
/// including the ones `csv` wraps.
fn is_permission_denied(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return io_err.kind() == io::ErrorKind::PermissionDenied;
        }
        if let Some(csv_err) = cause.downcast_ref::<csv::Error>() {
            if let csv::ErrorKind::Io(io_err) = csv_err.kind() {
                return io_err.kind() == io::ErrorKind::PermissionDenied;
            }
        }
        false
    })
}

/// Write `table` as `;`-separated UTF-8 with a header row and no index column.
pub fn save_combined_dataset<P: AsRef<Path>>(table: &Table, path: P) -> SaveOutcome {
    let path = path.as_ref();
    match write_table(table, path) {
        Ok(()) => {
            info!(path = %path.display(), rows = table.len(), "saved");
            SaveOutcome::Saved { rows: table.len() }
        }
        Err(e) if is_permission_denied(&e) => {
            error!(
                path = %path.display(),
                "permission denied; make sure the file is not open elsewhere"
            );
            SaveOutcome::PermissionDenied
        }
        Err(e) => {
            error!(path = %path.display(), error = %format!("{:#}", e), "save failed");
            SaveOutcome::Failed(format!("{:#}", e))
        }
    }
}
