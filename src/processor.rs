// 📄 Entry-File Processor - one `*-entries.json` document per call
//
// Load → reconcile every entry in file order → reset publish_details on
// entries left without references → write back → return the summary.
// Any failure is scoped to this file: it is logged once, here, and the
// file contributes nothing.

use crate::model::{
    summary_json, Credentials, DocumentError, EntryDocument, SummaryMap,
};
use crate::reconciliation::ReconciliationEngine;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum FileError {
    #[error("failed to read file: {0}")]
    Read(#[source] io::Error),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("failed to serialize document: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to write file: {0}")]
    Write(#[source] io::Error),
}

pub struct FileProcessor {
    engine: ReconciliationEngine,
}

impl FileProcessor {
    pub fn new(engine: ReconciliationEngine) -> Self {
        FileProcessor { engine }
    }

    /// Process one file. A file-scoped error is logged here and returned;
    /// callers only need it to tell failed files apart.
    pub async fn process_file(
        &self,
        path: &Path,
        credentials: &Credentials,
    ) -> Result<SummaryMap, FileError> {
        self.rewrite(path, credentials).await.map_err(|e| {
            error!("Error processing {}: {}", display_name(path), e);
            e
        })
    }

    async fn rewrite(&self, path: &Path, credentials: &Credentials) -> Result<SummaryMap, FileError> {
        let raw = fs::read_to_string(path).map_err(FileError::Read)?;
        let mut document = EntryDocument::from_json(&raw)?;
        let mut summary = SummaryMap::new();

        for (entry_id, entry) in document.entries_mut() {
            let fragment = self.engine.reconcile(entry, entry_id, credentials).await;

            if entry.is_unreferenced() {
                entry.clear_publish_details();
            }

            if !fragment.is_empty() {
                summary.insert(entry_id.clone(), fragment);
            }
        }

        let rendered = document.to_pretty_json().map_err(FileError::Serialize)?;
        write_atomically(path, &rendered).map_err(FileError::Write)?;

        info!("Entry Map: {}", summary_json(&summary));
        Ok(summary)
    }
}

/// File name for log lines, falling back to the full path
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Replace `path` with `contents` via a sibling temp file and a rename.
/// The original's permissions carry over.
pub fn write_atomically(path: &Path, contents: &str) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    if let Ok(metadata) = fs::metadata(path) {
        tmp.as_file().set_permissions(metadata.permissions())?;
    }
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
