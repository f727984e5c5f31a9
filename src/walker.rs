// 🌲 Tree Walker - find every `*-entries.json` under the entries root
//
// Files are processed strictly one at a time. Directory listings are sorted
// by name so two runs over the same tree log in the same order.

use crate::model::{merge_summary, summary_json, Credentials, SummaryMap};
use crate::processor::{display_name, FileProcessor};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const ENTRY_FILE_SUFFIX: &str = "-entries.json";

/// Aggregate result of one walk
#[derive(Debug, Clone, Default, Serialize)]
pub struct WalkReport {
    pub summary: SummaryMap,
    pub files_processed: usize,
    pub files_failed: usize,
}

pub struct TreeWalker {
    processor: FileProcessor,
}

impl TreeWalker {
    pub fn new(processor: FileProcessor) -> Self {
        TreeWalker { processor }
    }

    /// Process every entry file under `root`, folding per-file summaries
    /// into one map (last write wins per entry-ID).
    ///
    /// Only an unreadable `root` is an error; per-file failures are logged
    /// and counted.
    pub async fn walk(&self, root: &Path, credentials: &Credentials) -> Result<WalkReport> {
        let files = discover_entry_files(root)?;
        let mut report = WalkReport::default();

        for path in files {
            info!("Processing file: {}", display_name(&path));

            // The processor has already logged a failure
            match self.processor.process_file(&path, credentials).await {
                Ok(summary) => {
                    report.files_processed += 1;
                    merge_summary(&mut report.summary, summary);
                }
                Err(_) => report.files_failed += 1,
            }
        }

        if !report.summary.is_empty() {
            info!("All updated entries: {}", summary_json(&report.summary));
        }

        Ok(report)
    }
}

pub fn is_entry_file(name: &str) -> bool {
    name.ends_with(ENTRY_FILE_SUFFIX)
}

/// All entry files under `root`, depth-first, siblings in name order.
/// Symlinks are not followed.
pub fn discover_entry_files(root: &Path) -> Result<Vec<PathBuf>> {
    let metadata = fs::metadata(root)
        .with_context(|| format!("Entries directory not found: {:?}", root))?;
    if !metadata.is_dir() {
        bail!("Entries path is not a directory: {:?}", root);
    }

    let mut files = Vec::new();
    visit(root, &mut files).with_context(|| format!("Failed to list {:?}", root))?;
    Ok(files)
}

fn visit(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    let mut children = fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
    children.sort_by_key(|child| child.file_name());

    for child in children {
        let path = child.path();
        let file_type = child.file_type()?;

        if file_type.is_dir() {
            // A bad subtree should not cost the rest of the walk
            if let Err(e) = visit(&path, files) {
                error!("Skipping directory {:?}: {}", path, e);
            }
        } else if file_type.is_file() && is_entry_file(&child.file_name().to_string_lossy()) {
            files.push(path);
        }
    }

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
