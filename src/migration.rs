// 🚚 Migration Run - credentials first, then the tree walk
//
// Token acquisition is the only hard failure: if either scope is refused
// the run stops before any entry file is opened.

use crate::auth::CredentialAcquirer;
use crate::config::MigrationConfig;
use crate::processor::FileProcessor;
use crate::reconciliation::ReconciliationEngine;
use crate::resolver::HttpResolver;
use crate::walker::{TreeWalker, WalkReport};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub walk: WalkReport,
}

impl RunReport {
    pub fn summary(&self) -> String {
        format!(
            "Processed {} file(s), {} failed, {} entr{} updated in {:.1}s",
            self.walk.files_processed,
            self.walk.files_failed,
            self.walk.summary.len(),
            if self.walk.summary.len() == 1 { "y" } else { "ies" },
            (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
        )
    }
}

/// Run one full migration pass described by `config`
pub async fn run(config: &MigrationConfig) -> Result<RunReport> {
    config.validate()?;
    let started_at = Utc::now();

    let client = Client::builder()
        .build()
        .context("Failed to create HTTP client")?;

    info!("Starting the process...");

    let acquirer = CredentialAcquirer::from_config(client.clone(), config);
    let credentials = acquirer
        .acquire_credentials(&config.category_scope, &config.product_scope)
        .await
        .context("Credential acquisition failed")?;

    let resolver = HttpResolver::new(client, config.api_base(), &config.project_key);
    let walker = TreeWalker::new(FileProcessor::new(ReconciliationEngine::new(Arc::new(
        resolver,
    ))));

    let walk = walker.walk(&config.entries_dir(), &credentials).await?;

    info!("Process completed successfully.");

    Ok(RunReport {
        started_at,
        finished_at: Utc::now(),
        walk,
    })
}
