use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use entry_reconciler::{init_logging, run, ConfigOverrides, MigrationConfig};

/// Resolve category/product reference keys in exported entry files
#[derive(Debug, Parser)]
#[command(name = "entry-reconciler", version)]
struct Cli {
    /// JSON config file (defaults to ./dest.config.json when present)
    #[arg(long, env = "ENTRY_RECONCILER_CONFIG")]
    config: Option<PathBuf>,

    /// Export root containing the `entries` directory
    #[arg(long, env = "ENTRY_RECONCILER_DATA_PATH")]
    data_path: Option<PathBuf>,

    #[arg(long, env = "ENTRY_RECONCILER_PROJECT_KEY")]
    project_key: Option<String>,

    #[arg(long, env = "ENTRY_RECONCILER_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "ENTRY_RECONCILER_AUTH_URL")]
    auth_url: Option<String>,

    #[arg(long, env = "ENTRY_RECONCILER_CLIENT_ID")]
    client_id: Option<String>,

    #[arg(long, env = "ENTRY_RECONCILER_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    #[arg(long, env = "ENTRY_RECONCILER_CATEGORY_SCOPE")]
    category_scope: Option<String>,

    #[arg(long, env = "ENTRY_RECONCILER_PRODUCT_SCOPE")]
    product_scope: Option<String>,

    /// Append-only log file
    #[arg(long, env = "ENTRY_RECONCILER_LOG_FILE")]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            exported_data_path: self.data_path.clone(),
            project_key: self.project_key.clone(),
            api_url: self.api_url.clone(),
            auth_url: self.auth_url.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            category_scope: self.category_scope.clone(),
            product_scope: self.product_scope.clone(),
            log_file: self.log_file.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = MigrationConfig::load(cli.config.as_deref())?;
    config.apply(cli.overrides());

    init_logging(&config.log_file)?;

    match run(&config).await {
        Ok(report) => {
            info!("{}", report.summary());
            Ok(())
        }
        Err(e) => {
            error!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
