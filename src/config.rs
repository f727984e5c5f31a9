// ⚙️ Migration Config - where the export lives and how to reach the APIs
//
// Loaded from a JSON file using the export tool's key names:
//
//   {
//     "ExportedDataPath": "./export",
//     "projectKey": "my-project",
//     "apiUrl": "https://api.example.com",
//     "authUrl": "https://auth.example.com/oauth/token",
//     "clientId": "...",
//     "clientSecret": "..."
//   }
//
// Command-line flags / environment variables override individual fields.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "dest.config.json";
pub const DEFAULT_LOG_FILE: &str = "app.log";
pub const DEFAULT_CATEGORY_SCOPE: &str = "view_categories:cms-95";
pub const DEFAULT_PRODUCT_SCOPE: &str = "view_products:cms-95";

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationConfig {
    /// Export root; entry files live under `<root>/entries`
    #[serde(rename = "ExportedDataPath", default)]
    pub exported_data_path: PathBuf,

    #[serde(default)]
    pub project_key: String,

    #[serde(default)]
    pub api_url: String,

    #[serde(default)]
    pub auth_url: String,

    #[serde(default)]
    pub client_id: String,

    #[serde(default)]
    pub client_secret: String,

    #[serde(default = "default_category_scope")]
    pub category_scope: String,

    #[serde(default = "default_product_scope")]
    pub product_scope: String,

    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

fn default_category_scope() -> String {
    DEFAULT_CATEGORY_SCOPE.to_string()
}

fn default_product_scope() -> String {
    DEFAULT_PRODUCT_SCOPE.to_string()
}

fn default_log_file() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_FILE)
}

impl Default for MigrationConfig {
    fn default() -> Self {
        MigrationConfig {
            exported_data_path: PathBuf::new(),
            project_key: String::new(),
            api_url: String::new(),
            auth_url: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            category_scope: default_category_scope(),
            product_scope: default_product_scope(),
            log_file: default_log_file(),
        }
    }
}

impl fmt::Debug for MigrationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationConfig")
            .field("exported_data_path", &self.exported_data_path)
            .field("project_key", &self.project_key)
            .field("api_url", &self.api_url)
            .field("auth_url", &self.auth_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("category_scope", &self.category_scope)
            .field("product_scope", &self.product_scope)
            .field("log_file", &self.log_file)
            .finish()
    }
}

/// Per-field overrides, typically from the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub exported_data_path: Option<PathBuf>,
    pub project_key: Option<String>,
    pub api_url: Option<String>,
    pub auth_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub category_scope: Option<String>,
    pub product_scope: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl MigrationConfig {
    /// Load config from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config JSON: {:?}", path.as_ref()))
    }

    /// Explicit path must exist. Without one, the default file is used when
    /// present, otherwise every value has to come from overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(DEFAULT_CONFIG_FILE)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(v) = overrides.exported_data_path {
            self.exported_data_path = v;
        }
        if let Some(v) = overrides.project_key {
            self.project_key = v;
        }
        if let Some(v) = overrides.api_url {
            self.api_url = v;
        }
        if let Some(v) = overrides.auth_url {
            self.auth_url = v;
        }
        if let Some(v) = overrides.client_id {
            self.client_id = v;
        }
        if let Some(v) = overrides.client_secret {
            self.client_secret = v;
        }
        if let Some(v) = overrides.category_scope {
            self.category_scope = v;
        }
        if let Some(v) = overrides.product_scope {
            self.product_scope = v;
        }
        if let Some(v) = overrides.log_file {
            self.log_file = v;
        }
    }

    /// Reject blank required values
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("ExportedDataPath", self.exported_data_path.as_os_str().is_empty()),
            ("projectKey", self.project_key.trim().is_empty()),
            ("apiUrl", self.api_url.trim().is_empty()),
            ("authUrl", self.auth_url.trim().is_empty()),
            ("clientId", self.client_id.trim().is_empty()),
            ("clientSecret", self.client_secret.is_empty()),
            ("categoryScope", self.category_scope.trim().is_empty()),
            ("productScope", self.product_scope.trim().is_empty()),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, blank)| *blank)
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            bail!("Missing required configuration: {}", missing.join(", "));
        }
        Ok(())
    }

    pub fn entries_dir(&self) -> PathBuf {
        self.exported_data_path.join("entries")
    }

    pub fn api_base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }
}

// ============================================================================
// TESTS
// ============================================================================
