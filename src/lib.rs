// Entry Reconciler - Core Library
// Rewrites exported entry files so category/product references carry the
// canonical IDs of the target project, dropping references that no longer
// resolve.

pub mod model;
pub mod config;
pub mod logging;
pub mod resolver;        // Key → ID lookups
pub mod auth;            // Client-credentials tokens
pub mod reconciliation;  // Per-entry reconciliation
pub mod processor;       // Per-file load / rewrite
pub mod walker;          // Directory traversal
pub mod migration;       // Whole run

// Re-export commonly used types
pub use model::{
    BearerToken, Credentials, DocumentError, Entry, EntryDocument, GroupState,
    ReferenceKind, SummaryMap, SummaryRecord,
    merge_summary, reference_key, summary_json,
};
pub use config::{ConfigOverrides, MigrationConfig};
pub use logging::{init_logging, LinePrefixFormat};
pub use resolver::{HttpResolver, Resolution, ResolveError, Resolver};
pub use auth::{AuthError, CredentialAcquirer};
pub use reconciliation::ReconciliationEngine;
pub use processor::{FileError, FileProcessor};
pub use walker::{discover_entry_files, TreeWalker, WalkReport, ENTRY_FILE_SUFFIX};
pub use migration::{run, RunReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
