// ⚖️ Reconciliation Engine - resolve, filter and rewrite an entry's references
//
// For category and product independently:
//   1. skip unless `<kind>.data` is a non-empty list
//   2. launch one lookup task per reference, await all of them
//   3. zip results back onto the references by position (keys may repeat)
//   4. keep resolved references with their new `id`, drop the rest
//   5. nothing left → `<kind>` becomes `{}`
//
// A failed or panicking lookup drops exactly one reference. Siblings and the
// other kind always run to completion.

use crate::model::{BearerToken, Credentials, Entry, ReferenceKind, SummaryRecord};
use crate::resolver::{Resolution, Resolver};
use futures::future::join_all;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

// ============================================================================
// RECONCILIATION ENGINE
// ============================================================================

#[derive(Clone)]
pub struct ReconciliationEngine {
    resolver: Arc<dyn Resolver>,
}

impl ReconciliationEngine {
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        ReconciliationEngine { resolver }
    }

    /// Reconcile one entry in place.
    ///
    /// Returns the summary fragment for `entry_id`: the key of the last
    /// surviving reference of each kind, if any survived.
    ///
    /// Example:
    /// ```ignore
    /// let engine = ReconciliationEngine::new(Arc::new(resolver));
    /// let fragment = engine.reconcile(&mut entry, "e1", &credentials).await;
    /// assert_eq!(fragment.category_key.as_deref(), Some("k1"));
    /// ```
    pub async fn reconcile(
        &self,
        entry: &mut Entry,
        entry_id: &str,
        credentials: &Credentials,
    ) -> SummaryRecord {
        // Both kinds are launched before either is awaited
        let category = self.launch(entry, ReferenceKind::Category, entry_id, credentials);
        let product = self.launch(entry, ReferenceKind::Product, entry_id, credentials);

        let (category, product) = futures::join!(
            collect(category, ReferenceKind::Category, entry_id),
            collect(product, ReferenceKind::Product, entry_id),
        );

        let mut fragment = SummaryRecord::default();
        for (kind, resolved) in [
            (ReferenceKind::Category, category),
            (ReferenceKind::Product, product),
        ] {
            let Some(resolved) = resolved else { continue };
            if let Some(key) = entry.apply_resolutions(kind, resolved) {
                fragment.set_key(kind, key);
            }
        }

        fragment
    }

    /// Spawn one lookup task per reference of `kind`, in reference order
    fn launch(
        &self,
        entry: &Entry,
        kind: ReferenceKind,
        entry_id: &str,
        credentials: &Credentials,
    ) -> Option<Vec<JoinHandle<Option<String>>>> {
        let keys = entry.reference_keys(kind)?;
        let token = credentials.token_for(kind);

        let handles = keys
            .into_iter()
            .map(|key| {
                tokio::spawn(resolve_reference(
                    Arc::clone(&self.resolver),
                    kind,
                    key,
                    entry_id.to_string(),
                    token.clone(),
                ))
            })
            .collect();

        Some(handles)
    }
}

/// Await every task; slot `i` is the id for reference `i`, or `None` if it
/// must be dropped.
async fn collect(
    handles: Option<Vec<JoinHandle<Option<String>>>>,
    kind: ReferenceKind,
    entry_id: &str,
) -> Option<Vec<Option<String>>> {
    let handles = handles?;
    let results = join_all(handles).await;

    Some(
        results
            .into_iter()
            .enumerate()
            .map(|(index, joined)| match joined {
                Ok(resolved) => resolved,
                Err(e) => {
                    error!(
                        "Lookup task for {} #{} of Entry ID: {} aborted: {}",
                        kind, index, entry_id, e
                    );
                    None
                }
            })
            .collect(),
    )
}

/// One reference: log, check the key, ask the resolver
async fn resolve_reference(
    resolver: Arc<dyn Resolver>,
    kind: ReferenceKind,
    key: Option<String>,
    entry_id: String,
    token: BearerToken,
) -> Option<String> {
    info!("Processing {} for Entry ID: {}", kind, entry_id);

    let Some(key) = key else {
        error!(
            "Entry ID: {} - Invalid or missing {} data",
            entry_id, kind
        );
        return None;
    };

    match resolver.resolve(kind, &key, &token).await {
        Resolution::Resolved(id) => Some(id),
        Resolution::NotFound => {
            error!(
                "{} key \"{}\" not found for Entry ID: {}, removing it",
                kind.label(),
                key,
                entry_id
            );
            None
        }
        Resolution::Failed(e) => {
            error!(
                "Exception while processing {} key \"{}\": {}",
                kind, key, e
            );
            None
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
