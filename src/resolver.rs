// 🔎 Resolver - maps a reference key to its canonical remote ID
//
//   GET {apiUrl}/{projectKey}/categories/key={key}
//   GET {apiUrl}/{projectKey}/products/key={key}
//
// A 404 (or a 200 without an `id`) is a removal signal, not an error.
// Every other failure is reported as `Failed` so the caller can log it at
// a different severity; the caller drops the reference either way.

use crate::model::{BearerToken, ReferenceKind};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

// ============================================================================
// RESOLUTION
// ============================================================================

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("lookup for key \"{key}\" returned HTTP {status}")]
    Http { key: String, status: u16 },

    #[error("lookup for key \"{key}\" failed: {detail}")]
    Network { key: String, detail: String },

    #[error("lookup for key \"{key}\" returned an unreadable body: {detail}")]
    Body { key: String, detail: String },
}

impl ResolveError {
    pub fn key(&self) -> &str {
        match self {
            ResolveError::Http { key, .. }
            | ResolveError::Network { key, .. }
            | ResolveError::Body { key, .. } => key,
        }
    }
}

/// Outcome of one lookup
#[derive(Debug)]
pub enum Resolution {
    Resolved(String),
    NotFound,
    Failed(ResolveError),
}

impl Resolution {
    pub fn into_id(self) -> Option<String> {
        match self {
            Resolution::Resolved(id) => Some(id),
            _ => None,
        }
    }
}

/// Key → ID lookup capability
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, kind: ReferenceKind, key: &str, token: &BearerToken) -> Resolution;
}

// ============================================================================
// HTTP RESOLVER
// ============================================================================

pub struct HttpResolver {
    client: Client,
    api_url: String,
    project_key: String,
}

impl HttpResolver {
    pub fn new(client: Client, api_url: &str, project_key: &str) -> Self {
        HttpResolver {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            project_key: project_key.to_string(),
        }
    }

    /// Lookup URL for one key. The key is percent-encoded.
    pub fn lookup_url(&self, kind: ReferenceKind, key: &str) -> String {
        format!(
            "{}/{}/{}/key={}",
            self.api_url,
            self.project_key,
            kind.path_segment(),
            urlencoding::encode(key)
        )
    }
}

#[async_trait]
impl Resolver for HttpResolver {
    async fn resolve(&self, kind: ReferenceKind, key: &str, token: &BearerToken) -> Resolution {
        let url = self.lookup_url(kind, key);
        debug!("GET {}", url);

        let response = match self
            .client
            .get(&url)
            .bearer_auth(token.as_str())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return Resolution::Failed(ResolveError::Network {
                    key: key.to_string(),
                    detail: e.to_string(),
                })
            }
        };

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            error!(
                "{} not found for key \"{}\". HTTP Status: 404",
                kind.label(),
                key
            );
            return Resolution::NotFound;
        }

        if !status.is_success() {
            error!(
                "Failed to fetch {} for key \"{}\". HTTP Status: {}",
                kind,
                key,
                status.as_u16()
            );
            return Resolution::Failed(ResolveError::Http {
                key: key.to_string(),
                status: status.as_u16(),
            });
        }

        match response.json::<Value>().await {
            Ok(body) => match extract_id(&body) {
                Some(id) => Resolution::Resolved(id),
                None => Resolution::NotFound,
            },
            Err(e) => Resolution::Failed(ResolveError::Body {
                key: key.to_string(),
                detail: e.to_string(),
            }),
        }
    }
}

/// `id` of a lookup body: a non-empty string, or a number
pub fn extract_id(body: &Value) -> Option<String> {
    match body.get("id")? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

// ============================================================================
// TESTS
// ============================================================================
