// 🔑 Credential Acquirer - client-credentials exchange, one token per scope
//
//   POST {authUrl}
//   Authorization: Basic base64(clientId:clientSecret)
//   grant_type=client_credentials&scope={scope}
//
// Failing to obtain either token is fatal for the run.

use crate::config::MigrationConfig;
use crate::model::{BearerToken, Credentials};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token request for scope {scope} failed: {source}")]
    Request {
        scope: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to retrieve access token for scope {scope} (HTTP {status})")]
    MissingAccessToken { scope: String, status: u16 },
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

pub struct CredentialAcquirer {
    client: Client,
    auth_url: String,
    client_id: String,
    client_secret: String,
}

impl CredentialAcquirer {
    pub fn new(client: Client, auth_url: &str, client_id: &str, client_secret: &str) -> Self {
        CredentialAcquirer {
            client,
            auth_url: auth_url.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        }
    }

    pub fn from_config(client: Client, config: &MigrationConfig) -> Self {
        Self::new(
            client,
            &config.auth_url,
            &config.client_id,
            &config.client_secret,
        )
    }

    /// Exchange the client credentials for a token limited to `scope`
    pub async fn acquire_token(&self, scope: &str) -> Result<BearerToken, AuthError> {
        let response = self
            .client
            .post(&self.auth_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials"), ("scope", scope)])
            .send()
            .await
            .map_err(|source| AuthError::Request {
                scope: scope.to_string(),
                source,
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|source| AuthError::Request {
            scope: scope.to_string(),
            source,
        })?;

        // The endpoint is only trusted for `access_token`; status alone is not checked
        let token = serde_json::from_str::<TokenResponse>(&body)
            .ok()
            .and_then(|parsed| parsed.access_token)
            .filter(|token| !token.is_empty());

        match token {
            Some(token) => Ok(BearerToken::new(token)),
            None => {
                error!("Failed to retrieve access token");
                Err(AuthError::MissingAccessToken {
                    scope: scope.to_string(),
                    status,
                })
            }
        }
    }

    /// Both scoped tokens, category first. Stops at the first failure.
    pub async fn acquire_credentials(
        &self,
        category_scope: &str,
        product_scope: &str,
    ) -> Result<Credentials, AuthError> {
        let category = self.acquire_token(category_scope).await?;
        info!("Category auth token retrieved");

        let product = self.acquire_token(product_scope).await?;
        info!("Product auth token retrieved");

        Ok(Credentials { category, product })
    }
}
