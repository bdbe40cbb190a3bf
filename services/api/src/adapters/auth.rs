//! services/api/src/adapters/auth.rs
//!
//! HTTP adapter for the external auth provider. The provider issues and
//! validates session tokens; this service trusts the identity claim it
//! returns and mirrors it into a local user row elsewhere.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use prog_helper_core::domain::Identity;
use prog_helper_core::ports::{IdentityProvider, PortError, PortResult};

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    user_id: String,
    email: Option<String>,
}

/// Verifies session tokens against the provider's REST API.
#[derive(Clone)]
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpIdentityProvider {
    pub fn new(client: reqwest::Client, base_url: String, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn verify_session(&self, token: &str) -> PortResult<Identity> {
        let mut request = self
            .client
            .get(format!("{}/v1/sessions/{}", self.base_url, token));
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("Auth provider unreachable: {e}")))?;

        match response.status() {
            StatusCode::OK => {
                let verified: VerifyResponse = response
                    .json()
                    .await
                    .map_err(|e| PortError::Unexpected(format!("Bad auth response: {e}")))?;
                Ok(Identity {
                    user_id: verified.user_id,
                    email: verified.email,
                })
            }
            StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND => Err(PortError::Unauthorized),
            status => Err(PortError::Unexpected(format!(
                "Auth provider returned {status}"
            ))),
        }
    }
}
