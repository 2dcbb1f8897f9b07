mod models;

use crate::common::IdentityAssertion;
use crate::error::AuthError;
use async_trait::async_trait;
use models::*;
use reqwest::Client;
use std::time::Duration;

const POLL_INTERVAL_MS: u64 = 2000;
const POLL_TIMEOUT_SECS: u64 = 300;

/// External sign-in flow that yields an identity assertion.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Run the provider flow. Suspends until the user finishes (or abandons)
    /// the browser step.
    async fn sign_in(&self) -> Result<IdentityAssertion, AuthError>;

    /// End the provider side of the session for this device.
    async fn revoke(&self) -> Result<(), AuthError>;
}

/// Browser sign-in brokered by the auth relay.
///
/// The relay hands out an authorization URL, the browser completes the
/// provider redirect there, and this client polls the relay until the
/// identity token is available.
pub struct RelayIdentityProvider {
    http_client: Client,
    relay_url: String,
    device_id: String,
}

impl RelayIdentityProvider {
    pub fn new(relay_url: String, device_id: String) -> Result<Self, AuthError> {
        let http_client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            http_client,
            relay_url: relay_url.trim_end_matches('/').to_string(),
            device_id,
        })
    }

    async fn initiate(&self) -> Result<(String, String), AuthError> {
        let url = format!("{}/auth/initiate", self.relay_url);
        let req = InitiateRequest {
            device_id: self.device_id.clone(),
        };

        let resp = self
            .http_client
            .post(&url)
            .json(&req)
            .send()
            .await?
            .error_for_status()?
            .json::<InitiateResponse>()
            .await?;

        Ok((resp.session_id, resp.authorization_url))
    }

    async fn poll_session(&self, session_id: &str) -> Result<IdentityAssertion, AuthError> {
        let url = format!("{}/auth/poll/{}", self.relay_url, session_id);
        let start = tokio::time::Instant::now();
        let timeout = Duration::from_secs(POLL_TIMEOUT_SECS);

        loop {
            if start.elapsed() > timeout {
                return Err(AuthError::Timeout(POLL_TIMEOUT_SECS));
            }

            let resp = self
                .http_client
                .get(&url)
                .query(&[("device_id", &self.device_id)])
                .send()
                .await?
                .error_for_status()?
                .json::<PollResponse>()
                .await?;

            match resp.status {
                SignInStatus::Completed => {
                    let token = resp
                        .id_token
                        .filter(|t| !t.is_empty())
                        .ok_or_else(|| AuthError::Provider("Missing identity token".into()))?;
                    return Ok(IdentityAssertion::new(token));
                }
                SignInStatus::Error(msg) => return Err(AuthError::Provider(msg)),
                SignInStatus::Expired => return Err(AuthError::SessionExpired),
                SignInStatus::Pending => {
                    tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

#[async_trait]
impl IdentityProvider for RelayIdentityProvider {
    async fn sign_in(&self) -> Result<IdentityAssertion, AuthError> {
        let (session_id, auth_url) = self.initiate().await?;
        tracing::info!("Sign-in session {} started", session_id);

        if let Err(e) = open::that(&auth_url) {
            tracing::warn!("Failed to open browser: {}", e);
            eprintln!("\nPlease open this URL in your browser to sign in:");
            eprintln!("{}\n", auth_url);
        }

        self.poll_session(&session_id).await
    }

    async fn revoke(&self) -> Result<(), AuthError> {
        let url = format!("{}/auth/revoke", self.relay_url);
        let req = RevokeRequest {
            device_id: self.device_id.clone(),
        };

        self.http_client
            .post(&url)
            .json(&req)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}
