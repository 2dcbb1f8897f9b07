use crate::backend::Backend;
use crate::error::AppError;
use crate::events::DataEvent;
use crate::state::Alert;
use slidenote_auth::{CredentialStore, IdentityProvider, Session, StoredCredentials};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc;

/// Owns the single live [`Session`] for this device.
///
/// Readers take a clone; only this type writes it. Every authenticated
/// request captures the session once and keeps that token even if the
/// session is replaced or dropped while the request is in flight.
pub struct SessionManager {
    backend: Arc<dyn Backend>,
    store: Arc<dyn CredentialStore>,
    identity: Arc<dyn IdentityProvider>,
    session: RwLock<Option<Session>>,
    data_tx: mpsc::UnboundedSender<DataEvent>,
}

impl SessionManager {
    pub fn new(
        backend: Arc<dyn Backend>,
        store: Arc<dyn CredentialStore>,
        identity: Arc<dyn IdentityProvider>,
        data_tx: mpsc::UnboundedSender<DataEvent>,
    ) -> Self {
        Self {
            backend,
            store,
            identity,
            session: RwLock::new(None),
            data_tx,
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The session a request should run under.
    pub fn authorized(&self) -> Result<Session, AppError> {
        self.current().ok_or(AppError::SignedOut)
    }

    fn replace(&self, session: Option<Session>) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session;
    }

    fn is_current(&self, captured: &Session) -> bool {
        self.current()
            .is_some_and(|s| s.access_token == captured.access_token)
    }

    fn emit_established(&self, session: &Session) {
        let _ = self.data_tx.send(DataEvent::SessionEstablished {
            email: session.email.clone(),
            account_id: session.account_id.clone(),
        });
    }

    /// Adopt persisted credentials without contacting the server.
    pub fn restore_session(&self) -> Option<Session> {
        let stored = match self.store.load() {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!("Failed to read credential store: {}", e);
                return None;
            }
        };

        if stored.is_empty() {
            tracing::debug!("No stored credentials");
            return None;
        }

        let Some(session) = stored.into_session() else {
            tracing::info!("Stored credentials are incomplete, not restoring");
            return None;
        };

        tracing::info!("Restored session for {}", session.email);
        self.replace(Some(session.clone()));
        self.emit_established(&session);
        Some(session)
    }

    /// Run the identity flow and exchange the assertion for a session.
    pub async fn sign_in(&self) -> Result<Session, AppError> {
        match self.establish().await {
            Ok(session) => Ok(session),
            // A rejected assertion is only logged; the user stays signed out.
            Err(e) if e.is_auth() => {
                tracing::warn!("Sign-in rejected: {}", e);
                Err(e)
            }
            Err(e) => {
                tracing::error!("Sign-in failed: {}", e);
                let _ = self.data_tx.send(DataEvent::ShowAlert {
                    alert: Alert::failed("sign in", &e),
                });
                Err(e)
            }
        }
    }

    async fn establish(&self) -> Result<Session, AppError> {
        let assertion = self.identity.sign_in().await?;
        let exchange = self.backend.verify_id_token(&assertion).await?;

        if !exchange.is_accepted() {
            tracing::warn!("Identity assertion was rejected by the backend");
            return Err(AppError::Auth("identity assertion rejected".to_string()));
        }

        let session = Session {
            access_token: exchange.access_token.unwrap_or_default(),
            refresh_token: exchange.refresh_token.unwrap_or_default(),
            email: exchange.email.unwrap_or_default(),
            account_id: exchange
                .user_id
                .map(|id| id.into_inner())
                .unwrap_or_default(),
        };

        // Persist first so a crash after the event still restores next launch.
        if let Err(e) = self.store.save(&StoredCredentials::from(&session)) {
            tracing::error!("Failed to persist credentials: {}", e);
        }

        tracing::info!("Signed in as {}", session.email);
        self.replace(Some(session.clone()));
        self.emit_established(&session);

        // A failed refresh signs out again; the session itself was established.
        let _ = self.refresh_account_state().await;

        Ok(self.current().unwrap_or(session))
    }

    /// End the session locally. Remote revocation and store clearing are
    /// best effort.
    pub async fn sign_out(&self) {
        self.replace(None);

        if let Err(e) = self.identity.revoke().await {
            tracing::warn!("Failed to revoke provider session: {}", e);
        }

        if let Err(e) = self.store.clear() {
            tracing::error!("Failed to clear credential store: {}", e);
        }

        tracing::info!("Signed out");
        let _ = self.data_tx.send(DataEvent::SignedOut);
    }

    /// Reload account id and subscription. Any failure ends the session.
    pub async fn refresh_account_state(&self) -> Result<(), AppError> {
        let session = self.authorized()?;

        match self.backend.get_user_data(&session.access_token).await {
            Ok(user) => {
                let account_id = user
                    .id
                    .filter(|id| !id.is_blank())
                    .map(|id| id.into_inner());

                if let Some(id) = account_id.as_ref() {
                    self.adopt_account_id(&session, id);
                }

                tracing::debug!("Account state refreshed");
                let _ = self.data_tx.send(DataEvent::AccountStateLoaded {
                    account_id,
                    subscription: user.subscription,
                });
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to refresh account state: {}", e);
                if self.is_current(&session) {
                    self.sign_out().await;
                }
                Err(e)
            }
        }
    }

    fn adopt_account_id(&self, captured: &Session, account_id: &str) {
        if captured.account_id == account_id || !self.is_current(captured) {
            return;
        }

        let updated = Session {
            account_id: account_id.to_string(),
            ..captured.clone()
        };
        if let Err(e) = self.store.save(&StoredCredentials::from(&updated)) {
            tracing::error!("Failed to persist account id: {}", e);
        }
        self.replace(Some(updated));
    }

    /// Credential rejections from any authenticated call end the session,
    /// unless it was already replaced after the request started.
    pub async fn handle_failure(&self, captured: &Session, err: &AppError) {
        if err.is_auth() && self.is_current(captured) {
            tracing::warn!("Credentials rejected, signing out");
            self.sign_out().await;
        }
    }
}
