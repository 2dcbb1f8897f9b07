use super::session::SessionManager;
use crate::backend::Backend;
use crate::error::AppError;
use crate::events::DataEvent;
use crate::state::Alert;
use async_trait::async_trait;
use reqwest::Url;
use slidenote_api::endpoints::account::SubscriptionAction;
use slidenote_auth::CheckoutSettings;
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutKind {
    /// Recurring plan
    Subscription,
    /// One-time credit pack
    OneTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutMode {
    Subscription,
    Payment,
}

impl CheckoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subscription => "subscription",
            Self::Payment => "payment",
        }
    }
}

impl Display for CheckoutMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub price_id: String,
    pub mode: CheckoutMode,
    pub client_reference_id: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// Hands a checkout to the external payment processor.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn redirect_to_checkout(&self, request: &CheckoutRequest) -> Result<(), AppError>;
}

/// Opens the hosted checkout page in the default browser.
pub struct BrowserCheckout {
    checkout_url: String,
}

impl BrowserCheckout {
    pub fn new(checkout_url: impl Into<String>) -> Self {
        Self {
            checkout_url: checkout_url.into(),
        }
    }

    pub fn checkout_url(&self, request: &CheckoutRequest) -> Result<Url, AppError> {
        Url::parse_with_params(
            &self.checkout_url,
            &[
                ("price", request.price_id.as_str()),
                ("quantity", "1"),
                ("mode", request.mode.as_str()),
                ("client_reference_id", request.client_reference_id.as_str()),
                ("success_url", request.success_url.as_str()),
                ("cancel_url", request.cancel_url.as_str()),
            ],
        )
        .map_err(|e| AppError::Checkout(e.to_string()))
    }
}

#[async_trait]
impl PaymentProcessor for BrowserCheckout {
    async fn redirect_to_checkout(&self, request: &CheckoutRequest) -> Result<(), AppError> {
        let url = self.checkout_url(request)?;
        if let Err(e) = open::that(url.as_str()) {
            tracing::warn!("Failed to open browser: {}", e);
            eprintln!("\nPlease open this URL in your browser to complete checkout:");
            eprintln!("{}\n", url);
        }
        Ok(())
    }
}

/// Checkout redirects and subscription changes.
#[derive(Clone)]
pub struct BillingBridge {
    session: Arc<SessionManager>,
    backend: Arc<dyn Backend>,
    processor: Arc<dyn PaymentProcessor>,
    checkout: CheckoutSettings,
    data_tx: mpsc::UnboundedSender<DataEvent>,
}

impl BillingBridge {
    pub fn new(
        session: Arc<SessionManager>,
        backend: Arc<dyn Backend>,
        processor: Arc<dyn PaymentProcessor>,
        checkout: CheckoutSettings,
        data_tx: mpsc::UnboundedSender<DataEvent>,
    ) -> Self {
        Self {
            session,
            backend,
            processor,
            checkout,
            data_tx,
        }
    }

    pub fn checkout_request(
        &self,
        kind: CheckoutKind,
        account_id: &str,
    ) -> Result<CheckoutRequest, AppError> {
        if account_id.trim().is_empty() {
            tracing::error!("Invalid account id for checkout: {:?}", account_id);
            return Err(AppError::MissingAccountId);
        }

        let (price_id, mode) = match kind {
            CheckoutKind::Subscription => (
                self.checkout.subscription_price_id.clone(),
                CheckoutMode::Subscription,
            ),
            CheckoutKind::OneTime => (self.checkout.onetime_price_id.clone(), CheckoutMode::Payment),
        };

        Ok(CheckoutRequest {
            price_id,
            mode,
            client_reference_id: account_id.to_string(),
            success_url: self.checkout.return_url.clone(),
            cancel_url: self.checkout.return_url.clone(),
        })
    }

    pub async fn start_checkout(&self, kind: CheckoutKind) -> Result<(), AppError> {
        let account_id = self
            .session
            .current()
            .map(|session| session.account_id)
            .unwrap_or_default();
        let request = self.checkout_request(kind, &account_id)?;

        tracing::info!("Starting {} checkout", request.mode);
        if let Err(e) = self.processor.redirect_to_checkout(&request).await {
            tracing::error!("Checkout redirect failed: {}", e);
            let _ = self.data_tx.send(DataEvent::ShowAlert {
                alert: Alert::failed("start checkout", &e),
            });
            return Err(e);
        }
        Ok(())
    }

    pub async fn modify_subscription(&self, action: SubscriptionAction) -> Result<(), AppError> {
        let session = self.session.authorized()?;

        tracing::info!("Modifying subscription: {}", action);
        match self
            .backend
            .modify_subscription(&session.access_token, action)
            .await
        {
            Ok(subscription) => {
                let _ = self
                    .data_tx
                    .send(DataEvent::SubscriptionUpdated { subscription });
                let _ = self.session.refresh_account_state().await;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to modify subscription: {}", e);
                self.session.handle_failure(&session, &e).await;
                if !e.is_auth() {
                    let _ = self.data_tx.send(DataEvent::ShowAlert {
                        alert: Alert::failed("update subscription", &e),
                    });
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(mode: CheckoutMode) -> CheckoutRequest {
        CheckoutRequest {
            price_id: "price_1".into(),
            mode,
            client_reference_id: "42".into(),
            success_url: "https://slidenote.app".into(),
            cancel_url: "https://slidenote.app".into(),
        }
    }

    #[test]
    fn checkout_url_carries_request_fields() {
        let checkout = BrowserCheckout::new("https://checkout.example/session");
        let url = checkout.checkout_url(&request(CheckoutMode::Payment)).unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert!(pairs.contains(&("price".into(), "price_1".into())));
        assert!(pairs.contains(&("mode".into(), "payment".into())));
        assert!(pairs.contains(&("client_reference_id".into(), "42".into())));
        assert!(pairs.contains(&("success_url".into(), "https://slidenote.app".into())));
    }

    #[test]
    fn invalid_base_url_is_a_checkout_error() {
        let checkout = BrowserCheckout::new("not a url");
        let err = checkout
            .checkout_url(&request(CheckoutMode::Subscription))
            .unwrap_err();
        assert!(matches!(err, AppError::Checkout(_)));
    }
}
