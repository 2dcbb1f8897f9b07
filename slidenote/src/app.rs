use anyhow::Result;
use slidenote_auth::{
    CredentialStore, DeviceIdStore, FileCredentialStore, IdentityProvider, RelayIdentityProvider,
    Settings,
};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::app_core::{AppCore, TaskHandler};
use crate::backend::{Backend, HttpBackend};
use crate::background::billing::{BrowserCheckout, PaymentProcessor};
use crate::background::Services;
use crate::events::{AppCommand, DataEvent};
use crate::state::AppState;

/// The running client: an [`AppCore`] wired to the real controllers and the
/// channel their results come back on.
pub struct App {
    core: AppCore<TaskHandler>,
    data_rx: mpsc::UnboundedReceiver<DataEvent>,
}

impl App {
    pub fn new(
        settings: &Settings,
        backend: Arc<dyn Backend>,
        store: Arc<dyn CredentialStore>,
        identity: Arc<dyn IdentityProvider>,
        processor: Arc<dyn PaymentProcessor>,
    ) -> Self {
        let (data_tx, data_rx) = mpsc::unbounded_channel();
        let services = Services::new(backend, store, identity, processor, settings, data_tx);

        Self {
            core: AppCore::new(TaskHandler::new(services)),
            data_rx,
        }
    }

    /// Build the production wiring from configuration.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let device_id = DeviceIdStore::new()?.load_or_create()?;
        let identity = RelayIdentityProvider::new(settings.auth_relay_url.clone(), device_id)?;

        Ok(Self::new(
            settings,
            Arc::new(HttpBackend::new(settings.backend_url.clone())),
            Arc::new(FileCredentialStore::new()?),
            Arc::new(identity),
            Arc::new(BrowserCheckout::new(settings.checkout.url.clone())),
        ))
    }

    pub fn dispatch(&mut self, command: AppCommand) {
        tracing::debug!("Executing command: {:?}", command);
        self.core.dispatch(command);
    }

    pub fn state(&self) -> &AppState {
        self.core.state()
    }

    /// Apply every event already delivered, without waiting.
    pub fn drain_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.data_rx.try_recv() {
            tracing::debug!("Received data event: {:?}", event);
            self.core.handle_data_event(event);
            applied += 1;
        }
        applied
    }

    /// Run background work to completion, folding results into state as
    /// they arrive. Events may trigger follow-up loads, which are awaited too.
    pub async fn settle(&mut self) {
        loop {
            self.core.handler_mut().task_manager().join_all().await;
            if self.drain_events() == 0 && self.core.handler_mut().task_manager().is_idle() {
                break;
            }
        }
    }

    /// Abort outstanding work (used on shutdown)
    pub fn shutdown(&mut self) {
        tracing::info!("Cancelling background tasks");
        self.core.handler_mut().task_manager().cancel_all();
    }
}
