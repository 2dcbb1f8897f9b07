pub mod billing;
pub mod conversation;
pub mod documents;
pub mod session;

use crate::backend::Backend;
use crate::events::DataEvent;
use billing::{BillingBridge, PaymentProcessor};
use conversation::ConversationSync;
use documents::DocumentController;
use session::SessionManager;
use slidenote_auth::{CredentialStore, IdentityProvider, Settings};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Manages background tasks for the controllers
/// Tracks running tasks and provides cancellation support
pub struct BackgroundTaskManager {
    tasks: HashMap<String, JoinHandle<()>>,
    next_id: u64,
}

impl BackgroundTaskManager {
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
            next_id: 0,
        }
    }

    /// Spawn a load task
    /// If a task with the same ID already exists, it will be cancelled first
    pub fn spawn_load_task<F>(&mut self, task_id: String, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        // Cancel existing task with same ID (prevents stale data)
        if let Some(handle) = self.tasks.remove(&task_id) {
            handle.abort();
        }

        let handle = tokio::spawn(future);
        self.tasks.insert(task_id, handle);
    }

    /// Spawn a task that must run to completion, even if another task with
    /// the same label is started (uploads, sends, deletes).
    pub fn spawn_detached<F>(&mut self, label: &str, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.prune();
        self.next_id += 1;
        let task_id = format!("{}#{}", label, self.next_id);
        self.tasks.insert(task_id, tokio::spawn(future));
    }

    /// Wait for every task spawned so far
    pub async fn join_all(&mut self) {
        let handles: Vec<_> = self.tasks.drain().map(|(_, handle)| handle).collect();
        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                if !e.is_cancelled() {
                    tracing::error!("Background task panicked: {}", e);
                }
            }
        }
    }

    pub fn is_idle(&self) -> bool {
        self.tasks.values().all(JoinHandle::is_finished)
    }

    /// Abort the task registered under `task_id`, if any
    pub fn cancel(&mut self, task_id: &str) {
        if let Some(handle) = self.tasks.remove(task_id) {
            tracing::debug!("Cancelling task {}", task_id);
            handle.abort();
        }
    }

    /// Cancel all running tasks (used on shutdown)
    pub fn cancel_all(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }

    fn prune(&mut self) {
        self.tasks.retain(|_, handle| !handle.is_finished());
    }
}

impl Default for BackgroundTaskManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BackgroundTaskManager {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

/// The controllers, shared with spawned tasks
#[derive(Clone)]
pub struct Services {
    pub session: Arc<SessionManager>,
    pub documents: DocumentController,
    pub conversations: ConversationSync,
    pub billing: BillingBridge,
}

impl Services {
    pub fn new(
        backend: Arc<dyn Backend>,
        store: Arc<dyn CredentialStore>,
        identity: Arc<dyn IdentityProvider>,
        processor: Arc<dyn PaymentProcessor>,
        settings: &Settings,
        data_tx: mpsc::UnboundedSender<DataEvent>,
    ) -> Self {
        let session = Arc::new(SessionManager::new(
            backend.clone(),
            store,
            identity,
            data_tx.clone(),
        ));
        let documents = DocumentController::new(
            session.clone(),
            backend.clone(),
            data_tx.clone(),
            settings.polling.interval(),
            settings.polling.timeout(),
        );
        let conversations = ConversationSync::new(session.clone(), backend.clone(), data_tx.clone());
        let billing = BillingBridge::new(
            session.clone(),
            backend,
            processor,
            settings.checkout.clone(),
            data_tx,
        );

        Self {
            session,
            documents,
            conversations,
            billing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn same_key_load_replaces_previous_task() {
        let mut manager = BackgroundTaskManager::new();
        let finished = Arc::new(AtomicUsize::new(0));

        let counter = finished.clone();
        manager.spawn_load_task("load".into(), async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = finished.clone();
        manager.spawn_load_task("load".into(), async move {
            counter.fetch_add(10, Ordering::SeqCst);
        });

        manager.join_all().await;
        assert_eq!(finished.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn cancelled_load_never_completes() {
        let mut manager = BackgroundTaskManager::new();
        let finished = Arc::new(AtomicUsize::new(0));

        let counter = finished.clone();
        manager.spawn_load_task("load".into(), async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            counter.fetch_add(1, Ordering::SeqCst);
        });
        manager.cancel("load");
        manager.cancel("missing");

        manager.join_all().await;
        assert_eq!(finished.load(Ordering::SeqCst), 0);
        assert!(manager.is_idle());
    }

    #[tokio::test]
    async fn detached_tasks_all_run() {
        let mut manager = BackgroundTaskManager::new();
        let finished = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let counter = finished.clone();
            manager.spawn_detached("send", async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        manager.join_all().await;
        assert_eq!(finished.load(Ordering::SeqCst), 3);
        assert!(manager.is_idle());
    }
}
