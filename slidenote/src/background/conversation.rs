use super::session::SessionManager;
use crate::backend::Backend;
use crate::error::AppError;
use crate::events::DataEvent;
use crate::state::{Alert, ThreadKey};
use slidenote_api::endpoints::conversations::Message;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Keeps per-slide conversation threads in sync with the backend.
#[derive(Clone)]
pub struct ConversationSync {
    session: Arc<SessionManager>,
    backend: Arc<dyn Backend>,
    data_tx: mpsc::UnboundedSender<DataEvent>,
}

/// A locally composed message, stamped now.
pub fn user_message(text: &str) -> Message {
    new_message(text, true)
}

fn new_message(text: &str, is_from_user: bool) -> Message {
    Message {
        id: Uuid::new_v4().to_string(),
        text: text.to_string(),
        is_from_user,
        timestamp_ms: chrono::Utc::now().timestamp_millis(),
    }
}

impl ConversationSync {
    pub fn new(
        session: Arc<SessionManager>,
        backend: Arc<dyn Backend>,
        data_tx: mpsc::UnboundedSender<DataEvent>,
    ) -> Self {
        Self {
            session,
            backend,
            data_tx,
        }
    }

    pub async fn load_thread(&self, key: ThreadKey) {
        let session = match self.session.authorized() {
            Ok(session) => session,
            Err(_) => return,
        };

        tracing::debug!("Loading thread {}", key);
        match self
            .backend
            .get_conversation(&session.access_token, &key)
            .await
        {
            Ok(messages) => {
                tracing::debug!("Loaded {} messages for {}", messages.len(), key);
                let _ = self.data_tx.send(DataEvent::ThreadLoaded { key, messages });
            }
            Err(e) => {
                tracing::error!("Failed to load thread {}: {}", key, e);
                self.session.handle_failure(&session, &e).await;
            }
        }
    }

    /// Ask about a slide. The user's message is already in the thread;
    /// the reply is appended to the same key whatever is on screen by then.
    pub async fn send_message(
        &self,
        key: ThreadKey,
        text: String,
        annotation: String,
    ) -> Result<(), AppError> {
        let session = self.session.authorized()?;

        tracing::info!("Sending message on {}", key);
        match self
            .backend
            .chat(&session.access_token, &key, &text, &annotation)
            .await
        {
            Ok(reply) => {
                let message = new_message(&reply, false);
                let _ = self.data_tx.send(DataEvent::MessageAppended { key, message });
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to send message on {}: {}", key, e);
                self.session.handle_failure(&session, &e).await;
                if !e.is_auth() {
                    let _ = self.data_tx.send(DataEvent::ShowAlert {
                        alert: Alert::failed("send message", &e),
                    });
                }
                Err(e)
            }
        }
    }

    pub async fn delete_thread(&self, key: ThreadKey) -> Result<(), AppError> {
        let session = self.session.authorized()?;

        tracing::info!("Deleting thread {}", key);
        match self
            .backend
            .delete_conversation(&session.access_token, &key)
            .await
        {
            Ok(()) => {
                let _ = self.data_tx.send(DataEvent::ThreadDeleted { key });
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to delete thread {}: {}", key, e);
                self.session.handle_failure(&session, &e).await;
                if !e.is_auth() {
                    let _ = self.data_tx.send(DataEvent::ShowAlert {
                        alert: Alert::failed("delete conversation", &e),
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

    #[test]
    fn user_messages_get_unique_ids() {
        let a = user_message("hi");
        let b = user_message("hi");
        assert!(a.is_from_user);
        assert_ne!(a.id, b.id);
        assert!(a.timestamp_ms > 0);
    }
}
