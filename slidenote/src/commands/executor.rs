use crate::background::conversation::user_message;
use crate::background::{BackgroundTaskManager, Services};
use crate::events::AppCommand;
use crate::state::*;

/// Execute a command: apply its optimistic state edit, then spawn the
/// background work that completes it.
pub fn execute_command(
    command: AppCommand,
    state: &mut AppState,
    task_manager: &mut BackgroundTaskManager,
    services: &Services,
) {
    match command {
        AppCommand::RestoreSession => {
            if services.session.restore_session().is_some() {
                // The restored tokens are only validated by this first call.
                let session = services.session.clone();
                task_manager.spawn_load_task("refresh_account".to_string(), async move {
                    let _ = session.refresh_account_state().await;
                });
            }
        }

        AppCommand::SignIn => {
            let session = services.session.clone();
            task_manager.spawn_detached("sign_in", async move {
                let _ = session.sign_in().await;
            });
        }

        AppCommand::SignOut => {
            let session = services.session.clone();
            task_manager.spawn_detached("sign_out", async move {
                session.sign_out().await;
            });
        }

        AppCommand::RefreshAccount => {
            let session = services.session.clone();
            task_manager.spawn_load_task("refresh_account".to_string(), async move {
                let _ = session.refresh_account_state().await;
            });
        }

        AppCommand::SubmitUpload { course_name, grade } => {
            let Some(upload) = begin_upload(state, course_name, grade) else {
                return;
            };
            // A listing already in flight predates the cleared catalog.
            task_manager.cancel("load_catalog");
            let documents = services.documents.clone();
            task_manager.spawn_detached("upload", async move {
                let _ = documents.submit(upload).await;
            });
        }

        AppCommand::LoadCatalog { filter } => {
            state.catalog_loading = LoadingState::Loading;
            let documents = services.documents.clone();
            task_manager.spawn_load_task("load_catalog".to_string(), async move {
                documents.load_catalog(filter).await;
            });
        }

        AppCommand::DeleteDocument { fid } => {
            let documents = services.documents.clone();
            task_manager.spawn_detached("delete_document", async move {
                documents.delete_one(&fid).await;
            });
        }

        AppCommand::LoadThread { key } => {
            let conversations = services.conversations.clone();
            task_manager.spawn_load_task(thread_task_id(&key), async move {
                conversations.load_thread(key).await;
            });
        }

        AppCommand::SendMessage { key, text } => {
            let Some(annotation) = begin_send(state, &key, &text) else {
                return;
            };
            // The server copy being fetched lacks the message just appended.
            task_manager.cancel(&thread_task_id(&key));
            let conversations = services.conversations.clone();
            task_manager.spawn_detached("send_message", async move {
                let _ = conversations.send_message(key, text, annotation).await;
            });
        }

        AppCommand::DeleteThread { key } => {
            let conversations = services.conversations.clone();
            task_manager.spawn_detached("delete_thread", async move {
                let _ = conversations.delete_thread(key).await;
            });
        }

        AppCommand::StartCheckout { kind } => {
            let billing = services.billing.clone();
            task_manager.spawn_detached("checkout", async move {
                let _ = billing.start_checkout(kind).await;
            });
        }

        AppCommand::ModifySubscription { action } => {
            let billing = services.billing.clone();
            task_manager.spawn_detached("modify_subscription", async move {
                let _ = billing.modify_subscription(action).await;
            });
        }

        local => execute_command_sync(local, state),
    }
}

fn thread_task_id(key: &ThreadKey) -> String {
    format!("load_thread_{}_{}", key.document_id, key.slide_index)
}

/// Execute the state-only part of a command without spawning tasks
/// (used by tests and for commands that need no I/O)
pub fn execute_command_sync(command: AppCommand, state: &mut AppState) {
    match command {
        AppCommand::Quit => state.should_quit = true,
        AppCommand::DismissAlert => state.alert = None,

        AppCommand::SelectFile(upload) => {
            if state.upload.is_in_flight() {
                tracing::warn!(
                    "Ignoring file selection of {} while an upload is in flight",
                    upload.file_name
                );
                return;
            }
            tracing::info!("Selected {:?}", upload);
            state.upload = UploadPhase::Selected(upload);
        }

        AppCommand::SubmitUpload { course_name, grade } => {
            begin_upload(state, course_name, grade);
        }

        AppCommand::SelectDocument { fid } => {
            if !state.select_document(&fid) {
                tracing::warn!("Document {} is not in the catalog", fid);
            }
        }
        AppCommand::NextSlide => state.next_slide(),
        AppCommand::PreviousSlide => state.previous_slide(),

        AppCommand::UpdateChatInput { text } => state.chat_input = text,

        AppCommand::SendMessage { key, text } => {
            begin_send(state, &key, &text);
        }

        other => {
            tracing::debug!("No local effect for {:?}", other);
        }
    }
}

/// Move a selected file into the Uploading phase. The catalog is cleared
/// up front; it is reloaded once the new document is ready.
fn begin_upload(state: &mut AppState, course_name: String, grade: String) -> Option<PendingUpload> {
    let upload = match std::mem::take(&mut state.upload) {
        UploadPhase::Selected(upload) => upload.with_metadata(course_name, grade),
        other => {
            let in_flight = other.is_in_flight();
            state.upload = other;
            if in_flight {
                tracing::warn!("An upload is already in flight");
            } else {
                state.alert = Some(Alert::NoFileSelected);
            }
            return None;
        }
    };

    state.catalog.clear();
    state.catalog_loading = LoadingState::Idle;
    state.active_document = None;
    state.slide_index = 0;
    state.upload = UploadPhase::Uploading {
        file_name: upload.file_name.clone(),
    };
    Some(upload)
}

/// Append the user's message and clear the input. Returns the annotation to
/// send along, or `None` when there is nothing to send.
fn begin_send(state: &mut AppState, key: &ThreadKey, text: &str) -> Option<String> {
    if text.trim().is_empty() {
        return None;
    }

    let annotation = state.annotation_for(key).unwrap_or_default().to_string();
    state
        .threads
        .entry(key.clone())
        .or_default()
        .push(user_message(text));
    state.chat_input.clear();
    Some(annotation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_without_selection_raises_alert() {
        let mut state = AppState::new();
        execute_command_sync(
            AppCommand::SubmitUpload {
                course_name: "Bio".into(),
                grade: "10".into(),
            },
            &mut state,
        );
        assert_eq!(state.alert, Some(Alert::NoFileSelected));
        assert_eq!(state.upload, UploadPhase::Idle);
    }

    #[test]
    fn submit_moves_to_uploading_and_clears_catalog() {
        let mut state = AppState::new();
        state.active_document = Some("old".into());
        execute_command_sync(
            AppCommand::SelectFile(PendingUpload::new("deck.pdf", vec![1, 2, 3])),
            &mut state,
        );
        execute_command_sync(
            AppCommand::SubmitUpload {
                course_name: "Bio".into(),
                grade: "10".into(),
            },
            &mut state,
        );
        assert_eq!(
            state.upload,
            UploadPhase::Uploading {
                file_name: "deck.pdf".into()
            }
        );
        assert!(state.active_document.is_none());
    }

    #[test]
    fn reselecting_during_upload_is_refused() {
        let mut state = AppState::new();
        state.upload = UploadPhase::AwaitingProcessing { fid: "f".into() };
        execute_command_sync(
            AppCommand::SelectFile(PendingUpload::new("other.pdf", vec![])),
            &mut state,
        );
        assert_eq!(state.upload, UploadPhase::AwaitingProcessing { fid: "f".into() });
    }

    #[test]
    fn blank_message_is_ignored() {
        let mut state = AppState::new();
        state.chat_input = "   ".into();
        let key = ThreadKey::new("d", 0);
        execute_command_sync(
            AppCommand::SendMessage {
                key: key.clone(),
                text: "   ".into(),
            },
            &mut state,
        );
        assert!(state.thread(&key).is_empty());
        assert_eq!(state.chat_input, "   ");
    }

    #[test]
    fn send_appends_user_message_and_clears_input() {
        let mut state = AppState::new();
        state.chat_input = "What is mitosis?".into();
        let key = ThreadKey::new("d", 0);
        execute_command_sync(
            AppCommand::SendMessage {
                key: key.clone(),
                text: "What is mitosis?".into(),
            },
            &mut state,
        );
        let thread = state.thread(&key);
        assert_eq!(thread.len(), 1);
        assert!(thread[0].is_from_user);
        assert!(state.chat_input.is_empty());
    }
}
