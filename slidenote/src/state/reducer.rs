use super::{AccountView, Alert, AppState, LoadingState};
use crate::events::DataEvent;

/// Apply a data event to state (pure, no side effects)
pub fn reduce_data_event(state: &mut AppState, event: DataEvent) {
    // Late results from work started before a sign-out must not resurrect data.
    let session_event = matches!(
        event,
        DataEvent::SessionEstablished { .. } | DataEvent::SignedOut | DataEvent::ShowAlert { .. }
    );
    if !session_event && !state.is_signed_in() {
        tracing::debug!("Dropping data event while signed out");
        return;
    }

    match event {
        DataEvent::SessionEstablished { email, account_id } => {
            state.account = Some(AccountView { email, account_id });
        }

        DataEvent::SignedOut => {
            let should_quit = state.should_quit;
            *state = AppState::new();
            state.should_quit = should_quit;
        }

        DataEvent::AccountStateLoaded {
            account_id,
            subscription,
        } => {
            if let (Some(account), Some(id)) = (state.account.as_mut(), account_id) {
                if !id.trim().is_empty() {
                    account.account_id = id;
                }
            }
            state.subscription = subscription;
        }

        DataEvent::SubscriptionUpdated { subscription } => {
            state.subscription = subscription;
        }

        DataEvent::CatalogLoaded { filter, documents } => {
            state.catalog = documents;
            state.catalog_loading = LoadingState::Loaded;
            match state.catalog.first().map(|doc| doc.id.clone()) {
                Some(first) => {
                    state.select_document(&first);
                }
                None => {
                    state.active_document = None;
                    state.slide_index = 0;
                    if filter.is_all() {
                        state.alert = Some(Alert::NoDocuments);
                    }
                }
            }
        }

        DataEvent::CatalogLoadFailed { .. } => {
            state.catalog_loading = LoadingState::Idle;
        }

        DataEvent::UploadPhaseChanged { phase } => {
            state.upload = phase;
        }

        DataEvent::ThreadLoaded { key, messages } => {
            state.threads.insert(key, messages);
        }

        DataEvent::MessageAppended { key, message } => {
            state.threads.entry(key).or_default().push(message);
        }

        DataEvent::ThreadDeleted { key } => {
            state.threads.remove(&key);
        }

        DataEvent::ShowAlert { alert } => {
            state.alert = Some(alert);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ThreadKey, UploadPhase};
    use slidenote_api::endpoints::{
        conversations::Message,
        files::{DocumentRecord, Slide},
        FileFilter,
    };

    fn signed_in() -> AppState {
        let mut state = AppState::new();
        reduce_data_event(
            &mut state,
            DataEvent::SessionEstablished {
                email: "ada@example.com".into(),
                account_id: "u-1".into(),
            },
        );
        state
    }

    fn doc(id: &str, slides: usize) -> DocumentRecord {
        DocumentRecord {
            id: id.into(),
            display_name: id.into(),
            summary_text: String::new(),
            slides: (0..slides)
                .map(|i| Slide {
                    image_path: format!("{}-{}.png", id, i),
                    annotation_text: String::new(),
                })
                .collect(),
        }
    }

    fn message(id: &str, from_user: bool) -> Message {
        Message {
            id: id.into(),
            text: id.into(),
            is_from_user: from_user,
            timestamp_ms: 0,
        }
    }

    #[test]
    fn catalog_load_selects_first_document() {
        let mut state = signed_in();
        state.slide_index = 4;
        reduce_data_event(
            &mut state,
            DataEvent::CatalogLoaded {
                filter: FileFilter::All,
                documents: vec![doc("b", 2), doc("a", 1)],
            },
        );
        assert_eq!(state.active_document.as_deref(), Some("b"));
        assert_eq!(state.slide_index, 0);
        assert_eq!(state.catalog_loading, LoadingState::Loaded);
    }

    #[test]
    fn empty_full_catalog_raises_alert() {
        let mut state = signed_in();
        reduce_data_event(
            &mut state,
            DataEvent::CatalogLoaded {
                filter: FileFilter::All,
                documents: vec![],
            },
        );
        assert!(state.active_document.is_none());
        assert_eq!(state.alert, Some(Alert::NoDocuments));
    }

    #[test]
    fn empty_single_file_lookup_is_silent() {
        let mut state = signed_in();
        reduce_data_event(
            &mut state,
            DataEvent::CatalogLoaded {
                filter: FileFilter::from("X"),
                documents: vec![],
            },
        );
        assert!(state.alert.is_none());
    }

    #[test]
    fn thread_events_touch_only_their_key() {
        let mut state = signed_in();
        let a = ThreadKey::new("d", 0);
        let b = ThreadKey::new("d", 1);
        reduce_data_event(
            &mut state,
            DataEvent::ThreadLoaded {
                key: a.clone(),
                messages: vec![message("1", true)],
            },
        );
        reduce_data_event(
            &mut state,
            DataEvent::ThreadLoaded {
                key: b.clone(),
                messages: vec![message("2", true)],
            },
        );
        reduce_data_event(
            &mut state,
            DataEvent::MessageAppended {
                key: a.clone(),
                message: message("3", false),
            },
        );
        reduce_data_event(&mut state, DataEvent::ThreadDeleted { key: b.clone() });

        assert_eq!(state.thread(&a).len(), 2);
        assert!(state.thread(&b).is_empty());
    }

    #[test]
    fn sign_out_resets_everything() {
        let mut state = signed_in();
        state.catalog = vec![doc("a", 1)];
        state.upload = UploadPhase::Ready { fid: "a".into() };
        reduce_data_event(&mut state, DataEvent::SignedOut);

        assert!(!state.is_signed_in());
        assert!(state.catalog.is_empty());
        assert_eq!(state.upload, UploadPhase::Idle);
    }

    #[test]
    fn late_results_after_sign_out_are_dropped() {
        let mut state = AppState::new();
        reduce_data_event(
            &mut state,
            DataEvent::CatalogLoaded {
                filter: FileFilter::All,
                documents: vec![doc("a", 1)],
            },
        );
        assert!(state.catalog.is_empty());
    }

    #[test]
    fn account_refresh_keeps_existing_id_when_blank() {
        let mut state = signed_in();
        reduce_data_event(
            &mut state,
            DataEvent::AccountStateLoaded {
                account_id: Some("  ".into()),
                subscription: None,
            },
        );
        assert_eq!(state.account.as_ref().map(|a| a.account_id.as_str()), Some("u-1"));
    }
}
