pub mod reducer;

use crate::error::AppError;
use slidenote_api::endpoints::{
    account::{SubscriptionRecord, SubscriptionStatus},
    conversations::Message,
    files::{DocumentRecord, Slide},
};
use std::collections::HashMap;

/// Identifies one conversation thread: a slide within a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThreadKey {
    pub document_id: String,
    pub slide_index: usize,
}

impl ThreadKey {
    pub fn new(document_id: impl Into<String>, slide_index: usize) -> Self {
        Self {
            document_id: document_id.into(),
            slide_index,
        }
    }
}

impl std::fmt::Display for ThreadKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.document_id, self.slide_index)
    }
}

/// A locally selected file waiting for metadata and submission.
#[derive(Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub file_bytes: Vec<u8>,
    pub file_name: String,
    pub course_name: String,
    pub grade: String,
}

impl PendingUpload {
    pub fn new(file_name: impl Into<String>, file_bytes: Vec<u8>) -> Self {
        Self {
            file_bytes,
            file_name: file_name.into(),
            course_name: String::new(),
            grade: String::new(),
        }
    }

    pub fn with_metadata(mut self, course_name: impl Into<String>, grade: impl Into<String>) -> Self {
        self.course_name = course_name.into();
        self.grade = grade.into();
        self
    }
}

impl std::fmt::Debug for PendingUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingUpload")
            .field("file_name", &self.file_name)
            .field("size", &self.file_bytes.len())
            .field("course_name", &self.course_name)
            .field("grade", &self.grade)
            .finish()
    }
}

/// Lifecycle of one document submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UploadPhase {
    #[default]
    Idle,
    Selected(PendingUpload),
    Uploading {
        file_name: String,
    },
    AwaitingProcessing {
        fid: String,
    },
    Ready {
        fid: String,
    },
    Failed {
        reason: AppError,
    },
}

impl UploadPhase {
    /// Whether a network operation for the submission is outstanding.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Uploading { .. } | Self::AwaitingProcessing { .. })
    }
}

/// User-visible, dismissable notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    NoDocuments,
    NoFileSelected,
    /// The readiness budget ran out; the document may still show up later.
    StillProcessing { fid: String },
    /// Business-rule rejection, message taken verbatim from the server.
    Server(String),
    Failed { action: String, reason: String },
}

impl Alert {
    pub fn failed(action: impl Into<String>, reason: &AppError) -> Self {
        Self::Failed {
            action: action.into(),
            reason: reason.to_string(),
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::NoDocuments => "No files found! Please upload a file first.".to_string(),
            Self::NoFileSelected => "No file selected. Please select a file first.".to_string(),
            Self::StillProcessing { fid } => format!(
                "Document {} is still processing. Check back later.",
                fid
            ),
            Self::Server(message) => message.clone(),
            Self::Failed { action, reason } => format!("Could not {}: {}", action, reason),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadingState {
    #[default]
    Idle,
    Loading,
    Loaded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountView {
    pub email: String,
    pub account_id: String,
}

/// Everything presentation needs, owned by the main loop.
///
/// Mutated only by the command executor (synchronous, optimistic edits)
/// and the reducer (results of background work).
#[derive(Debug, Default)]
pub struct AppState {
    pub account: Option<AccountView>,
    pub subscription: Option<SubscriptionRecord>,

    pub catalog: Vec<DocumentRecord>,
    pub catalog_loading: LoadingState,
    pub active_document: Option<String>,
    pub slide_index: usize,

    pub threads: HashMap<ThreadKey, Vec<Message>>,
    pub chat_input: String,

    pub upload: UploadPhase,
    pub alert: Option<Alert>,
    pub should_quit: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_signed_in(&self) -> bool {
        self.account.is_some()
    }

    pub fn subscription_status(&self, now_epoch_secs: i64) -> Option<SubscriptionStatus> {
        self.subscription
            .as_ref()
            .map(|sub| sub.status(now_epoch_secs))
    }

    pub fn document(&self, id: &str) -> Option<&DocumentRecord> {
        self.catalog.iter().find(|doc| doc.id == id)
    }

    pub fn active_document(&self) -> Option<&DocumentRecord> {
        self.active_document
            .as_deref()
            .and_then(|id| self.document(id))
    }

    pub fn active_slide(&self) -> Option<&Slide> {
        self.active_document()
            .and_then(|doc| doc.slide(self.slide_index))
    }

    /// The thread shown for the current selection, if a slide is on screen.
    pub fn active_key(&self) -> Option<ThreadKey> {
        self.active_slide()?;
        self.active_document
            .as_ref()
            .map(|id| ThreadKey::new(id.clone(), self.slide_index))
    }

    pub fn thread(&self, key: &ThreadKey) -> &[Message] {
        self.threads.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Annotation text for the slide a thread belongs to.
    pub fn annotation_for(&self, key: &ThreadKey) -> Option<&str> {
        self.document(&key.document_id)
            .and_then(|doc| doc.slide(key.slide_index))
            .map(|slide| slide.annotation_text.as_str())
    }

    /// Make a catalog entry the active document and rewind to its first slide.
    pub fn select_document(&mut self, id: &str) -> bool {
        if self.document(id).is_none() {
            return false;
        }
        self.active_document = Some(id.to_string());
        self.slide_index = 0;
        true
    }

    pub fn next_slide(&mut self) {
        let count = self.active_document().map_or(0, |doc| doc.slides.len());
        if self.slide_index + 1 < count {
            self.slide_index += 1;
        }
    }

    pub fn previous_slide(&mut self) {
        if self.active_document().is_some() && self.slide_index > 0 {
            self.slide_index -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, slides: usize) -> DocumentRecord {
        DocumentRecord {
            id: id.to_string(),
            display_name: format!("Deck {}", id),
            summary_text: String::new(),
            slides: (0..slides)
                .map(|i| Slide {
                    image_path: format!("https://cdn/{}/{}.png", id, i),
                    annotation_text: format!("{} slide {}", id, i),
                })
                .collect(),
        }
    }

    #[test]
    fn slide_navigation_is_bounded() {
        let mut state = AppState::new();
        state.catalog = vec![doc("a", 3)];
        assert!(state.select_document("a"));

        state.previous_slide();
        assert_eq!(state.slide_index, 0);

        state.next_slide();
        state.next_slide();
        state.next_slide();
        assert_eq!(state.slide_index, 2);
        assert_eq!(state.active_key(), Some(ThreadKey::new("a", 2)));
    }

    #[test]
    fn selecting_a_document_rewinds() {
        let mut state = AppState::new();
        state.catalog = vec![doc("a", 3), doc("b", 2)];
        state.select_document("a");
        state.next_slide();

        assert!(state.select_document("b"));
        assert_eq!(state.slide_index, 0);
        assert!(!state.select_document("missing"));
        assert_eq!(state.active_document.as_deref(), Some("b"));
    }

    #[test]
    fn unprocessed_document_has_no_thread_key() {
        let mut state = AppState::new();
        state.catalog = vec![doc("a", 0)];
        state.select_document("a");
        assert!(state.active_key().is_none());
    }

    #[test]
    fn annotation_lookup_by_key() {
        let mut state = AppState::new();
        state.catalog = vec![doc("a", 2)];
        assert_eq!(
            state.annotation_for(&ThreadKey::new("a", 1)),
            Some("a slide 1")
        );
        assert_eq!(state.annotation_for(&ThreadKey::new("a", 5)), None);
    }

    #[test]
    fn alert_messages() {
        assert_eq!(
            Alert::Server("Insufficient credits".into()).message(),
            "Insufficient credits"
        );
        assert!(Alert::StillProcessing { fid: "X".into() }
            .message()
            .contains("still processing"));
    }
}
