use crate::background::billing::CheckoutKind;
use crate::state::{Alert, PendingUpload, ThreadKey, UploadPhase};
use slidenote_api::endpoints::{
    account::{SubscriptionAction, SubscriptionRecord},
    conversations::Message,
    files::DocumentRecord,
    FileFilter,
};

/// Commands to execute (user actions → state edits and background tasks)
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    // Session
    RestoreSession,
    SignIn,
    SignOut,
    RefreshAccount,

    // Documents
    SelectFile(PendingUpload),
    SubmitUpload {
        course_name: String,
        grade: String,
    },
    LoadCatalog {
        filter: FileFilter,
    },
    DeleteDocument {
        fid: String,
    },

    // Navigation
    SelectDocument {
        fid: String,
    },
    NextSlide,
    PreviousSlide,

    // Conversations
    LoadThread {
        key: ThreadKey,
    },
    UpdateChatInput {
        text: String,
    },
    SendMessage {
        key: ThreadKey,
        text: String,
    },
    DeleteThread {
        key: ThreadKey,
    },

    // Billing
    StartCheckout {
        kind: CheckoutKind,
    },
    ModifySubscription {
        action: SubscriptionAction,
    },

    DismissAlert,
    Quit,
}

/// Results of background work, folded into state by the reducer
#[derive(Debug, Clone, PartialEq)]
pub enum DataEvent {
    SessionEstablished {
        email: String,
        account_id: String,
    },
    SignedOut,
    AccountStateLoaded {
        account_id: Option<String>,
        subscription: Option<SubscriptionRecord>,
    },
    SubscriptionUpdated {
        subscription: Option<SubscriptionRecord>,
    },

    CatalogLoaded {
        filter: FileFilter,
        documents: Vec<DocumentRecord>,
    },
    CatalogLoadFailed {
        filter: FileFilter,
    },
    UploadPhaseChanged {
        phase: UploadPhase,
    },

    ThreadLoaded {
        key: ThreadKey,
        messages: Vec<Message>,
    },
    MessageAppended {
        key: ThreadKey,
        message: Message,
    },
    ThreadDeleted {
        key: ThreadKey,
    },

    ShowAlert {
        alert: Alert,
    },
}
