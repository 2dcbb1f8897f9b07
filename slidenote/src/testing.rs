use crate::app_core::{AppCore, CommandHandler};
use crate::backend::Backend;
use crate::background::billing::{CheckoutRequest, PaymentProcessor};
use crate::commands::executor;
use crate::error::AppError;
use crate::events::{AppCommand, DataEvent};
use crate::state::{AppState, PendingUpload, ThreadKey};
use crate::App;
use async_trait::async_trait;
use slidenote_api::endpoints::{
    account::{SubscriptionAction, SubscriptionRecord, UserData},
    auth::TokenExchange,
    conversations::Message,
    files::{DocumentRecord, Slide, UploadFileResponse, UploadedFile},
    AccountId, FileFilter,
};
use slidenote_auth::{
    AuthError, CheckoutSettings, CredentialStore, IdentityAssertion, IdentityProvider,
    MemoryCredentialStore, PollingSettings, Settings, StoredCredentials,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Mock command handler for tests (no real async tasks)
///
/// Executes commands synchronously using execute_command_sync, which
/// updates state without spawning background tasks or making API calls.
#[derive(Default)]
pub struct MockCommandHandler {
    pub executed: Vec<AppCommand>,
}

impl CommandHandler for MockCommandHandler {
    fn execute_with_context(&mut self, command: AppCommand, state: &mut AppState) {
        self.executed.push(command.clone());
        executor::execute_command_sync(command, state);
    }
}

/// State-only core for reducer and navigation tests
pub struct StateHarness {
    core: AppCore<MockCommandHandler>,
}

impl StateHarness {
    pub fn new() -> Self {
        Self {
            core: AppCore::new(MockCommandHandler::default()),
        }
    }

    pub fn dispatch(&mut self, command: AppCommand) {
        self.core.dispatch(command);
    }

    pub fn send_data_event(&mut self, event: DataEvent) {
        self.core.handle_data_event(event);
    }

    pub fn state(&self) -> &AppState {
        self.core.state()
    }

    /// Commands the core issued, including follow-up thread loads
    pub fn executed(&mut self) -> &[AppCommand] {
        &self.core.handler_mut().executed
    }
}

impl Default for StateHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// A document with `slides` processed slides
pub fn document(id: &str, slides: usize) -> DocumentRecord {
    DocumentRecord {
        id: id.to_string(),
        display_name: format!("{}.pdf", id),
        summary_text: format!("Summary of {}", id),
        slides: (0..slides)
            .map(|i| Slide {
                image_path: format!("https://cdn.example/{}/{}.png", id, i),
                annotation_text: format!("Annotation {} of {}", i, id),
            })
            .collect(),
    }
}

/// Credentials that restore into a full session
pub fn stored_credentials() -> StoredCredentials {
    StoredCredentials {
        access_token: Some("access-1".to_string()),
        refresh_token: Some("refresh-1".to_string()),
        email: Some("ada@example.com".to_string()),
        user_id: Some("u-1".to_string()),
    }
}

/// Backend requests observed by [`FakeBackend`]
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    VerifyIdToken,
    GetUserData {
        token: String,
    },
    ListFiles {
        filter: FileFilter,
    },
    UploadFile {
        file_name: String,
        course_name: String,
        grade: String,
    },
    DeleteFile {
        fid: String,
    },
    GetConversation {
        key: ThreadKey,
    },
    Chat {
        key: ThreadKey,
        message: String,
        annotation: String,
    },
    DeleteConversation {
        key: ThreadKey,
    },
    ModifySubscription {
        action: SubscriptionAction,
    },
}

struct Readiness {
    empty_polls: usize,
    polls: usize,
    document: DocumentRecord,
}

struct FakeState {
    exchange: TokenExchange,
    user_data: Result<UserData, AppError>,
    catalog: Vec<DocumentRecord>,
    readiness: HashMap<String, Readiness>,
    upload: Result<UploadFileResponse, AppError>,
    threads: HashMap<ThreadKey, Vec<Message>>,
    chat: Result<String, AppError>,
    chat_delay: Duration,
    conversation_delay: Duration,
    list_delay: Duration,
    delete_file_error: Option<AppError>,
    delete_conversation_error: Option<AppError>,
    list_error: Option<AppError>,
    modified_subscription: Option<SubscriptionRecord>,
    calls: Vec<BackendCall>,
}

/// Scripted in-memory backend
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                exchange: TokenExchange {
                    access_token: Some("access-1".to_string()),
                    refresh_token: Some("refresh-1".to_string()),
                    email: Some("ada@example.com".to_string()),
                    user_id: Some(AccountId::new("u-1")),
                },
                user_data: Ok(UserData {
                    subscription: None,
                    id: Some(AccountId::new("u-1")),
                }),
                catalog: Vec::new(),
                readiness: HashMap::new(),
                upload: Ok(UploadFileResponse {
                    data: Some(UploadedFile {
                        fid: "fid-1".to_string(),
                    }),
                    error: None,
                    message: None,
                }),
                threads: HashMap::new(),
                chat: Ok("Here is an explanation.".to_string()),
                chat_delay: Duration::ZERO,
                conversation_delay: Duration::ZERO,
                list_delay: Duration::ZERO,
                delete_file_error: None,
                delete_conversation_error: None,
                list_error: None,
                modified_subscription: None,
                calls: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: BackendCall) {
        self.lock().calls.push(call);
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    pub fn count(&self, matches: impl Fn(&BackendCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|call| matches(call)).count()
    }

    pub fn reject_assertions(&self) {
        self.lock().exchange = TokenExchange::default();
    }

    pub fn set_user_data(&self, user_data: UserData) {
        self.lock().user_data = Ok(user_data);
    }

    pub fn fail_user_data(&self, err: AppError) {
        self.lock().user_data = Err(err);
    }

    pub fn set_catalog(&self, documents: Vec<DocumentRecord>) {
        self.lock().catalog = documents;
    }

    /// Delay full-catalog listings; lookups by id still answer at once.
    pub fn set_list_delay(&self, delay: Duration) {
        self.lock().list_delay = delay;
    }

    pub fn fail_listing(&self, err: AppError) {
        self.lock().list_error = Some(err);
    }

    /// `fid` lookups come back empty `empty_polls` times, then return `document`.
    pub fn ready_after(&self, fid: &str, empty_polls: usize, document: DocumentRecord) {
        self.lock().readiness.insert(
            fid.to_string(),
            Readiness {
                empty_polls,
                polls: 0,
                document,
            },
        );
    }

    pub fn set_upload_response(&self, response: UploadFileResponse) {
        self.lock().upload = Ok(response);
    }

    pub fn fail_upload(&self, err: AppError) {
        self.lock().upload = Err(err);
    }

    pub fn set_thread(&self, key: ThreadKey, messages: Vec<Message>) {
        self.lock().threads.insert(key, messages);
    }

    pub fn set_chat_reply(&self, reply: &str) {
        self.lock().chat = Ok(reply.to_string());
    }

    pub fn fail_chat(&self, err: AppError) {
        self.lock().chat = Err(err);
    }

    pub fn set_chat_delay(&self, delay: Duration) {
        self.lock().chat_delay = delay;
    }

    pub fn set_conversation_delay(&self, delay: Duration) {
        self.lock().conversation_delay = delay;
    }

    pub fn fail_delete_file(&self, err: AppError) {
        self.lock().delete_file_error = Some(err);
    }

    pub fn fail_delete_conversation(&self, err: AppError) {
        self.lock().delete_conversation_error = Some(err);
    }

    pub fn set_modified_subscription(&self, subscription: SubscriptionRecord) {
        self.lock().modified_subscription = Some(subscription);
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn verify_id_token(
        &self,
        _assertion: &IdentityAssertion,
    ) -> Result<TokenExchange, AppError> {
        self.record(BackendCall::VerifyIdToken);
        Ok(self.lock().exchange.clone())
    }

    async fn get_user_data(&self, token: &str) -> Result<UserData, AppError> {
        self.record(BackendCall::GetUserData {
            token: token.to_string(),
        });
        self.lock().user_data.clone()
    }

    async fn list_files(
        &self,
        _token: &str,
        filter: &FileFilter,
    ) -> Result<Vec<DocumentRecord>, AppError> {
        self.record(BackendCall::ListFiles {
            filter: filter.clone(),
        });

        let delay = self.lock().list_delay;
        if filter.is_all() && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.lock();
        if let Some(err) = state.list_error.clone() {
            return Err(err);
        }

        match filter {
            FileFilter::All => Ok(state.catalog.clone()),
            FileFilter::Id(fid) => {
                if let Some(readiness) = state.readiness.get_mut(fid) {
                    readiness.polls += 1;
                    if readiness.polls > readiness.empty_polls {
                        return Ok(vec![readiness.document.clone()]);
                    }
                    return Ok(Vec::new());
                }
                Ok(state
                    .catalog
                    .iter()
                    .filter(|doc| &doc.id == fid)
                    .cloned()
                    .collect())
            }
        }
    }

    async fn upload_file(
        &self,
        _token: &str,
        upload: PendingUpload,
    ) -> Result<UploadFileResponse, AppError> {
        self.record(BackendCall::UploadFile {
            file_name: upload.file_name,
            course_name: upload.course_name,
            grade: upload.grade,
        });
        self.lock().upload.clone()
    }

    async fn delete_file(&self, _token: &str, fid: &str) -> Result<(), AppError> {
        self.record(BackendCall::DeleteFile {
            fid: fid.to_string(),
        });

        let mut state = self.lock();
        if let Some(err) = state.delete_file_error.clone() {
            return Err(err);
        }
        state.catalog.retain(|doc| doc.id != fid);
        Ok(())
    }

    async fn get_conversation(
        &self,
        _token: &str,
        key: &ThreadKey,
    ) -> Result<Vec<Message>, AppError> {
        self.record(BackendCall::GetConversation { key: key.clone() });

        let delay = self.lock().conversation_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(self.lock().threads.get(key).cloned().unwrap_or_default())
    }

    async fn chat(
        &self,
        _token: &str,
        key: &ThreadKey,
        message: &str,
        annotation: &str,
    ) -> Result<String, AppError> {
        self.record(BackendCall::Chat {
            key: key.clone(),
            message: message.to_string(),
            annotation: annotation.to_string(),
        });

        let delay = self.lock().chat_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.lock().chat.clone()
    }

    async fn delete_conversation(&self, _token: &str, key: &ThreadKey) -> Result<(), AppError> {
        self.record(BackendCall::DeleteConversation { key: key.clone() });

        let mut state = self.lock();
        if let Some(err) = state.delete_conversation_error.clone() {
            return Err(err);
        }
        state.threads.remove(key);
        Ok(())
    }

    async fn modify_subscription(
        &self,
        _token: &str,
        action: SubscriptionAction,
    ) -> Result<Option<SubscriptionRecord>, AppError> {
        self.record(BackendCall::ModifySubscription { action });
        Ok(self.lock().modified_subscription.clone())
    }
}

/// Identity provider that answers immediately
#[derive(Default)]
pub struct FakeIdentityProvider {
    sign_in_error: Mutex<Option<String>>,
    revoke_fails: Mutex<bool>,
    revocations: Mutex<usize>,
}

impl FakeIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_sign_in(&self, message: &str) {
        *self
            .sign_in_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(message.to_string());
    }

    pub fn fail_revoke(&self) {
        *self.revoke_fails.lock().unwrap_or_else(PoisonError::into_inner) = true;
    }

    pub fn revocations(&self) -> usize {
        *self.revocations.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn sign_in(&self) -> Result<IdentityAssertion, AuthError> {
        let error = self
            .sign_in_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match error {
            Some(message) => Err(AuthError::Provider(message)),
            None => Ok(IdentityAssertion::new("id-token")),
        }
    }

    async fn revoke(&self) -> Result<(), AuthError> {
        *self.revocations.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        if *self.revoke_fails.lock().unwrap_or_else(PoisonError::into_inner) {
            return Err(AuthError::Provider("relay unreachable".to_string()));
        }
        Ok(())
    }
}

/// Payment processor that only records what it was asked to do
#[derive(Default)]
pub struct RecordingCheckout {
    requests: Mutex<Vec<CheckoutRequest>>,
}

impl RecordingCheckout {
    pub fn requests(&self) -> Vec<CheckoutRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl PaymentProcessor for RecordingCheckout {
    async fn redirect_to_checkout(&self, request: &CheckoutRequest) -> Result<(), AppError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        Ok(())
    }
}

/// Default settings without touching files or the environment
pub fn test_settings() -> Settings {
    Settings {
        backend_url: "http://backend.test".to_string(),
        auth_relay_url: "http://relay.test".to_string(),
        checkout: CheckoutSettings::default(),
        polling: PollingSettings::default(),
    }
}

/// A full [`App`] wired to fakes
pub struct TestApp {
    app: App,
    pub backend: Arc<FakeBackend>,
    pub store: Arc<MemoryCredentialStore>,
    pub identity: Arc<FakeIdentityProvider>,
    pub checkout: Arc<RecordingCheckout>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_store(MemoryCredentialStore::new())
    }

    pub fn with_store(store: MemoryCredentialStore) -> Self {
        let backend = Arc::new(FakeBackend::new());
        let store = Arc::new(store);
        let identity = Arc::new(FakeIdentityProvider::new());
        let checkout = Arc::new(RecordingCheckout::default());

        let app = App::new(
            &test_settings(),
            backend.clone(),
            store.clone(),
            identity.clone(),
            checkout.clone(),
        );

        Self {
            app,
            backend,
            store,
            identity,
            checkout,
        }
    }

    /// Restored from stored credentials, account state loaded
    pub async fn signed_in() -> Self {
        let mut app = Self::with_store(MemoryCredentialStore::with(stored_credentials()));
        app.dispatch(AppCommand::RestoreSession);
        app.settle().await;
        app
    }

    pub fn dispatch(&mut self, command: AppCommand) {
        self.app.dispatch(command);
    }

    pub async fn settle(&mut self) {
        self.app.settle().await;
    }

    pub fn drain_events(&mut self) -> usize {
        self.app.drain_events()
    }

    pub fn state(&self) -> &AppState {
        self.app.state()
    }

    pub fn stored(&self) -> StoredCredentials {
        self.store.load().unwrap_or_default()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
