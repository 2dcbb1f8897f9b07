use crate::error::AppError;
use crate::state::{PendingUpload, ThreadKey};
use async_trait::async_trait;
use slidenote_api::{
    endpoints::{
        account::{SubscriptionAction, SubscriptionRecord, UserData},
        auth::TokenExchange,
        conversations::Message,
        files::{DocumentRecord, UploadFileResponse},
        FileFilter,
    },
    Client, Request,
};
use slidenote_auth::IdentityAssertion;
use std::sync::{Arc, Mutex, PoisonError};

/// Backend operations the controllers depend on.
///
/// Every call carries the bearer it should use, so a request started before
/// a sign-out keeps the token it was issued with.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn verify_id_token(&self, assertion: &IdentityAssertion)
        -> Result<TokenExchange, AppError>;

    async fn get_user_data(&self, token: &str) -> Result<UserData, AppError>;

    async fn list_files(
        &self,
        token: &str,
        filter: &FileFilter,
    ) -> Result<Vec<DocumentRecord>, AppError>;

    async fn upload_file(
        &self,
        token: &str,
        upload: PendingUpload,
    ) -> Result<UploadFileResponse, AppError>;

    async fn delete_file(&self, token: &str, fid: &str) -> Result<(), AppError>;

    async fn get_conversation(&self, token: &str, key: &ThreadKey)
        -> Result<Vec<Message>, AppError>;

    async fn chat(
        &self,
        token: &str,
        key: &ThreadKey,
        message: &str,
        annotation: &str,
    ) -> Result<String, AppError>;

    async fn delete_conversation(&self, token: &str, key: &ThreadKey) -> Result<(), AppError>;

    async fn modify_subscription(
        &self,
        token: &str,
        action: SubscriptionAction,
    ) -> Result<Option<SubscriptionRecord>, AppError>;
}

/// [`Backend`] over HTTP using the typed API client.
pub struct HttpBackend {
    base_url: String,
    // Last client built, keyed by its bearer
    cached: Mutex<Option<(String, Arc<Client>)>>,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            cached: Mutex::new(None),
        }
    }

    fn client(&self, bearer: &str) -> Arc<Client> {
        let mut cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((token, client)) = cached.as_ref() {
            if token == bearer {
                return client.clone();
            }
        }
        let client = Arc::new(Client::new(&self.base_url, bearer));
        *cached = Some((bearer.to_string(), client.clone()));
        client
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn verify_id_token(
        &self,
        assertion: &IdentityAssertion,
    ) -> Result<TokenExchange, AppError> {
        // The identity token is the bearer for this one call.
        let client = Client::new(&self.base_url, assertion.expose());
        Ok(client.send(Request::auth().verify()).await?)
    }

    async fn get_user_data(&self, token: &str) -> Result<UserData, AppError> {
        let response = self.client(token).send(Request::account().get()).await?;
        Ok(response.data)
    }

    async fn list_files(
        &self,
        token: &str,
        filter: &FileFilter,
    ) -> Result<Vec<DocumentRecord>, AppError> {
        let response = self
            .client(token)
            .send(Request::files().list(filter.clone()))
            .await?;
        Ok(response.data.files)
    }

    async fn upload_file(
        &self,
        token: &str,
        upload: PendingUpload,
    ) -> Result<UploadFileResponse, AppError> {
        let request = Request::files()
            .upload(upload.file_name, upload.file_bytes)
            .course_name(upload.course_name)
            .grade(upload.grade);
        Ok(self.client(token).upload(request).await?)
    }

    async fn delete_file(&self, token: &str, fid: &str) -> Result<(), AppError> {
        self.client(token).send(Request::files().delete(fid)).await?;
        Ok(())
    }

    async fn get_conversation(
        &self,
        token: &str,
        key: &ThreadKey,
    ) -> Result<Vec<Message>, AppError> {
        let request = Request::conversations()
            .with_file(key.document_id.as_str())
            .get(key.slide_index);
        let response = self.client(token).send(request).await?;
        Ok(response.data.messages)
    }

    async fn chat(
        &self,
        token: &str,
        key: &ThreadKey,
        message: &str,
        annotation: &str,
    ) -> Result<String, AppError> {
        let request = Request::conversations()
            .with_file(key.document_id.as_str())
            .chat(key.slide_index)
            .message(message.to_string())
            .annotation(annotation.to_string());
        let response = self.client(token).send(request).await?;
        Ok(response.data.response)
    }

    async fn delete_conversation(&self, token: &str, key: &ThreadKey) -> Result<(), AppError> {
        let request = Request::conversations()
            .with_file(key.document_id.as_str())
            .delete(key.slide_index);
        self.client(token).send(request).await?;
        Ok(())
    }

    async fn modify_subscription(
        &self,
        token: &str,
        action: SubscriptionAction,
    ) -> Result<Option<SubscriptionRecord>, AppError> {
        let response = self
            .client(token)
            .send(Request::account().modify_subscription(action))
            .await?;
        Ok(response.data.subscription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_is_reused_per_bearer() {
        let backend = HttpBackend::new("http://localhost:8000");
        let first = backend.client("token-a");
        let again = backend.client("token-a");
        assert!(Arc::ptr_eq(&first, &again));

        let other = backend.client("token-b");
        assert!(!Arc::ptr_eq(&first, &other));
    }
}
