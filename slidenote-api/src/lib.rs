pub mod endpoints;
mod error;
mod macros;
pub mod repositories;

pub use crate::error::SlidenoteApiError;
use endpoints::files::{UploadFile, UploadFileResponse};
use repositories::*;
use reqwest::multipart::{Form, Part};
use tower_api_client::{Client as ApiClient, Request as ApiRequest};

pub const DEFAULT_BASE_URL: &str = "https://api.slidenote.app";

const UPLOAD_MIME_TYPE: &str = "application/pdf";

/// Bearer-authenticated backend client.
///
/// One client carries exactly one token. Callers that need a different
/// token build a new client, so requests already in flight keep the
/// credentials they started with.
pub struct Client {
    inner: ApiClient,
    http: reqwest::Client,
    base_url: String,
    bearer: String,
}

impl Client {
    pub fn new(base_url: &str, bearer: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            inner: ApiClient::new(&base_url).bearer_auth(bearer),
            http: reqwest::Client::new(),
            base_url,
            bearer: bearer.to_string(),
        }
    }

    pub async fn send<R>(&self, request: R) -> Result<R::Response, SlidenoteApiError>
    where
        R: ApiRequest,
    {
        self.inner.send(request).await.map_err(From::from)
    }

    /// Upload a document as `multipart/form-data`.
    ///
    /// The form carries two parts: `file` with the raw bytes and `metadata`
    /// with the JSON encoded course name and grade.
    pub async fn upload(&self, upload: UploadFile) -> Result<UploadFileResponse, SlidenoteApiError> {
        let metadata = serde_json::to_string(&upload.metadata)?;
        let file = Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(UPLOAD_MIME_TYPE)?;
        let form = Form::new().part("file", file).text("metadata", metadata);

        let url = format!("{}{}", self.base_url, UploadFile::ENDPOINT);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.bearer)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SlidenoteApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<UploadFileResponse>().await?)
    }
}

pub struct Request;

impl Request {
    pub fn auth() -> AuthRepository {
        AuthRepository::new()
    }

    pub fn account() -> AccountRepository {
        AccountRepository::new()
    }

    pub fn files() -> FileRepository {
        FileRepository::new()
    }

    pub fn conversations() -> ConversationRepository {
        ConversationRepository::new()
    }
}
