use super::session::SessionManager;
use crate::backend::Backend;
use crate::error::AppError;
use crate::events::DataEvent;
use crate::state::{Alert, PendingUpload, UploadPhase};
use slidenote_api::endpoints::{files::DocumentRecord, FileFilter};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};

/// Uploads, readiness polling, catalog loads and deletes.
#[derive(Clone)]
pub struct DocumentController {
    session: Arc<SessionManager>,
    backend: Arc<dyn Backend>,
    data_tx: mpsc::UnboundedSender<DataEvent>,
    poll_interval: Duration,
    poll_timeout: Duration,
}

impl DocumentController {
    pub fn new(
        session: Arc<SessionManager>,
        backend: Arc<dyn Backend>,
        data_tx: mpsc::UnboundedSender<DataEvent>,
        poll_interval: Duration,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            session,
            backend,
            data_tx,
            poll_interval,
            poll_timeout,
        }
    }

    fn emit_phase(&self, phase: UploadPhase) {
        let _ = self.data_tx.send(DataEvent::UploadPhaseChanged { phase });
    }

    fn alert(&self, alert: Alert) {
        let _ = self.data_tx.send(DataEvent::ShowAlert { alert });
    }

    /// Fetch the catalog (or one document) and replace the local copy.
    pub async fn list_all(&self, filter: FileFilter) -> Result<Vec<DocumentRecord>, AppError> {
        let session = self.session.authorized()?;
        tracing::debug!("Listing files (filter={})", filter);

        match self.backend.list_files(&session.access_token, &filter).await {
            Ok(documents) => {
                tracing::info!("Loaded {} documents", documents.len());
                let _ = self.data_tx.send(DataEvent::CatalogLoaded {
                    filter,
                    documents: documents.clone(),
                });
                Ok(documents)
            }
            Err(e) => {
                self.session.handle_failure(&session, &e).await;
                Err(e)
            }
        }
    }

    /// User-initiated catalog load: failures are surfaced.
    pub async fn load_catalog(&self, filter: FileFilter) {
        if let Err(e) = self.list_all(filter.clone()).await {
            tracing::error!("Failed to load documents: {}", e);
            let _ = self.data_tx.send(DataEvent::CatalogLoadFailed { filter });
            if !matches!(e, AppError::Auth(_) | AppError::SignedOut) {
                self.alert(Alert::failed("load documents", &e));
            }
        }
    }

    /// Upload a document and wait for the backend to finish processing it.
    pub async fn submit(&self, upload: PendingUpload) -> Result<String, AppError> {
        match self.run_submission(upload).await {
            Ok(fid) => Ok(fid),
            Err(e) => {
                self.fail_upload(&e);
                Err(e)
            }
        }
    }

    async fn run_submission(&self, upload: PendingUpload) -> Result<String, AppError> {
        let session = self.session.authorized()?;
        tracing::info!(
            "Uploading {} ({} bytes)",
            upload.file_name,
            upload.file_bytes.len()
        );

        let response = match self.backend.upload_file(&session.access_token, upload).await {
            Ok(response) => response,
            Err(e) => {
                self.session.handle_failure(&session, &e).await;
                return Err(e);
            }
        };

        if let Some(message) = response.rejection() {
            tracing::warn!("Upload rejected: {}", message);
            return Err(AppError::ServerReported(message));
        }

        let fid = response
            .fid()
            .map(str::to_string)
            .ok_or_else(|| AppError::Transport("upload response carried no fid".to_string()))?;

        tracing::info!("Upload accepted as {}, waiting for processing", fid);
        self.emit_phase(UploadPhase::AwaitingProcessing { fid: fid.clone() });

        self.wait_until_ready(&fid).await?;

        tracing::info!("Document {} is ready", fid);
        self.emit_phase(UploadPhase::Ready { fid: fid.clone() });
        let _ = self.session.refresh_account_state().await;

        Ok(fid)
    }

    async fn wait_until_ready(&self, fid: &str) -> Result<(), AppError> {
        let start = Instant::now();
        let filter = FileFilter::from(fid);

        while start.elapsed() < self.poll_timeout {
            let documents = self.list_all(filter.clone()).await?;
            if !documents.is_empty() {
                tracing::debug!("Ready after {:?}", start.elapsed());
                return Ok(());
            }
            tracing::debug!("Document {} not ready yet", fid);
            sleep(self.poll_interval).await;
        }

        tracing::warn!(
            "Document {} not ready after {}s",
            fid,
            self.poll_timeout.as_secs()
        );
        Err(AppError::Timeout {
            fid: fid.to_string(),
        })
    }

    fn fail_upload(&self, err: &AppError) {
        tracing::error!("Upload failed: {}", err);
        self.emit_phase(UploadPhase::Failed {
            reason: err.clone(),
        });

        match err {
            AppError::Timeout { fid } => self.alert(Alert::StillProcessing { fid: fid.clone() }),
            AppError::ServerReported(message) => self.alert(Alert::Server(message.clone())),
            AppError::Auth(_) | AppError::SignedOut => {}
            other => self.alert(Alert::failed("upload document", other)),
        }
    }

    /// Delete a document, then reload the catalog whatever the outcome.
    pub async fn delete_one(&self, fid: &str) {
        match self.session.authorized() {
            Ok(session) => {
                tracing::info!("Deleting document {}", fid);
                if let Err(e) = self.backend.delete_file(&session.access_token, fid).await {
                    tracing::error!("Failed to delete document {}: {}", fid, e);
                    self.session.handle_failure(&session, &e).await;
                    if !e.is_auth() {
                        self.alert(Alert::failed("delete document", &e));
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Cannot delete document {}: {}", fid, e);
                return;
            }
        }

        if let Err(e) = self.list_all(FileFilter::All).await {
            tracing::warn!("Catalog refresh after delete failed: {}", e);
        }
    }
}
