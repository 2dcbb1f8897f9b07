use slidenote_api::SlidenoteApiError;
use slidenote_auth::AuthError;
use thiserror::Error;

/// Failure of a single orchestration step.
///
/// Cloneable so it can ride along in data events and upload phases.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("Not signed in")]
    SignedOut,

    /// The backend rejected the token or identity assertion.
    #[error("Credentials rejected: {0}")]
    Auth(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Document {fid} is still processing")]
    Timeout { fid: String },

    /// HTTP success carrying an explicit error flag. Shown verbatim.
    #[error("{0}")]
    ServerReported(String),

    #[error("No account id available for checkout")]
    MissingAccountId,

    #[error("Checkout failed: {0}")]
    Checkout(String),

    #[error("Identity provider failed: {0}")]
    Identity(String),

    #[error("Credential storage failed: {0}")]
    Credentials(String),
}

impl AppError {
    /// Failures that end the session rather than the operation.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

impl From<SlidenoteApiError> for AppError {
    fn from(err: SlidenoteApiError) -> Self {
        if err.is_unauthorized() {
            AppError::Auth(err.to_string())
        } else {
            AppError::Transport(err.to_string())
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::CredentialStorage(_) | AuthError::Json(_) | AuthError::Io(_) => {
                AppError::Credentials(err.to_string())
            }
            other => AppError::Identity(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_status_maps_to_taxonomy() {
        let err: AppError = SlidenoteApiError::Status {
            status: 401,
            body: "token expired".into(),
        }
        .into();
        assert!(err.is_auth());

        let err: AppError = SlidenoteApiError::Status {
            status: 502,
            body: "bad gateway".into(),
        }
        .into();
        assert!(matches!(err, AppError::Transport(_)));
    }

    #[test]
    fn server_reported_message_is_verbatim() {
        let err = AppError::ServerReported("Only PDF files are supported".into());
        assert_eq!(err.to_string(), "Only PDF files are supported");
    }

    #[test]
    fn auth_crate_errors_split_by_kind() {
        let err: AppError = AuthError::CredentialStorage("disk full".into()).into();
        assert!(matches!(err, AppError::Credentials(_)));

        let err: AppError = AuthError::SessionExpired.into();
        assert!(matches!(err, AppError::Identity(_)));
    }
}
