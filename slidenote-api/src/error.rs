use tower_api_client::Error as ApiError;

#[derive(Debug, thiserror::Error)]
pub enum SlidenoteApiError {
    /// The backend answered with a non-success status code.
    #[error("({status}) {body}")]
    Status { status: u16, body: String },

    #[error("Internal error: {0}")]
    Internal(ApiError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SlidenoteApiError {
    /// Status code reported by the backend, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the backend rejected the credentials attached to the request.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }
}

impl From<ApiError> for SlidenoteApiError {
    fn from(value: ApiError) -> Self {
        match value {
            ApiError::ClientError(status, body) | ApiError::ServerError(status, body) => {
                SlidenoteApiError::Status {
                    status: status.as_u16(),
                    body,
                }
            }
            e => SlidenoteApiError::Internal(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_statuses() {
        let err = SlidenoteApiError::Status {
            status: 401,
            body: "expired".into(),
        };
        assert!(err.is_unauthorized());

        let err = SlidenoteApiError::Status {
            status: 403,
            body: String::new(),
        };
        assert!(err.is_unauthorized());

        let err = SlidenoteApiError::Status {
            status: 500,
            body: "boom".into(),
        };
        assert!(!err.is_unauthorized());
        assert_eq!(err.to_string(), "(500) boom");
    }
}
