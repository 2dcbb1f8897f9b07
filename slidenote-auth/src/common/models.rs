use serde::{Deserialize, Serialize};

/// Opaque proof of identity handed out by the identity provider and
/// exchanged with the backend for a [`Session`].
#[derive(Clone, PartialEq, Eq)]
pub struct IdentityAssertion(String);

impl IdentityAssertion {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for IdentityAssertion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("IdentityAssertion(..)")
    }
}

/// The authenticated identity and token bundle for this device.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub email: String,
    pub account_id: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("email", &self.email)
            .field("account_id", &self.account_id)
            .finish_non_exhaustive()
    }
}

/// Raw contents of the credential store. Any subset of the four keys may
/// be present on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl StoredCredentials {
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none()
            && self.refresh_token.is_none()
            && self.email.is_none()
            && self.user_id.is_none()
    }

    /// A session only exists when all four fields are present and non-empty.
    pub fn into_session(self) -> Option<Session> {
        fn filled(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.is_empty())
        }

        Some(Session {
            access_token: filled(self.access_token)?,
            refresh_token: filled(self.refresh_token)?,
            email: filled(self.email)?,
            account_id: filled(self.user_id)?,
        })
    }
}

impl From<&Session> for StoredCredentials {
    fn from(session: &Session) -> Self {
        Self {
            access_token: Some(session.access_token.clone()),
            refresh_token: Some(session.refresh_token.clone()),
            email: Some(session.email.clone()),
            user_id: Some(session.account_id.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            access_token: "acc".into(),
            refresh_token: "ref".into(),
            email: "ada@example.com".into(),
            account_id: "17".into(),
        }
    }

    #[test]
    fn full_tuple_round_trips() {
        let stored = StoredCredentials::from(&session());
        assert_eq!(stored.into_session(), Some(session()));
    }

    #[test]
    fn partial_tuple_is_not_a_session() {
        let mut stored = StoredCredentials::from(&session());
        stored.user_id = None;
        assert_eq!(stored.into_session(), None);

        let mut stored = StoredCredentials::from(&session());
        stored.email = Some(String::new());
        assert_eq!(stored.into_session(), None);
    }

    #[test]
    fn debug_hides_tokens() {
        let rendered = format!("{:?}", session());
        assert!(!rendered.contains("acc\""));
        assert!(!rendered.contains("ref"));
        assert!(rendered.contains("ada@example.com"));
        assert_eq!(
            format!("{:?}", IdentityAssertion::new("secret")),
            "IdentityAssertion(..)"
        );
    }
}
