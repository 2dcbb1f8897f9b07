use super::AccountId;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tower_api_client::{Method, Request, RequestData};

// Requests

/// Exchange an identity assertion for backend tokens.
///
/// The assertion itself travels as the bearer credential, so the client
/// sending this request must be built with the assertion instead of an
/// access token. The JSON body is intentionally empty.
#[derive(Default, Debug, Clone, Serialize)]
pub struct VerifyIdToken {}

impl VerifyIdToken {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Request for VerifyIdToken {
    type Data = Self;
    type Response = TokenExchange;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        "/verify_id_token".into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Json(self)
    }
}

// Responses

/// Token bundle returned by `/verify_id_token`. Every field is optional
/// because a rejected assertion comes back as a body without tokens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenExchange {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub email: Option<String>,
    pub user_id: Option<AccountId>,
}

impl TokenExchange {
    pub fn is_accepted(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        present(&self.access_token) && present(&self.refresh_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_exchange_has_no_tokens() {
        let body: TokenExchange = serde_json::from_str(r#"{"error": "bad token"}"#).unwrap();
        assert!(!body.is_accepted());

        let body: TokenExchange =
            serde_json::from_str(r#"{"access_token": "a", "refresh_token": ""}"#).unwrap();
        assert!(!body.is_accepted());
    }

    #[test]
    fn accepted_exchange_with_numeric_user_id() {
        let body: TokenExchange = serde_json::from_str(
            r#"{"access_token": "a", "refresh_token": "r", "email": "e@x.io", "user_id": 12}"#,
        )
        .unwrap();
        assert!(body.is_accepted());
        assert_eq!(body.user_id, Some(AccountId::new("12")));
    }
}
