use serde::{Deserialize, Serialize};

// Mirror the relay's wire models

#[derive(Debug, Serialize)]
pub struct InitiateRequest {
    pub device_id: String,
}

#[derive(Debug, Deserialize)]
pub struct InitiateResponse {
    pub session_id: String,
    pub authorization_url: String,
}

#[derive(Debug, Deserialize)]
pub struct PollResponse {
    pub status: SignInStatus,
    pub id_token: Option<String>,
}

#[derive(Debug, PartialEq, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum SignInStatus {
    Pending,
    Completed,
    Expired,
    Error(String),
}

#[derive(Debug, Serialize)]
pub struct RevokeRequest {
    pub device_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_status_is_adjacently_tagged() {
        let resp: PollResponse =
            serde_json::from_str(r#"{"status": {"type": "Completed"}, "id_token": "jwt"}"#)
                .unwrap();
        assert_eq!(resp.status, SignInStatus::Completed);
        assert_eq!(resp.id_token.as_deref(), Some("jwt"));

        let resp: PollResponse = serde_json::from_str(
            r#"{"status": {"type": "Error", "value": "access_denied"}, "id_token": null}"#,
        )
        .unwrap();
        assert_eq!(resp.status, SignInStatus::Error("access_denied".into()));
    }
}
