use super::{Acknowledgement, DataEnvelope};
use crate::macros::setter;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tower_api_client::{Method, Request, RequestData};

// Common

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub text: String,
    #[serde(alias = "is_user")]
    pub is_from_user: bool,
    /// Creation time as epoch milliseconds
    #[serde(alias = "timestamp")]
    pub timestamp_ms: i64,
}

/// Addresses one slide of one document on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct SlideRef {
    fid: String,
    slide_id: usize,
}

// Requests

#[derive(Debug, Clone, Serialize)]
pub struct GetConversation {
    #[serde(flatten)]
    slide: SlideRef,
}

impl GetConversation {
    pub fn new(fid: impl Into<String>, slide_id: usize) -> Self {
        Self {
            slide: SlideRef {
                fid: fid.into(),
                slide_id,
            },
        }
    }
}

impl Request for GetConversation {
    type Data = Self;
    type Response = ConversationResponse;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        "/get_conversation".into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Json(self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Chat {
    #[serde(flatten)]
    slide: SlideRef,
    message: String,
    annotation: String,
}

impl Chat {
    pub fn new(fid: impl Into<String>, slide_id: usize) -> Self {
        Self {
            slide: SlideRef {
                fid: fid.into(),
                slide_id,
            },
            message: String::new(),
            annotation: String::new(),
        }
    }

    setter!(message: String);
    setter!(annotation: String);
}

impl Request for Chat {
    type Data = Self;
    type Response = ChatResponse;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        "/chat".into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Json(self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteConversation {
    #[serde(flatten)]
    slide: SlideRef,
}

impl DeleteConversation {
    pub fn new(fid: impl Into<String>, slide_id: usize) -> Self {
        Self {
            slide: SlideRef {
                fid: fid.into(),
                slide_id,
            },
        }
    }
}

impl Request for DeleteConversation {
    type Data = Self;
    type Response = Acknowledgement;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        "/delete_conversation".into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Json(self)
    }
}

// Responses

pub type ConversationResponse = DataEnvelope<ConversationData>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationData {
    #[serde(default)]
    pub messages: Vec<Message>,
}

pub type ChatResponse = DataEnvelope<ChatReply>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_body_is_flat() {
        let body = serde_json::to_value(
            Chat::new("f1", 3)
                .message("What is a monad?")
                .annotation("Slide about functors"),
        )
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "fid": "f1",
                "slide_id": 3,
                "message": "What is a monad?",
                "annotation": "Slide about functors"
            })
        );
    }

    #[test]
    fn conversation_accepts_short_field_names() {
        let body: ConversationResponse = serde_json::from_str(
            r#"{"data": {"messages": [
                {"id": "m1", "text": "hi", "is_user": true, "timestamp": 1},
                {"id": "m2", "text": "hello", "is_from_user": false, "timestamp_ms": 2}
            ]}}"#,
        )
        .unwrap();
        assert_eq!(body.data.messages.len(), 2);
        assert!(body.data.messages[0].is_from_user);
        assert_eq!(body.data.messages[1].timestamp_ms, 2);
    }
}
