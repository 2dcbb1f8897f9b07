use super::{Acknowledgement, DataEnvelope, FileFilter};
use crate::macros::setter;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tower_api_client::{Method, Request, RequestData};

// Common

/// A processed slide deck. An empty `slides` list means the backend has
/// accepted the upload but not finished annotating it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "summary", default)]
    pub summary_text: String,
    #[serde(rename = "per_image", default)]
    pub slides: Vec<Slide>,
}

impl DocumentRecord {
    pub fn is_processed(&self) -> bool {
        !self.slides.is_empty()
    }

    pub fn slide(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    #[serde(rename = "path")]
    pub image_path: String,
    #[serde(rename = "annotation", default)]
    pub annotation_text: String,
}

// Requests

#[derive(Default, Debug, Clone, Serialize)]
pub struct ListFiles {
    fid: FileFilter,
}

impl ListFiles {
    pub fn new(fid: impl Into<FileFilter>) -> Self {
        Self { fid: fid.into() }
    }
}

impl Request for ListFiles {
    type Data = Self;
    type Response = FilesResponse;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        "/get_all_files".into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Json(self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteFile {
    fid: String,
}

impl DeleteFile {
    pub fn new(fid: impl Into<String>) -> Self {
        Self { fid: fid.into() }
    }
}

impl Request for DeleteFile {
    type Data = Self;
    type Response = Acknowledgement;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        "/delete_file".into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Json(self)
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadMetadata {
    pub course_name: String,
    pub grade: String,
}

/// Multipart upload of a slide deck, sent through [`crate::Client::upload`].
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub(crate) file_name: String,
    pub(crate) bytes: Vec<u8>,
    pub(crate) metadata: UploadMetadata,
}

impl UploadFile {
    pub const ENDPOINT: &'static str = "/upload_file";

    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            metadata: UploadMetadata::default(),
        }
    }

    setter!(metadata.course_name: String);
    setter!(metadata.grade: String);

    pub fn metadata(&self) -> &UploadMetadata {
        &self.metadata
    }
}

// Responses

pub type FilesResponse = DataEnvelope<FilesData>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilesData {
    #[serde(default)]
    pub files: Vec<DocumentRecord>,
}

/// Either `{"data": {"fid": ...}}` or a business rejection such as
/// `{"error": true, "message": "Only PDF files are supported"}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadFileResponse {
    pub data: Option<UploadedFile>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub fid: String,
}

impl UploadFileResponse {
    /// The server supplied rejection message, if the body carries an error flag.
    pub fn rejection(&self) -> Option<String> {
        let flagged = match &self.error {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::Bool(b)) => *b,
            Some(serde_json::Value::String(s)) => !s.is_empty(),
            Some(serde_json::Value::Number(n)) => n.as_f64() != Some(0.0),
            Some(_) => true,
        };
        if !flagged {
            return None;
        }
        Some(
            self.message
                .clone()
                .or_else(|| self.error.as_ref().and_then(|e| e.as_str().map(String::from)))
                .unwrap_or_else(|| "Upload rejected".to_string()),
        )
    }

    pub fn fid(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.fid.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_wire_names() {
        let body: FilesResponse = serde_json::from_str(
            r#"{"data": {"files": [{
                "id": "f1", "name": "Week 1", "summary": "Intro",
                "per_image": [{"path": "https://cdn/x/0.png", "annotation": "Title slide"}]
            }]}}"#,
        )
        .unwrap();
        let doc = &body.data.files[0];
        assert_eq!(doc.display_name, "Week 1");
        assert_eq!(doc.summary_text, "Intro");
        assert!(doc.is_processed());
        assert_eq!(doc.slide(0).unwrap().annotation_text, "Title slide");
        assert!(doc.slide(1).is_none());
    }

    #[test]
    fn unprocessed_document_has_no_slides() {
        let doc: DocumentRecord =
            serde_json::from_str(r#"{"id": "f2", "name": "Pending"}"#).unwrap();
        assert!(!doc.is_processed());
    }

    #[test]
    fn list_request_body() {
        let body = serde_json::to_value(ListFiles::new("*")).unwrap();
        assert_eq!(body, serde_json::json!({ "fid": "*" }));
        let body = serde_json::to_value(ListFiles::new("f9")).unwrap();
        assert_eq!(body, serde_json::json!({ "fid": "f9" }));
    }

    #[test]
    fn upload_rejection_message_is_verbatim() {
        let body: UploadFileResponse = serde_json::from_str(
            r#"{"error": true, "message": "Insufficient credits: 3 needed"}"#,
        )
        .unwrap();
        assert_eq!(
            body.rejection().as_deref(),
            Some("Insufficient credits: 3 needed")
        );
        assert!(body.fid().is_none());
    }

    #[test]
    fn upload_accepted() {
        let body: UploadFileResponse =
            serde_json::from_str(r#"{"data": {"fid": "X"}, "error": false}"#).unwrap();
        assert!(body.rejection().is_none());
        assert_eq!(body.fid(), Some("X"));
    }

    #[test]
    fn upload_builder_sets_metadata() {
        let upload = UploadFile::new("deck.pdf", vec![1, 2, 3])
            .course_name("CS101")
            .grade("A");
        assert_eq!(
            serde_json::to_value(upload.metadata()).unwrap(),
            serde_json::json!({ "course_name": "CS101", "grade": "A" })
        );
    }
}
