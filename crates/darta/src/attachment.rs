use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::errors::{DartaError, DartaResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Audio,
    Document,
}

/// Payload of a staged attachment. The text/binary split is load-bearing:
/// text payloads are folded into the prompt at send time, binary payloads
/// become inline parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    Text(String),
    Base64(String),
}

/// A single non-text input staged for sending alongside a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub mime_type: String,
    pub payload: Payload,
    pub display_name: Option<String>,
    /// Local rendering reference only; never sent to the model.
    pub preview_url: Option<String>,
}

impl Attachment {
    /// Normalize a picked image. Accepts any image mime type; the payload may
    /// arrive as a bare base64 string or a `data:` URL.
    pub fn image<S: Into<String>, T: Into<String>>(data: S, mime_type: T) -> Self {
        let data = data.into();
        let preview = data.clone();
        Attachment {
            kind: AttachmentKind::Image,
            mime_type: mime_type.into(),
            payload: Payload::Base64(strip_data_url(&data).to_string()),
            display_name: None,
            preview_url: Some(preview),
        }
    }

    /// Normalize a completed recording buffer into a single audio blob.
    pub fn audio(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Attachment {
            kind: AttachmentKind::Audio,
            mime_type: mime_type.into(),
            payload: Payload::Base64(STANDARD.encode(bytes)),
            display_name: None,
            preview_url: None,
        }
    }

    /// Normalize a picked document. PDF is kept as binary; CSV and plain text
    /// are decoded to UTF-8 text. Anything else is rejected.
    pub fn document(name: &str, mime_type: &str, bytes: &[u8]) -> DartaResult<Self> {
        if is_pdf(name, mime_type) {
            return Ok(Attachment {
                kind: AttachmentKind::Document,
                mime_type: "application/pdf".to_string(),
                payload: Payload::Base64(STANDARD.encode(bytes)),
                display_name: Some(name.to_string()),
                preview_url: None,
            });
        }

        if is_text_document(name, mime_type) {
            let content = String::from_utf8(bytes.to_vec()).map_err(|_| {
                DartaError::UnsupportedFormat(format!("{} is not valid UTF-8 text", name))
            })?;
            let mime = if mime_type.is_empty() {
                "text/plain".to_string()
            } else {
                mime_type.to_string()
            };
            return Ok(Attachment {
                kind: AttachmentKind::Document,
                mime_type: mime,
                payload: Payload::Text(content),
                display_name: Some(name.to_string()),
                preview_url: None,
            });
        }

        Err(DartaError::UnsupportedFormat(
            "Please upload a PDF, CSV, or Text file.".to_string(),
        ))
    }

    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or("Document")
    }
}

fn is_pdf(name: &str, mime_type: &str) -> bool {
    mime_type == "application/pdf" || name.to_lowercase().ends_with(".pdf")
}

fn is_text_document(name: &str, mime_type: &str) -> bool {
    let name = name.to_lowercase();
    mime_type.starts_with("text/")
        || mime_type == "application/csv"
        || name.ends_with(".csv")
        || name.ends_with(".txt")
}

/// Strip the `data:<mime>;base64,` prefix from a data URL, if present.
pub fn strip_data_url(data: &str) -> &str {
    if data.starts_with("data:") {
        data.split_once(',').map(|(_, rest)| rest).unwrap_or(data)
    } else {
        data
    }
}
