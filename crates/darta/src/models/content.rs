use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    pub text: String,
}

/// Base64-encoded binary carried inline with a message. Covers images,
/// audio recordings, and PDF documents alike; the mime type decides how the
/// model interprets the bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineContent {
    pub mime_type: String,
    pub data: String,
}

impl InlineContent {
    /// Self-describing data URL for local rendering.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
/// Content passed to or from the model
pub enum Content {
    Text(TextContent),
    Inline(InlineContent),
}

impl Content {
    pub fn text<S: Into<String>>(text: S) -> Self {
        Content::Text(TextContent { text: text.into() })
    }

    pub fn inline<S: Into<String>, T: Into<String>>(mime_type: T, data: S) -> Self {
        Content::Inline(InlineContent {
            mime_type: mime_type.into(),
            data: data.into(),
        })
    }

    /// Get the text content if this is a TextContent variant
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(text) => Some(&text.text),
            _ => None,
        }
    }

    /// Get the (mime type, data) pair if this is an InlineContent variant
    pub fn as_inline(&self) -> Option<(&str, &str)> {
        match self {
            Content::Inline(inline) => Some((&inline.mime_type, &inline.data)),
            _ => None,
        }
    }
}
