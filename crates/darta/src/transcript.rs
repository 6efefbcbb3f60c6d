use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attachment::{Attachment, AttachmentKind, Payload};
use crate::models::content::InlineContent;
use crate::models::role::Role;

/// Attachment as rendered in the conversation history: a local reference,
/// not the payload handed to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderableAttachment {
    pub kind: AttachmentKind,
    /// Data URL or other local reference usable by the view layer.
    pub reference: String,
    pub name: Option<String>,
}

impl RenderableAttachment {
    pub fn from_staged(attachment: &Attachment) -> Self {
        let reference = match (&attachment.preview_url, &attachment.payload) {
            (Some(url), _) => url.clone(),
            (None, Payload::Base64(data)) => {
                format!("data:{};base64,{}", attachment.mime_type, data)
            }
            (None, Payload::Text(_)) => String::new(),
        };
        RenderableAttachment {
            kind: attachment.kind,
            reference,
            name: attachment.display_name.clone(),
        }
    }

    pub fn from_generated(image: &InlineContent) -> Self {
        RenderableAttachment {
            kind: AttachmentKind::Image,
            reference: image.to_data_url(),
            name: None,
        }
    }
}

/// One exchanged message as shown to the user. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptEntry {
    pub id: String,
    pub role: Role,
    pub text: String,
    pub created: i64,
    pub attachments: Vec<RenderableAttachment>,
}

impl TranscriptEntry {
    pub fn user<S: Into<String>>(text: S) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant<S: Into<String>>(text: S) -> Self {
        Self::new(Role::Assistant, text)
    }

    fn new<S: Into<String>>(role: Role, text: S) -> Self {
        TranscriptEntry {
            id: Uuid::new_v4().to_string(),
            role,
            text: text.into(),
            created: Utc::now().timestamp(),
            attachments: Vec::new(),
        }
    }

    pub fn with_attachment(mut self, attachment: RenderableAttachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// Append-only ordered history of the conversation. Insertion order is
/// chronological order is display order.
#[derive(Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
