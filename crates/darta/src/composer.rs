use crate::attachment::{Attachment, AttachmentKind};

/// The unit submitted to the conversation session.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedMessage {
    pub text: String,
    pub attachment: Option<Attachment>,
}

/// Holds the in-progress outgoing message: free text plus a single
/// attachment slot. Staging a new attachment discards whatever was staged
/// before, whatever its kind.
#[derive(Default)]
pub struct Composer {
    text: String,
    staged: Option<Attachment>,
    sending: bool,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any staged attachment atomically.
    pub fn stage(&mut self, attachment: Attachment) {
        self.staged = Some(attachment);
    }

    pub fn clear_staged(&mut self) {
        self.staged = None;
    }

    pub fn staged(&self) -> Option<&Attachment> {
        self.staged.as_ref()
    }

    pub fn set_text<S: Into<String>>(&mut self, text: S) {
        self.text = text.into();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    pub fn begin_send(&mut self) {
        self.sending = true;
    }

    pub fn finish_send(&mut self) {
        self.sending = false;
    }

    /// True iff there is something to send and no send is in flight.
    pub fn can_send(&self) -> bool {
        !self.sending && (!self.text.trim().is_empty() || self.staged.is_some())
    }

    /// Build the outgoing message and reset the composer to empty, regardless
    /// of what the send later does (optimistic clear). Returns `None` when
    /// there is nothing to send.
    pub fn build_outgoing(&mut self) -> Option<ComposedMessage> {
        let text = self.text.trim().to_string();
        let attachment = self.staged.take();
        self.text.clear();

        let text = if text.is_empty() {
            default_instruction(attachment.as_ref()?)
        } else {
            text
        };

        Some(ComposedMessage { text, attachment })
    }
}

/// Instruction synthesized when an attachment is sent without any text.
fn default_instruction(attachment: &Attachment) -> String {
    match attachment.kind {
        AttachmentKind::Audio => {
            "Please transcribe this audio and confirm the details.".to_string()
        }
        AttachmentKind::Image => {
            "Please analyze this image for business data (receipt, stock, or sale) and extract the details."
                .to_string()
        }
        AttachmentKind::Document => format!(
            "Please analyze this document ({}) and extract insights about sales, expenses, or stock.",
            attachment.display_name()
        ),
    }
}
