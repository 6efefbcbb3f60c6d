use crate::attachment::Attachment;
use crate::composer::Composer;
use crate::errors::DartaResult;
use crate::prompt::GREETING;
use crate::session::ChatSession;
use crate::transcript::{RenderableAttachment, Transcript, TranscriptEntry};

/// The surface the view layer talks to: composer state, the conversation
/// session, and the transcript, wired together. `send` resolves after the
/// transcript is updated and never fails; every send-time problem becomes an
/// assistant entry instead.
pub struct ChatManager {
    composer: Composer,
    session: ChatSession,
    transcript: Transcript,
}

impl ChatManager {
    pub fn new(session: ChatSession) -> Self {
        let mut transcript = Transcript::new();
        transcript.append(TranscriptEntry::assistant(GREETING));
        ChatManager {
            composer: Composer::new(),
            session,
            transcript,
        }
    }

    pub fn stage_image<S: Into<String>, T: Into<String>>(&mut self, data: S, mime_type: T) {
        self.composer.stage(Attachment::image(data, mime_type));
    }

    /// Stage a completed recording produced by the recorder.
    pub fn stage_audio(&mut self, attachment: Attachment) {
        self.composer.stage(attachment);
    }

    /// Stage a picked document. On `UnsupportedFormat` the previously staged
    /// attachment, if any, is left untouched.
    pub fn stage_document(&mut self, name: &str, mime_type: &str, bytes: &[u8]) -> DartaResult<()> {
        let attachment = Attachment::document(name, mime_type, bytes)?;
        self.composer.stage(attachment);
        Ok(())
    }

    pub fn clear_staged(&mut self) {
        self.composer.clear_staged();
    }

    pub fn staged(&self) -> Option<&Attachment> {
        self.composer.staged()
    }

    pub fn set_text<S: Into<String>>(&mut self, text: S) {
        self.composer.set_text(text);
    }

    pub fn can_send(&self) -> bool {
        self.composer.can_send()
    }

    pub fn is_sending(&self) -> bool {
        self.composer.is_sending()
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        self.transcript.entries()
    }

    /// Build the outgoing message, record the user entry, run the turn, and
    /// record the assistant entry. A no-op when there is nothing to send or a
    /// send is already in flight.
    pub async fn send(&mut self) {
        if !self.composer.can_send() {
            return;
        }
        let Some(outgoing) = self.composer.build_outgoing() else {
            return;
        };

        let mut user_entry = TranscriptEntry::user(outgoing.text.clone());
        if let Some(attachment) = &outgoing.attachment {
            user_entry = user_entry.with_attachment(RenderableAttachment::from_staged(attachment));
        }
        self.transcript.append(user_entry);

        self.composer.begin_send();
        let reply = self.session.send(outgoing).await;
        self.composer.finish_send();

        let mut assistant_entry = TranscriptEntry::assistant(reply.text);
        for image in &reply.images {
            assistant_entry =
                assistant_entry.with_attachment(RenderableAttachment::from_generated(image));
        }
        self.transcript.append(assistant_entry);
    }
}
