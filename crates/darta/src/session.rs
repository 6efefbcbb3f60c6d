use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use tracing::warn;

use crate::attachment::{AttachmentKind, Payload};
use crate::composer::ComposedMessage;
use crate::errors::DartaResult;
use crate::gateway::ImageSynthesizer;
use crate::models::content::{Content, InlineContent};
use crate::models::message::{Message, MessageContent};
use crate::models::tool::Tool;
use crate::prompt::system_prompt;
use crate::providers::base::{Provider, Usage};
use crate::providers::configs::GeminiProviderConfig;
use crate::providers::gemini::GeminiProvider;

pub const MARKETING_IMAGE_TOOL: &str = "generate_marketing_image";

/// Reply for a send attempted without a configured credential. The UI must
/// stay usable without one, so this is a reply, not an error.
pub const OFFLINE_REPLY: &str = "I can't connect right now (Missing API Key).";

/// Reply when the model or the image capability fails mid-turn.
pub const TROUBLE_REPLY: &str = "Sorry, I had trouble processing that request.";

/// The single capability declared to the model.
pub fn marketing_image_tool() -> Tool {
    Tool::new(
        MARKETING_IMAGE_TOOL,
        "Generates a marketing image, flyer, or WhatsApp status image based on a prompt.",
        json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "A detailed description of the image to generate, including style, product details, and text to appear (if any).",
                }
            },
            "required": ["prompt"]
        }),
    )
}

/// What one send produces: the model's final text plus any images the
/// marketing-image capability generated along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub images: Vec<InlineContent>,
}

impl Reply {
    fn empty() -> Self {
        Reply {
            text: String::new(),
            images: Vec::new(),
        }
    }

    fn text_only<S: Into<String>>(text: S) -> Self {
        Reply {
            text: text.into(),
            images: Vec::new(),
        }
    }
}

/// Phases of one session turn. A turn that observes a capability invocation
/// must pass through `AwaitingCapability` and `AwaitingFinalReply` before it
/// can reach `Done`, which makes the "always resubmit before returning"
/// contract structural rather than a branch to remember.
enum TurnPhase {
    AwaitingModel,
    AwaitingCapability {
        id: String,
        prompt: Option<String>,
    },
    AwaitingFinalReply {
        id: String,
        image: Option<InlineContent>,
    },
    Done(Reply),
}

/// Stateful wrapper around the model connection. Owns the session lifecycle
/// (lazy init, at most one live provider), the running history, and the
/// tool-call round trip.
pub struct ChatSession {
    provider: Option<Box<dyn Provider>>,
    synthesizer: Box<dyn ImageSynthesizer>,
    history: Vec<Message>,
    tools: Vec<Tool>,
}

impl ChatSession {
    /// Session that connects lazily from the environment on first send.
    pub fn new(synthesizer: Box<dyn ImageSynthesizer>) -> Self {
        ChatSession {
            provider: None,
            synthesizer,
            history: Vec::new(),
            tools: vec![marketing_image_tool()],
        }
    }

    /// Session over an already-constructed provider.
    pub fn with_provider(
        provider: Box<dyn Provider>,
        synthesizer: Box<dyn ImageSynthesizer>,
    ) -> Self {
        ChatSession {
            provider: Some(provider),
            synthesizer,
            history: Vec::new(),
            tools: vec![marketing_image_tool()],
        }
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Run one session turn. Never fails from the caller's point of view:
    /// configuration and transport problems come back as canned replies.
    /// After a failed turn the session object is reused as-is; retry is
    /// entirely a user-initiated re-send.
    pub async fn send(&mut self, outgoing: ComposedMessage) -> Reply {
        let parts = assemble_parts(&outgoing);
        if parts.is_empty() {
            // Nothing to submit; stay silent and skip the network entirely.
            return Reply::empty();
        }

        if self.provider.is_none() {
            match connect() {
                Ok(provider) => self.provider = Some(provider),
                Err(e) => {
                    warn!(error = %e, "session unavailable, degraded reply");
                    return Reply::text_only(OFFLINE_REPLY);
                }
            }
        }

        let mut user_message = Message::user();
        for part in parts {
            user_message = user_message.with_content(part);
        }
        self.history.push(user_message);

        match self.run_turn().await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "chat turn failed");
                Reply::text_only(TROUBLE_REPLY)
            }
        }
    }

    async fn run_turn(&mut self) -> Result<Reply> {
        let mut phase = TurnPhase::AwaitingModel;
        loop {
            phase = match phase {
                TurnPhase::AwaitingModel => {
                    let (response, _usage) = self.complete().await?;
                    self.history.push(response.clone());

                    match response.first_tool_request() {
                        Some(request) => {
                            let prompt = match &request.tool_call {
                                Ok(call) if call.name == MARKETING_IMAGE_TOOL => {
                                    Some(prompt_argument(&call.arguments))
                                }
                                Ok(call) => {
                                    warn!(tool = %call.name, "model requested an undeclared tool");
                                    None
                                }
                                Err(e) => {
                                    warn!(error = %e, "model sent a malformed tool call");
                                    None
                                }
                            };
                            TurnPhase::AwaitingCapability {
                                id: request.id.clone(),
                                prompt,
                            }
                        }
                        None => TurnPhase::Done(Reply::text_only(response.text())),
                    }
                }

                TurnPhase::AwaitingCapability { id, prompt } => {
                    let image = match &prompt {
                        Some(prompt) => self.synthesizer.synthesize(prompt).await,
                        None => None,
                    };
                    TurnPhase::AwaitingFinalReply { id, image }
                }

                TurnPhase::AwaitingFinalReply { id, image } => {
                    // The result reports only success or failure; the image
                    // bytes go to the caller, never back to the model.
                    let note = if image.is_some() {
                        "Image generated successfully."
                    } else {
                        "Failed to generate image."
                    };
                    self.history.push(Message::user().with_tool_response(
                        id,
                        MARKETING_IMAGE_TOOL,
                        Ok(vec![Content::text(note)]),
                    ));

                    let (final_response, _usage) = self.complete().await?;
                    self.history.push(final_response.clone());

                    TurnPhase::Done(Reply {
                        text: final_response.text(),
                        images: image.into_iter().collect(),
                    })
                }

                TurnPhase::Done(reply) => return Ok(reply),
            };
        }
    }

    async fn complete(&self) -> Result<(Message, Usage)> {
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| anyhow!("session not initialized"))?;
        provider
            .complete(system_prompt(), &self.history, &self.tools)
            .await
    }
}

fn connect() -> DartaResult<Box<dyn Provider>> {
    let config = GeminiProviderConfig::from_env()?;
    let provider = GeminiProvider::new(config)
        .map_err(|e| crate::errors::DartaError::Configuration(e.to_string()))?;
    Ok(Box::new(provider))
}

/// Ordered parts for one outgoing message: a text part when any text is
/// present, then at most one attachment part. Text-payload documents are
/// folded into a marked text part so they read as inline context; binary
/// payloads become inline parts with their mime type preserved.
fn assemble_parts(message: &ComposedMessage) -> Vec<MessageContent> {
    let mut parts = Vec::new();

    let text = message.text.trim();
    if !text.is_empty() {
        parts.push(MessageContent::text(text));
    }

    if let Some(attachment) = &message.attachment {
        match (&attachment.kind, &attachment.payload) {
            (AttachmentKind::Document, Payload::Text(content)) => {
                let name = attachment.display_name();
                parts.push(MessageContent::text(format!(
                    "\n[Content of {}]:\n{}\n[End of {}]\n",
                    name, content, name
                )));
            }
            (_, Payload::Base64(data)) => {
                if !data.is_empty() {
                    parts.push(MessageContent::inline(
                        attachment.mime_type.clone(),
                        data.clone(),
                    ));
                }
            }
            // Text payloads only occur on documents.
            (_, Payload::Text(_)) => {}
        }
    }

    parts
}

fn prompt_argument(arguments: &Value) -> String {
    match arguments.get("prompt") {
        Some(Value::String(prompt)) => prompt.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::Attachment;
    use crate::models::tool::ToolCall;
    use crate::providers::mock::MockProvider;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Scripted synthesizer that records the prompts it was asked for.
    struct StubSynthesizer {
        image: Option<InlineContent>,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl StubSynthesizer {
        fn returning(image: Option<InlineContent>) -> Self {
            Self {
                image,
                prompts: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn prompt_log(&self) -> Arc<Mutex<Vec<String>>> {
            Arc::clone(&self.prompts)
        }
    }

    #[async_trait]
    impl ImageSynthesizer for StubSynthesizer {
        async fn synthesize(&self, prompt: &str) -> Option<InlineContent> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.image.clone()
        }
    }

    fn flyer() -> InlineContent {
        InlineContent {
            mime_type: "image/png".to_string(),
            data: "QUJD".to_string(),
        }
    }

    fn text_message(text: &str) -> ComposedMessage {
        ComposedMessage {
            text: text.to_string(),
            attachment: None,
        }
    }

    #[tokio::test]
    async fn test_plain_reply_is_one_submission() {
        let provider = MockProvider::new(vec![Message::assistant().with_text("Hello!")]);
        let calls = provider.call_log();
        let mut session = ChatSession::with_provider(
            Box::new(provider),
            Box::new(StubSynthesizer::returning(None)),
        );

        let reply = session.send(text_message("Hi")).await;

        assert_eq!(reply.text, "Hello!");
        assert!(reply.images.is_empty());
        assert_eq!(calls.lock().unwrap().len(), 1);
        // History: user turn plus assistant reply.
        assert_eq!(session.history().len(), 2);
    }

    #[tokio::test]
    async fn test_tool_call_round_trip_submits_twice_in_order() {
        let provider = MockProvider::new(vec![
            Message::assistant().with_tool_request(
                "call-1",
                Ok(ToolCall::new(
                    MARKETING_IMAGE_TOOL,
                    json!({"prompt": "bright soap flyer"}),
                )),
            ),
            Message::assistant().with_text("Here is your flyer!"),
        ]);
        let calls = provider.call_log();
        let synthesizer = StubSynthesizer::returning(Some(flyer()));
        let prompts = synthesizer.prompt_log();
        let mut session = ChatSession::with_provider(Box::new(provider), Box::new(synthesizer));

        let reply = session.send(text_message("Make me a flyer")).await;

        assert_eq!(reply.text, "Here is your flyer!");
        assert_eq!(reply.images, vec![flyer()]);
        assert_eq!(prompts.lock().unwrap().as_slice(), ["bright soap flyer"]);

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        // First submission ends with the user's message.
        let first_last = calls[0].last().unwrap();
        assert_eq!(first_last.text(), "Make me a flyer");
        // Second submission ends with the successful tool result.
        let second_last = calls[1].last().unwrap();
        let response = second_last.content[0].as_tool_response().unwrap();
        assert_eq!(response.id, "call-1");
        assert_eq!(response.name, MARKETING_IMAGE_TOOL);
        let contents = response.tool_result.as_ref().unwrap();
        assert_eq!(contents[0].as_text(), Some("Image generated successfully."));
    }

    #[tokio::test]
    async fn test_failed_synthesis_still_resubmits_and_returns_text() {
        let provider = MockProvider::new(vec![
            Message::assistant().with_tool_request(
                "call-1",
                Ok(ToolCall::new(MARKETING_IMAGE_TOOL, json!({"prompt": "x"}))),
            ),
            Message::assistant().with_text("I could not create the image this time."),
        ]);
        let calls = provider.call_log();
        let mut session = ChatSession::with_provider(
            Box::new(provider),
            Box::new(StubSynthesizer::returning(None)),
        );

        let reply = session.send(text_message("flyer please")).await;

        assert_eq!(reply.text, "I could not create the image this time.");
        assert!(reply.images.is_empty());

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        let second_last = calls[1].last().unwrap();
        let response = second_last.content[0].as_tool_response().unwrap();
        let contents = response.tool_result.as_ref().unwrap();
        assert_eq!(contents[0].as_text(), Some("Failed to generate image."));
    }

    #[tokio::test]
    async fn test_undeclared_tool_reports_failure_without_synthesis() {
        let provider = MockProvider::new(vec![
            Message::assistant()
                .with_tool_request("call-1", Ok(ToolCall::new("send_sms", json!({})))),
            Message::assistant().with_text("Let me try something else."),
        ]);
        let synthesizer = StubSynthesizer::returning(Some(flyer()));
        let prompts = synthesizer.prompt_log();
        let mut session = ChatSession::with_provider(Box::new(provider), Box::new(synthesizer));

        let reply = session.send(text_message("hello")).await;

        assert_eq!(reply.text, "Let me try something else.");
        assert!(reply.images.is_empty());
        assert!(prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_becomes_apologetic_reply() {
        let mut session = ChatSession::with_provider(
            Box::new(MockProvider::failing("connection reset")),
            Box::new(StubSynthesizer::returning(None)),
        );

        let reply = session.send(text_message("Hi")).await;
        assert_eq!(reply.text, TROUBLE_REPLY);
        assert!(reply.images.is_empty());

        // The session is reused as-is: the user turn stays in history.
        assert_eq!(session.history().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_credential_degrades_without_error() {
        std::env::remove_var("GEMINI_API_KEY");
        let mut session = ChatSession::new(Box::new(StubSynthesizer::returning(None)));

        let reply = session.send(text_message("anything at all")).await;
        assert_eq!(reply.text, OFFLINE_REPLY);
        assert!(reply.images.is_empty());
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_empty_message_is_a_silent_no_op() {
        let provider = MockProvider::new(vec![]);
        let calls = provider.call_log();
        let mut session = ChatSession::with_provider(
            Box::new(provider),
            Box::new(StubSynthesizer::returning(None)),
        );

        let reply = session.send(text_message("   ")).await;
        assert_eq!(reply, Reply::empty());
        assert!(calls.lock().unwrap().is_empty());
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_csv_document_becomes_marked_text_part() {
        let csv = indoc::indoc! {"
            item,amount
            sugar,4500
            soap,3800
        "};
        let attachment = Attachment::document("sales.csv", "text/csv", csv.as_bytes()).unwrap();
        let message = ComposedMessage {
            text: "Please analyze this.".to_string(),
            attachment: Some(attachment),
        };

        let parts = assemble_parts(&message);
        assert_eq!(parts.len(), 2);
        let folded = parts[1].as_text().unwrap();
        assert!(folded.starts_with("\n[Content of sales.csv]:\n"));
        assert!(folded.contains("sugar,4500"));
        assert!(folded.trim_end().ends_with("[End of sales.csv]"));
        assert!(parts.iter().all(|p| p.as_inline().is_none()));
    }

    #[test]
    fn test_pdf_document_becomes_inline_part() {
        let attachment =
            Attachment::document("invoice.pdf", "application/pdf", b"%PDF-1.4").unwrap();
        let message = ComposedMessage {
            text: String::new(),
            attachment: Some(attachment),
        };

        let parts = assemble_parts(&message);
        assert_eq!(parts.len(), 1);
        let inline = parts[0].as_inline().unwrap();
        assert_eq!(inline.mime_type, "application/pdf");
    }

    #[test]
    fn test_empty_binary_payload_is_skipped() {
        let attachment = Attachment::audio(b"", "audio/webm");
        let message = ComposedMessage {
            text: "Please transcribe this audio and confirm the details.".to_string(),
            attachment: Some(attachment),
        };

        let parts = assemble_parts(&message);
        assert_eq!(parts.len(), 1);
        assert!(parts[0].as_text().is_some());
    }

    #[test]
    fn test_prompt_argument_stringifies_non_string() {
        assert_eq!(prompt_argument(&json!({"prompt": "a flyer"})), "a flyer");
        assert_eq!(
            prompt_argument(&json!({"prompt": {"style": "bright"}})),
            r#"{"style":"bright"}"#
        );
        assert_eq!(prompt_argument(&json!({})), "");
    }
}
