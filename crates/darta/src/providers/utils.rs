use anyhow::{anyhow, Result};
use regex::Regex;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::DartaError;
use crate::models::message::{Message, MessageContent};
use crate::models::role::Role;
use crate::models::tool::{Tool, ToolCall};

/// Convert internal messages to the generateContent `contents` array.
///
/// Roles map as user -> "user" and assistant -> "model"; tool responses are
/// emitted as a separate "function" entry, which the API requires to directly
/// follow the model entry carrying the matching functionCall.
pub fn messages_to_gemini_spec(messages: &[Message]) -> Vec<Value> {
    let mut contents = Vec::new();

    for message in messages {
        let role = match message.role {
            Role::User => "user",
            Role::Assistant => "model",
        };

        let mut parts = Vec::new();
        let mut function_parts = Vec::new();

        for content in &message.content {
            match content {
                MessageContent::Text(text) => {
                    if !text.text.is_empty() {
                        parts.push(json!({"text": text.text}));
                    }
                }
                MessageContent::Inline(inline) => {
                    parts.push(json!({
                        "inlineData": {
                            "mimeType": inline.mime_type,
                            "data": inline.data,
                        }
                    }));
                }
                MessageContent::ToolRequest(request) => {
                    // Malformed requests are not replayable; only successful
                    // calls appear in history.
                    if let Ok(tool_call) = &request.tool_call {
                        parts.push(json!({
                            "functionCall": {
                                "name": tool_call.name,
                                "args": tool_call.arguments,
                            }
                        }));
                    }
                }
                MessageContent::ToolResponse(response) => {
                    // functionResponse.response maps to a protobuf Struct and
                    // must be a JSON object, never a bare string.
                    let payload = match &response.tool_result {
                        Ok(contents) => {
                            let text: Vec<&str> =
                                contents.iter().filter_map(|c| c.as_text()).collect();
                            json!({"result": text.join("\n")})
                        }
                        Err(e) => json!({"error": e.to_string()}),
                    };
                    let mut part = json!({
                        "functionResponse": {
                            "name": response.name,
                            "response": payload,
                        }
                    });
                    if !response.id.is_empty() {
                        part["functionResponse"]["id"] = json!(response.id);
                    }
                    function_parts.push(part);
                }
            }
        }

        if !parts.is_empty() {
            contents.push(json!({"role": role, "parts": parts}));
        }
        if !function_parts.is_empty() {
            contents.push(json!({"role": "function", "parts": function_parts}));
        }
    }

    contents
}

/// Convert internal Tool declarations to the generateContent `tools` array.
pub fn tools_to_gemini_spec(tools: &[Tool]) -> Result<Value> {
    let mut tool_names = std::collections::HashSet::new();
    let mut declarations = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(anyhow!("Duplicate tool name: {}", tool.name));
        }
        declarations.push(json!({
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.input_schema,
        }));
    }

    Ok(json!([{"functionDeclarations": declarations}]))
}

/// Convert a generateContent response to an internal assistant message.
pub fn gemini_response_to_message(response: Value) -> Result<Message> {
    let candidate = &response["candidates"][0];
    if candidate.is_null() {
        let reason = response["promptFeedback"]["blockReason"]
            .as_str()
            .unwrap_or("no candidates in response");
        return Err(anyhow!("Model returned no content: {}", reason));
    }

    let mut message = Message::assistant();
    let empty = Vec::new();
    let parts = candidate["content"]["parts"].as_array().unwrap_or(&empty);

    for part in parts {
        if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
            message = message.with_text(text);
        }

        if let Some(inline) = part.get("inlineData") {
            let mime_type = inline["mimeType"].as_str().unwrap_or_default();
            let data = inline["data"].as_str().unwrap_or_default();
            message = message.with_inline(mime_type, data);
        }

        if let Some(call) = part.get("functionCall") {
            let name = call["name"].as_str().unwrap_or_default().to_string();
            let id = call
                .get("id")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            let arguments = call.get("args").cloned().unwrap_or_else(|| json!({}));

            if !is_valid_function_name(&name) {
                let error = DartaError::ToolNotFound(format!(
                    "The returned function name '{}' had invalid characters, it must match this regex [a-zA-Z0-9_-]+",
                    name
                ));
                message = message.with_tool_request(id, Err(error));
            } else {
                message = message.with_tool_request(id, Ok(ToolCall::new(name, arguments)));
            }
        }
    }

    Ok(message)
}

fn is_valid_function_name(name: &str) -> bool {
    let re = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
    re.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::content::Content;
    use serde_json::json;

    const GEMINI_TOOL_USE_RESPONSE: &str = r#"{
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [{
                    "functionCall": {
                        "name": "generate_marketing_image",
                        "args": {"prompt": "a soap flyer"}
                    }
                }]
            },
            "finishReason": "STOP"
        }],
        "usageMetadata": {
            "promptTokenCount": 10,
            "candidatesTokenCount": 25,
            "totalTokenCount": 35
        }
    }"#;

    #[test]
    fn test_messages_to_gemini_spec_text() {
        let message = Message::user().with_text("Hello");
        let spec = messages_to_gemini_spec(&[message]);

        assert_eq!(spec.len(), 1);
        assert_eq!(spec[0]["role"], "user");
        assert_eq!(spec[0]["parts"][0]["text"], "Hello");
    }

    #[test]
    fn test_messages_to_gemini_spec_inline() {
        let message = Message::user()
            .with_text("what is this?")
            .with_inline("application/pdf", "AAAA");
        let spec = messages_to_gemini_spec(&[message]);

        assert_eq!(spec.len(), 1);
        assert_eq!(spec[0]["parts"][0]["text"], "what is this?");
        assert_eq!(spec[0]["parts"][1]["inlineData"]["mimeType"], "application/pdf");
        assert_eq!(spec[0]["parts"][1]["inlineData"]["data"], "AAAA");
    }

    #[test]
    fn test_messages_to_gemini_spec_tool_round_trip() {
        let messages = vec![
            Message::user().with_text("make me a flyer"),
            Message::assistant().with_tool_request(
                "call-1",
                Ok(ToolCall::new(
                    "generate_marketing_image",
                    json!({"prompt": "soap flyer"}),
                )),
            ),
            Message::user().with_tool_response(
                "call-1",
                "generate_marketing_image",
                Ok(vec![Content::text("Image generated successfully.")]),
            ),
        ];

        let spec = messages_to_gemini_spec(&messages);

        assert_eq!(spec.len(), 3);
        assert_eq!(spec[1]["role"], "model");
        assert_eq!(
            spec[1]["parts"][0]["functionCall"]["name"],
            "generate_marketing_image"
        );
        assert_eq!(spec[2]["role"], "function");
        assert_eq!(
            spec[2]["parts"][0]["functionResponse"]["response"]["result"],
            "Image generated successfully."
        );
        assert_eq!(spec[2]["parts"][0]["functionResponse"]["id"], "call-1");
    }

    #[test]
    fn test_failed_tool_request_is_not_replayed() {
        let message = Message::assistant().with_tool_request(
            "call-1",
            Err(DartaError::InvalidToolArguments("bad args".to_string())),
        );
        let spec = messages_to_gemini_spec(&[message]);
        assert!(spec.is_empty());
    }

    #[test]
    fn test_tools_to_gemini_spec() {
        let tool = Tool::new(
            "generate_marketing_image",
            "Generates a marketing image",
            json!({
                "type": "object",
                "properties": {
                    "prompt": {"type": "string"}
                },
                "required": ["prompt"]
            }),
        );

        let spec = tools_to_gemini_spec(&[tool]).unwrap();
        assert_eq!(
            spec[0]["functionDeclarations"][0]["name"],
            "generate_marketing_image"
        );
    }

    #[test]
    fn test_tools_to_gemini_spec_duplicate() {
        let tool = Tool::new("t", "a tool", json!({"type": "object"}));
        let result = tools_to_gemini_spec(&[tool.clone(), tool]);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Duplicate tool name"));
    }

    #[test]
    fn test_gemini_response_to_message_text() {
        let response = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "Today you sold 220,000 UGX."}]
                }
            }]
        });

        let message = gemini_response_to_message(response).unwrap();
        assert_eq!(message.text(), "Today you sold 220,000 UGX.");
        assert!(matches!(message.role, Role::Assistant));
    }

    #[test]
    fn test_gemini_response_to_message_function_call() {
        let response: Value = serde_json::from_str(GEMINI_TOOL_USE_RESPONSE).unwrap();
        let message = gemini_response_to_message(response).unwrap();

        let request = message.first_tool_request().unwrap();
        let tool_call = request.tool_call.as_ref().unwrap();
        assert_eq!(tool_call.name, "generate_marketing_image");
        assert_eq!(tool_call.arguments, json!({"prompt": "a soap flyer"}));
    }

    #[test]
    fn test_gemini_response_to_message_invalid_function_name() {
        let mut response: Value = serde_json::from_str(GEMINI_TOOL_USE_RESPONSE).unwrap();
        response["candidates"][0]["content"]["parts"][0]["functionCall"]["name"] =
            json!("invalid name");

        let message = gemini_response_to_message(response).unwrap();
        let request = message.first_tool_request().unwrap();
        assert!(matches!(
            request.tool_call,
            Err(DartaError::ToolNotFound(_))
        ));
    }

    #[test]
    fn test_gemini_response_to_message_missing_args_default_to_empty() {
        let mut response: Value = serde_json::from_str(GEMINI_TOOL_USE_RESPONSE).unwrap();
        response["candidates"][0]["content"]["parts"][0]["functionCall"]
            .as_object_mut()
            .unwrap()
            .remove("args");

        let message = gemini_response_to_message(response).unwrap();
        let request = message.first_tool_request().unwrap();
        assert_eq!(request.tool_call.as_ref().unwrap().arguments, json!({}));
    }

    #[test]
    fn test_gemini_response_blocked_prompt_is_an_error() {
        let response = json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        });

        let err = gemini_response_to_message(response).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }
}
