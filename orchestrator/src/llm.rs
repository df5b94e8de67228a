//! Chat-completions client for the inference service.
//!
//! Components receive an `Arc<dyn ChatModel>` handle instead of binding a
//! process-wide client, so every inference call is an explicit
//! request/response exchange and tests can substitute a scripted model.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ApiError;
use crate::models::{Message, Role, ToolCall};

/// A tool the assistant model may invoke, in JSON-schema form.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// One inference call. `response_format` carries an optional JSON-schema
/// constraint for structured outputs.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub system: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub temperature: f32,
    pub response_format: Option<Value>,
}

/// The model's reply: free text plus any structured tool invocations.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<ChatOutcome, ApiError>;
}

/// Client for an OpenAI-style `/chat/completions` endpoint.
pub struct OpenAiChatModel {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiChatModel {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn messages_to_json(system: &str, messages: &[Message]) -> Vec<Value> {
        let mut wire = Vec::with_capacity(messages.len() + 1);
        if !system.is_empty() {
            wire.push(json!({"role": "system", "content": system}));
        }
        for message in messages {
            match message.role {
                Role::User => wire.push(json!({"role": "user", "content": message.content})),
                Role::Assistant => {
                    let mut entry = json!({"role": "assistant", "content": message.content});
                    if !message.tool_calls.is_empty() {
                        entry["tool_calls"] = Value::Array(
                            message
                                .tool_calls
                                .iter()
                                .map(|call| {
                                    json!({
                                        "id": call.id,
                                        "type": "function",
                                        "function": {
                                            "name": call.name,
                                            "arguments": call.arguments.to_string(),
                                        },
                                    })
                                })
                                .collect(),
                        );
                    }
                    wire.push(entry);
                }
                Role::Tool => wire.push(json!({
                    "role": "tool",
                    "content": message.content,
                    "tool_call_id": message.tool_call_id,
                })),
            }
        }
        wire
    }

    fn tools_to_json(tools: &[ToolDefinition]) -> Value {
        Value::Array(
            tools
                .iter()
                .map(|tool| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": tool.name,
                            "description": tool.description,
                            "parameters": tool.parameters,
                        },
                    })
                })
                .collect(),
        )
    }

    fn parse_outcome(body: &Value) -> Result<ChatOutcome, ApiError> {
        let message = body["choices"]
            .get(0)
            .map(|choice| &choice["message"])
            .ok_or_else(|| {
                ApiError::MalformedModelOutput("completion has no choices".to_string())
            })?;

        let content = message["content"].as_str().unwrap_or("").to_string();

        let mut tool_calls = Vec::new();
        if let Some(calls) = message["tool_calls"].as_array() {
            for call in calls {
                let id = call["id"].as_str().unwrap_or("").to_string();
                let name = call["function"]["name"].as_str().unwrap_or("").to_string();
                let raw_arguments = call["function"]["arguments"].as_str().unwrap_or("{}");
                let arguments = serde_json::from_str(raw_arguments).map_err(|e| {
                    ApiError::MalformedModelOutput(format!(
                        "tool call arguments are not valid JSON: {}",
                        e
                    ))
                })?;
                tool_calls.push(ToolCall { id, name, arguments });
            }
        }

        Ok(ChatOutcome { content, tool_calls })
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn chat(&self, request: ChatRequest) -> Result<ChatOutcome, ApiError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = json!({
            "model": request.model,
            "messages": Self::messages_to_json(&request.system, &request.messages),
            "temperature": request.temperature,
        });
        if !request.tools.is_empty() {
            body["tools"] = Self::tools_to_json(&request.tools);
        }
        if let Some(format) = &request.response_format {
            body["response_format"] = format.clone();
        }

        debug!(url = %url, model = %request.model, "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let response_body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::InferenceError(format!(
                "inference service returned {}: {}",
                status, response_body
            )));
        }

        let parsed: Value = serde_json::from_str(&response_body).map_err(|e| {
            ApiError::MalformedModelOutput(format!("completion body is not valid JSON: {}", e))
        })?;

        Self::parse_outcome(&parsed)
    }
}

/// Build a `response_format` payload constraining the reply to a schema.
pub fn json_schema_format(name: &str, schema: Value) -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": name,
            "schema": schema,
            "strict": true,
        },
    })
}

/// Parse a structured-output reply into its typed form. Anything that does
/// not match the schema is an explicit error rather than a silent default.
pub fn parse_structured<T: DeserializeOwned>(content: &str) -> Result<T, ApiError> {
    serde_json::from_str(content).map_err(|e| {
        ApiError::MalformedModelOutput(format!(
            "structured output did not match the expected schema: {}",
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_messages_include_system_and_tool_results() {
        let messages = vec![
            Message::user("What is bail?"),
            Message::tool("<Document/>", "call_1"),
        ];
        let wire = OpenAiChatModel::messages_to_json("be helpful", &messages);
        assert_eq!(wire[0]["role"], "system");
        assert_eq!(wire[1]["role"], "user");
        assert_eq!(wire[2]["role"], "tool");
        assert_eq!(wire[2]["tool_call_id"], "call_1");
    }

    #[test]
    fn wire_assistant_tool_calls_serialize_arguments_as_text() {
        let mut message = Message::assistant("");
        message.tool_calls.push(ToolCall {
            id: "call_1".to_string(),
            name: "search_knowledge_base".to_string(),
            arguments: json!({"query": "bail conditions"}),
        });
        let wire = OpenAiChatModel::messages_to_json("sys", &[message]);
        let call = &wire[1]["tool_calls"][0];
        assert_eq!(call["type"], "function");
        assert_eq!(call["function"]["name"], "search_knowledge_base");
        assert_eq!(
            call["function"]["arguments"],
            r#"{"query":"bail conditions"}"#
        );
    }

    #[test]
    fn parse_outcome_extracts_content_and_calls() {
        let body = json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_9",
                        "type": "function",
                        "function": {
                            "name": "search_knowledge_base",
                            "arguments": "{\"query\": \"termination notice\", \"limit\": 5}"
                        }
                    }]
                }
            }]
        });
        let outcome = OpenAiChatModel::parse_outcome(&body).unwrap();
        assert_eq!(outcome.content, "");
        assert_eq!(outcome.tool_calls.len(), 1);
        assert_eq!(outcome.tool_calls[0].arguments["limit"], 5);
    }

    #[test]
    fn parse_outcome_rejects_unparseable_arguments() {
        let body = json!({
            "choices": [{
                "message": {
                    "content": "",
                    "tool_calls": [{
                        "id": "call_9",
                        "type": "function",
                        "function": {"name": "search_knowledge_base", "arguments": "not json"}
                    }]
                }
            }]
        });
        assert!(matches!(
            OpenAiChatModel::parse_outcome(&body),
            Err(ApiError::MalformedModelOutput(_))
        ));
    }

    #[test]
    fn parse_structured_rejects_schema_mismatch() {
        let parsed: Result<crate::models::DocumentScore, _> = parse_structured("{\"score\": 8}");
        assert_eq!(parsed.unwrap().score, 8);
        let bad: Result<crate::models::DocumentScore, _> = parse_structured("{\"points\": 8}");
        assert!(bad.is_err());
    }
}
