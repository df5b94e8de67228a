use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

/// One entry of the conversation transcript. The session layer owns the
/// history between turns; within a turn messages are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn tool(content: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// A structured tool invocation emitted by the assistant model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// Arguments of a `search_knowledge_base` call. The query field is the only
/// part mutated between loop attempts (by the rewriter).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalRequest {
    pub query: String,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub source: Option<String>,
}

impl RetrievalRequest {
    /// Parse a tool call's arguments into a retrieval request. Malformed
    /// arguments are an inference-output error, not a retrieval error.
    pub fn from_tool_call(call: &ToolCall) -> Result<Self, ApiError> {
        serde_json::from_value(call.arguments.clone()).map_err(|e| {
            ApiError::MalformedModelOutput(format!(
                "invalid {} arguments: {}",
                call.name, e
            ))
        })
    }
}

/// A passage returned by the semantic index, with provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub text: String,
    pub source: String,
    pub page: i64,
    pub chunk_id: i64,
}

/// The retriever's output for one attempt: the raw passages and the
/// delimited block handed to the scorer and the assistant model.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedContext {
    pub passages: Vec<RetrievedPassage>,
    pub block: String,
}

/// Relevance verdict on the 1-10 scale. Construction validates the range;
/// anything else from the scoring model is rejected outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RelevanceScore(u8);

impl RelevanceScore {
    pub fn new(raw: i64) -> Result<Self, ApiError> {
        if (1..=10).contains(&raw) {
            Ok(Self(raw as u8))
        } else {
            Err(ApiError::MalformedModelOutput(format!(
                "relevance score {} outside the 1-10 scale",
                raw
            )))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

// Structured model outputs

#[derive(Debug, Deserialize)]
pub struct DocumentScore {
    pub score: i64,
}

#[derive(Debug, Deserialize)]
pub struct ModifiedQuery {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct SuggestedQuestions {
    pub questions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FaqList {
    pub faqs: Vec<Faq>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faq {
    pub question: String,
    pub answer: String,
    pub category: String,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct FaqRecord {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub category: String,
    pub frequency: i32,
    pub date_created: DateTime<Utc>,
}

// API Request/Response models

#[derive(Debug, Deserialize)]
pub struct ChatTurnRequest {
    pub messages: Vec<Message>,
    pub is_professional: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatTurnResponse {
    pub request_id: Uuid,
    pub message: Message,
}

#[derive(Debug, Deserialize)]
pub struct EndChatRequest {
    pub messages: Vec<Message>,
}

/// Job payload pushed onto the content-generation queue when a chat ends.
#[derive(Debug, Serialize, Deserialize)]
pub struct ContentJob {
    pub conversation: Vec<Message>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn relevance_score_accepts_the_full_scale() {
        assert_eq!(RelevanceScore::new(1).unwrap().value(), 1);
        assert_eq!(RelevanceScore::new(10).unwrap().value(), 10);
    }

    #[test]
    fn relevance_score_rejects_out_of_range_values() {
        assert!(RelevanceScore::new(0).is_err());
        assert!(RelevanceScore::new(11).is_err());
        assert!(RelevanceScore::new(-3).is_err());
    }

    #[test]
    fn retrieval_request_parses_query_only_arguments() {
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "search_knowledge_base".to_string(),
            arguments: json!({"query": "notice period for termination"}),
        };
        let request = RetrievalRequest::from_tool_call(&call).unwrap();
        assert_eq!(request.query, "notice period for termination");
        assert_eq!(request.limit, None);
        assert_eq!(request.source, None);
    }

    #[test]
    fn retrieval_request_parses_full_arguments() {
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "search_knowledge_base".to_string(),
            arguments: json!({
                "query": "termination notice",
                "limit": 3,
                "source": "EMPLOYMENT ACT_2010.pdf"
            }),
        };
        let request = RetrievalRequest::from_tool_call(&call).unwrap();
        assert_eq!(request.limit, Some(3));
        assert_eq!(request.source.as_deref(), Some("EMPLOYMENT ACT_2010.pdf"));
    }

    #[test]
    fn retrieval_request_rejects_missing_query() {
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "search_knowledge_base".to_string(),
            arguments: json!({"limit": 5}),
        };
        assert!(matches!(
            RetrievalRequest::from_tool_call(&call),
            Err(ApiError::MalformedModelOutput(_))
        ));
    }

    #[test]
    fn tool_message_carries_the_call_id() {
        let msg = Message::tool("context", "call_7");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_7"));
    }
}
