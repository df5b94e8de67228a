// Suggested-question generator: standalone follow-ups from a conversation

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::error::ApiError;
use crate::llm::{json_schema_format, parse_structured, ChatModel, ChatRequest};
use crate::models::{Message, SuggestedQuestions};
use crate::prompts::{format_conversation, wrap_conversation, SUGGESTED_QUESTIONS_PROMPT};

pub struct QuestionGenerator {
    model: Arc<dyn ChatModel>,
    model_name: String,
}

impl QuestionGenerator {
    pub fn new(model: Arc<dyn ChatModel>, model_name: String) -> Self {
        Self { model, model_name }
    }

    /// Generate 3-5 standalone questions from a transcript; short
    /// conversations yield nothing.
    pub async fn generate(&self, conversation: &[Message]) -> Result<Vec<String>, ApiError> {
        if conversation.len() < 2 {
            return Ok(Vec::new());
        }

        let formatted = format_conversation(conversation);
        let outcome = self
            .model
            .chat(ChatRequest {
                model: self.model_name.clone(),
                system: SUGGESTED_QUESTIONS_PROMPT.to_string(),
                messages: vec![Message::user(wrap_conversation(&formatted))],
                tools: Vec::new(),
                temperature: 0.5,
                response_format: Some(json_schema_format(
                    "suggested_questions",
                    json!({
                        "type": "object",
                        "properties": {
                            "questions": {
                                "type": "array",
                                "items": {"type": "string"},
                                "description": "A list of 1 to 5 concise, standalone questions a user might ask based on the preceding conversation."
                            }
                        },
                        "required": ["questions"],
                        "additionalProperties": false
                    }),
                )),
            })
            .await?;

        let parsed: SuggestedQuestions = parse_structured(&outcome.content)?;
        info!(count = parsed.questions.len(), "Question generator: extracted follow-ups");
        Ok(parsed.questions)
    }
}
