// FAQ generator: distills a finished conversation into reusable FAQs

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::error::ApiError;
use crate::llm::{json_schema_format, parse_structured, ChatModel, ChatRequest};
use crate::models::{Faq, FaqList, Message};
use crate::prompts::{format_conversation, wrap_conversation, FAQ_PROMPT};

pub struct FaqGenerator {
    model: Arc<dyn ChatModel>,
    model_name: String,
}

impl FaqGenerator {
    pub fn new(model: Arc<dyn ChatModel>, model_name: String) -> Self {
        Self { model, model_name }
    }

    /// Extract 1-5 FAQs from a transcript. Conversations shorter than one
    /// full exchange are skipped without an inference call.
    pub async fn generate(&self, conversation: &[Message]) -> Result<Vec<Faq>, ApiError> {
        if conversation.len() < 2 {
            return Ok(Vec::new());
        }

        let formatted = format_conversation(conversation);
        let outcome = self
            .model
            .chat(ChatRequest {
                model: self.model_name.clone(),
                system: FAQ_PROMPT.to_string(),
                messages: vec![Message::user(wrap_conversation(&formatted))],
                tools: Vec::new(),
                temperature: 0.3,
                response_format: Some(json_schema_format(
                    "faq_list",
                    json!({
                        "type": "object",
                        "properties": {
                            "faqs": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "question": {"type": "string"},
                                        "answer": {"type": "string"},
                                        "category": {
                                            "type": "string",
                                            "description": "Legal category (e.g., Contract Law, Family Law, etc.)"
                                        }
                                    },
                                    "required": ["question", "answer", "category"],
                                    "additionalProperties": false
                                }
                            }
                        },
                        "required": ["faqs"],
                        "additionalProperties": false
                    }),
                )),
            })
            .await?;

        let parsed: FaqList = parse_structured(&outcome.content)?;
        info!(count = parsed.faqs.len(), "FAQ generator: extracted FAQs");
        Ok(parsed.faqs)
    }
}
