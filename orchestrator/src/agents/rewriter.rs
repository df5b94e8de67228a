// Query Rewriter: enhances a search query that retrieved weak context

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::error::ApiError;
use crate::llm::{json_schema_format, parse_structured, ChatModel, ChatRequest};
use crate::models::{Message, ModifiedQuery};
use crate::prompts::rewrite_prompt;

pub struct QueryRewriter {
    model: Arc<dyn ChatModel>,
    model_name: String,
}

impl QueryRewriter {
    pub fn new(model: Arc<dyn ChatModel>, model_name: String) -> Self {
        Self { model, model_name }
    }

    /// Takes only the previous retrieval query; the score and context do
    /// not inform the rewrite.
    pub async fn rewrite(&self, query: &str) -> Result<String, ApiError> {
        info!(query = %query, "Rewriter: enhancing search query");

        let outcome = self
            .model
            .chat(ChatRequest {
                model: self.model_name.clone(),
                system: String::new(),
                messages: vec![Message::user(rewrite_prompt(query))],
                tools: Vec::new(),
                temperature: 0.5,
                response_format: Some(json_schema_format(
                    "modified_query",
                    json!({
                        "type": "object",
                        "properties": {
                            "query": {
                                "type": "string",
                                "description": "The enhanced query to search into the vector store."
                            }
                        },
                        "required": ["query"],
                        "additionalProperties": false
                    }),
                )),
            })
            .await?;

        let parsed: ModifiedQuery = parse_structured(&outcome.content)?;
        Ok(parsed.query)
    }
}
