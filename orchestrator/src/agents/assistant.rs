// Decision Agent: answers directly or requests retrieval via tool call

use std::sync::Arc;

use tracing::info;

use crate::agents::retriever::search_tool_definition;
use crate::error::ApiError;
use crate::llm::{ChatModel, ChatRequest};
use crate::models::Message;
use crate::prompts::{ASSISTANT_PROMPT_FOR_PROFESSIONALS, ASSISTANT_PROMPT_FOR_STUDENTS};

pub struct AssistantAgent {
    model: Arc<dyn ChatModel>,
    model_name: String,
}

impl AssistantAgent {
    pub fn new(model: Arc<dyn ChatModel>, model_name: String) -> Self {
        Self { model, model_name }
    }

    /// One inference call over the full history with the persona prompt and
    /// the search tool bound. Failures propagate; retry discipline lives in
    /// the retrieval loop, not here.
    pub async fn respond(
        &self,
        messages: &[Message],
        is_professional: bool,
    ) -> Result<Message, ApiError> {
        info!(is_professional, "Assistant: generating response");

        let system = if is_professional {
            ASSISTANT_PROMPT_FOR_PROFESSIONALS
        } else {
            ASSISTANT_PROMPT_FOR_STUDENTS
        };

        let outcome = self
            .model
            .chat(ChatRequest {
                model: self.model_name.clone(),
                system: system.to_string(),
                messages: messages.to_vec(),
                tools: vec![search_tool_definition()],
                temperature: 0.7,
                response_format: None,
            })
            .await?;

        let mut message = Message::assistant(outcome.content);
        message.tool_calls = outcome.tool_calls;
        Ok(message)
    }
}
