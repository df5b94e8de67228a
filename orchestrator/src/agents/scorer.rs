// Relevance Scorer: grades retrieved context against the user's query

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::error::ApiError;
use crate::llm::{json_schema_format, parse_structured, ChatModel, ChatRequest};
use crate::models::{DocumentScore, Message, RelevanceScore};
use crate::prompts::score_prompt;

pub struct RelevanceScorer {
    model: Arc<dyn ChatModel>,
    model_name: String,
}

impl RelevanceScorer {
    pub fn new(model: Arc<dyn ChatModel>, model_name: String) -> Self {
        Self { model, model_name }
    }

    /// Score the context block on the 1-10 rubric. The verdict gates the
    /// loop's accept decision and is taken as ground truth. Empty context
    /// is scored like any other; it is not an error.
    pub async fn score(&self, query: &str, context: &str) -> Result<RelevanceScore, ApiError> {
        let outcome = self
            .model
            .chat(ChatRequest {
                model: self.model_name.clone(),
                system: String::new(),
                messages: vec![Message::user(score_prompt(query, context))],
                tools: Vec::new(),
                temperature: 0.5,
                response_format: Some(json_schema_format(
                    "document_score",
                    json!({
                        "type": "object",
                        "properties": {
                            "score": {
                                "type": "integer",
                                "description": "Score for the documents (combined) from 1-10 for a given query.",
                                "minimum": 1,
                                "maximum": 10
                            }
                        },
                        "required": ["score"],
                        "additionalProperties": false
                    }),
                )),
            })
            .await?;

        let parsed: DocumentScore = parse_structured(&outcome.content)?;
        let score = RelevanceScore::new(parsed.score)?;
        info!(score = score.value(), "Scorer: graded retrieved context");
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::llm::ChatOutcome;

    struct ScriptedModel {
        replies: Mutex<VecDeque<String>>,
    }

    impl ScriptedModel {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            }
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn chat(&self, _request: ChatRequest) -> Result<ChatOutcome, ApiError> {
            let content = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ApiError::InferenceError("no scripted reply".to_string()))?;
            Ok(ChatOutcome {
                content,
                tool_calls: Vec::new(),
            })
        }
    }

    fn scorer(replies: &[&str]) -> RelevanceScorer {
        RelevanceScorer::new(Arc::new(ScriptedModel::new(replies)), "scorer".to_string())
    }

    #[tokio::test]
    async fn parses_a_valid_score() {
        let score = scorer(&[r#"{"score": 8}"#])
            .score("notice period", "<Document/>")
            .await
            .unwrap();
        assert_eq!(score.value(), 8);
    }

    #[tokio::test]
    async fn rejects_out_of_range_scores() {
        let result = scorer(&[r#"{"score": 12}"#])
            .score("notice period", "<Document/>")
            .await;
        assert!(matches!(result, Err(ApiError::MalformedModelOutput(_))));
    }

    #[tokio::test]
    async fn rejects_non_json_output() {
        let result = scorer(&["eight out of ten"])
            .score("notice period", "<Document/>")
            .await;
        assert!(matches!(result, Err(ApiError::MalformedModelOutput(_))));
    }

    #[tokio::test]
    async fn empty_context_still_scores() {
        let score = scorer(&[r#"{"score": 2}"#])
            .score("notice period", "")
            .await
            .unwrap();
        assert_eq!(score.value(), 2);
    }
}
