//! Turn processing for the legal assistant.
//!
//! One user turn is a fixed, sequential pipeline: decision call, then (only
//! if the model requested retrieval) the bounded retrieval-quality loop,
//! then the final decision call over the extended history. The loop either
//! accepts context at or above the relevance threshold or exhausts its
//! attempt budget and keeps the last context it obtained.

use std::sync::Arc;

use tracing::info;

use crate::agents::assistant::AssistantAgent;
use crate::agents::retriever::KnowledgeRetriever;
use crate::agents::rewriter::QueryRewriter;
use crate::agents::scorer::RelevanceScorer;
use crate::config::Config;
use crate::error::ApiError;
use crate::index::SemanticIndex;
use crate::llm::ChatModel;
use crate::models::{Message, RetrievalRequest, Role};

pub struct LegalAssistant {
    assistant: AssistantAgent,
    retriever: KnowledgeRetriever,
    scorer: RelevanceScorer,
    rewriter: QueryRewriter,
    relevance_threshold: u8,
    max_retrieval_attempts: u32,
}

impl LegalAssistant {
    pub fn new(
        model: Arc<dyn ChatModel>,
        index: Arc<dyn SemanticIndex>,
        config: &Config,
    ) -> Self {
        Self {
            assistant: AssistantAgent::new(model.clone(), config.primary_model.clone()),
            retriever: KnowledgeRetriever::new(index, config.retrieval_top_k),
            scorer: RelevanceScorer::new(model.clone(), config.score_documents_model.clone()),
            rewriter: QueryRewriter::new(model, config.rewrite_query_model.clone()),
            relevance_threshold: config.relevance_threshold,
            max_retrieval_attempts: config.max_retrieval_attempts,
        }
    }

    /// Process one user turn and produce the single new assistant message.
    ///
    /// Any inference or retrieval failure propagates to the caller before
    /// anything is appended, so the transcript the session layer holds
    /// stays consistent and the turn can simply be retried.
    pub async fn run_turn(
        &self,
        mut messages: Vec<Message>,
        is_professional: bool,
    ) -> Result<Message, ApiError> {
        let user_query = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .ok_or_else(|| {
                ApiError::BadRequest("conversation has no user message".to_string())
            })?;

        let response = self.assistant.respond(&messages, is_professional).await?;

        // Only the last retrieval request in the turn is honored; earlier
        // tool calls in the same response are discarded.
        let Some(call) = response.tool_calls.last().cloned() else {
            return Ok(response);
        };

        let mut request = RetrievalRequest::from_tool_call(&call)?;
        let mut attempt: u32 = 0;

        let context = loop {
            let context = self.retriever.retrieve(&request).await?;

            // Relevance is always judged against the user's own question,
            // never against the rewritten retrieval query.
            let score = self.scorer.score(&user_query, &context.block).await?;

            if score.value() >= self.relevance_threshold {
                info!(attempt, score = score.value(), "Retrieval accepted");
                break context;
            }
            if attempt + 1 >= self.max_retrieval_attempts {
                info!(
                    attempt,
                    score = score.value(),
                    "Retrieval budget exhausted, keeping last context"
                );
                break context;
            }

            request.query = self.rewriter.rewrite(&request.query).await?;
            attempt += 1;
        };

        let tool_message = Message::tool(context.block, call.id.clone());
        messages.push(response);
        messages.push(tool_message);

        self.assistant.respond(&messages, is_professional).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::llm::{ChatOutcome, ChatRequest};
    use crate::models::{RetrievedPassage, ToolCall};

    struct ScriptedModel {
        replies: Mutex<VecDeque<ChatOutcome>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<ChatOutcome>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests_for(&self, model: &str) -> Vec<ChatRequest> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.model == model)
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn chat(&self, request: ChatRequest) -> Result<ChatOutcome, ApiError> {
            self.requests.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ApiError::InferenceError("script exhausted".to_string()))
        }
    }

    struct ScriptedIndex {
        results: Mutex<VecDeque<Vec<RetrievedPassage>>>,
        searches: Mutex<Vec<(String, usize, Option<String>)>>,
    }

    impl ScriptedIndex {
        fn new(results: Vec<Vec<RetrievedPassage>>) -> Self {
            Self {
                results: Mutex::new(results.into()),
                searches: Mutex::new(Vec::new()),
            }
        }

        fn search_count(&self) -> usize {
            self.searches.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl SemanticIndex for ScriptedIndex {
        async fn search_passages(
            &self,
            query: &str,
            limit: usize,
            source: Option<&str>,
        ) -> Result<Vec<RetrievedPassage>, ApiError> {
            self.searches.lock().unwrap().push((
                query.to_string(),
                limit,
                source.map(str::to_string),
            ));
            Ok(self
                .results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_default())
        }

        async fn similar_questions(&self, _query: &str, _k: usize) -> Result<Vec<String>, ApiError> {
            Ok(Vec::new())
        }

        async fn add_questions(&self, _questions: &[String]) -> Result<(), ApiError> {
            Ok(())
        }
    }

    fn test_config() -> Config {
        Config {
            port: 0,
            database_url: String::new(),
            redis_url: String::new(),
            openai_api_key: None,
            openai_base_url: String::new(),
            vector_db_service_url: String::new(),
            primary_model: "primary".to_string(),
            score_documents_model: "scorer".to_string(),
            rewrite_query_model: "rewriter".to_string(),
            embedding_model: String::new(),
            retrieval_top_k: 5,
            relevance_threshold: 7,
            max_retrieval_attempts: 2,
            faq_namespace: String::new(),
            log_level: "info".to_string(),
        }
    }

    fn text_reply(content: &str) -> ChatOutcome {
        ChatOutcome {
            content: content.to_string(),
            tool_calls: Vec::new(),
        }
    }

    fn search_reply(query: &str) -> ChatOutcome {
        ChatOutcome {
            content: String::new(),
            tool_calls: vec![ToolCall {
                id: "call_1".to_string(),
                name: "search_knowledge_base".to_string(),
                arguments: json!({ "query": query }),
            }],
        }
    }

    fn passage(text: &str) -> RetrievedPassage {
        RetrievedPassage {
            text: text.to_string(),
            source: "EMPLOYMENT ACT_2010.pdf".to_string(),
            page: 12,
            chunk_id: 3,
        }
    }

    fn assistant_with(
        model: &Arc<ScriptedModel>,
        index: &Arc<ScriptedIndex>,
        config: &Config,
    ) -> LegalAssistant {
        LegalAssistant::new(
            Arc::clone(model) as Arc<dyn ChatModel>,
            Arc::clone(index) as Arc<dyn SemanticIndex>,
            config,
        )
    }

    const FINAL_ANSWER: &str =
        "The notice period is one month.\n\n### References\n1. Employment Act (2010) - page 12";

    #[tokio::test]
    async fn accepted_first_attempt_retrieves_once_without_rewrite() {
        // Scenario A: first retrieval scores above the threshold.
        let model = Arc::new(ScriptedModel::new(vec![
            search_reply("notice period termination"),
            text_reply(r#"{"score": 8}"#),
            text_reply(FINAL_ANSWER),
        ]));
        let index = Arc::new(ScriptedIndex::new(vec![vec![passage(
            "The notice period shall be one month.",
        )]]));
        let assistant = assistant_with(&model, &index, &test_config());

        let answer = assistant
            .run_turn(
                vec![Message::user("What is the notice period for termination?")],
                false,
            )
            .await
            .unwrap();

        assert_eq!(answer.content, FINAL_ANSWER);
        assert!(answer.content.contains("### References"));
        assert_eq!(index.search_count(), 1);
        assert_eq!(model.requests_for("scorer").len(), 1);
        assert_eq!(model.requests_for("rewriter").len(), 0);
        assert_eq!(model.requests_for("primary").len(), 2);
    }

    #[tokio::test]
    async fn low_score_triggers_rewrite_then_second_attempt_wins() {
        // Scenario B: 4 then 9; the second passage set reaches the model.
        let model = Arc::new(ScriptedModel::new(vec![
            search_reply("termination"),
            text_reply(r#"{"score": 4}"#),
            text_reply(r#"{"query": "statutory notice period employment termination"}"#),
            text_reply(r#"{"score": 9}"#),
            text_reply(FINAL_ANSWER),
        ]));
        let index = Arc::new(ScriptedIndex::new(vec![
            vec![passage("Unrelated provisions on bail.")],
            vec![passage("The notice period shall be one month.")],
        ]));
        let assistant = assistant_with(&model, &index, &test_config());

        let answer = assistant
            .run_turn(
                vec![Message::user("What is the notice period for termination?")],
                true,
            )
            .await
            .unwrap();

        assert_eq!(answer.content, FINAL_ANSWER);
        assert_eq!(index.search_count(), 2);
        assert_eq!(model.requests_for("rewriter").len(), 1);

        // The second index query uses the rewritten retrieval query.
        let searches = index.searches.lock().unwrap();
        assert_eq!(
            searches[1].0,
            "statutory notice period employment termination"
        );
        drop(searches);

        // The final assistant call sees the second attempt's passages.
        let final_request = model.requests_for("primary")[1].clone();
        let tool_result = final_request.messages.last().unwrap().clone();
        assert_eq!(tool_result.role, Role::Tool);
        assert!(tool_result.content.contains("The notice period shall be one month."));
        assert!(!tool_result.content.contains("Unrelated provisions on bail."));
    }

    #[tokio::test]
    async fn exhausted_budget_keeps_last_context_best_effort() {
        // Scenario C: every attempt scores 3; exactly MAX attempts run,
        // MAX - 1 rewrites, and the last attempt's passages are kept.
        let model = Arc::new(ScriptedModel::new(vec![
            search_reply("termination"),
            text_reply(r#"{"score": 3}"#),
            text_reply(r#"{"query": "statutory notice period employment termination"}"#),
            text_reply(r#"{"score": 3}"#),
            text_reply("I was unable to find sufficient information to answer completely."),
        ]));
        let index = Arc::new(ScriptedIndex::new(vec![
            vec![passage("First low-relevance passage.")],
            vec![passage("Second low-relevance passage.")],
        ]));
        let assistant = assistant_with(&model, &index, &test_config());

        let answer = assistant
            .run_turn(
                vec![Message::user("What is the notice period for termination?")],
                false,
            )
            .await
            .unwrap();

        assert!(answer.content.contains("unable to find sufficient information"));
        assert_eq!(index.search_count(), 2);
        assert_eq!(model.requests_for("scorer").len(), 2);
        assert_eq!(model.requests_for("rewriter").len(), 1);

        let final_request = model.requests_for("primary")[1].clone();
        let tool_result = final_request.messages.last().unwrap().clone();
        assert!(tool_result.content.contains("Second low-relevance passage."));
        assert!(!tool_result.content.contains("First low-relevance passage."));
    }

    #[tokio::test]
    async fn direct_answer_skips_the_loop_entirely() {
        // Scenario D: no tool call, no retrieval.
        let model = Arc::new(ScriptedModel::new(vec![text_reply(
            "I can answer that directly.",
        )]));
        let index = Arc::new(ScriptedIndex::new(Vec::new()));
        let assistant = assistant_with(&model, &index, &test_config());

        let answer = assistant
            .run_turn(vec![Message::user("What does this assistant do?")], false)
            .await
            .unwrap();

        assert_eq!(answer.content, "I can answer that directly.");
        assert_eq!(index.search_count(), 0);
        assert_eq!(model.requests_for("primary").len(), 1);
    }

    #[tokio::test]
    async fn scoring_always_uses_the_original_user_query() {
        let original = "What is the notice period for termination?";
        let model = Arc::new(ScriptedModel::new(vec![
            search_reply("termination"),
            text_reply(r#"{"score": 4}"#),
            text_reply(r#"{"query": "statutory notice period"}"#),
            text_reply(r#"{"score": 9}"#),
            text_reply(FINAL_ANSWER),
        ]));
        let index = Arc::new(ScriptedIndex::new(vec![
            vec![passage("first")],
            vec![passage("second")],
        ]));
        let assistant = assistant_with(&model, &index, &test_config());

        assistant
            .run_turn(vec![Message::user(original)], false)
            .await
            .unwrap();

        for request in model.requests_for("scorer") {
            let prompt = &request.messages[0].content;
            assert!(prompt.contains(&format!("User Query: {}", original)));
        }
    }

    #[tokio::test]
    async fn empty_retrieval_is_scored_not_failed() {
        let mut config = test_config();
        config.max_retrieval_attempts = 1;

        let model = Arc::new(ScriptedModel::new(vec![
            search_reply("nothing matches this"),
            text_reply(r#"{"score": 2}"#),
            text_reply("I could not find relevant material."),
        ]));
        let index = Arc::new(ScriptedIndex::new(vec![Vec::new()]));
        let assistant = assistant_with(&model, &index, &config);

        let answer = assistant
            .run_turn(vec![Message::user("An off-corpus question")], false)
            .await
            .unwrap();

        assert_eq!(answer.content, "I could not find relevant material.");
        let scorer_prompt = &model.requests_for("scorer")[0].messages[0].content;
        assert!(scorer_prompt.contains("<Context>\n\n</Context>"));
    }

    #[tokio::test]
    async fn only_the_last_tool_call_is_consumed() {
        let mut first_response = search_reply("ignored earlier query");
        first_response.tool_calls.push(ToolCall {
            id: "call_2".to_string(),
            name: "search_knowledge_base".to_string(),
            arguments: json!({ "query": "the one that counts" }),
        });

        let model = Arc::new(ScriptedModel::new(vec![
            first_response,
            text_reply(r#"{"score": 8}"#),
            text_reply(FINAL_ANSWER),
        ]));
        let index = Arc::new(ScriptedIndex::new(vec![vec![passage("text")]]));
        let assistant = assistant_with(&model, &index, &test_config());

        assistant
            .run_turn(vec![Message::user("q")], false)
            .await
            .unwrap();

        let searches = index.searches.lock().unwrap();
        assert_eq!(searches.len(), 1);
        assert_eq!(searches[0].0, "the one that counts");
    }

    #[tokio::test]
    async fn malformed_scorer_output_aborts_the_turn() {
        let model = Arc::new(ScriptedModel::new(vec![
            search_reply("termination"),
            text_reply("eight, maybe nine"),
        ]));
        let index = Arc::new(ScriptedIndex::new(vec![vec![passage("text")]]));
        let assistant = assistant_with(&model, &index, &test_config());

        let result = assistant
            .run_turn(vec![Message::user("q")], false)
            .await;

        assert!(matches!(result, Err(ApiError::MalformedModelOutput(_))));
    }

    #[tokio::test]
    async fn rejects_a_turn_without_a_user_message() {
        let model = Arc::new(ScriptedModel::new(Vec::new()));
        let index = Arc::new(ScriptedIndex::new(Vec::new()));
        let assistant = assistant_with(&model, &index, &test_config());

        let result = assistant
            .run_turn(vec![Message::assistant("hello")], false)
            .await;

        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }
}
