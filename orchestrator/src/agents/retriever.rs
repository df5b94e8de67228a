// Knowledge Retriever: single-shot semantic search over the legal index

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::error::ApiError;
use crate::index::SemanticIndex;
use crate::llm::ToolDefinition;
use crate::models::{RetrievalRequest, RetrievedContext, RetrievedPassage};

pub const SEARCH_TOOL_NAME: &str = "search_knowledge_base";

/// The tool surface the assistant model sees. Mirrors the retrieval request
/// fields; `limit` and `source` are optional.
pub fn search_tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: SEARCH_TOOL_NAME.to_string(),
        description: "Searches the knowledgebase for relevant legal documents. \
                      Returns the retrieved documents, each wrapped in a <Document> tag."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "A detailed, descriptive query in English language."
                },
                "limit": {
                    "type": "integer",
                    "description": "Number of documents to retrieve. Defaults to 5."
                },
                "source": {
                    "type": "string",
                    "description": "A file name used to filter results to only include results from that source document, e.g. 'MEDICINES and RELATED PRODUCTS ACT_2014.pdf'."
                }
            },
            "required": ["query"]
        }),
    }
}

pub struct KnowledgeRetriever {
    index: Arc<dyn SemanticIndex>,
    default_limit: usize,
}

impl KnowledgeRetriever {
    pub fn new(index: Arc<dyn SemanticIndex>, default_limit: usize) -> Self {
        Self { index, default_limit }
    }

    /// One index query per call; no retries here. An empty passage list is
    /// a valid outcome and formats to an empty block.
    pub async fn retrieve(&self, request: &RetrievalRequest) -> Result<RetrievedContext, ApiError> {
        let limit = request.limit.unwrap_or(self.default_limit);
        info!(query = %request.query, limit, source = ?request.source, "Retriever: searching knowledge base");

        let passages = self
            .index
            .search_passages(&request.query, limit, request.source.as_deref())
            .await?;
        info!(count = passages.len(), "Retriever: retrieved passages");

        let block = format_passages(&passages);
        Ok(RetrievedContext { passages, block })
    }
}

/// Delimited context block handed to the scorer and the assistant model.
/// The framing is a stable contract; downstream prompts parse on it.
pub fn format_passages(passages: &[RetrievedPassage]) -> String {
    passages
        .iter()
        .map(|passage| {
            format!(
                "<Document source=\"{}\" page=\"{}\" chunk_id=\"{}\">\n{}\n</Document>",
                passage.source, passage.page, passage.chunk_id, passage.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}
