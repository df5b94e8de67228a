//! Client for the semantic index: query embedding plus nearest-neighbor
//! search against the vector service. The index is owned and populated by
//! the ingestion pipeline; this process only queries it, except for the
//! suggested-question namespace which the content worker appends to.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::config::Config;
use crate::error::ApiError;
use crate::models::RetrievedPassage;

#[async_trait]
pub trait SemanticIndex: Send + Sync {
    /// Top-`limit` passages for a query, optionally filtered to one source
    /// document. An empty result is a valid outcome, not an error.
    async fn search_passages(
        &self,
        query: &str,
        limit: usize,
        source: Option<&str>,
    ) -> Result<Vec<RetrievedPassage>, ApiError>;

    /// The `k` stored questions nearest to a query, from the FAQ namespace.
    async fn similar_questions(&self, query: &str, k: usize) -> Result<Vec<String>, ApiError>;

    /// Store suggested follow-up questions in the FAQ namespace.
    async fn add_questions(&self, questions: &[String]) -> Result<(), ApiError>;
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct PassageMetadata {
    text: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    page: i64,
    #[serde(default)]
    chunk_id: i64,
}

#[derive(Debug, Deserialize)]
struct IndexMatch {
    metadata: PassageMetadata,
}

#[derive(Debug, Deserialize)]
struct IndexQueryResponse {
    matches: Vec<IndexMatch>,
}

/// HTTP implementation over the embeddings endpoint and the vector service.
pub struct HttpSemanticIndex {
    client: Client,
    embeddings_url: String,
    api_key: String,
    vector_service_url: String,
    embedding_model: String,
    faq_namespace: String,
}

impl HttpSemanticIndex {
    pub fn new(config: &Config, api_key: String) -> Self {
        Self {
            client: Client::new(),
            embeddings_url: format!("{}/embeddings", config.openai_base_url),
            api_key,
            vector_service_url: config.vector_db_service_url.clone(),
            embedding_model: config.embedding_model.clone(),
            faq_namespace: config.faq_namespace.clone(),
        }
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        let response = self
            .client
            .post(&self.embeddings_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({"model": self.embedding_model, "input": texts}))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::RetrievalError(format!(
                "embedding request failed with {}: {}",
                status, body
            )));
        }

        let parsed: EmbeddingResponse = response.json().await?;
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    async fn query_index(
        &self,
        vector: &[f32],
        top_k: usize,
        namespace: Option<&str>,
        filter: Option<serde_json::Value>,
    ) -> Result<IndexQueryResponse, ApiError> {
        let mut body = json!({"vector": vector, "top_k": top_k});
        if let Some(namespace) = namespace {
            body["namespace"] = json!(namespace);
        }
        if let Some(filter) = filter {
            body["filter"] = filter;
        }

        let response = self
            .client
            .post(format!("{}/index/query", self.vector_service_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::RetrievalError(format!(
                "index query failed with {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl SemanticIndex for HttpSemanticIndex {
    async fn search_passages(
        &self,
        query: &str,
        limit: usize,
        source: Option<&str>,
    ) -> Result<Vec<RetrievedPassage>, ApiError> {
        let vectors = self.embed(&[query.to_string()]).await?;
        let vector = vectors.first().ok_or_else(|| {
            ApiError::RetrievalError("embedding response was empty".to_string())
        })?;

        let filter = source.map(|s| json!({"source": s}));
        let result = self.query_index(vector, limit, None, filter).await?;

        Ok(result
            .matches
            .into_iter()
            .map(|m| RetrievedPassage {
                text: m.metadata.text,
                source: m.metadata.source,
                page: m.metadata.page,
                chunk_id: m.metadata.chunk_id,
            })
            .collect())
    }

    async fn similar_questions(&self, query: &str, k: usize) -> Result<Vec<String>, ApiError> {
        let vectors = self.embed(&[query.to_string()]).await?;
        let vector = vectors.first().ok_or_else(|| {
            ApiError::RetrievalError("embedding response was empty".to_string())
        })?;

        let result = self
            .query_index(vector, k, Some(&self.faq_namespace), None)
            .await?;

        Ok(result.matches.into_iter().map(|m| m.metadata.text).collect())
    }

    async fn add_questions(&self, questions: &[String]) -> Result<(), ApiError> {
        if questions.is_empty() {
            return Ok(());
        }

        let vectors = self.embed(questions).await?;
        let metadata: Vec<_> = questions.iter().map(|q| json!({"text": q})).collect();

        let response = self
            .client
            .post(format!("{}/index/add", self.vector_service_url))
            .json(&json!({
                "vectors": vectors,
                "metadata": metadata,
                "namespace": self.faq_namespace,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::RetrievalError(format!(
                "index add failed with {}: {}",
                status, body
            )));
        }

        Ok(())
    }
}
