use std::sync::Arc;

use serde::Deserialize;
use tracing::{error, info};
use warp::{Rejection, Reply};

use crate::index::SemanticIndex;
use crate::redis_client::RedisClient;

const CACHE_TTL_SECS: u64 = 300;

#[derive(Debug, Deserialize)]
pub struct SuggestionParams {
    pub query: String,
    pub k: Option<usize>,
}

/// Related questions for the sidebar, fetched from the FAQ namespace of the
/// semantic index. Cached briefly; repeated queries are common right after
/// an answer renders.
pub async fn handle_get_suggestions(
    params: SuggestionParams,
    index: Arc<dyn SemanticIndex>,
    mut redis_client: RedisClient,
) -> Result<impl Reply, Rejection> {
    let k = params.k.unwrap_or(3);
    let cache_key = format!("suggestions:{}:{}", k, params.query);

    if let Ok(Some(cached)) = redis_client.get::<Vec<String>>(&cache_key).await {
        return Ok(warp::reply::json(&cached));
    }

    info!(query = %params.query, k, "Fetching suggested questions");
    let questions = index
        .similar_questions(&params.query, k)
        .await
        .map_err(warp::reject::custom)?;

    if let Err(e) = redis_client
        .set_with_expiry(&cache_key, &questions, CACHE_TTL_SECS)
        .await
    {
        error!("Failed to cache suggestions: {}", e);
    }

    Ok(warp::reply::json(&questions))
}
