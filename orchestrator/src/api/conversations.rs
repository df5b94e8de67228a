use tracing::info;
use warp::http::StatusCode;
use warp::{Rejection, Reply};

use crate::models::{ContentJob, EndChatRequest};
use crate::redis_client::{RedisClient, CONTENT_QUEUE};

/// End of a conversation: hand the transcript to the content worker. The
/// generation itself happens off the request path.
pub async fn handle_end(
    request: EndChatRequest,
    mut redis_client: RedisClient,
) -> Result<impl Reply, Rejection> {
    if request.messages.len() < 2 {
        info!("Conversation too short for content generation, skipping");
        return Ok(warp::reply::with_status(
            warp::reply::json(&serde_json::json!({"status": "skipped"})),
            StatusCode::OK,
        ));
    }

    let job = ContentJob {
        conversation: request.messages,
    };
    redis_client
        .push_job(CONTENT_QUEUE, &job)
        .await
        .map_err(warp::reject::custom)?;

    info!(
        messages = job.conversation.len(),
        "Queued conversation for content generation"
    );

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({"status": "queued"})),
        StatusCode::ACCEPTED,
    ))
}
