use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;
use warp::{Rejection, Reply};

use crate::error::ApiError;
use crate::models::{ChatTurnRequest, ChatTurnResponse, Role};
use crate::workflow::LegalAssistant;

pub async fn handle_chat(
    request: ChatTurnRequest,
    assistant: Arc<LegalAssistant>,
) -> Result<impl Reply, Rejection> {
    let request_id = Uuid::new_v4();
    info!(
        "Processing chat turn [{}] with {} messages",
        request_id,
        request.messages.len()
    );

    let ends_with_user_turn = request
        .messages
        .last()
        .map(|m| m.role == Role::User)
        .unwrap_or(false);
    if !ends_with_user_turn {
        return Err(warp::reject::custom(ApiError::BadRequest(
            "conversation must end with a user message".to_string(),
        )));
    }

    // On failure nothing has been appended anywhere; the session layer's
    // transcript still ends at the user turn and can simply be resent.
    let message = assistant
        .run_turn(request.messages, request.is_professional)
        .await
        .map_err(|e| {
            error!("Chat turn [{}] failed: {}", request_id, e);
            warp::reject::custom(e)
        })?;

    Ok(warp::reply::json(&ChatTurnResponse {
        request_id,
        message,
    }))
}
