use thiserror::Error;
use warp::{reject::Reject, Rejection, Reply};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Inference error: {0}")]
    InferenceError(String),

    #[error("Malformed model output: {0}")]
    MalformedModelOutput(String),

    #[error("Retrieval error: {0}")]
    RetrievalError(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl Reject for ApiError {}

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Rejection> {
    if let Some(api_err) = err.find::<ApiError>() {
        let (code, message) = match api_err {
            ApiError::BadRequest(_) => (400, "Bad request"),
            ApiError::InferenceError(_) | ApiError::MalformedModelOutput(_) => {
                (502, "Inference service failure")
            }
            ApiError::RetrievalError(_) => (502, "Retrieval service failure"),
            _ => (500, "Internal server error"),
        };

        let json = warp::reply::json(&serde_json::json!({
            "error": message,
            "details": api_err.to_string(),
        }));

        Ok(warp::reply::with_status(
            json,
            warp::http::StatusCode::from_u16(code).unwrap(),
        ))
    } else {
        Err(err)
    }
}
