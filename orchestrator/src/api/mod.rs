use std::sync::Arc;

use warp::{Filter, Rejection, Reply};

use crate::db::FaqStore;
use crate::index::SemanticIndex;
use crate::redis_client::RedisClient;
use crate::workflow::LegalAssistant;

mod chat;
mod conversations;
mod faqs;
mod suggestions;

pub fn routes(
    assistant: Arc<LegalAssistant>,
    faq_store: FaqStore,
    redis_client: RedisClient,
    index: Arc<dyn SemanticIndex>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let api = warp::path("api").and(warp::path("v1"));

    let chat_route = api
        .and(warp::path("chat"))
        .and(warp::post())
        .and(warp::body::json())
        .and(with_assistant(assistant))
        .and_then(chat::handle_chat);

    let end_route = api
        .and(warp::path("conversations"))
        .and(warp::path("end"))
        .and(warp::post())
        .and(warp::body::json())
        .and(with_redis(redis_client.clone()))
        .and_then(conversations::handle_end);

    let faqs_route = api
        .and(warp::path("faqs"))
        .and(warp::get())
        .and(with_faq_store(faq_store))
        .and_then(faqs::handle_get_faqs);

    let suggestions_route = api
        .and(warp::path("suggestions"))
        .and(warp::get())
        .and(warp::query())
        .and(with_index(index))
        .and(with_redis(redis_client))
        .and_then(suggestions::handle_get_suggestions);

    chat_route
        .or(end_route)
        .or(faqs_route)
        .or(suggestions_route)
}

fn with_assistant(
    assistant: Arc<LegalAssistant>,
) -> impl Filter<Extract = (Arc<LegalAssistant>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || assistant.clone())
}

fn with_faq_store(
    faq_store: FaqStore,
) -> impl Filter<Extract = (FaqStore,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || faq_store.clone())
}

fn with_redis(
    redis_client: RedisClient,
) -> impl Filter<Extract = (RedisClient,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || redis_client.clone())
}

fn with_index(
    index: Arc<dyn SemanticIndex>,
) -> impl Filter<Extract = (Arc<dyn SemanticIndex>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || index.clone())
}
