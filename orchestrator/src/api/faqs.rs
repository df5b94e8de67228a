use tracing::{error, info};
use warp::{Rejection, Reply};

use crate::db::FaqStore;
use crate::models::FaqRecord;

pub async fn handle_get_faqs(faq_store: FaqStore) -> Result<impl Reply, Rejection> {
    info!("Fetching FAQs");

    match faq_store.all_faqs().await {
        Ok(faqs) => Ok(warp::reply::json(&faqs)),
        Err(e) => {
            error!("Failed to fetch FAQs: {}", e);
            Ok(warp::reply::json(&Vec::<FaqRecord>::new()))
        }
    }
}
