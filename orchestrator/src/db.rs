use anyhow::Result;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

use crate::error::ApiError;
use crate::models::{Faq, FaqRecord};

pub type DbPool = Pool<Postgres>;

pub async fn create_pool(database_url: &str) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Persistent FAQ store. Written by the content worker outside the
/// turn-processing path; read by the FAQ listing endpoint.
#[derive(Clone)]
pub struct FaqStore {
    pool: DbPool,
}

impl FaqStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert generated FAQs. A repeated question bumps its frequency
    /// instead of creating a duplicate row.
    pub async fn insert_faqs(&self, faqs: &[Faq]) -> Result<(), ApiError> {
        for faq in faqs {
            sqlx::query(
                "INSERT INTO faqs (question, answer, category)
                 VALUES ($1, $2, $3)
                 ON CONFLICT (question)
                 DO UPDATE SET frequency = faqs.frequency + 1",
            )
            .bind(&faq.question)
            .bind(&faq.answer)
            .bind(&faq.category)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    pub async fn all_faqs(&self) -> Result<Vec<FaqRecord>, ApiError> {
        let records = sqlx::query_as::<_, FaqRecord>(
            "SELECT id, question, answer, category, frequency, date_created
             FROM faqs
             ORDER BY category, frequency DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
