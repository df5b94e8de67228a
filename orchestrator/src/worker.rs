//! Background content-generation worker.
//!
//! Runs outside the turn-processing path: ended conversations are enqueued
//! as jobs, and this worker drains the queue, extracting FAQs into the
//! database and suggested follow-up questions into the index's FAQ
//! namespace. A failed job is logged and dropped; the worker keeps going.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::agents::faq::FaqGenerator;
use crate::agents::questions::QuestionGenerator;
use crate::db::FaqStore;
use crate::error::ApiError;
use crate::index::SemanticIndex;
use crate::models::ContentJob;
use crate::redis_client::{RedisClient, CONTENT_QUEUE, FAQS_UPDATED_CHANNEL};

const POP_TIMEOUT_SECS: usize = 5;

pub struct ContentWorker {
    redis: RedisClient,
    faq_store: FaqStore,
    faq_generator: FaqGenerator,
    question_generator: QuestionGenerator,
    index: Arc<dyn SemanticIndex>,
}

impl ContentWorker {
    pub fn new(
        redis: RedisClient,
        faq_store: FaqStore,
        faq_generator: FaqGenerator,
        question_generator: QuestionGenerator,
        index: Arc<dyn SemanticIndex>,
    ) -> Self {
        Self {
            redis,
            faq_store,
            faq_generator,
            question_generator,
            index,
        }
    }

    pub async fn run(mut self) {
        info!("Content-generation worker started");
        loop {
            match self
                .redis
                .pop_job::<ContentJob>(CONTENT_QUEUE, POP_TIMEOUT_SECS)
                .await
            {
                Ok(Some(job)) => self.process(job).await,
                Ok(None) => {}
                Err(e) => {
                    error!("Failed to read content queue: {}", e);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }

    /// FAQ and question generation are independent; a failure in one does
    /// not block the other.
    async fn process(&mut self, job: ContentJob) {
        info!(
            messages = job.conversation.len(),
            "Processing content-generation job"
        );

        if let Err(e) = self.store_faqs(&job).await {
            error!("FAQ generation failed: {}", e);
        }
        if let Err(e) = self.store_questions(&job).await {
            error!("Suggested-question generation failed: {}", e);
        }
    }

    async fn store_faqs(&mut self, job: &ContentJob) -> Result<(), ApiError> {
        let faqs = self.faq_generator.generate(&job.conversation).await?;
        if faqs.is_empty() {
            return Ok(());
        }

        self.faq_store.insert_faqs(&faqs).await?;
        self.redis
            .publish(FAQS_UPDATED_CHANNEL, &faqs.len().to_string())
            .await?;
        info!(count = faqs.len(), "Stored generated FAQs");
        Ok(())
    }

    async fn store_questions(&mut self, job: &ContentJob) -> Result<(), ApiError> {
        let questions = self.question_generator.generate(&job.conversation).await?;
        if questions.is_empty() {
            return Ok(());
        }

        self.index.add_questions(&questions).await?;
        info!(count = questions.len(), "Stored suggested questions");
        Ok(())
    }
}
