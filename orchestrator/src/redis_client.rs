use anyhow::Result;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Queue drained by the background content-generation worker.
pub const CONTENT_QUEUE: &str = "jobs:content-generation";

/// Channel notified after the worker stores new FAQs.
pub const FAQS_UPDATED_CHANNEL: &str = "content:faqs:updated";

#[derive(Clone)]
pub struct RedisClient {
    connection: ConnectionManager,
}

impl RedisClient {
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let connection = client.get_tokio_connection_manager().await?;
        Ok(Self { connection })
    }

    pub async fn publish(&mut self, channel: &str, message: &str) -> Result<(), ApiError> {
        self.connection.publish::<_, _, ()>(channel, message).await?;
        Ok(())
    }

    /// Enqueue a job for the content worker.
    pub async fn push_job<T: Serialize>(&mut self, queue: &str, job: &T) -> Result<(), ApiError> {
        let json = serde_json::to_string(job)?;
        self.connection.lpush::<_, _, ()>(queue, json).await?;
        Ok(())
    }

    /// Blocking pop with a timeout; `None` means the queue stayed empty.
    pub async fn pop_job<T: for<'de> Deserialize<'de>>(
        &mut self,
        queue: &str,
        timeout_secs: usize,
    ) -> Result<Option<T>, ApiError> {
        let result: Option<(String, String)> = redis::cmd("BRPOP")
            .arg(queue)
            .arg(timeout_secs)
            .query_async(&mut self.connection)
            .await?;
        match result {
            Some((_, json)) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub async fn set_with_expiry<T: Serialize>(
        &mut self,
        key: &str,
        value: &T,
        expiry_secs: u64,
    ) -> Result<(), ApiError> {
        let json = serde_json::to_string(value)?;
        self.connection.set_ex::<_, _, ()>(key, json, expiry_secs).await?;
        Ok(())
    }

    pub async fn get<T: for<'de> Deserialize<'de>>(
        &mut self,
        key: &str,
    ) -> Result<Option<T>, ApiError> {
        let result: Option<String> = self.connection.get(key).await?;
        match result {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}
