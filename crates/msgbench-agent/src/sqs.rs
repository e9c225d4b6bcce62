//! Amazon SQS backend

use crate::client::{AckHandle, Message, MessagingClient, PublishReceipt, PulledMessage};
use crate::error::ClientError;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sqs::Client;
use aws_sdk_sqs::error::ProvideErrorMetadata;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Longest long-poll SQS accepts for `ReceiveMessage`
pub const MAX_WAIT_TIME_SECS: u64 = 20;

/// Provider error reduced to its code and message
#[derive(Debug, Error)]
#[error("SQS error ({}): {message}", code.as_deref().unwrap_or("unknown"))]
pub struct SqsError {
    pub code: Option<String>,
    pub message: String,
}

impl SqsError {
    fn from_meta(err: &impl ProvideErrorMetadata) -> Self {
        Self {
            code: err.code().map(str::to_string),
            message: err.message().unwrap_or("Unknown error").to_string(),
        }
    }
}

/// Long-poll wait for a pull timeout, clamped to what SQS allows
pub fn wait_time_seconds(timeout: Duration) -> i32 {
    // Bounded by MAX_WAIT_TIME_SECS, so the cast cannot truncate
    timeout.as_secs().min(MAX_WAIT_TIME_SECS) as i32
}

/// Client bound to one SQS queue
#[derive(Debug, Clone)]
pub struct SqsClient {
    client: Client,
    queue_url: String,
}

impl SqsClient {
    /// Resolve `queue_name` in `region` using the default credential chain
    pub async fn connect(region: &str, queue_name: &str) -> Result<Self, ClientError> {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        let client = Client::new(&config);

        let output = client
            .get_queue_url()
            .queue_name(queue_name)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .is_some_and(|se| se.is_queue_does_not_exist())
                {
                    ClientError::QueueNotFound {
                        region: region.to_string(),
                        queue_name: queue_name.to_string(),
                    }
                } else {
                    ClientError::Resolve {
                        queue_name: queue_name.to_string(),
                        source: Box::new(SqsError::from_meta(&e)),
                    }
                }
            })?;

        let queue_url = output
            .queue_url()
            .ok_or_else(|| ClientError::QueueNotFound {
                region: region.to_string(),
                queue_name: queue_name.to_string(),
            })?
            .to_string();

        info!(region, queue_name, queue_url = %queue_url, "Resolved SQS queue");
        Ok(Self { client, queue_url })
    }

    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }
}

impl MessagingClient for SqsClient {
    async fn publish(&self, message: &Message) -> Result<PublishReceipt, ClientError> {
        let output = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(message.body_text())
            .send()
            .await
            .map_err(|e| ClientError::Publish(Box::new(SqsError::from_meta(&e))))?;

        Ok(PublishReceipt {
            message_id: output.message_id().unwrap_or_default().to_string(),
        })
    }

    async fn pull(&self, timeout: Duration) -> Result<Option<PulledMessage>, ClientError> {
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(1)
            .wait_time_seconds(wait_time_seconds(timeout))
            .send()
            .await
            .map_err(|e| ClientError::Pull(Box::new(SqsError::from_meta(&e))))?;

        let Some(received) = output.messages().first() else {
            return Ok(None);
        };

        let handle = received.receipt_handle().ok_or_else(|| {
            ClientError::Pull("received message without a receipt handle".into())
        })?;
        let message_id = received.message_id().unwrap_or_default().to_string();
        debug!(message_id = %message_id, "Received SQS message");

        Ok(Some(PulledMessage {
            message_id,
            message: Message::new(received.body().unwrap_or_default()),
            handle: AckHandle::new(handle),
        }))
    }

    async fn acknowledge(&self, handle: AckHandle) -> Result<(), ClientError> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(handle.as_str())
            .send()
            .await
            .map_err(|e| ClientError::Acknowledge(Box::new(SqsError::from_meta(&e))))?;
        Ok(())
    }
}
