//! The messaging capability a benchmark drives
//!
//! A backend binds [`MessagingClient`] to one provider queue. The queue is
//! resolved when the backend is constructed, so a missing queue fails with
//! [`ClientError::QueueNotFound`] before any timing starts.
//!
//! Acknowledging twice is a provider-specific variation point: the in-memory
//! backend rejects a re-used handle, SQS accepts a repeated delete of a still
//! valid receipt handle. Callers must not rely on either behavior.

use crate::error::ClientError;
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::future::Future;
use std::time::Duration;

/// An immutable message payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    payload: Vec<u8>,
}

impl Message {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Random ASCII alphanumeric payload of exactly `size` bytes
    pub fn random(size: usize) -> Self {
        let payload = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(size)
            .collect();
        Self { payload }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Payload as text, replacing invalid UTF-8 sequences
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// Provider acknowledgment of a successful publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub message_id: String,
}

/// Token required to acknowledge one pulled message
///
/// Not `Clone`: acknowledging consumes the handle.
#[derive(Debug, PartialEq, Eq)]
pub struct AckHandle(String);

impl AckHandle {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A received message and the handle needed to acknowledge it
#[derive(Debug)]
pub struct PulledMessage {
    pub message_id: String,
    pub message: Message,
    pub handle: AckHandle,
}

/// Publish / pull / acknowledge against a single queue
///
/// None of the operations retry; retry policy belongs to the caller.
pub trait MessagingClient: Send + Sync {
    /// Publish one message
    fn publish(
        &self,
        message: &Message,
    ) -> impl Future<Output = Result<PublishReceipt, ClientError>> + Send;

    /// Wait up to `timeout` for one message; `Ok(None)` when nothing arrived
    fn pull(
        &self,
        timeout: Duration,
    ) -> impl Future<Output = Result<Option<PulledMessage>, ClientError>> + Send;

    /// Acknowledge (delete) a pulled message
    fn acknowledge(&self, handle: AckHandle) -> impl Future<Output = Result<(), ClientError>> + Send;
}
