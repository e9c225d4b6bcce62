//! Process-local queue backend
//!
//! Queues live in an [`InMemoryBroker`]; connecting to a queue the broker
//! does not know fails the same way a missing provider queue does. Pulled
//! messages stay in flight until acknowledged, and a receipt handle can be
//! acknowledged only once.

use crate::client::{AckHandle, Message, MessagingClient, PublishReceipt, PulledMessage};
use crate::error::ClientError;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::debug;

/// Registry of named in-memory queues
#[derive(Debug, Clone, Default)]
pub struct InMemoryBroker {
    queues: Arc<Mutex<HashMap<String, InMemoryQueue>>>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue, or return the existing one with that name
    pub fn create_queue(&self, queue_name: &str) -> InMemoryQueue {
        let mut queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
        queues
            .entry(queue_name.to_string())
            .or_insert_with(|| InMemoryQueue::new(queue_name))
            .clone()
    }

    /// Remove a queue; returns whether it existed
    pub fn delete_queue(&self, queue_name: &str) -> bool {
        let mut queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
        queues.remove(queue_name).is_some()
    }

    /// Resolve an existing queue
    pub fn connect(&self, region: &str, queue_name: &str) -> Result<InMemoryQueue, ClientError> {
        let queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
        queues
            .get(queue_name)
            .cloned()
            .ok_or_else(|| ClientError::QueueNotFound {
                region: region.to_string(),
                queue_name: queue_name.to_string(),
            })
    }
}

#[derive(Debug, Default)]
struct QueueState {
    ready: VecDeque<(String, Message)>,
    /// receipt handle -> message id
    in_flight: HashMap<String, String>,
    next_message: u64,
    next_receipt: u64,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<QueueState>,
    available: Notify,
}

/// Handle to one in-memory queue; clones share the queue
#[derive(Debug, Clone)]
pub struct InMemoryQueue {
    name: Arc<str>,
    shared: Arc<Shared>,
}

impl InMemoryQueue {
    fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            shared: Arc::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Messages waiting to be pulled
    pub fn ready_len(&self) -> usize {
        self.state().ready.len()
    }

    /// Messages pulled but not yet acknowledged
    pub fn in_flight_len(&self) -> usize {
        self.state().in_flight.len()
    }

    fn state(&self) -> MutexGuard<'_, QueueState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn try_pull(&self) -> Option<PulledMessage> {
        let mut state = self.state();
        let (message_id, message) = state.ready.pop_front()?;
        state.next_receipt += 1;
        let receipt = format!("{}-{}-r{}", self.name, message_id, state.next_receipt);
        state.in_flight.insert(receipt.clone(), message_id.clone());
        Some(PulledMessage {
            message_id,
            message,
            handle: AckHandle::new(receipt),
        })
    }
}

impl MessagingClient for InMemoryQueue {
    async fn publish(&self, message: &Message) -> Result<PublishReceipt, ClientError> {
        let message_id = {
            let mut state = self.state();
            state.next_message += 1;
            let message_id = format!("m{}", state.next_message);
            state.ready.push_back((message_id.clone(), message.clone()));
            message_id
        };
        self.shared.available.notify_one();
        Ok(PublishReceipt { message_id })
    }

    async fn pull(&self, timeout: Duration) -> Result<Option<PulledMessage>, ClientError> {
        // A timeout too large to represent waits without a deadline
        let deadline = tokio::time::Instant::now().checked_add(timeout);
        loop {
            if let Some(pulled) = self.try_pull() {
                return Ok(Some(pulled));
            }
            let notified = self.shared.available.notified();
            match deadline {
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, notified).await.is_err() {
                        debug!(queue = %self.name, ?timeout, "Pull timed out with no message");
                        return Ok(self.try_pull());
                    }
                }
                None => notified.await,
            }
        }
    }

    async fn acknowledge(&self, handle: AckHandle) -> Result<(), ClientError> {
        let removed = self.state().in_flight.remove(handle.as_str());
        match removed {
            Some(_) => Ok(()),
            None => Err(ClientError::Acknowledge(
                format!(
                    "receipt handle '{}' is unknown or already acknowledged",
                    handle.as_str()
                )
                .into(),
            )),
        }
    }
}
