//! Scripted [`QueueBackend`] that records every call.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use camino::Utf8PathBuf;

use crate::queue::{BoxError, Queue, QueueBackend, QueueMessage, ReceiveRequest};
use crate::shutdown::ShutdownTrigger;

use super::notifications::notification_message_with_id;

/// Topic used by tests that provision a queue directly.
pub const TEST_TOPIC: &str = "arn:aws:sns:us-east-1:123456789012:uploads";

const QUEUE_URL_BASE: &str = "https://sqs.us-east-1.amazonaws.com/123456789012";

/// URL the stub assigns to a queue called `name`.
pub fn queue_url_for(name: &str) -> String {
    format!("{QUEUE_URL_BASE}/{name}")
}

/// Calls observed by the stub backend and the recording dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    CreateQueue { name: String },
    Subscribe { topic_arn: String, queue_arn: String },
    Receive { call: u64 },
    DeleteMessage { receipt: String },
    DeleteQueue { url: String },
    Dispatch { message_id: String },
    /// Whether the witness file existed when a delete request arrived.
    WitnessChecked { present: bool },
}

/// Shared, ordered call log.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<BackendCall>>>,
}

impl CallLog {
    pub fn record(&self, call: BackendCall) {
        self.calls
            .lock()
            .expect("call log mutex poisoned")
            .push(call);
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().expect("call log mutex poisoned").clone()
    }

    /// Calls made once the queue was provisioned.
    pub fn after_provisioning(&self) -> Vec<BackendCall> {
        self.calls()
            .into_iter()
            .filter(|call| {
                !matches!(
                    call,
                    BackendCall::CreateQueue { .. } | BackendCall::Subscribe { .. }
                )
            })
            .collect()
    }

    pub fn created_queue(&self) -> Option<String> {
        self.calls().into_iter().find_map(|call| match call {
            BackendCall::CreateQueue { name } => Some(name),
            _ => None,
        })
    }

    pub fn queue_deletions(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, BackendCall::DeleteQueue { .. }))
            .count()
    }
}

/// Backend whose receive results are scripted per call number.
#[derive(Debug)]
pub struct StubQueueBackend {
    log: CallLog,
    receives: AtomicU64,
    deliveries: HashMap<u64, QueueMessage>,
    triggers: HashMap<u64, (ShutdownTrigger, i32)>,
    receive_failure: Option<u64>,
    witness: Option<Utf8PathBuf>,
    subscribe_fails: bool,
    queue_delete_fails: bool,
    message_delete_fails: bool,
}

impl StubQueueBackend {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            receives: AtomicU64::new(0),
            deliveries: HashMap::new(),
            triggers: HashMap::new(),
            receive_failure: None,
            witness: None,
            subscribe_fails: false,
            queue_delete_fails: false,
            message_delete_fails: false,
        }
    }

    /// Returns a single-record notification with id `message_id` from
    /// receive call `call`.
    pub fn deliver_on(self, call: u64, message_id: &str) -> Self {
        self.deliver_message_on(call, notification_message_with_id(message_id))
    }

    pub fn deliver_message_on(mut self, call: u64, message: QueueMessage) -> Self {
        self.deliveries.insert(call, message);
        self
    }

    /// Requests shutdown while serving receive call `call`.
    pub fn trigger_on(mut self, call: u64, trigger: ShutdownTrigger, signal: i32) -> Self {
        self.triggers.insert(call, (trigger, signal));
        self
    }

    pub const fn fail_receive_on(mut self, call: u64) -> Self {
        self.receive_failure = Some(call);
        self
    }

    /// Records whether `path` exists each time a message is deleted.
    pub fn witnessing(mut self, path: Utf8PathBuf) -> Self {
        self.witness = Some(path);
        self
    }

    pub const fn failing_subscribe(mut self) -> Self {
        self.subscribe_fails = true;
        self
    }

    pub const fn failing_queue_delete(mut self) -> Self {
        self.queue_delete_fails = true;
        self
    }

    pub const fn failing_message_delete(mut self) -> Self {
        self.message_delete_fails = true;
        self
    }
}

#[async_trait]
impl QueueBackend for StubQueueBackend {
    async fn create_queue(&self, name: &str, _policy: &str) -> Result<Option<String>, BoxError> {
        self.log.record(BackendCall::CreateQueue {
            name: name.to_owned(),
        });
        Ok(Some(queue_url_for(name)))
    }

    async fn subscribe(&self, topic_arn: &str, queue_arn: &str) -> Result<(), BoxError> {
        self.log.record(BackendCall::Subscribe {
            topic_arn: topic_arn.to_owned(),
            queue_arn: queue_arn.to_owned(),
        });
        if self.subscribe_fails {
            return Err(Box::from("topic rejected the subscription"));
        }
        Ok(())
    }

    async fn receive(
        &self,
        _queue_url: &str,
        request: ReceiveRequest,
    ) -> Result<Vec<QueueMessage>, BoxError> {
        assert_eq!(request, ReceiveRequest::SINGLE_NON_BLOCKING);
        let call = self.receives.fetch_add(1, Ordering::SeqCst) + 1;
        self.log.record(BackendCall::Receive { call });
        if let Some((trigger, signal)) = self.triggers.get(&call) {
            trigger.trigger(*signal);
        }
        if self.receive_failure == Some(call) {
            return Err(Box::from("connection reset"));
        }
        Ok(self.deliveries.get(&call).cloned().into_iter().collect())
    }

    async fn delete_message(&self, _queue_url: &str, receipt_handle: &str) -> Result<(), BoxError> {
        if let Some(witness) = &self.witness {
            self.log.record(BackendCall::WitnessChecked {
                present: witness.exists(),
            });
        }
        self.log.record(BackendCall::DeleteMessage {
            receipt: receipt_handle.to_owned(),
        });
        if self.message_delete_fails {
            return Err(Box::from("receipt handle expired"));
        }
        Ok(())
    }

    async fn delete_queue(&self, queue_url: &str) -> Result<(), BoxError> {
        self.log.record(BackendCall::DeleteQueue {
            url: queue_url.to_owned(),
        });
        if self.queue_delete_fails {
            return Err(Box::from("queue deletion throttled"));
        }
        Ok(())
    }
}

/// Provisions a queue named `s3-watch-test` on `backend`.
pub async fn provision(backend: Arc<StubQueueBackend>) -> Queue {
    Queue::create(backend, "s3-watch-test", TEST_TOPIC)
        .await
        .expect("stub queue should provision")
}
