//! [`ItemDispatcher`] double that logs each item into a [`CallLog`].

use async_trait::async_trait;

use crate::dispatch::{DispatchOutcome, ItemDispatcher};
use crate::queue::QueueMessage;
use crate::shutdown::ShutdownTrigger;

use super::backend::{BackendCall, CallLog};

#[derive(Debug)]
pub struct RecordingDispatcher {
    log: CallLog,
    trigger: Option<(ShutdownTrigger, i32)>,
}

impl RecordingDispatcher {
    pub const fn new(log: CallLog) -> Self {
        Self { log, trigger: None }
    }

    /// Requests shutdown with `signal` from inside every dispatch.
    pub fn triggering(mut self, trigger: ShutdownTrigger, signal: i32) -> Self {
        self.trigger = Some((trigger, signal));
        self
    }
}

#[async_trait]
impl ItemDispatcher for RecordingDispatcher {
    async fn dispatch(&self, message: &QueueMessage) -> DispatchOutcome {
        self.log.record(BackendCall::Dispatch {
            message_id: message.message_id.clone().unwrap_or_default(),
        });
        if let Some((trigger, signal)) = &self.trigger {
            trigger.trigger(*signal);
        }
        DispatchOutcome::Dispatched {
            records: 1,
            handler_failures: 0,
            dropped: 0,
        }
    }
}
