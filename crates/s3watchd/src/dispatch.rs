//! Decoding received items and fanning their records out to the handler.

use async_trait::async_trait;
use s3watch_events::{ChangeRecord, decode};
use tracing::{debug, info, warn};

use crate::handler::HandlerInvoker;
use crate::queue::QueueMessage;
use crate::shutdown::ShutdownNotice;

const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Result of dispatching one queue item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The body could not be decoded; no record was forwarded.
    Malformed,
    /// The body decoded into records.
    Dispatched {
        /// Records observed and handed to the handler.
        records: usize,
        /// Handler runs that failed.
        handler_failures: usize,
        /// Records skipped because shutdown was requested.
        dropped: usize,
    },
}

/// Consumer of received queue items.
#[async_trait]
pub trait ItemDispatcher: Send + Sync {
    /// Processes one item. Failures are reported through the outcome and
    /// never stop the poll loop.
    async fn dispatch(&self, message: &QueueMessage) -> DispatchOutcome;
}

/// Decodes items into change records and runs the handler once per record.
#[derive(Debug, Clone)]
pub struct RecordDispatcher {
    invoker: Option<HandlerInvoker>,
    shutdown: ShutdownNotice,
}

impl RecordDispatcher {
    /// Creates a dispatcher. Without an invoker, records are only logged.
    #[must_use]
    pub const fn new(invoker: Option<HandlerInvoker>, shutdown: ShutdownNotice) -> Self {
        Self { invoker, shutdown }
    }
}

#[async_trait]
impl ItemDispatcher for RecordDispatcher {
    async fn dispatch(&self, message: &QueueMessage) -> DispatchOutcome {
        let records = match decode(message.body.as_bytes()) {
            Ok(records) => records,
            Err(error) => {
                warn!(
                    target: DISPATCH_TARGET,
                    message_id = message.message_id.as_deref(),
                    error = %error,
                    "discarding queue item that could not be decoded"
                );
                return DispatchOutcome::Malformed;
            }
        };

        let total = records.len();
        let mut handler_failures = 0;
        for (index, record) in records.iter().enumerate() {
            if let Some(signal) = self.shutdown.signal() {
                let dropped = total - index;
                warn!(
                    target: DISPATCH_TARGET,
                    message_id = message.message_id.as_deref(),
                    signal,
                    dropped,
                    "shutdown requested; dropping remaining records"
                );
                return DispatchOutcome::Dispatched {
                    records: index,
                    handler_failures,
                    dropped,
                };
            }

            observe(record);
            let Some(invoker) = &self.invoker else {
                continue;
            };
            if let Err(error) = invoker.invoke(self.shutdown.clone()).await {
                handler_failures += 1;
                warn!(
                    target: DISPATCH_TARGET,
                    key = record.object_key(),
                    error = %error,
                    "handler failed"
                );
            }
        }

        DispatchOutcome::Dispatched {
            records: total,
            handler_failures,
            dropped: 0,
        }
    }
}

fn observe(record: &ChangeRecord) {
    info!(
        target: DISPATCH_TARGET,
        bucket = record.bucket_name(),
        key = record.object_key(),
        size = record.object_size(),
        event = %record.event_name,
        event_time = %record.event_time,
        sequencer = %record.s3.object.sequencer,
        "change record received"
    );
    debug!(
        target: DISPATCH_TARGET,
        record = ?record,
        "change record contents"
    );
}
