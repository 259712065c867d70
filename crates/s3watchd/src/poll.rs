//! The receive loop.
//!
//! Every tick of the [`PollSchedule`] asks the queue for at most one item
//! without waiting. Each item is acknowledged according to the configured
//! [`DeletePolicy`] and handed to an [`ItemDispatcher`]. Only a failing receive
//! call ends the loop with an error; shutdown ends it cleanly.

use std::time::Duration;

use s3watch_config::DeletePolicy;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::dispatch::{DispatchOutcome, ItemDispatcher};
use crate::queue::{Queue, QueueMessage, ReceiveRequest, TransportError};
use crate::shutdown::ShutdownNotice;

const POLL_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::poll");

/// Fixed-period tick source. Each call to [`PollSchedule::ticks`] starts a
/// fresh sequence whose first tick lands one period later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    period: Duration,
}

impl PollSchedule {
    /// Creates a schedule ticking every `period`.
    #[must_use]
    pub const fn new(period: Duration) -> Self {
        Self { period }
    }

    /// Tick period.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Starts a tick sequence. Must be called from within a Tokio runtime.
    #[must_use]
    pub fn ticks(&self) -> Ticks {
        let mut interval = tokio::time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Ticks {
            interval,
            count: 0,
        }
    }
}

/// Running tick sequence.
#[derive(Debug)]
pub struct Ticks {
    interval: Interval,
    count: u64,
}

impl Ticks {
    /// Waits for the next tick and returns its one-based number.
    pub async fn next(&mut self) -> u64 {
        self.interval.tick().await;
        self.count += 1;
        self.count
    }
}

/// Counters accumulated by one run of the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    /// Ticks that issued a receive call.
    pub ticks: u64,
    /// Items received.
    pub received: usize,
    /// Items whose body could not be decoded.
    pub malformed: usize,
    /// Records handed to the handler.
    pub records: usize,
    /// Handler runs that failed.
    pub handler_failures: usize,
    /// Records skipped because shutdown was requested mid-item.
    pub dropped_records: usize,
    /// Items that could not be deleted from the queue.
    pub delete_failures: usize,
    /// Signal that stopped the loop.
    pub stopped_by: i32,
}

impl PollStats {
    fn absorb(&mut self, outcome: DispatchOutcome) {
        match outcome {
            DispatchOutcome::Malformed => self.malformed += 1,
            DispatchOutcome::Dispatched {
                records,
                handler_failures,
                dropped,
            } => {
                self.records += records;
                self.handler_failures += handler_failures;
                self.dropped_records += dropped;
            }
        }
    }
}

/// Poll loop bound to a dispatcher.
#[derive(Debug)]
pub struct PollLoop<D> {
    schedule: PollSchedule,
    policy: DeletePolicy,
    dispatcher: D,
}

impl<D> PollLoop<D>
where
    D: ItemDispatcher,
{
    /// Creates a loop.
    #[must_use]
    pub const fn new(schedule: PollSchedule, policy: DeletePolicy, dispatcher: D) -> Self {
        Self {
            schedule,
            policy,
            dispatcher,
        }
    }

    /// Polls `queue` until `shutdown` fires.
    ///
    /// Shutdown is checked while waiting for each tick; an item already
    /// received is still acknowledged and dispatched, and the dispatcher
    /// drops whatever records remain.
    ///
    /// # Errors
    ///
    /// Returns the [`TransportError`] of the first failed receive call.
    pub async fn run(
        &self,
        queue: &Queue,
        mut shutdown: ShutdownNotice,
    ) -> Result<PollStats, TransportError> {
        let mut ticks = self.schedule.ticks();
        let mut stats = PollStats::default();
        debug!(
            target: POLL_TARGET,
            queue = queue.name(),
            period = ?self.schedule.period(),
            policy = %self.policy,
            "poll loop running"
        );

        loop {
            let tick = tokio::select! {
                biased;
                signal = shutdown.requested() => {
                    stats.stopped_by = signal;
                    info!(
                        target: POLL_TARGET,
                        signal,
                        ticks = stats.ticks,
                        received = stats.received,
                        "poll loop stopped"
                    );
                    return Ok(stats);
                }
                tick = ticks.next() => tick,
            };
            stats.ticks = tick;

            let messages = queue.receive(ReceiveRequest::SINGLE_NON_BLOCKING).await?;
            for message in &messages {
                stats.received += 1;
                if self.policy == DeletePolicy::BeforeDispatch {
                    acknowledge(queue, message, &mut stats).await;
                }
                let outcome = self.dispatcher.dispatch(message).await;
                stats.absorb(outcome);
                if self.policy == DeletePolicy::AfterDispatch {
                    acknowledge(queue, message, &mut stats).await;
                }
            }
        }
    }
}

async fn acknowledge(queue: &Queue, message: &QueueMessage, stats: &mut PollStats) {
    let Some(receipt) = message.receipt_handle.as_deref() else {
        stats.delete_failures += 1;
        warn!(
            target: POLL_TARGET,
            message_id = message.message_id.as_deref(),
            "queue item carries no receipt handle; it cannot be deleted"
        );
        return;
    };
    if let Err(error) = queue.delete_message(receipt).await {
        stats.delete_failures += 1;
        warn!(
            target: POLL_TARGET,
            message_id = message.message_id.as_deref(),
            error = %error,
            "failed to delete queue item"
        );
    }
}
