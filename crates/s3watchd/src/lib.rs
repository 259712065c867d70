//! Runtime for the `s3-watch` daemon.
//!
//! The daemon watches an S3 bucket by creating a queue scoped to one run,
//! subscribing it to the SNS topic that relays the bucket's notifications,
//! and polling it on a fixed interval. Every change record carried by a
//! received item is handed to an operator-supplied handler executable. On
//! SIGINT, SIGTERM, SIGQUIT or SIGHUP the signal is forwarded to the running
//! handler, polling stops, and the queue is deleted before the process exits.
//!
//! Delivery is at most once by default: each item leaves the queue before its
//! records are dispatched. See [`s3watch_config::DeletePolicy`] for the
//! alternative ordering.
//!
//! Cloud access sits behind the [`QueueBackend`] and [`TopicLookup`] traits so
//! the lifecycle can be exercised without AWS.

mod dispatch;
mod handler;
mod health;
mod poll;
mod process;
pub mod queue;
mod shutdown;
mod telemetry;
mod topic;

pub use dispatch::{DispatchOutcome, ItemDispatcher, RecordDispatcher};
pub use handler::{HandlerError, HandlerInvoker};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use poll::{PollLoop, PollSchedule, PollStats, Ticks};
pub use process::{LaunchError, Services, Termination, run_daemon, run_daemon_with};
pub use queue::{Queue, QueueBackend, QueueMessage};
pub use shutdown::{
    SHUTDOWN_SIGNALS, ShutdownError, ShutdownNotice, ShutdownState, ShutdownTrigger,
    SignalListener, shutdown_channel,
};
pub use telemetry::{TelemetryError, TelemetryHandle, initialise as initialise_telemetry};
pub use topic::{S3TopicLookup, TopicError, TopicLookup, resolve_topic};
