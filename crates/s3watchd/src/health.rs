//! Structured health reporting for daemon lifecycle events.

use std::sync::Arc;
use std::time::Duration;

use s3watch_config::DeletePolicy;

use crate::process::LaunchError;
use crate::queue::Queue;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked once the topic to subscribe to is known.
    fn topic_resolved(&self, bucket: &str, topic: &str);

    /// Invoked after the run queue exists and is subscribed.
    fn queue_created(&self, queue: &Queue);

    /// Invoked before the first poll tick.
    fn polling_started(&self, interval: Duration, policy: DeletePolicy);

    /// Invoked when a shutdown signal reaches the launcher.
    fn shutdown_requested(&self, signal: i32);

    /// Invoked after the run queue has been deleted.
    fn queue_deleted(&self, name: &str);

    /// Invoked when the daemon stops on a fatal error.
    fn launch_failed(&self, error: &LaunchError);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn topic_resolved(&self, bucket: &str, topic: &str) {
        (**self).topic_resolved(bucket, topic);
    }

    fn queue_created(&self, queue: &Queue) {
        (**self).queue_created(queue);
    }

    fn polling_started(&self, interval: Duration, policy: DeletePolicy) {
        (**self).polling_started(interval, policy);
    }

    fn shutdown_requested(&self, signal: i32) {
        (**self).shutdown_requested(signal);
    }

    fn queue_deleted(&self, name: &str) {
        (**self).queue_deleted(name);
    }

    fn launch_failed(&self, error: &LaunchError) {
        (**self).launch_failed(error);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn topic_resolved(&self, bucket: &str, topic: &str) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "topic_resolved",
            bucket,
            topic,
            "watching bucket through topic"
        );
    }

    fn queue_created(&self, queue: &Queue) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "queue_created",
            queue = queue.name(),
            url = queue.url(),
            arn = queue.arn(),
            "run queue ready"
        );
    }

    fn polling_started(&self, interval: Duration, policy: DeletePolicy) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "polling_started",
            ?interval,
            delete_policy = %policy,
            "polling for notifications"
        );
    }

    fn shutdown_requested(&self, signal: i32) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "shutdown_requested",
            signal,
            "shutting down"
        );
    }

    fn queue_deleted(&self, name: &str) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "queue_deleted",
            queue = name,
            "run queue removed"
        );
    }

    fn launch_failed(&self, error: &LaunchError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "launch_failed",
            error = %error,
            exit_code = error.exit_code(),
            "daemon stopped on a fatal error"
        );
    }
}
