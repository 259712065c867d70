//! Test double for [`HealthReporter`] that records lifecycle events for
//! assertions.

use std::sync::Mutex;
use std::time::Duration;

use s3watch_config::DeletePolicy;

use crate::health::HealthReporter;
use crate::process::LaunchError;
use crate::queue::Queue;

/// Lifecycle events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    TopicResolved { topic: String },
    QueueCreated { name: String },
    PollingStarted { policy: DeletePolicy },
    ShutdownRequested { signal: i32 },
    QueueDeleted { name: String },
    LaunchFailed { message: String },
}

#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn topic_resolved(&self, _bucket: &str, topic: &str) {
        self.record(HealthEvent::TopicResolved {
            topic: topic.to_owned(),
        });
    }

    fn queue_created(&self, queue: &Queue) {
        self.record(HealthEvent::QueueCreated {
            name: queue.name().to_owned(),
        });
    }

    fn polling_started(&self, _interval: Duration, policy: DeletePolicy) {
        self.record(HealthEvent::PollingStarted { policy });
    }

    fn shutdown_requested(&self, signal: i32) {
        self.record(HealthEvent::ShutdownRequested { signal });
    }

    fn queue_deleted(&self, name: &str) {
        self.record(HealthEvent::QueueDeleted {
            name: name.to_owned(),
        });
    }

    fn launch_failed(&self, error: &LaunchError) {
        self.record(HealthEvent::LaunchFailed {
            message: error.to_string(),
        });
    }
}
