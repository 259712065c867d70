//! Lifecycle of the per-run receive queue.
//!
//! A [`Queue`] is created once at startup, bound to the SNS topic, read by the
//! poll loop, and deleted once at shutdown. All cloud calls go through the
//! [`QueueBackend`] trait; the production implementation is
//! [`AwsQueueBackend`].

mod arn;
mod aws;
mod policy;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

pub use self::arn::queue_arn_from_url;
pub use self::aws::AwsQueueBackend;
pub use self::policy::{SEND_MESSAGE_ACTION, access_policy};

pub(crate) const QUEUE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::queue");

/// Boxed error returned by backend implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Parameters for a single receive call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiveRequest {
    /// Upper bound on the number of items returned.
    pub max_messages: i32,
    /// Long-poll wait in seconds; zero returns immediately.
    pub wait_time_seconds: i32,
    /// Visibility hold in seconds applied to returned items.
    pub visibility_timeout: i32,
}

impl ReceiveRequest {
    /// One item at most, no waiting, no visibility hold.
    pub const SINGLE_NON_BLOCKING: Self = Self {
        max_messages: 1,
        wait_time_seconds: 0,
        visibility_timeout: 0,
    };
}

/// An item received from the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    /// Service-assigned identifier, when present.
    pub message_id: Option<String>,
    /// Handle required to delete the item.
    pub receipt_handle: Option<String>,
    /// Raw item body.
    pub body: String,
}

/// Cloud operations needed to run a queue.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueueBackend: Send + Sync {
    /// Creates a queue carrying `policy` and returns its URL.
    async fn create_queue(&self, name: &str, policy: &str) -> Result<Option<String>, BoxError>;

    /// Subscribes `queue_arn` to `topic_arn` as an SQS endpoint.
    async fn subscribe(&self, topic_arn: &str, queue_arn: &str) -> Result<(), BoxError>;

    /// Receives pending items.
    async fn receive(
        &self,
        queue_url: &str,
        request: ReceiveRequest,
    ) -> Result<Vec<QueueMessage>, BoxError>;

    /// Removes one item.
    async fn delete_message(&self, queue_url: &str, receipt_handle: &str) -> Result<(), BoxError>;

    /// Deletes the queue.
    async fn delete_queue(&self, queue_url: &str) -> Result<(), BoxError>;
}

/// Failures creating, binding, or deleting the queue. All are fatal.
#[derive(Debug, Error)]
pub enum ProvisioningError {
    /// `CreateQueue` failed.
    #[error("failed to create queue '{name}': {source}")]
    CreateQueue {
        /// Requested queue name.
        name: String,
        /// Backend error.
        #[source]
        source: BoxError,
    },
    /// `CreateQueue` succeeded without returning a URL.
    #[error("creating queue '{name}' returned no queue url")]
    MissingQueueUrl {
        /// Requested queue name.
        name: String,
    },
    /// Subscribing the queue to the topic failed.
    ///
    /// The queue at `queue_url` exists at this point and is owned by the
    /// caller.
    #[error("failed to subscribe queue '{queue_arn}' to topic '{topic_arn}': {source}")]
    Subscribe {
        /// Topic the subscription targeted.
        topic_arn: String,
        /// URL of the queue that was created.
        queue_url: String,
        /// Derived queue ARN.
        queue_arn: String,
        /// Backend error.
        #[source]
        source: BoxError,
    },
    /// `DeleteQueue` failed.
    #[error("failed to delete queue '{queue_url}': {source}")]
    DeleteQueue {
        /// URL of the queue that could not be deleted.
        queue_url: String,
        /// Backend error.
        #[source]
        source: BoxError,
    },
}

impl ProvisioningError {
    /// URL of a queue this failure left behind, if any.
    #[must_use]
    pub fn orphaned_queue_url(&self) -> Option<&str> {
        match self {
            Self::Subscribe { queue_url, .. } => Some(queue_url),
            Self::CreateQueue { .. } | Self::MissingQueueUrl { .. } | Self::DeleteQueue { .. } => {
                None
            }
        }
    }
}

/// The receive call failed. Fatal to the poll loop.
#[derive(Debug, Error)]
#[error("failed to receive from queue '{queue_url}': {source}")]
pub struct TransportError {
    /// URL of the queue being polled.
    pub queue_url: String,
    /// Backend error.
    #[source]
    pub source: BoxError,
}

/// The ephemeral queue owned by one daemon run.
pub struct Queue {
    name: String,
    url: String,
    arn: String,
    backend: Arc<dyn QueueBackend>,
}

impl fmt::Debug for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("arn", &self.arn)
            .finish_non_exhaustive()
    }
}

impl Queue {
    /// Creates the queue, authorises `topic_arn` to deliver into it, and
    /// subscribes it to the topic.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::CreateQueue`] or
    /// [`ProvisioningError::MissingQueueUrl`] when creation fails, and
    /// [`ProvisioningError::Subscribe`] when the subscription fails. The
    /// latter leaves the created queue in place; see
    /// [`ProvisioningError::orphaned_queue_url`].
    pub async fn create(
        backend: Arc<dyn QueueBackend>,
        name: &str,
        topic_arn: &str,
    ) -> Result<Self, ProvisioningError> {
        let policy = access_policy(topic_arn);
        let url = backend
            .create_queue(name, &policy)
            .await
            .map_err(|source| ProvisioningError::CreateQueue {
                name: name.to_owned(),
                source,
            })?
            .ok_or_else(|| ProvisioningError::MissingQueueUrl {
                name: name.to_owned(),
            })?;
        let arn = queue_arn_from_url(&url);
        debug!(
            target: QUEUE_TARGET,
            queue = name,
            url = %url,
            arn = %arn,
            "queue created"
        );

        backend
            .subscribe(topic_arn, &arn)
            .await
            .map_err(|source| ProvisioningError::Subscribe {
                topic_arn: topic_arn.to_owned(),
                queue_url: url.clone(),
                queue_arn: arn.clone(),
                source,
            })?;
        info!(
            target: QUEUE_TARGET,
            queue = name,
            topic = topic_arn,
            "queue subscribed to topic"
        );

        Ok(Self {
            name: name.to_owned(),
            url,
            arn,
            backend,
        })
    }

    /// Logical queue name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Queue ARN derived from the URL.
    #[must_use]
    pub fn arn(&self) -> &str {
        &self.arn
    }

    /// Receives pending items.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the backend call fails.
    pub async fn receive(
        &self,
        request: ReceiveRequest,
    ) -> Result<Vec<QueueMessage>, TransportError> {
        self.backend
            .receive(&self.url, request)
            .await
            .map_err(|source| TransportError {
                queue_url: self.url.clone(),
                source,
            })
    }

    /// Removes one received item.
    ///
    /// # Errors
    ///
    /// Returns the backend error unchanged; callers decide whether it matters.
    pub async fn delete_message(&self, receipt_handle: &str) -> Result<(), BoxError> {
        self.backend.delete_message(&self.url, receipt_handle).await
    }

    /// Deletes the queue. Consuming `self` keeps the normal path to a single
    /// call.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::DeleteQueue`] when the backend call fails.
    pub async fn delete(self) -> Result<(), ProvisioningError> {
        delete_queue_at(self.backend.as_ref(), &self.url).await?;
        info!(
            target: QUEUE_TARGET,
            queue = %self.name,
            "queue deleted"
        );
        Ok(())
    }
}

/// Deletes the queue at `queue_url` without a [`Queue`] handle.
///
/// Used to clean up after [`ProvisioningError::Subscribe`].
///
/// # Errors
///
/// Returns [`ProvisioningError::DeleteQueue`] when the backend call fails.
pub async fn delete_queue_at(
    backend: &dyn QueueBackend,
    queue_url: &str,
) -> Result<(), ProvisioningError> {
    backend
        .delete_queue(queue_url)
        .await
        .map_err(|source| ProvisioningError::DeleteQueue {
            queue_url: queue_url.to_owned(),
            source,
        })
}
