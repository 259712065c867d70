//! Resolution of the SNS topic that relays bucket notifications.

use async_trait::async_trait;
use aws_config::SdkConfig;
use thiserror::Error;
use tracing::info;

use crate::queue::BoxError;

const TOPIC_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::topic");

/// Read-only lookup of a bucket's topic notification targets.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TopicLookup: Send + Sync {
    /// Returns the topic ARNs configured on `bucket`, in configuration order.
    async fn topic_arns(&self, bucket: &str) -> Result<Vec<String>, BoxError>;
}

/// [`TopicLookup`] reading `GetBucketNotificationConfiguration`.
#[derive(Debug, Clone)]
pub struct S3TopicLookup {
    client: aws_sdk_s3::Client,
}

impl S3TopicLookup {
    /// Builds the S3 client from a shared SDK configuration.
    #[must_use]
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(config),
        }
    }
}

#[async_trait]
impl TopicLookup for S3TopicLookup {
    async fn topic_arns(&self, bucket: &str) -> Result<Vec<String>, BoxError> {
        let output = self
            .client
            .get_bucket_notification_configuration()
            .bucket(bucket)
            .send()
            .await
            .map_err(|error| Box::new(error.into_service_error()) as BoxError)?;
        Ok(output
            .topic_configurations()
            .iter()
            .map(|topic| topic.topic_arn().to_owned())
            .collect())
    }
}

/// Errors raised while resolving the topic.
#[derive(Debug, Error)]
pub enum TopicError {
    /// Reading the bucket notification configuration failed.
    #[error("failed to read notification configuration for bucket '{bucket}': {source}")]
    Lookup {
        /// Bucket being inspected.
        bucket: String,
        /// Backend error.
        #[source]
        source: BoxError,
    },
    /// The bucket publishes to no topic.
    #[error("bucket '{bucket}' has no topic notification configured")]
    NoTopicConfigured {
        /// Bucket being inspected.
        bucket: String,
    },
}

/// Returns `explicit` when set, otherwise the first topic target configured
/// on `bucket`.
///
/// # Errors
///
/// Returns [`TopicError::Lookup`] when the lookup fails and
/// [`TopicError::NoTopicConfigured`] when the bucket has no topic target.
pub async fn resolve_topic(
    bucket: &str,
    explicit: Option<&str>,
    lookup: &dyn TopicLookup,
) -> Result<String, TopicError> {
    if let Some(topic) = explicit {
        return Ok(topic.to_owned());
    }

    let topics = lookup
        .topic_arns(bucket)
        .await
        .map_err(|source| TopicError::Lookup {
            bucket: bucket.to_owned(),
            source,
        })?;
    let topic = topics
        .into_iter()
        .next()
        .ok_or_else(|| TopicError::NoTopicConfigured {
            bucket: bucket.to_owned(),
        })?;
    info!(
        target: TOPIC_TARGET,
        bucket,
        topic = %topic,
        "inferred topic from bucket notification configuration"
    );
    Ok(topic)
}
