//! [`QueueBackend`] backed by the AWS SDK.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sqs::types::QueueAttributeName;

use super::{BoxError, QueueBackend, QueueMessage, ReceiveRequest};

/// Subscription protocol for SQS endpoints.
const SQS_PROTOCOL: &str = "sqs";

/// Queue operations over SQS, with subscriptions through SNS.
#[derive(Debug, Clone)]
pub struct AwsQueueBackend {
    sqs: aws_sdk_sqs::Client,
    sns: aws_sdk_sns::Client,
}

impl AwsQueueBackend {
    /// Builds clients from a shared SDK configuration.
    #[must_use]
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            sqs: aws_sdk_sqs::Client::new(config),
            sns: aws_sdk_sns::Client::new(config),
        }
    }
}

#[async_trait]
impl QueueBackend for AwsQueueBackend {
    async fn create_queue(&self, name: &str, policy: &str) -> Result<Option<String>, BoxError> {
        let output = self
            .sqs
            .create_queue()
            .queue_name(name)
            .attributes(QueueAttributeName::Policy, policy)
            .send()
            .await
            .map_err(|error| Box::new(error.into_service_error()) as BoxError)?;
        Ok(output.queue_url().map(str::to_owned))
    }

    async fn subscribe(&self, topic_arn: &str, queue_arn: &str) -> Result<(), BoxError> {
        self.sns
            .subscribe()
            .protocol(SQS_PROTOCOL)
            .topic_arn(topic_arn)
            .endpoint(queue_arn)
            .send()
            .await
            .map_err(|error| Box::new(error.into_service_error()) as BoxError)?;
        Ok(())
    }

    async fn receive(
        &self,
        queue_url: &str,
        request: ReceiveRequest,
    ) -> Result<Vec<QueueMessage>, BoxError> {
        let output = self
            .sqs
            .receive_message()
            .queue_url(queue_url)
            .max_number_of_messages(request.max_messages)
            .wait_time_seconds(request.wait_time_seconds)
            .visibility_timeout(request.visibility_timeout)
            .send()
            .await
            .map_err(|error| Box::new(error.into_service_error()) as BoxError)?;

        Ok(output
            .messages()
            .iter()
            .map(|message| QueueMessage {
                message_id: message.message_id().map(str::to_owned),
                receipt_handle: message.receipt_handle().map(str::to_owned),
                body: message.body().unwrap_or_default().to_owned(),
            })
            .collect())
    }

    async fn delete_message(&self, queue_url: &str, receipt_handle: &str) -> Result<(), BoxError> {
        self.sqs
            .delete_message()
            .queue_url(queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|error| Box::new(error.into_service_error()) as BoxError)?;
        Ok(())
    }

    async fn delete_queue(&self, queue_url: &str) -> Result<(), BoxError> {
        self.sqs
            .delete_queue()
            .queue_url(queue_url)
            .send()
            .await
            .map_err(|error| Box::new(error.into_service_error()) as BoxError)?;
        Ok(())
    }
}
