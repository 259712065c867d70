//! Access policy attached to the per-run queue.

use serde_json::json;

/// The only action the topic is allowed to perform on the queue.
pub const SEND_MESSAGE_ACTION: &str = "sqs:SendMessage";

/// Builds the queue policy that lets exactly one topic deliver messages.
///
/// The document holds a single `Allow` statement for any principal, limited
/// to [`SEND_MESSAGE_ACTION`] and conditioned on `aws:SourceArn` matching
/// `topic_arn`. Requests from any other source fall through to the implicit
/// deny.
#[must_use]
pub fn access_policy(topic_arn: &str) -> String {
    json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Effect": "Allow",
                "Principal": "*",
                "Action": SEND_MESSAGE_ACTION,
                "Resource": "*",
                "Condition": {
                    "ArnEquals": {
                        "aws:SourceArn": topic_arn
                    }
                }
            }
        ]
    })
    .to_string()
}
