//! Builders for SNS-wrapped S3 notification bodies.

use serde_json::{Value, json};

use crate::queue::QueueMessage;

/// Key and size of the object used by single-record fixtures.
pub const DEFAULT_OBJECT: (&str, u64) = ("uploads/file.txt", 1024);

fn record(key: &str, size: u64) -> Value {
    json!({
        "awsRegion": "us-east-1",
        "eventName": "ObjectCreated:Put",
        "eventSource": "aws:s3",
        "eventTime": "2024-05-01T12:00:00.000Z",
        "eventVersion": "2.1",
        "requestParameters": { "sourceIPAddress": "203.0.113.7" },
        "s3": {
            "bucket": {
                "arn": "arn:aws:s3:::b",
                "name": "b",
                "ownerIdentity": { "principalId": "OWNER" }
            },
            "configurationId": "watch",
            "object": {
                "eTag": "d41d8cd98f00b204e9800998ecf8427e",
                "key": key,
                "sequencer": "0055AED6DCD90281E5",
                "size": size
            },
            "s3SchemaVersion": "1.0"
        },
        "userIdentity": { "principalId": "AWS:UPLOADER" }
    })
}

/// Envelope body carrying one record per `(key, size)` pair.
pub fn notification_body(objects: &[(&str, u64)]) -> String {
    let records: Vec<Value> = objects
        .iter()
        .map(|(key, size)| record(key, *size))
        .collect();
    let message = json!({ "Records": records }).to_string();
    json!({
        "Type": "Notification",
        "Subject": "Amazon S3 Notification",
        "Time": "2024-05-01T12:00:00.123Z",
        "Message": message,
    })
    .to_string()
}

/// Queue item with id `m-1` carrying the given records.
pub fn notification_message(objects: &[(&str, u64)]) -> QueueMessage {
    QueueMessage {
        message_id: Some(String::from("m-1")),
        receipt_handle: Some(String::from("receipt-m-1")),
        body: notification_body(objects),
    }
}

/// Queue item with id `message_id` carrying [`DEFAULT_OBJECT`].
pub fn notification_message_with_id(message_id: &str) -> QueueMessage {
    QueueMessage {
        message_id: Some(message_id.to_owned()),
        receipt_handle: Some(format!("receipt-{message_id}")),
        body: notification_body(&[DEFAULT_OBJECT]),
    }
}
