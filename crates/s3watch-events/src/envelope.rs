use serde::{Deserialize, Serialize};

/// Outer SNS transport wrapper around a queue item.
///
/// `message` is the raw JSON text of the inner document, not a nested object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Envelope {
    /// SNS message type, usually `Notification`.
    #[serde(rename = "Type", default)]
    pub kind: String,
    /// Optional subject line set by the publisher.
    #[serde(rename = "Subject", default)]
    pub subject: String,
    /// RFC 3339 publication timestamp.
    #[serde(rename = "Time", alias = "Timestamp", default)]
    pub time: String,
    /// JSON-encoded inner document.
    #[serde(rename = "Message")]
    pub message: String,
}
