use serde::{Deserialize, Serialize};

/// Inner notification document: the change records carried by one envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RecordBatch {
    /// Records in the order S3 emitted them.
    #[serde(rename = "Records", default)]
    pub records: Vec<ChangeRecord>,
}

/// One S3 event notification record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChangeRecord {
    /// Region the bucket lives in.
    pub aws_region: String,
    /// Event type such as `ObjectCreated:Put`.
    pub event_name: String,
    /// Event source, `aws:s3`.
    pub event_source: String,
    /// Time the event occurred.
    pub event_time: String,
    /// Record format version.
    pub event_version: String,
    /// Details of the request that triggered the event.
    pub request_parameters: RequestParameters,
    /// Bucket and object identity.
    pub s3: S3Entity,
    /// Principal that triggered the event.
    pub user_identity: PrincipalIdentity,
}

impl ChangeRecord {
    /// Name of the bucket the event refers to.
    #[must_use]
    pub fn bucket_name(&self) -> &str {
        &self.s3.bucket.name
    }

    /// Key of the object the event refers to.
    #[must_use]
    pub fn object_key(&self) -> &str {
        &self.s3.object.key
    }

    /// Size of the object in bytes; zero for events that carry no size.
    #[must_use]
    pub const fn object_size(&self) -> u64 {
        self.s3.object.size
    }
}

/// Request metadata attached to a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RequestParameters {
    /// Source IP address of the requester.
    #[serde(rename = "sourceIPAddress")]
    pub source_ip_address: String,
}

/// The `s3` section of a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct S3Entity {
    /// Bucket identity.
    pub bucket: BucketEntity,
    /// Notification configuration that matched.
    pub configuration_id: String,
    /// Object identity.
    pub object: ObjectEntity,
    /// Schema version of the `s3` section.
    #[serde(rename = "s3SchemaVersion")]
    pub schema_version: String,
}

/// Bucket identity within a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BucketEntity {
    /// Bucket ARN.
    pub arn: String,
    /// Bucket name.
    pub name: String,
    /// Bucket owner.
    pub owner_identity: PrincipalIdentity,
}

/// Object identity within a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObjectEntity {
    /// Entity tag (content checksum).
    #[serde(rename = "eTag")]
    pub e_tag: String,
    /// Object key, URL-encoded as delivered by S3.
    pub key: String,
    /// Ordering token for events on the same key.
    pub sequencer: String,
    /// Object size in bytes.
    pub size: u64,
}

/// A principal reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PrincipalIdentity {
    /// Principal identifier.
    #[serde(rename = "principalId")]
    pub principal_id: String,
}
