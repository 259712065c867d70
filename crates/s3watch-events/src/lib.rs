//! Wire types for bucket change notifications relayed through SNS into SQS.
//!
//! Each queue item body is an SNS [`Envelope`] whose `Message` field holds a
//! second JSON document encoded as a string. That inner document carries the
//! S3 [`ChangeRecord`] list under `Records`. [`decode`] unwraps both layers and
//! either yields every record in delivery order or fails as a whole.

mod decode;
mod envelope;
mod record;

pub use self::decode::{DecodeError, decode};
pub use self::envelope::Envelope;
pub use self::record::{
    BucketEntity, ChangeRecord, ObjectEntity, PrincipalIdentity, RecordBatch, RequestParameters,
    S3Entity,
};
