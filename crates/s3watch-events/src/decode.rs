use thiserror::Error;

use crate::envelope::Envelope;
use crate::record::{ChangeRecord, RecordBatch};

/// Errors raised while unwrapping a queue item body.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The body was not a valid SNS envelope.
    #[error("malformed notification envelope: {source}")]
    Envelope {
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// The envelope's `Message` was not a valid record batch.
    #[error("malformed notification message: {source}")]
    Message {
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Decodes a queue item body into its change records.
///
/// The result is all-or-nothing: either every record in the inner document is
/// returned in order, or an error is returned and no record is.
///
/// # Errors
///
/// Returns [`DecodeError::Envelope`] when the outer layer fails to parse and
/// [`DecodeError::Message`] when the embedded message does.
pub fn decode(body: &[u8]) -> Result<Vec<ChangeRecord>, DecodeError> {
    let envelope: Envelope =
        serde_json::from_slice(body).map_err(|source| DecodeError::Envelope { source })?;
    let batch: RecordBatch = serde_json::from_str(&envelope.message)
        .map_err(|source| DecodeError::Message { source })?;
    Ok(batch.records)
}
