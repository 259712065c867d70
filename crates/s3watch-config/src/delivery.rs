//! Queue item acknowledgement ordering.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// When the poll loop removes a received item from the queue.
///
/// [`DeletePolicy::BeforeDispatch`] gives at-most-once delivery: an item
/// removed before its handler finishes is lost if the daemon crashes.
/// [`DeletePolicy::AfterDispatch`] narrows that window without adding retries;
/// the item is removed once dispatch returns regardless of its outcome.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DeletePolicy {
    /// Delete each item as soon as it is received.
    #[default]
    BeforeDispatch,
    /// Delete each item once its records have been dispatched.
    AfterDispatch,
}

/// Errors encountered while parsing a [`DeletePolicy`] from text.
pub type DeletePolicyParseError = strum::ParseError;
