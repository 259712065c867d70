//! Queue ARN derivation from the queue URL.
//!
//! `CreateQueue` only returns the queue URL. The subscription step needs the
//! ARN, so it is rebuilt from the URL instead of issuing a
//! `GetQueueAttributes` round trip:
//!
//! ```text
//! https://sqs.us-east-1.amazonaws.com/123456789012/s3-watch-abc
//! arn:aws:sqs:us-east-1:123456789012:s3-watch-abc
//! ```

const SCHEME: &str = "https://";
const ARN_PREFIX: &str = "arn:aws:";
const DOMAIN_SUFFIX: &str = ".amazonaws.com";
const SEPARATOR: &str = ":";

/// Rewrites an SQS queue URL into the matching queue ARN.
///
/// The steps run in a fixed order: the scheme becomes the ARN prefix, the
/// service domain suffix is dropped, and every remaining `.` and `/` becomes
/// `:`.
#[must_use]
pub fn queue_arn_from_url(url: &str) -> String {
    url.replace(SCHEME, ARN_PREFIX)
        .replace(DOMAIN_SUFFIX, "")
        .replace('.', SEPARATOR)
        .replace('/', SEPARATOR)
}
