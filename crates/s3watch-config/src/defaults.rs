use crate::delivery::DeletePolicy;
use crate::logging::LogFormat;

/// Default poll tick period in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Default time allowed for an in-flight handler to exit after a shutdown
/// signal, in milliseconds.
pub const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 10_000;

/// Default log filter expression used by the binary.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Prefix applied to the generated per-run queue name.
pub const QUEUE_NAME_PREFIX: &str = "s3-watch";

/// Default log filter expression used by the binary.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binary.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default queue item acknowledgement ordering.
#[must_use]
pub const fn default_delete_policy() -> DeletePolicy {
    DeletePolicy::BeforeDispatch
}

/// Default poll tick period in milliseconds.
#[must_use]
pub const fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

/// Default shutdown grace period in milliseconds.
#[must_use]
pub const fn default_shutdown_grace_ms() -> u64 {
    DEFAULT_SHUTDOWN_GRACE_MS
}
