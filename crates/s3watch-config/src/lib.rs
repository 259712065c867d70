//! Layered configuration shared by the `s3-watch` binary and its tests.
//!
//! Values resolve in increasing precedence from built-in defaults, an optional
//! TOML file named by `--config-path` (or `S3WATCH_CONFIG_PATH`), environment
//! variables prefixed with `S3WATCH_`, and finally command-line flags. Loading
//! is delegated to [`ortho_config`]; [`Config::validate`] then enforces the
//! constraints the loader cannot express, such as a non-empty bucket name.

mod defaults;
mod delivery;
mod logging;
mod usage;

use std::ffi::OsString;
use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_POLL_INTERVAL_MS, DEFAULT_SHUTDOWN_GRACE_MS, QUEUE_NAME_PREFIX,
    default_delete_policy, default_log_filter, default_log_filter_string, default_log_format,
    default_poll_interval_ms, default_shutdown_grace_ms,
};
pub use delivery::{DeletePolicy, DeletePolicyParseError};
pub use logging::{LogFormat, LogFormatParseError};
pub use usage::{UsageRequest, command as usage_command, usage_request};

/// Resolved daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "S3WATCH")]
pub struct Config {
    /// The S3 bucket to watch.
    #[ortho_config(cli_short = 'b')]
    #[serde(default)]
    pub bucket: String,
    /// SNS topic ARN to subscribe to; inferred from the bucket when absent.
    #[ortho_config(cli_short = 't')]
    #[serde(default)]
    pub topic: Option<String>,
    /// Executable run once per change record.
    #[ortho_config(cli_short = 'x')]
    #[serde(default)]
    pub handler: Option<Utf8PathBuf>,
    /// Poll tick period in milliseconds.
    #[ortho_config(cli_short = 'p')]
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Whether received items are deleted before or after dispatch.
    #[ortho_config(cli_short = 'd')]
    #[serde(default = "default_delete_policy")]
    pub delete_policy: DeletePolicy,
    /// Time allowed for an in-flight handler to exit after a signal.
    #[ortho_config(cli_short = 'g')]
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
    /// Tracing filter expression.
    #[ortho_config(cli_short = 'l')]
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Log output format.
    #[ortho_config(cli_short = 'f')]
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            topic: None,
            handler: None,
            poll_interval_ms: default_poll_interval_ms(),
            delete_policy: default_delete_policy(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments and environment and
    /// validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] when a source is malformed and the
    /// validation variants when the merged values are unusable.
    pub fn load_validated() -> Result<Self, ConfigError> {
        Self::load_validated_from(std::env::args_os())
    }

    /// Loads configuration from `args` (program name first) and the
    /// environment, then validates the result.
    ///
    /// `--help` and `--version` short-circuit loading and come back as
    /// [`ConfigError::Usage`].
    ///
    /// # Errors
    ///
    /// As for [`Config::load_validated`], plus [`ConfigError::Usage`].
    pub fn load_validated_from<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let argv: Vec<OsString> = args.into_iter().map(Into::into).collect();
        if let Some(request) = usage_request(argv.iter().cloned()) {
            return Err(ConfigError::Usage(request));
        }
        let config = Self::load_from_iter(argv).map_err(|source| ConfigError::Load { source })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks invariants that the layered loader cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingBucket`] for an empty bucket name,
    /// [`ConfigError::EmptyTopic`] for a blank topic override, and
    /// [`ConfigError::ZeroPollInterval`] when the poll period is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket.trim().is_empty() {
            return Err(ConfigError::MissingBucket);
        }
        if self.topic.as_deref().is_some_and(|topic| topic.trim().is_empty()) {
            return Err(ConfigError::EmptyTopic);
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }

    /// Bucket to watch.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Explicit topic ARN, if one was configured.
    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// Handler executable, if one was configured.
    #[must_use]
    pub fn handler(&self) -> Option<&Utf8Path> {
        self.handler.as_deref()
    }

    /// Poll tick period.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Queue item acknowledgement ordering.
    #[must_use]
    pub const fn delete_policy(&self) -> DeletePolicy {
        self.delete_policy
    }

    /// Grace period granted to an in-flight handler during shutdown.
    #[must_use]
    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration source could not be read or merged.
    #[error("failed to load configuration: {source}")]
    Load {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// No bucket was supplied.
    #[error("a bucket must be provided with --bucket or S3WATCH_BUCKET")]
    MissingBucket,
    /// The topic override was present but blank.
    #[error("the topic override must not be empty")]
    EmptyTopic,
    /// The poll interval was zero.
    #[error("poll_interval_ms must be greater than zero")]
    ZeroPollInterval,
    /// The command line asked for help or version text; nothing should run.
    #[error("{0}")]
    Usage(UsageRequest),
}

impl ConfigError {
    /// Returns the usage request when this is not a real failure.
    #[must_use]
    pub const fn usage(&self) -> Option<&UsageRequest> {
        match self {
            Self::Usage(request) => Some(request),
            _ => None,
        }
    }
}
