//! Defines the unified error surface for daemon launch and supervision.

use thiserror::Error;

use s3watch_config::ConfigError;

use crate::queue::{ProvisioningError, TransportError};
use crate::shutdown::ShutdownError;
use crate::telemetry::TelemetryError;
use crate::topic::TopicError;

use super::{EXIT_FATAL, EXIT_TEARDOWN_FAILED};

/// Errors that stop the daemon.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Configuration failed to load or validate.
    #[error(transparent)]
    Config {
        /// Underlying configuration error.
        #[from]
        source: ConfigError,
    },
    /// Telemetry could not be installed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[from]
        source: TelemetryError,
    },
    /// The topic could not be resolved.
    #[error(transparent)]
    Topic {
        /// Underlying resolution error.
        #[from]
        source: TopicError,
    },
    /// The run queue could not be created or subscribed.
    #[error("failed to provision the run queue: {source}")]
    Provisioning {
        /// Underlying provisioning error.
        #[source]
        source: ProvisioningError,
    },
    /// Receiving from the run queue failed.
    #[error(transparent)]
    Transport {
        /// Underlying receive error.
        #[from]
        source: TransportError,
    },
    /// The run queue could not be deleted during shutdown.
    #[error("failed to tear down the run queue: {source}")]
    Teardown {
        /// Underlying provisioning error.
        #[source]
        source: ProvisioningError,
    },
    /// Signal handlers could not be installed.
    #[error(transparent)]
    Shutdown {
        /// Underlying listener error.
        #[from]
        source: ShutdownError,
    },
}

impl LaunchError {
    /// Process exit status for this failure.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Teardown { .. } => EXIT_TEARDOWN_FAILED,
            Self::Config { .. }
            | Self::Telemetry { .. }
            | Self::Topic { .. }
            | Self::Provisioning { .. }
            | Self::Transport { .. }
            | Self::Shutdown { .. } => EXIT_FATAL,
        }
    }
}
