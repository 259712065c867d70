//! Shutdown signalling.
//!
//! Termination signals are caught by a [`SignalListener`] and published
//! through a [`ShutdownTrigger`]. Every holder of a [`ShutdownNotice`] observes
//! the same request, so an in-flight handler, a handler started later, and the
//! poll loop all see one shutdown.

use std::io;
use std::sync::Arc;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

const SHUTDOWN_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::shutdown");

/// Signals that move the daemon into [`ShutdownState::ShuttingDown`].
pub const SHUTDOWN_SIGNALS: [i32; 4] = [SIGTERM, SIGINT, SIGQUIT, SIGHUP];

/// Daemon run state. `ShuttingDown` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    /// No shutdown has been requested.
    Running,
    /// A shutdown was requested by `signal`.
    ShuttingDown {
        /// Signal number that triggered the transition.
        signal: i32,
    },
}

/// Creates a connected trigger and notice.
#[must_use]
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownNotice) {
    let (sender, receiver) = watch::channel(None);
    (
        ShutdownTrigger {
            sender: Arc::new(sender),
        },
        ShutdownNotice { receiver },
    )
}

/// Publishing side of the shutdown channel.
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    sender: Arc<watch::Sender<Option<i32>>>,
}

impl ShutdownTrigger {
    /// Requests shutdown on behalf of `signal`.
    ///
    /// Returns `true` for the request that moved the state to
    /// [`ShutdownState::ShuttingDown`]; later requests are ignored and return
    /// `false`.
    pub fn trigger(&self, signal: i32) -> bool {
        self.sender.send_if_modified(|state| {
            if state.is_some() {
                return false;
            }
            *state = Some(signal);
            true
        })
    }

    /// Creates another notice observing this trigger.
    #[must_use]
    pub fn subscribe(&self) -> ShutdownNotice {
        ShutdownNotice {
            receiver: self.sender.subscribe(),
        }
    }
}

/// Observing side of the shutdown channel.
#[derive(Debug, Clone)]
pub struct ShutdownNotice {
    receiver: watch::Receiver<Option<i32>>,
}

impl ShutdownNotice {
    /// Current state.
    #[must_use]
    pub fn state(&self) -> ShutdownState {
        match *self.receiver.borrow() {
            Some(signal) => ShutdownState::ShuttingDown { signal },
            None => ShutdownState::Running,
        }
    }

    /// Signal that requested shutdown, if any.
    #[must_use]
    pub fn signal(&self) -> Option<i32> {
        *self.receiver.borrow()
    }

    /// Completes with the signal number once shutdown has been requested,
    /// immediately if it already was.
    ///
    /// Never completes if every trigger is dropped without firing.
    pub async fn requested(&mut self) -> i32 {
        let observed = match self.receiver.wait_for(Option::is_some).await {
            Ok(state) => *state,
            Err(_closed) => None,
        };
        match observed {
            Some(signal) => signal,
            None => std::future::pending().await,
        }
    }
}

/// Errors reported by shutdown signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Background listener translating OS signals into shutdown requests.
#[derive(Debug)]
pub struct SignalListener {
    handle: Handle,
    task: JoinHandle<()>,
}

impl SignalListener {
    /// Installs handlers for [`SHUTDOWN_SIGNALS`] and forwards each delivery
    /// to `trigger`.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError::Install`] when the handlers cannot be
    /// registered.
    pub fn install(trigger: ShutdownTrigger) -> Result<Self, ShutdownError> {
        let mut signals =
            Signals::new(SHUTDOWN_SIGNALS).map_err(|source| ShutdownError::Install { source })?;
        let handle = signals.handle();
        let task = tokio::task::spawn_blocking(move || {
            for signal in signals.forever() {
                if trigger.trigger(signal) {
                    info!(
                        target: SHUTDOWN_TARGET,
                        signal,
                        "shutdown signal received"
                    );
                } else {
                    warn!(
                        target: SHUTDOWN_TARGET,
                        signal,
                        "shutdown already in progress; ignoring signal"
                    );
                }
            }
        });
        Ok(Self { handle, task })
    }

    /// Unregisters the handlers and waits for the listener to stop.
    pub async fn close(self) {
        self.handle.close();
        if let Err(error) = self.task.await {
            warn!(
                target: SHUTDOWN_TARGET,
                error = %error,
                "signal listener task failed"
            );
        }
    }
}
