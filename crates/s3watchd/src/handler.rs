//! External handler invocation.
//!
//! [`HandlerInvoker`] starts the configured executable once per change
//! record. The child inherits the daemon's environment and stderr, reads from
//! a null stdin, and writes its stdout to the daemon's stderr so handler output
//! never interleaves with anything the daemon prints on stdout. While the
//! child runs, a shutdown request is forwarded to it exactly once.

use std::io;
use std::os::fd::AsFd;
use std::process::{ExitStatus, Stdio};

use camino::{Utf8Path, Utf8PathBuf};
use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::shutdown::ShutdownNotice;

const HANDLER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::handler");

/// Non-fatal failures of a single handler run.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler could not be started.
    #[error("failed to start handler '{program}': {source}")]
    Spawn {
        /// Configured executable.
        program: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The handler ran and reported failure.
    #[error("handler '{program}' exited unsuccessfully: {status}")]
    NonZeroExit {
        /// Configured executable.
        program: Utf8PathBuf,
        /// Exit status reported by the OS.
        status: ExitStatus,
    },
    /// Waiting for the handler failed.
    #[error("failed to wait for handler '{program}': {source}")]
    Wait {
        /// Configured executable.
        program: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Forwarding the shutdown signal failed.
    #[error("failed to forward signal {signal} to handler '{program}': {source}")]
    Signal {
        /// Configured executable.
        program: Utf8PathBuf,
        /// Signal that could not be delivered.
        signal: i32,
        /// Underlying errno.
        #[source]
        source: Errno,
    },
}

/// Runs the configured handler executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerInvoker {
    program: Utf8PathBuf,
}

impl HandlerInvoker {
    /// Creates an invoker for `program`.
    #[must_use]
    pub fn new(program: impl Into<Utf8PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Executable this invoker starts.
    #[must_use]
    pub fn program(&self) -> &Utf8Path {
        &self.program
    }

    /// Runs the handler to completion.
    ///
    /// When `shutdown` fires while the child runs, or had already fired when
    /// it started, the requested signal is delivered to the child once and
    /// the invoker keeps waiting for it to exit. Dropping the returned future
    /// kills the child.
    ///
    /// # Errors
    ///
    /// Returns a [`HandlerError`] when the child cannot be started or waited
    /// on, when forwarding the signal fails, or when the child exits
    /// unsuccessfully.
    pub async fn invoke(&self, mut shutdown: ShutdownNotice) -> Result<ExitStatus, HandlerError> {
        let mut child = Command::new(self.program.as_std_path())
            .stdin(Stdio::null())
            .stdout(stdout_sink().map_err(|source| self.spawn_error(source))?)
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| self.spawn_error(source))?;
        let pid = child.id();
        debug!(
            target: HANDLER_TARGET,
            program = %self.program,
            pid,
            "handler started"
        );

        let mut forwarded = false;
        let status = loop {
            tokio::select! {
                biased;
                waited = child.wait() => {
                    break waited.map_err(|source| HandlerError::Wait {
                        program: self.program.clone(),
                        source,
                    })?;
                }
                signal = shutdown.requested(), if !forwarded => {
                    forwarded = true;
                    self.forward(pid, signal)?;
                }
            }
        };

        debug!(
            target: HANDLER_TARGET,
            program = %self.program,
            %status,
            "handler exited"
        );
        if status.success() {
            Ok(status)
        } else {
            Err(HandlerError::NonZeroExit {
                program: self.program.clone(),
                status,
            })
        }
    }

    fn forward(&self, pid: Option<u32>, signal: i32) -> Result<(), HandlerError> {
        // No pid means the child has already been reaped.
        let Some(raw) = pid.and_then(|id| i32::try_from(id).ok()) else {
            return Ok(());
        };
        let delivery = Signal::try_from(signal).and_then(|sig| kill(Pid::from_raw(raw), sig));
        match delivery {
            Ok(()) => {
                info!(
                    target: HANDLER_TARGET,
                    program = %self.program,
                    pid = raw,
                    signal,
                    "forwarded shutdown signal to handler"
                );
                Ok(())
            }
            Err(Errno::ESRCH) => Ok(()),
            Err(source) => Err(HandlerError::Signal {
                program: self.program.clone(),
                signal,
                source,
            }),
        }
    }

    fn spawn_error(&self, source: io::Error) -> HandlerError {
        HandlerError::Spawn {
            program: self.program.clone(),
            source,
        }
    }
}

/// Duplicates the daemon's stderr for use as the child's stdout.
fn stdout_sink() -> io::Result<Stdio> {
    let fd = io::stderr().as_fd().try_clone_to_owned()?;
    Ok(Stdio::from(fd))
}
