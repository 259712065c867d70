//! Process entry point: wiring, supervision and exit status.

mod errors;
mod launch;

pub use errors::LaunchError;
pub use launch::{Services, Termination, run_daemon, run_daemon_with};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

/// Exit status after a signal-driven shutdown.
pub(crate) const EXIT_SIGNALLED: u8 = 1;
/// Exit status after a fatal startup or receive error.
pub(crate) const EXIT_FATAL: u8 = 1;
/// Exit status when the run queue could not be deleted.
pub(crate) const EXIT_TEARDOWN_FAILED: u8 = 2;
