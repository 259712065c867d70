//! `--help` and `--version` output.
//!
//! The parser generated for [`crate::Config`] carries no option descriptions,
//! so informational requests are answered by [`command`] before the layered
//! loader runs. Flags here mirror the `cli_short` pins on `Config`.

use std::ffi::OsString;
use std::fmt;
use std::io;

use clap::error::ErrorKind;
use clap::{Arg, Command};

/// A command line asking for usage or version text instead of a run.
#[derive(Debug)]
pub struct UsageRequest {
    rendered: Box<clap::Error>,
}

impl UsageRequest {
    /// Writes the rendered text to stdout.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised while writing.
    pub fn print(&self) -> io::Result<()> {
        self.rendered.print()
    }

    /// Whether the request was for the version string.
    #[must_use]
    pub fn is_version(&self) -> bool {
        self.rendered.kind() == ErrorKind::DisplayVersion
    }
}

impl fmt::Display for UsageRequest {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.rendered.render())
    }
}

/// Documented description of the `s3-watch` command line.
#[must_use]
pub fn command() -> Command {
    Command::new("s3-watch")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Runs a handler for every change notification an S3 bucket publishes.")
        .arg(option("bucket", 'b', "BUCKET", "S3 bucket to watch (required)"))
        .arg(option(
            "topic",
            't',
            "ARN",
            "SNS topic ARN; read from the bucket notification configuration when absent",
        ))
        .arg(option(
            "handler",
            'x',
            "PATH",
            "Executable run once per change record",
        ))
        .arg(option(
            "poll-interval-ms",
            'p',
            "MILLIS",
            "Poll tick period [default: 100]",
        ))
        .arg(option(
            "delete-policy",
            'd',
            "POLICY",
            "before_dispatch or after_dispatch [default: before_dispatch]",
        ))
        .arg(option(
            "shutdown-grace-ms",
            'g',
            "MILLIS",
            "Time a running handler gets to exit after a signal [default: 10000]",
        ))
        .arg(option(
            "log-filter",
            'l',
            "FILTER",
            "tracing filter expression [default: info]",
        ))
        .arg(option(
            "log-format",
            'f',
            "FORMAT",
            "json or compact [default: json]",
        ))
        .arg(
            Arg::new("config-path")
                .long("config-path")
                .value_name("PATH")
                .help("TOML configuration file"),
        )
        .after_help(
            "Every option can also be set through an S3WATCH_-prefixed environment variable.",
        )
}

fn option(long: &'static str, short: char, value_name: &'static str, help: &'static str) -> Arg {
    Arg::new(long)
        .long(long)
        .short(short)
        .value_name(value_name)
        .help(help)
}

/// Returns the usage request carried by `args`, if any.
///
/// Any other command line, including a malformed one, yields `None` and is
/// left to the layered loader to parse and report.
#[must_use]
pub fn usage_request<I, T>(args: I) -> Option<UsageRequest>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match command().try_get_matches_from(args) {
        Err(rendered)
            if matches!(
                rendered.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            ) =>
        {
            Some(UsageRequest {
                rendered: Box::new(rendered),
            })
        }
        _ => None,
    }
}
