//! Entry point for the `s3-watch` binary.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    s3watchd::run_daemon().await
}
