//! Scratch handler scripts.
//!
//! A child forked while another test still holds a script open for writing
//! inherits that descriptor, and executing the script then fails with
//! `ETXTBSY`. Script writes take [`SCRIPT_LOCK`] exclusively; tests that start
//! handlers hold it shared through [`exec_guard`] for as long as they run.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

static SCRIPT_LOCK: RwLock<()> = RwLock::new(());

const READY_TIMEOUT: Duration = Duration::from_secs(10);
const READY_POLL: Duration = Duration::from_millis(20);

/// Shared guard held while handlers may be spawned. Take it only after every
/// script the test needs has been written.
pub fn exec_guard() -> RwLockReadGuard<'static, ()> {
    SCRIPT_LOCK.read().unwrap_or_else(PoisonError::into_inner)
}

/// Temporary directory holding handler scripts and their marker files.
#[derive(Debug)]
pub struct ScriptDir {
    _dir: TempDir,
    path: Utf8PathBuf,
}

impl ScriptDir {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create script directory");
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .expect("temporary directory path should be UTF-8");
        Self { _dir: dir, path }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Writes an executable `/bin/sh` script named `name`.
    pub fn write(&self, name: &str, body: &str) -> Utf8PathBuf {
        let script = self.path.join(name);
        let _exclusive = SCRIPT_LOCK.write().unwrap_or_else(PoisonError::into_inner);
        fs::write(&script, format!("#!/bin/sh\n{body}")).expect("write handler script");
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755))
            .expect("make handler script executable");
        script
    }

    /// Script that appends one line to its marker for every TERM it receives,
    /// then lingers briefly so a duplicate delivery would also be recorded.
    pub fn trap_script(&self, name: &str) -> SignalScript {
        let ready = self.path.join(format!("{name}.ready"));
        let marker = self.path.join(format!("{name}.signals"));
        let body = format!(
            "trap 'echo term >> \"{marker}\"; caught=1' TERM\n\
             echo ready > \"{ready}\"\n\
             while [ -z \"$caught\" ]; do sleep 0.05; done\n\
             sleep 0.3\n\
             exit 0\n"
        );
        let program = self.write(&format!("{name}.sh"), &body);
        SignalScript {
            program,
            ready,
            marker,
        }
    }

    /// Script that ignores TERM and never exits on its own.
    pub fn stubborn_script(&self, name: &str) -> SignalScript {
        let ready = self.path.join(format!("{name}.ready"));
        let marker = self.path.join(format!("{name}.signals"));
        let body = format!(
            "trap '' TERM\n\
             echo ready > \"{ready}\"\n\
             while :; do sleep 0.05; done\n"
        );
        let program = self.write(&format!("{name}.sh"), &body);
        SignalScript {
            program,
            ready,
            marker,
        }
    }

    /// Script that appends one line to its marker per run.
    pub fn counting_script(&self, name: &str) -> CountingScript {
        let marker = self.path.join(format!("{name}.runs"));
        let program = self.write(&format!("{name}.sh"), &format!("echo run >> \"{marker}\"\n"));
        CountingScript { program, marker }
    }
}

/// A script that reports readiness and records the signals it sees.
#[derive(Debug, Clone)]
pub struct SignalScript {
    pub program: Utf8PathBuf,
    ready: Utf8PathBuf,
    marker: Utf8PathBuf,
}

impl SignalScript {
    /// Waits until the script has installed its trap.
    pub async fn wait_until_ready(&self) {
        let deadline = tokio::time::Instant::now() + READY_TIMEOUT;
        while !self.ready.exists() {
            assert!(
                tokio::time::Instant::now() < deadline,
                "handler script never became ready: {}",
                self.ready
            );
            tokio::time::sleep(READY_POLL).await;
        }
    }

    pub fn signals_observed(&self) -> usize {
        count_lines(&self.marker)
    }
}

/// A script that records how often it ran.
#[derive(Debug, Clone)]
pub struct CountingScript {
    pub program: Utf8PathBuf,
    pub marker: Utf8PathBuf,
}

impl CountingScript {
    pub fn invocations(&self) -> usize {
        count_lines(&self.marker)
    }
}

fn count_lines(path: &Utf8Path) -> usize {
    fs::read_to_string(path)
        .map(|contents| contents.lines().count())
        .unwrap_or(0)
}
