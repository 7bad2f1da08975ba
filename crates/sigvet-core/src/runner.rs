//! gpgv subprocess runner.
//!
//! Spawns gpgv with its status channel redirected to a pipe and hands the
//! readable end to the caller. The classifier never touches the process: it
//! only ever sees a `BufRead`, so how the channel was obtained stays a
//! runner concern.

use std::io::{self, BufReader};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};

use crate::config::VerifyConfig;

/// gpgv reported success.
pub const EXIT_OK: i32 = 0;
/// At least one signature did not verify.
pub const EXIT_BAD_SIGNATURE: i32 = 1;
/// The verifier binary could not be executed at all.
pub const EXIT_EXEC_FAILED: i32 = 111;
/// No parsable signature data was found (broken clearsigned file).
pub const EXIT_NO_DATA: i32 = 112;

/// A running gpgv process. Killed on drop if not reaped; [`Gpgv::wait`]
/// reaps it normally.
pub struct Gpgv {
    child: Child,
}

impl Drop for Gpgv {
    fn drop(&mut self) {
        // No-op after a normal wait; matters on early-error paths.
        let _ = self.child.kill();
    }
}

/// Start gpgv on `signature`/`content` and return the process handle
/// together with its status channel.
///
/// `keyring` is forwarded as `--keyring` when the caller restricted trust to
/// a keyring file; bare key ids are instead enforced after classification.
pub fn spawn(
    config: &VerifyConfig,
    signature: &Path,
    content: &Path,
    keyring: Option<&Path>,
) -> io::Result<(Gpgv, BufReader<ChildStdout>)> {
    let mut cmd = Command::new(&config.gpgv_path);
    cmd.arg("--ignore-time-conflict")
        .arg("--status-fd")
        .arg("1");
    for option in &config.extra_options {
        cmd.arg(option);
    }
    if let Some(keyring) = keyring {
        cmd.arg("--keyring").arg(keyring);
    }
    // Human-readable output stays on stderr; stdout is the status channel.
    cmd.arg(signature)
        .arg(content)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit());

    tracing::debug!(gpgv = %config.gpgv_path.display(), ?signature, ?content, "spawning gpgv");
    let mut child = cmd.spawn()?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::other("gpgv stdout was not piped"))?;
    Ok((Gpgv { child }, BufReader::new(stdout)))
}

impl Gpgv {
    /// Reap the child after the status channel reached EOF.
    ///
    /// A signal-terminated child has no exit code and maps to -1, which the
    /// verdict stage treats as an unknown failure.
    pub fn wait(mut self) -> io::Result<i32> {
        let status = self.child.wait()?;
        let code = status.code().unwrap_or(-1);
        tracing::debug!(code, "gpgv exited");
        Ok(code)
    }
}
