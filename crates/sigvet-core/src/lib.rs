//! Trust verdicts for gpgv-verified artifacts.
//!
//! sigvet decides, per downloaded file, whether its detached or clearsigned
//! OpenPGP signature(s) are sufficient to trust the content. The actual
//! cryptography is delegated to an external `gpgv` process; this crate
//! streams its machine-readable status channel, classifies the observed
//! signers, applies the digest-strength downgrade policy and an optional
//! single-key restriction, and folds the result together with the process
//! exit status into a [`Verdict`].
//!
//! One request maps to one subprocess and one blocking read loop over its
//! status channel. There is no timeout: a hung verifier blocks the request.

pub mod classify;
pub mod config;
pub mod digest;
pub mod error;
pub mod runner;
pub mod status;
pub mod verdict;

pub use classify::Classification;
pub use config::VerifyConfig;
pub use error::VerifyError;
pub use verdict::Verdict;

use std::io;
use std::path::{Path, PathBuf};

/// One verification request from the fetch pipeline.
#[derive(Debug, Clone)]
pub struct VerifyRequest {
    /// Signed material: a detached signature or a clearsigned file.
    pub signature: PathBuf,
    /// The content the signature covers.
    pub content: PathBuf,
    /// Optional trust restriction: a bare hex key id (enforced after
    /// classification) or an absolute keyring path (forwarded to gpgv).
    pub signed_by: Option<String>,
}

/// Run one verification request to completion.
///
/// Errors only on transport failures; every other outcome, including a
/// missing gpgv binary and abnormal exit codes, is a well-formed (possibly
/// rejected) [`Verdict`].
pub fn verify(config: &VerifyConfig, request: &VerifyRequest) -> Result<Verdict, VerifyError> {
    let key = request.signed_by.as_deref().unwrap_or("");
    let key_is_id = classify::is_key_id(key);
    let keyring = (!key.is_empty() && !key_is_id).then(|| Path::new(key));

    let (process, channel) =
        match runner::spawn(config, &request.signature, &request.content, keyring) {
            Ok(spawned) => spawned,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(gpgv = %config.gpgv_path.display(), "verifier binary not found");
                return Ok(verdict::build(
                    &Classification::default(),
                    runner::EXIT_EXEC_FAILED,
                    key_is_id,
                ));
            }
            Err(e) => {
                return Err(VerifyError::Spawn {
                    path: config.gpgv_path.display().to_string(),
                    source: e,
                })
            }
        };

    // Drain the channel to EOF before reaping; the Drop impl on the process
    // handle cleans up if classification bails out mid-stream.
    let mut state = classify::classify(status::events(channel))?;
    let exit_code = process.wait()?;

    if key_is_id {
        classify::apply_key_scope(&mut state, key);
    }
    Ok(verdict::build(&state, exit_code, key_is_id))
}
