//! Library error type.
//!
//! Only transport failures surface as errors: a pipe or process that could
//! not be set up, or a status channel that died mid-read. Everything else —
//! bad signatures, missing keys, abnormal gpgv exit codes — is a well-formed
//! rejected [`crate::Verdict`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerifyError {
    /// The verifier process could not be started (other than a missing
    /// binary, which maps to the exec-failed verdict instead).
    #[error("failed to start verifier '{path}': {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The status channel failed mid-stream, or the child could not be
    /// reaped.
    #[error("failed reading verifier status channel: {0}")]
    Status(#[from] std::io::Error),
}
