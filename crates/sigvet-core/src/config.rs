//! Verification configuration.

use serde::Deserialize;
use std::path::PathBuf;

/// How to invoke the external verifier.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Path to the gpgv binary. Resolved via `PATH` by default.
    pub gpgv_path: PathBuf,
    /// Extra options appended to every invocation, before the file
    /// arguments (e.g. a site-wide `--weak-digest`).
    pub extra_options: Vec<String>,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            gpgv_path: PathBuf::from("gpgv"),
            extra_options: Vec::new(),
        }
    }
}
