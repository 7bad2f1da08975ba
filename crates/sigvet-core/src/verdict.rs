//! Decision builder: combine the gpgv exit status with the classification
//! sets into the final verdict handed to the fetch pipeline.

use serde::Serialize;

use crate::classify::{good_entry_matches, Classification};
use crate::runner;

/// Diagnostic templates. Callers branch on these strings, so they are part
/// of the public contract.
pub const MSG_INVALID_SIGNATURE: &str = "At least one invalid signature was encountered.";
pub const MSG_INTERNAL_NO_FINGERPRINT: &str =
    "Internal error: Good signature, but could not determine key fingerprint?!";
pub const MSG_GPGV_NOT_EXECUTABLE: &str =
    "Could not execute 'gpgv' to verify signature (is gnupg installed?)";
pub const MSG_NO_DATA: &str =
    "Clearsigned file isn't valid, got 'NODATA' (does the network require authentication?)";
pub const MSG_UNKNOWN_ERROR: &str = "Unknown error executing gpgv";

const HEADER_INVALID: &str = "The following signatures were invalid:";
const HEADER_NO_PUBKEY: &str =
    "The following signatures couldn't be verified because the public key is not available:";

/// The externally observable result of one verification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub accepted: bool,
    /// One of the fixed diagnostic templates, possibly followed by grouped
    /// per-signer listings. Empty on acceptance.
    pub message: String,
    /// Good ++ Bad ++ NoPubKey signer lines, in that order.
    pub output: Vec<String>,
    /// Non-fatal weak-digest warnings. Never flip the outcome by themselves.
    pub warnings: Vec<String>,
}

/// Map the subprocess exit code to its base diagnostic. Empty string means
/// gpgv reported success and a good signer exists.
fn exit_diagnostic(exit_code: i32, state: &Classification, key_scoped: bool) -> String {
    match exit_code {
        runner::EXIT_OK => {
            if !state.good.is_empty() {
                String::new()
            } else if key_scoped {
                // gpgv reported success, but the demanded key did not sign:
                // the valid signature we found is in fact invalid for us.
                MSG_INVALID_SIGNATURE.to_string()
            } else {
                MSG_INTERNAL_NO_FINGERPRINT.to_string()
            }
        }
        runner::EXIT_BAD_SIGNATURE => MSG_INVALID_SIGNATURE.to_string(),
        runner::EXIT_EXEC_FAILED => MSG_GPGV_NOT_EXECUTABLE.to_string(),
        runner::EXIT_NO_DATA => MSG_NO_DATA.to_string(),
        _ => MSG_UNKNOWN_ERROR.to_string(),
    }
}

/// Per-signer listings grouped under fixed headers.
fn grouped_listing(state: &Classification) -> String {
    let mut msg = String::new();
    if !state.bad.is_empty() {
        msg.push_str(HEADER_INVALID);
        msg.push('\n');
        for entry in &state.bad {
            msg.push_str(entry);
            msg.push('\n');
        }
    }
    if !state.worthless.is_empty() {
        msg.push_str(HEADER_INVALID);
        msg.push('\n');
        for entry in &state.worthless {
            msg.push_str(entry);
            msg.push('\n');
        }
    }
    if !state.no_pubkey.is_empty() {
        msg.push_str(HEADER_NO_PUBKEY);
        msg.push('\n');
        for entry in &state.no_pubkey {
            msg.push_str(entry);
            msg.push('\n');
        }
    }
    msg
}

/// One warning per soon-worthless signer, but only when no good signer with
/// a strong digest remains: a single strong signature silences the nagging.
fn weak_digest_warnings(state: &Classification) -> Vec<String> {
    if state.soon_worthless.is_empty() {
        return Vec::new();
    }
    let any_strong_good = state.good.iter().any(|entry| {
        !state
            .soon_worthless
            .iter()
            .any(|weak| good_entry_matches(entry, &weak.key))
    });
    if any_strong_good {
        return Vec::new();
    }
    state
        .soon_worthless
        .iter()
        .map(|weak| {
            format!(
                "Signature by key {} uses weak digest algorithm ({})",
                weak.key, weak.digest
            )
        })
        .collect()
}

/// Combine exit status and classification into the final verdict.
#[must_use]
pub fn build(state: &Classification, exit_code: i32, key_scoped: bool) -> Verdict {
    let warnings = weak_digest_warnings(state);
    for warning in &warnings {
        tracing::warn!("{warning}");
    }

    let base = exit_diagnostic(exit_code, state, key_scoped);

    // Rejection is forced only when no good signer remains or a bad one is
    // present. Good signatures alongside NO_PUBKEY ones happen easily when a
    // file is signed multiple times, and are tolerated.
    if state.good.is_empty() || !state.bad.is_empty() {
        let message = if state.bad.is_empty()
            && state.worthless.is_empty()
            && state.no_pubkey.is_empty()
        {
            base
        } else {
            grouped_listing(state)
        };
        return Verdict {
            accepted: false,
            message,
            output: Vec::new(),
            warnings,
        };
    }

    let mut output = state.good.clone();
    output.extend(state.bad.iter().cloned());
    output.extend(state.no_pubkey.iter().cloned());
    Verdict {
        accepted: true,
        message: String::new(),
        output,
        warnings,
    }
}
