//! gpgv hash-algorithm trust table.
//!
//! The numeric ids follow gpgv's own algorithm numbering, so this table is a
//! versioned contract with that tool: renumbering on their side without an
//! update here would silently change trust decisions. Unknown or out-of-range
//! ids resolve to the invalid entry, so an algorithm this build does not know
//! about is never trusted.

use serde::Serialize;

/// Trust tier of a digest algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tier {
    /// Broken, or unknown to this build. Signatures are rejected.
    Untrusted,
    /// Still accepted, slated for retirement. Signatures produce a warning.
    Weak,
    Trusted,
}

/// One entry of the digest table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigestInfo {
    pub name: &'static str,
    pub tier: Tier,
}

const DIGESTS: [DigestInfo; 12] = [
    DigestInfo {
        name: "Invalid digest",
        tier: Tier::Untrusted,
    },
    DigestInfo {
        name: "MD5",
        tier: Tier::Untrusted,
    },
    DigestInfo {
        name: "SHA1",
        tier: Tier::Weak,
    },
    DigestInfo {
        name: "RIPE-MD/160",
        tier: Tier::Weak,
    },
    DigestInfo {
        name: "Reserved digest",
        tier: Tier::Trusted,
    },
    DigestInfo {
        name: "Reserved digest",
        tier: Tier::Trusted,
    },
    DigestInfo {
        name: "Reserved digest",
        tier: Tier::Trusted,
    },
    DigestInfo {
        name: "Reserved digest",
        tier: Tier::Trusted,
    },
    DigestInfo {
        name: "SHA256",
        tier: Tier::Trusted,
    },
    DigestInfo {
        name: "SHA384",
        tier: Tier::Trusted,
    },
    DigestInfo {
        name: "SHA512",
        tier: Tier::Trusted,
    },
    DigestInfo {
        name: "SHA224",
        tier: Tier::Trusted,
    },
];

/// Resolve a numeric digest-algorithm id to its table entry.
///
/// Total over all inputs: anything outside the table maps to the invalid
/// (Untrusted) entry rather than an error.
#[must_use]
pub fn lookup(id: i64) -> DigestInfo {
    match usize::try_from(id) {
        Ok(idx) if idx < DIGESTS.len() => DIGESTS[idx],
        _ => DIGESTS[0],
    }
}
