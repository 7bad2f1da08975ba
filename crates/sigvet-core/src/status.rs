//! Parser for the gpgv status channel.
//!
//! gpgv reports machine-readable verification events on a dedicated file
//! descriptor, one record per line, each prefixed with `[GNUPG:] `. Only the
//! seven tags this engine acts on are decoded; everything else is skipped so
//! that newer gpgv versions emitting additional status codes keep working.

use std::io::BufRead;

/// Sentinel prefix carried by every status line.
pub const STATUS_PREFIX: &str = "[GNUPG:] ";

/// Position of the hash-algorithm id among the whitespace-separated VALIDSIG
/// fields, counted after the tag itself. Part of the gpgv contract
/// (fingerprint, date, timestamps, version, reserved, pubkey algo, hash algo,
/// class, primary fingerprint).
const VALIDSIG_DIGEST_FIELD: usize = 7;

/// A decoded status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// `BADSIG` — the signature does not verify. Carries the remainder of
    /// the line (tag included) for the user-visible listing.
    BadSig(String),
    /// `NODATA` — no parsable signature material at all.
    NoData(String),
    /// `NO_PUBKEY` — signature by a key that is not in the keyring.
    NoPubKey(String),
    /// `KEYEXPIRED` — signature by an expired key.
    KeyExpired(String),
    /// `REVKEYSIG` — signature by a revoked key.
    RevokedKey(String),
    /// `GOODSIG` — a verifying signature. Carries `GOODSIG <key id>` with the
    /// trailing uid text already discarded.
    GoodSig(String),
    /// `VALIDSIG` — signature detail record; the only place the digest
    /// algorithm is reported.
    ValidSig {
        /// Leading hexadecimal run of the first field (the full fingerprint).
        fingerprint: String,
        /// Numeric hash-algorithm id; 0 (invalid) when the line is too short
        /// or the field is not numeric.
        digest_id: i64,
    },
}

/// Longest prefix of `s` consisting of ASCII hex digits.
fn hex_prefix(s: &str) -> &str {
    let end = s
        .find(|c: char| !c.is_ascii_hexdigit())
        .unwrap_or(s.len());
    &s[..end]
}

/// Decode one status line. Returns `None` for lines without the sentinel
/// prefix and for tags this engine does not act on.
#[must_use]
pub fn parse_line(line: &str) -> Option<StatusEvent> {
    let rest = line
        .strip_prefix(STATUS_PREFIX)?
        .trim_end_matches(['\r', '\n']);
    let tag = rest.split_whitespace().next()?;

    let event = match tag {
        "BADSIG" => StatusEvent::BadSig(rest.to_string()),
        "NODATA" => StatusEvent::NoData(rest.to_string()),
        "NO_PUBKEY" => StatusEvent::NoPubKey(rest.to_string()),
        "KEYEXPIRED" => StatusEvent::KeyExpired(rest.to_string()),
        "REVKEYSIG" => StatusEvent::RevokedKey(rest.to_string()),
        "GOODSIG" => {
            // The key id is the hex run right after the tag; gpgv appends the
            // primary uid as free text, which is not part of the identifier.
            let after = rest.get("GOODSIG ".len()..).unwrap_or("");
            StatusEvent::GoodSig(format!("GOODSIG {}", hex_prefix(after)))
        }
        "VALIDSIG" => {
            let fields: Vec<&str> = rest.split_whitespace().collect();
            let fingerprint = fields
                .get(1)
                .map(|f| hex_prefix(f))
                .unwrap_or("")
                .to_string();
            // A short or malformed record must not kill the stream; an
            // unparsable digest field resolves to id 0 (untrusted).
            let digest_id = fields
                .get(1 + VALIDSIG_DIGEST_FIELD)
                .and_then(|f| f.parse::<i64>().ok())
                .unwrap_or(0);
            StatusEvent::ValidSig {
                fingerprint,
                digest_id,
            }
        }
        _ => return None,
    };
    Some(event)
}

/// Iterator over the decoded events of a status channel.
///
/// Finite and not restartable: it ends when the channel reaches EOF, i.e.
/// when gpgv exits or closes its write end. Read errors are yielded once and
/// terminate the stream.
pub struct StatusEvents<R> {
    reader: R,
    buf: String,
    done: bool,
}

/// Stream status events from any line-oriented reader.
pub fn events<R: BufRead>(reader: R) -> StatusEvents<R> {
    StatusEvents {
        reader,
        buf: String::new(),
        done: false,
    }
}

impl<R: BufRead> Iterator for StatusEvents<R> {
    type Item = std::io::Result<StatusEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => {
                    if let Some(event) = parse_line(&self.buf) {
                        tracing::debug!(line = %self.buf.trim_end(), "status line matched");
                        return Some(Ok(event));
                    }
                    tracing::trace!(line = %self.buf.trim_end(), "status line skipped");
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const FPR: &str = "34A8E9D3DB3D6AABE4C7D1B7521F8B4F8B4F34A8";

    fn validsig_line(digest: &str) -> String {
        format!("[GNUPG:] VALIDSIG {FPR} 2025-08-25 1756080000 0 4 0 1 {digest} 00 {FPR}\n")
    }

    #[test]
    fn lines_without_sentinel_are_ignored() {
        assert_eq!(parse_line("GOODSIG ABCD1234\n"), None);
        assert_eq!(parse_line("gpgv: Good signature\n"), None);
    }

    #[test]
    fn unrecognized_tags_are_ignored() {
        assert_eq!(parse_line("[GNUPG:] NEWSIG\n"), None);
        assert_eq!(parse_line("[GNUPG:] SIG_ID abc 2025-08-25 1756080000\n"), None);
        assert_eq!(parse_line("[GNUPG:] TRUST_ULTIMATE 0 pgp\n"), None);
    }

    #[test]
    fn badsig_carries_full_remainder() {
        let ev = parse_line("[GNUPG:] BADSIG 521F8B4F8B4F34A8 Example <e@example>\n").unwrap();
        assert_eq!(
            ev,
            StatusEvent::BadSig("BADSIG 521F8B4F8B4F34A8 Example <e@example>".to_string())
        );
    }

    #[test]
    fn goodsig_truncates_at_first_non_hex() {
        let ev = parse_line("[GNUPG:] GOODSIG 521F8B4F8B4F34A8 Example <e@example>\n").unwrap();
        assert_eq!(ev, StatusEvent::GoodSig("GOODSIG 521F8B4F8B4F34A8".to_string()));
    }

    #[test]
    fn goodsig_with_no_key_id_yields_empty_identifier() {
        let ev = parse_line("[GNUPG:] GOODSIG \n").unwrap();
        assert_eq!(ev, StatusEvent::GoodSig("GOODSIG ".to_string()));
    }

    #[test]
    fn validsig_reads_digest_from_eighth_field() {
        let ev = parse_line(&validsig_line("8")).unwrap();
        assert_eq!(
            ev,
            StatusEvent::ValidSig {
                fingerprint: FPR.to_string(),
                digest_id: 8,
            }
        );
    }

    #[test]
    fn short_validsig_does_not_panic_and_defaults_untrusted() {
        let ev = parse_line(&format!("[GNUPG:] VALIDSIG {FPR}\n")).unwrap();
        assert_eq!(
            ev,
            StatusEvent::ValidSig {
                fingerprint: FPR.to_string(),
                digest_id: 0,
            }
        );
    }

    #[test]
    fn non_numeric_digest_field_defaults_untrusted() {
        let ev = parse_line(&validsig_line("garbage")).unwrap();
        assert!(matches!(ev, StatusEvent::ValidSig { digest_id: 0, .. }));
    }

    #[test]
    fn empty_validsig_yields_empty_fingerprint() {
        let ev = parse_line("[GNUPG:] VALIDSIG \n").unwrap();
        assert_eq!(
            ev,
            StatusEvent::ValidSig {
                fingerprint: String::new(),
                digest_id: 0,
            }
        );
    }

    #[test]
    fn event_stream_skips_noise_and_ends_at_eof() {
        let stream = format!(
            "gpgv: Signature made Mon Aug 25 2025\n\
             [GNUPG:] NEWSIG\n\
             {}[GNUPG:] GOODSIG 521F8B4F8B4F34A8 Example <e@example>\n",
            validsig_line("8")
        );
        let got: Vec<StatusEvent> = events(Cursor::new(stream))
            .collect::<std::io::Result<_>>()
            .unwrap();
        assert_eq!(got.len(), 2);
        assert!(matches!(got[0], StatusEvent::ValidSig { .. }));
        assert!(matches!(got[1], StatusEvent::GoodSig(_)));
    }
}
