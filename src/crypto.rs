//! Segment payload encryption.
//!
//! Entries are sealed with XChaCha20-Poly1305 under a raw 32-byte key. The
//! stored payload is `nonce(24) || ciphertext || tag(16)`; the entry name is
//! bound in as associated data, so a payload served under the wrong name
//! fails authentication instead of decrypting to plausible bytes.

use chacha20poly1305::{
    Key, XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit, Payload},
};

use crate::error::{Error, Result};

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 24;
pub const TAG_LEN: usize = 16;

/// Raw 32-byte segment key, supplied by the caller per request.
#[derive(Clone)]
pub struct SegmentKey(pub [u8; KEY_LEN]);

impl SegmentKey {
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|_| Error::DecryptionFailed)?;
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|_| Error::DecryptionFailed)?;
        Ok(Self(key))
    }
}

impl std::fmt::Debug for SegmentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never log key material
        f.write_str("SegmentKey(..)")
    }
}

/// Seal a segment plaintext into an entry payload.
///
/// Writer-side counterpart to [`open_segment`]; the import process uses
/// this when packing archives, and the test suite uses it to build
/// synthetic entries. Sealing cannot fail for a well-formed key, so this
/// is infallible.
pub fn seal_segment(key: &SegmentKey, entry_name: &str, plaintext: &[u8]) -> Vec<u8> {
    let mut nonce = [0u8; NONCE_LEN];
    getrandom::getrandom(&mut nonce).expect("os rng");

    let aead = XChaCha20Poly1305::new(Key::from_slice(&key.0));
    let ciphertext = aead
        .encrypt(
            XNonce::from_slice(&nonce),
            Payload {
                msg: plaintext,
                aad: entry_name.as_bytes(),
            },
        )
        .expect("encrypt");

    let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    payload.extend_from_slice(&nonce);
    payload.extend_from_slice(&ciphertext);
    payload
}

/// Open an entry payload back into the segment plaintext.
///
/// Fails with [`Error::DecryptionFailed`] on a wrong key, a truncated
/// payload, a tampered ciphertext, or a name/payload mismatch.
pub fn open_segment(key: &SegmentKey, entry_name: &str, payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() < NONCE_LEN + TAG_LEN {
        return Err(Error::DecryptionFailed);
    }
    let (nonce, ciphertext) = payload.split_at(NONCE_LEN);

    let aead = XChaCha20Poly1305::new(Key::from_slice(&key.0));
    aead.decrypt(
        XNonce::from_slice(nonce),
        Payload {
            msg: ciphertext,
            aad: entry_name.as_bytes(),
        },
    )
    .map_err(|_| Error::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> SegmentKey {
        SegmentKey([byte; KEY_LEN])
    }

    #[test]
    fn seal_open_round_trip() {
        let plaintext = b"transport stream bytes";
        let payload = seal_segment(&key(1), "movie0.ts", plaintext);
        assert_eq!(payload.len(), plaintext.len() + NONCE_LEN + TAG_LEN);

        let out = open_segment(&key(1), "movie0.ts", &payload).unwrap();
        assert_eq!(out, plaintext);
    }

    #[test]
    fn wrong_key_fails_closed() {
        let payload = seal_segment(&key(1), "movie0.ts", b"secret");
        assert!(matches!(
            open_segment(&key(2), "movie0.ts", &payload).unwrap_err(),
            Error::DecryptionFailed
        ));
    }

    #[test]
    fn wrong_entry_name_fails_closed() {
        let payload = seal_segment(&key(1), "movie0.ts", b"secret");
        assert!(matches!(
            open_segment(&key(1), "movie1.ts", &payload).unwrap_err(),
            Error::DecryptionFailed
        ));
    }

    #[test]
    fn tampered_ciphertext_fails_closed() {
        let mut payload = seal_segment(&key(1), "movie0.ts", b"secret");
        let last = payload.len() - 1;
        payload[last] ^= 0x01;
        assert!(matches!(
            open_segment(&key(1), "movie0.ts", &payload).unwrap_err(),
            Error::DecryptionFailed
        ));
    }

    #[test]
    fn truncated_payload_fails_closed() {
        assert!(matches!(
            open_segment(&key(1), "movie0.ts", &[0u8; NONCE_LEN]).unwrap_err(),
            Error::DecryptionFailed
        ));
    }

    #[test]
    fn key_parses_from_hex() {
        let hex_key = "11".repeat(KEY_LEN);
        let parsed = SegmentKey::from_hex(&hex_key).unwrap();
        assert_eq!(parsed.0, [0x11; KEY_LEN]);

        assert!(SegmentKey::from_hex("deadbeef").is_err());
        assert!(SegmentKey::from_hex("not hex").is_err());
    }
}
