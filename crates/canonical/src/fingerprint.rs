//! Content fingerprints used as result-cache keys.
//!
//! A fingerprint is the SHA-256 digest of the raw upload bytes, rendered as 64
//! lowercase hex characters. Nothing but the bytes goes into the hash: the
//! declared content type and the filename are deliberately left out, so the
//! same image uploaded as `scan.png` and `copy.PNG` shares one cache slot.
//!
//! ```text
//! SHA-256(raw_bytes) -> hex string
//! ```
//!
//! # Examples
//!
//! ```rust
//! use canonical::fingerprint;
//!
//! let fp = fingerprint(b"\x89PNG\r\n\x1a\n");
//! assert_eq!(fp.as_str().len(), 64);
//! assert_eq!(fp, fingerprint(b"\x89PNG\r\n\x1a\n"));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hex length of a SHA-256 digest.
pub const FINGERPRINT_HEX_LEN: usize = 64;

/// Deterministic content hash of an upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Full hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight hex characters, enough to correlate log lines.
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Hash raw bytes into a [`Fingerprint`].
///
/// Pure and infallible. The empty slice hashes like any other input; rejecting
/// empty uploads is the validator's job.
pub fn fingerprint(bytes: &[u8]) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    Fingerprint(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_still_fingerprints() {
        let fp = fingerprint(b"");
        assert_eq!(
            fp.as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn known_digest() {
        let fp = fingerprint(b"hello world");
        assert_eq!(
            fp.to_string(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn fixed_length_lowercase_hex() {
        for input in [&b"a"[..], &[0u8; 1024][..], &[0xff, 0xd8, 0xff][..]] {
            let fp = fingerprint(input);
            assert_eq!(fp.as_str().len(), FINGERPRINT_HEX_LEN);
            assert!(fp
                .as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        }
    }

    #[test]
    fn single_byte_change_changes_fingerprint() {
        assert_ne!(fingerprint(b"GIF89a\x00"), fingerprint(b"GIF89a\x01"));
    }

    #[test]
    fn short_prefix() {
        let fp = fingerprint(b"hello world");
        assert_eq!(fp.short(), "b94d27b9");
    }

    #[test]
    fn serializes_as_plain_string() {
        let fp = fingerprint(b"hello world");
        let json = serde_json::to_string(&fp).unwrap();
        assert_eq!(json, format!("\"{fp}\""));
    }
}
