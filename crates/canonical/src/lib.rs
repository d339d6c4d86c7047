//! ocrgate canonical layer.
//!
//! Two small pure functions sit at the edges of the OCR pipeline:
//!
//! - [`fingerprint`] turns raw upload bytes into the cache key
//! - [`normalize_text`] cleans up whatever text the recognizer hands back
//!
//! ## Pure function guarantee
//!
//! No I/O, no clock calls, no locale dependence. Same bytes in, same
//! fingerprint out; same text in, same normalized text out, and normalizing
//! twice changes nothing.

mod fingerprint;
mod whitespace;

pub use crate::fingerprint::{fingerprint, Fingerprint, FINGERPRINT_HEX_LEN};
pub use crate::whitespace::normalize_text;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_text_fingerprint_is_stable() {
        let raw = "  Total:\t\t42 \n\n\n\nPaid ";
        let a = fingerprint(normalize_text(raw).as_bytes());
        let b = fingerprint(normalize_text(&normalize_text(raw)).as_bytes());
        assert_eq!(a, b);
    }
}
