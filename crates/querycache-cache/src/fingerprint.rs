//! Query fingerprinting and token-count estimation.

use sha2::{Digest, Sha256};
use std::fmt;

/// A stable bytestring key derived from a normalized query.
///
/// Collisions are as unlikely as a SHA-256 collision; the normalization step
/// (whitespace collapse + case fold) is what makes semantically identical
/// queries share a fingerprint, not the hash itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wraps an already-computed fingerprint string (e.g. a warmer-supplied key).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalizes and hashes query text into a [`Fingerprint`].
///
/// Normalization collapses runs of whitespace to a single space and
/// case-folds the text, so `"SELECT  *  FROM t"` and `"select * from t"`
/// produce the same fingerprint.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentHasher;

impl ContentHasher {
    pub fn new() -> Self {
        Self
    }

    /// Computes the fingerprint for a raw query string.
    pub fn fingerprint(&self, query: &str) -> Fingerprint {
        let normalized = normalize(query);
        let mut hasher = Sha256::new();
        hasher.update(normalized.as_bytes());
        let digest = hasher.finalize();
        Fingerprint(hex_encode(&digest))
    }
}

fn normalize(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    let mut last_was_space = false;
    for ch in query.chars().flat_map(|c| c.to_lowercase()) {
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    out.trim().to_string()
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push_str(&format!("{b:02x}"));
    }
    s
}

/// Deterministically estimates the token count of content.
///
/// This approximates common subword tokenizers (roughly 4 bytes/token for
/// English prose) without depending on a specific model's vocabulary — the
/// core only needs a stable, monotonic-in-length estimate to gate caching
/// decisions, not billing-accurate counts (see the cost-savings model, which
/// is explicitly parametric).
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenEstimator;

impl TokenEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Estimates the number of tokens represented by `content`.
    pub fn estimate(&self, content: &[u8]) -> usize {
        if content.is_empty() {
            return 0;
        }
        // Round up so that non-empty content never estimates to zero tokens.
        content.len().div_ceil(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_across_whitespace_and_case() {
        let hasher = ContentHasher::new();
        let a = hasher.fingerprint("SELECT  *   FROM  t");
        let b = hasher.fingerprint("select * from t");
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_differs_for_different_queries() {
        let hasher = ContentHasher::new();
        assert_ne!(hasher.fingerprint("a"), hasher.fingerprint("b"));
    }

    #[test]
    fn token_estimate_is_monotonic_in_length() {
        let estimator = TokenEstimator::new();
        let short = estimator.estimate(b"hello");
        let long = estimator.estimate(&vec![b'x'; 4000]);
        assert!(long > short);
    }

    #[test]
    fn empty_content_estimates_zero_tokens() {
        let estimator = TokenEstimator::new();
        assert_eq!(estimator.estimate(b""), 0);
    }

    #[test]
    fn boundary_four_bytes_is_one_token() {
        let estimator = TokenEstimator::new();
        assert_eq!(estimator.estimate(b"abcd"), 1);
        assert_eq!(estimator.estimate(b"abcde"), 2);
    }
}
