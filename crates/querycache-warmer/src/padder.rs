//! Sub-threshold content augmentation (§4.8 Padder).
//!
//! Padding only ever appends; the original text is preserved verbatim and
//! the amount of filler added is whatever it takes to cross `min_tokens`,
//! nothing more.

use querycache_cache::TokenEstimator;

/// Closed content-type taxonomy. An unrecognized hint always falls back to
/// [`ContentType::Generic`] rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Sql,
    Json,
    Api,
    Error,
    Exception,
    Generic,
}

impl ContentType {
    /// Parses a free-form type hint (case-insensitive), defaulting to `Generic`.
    pub fn parse(hint: &str) -> Self {
        match hint.to_ascii_lowercase().as_str() {
            "sql" => Self::Sql,
            "json" => Self::Json,
            "api" => Self::Api,
            "error" => Self::Error,
            "exception" => Self::Exception,
            _ => Self::Generic,
        }
    }

    /// A single non-executable filler block, distinguished by type only in
    /// wording — never in a form a caller could mistake for live code.
    fn filler_block(&self, index: usize) -> String {
        match self {
            Self::Sql => format!(
                "-- supplemental context block {index}: this query participates in a larger \
                 analytical workload; related tables and indexes are described here for cache \
                 sizing purposes only and carry no executable statements."
            ),
            Self::Json => format!(
                "/* supplemental context {index}: this payload is part of a larger API response; \
                 the following text is descriptive padding, not a JSON member, and must not be \
                 parsed as structured data. */"
            ),
            Self::Api => format!(
                "Supplemental API context {index}: this response is one of several related calls \
                 in a request chain; additional descriptive detail is appended here purely to \
                 satisfy cache sizing thresholds."
            ),
            Self::Error => format!(
                "Supplemental diagnostic context {index}: this error was observed during a larger \
                 operation; surrounding state and recent call history are summarized here in \
                 prose form for cache sizing purposes."
            ),
            Self::Exception => format!(
                "Supplemental exception context {index}: a stack trace and handler chain \
                 ordinarily accompany this exception; the following descriptive text stands in \
                 for that detail without reproducing any executable frames."
            ),
            Self::Generic => format!(
                "Supplemental context {index}: additional descriptive detail has been appended to \
                 this content purely to satisfy the cache's minimum token threshold."
            ),
        }
    }
}

/// Pads content below `min_tokens` with type-specific filler until the
/// estimate reaches the threshold. Idempotent: content already at or above
/// `min_tokens` is returned unchanged, so re-padding an already-padded
/// string never grows it further or duplicates the original.
#[derive(Debug, Clone, Copy, Default)]
pub struct Padder {
    estimator: TokenEstimator,
}

impl Padder {
    pub fn new() -> Self {
        Self { estimator: TokenEstimator::new() }
    }

    pub fn pad(&self, original: &str, content_type: ContentType, min_tokens: usize) -> String {
        if self.estimator.estimate(original.as_bytes()) >= min_tokens {
            return original.to_string();
        }

        let mut out = String::from(original);
        let mut index = 0usize;
        while self.estimator.estimate(out.as_bytes()) < min_tokens {
            out.push('\n');
            out.push_str(&content_type.filler_block(index));
            index += 1;
        }
        out
    }
}
