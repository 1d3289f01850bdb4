//! charset-nose: character encoding and line-ending sniffer
//!
//! Detects the encoding and newline convention of text files of unknown provenance, and
//! rewrites them into a target encoding and newline style with bounded memory.
//!
//! # Quick Start
//!
//! ```no_run
//! use charset_nose::{analyse, NewlineStyle};
//!
//! // Sample at least 1 MiB or 1 % of the file, whichever is larger, capped at 16 MiB
//! let result = analyse("notes.txt", 1024 * 1024, 1.0, Some(16 * 1024 * 1024)).unwrap();
//!
//! println!("Encoding: {}", result.encoding);
//! println!("Newlines: {}", result.newlines);
//! assert!(matches!(result.newlines, NewlineStyle::LF | NewlineStyle::CRLF | NewlineStyle::CR));
//! ```
//!
//! # Normalization
//!
//! ```no_run
//! use charset_nose::{normalize, NewlineStyle, SamplingParams};
//!
//! let outcome = normalize("legacy.txt", "utf-8", NewlineStyle::LF, SamplingParams::default())
//!     .unwrap();
//! println!("{outcome:?}");
//! ```
//!
//! # How detection works
//!
//! 1. A bounded sample is taken from the head, tail and evenly spaced middle of the file.
//! 2. The sample is decoded under every plausible candidate encoding.
//! 3. Each decode gets a mess score (how much it looks like mojibake) and a coherence score
//!    (how well its letter frequencies match a known language).
//! 4. One comparator ranks the survivors: mess, then coherence, then the `chardetng` guess,
//!    then a fixed candidate order.
//!
//! A byte-order mark short-circuits all of this.

mod candidates;
mod codec;
pub mod detection;
mod detector;
mod encoding;
mod error;
mod normalize;
mod result;
mod sample;

use std::path::Path;

pub use candidates::{CandidateEncoding, Family, encoding_languages, is_multi_byte_encoding};
pub use codec::Codec;
pub use detector::Detector;
pub use encoding::{
    ResolvedEncoding, is_equivalent, is_utf8, normalize_encoding_name, resolve_encoding,
};
pub use error::{CharsetError, ErrorCategory, Result};
pub use normalize::{DEFAULT_BUFFER_SIZE, Normalizer, Outcome, read_with_encoding};
pub use result::{AnalysisResult, CharsetMatches, Match, NewlineStyle};
pub use sample::{
    ByteSample, DEFAULT_MAX_SAMPLE_SIZE, DEFAULT_MIN_SAMPLE_SIZE,
    DEFAULT_PERCENTAGE_SAMPLE_SIZE, SamplingParams, Segment,
};

/// Detect the encoding and newline style of `source`.
///
/// Fails with [`CharsetError::NotFound`], [`CharsetError::IsDirectory`] or
/// [`CharsetError::EmptyInput`] for unusable sources.
pub fn analyse<P: AsRef<Path>>(
    source: P,
    min_sample_size: usize,
    percentage_sample_size: f64,
    max_sample_size: Option<usize>,
) -> Result<AnalysisResult> {
    let params = SamplingParams::new(min_sample_size, percentage_sample_size, max_sample_size)?;
    let mut detector = Detector::new();
    detector.sampling(params);
    detector.analyse_path(source)
}

/// Detect the encoding of `path` with default sampling, returning its canonical name.
pub fn detect<P: AsRef<Path>>(path: P) -> Result<String> {
    let matches = Detector::new().detect_path(path)?;
    Ok(matches.best().encoding.to_string())
}

/// Rewrite `source` in place into `target_encoding` with `target_newline` terminators.
pub fn normalize<P: AsRef<Path>>(
    source: P,
    target_encoding: &str,
    target_newline: NewlineStyle,
    sampling: SamplingParams,
) -> Result<Outcome> {
    let mut normalizer = Normalizer::new();
    normalizer.sampling(sampling);
    normalizer.normalize_in_place(source, target_encoding, target_newline)
}

/// Write a normalized copy of `source` to `dest`.
pub fn normalize_to<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    dest: Q,
    target_encoding: &str,
    target_newline: NewlineStyle,
    sampling: SamplingParams,
) -> Result<Outcome> {
    let mut normalizer = Normalizer::new();
    normalizer.sampling(sampling);
    normalizer.normalize_to(source, dest, target_encoding, target_newline)
}

/// Decode `path` with its detected encoding, checking the text can be encoded as `to`.
pub fn convert<P: AsRef<Path>>(path: P, to: &str, sampling: SamplingParams) -> Result<String> {
    let mut normalizer = Normalizer::new();
    normalizer.sampling(sampling);
    normalizer.convert(path, to)
}
