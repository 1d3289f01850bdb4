//! Candidate decoding of a byte sample.

use log::trace;

use crate::candidates::{CandidateEncoding, candidate, candidates};
use crate::codec::{Codec, DecodeStep};
use crate::sample::ByteSample;

/// Malformed sequences this close to a cut inside the file are forgiven.
const EDGE_TOLERANCE: usize = 4;
/// Error ratio above which a decode is a pervasive failure.
pub const MAX_ERROR_RATIO: f64 = 0.1;
/// Bytes inspected by the UTF-16 NUL-parity heuristic.
const UTF16_WINDOW_LEN: usize = 1000;
const UTF16_WINDOW_MIN: usize = 20;

const ESC: u8 = 0x1B;

/// A sample decoded under one candidate encoding.
#[derive(Debug, Clone)]
pub struct DecodeAttempt {
    pub candidate: &'static CandidateEncoding,
    /// Segments joined by `\n`, with U+FFFD at each unforgiven error.
    pub text: String,
    /// Malformed sequences that were not forgiven.
    pub errors: usize,
    /// Decoded characters, excluding segment separators.
    pub chars: usize,
}

impl DecodeAttempt {
    /// No unforgiven errors.
    pub fn is_strict(&self) -> bool {
        self.errors == 0
    }

    pub fn error_ratio(&self) -> f64 {
        self.errors as f64 / self.chars.max(1) as f64
    }

    /// Few enough errors to stand in when nothing decodes cleanly.
    pub fn is_tolerable(&self) -> bool {
        self.error_ratio() <= MAX_ERROR_RATIO
    }
}

/// Decode every segment of `sample` with `candidate`.
///
/// Each segment gets a fresh decoder so state never leaks across a gap. Errors within
/// [`EDGE_TOLERANCE`] bytes of an inner cut are forgiven; the file's real start and end are
/// not cuts.
pub fn decode_sample(sample: &ByteSample, candidate: &'static CandidateEncoding) -> DecodeAttempt {
    let mut text = String::with_capacity(sample.len() + sample.segments().len());
    let mut errors = 0;
    let mut chars = 0;

    for (i, segment) in sample.segments().iter().enumerate() {
        if i > 0 {
            text.push('\n');
        }
        let start = text.len();
        let bytes = segment.bytes.as_slice();

        if candidate.codec == Codec::Web(encoding_rs::UTF_8)
            && let Ok(valid) = simdutf8::basic::from_utf8(bytes)
        {
            text.push_str(valid);
        } else {
            let cut_at_start = segment.offset != 0;
            let cut_at_end = segment.end() != sample.total_len();
            let mut decoder = candidate.codec.decoder(!cut_at_start);
            let mut consumed = 0;
            loop {
                let (step, read) = decoder.decode_step(&bytes[consumed..], &mut text, true);
                consumed += read;
                match step {
                    DecodeStep::InputEmpty => break,
                    DecodeStep::Malformed => {
                        let near_start = cut_at_start && consumed <= EDGE_TOLERANCE;
                        let near_end = cut_at_end && bytes.len() - consumed <= EDGE_TOLERANCE;
                        if !(near_start || near_end) {
                            errors += 1;
                            text.push('\u{FFFD}');
                        }
                        if consumed >= bytes.len() {
                            break;
                        }
                    }
                }
            }
        }
        chars += text[start..].chars().count();
    }

    trace!(
        "{}: {} chars, {} unforgiven errors",
        candidate.name, chars, errors
    );
    DecodeAttempt {
        candidate,
        text,
        errors,
        chars,
    }
}

/// UTF-16 variant suggested by NUL bytes at alternating positions of `head`.
///
/// ASCII-heavy UTF-16LE has NULs at odd offsets, UTF-16BE at even ones.
pub fn utf16_hint(head: &[u8]) -> Option<&'static CandidateEncoding> {
    let window = &head[..head.len().min(UTF16_WINDOW_LEN)];
    if window.len() < UTF16_WINDOW_MIN {
        return None;
    }
    let (mut even_nulls, mut odd_nulls) = (0usize, 0usize);
    for (i, &b) in window.iter().enumerate() {
        if b == 0 {
            if i % 2 == 0 {
                even_nulls += 1;
            } else {
                odd_nulls += 1;
            }
        }
    }
    let threshold = window.len() / 16;
    if odd_nulls > threshold && even_nulls < threshold / 2 {
        candidate("utf_16le")
    } else if even_nulls > threshold && odd_nulls < threshold / 2 {
        candidate("utf_16be")
    } else {
        None
    }
}

/// Candidates worth decoding for `sample`, in preference order.
pub fn plan_candidates(sample: &ByteSample) -> Vec<&'static CandidateEncoding> {
    if !sample.has_high_bytes() {
        // Every ASCII-compatible page decodes 7-bit input identically and loses the
        // tie-break, so only the escape-based scheme is worth a look.
        let escaped = sample.contains(ESC);
        return candidates()
            .iter()
            .filter(|c| matches!(c.name, "ascii" | "utf_8") || (escaped && c.name == "iso2022_jp"))
            .collect();
    }
    candidates()
        .iter()
        .filter(|c| c.name != "ascii" && !c.is_wide_unicode())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::SamplingParams;

    fn sample(data: &[u8]) -> ByteSample {
        ByteSample::from_bytes(data, &SamplingParams::default()).unwrap()
    }

    fn named(name: &str) -> &'static CandidateEncoding {
        candidate(name).unwrap()
    }

    #[test]
    fn test_strict_decode() {
        let attempt = decode_sample(&sample("héllo wörld".as_bytes()), named("utf_8"));
        assert!(attempt.is_strict());
        assert_eq!(attempt.text, "héllo wörld");
        assert_eq!(attempt.chars, 11);
    }

    #[test]
    fn test_errors_are_counted() {
        let attempt = decode_sample(&sample(b"caf\xe9 cr\xe8me"), named("utf_8"));
        assert_eq!(attempt.errors, 2);
        assert!(attempt.text.contains('\u{FFFD}'));
        assert!(!attempt.is_tolerable());

        let attempt = decode_sample(&sample(b"caf\xe9 cr\xe8me"), named("cp1252"));
        assert!(attempt.is_strict());
        assert_eq!(attempt.text, "café crème");
    }

    #[test]
    fn test_errors_at_inner_cuts_are_forgiven() {
        // Most cuts land inside a three-byte character.
        let text = "中文字符".repeat(20_000);
        let params = SamplingParams::new(30_000, 0.0, Some(30_000)).unwrap();
        let sample = ByteSample::from_bytes(text.as_bytes(), &params).unwrap();
        assert!(sample.segments().len() > 2);

        let attempt = decode_sample(&sample, named("utf_8"));
        assert_eq!(attempt.errors, 0);
    }

    #[test]
    fn test_truncated_file_end_is_an_error() {
        let attempt = decode_sample(&sample(b"abc\xe4\xb8"), named("utf_8"));
        assert_eq!(attempt.errors, 1);
    }

    #[test]
    fn test_utf16_hint() {
        let text = "hello world, this is a UTF-16 test";
        let le: Vec<u8> = text.encode_utf16().flat_map(u16::to_le_bytes).collect();
        let be: Vec<u8> = text.encode_utf16().flat_map(u16::to_be_bytes).collect();
        assert_eq!(utf16_hint(&le).map(|c| c.name), Some("utf_16le"));
        assert_eq!(utf16_hint(&be).map(|c| c.name), Some("utf_16be"));
        assert!(utf16_hint(text.as_bytes()).is_none());
        assert!(utf16_hint(&le[..10]).is_none());
    }

    #[test]
    fn test_plan_for_ascii_sample() {
        let names: Vec<_> = plan_candidates(&sample(b"plain text")).iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["ascii", "utf_8"]);

        let names: Vec<_> = plan_candidates(&sample(b"\x1b$B$3\x1b(B")).iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["ascii", "utf_8", "iso2022_jp"]);
    }

    #[test]
    fn test_plan_for_high_bytes() {
        let plan = plan_candidates(&sample("é".as_bytes()));
        assert_eq!(plan[0].name, "utf_8");
        assert!(plan.iter().all(|c| c.name != "ascii" && !c.is_wide_unicode()));
    }
}
