//! Statistical charset detection.
//!
//! Decoding a sample under every plausible candidate is cheap; telling the decodes apart is
//! the hard part. The mess analyzer rejects decodes that look like mojibake and the coherence
//! analyzer prefers those whose letters rank like a real language.

pub mod coherence;
pub mod decode;
pub mod frequencies;
pub mod mess;
pub mod newline;
pub mod score;
pub mod script;

pub use coherence::{coherence_ratio, filter_alt_coherence_matches};
pub use decode::{DecodeAttempt, decode_sample};
pub use mess::{ByteView, DEFAULT_MESS_THRESHOLD, mess_ratio, mess_ratio_with};
pub use newline::detect_newline;
