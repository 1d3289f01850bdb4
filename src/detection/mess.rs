//! Mess analysis: how much decoded text looks like mojibake.
//!
//! Each detector sees every character once and reports a ratio. The mess score is their
//! clamped sum; lower is better.

use encoding_rs::{Encoding, WINDOWS_1252};
use foldhash::{HashMap, HashMapExt};

use super::script::{
    Script, is_accentuated, is_combining_mark, is_common_punctuation, is_unprintable,
};
use crate::codec::Codec;

/// Default score above which a decode is rejected.
pub const DEFAULT_MESS_THRESHOLD: f64 = 0.2;

/// Characters between early-exit checks.
const CHECKPOINT: usize = 16 * 1024;

const SUSPICIOUS_RANGE_MIN_CHARS: usize = 24;
const MIN_LETTERS: usize = 8;

/// Maps characters back to the single byte that produced them.
///
/// Mojibake is a byte-level accident, so some heuristics look at the bytes under the
/// decoded text. Decodes with a multi-byte candidate are viewed through Windows-1252, the
/// page most often involved in double encoding.
#[derive(Debug, Clone)]
pub struct ByteView {
    high: HashMap<char, u8>,
}

impl ByteView {
    /// View through a single-byte encoding.
    pub fn single_byte(encoding: &'static Encoding) -> Self {
        let mut high = HashMap::with_capacity(128);
        for byte in 0x80..=0xFFu8 {
            let single = [byte];
            let (decoded, had_errors) = encoding.decode_without_bom_handling(&single);
            if had_errors {
                continue;
            }
            if let Some(c) = decoded.chars().next() {
                high.insert(c, byte);
            }
        }
        Self { high }
    }

    /// View appropriate for text decoded with `codec`.
    pub fn for_codec(codec: Codec) -> Self {
        match codec {
            Codec::Web(encoding) if encoding.is_single_byte() => Self::single_byte(encoding),
            _ => Self::single_byte(WINDOWS_1252),
        }
    }

    /// Byte that `c` came from, if it came from a single byte.
    pub fn byte(&self, c: char) -> Option<u8> {
        if c.is_ascii() {
            Some(c as u8)
        } else {
            self.high.get(&c).copied()
        }
    }
}

impl Default for ByteView {
    fn default() -> Self {
        Self::single_byte(WINDOWS_1252)
    }
}

/// A single mess heuristic.
pub trait MessDetector {
    fn feed(&mut self, c: char);
    fn ratio(&self) -> f64;
}

fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

/// Control characters, replacement characters, private use and noncharacters.
#[derive(Default)]
struct Unprintable {
    hits: usize,
    chars: usize,
}

impl MessDetector for Unprintable {
    fn feed(&mut self, c: char) {
        self.chars += 1;
        if is_unprintable(c) {
            self.hits += 1;
        }
    }

    fn ratio(&self) -> f64 {
        8.0 * ratio(self.hits, self.chars)
    }
}

/// Non-ASCII symbols and punctuation outside the common typographic set.
#[derive(Default)]
struct Symbols {
    hits: usize,
    chars: usize,
}

impl MessDetector for Symbols {
    fn feed(&mut self, c: char) {
        self.chars += 1;
        if !c.is_ascii()
            && !c.is_alphanumeric()
            && !c.is_whitespace()
            && !is_combining_mark(c)
            && !is_common_punctuation(c)
            && !is_unprintable(c)
        {
            self.hits += 1;
        }
    }

    fn ratio(&self) -> f64 {
        let r = ratio(self.hits, self.chars);
        if r >= 0.3 { r } else { 0.0 }
    }
}

/// Accented Latin letters among all letters.
#[derive(Default)]
struct Accents {
    accented: usize,
    letters: usize,
}

impl MessDetector for Accents {
    fn feed(&mut self, c: char) {
        if c.is_alphabetic() {
            self.letters += 1;
            if is_accentuated(c) {
                self.accented += 1;
            }
        }
    }

    fn ratio(&self) -> f64 {
        if self.letters < MIN_LETTERS {
            return 0.0;
        }
        let r = ratio(self.accented, self.letters);
        if r >= 0.35 { r } else { 0.0 }
    }
}

/// Adjacent letters from scripts that never share a word.
#[derive(Default)]
struct SuspiciousRange {
    previous: Option<Script>,
    hits: usize,
    chars: usize,
}

impl MessDetector for SuspiciousRange {
    fn feed(&mut self, c: char) {
        self.chars += 1;
        if is_combining_mark(c) {
            return;
        }
        if !c.is_alphabetic() {
            self.previous = None;
            return;
        }
        let script = Script::of(c);
        if let Some(previous) = self.previous
            && !previous.is_compatible_with(script)
        {
            self.hits += 1;
        }
        self.previous = Some(script);
    }

    fn ratio(&self) -> f64 {
        if self.chars <= SUSPICIOUS_RANGE_MIN_CHARS {
            return 0.0;
        }
        2.0 * ratio(self.hits, self.chars)
    }
}

/// Byte-level confusions that leave recognisable traces.
///
/// * UTF-8 read as a single-byte page: a character on a UTF-8 lead byte followed by the
///   right number of characters on continuation bytes (`Ã©` in Windows-1252).
/// * Latin text read as a CJK multi-byte scheme: a single ideograph or halfwidth katakana
///   jammed between ASCII letters.
/// * Combining marks with nothing to combine with.
struct Mojibake {
    view: ByteView,
    continuations_needed: usize,
    before_previous: Option<char>,
    previous: Option<char>,
    hits: usize,
    chars: usize,
}

impl Mojibake {
    fn new(view: ByteView) -> Self {
        Self {
            view,
            continuations_needed: 0,
            before_previous: None,
            previous: None,
            hits: 0,
            chars: 0,
        }
    }

    fn utf8_continuations(lead: Option<u8>) -> usize {
        match lead {
            Some(0xC2..=0xDF) => 1,
            Some(0xE0..=0xEF) => 2,
            Some(0xF0..=0xF4) => 3,
            _ => 0,
        }
    }
}

impl MessDetector for Mojibake {
    fn feed(&mut self, c: char) {
        self.chars += 1;

        let byte = self.view.byte(c);
        let continuation = byte.is_some_and(|b| (0x80..=0xBF).contains(&b));
        if self.continuations_needed > 0 && continuation {
            self.continuations_needed -= 1;
            if self.continuations_needed == 0 {
                self.hits += 1;
            }
        } else {
            self.continuations_needed = Self::utf8_continuations(byte);
        }

        if let (Some(left), Some(middle)) = (self.before_previous, self.previous) {
            let script = Script::of(middle);
            if left.is_ascii_alphabetic()
                && c.is_ascii_alphabetic()
                && (script == Script::Han || script == Script::HalfwidthKatakana)
            {
                self.hits += 1;
            }
        }

        if is_combining_mark(c) && !self.previous.is_some_and(char::is_alphabetic) {
            self.hits += 1;
        }

        self.before_previous = self.previous;
        self.previous = Some(c);
    }

    fn ratio(&self) -> f64 {
        4.0 * ratio(self.hits, self.chars)
    }
}

/// Lower-to-upper flips inside a word that involve a non-ASCII letter.
#[derive(Default)]
struct CaseTransition {
    previous: Option<char>,
    hits: usize,
    letters: usize,
}

impl MessDetector for CaseTransition {
    fn feed(&mut self, c: char) {
        if !c.is_alphabetic() {
            self.previous = None;
            return;
        }
        self.letters += 1;
        if let Some(previous) = self.previous
            && previous.is_lowercase()
            && c.is_uppercase()
            && !(previous.is_ascii() && c.is_ascii())
        {
            self.hits += 1;
        }
        self.previous = Some(c);
    }

    fn ratio(&self) -> f64 {
        if self.letters < MIN_LETTERS {
            return 0.0;
        }
        2.0 * ratio(self.hits, self.letters)
    }
}

fn detectors(view: ByteView) -> Vec<Box<dyn MessDetector>> {
    vec![
        Box::<Unprintable>::default(),
        Box::<Symbols>::default(),
        Box::<Accents>::default(),
        Box::<SuspiciousRange>::default(),
        Box::new(Mojibake::new(view)),
        Box::<CaseTransition>::default(),
    ]
}

fn total(detectors: &[Box<dyn MessDetector>]) -> f64 {
    detectors.iter().map(|d| d.ratio()).sum::<f64>().clamp(0.0, 1.0)
}

/// Score how chaotic `text` looks, in `[0, 1]`, viewing its bytes through Windows-1252.
pub fn mess_ratio(text: &str, threshold: f64) -> f64 {
    mess_ratio_with(text, ByteView::default(), threshold)
}

/// Score how chaotic `text` looks, in `[0, 1]`.
///
/// Analysis stops early once a checkpoint already exceeds `threshold`; the returned score is
/// then the partial one, which is enough to reject the decode.
pub fn mess_ratio_with(text: &str, view: ByteView, threshold: f64) -> f64 {
    let mut detectors = detectors(view);
    for (i, c) in text.chars().enumerate() {
        for detector in detectors.iter_mut() {
            detector.feed(c);
        }
        if (i + 1) % CHECKPOINT == 0 {
            let score = total(&detectors);
            if score > threshold {
                return score;
            }
        }
    }
    total(&detectors)
}
