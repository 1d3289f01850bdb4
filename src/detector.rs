//! Detector builder and detection entry points.

use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek};
use std::path::Path;

use log::debug;

use crate::candidates::{CandidateEncoding, preference};
use crate::detection::decode::{decode_sample, plan_candidates, utf16_hint};
use crate::detection::mess::DEFAULT_MESS_THRESHOLD;
use crate::detection::newline::detect_newline;
use crate::detection::score::{chardetng_hint, rank, score_attempt};
use crate::encoding::sniff_bom;
use crate::error::{CharsetError, Result};
use crate::result::{AnalysisResult, CharsetMatches, Match, NewlineStyle};
use crate::sample::{ByteSample, SamplingParams};

/// Charset and newline detector.
///
/// # Example
///
/// ```no_run
/// use charset_nose::{Detector, SamplingParams};
///
/// let mut detector = Detector::new();
/// detector
///     .sampling(SamplingParams::default())
///     .threshold(0.2);
///
/// let matches = detector.detect_path("notes.txt").unwrap();
/// println!("Encoding: {}", matches.best().encoding);
///
/// let result = detector.analyse_path("notes.txt").unwrap();
/// println!("Newlines: {}", result.newlines);
/// ```
#[derive(Debug, Clone)]
pub struct Detector {
    /// How much of the source to read.
    sampling: SamplingParams,
    /// Mess score above which a decode is rejected.
    threshold: f64,
}

impl Default for Detector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector {
    /// Create a new Detector with default settings.
    pub fn new() -> Self {
        Self {
            sampling: SamplingParams::default(),
            threshold: DEFAULT_MESS_THRESHOLD,
        }
    }

    /// Set the sampling parameters.
    pub fn sampling(&mut self, sampling: SamplingParams) -> &mut Self {
        self.sampling = sampling;
        self
    }

    /// Set the mess threshold.
    pub fn threshold(&mut self, threshold: f64) -> &mut Self {
        self.threshold = threshold;
        self
    }

    /// Detect the encoding of the file at `path`.
    pub fn detect_path<P: AsRef<Path>>(&self, path: P) -> Result<CharsetMatches> {
        let reader = open_source(path.as_ref())?;
        self.detect_reader(reader)
    }

    /// Detect the encoding of a seekable reader.
    pub fn detect_reader<R: Read + Seek>(&self, mut reader: R) -> Result<CharsetMatches> {
        let sample = ByteSample::capture(&mut reader, &self.sampling)?;
        self.detect_sample(&sample)
    }

    /// Detect the encoding of an in-memory buffer.
    pub fn detect_bytes(&self, data: &[u8]) -> Result<CharsetMatches> {
        let sample = ByteSample::from_bytes(data, &self.sampling)?;
        self.detect_sample(&sample)
    }

    /// Detect encoding and newline style of the file at `path`.
    pub fn analyse_path<P: AsRef<Path>>(&self, path: P) -> Result<AnalysisResult> {
        let reader = open_source(path.as_ref())?;
        self.analyse_reader(reader)
    }

    /// Full ranking plus newline style of the file at `path`.
    pub fn inspect_path<P: AsRef<Path>>(&self, path: P) -> Result<(CharsetMatches, NewlineStyle)> {
        let reader = open_source(path.as_ref())?;
        self.inspect_reader(reader)
    }

    /// Full ranking plus newline style of a seekable reader.
    pub fn inspect_reader<R: Read + Seek>(
        &self,
        mut reader: R,
    ) -> Result<(CharsetMatches, NewlineStyle)> {
        let sample = ByteSample::capture(&mut reader, &self.sampling)?;
        let matches = self.detect_sample(&sample)?;
        Ok((matches, detect_newline(&sample)))
    }

    /// Detect encoding and newline style of a seekable reader.
    pub fn analyse_reader<R: Read + Seek>(&self, mut reader: R) -> Result<AnalysisResult> {
        let sample = ByteSample::capture(&mut reader, &self.sampling)?;
        let matches = self.detect_sample(&sample)?;
        let newlines = detect_newline(&sample);
        Ok(AnalysisResult::new(matches.best().encoding, newlines))
    }

    /// Rank candidate encodings for an already captured sample.
    pub fn detect_sample(&self, sample: &ByteSample) -> Result<CharsetMatches> {
        if let Some((name, len)) = sniff_bom(sample.head()) {
            debug!("{len}-byte BOM identifies {name}");
            return CharsetMatches::new(vec![bom_match(name)]).ok_or(CharsetError::Undecodable);
        }

        let hint = chardetng_hint(sample);
        debug!(
            "sample of {} bytes from {} (complete: {}), chardetng hint {:?}",
            sample.len(),
            sample.total_len(),
            sample.is_complete(),
            hint
        );

        if let Some(utf16) = utf16_hint(sample.head()) {
            let attempt = decode_sample(sample, utf16);
            if attempt.is_strict() {
                let matches = vec![score_attempt(&attempt, self.threshold, hint)];
                return CharsetMatches::new(rank(matches, self.threshold))
                    .ok_or(CharsetError::Undecodable);
            }
            debug!("NUL pattern suggests {}, but it does not decode", utf16.name);
        }

        let mut strict = Vec::new();
        let mut tolerable = Vec::new();
        let mut least_bad: Option<(&'static CandidateEncoding, f64)> = None;

        for candidate in plan_candidates(sample) {
            let attempt = decode_sample(sample, candidate);
            if attempt.is_strict() {
                strict.push(score_attempt(&attempt, self.threshold, hint));
            } else if attempt.is_tolerable() {
                if strict.is_empty() {
                    tolerable.push(score_attempt(&attempt, self.threshold, hint));
                }
            } else {
                let ratio = attempt.error_ratio();
                debug!("{}: pervasive failure ({:.3} error ratio)", candidate.name, ratio);
                if least_bad.is_none_or(|(_, best)| ratio < best) {
                    least_bad = Some((candidate, ratio));
                }
            }
        }

        let matches = if !strict.is_empty() {
            strict
        } else if !tolerable.is_empty() {
            debug!("no strict decode; keeping {} tolerable attempts", tolerable.len());
            tolerable
        } else if let Some((candidate, _)) = least_bad {
            debug!("no tolerable decode; falling back to {}", candidate.name);
            let attempt = decode_sample(sample, candidate);
            vec![score_attempt(&attempt, self.threshold, hint)]
        } else {
            return Err(CharsetError::Undecodable);
        };

        CharsetMatches::new(rank(matches, self.threshold)).ok_or(CharsetError::Undecodable)
    }
}

fn bom_match(encoding: &'static str) -> Match {
    Match {
        encoding,
        mess: 0.0,
        coherence: 1.0,
        languages: Vec::new(),
        bom: true,
        hinted: false,
        errors: 0,
        preference: preference(encoding),
    }
}

/// Open a source file, mapping a missing path or a directory to input errors.
pub(crate) fn open_source(path: &Path) -> Result<BufReader<File>> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => CharsetError::NotFound(path.to_path_buf()),
        _ => CharsetError::Io(e),
    })?;
    if metadata.is_dir() {
        return Err(CharsetError::IsDirectory(path.to_path_buf()));
    }
    Ok(BufReader::new(File::open(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detector_builder() {
        let params = SamplingParams::new(4096, 5.0, Some(8192)).unwrap();
        let mut detector = Detector::new();
        detector.sampling(params).threshold(0.3);

        assert_eq!(detector.sampling, params);
        assert_eq!(detector.threshold, 0.3);
    }

    #[test]
    fn test_detect_ascii() {
        let matches = Detector::new().detect_bytes(b"Hello, World!\n").unwrap();
        assert_eq!(matches.best().encoding, "ascii");
        assert!(!matches.best().bom);
    }

    #[test]
    fn test_detect_utf8() {
        let text = "Voilà l'été: naïve café, crème brûlée et façade. ".repeat(10);
        let matches = Detector::new().detect_bytes(text.as_bytes()).unwrap();
        assert_eq!(matches.best().encoding, "utf_8");
    }

    #[test]
    fn test_detect_bom() {
        let data = [0xEF, 0xBB, 0xBF, b'H', b'i'];
        let matches = Detector::new().detect_bytes(&data).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches.best().encoding, "utf_8");
        assert!(matches.best().bom);
        assert_eq!(matches.best().mess, 0.0);
        assert_eq!(matches.best().coherence, 1.0);
    }

    #[test]
    fn test_detect_utf16_without_bom() {
        let data: Vec<u8> = "Plain text stored as UTF-16 without a byte order mark.\n"
            .encode_utf16()
            .flat_map(u16::to_le_bytes)
            .collect();
        let matches = Detector::new().detect_bytes(&data).unwrap();
        assert_eq!(matches.best().encoding, "utf_16le");
    }

    #[test]
    fn test_detect_empty() {
        let result = Detector::new().detect_bytes(b"");
        assert!(matches!(result, Err(CharsetError::EmptyInput)));
    }

    #[test]
    fn test_analyse_reader() {
        let data = "line one\r\nline two\r\n";
        let result = Detector::new()
            .analyse_reader(std::io::Cursor::new(data.as_bytes()))
            .unwrap();
        assert_eq!(result.encoding, "ascii");
        assert_eq!(result.newlines, NewlineStyle::CRLF);
    }
}
