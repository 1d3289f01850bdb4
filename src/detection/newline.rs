//! Line-ending detection over raw sample bytes.

use crate::result::NewlineStyle;
use crate::sample::ByteSample;

/// Terminator counts of a sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NewlineCounts {
    pub lf: usize,
    pub crlf: usize,
    pub cr: usize,
}

impl NewlineCounts {
    /// Count terminators in one run of bytes.
    ///
    /// NUL bytes are skipped so UTF-16 and UTF-32 terminators read as their ASCII bytes.
    /// A CR in the last position counts only when `at_eof` is set; at an inner cut the
    /// next byte is unknown.
    pub fn count(&mut self, data: &[u8], at_eof: bool) {
        if !data.contains(&b'\r') {
            self.lf += bytecount::count(data, b'\n');
            return;
        }

        let mut pending_cr = false;
        for &b in data {
            match b {
                0 => {}
                b'\n' if pending_cr => {
                    self.crlf += 1;
                    pending_cr = false;
                }
                b'\n' => self.lf += 1,
                b'\r' => {
                    if pending_cr {
                        self.cr += 1;
                    }
                    pending_cr = true;
                }
                _ => {
                    if pending_cr {
                        self.cr += 1;
                        pending_cr = false;
                    }
                }
            }
        }
        if pending_cr && at_eof {
            self.cr += 1;
        }
    }

    /// Majority style. Ties prefer LF, then CRLF, then CR; no terminators means LF.
    pub fn style(&self) -> NewlineStyle {
        if self.lf >= self.crlf && self.lf >= self.cr {
            NewlineStyle::LF
        } else if self.crlf >= self.cr {
            NewlineStyle::CRLF
        } else {
            NewlineStyle::CR
        }
    }
}

/// Count terminators across every segment of `sample`.
pub fn count_newlines(sample: &ByteSample) -> NewlineCounts {
    let mut counts = NewlineCounts::default();
    for segment in sample.segments() {
        counts.count(&segment.bytes, segment.end() == sample.total_len());
    }
    counts
}

/// Detect the line-ending convention of `sample`.
pub fn detect_newline(sample: &ByteSample) -> NewlineStyle {
    count_newlines(sample).style()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::SamplingParams;

    fn detect(data: &[u8]) -> NewlineStyle {
        let sample = ByteSample::from_bytes(data, &SamplingParams::default()).unwrap();
        detect_newline(&sample)
    }

    #[test]
    fn test_detect_lf() {
        assert_eq!(detect(b"a\nb\nc\n"), NewlineStyle::LF);
    }

    #[test]
    fn test_detect_crlf() {
        assert_eq!(detect(b"a\r\nb\r\nc\r\n"), NewlineStyle::CRLF);
    }

    #[test]
    fn test_detect_cr() {
        assert_eq!(detect(b"a\rb\rc\r"), NewlineStyle::CR);
    }

    #[test]
    fn test_no_terminators_defaults_to_lf() {
        assert_eq!(detect(b"single line"), NewlineStyle::LF);
    }

    #[test]
    fn test_majority_wins() {
        let mut data = Vec::new();
        for _ in 0..70 {
            data.extend_from_slice(b"unix line\n");
        }
        for _ in 0..30 {
            data.extend_from_slice(b"dos line\r\n");
        }
        assert_eq!(detect(&data), NewlineStyle::LF);
    }

    #[test]
    fn test_ties() {
        assert_eq!(detect(b"a\nb\r\n"), NewlineStyle::LF);
        assert_eq!(detect(b"a\r\nb\r"), NewlineStyle::CRLF);
    }

    #[test]
    fn test_utf16_terminators() {
        let le: Vec<u8> = "one\r\ntwo\r\nthree"
            .encode_utf16()
            .flat_map(u16::to_le_bytes)
            .collect();
        assert_eq!(detect(&le), NewlineStyle::CRLF);

        let be: Vec<u8> = "one\rtwo\rthree"
            .encode_utf16()
            .flat_map(u16::to_be_bytes)
            .collect();
        assert_eq!(detect(&be), NewlineStyle::CR);
    }

    #[test]
    fn test_counts() {
        let mut counts = NewlineCounts::default();
        counts.count(b"a\r\r\nb\nc\r", false);
        assert_eq!(counts, NewlineCounts { lf: 1, crlf: 1, cr: 1 });
        counts.count(b"d\r", true);
        assert_eq!(counts.cr, 2);
    }
}
