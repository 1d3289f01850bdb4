use std::fmt;
use std::str::FromStr;

use crate::error::{CharsetError, Result};

/// Line-ending convention.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NewlineStyle {
    /// `\n`
    #[default]
    LF,
    /// `\r\n`
    CRLF,
    /// `\r`
    CR,
}

impl NewlineStyle {
    /// Returns the terminator bytes (ASCII, before any target encoding).
    pub const fn as_bytes(&self) -> &'static [u8] {
        match self {
            NewlineStyle::LF => b"\n",
            NewlineStyle::CRLF => b"\r\n",
            NewlineStyle::CR => b"\r",
        }
    }

    /// Returns the terminator as text.
    pub const fn as_str(&self) -> &'static str {
        match self {
            NewlineStyle::LF => "\n",
            NewlineStyle::CRLF => "\r\n",
            NewlineStyle::CR => "\r",
        }
    }

    /// Returns the conventional name (`LF`, `CRLF` or `CR`).
    pub const fn name(&self) -> &'static str {
        match self {
            NewlineStyle::LF => "LF",
            NewlineStyle::CRLF => "CRLF",
            NewlineStyle::CR => "CR",
        }
    }
}

impl FromStr for NewlineStyle {
    type Err = CharsetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim_matches(' ') {
            "\n" => return Ok(NewlineStyle::LF),
            "\r\n" => return Ok(NewlineStyle::CRLF),
            "\r" => return Ok(NewlineStyle::CR),
            _ => {}
        }
        match s.trim().to_ascii_lowercase().as_str() {
            "lf" | "\\n" => Ok(NewlineStyle::LF),
            "crlf" | "\\r\\n" => Ok(NewlineStyle::CRLF),
            "cr" | "\\r" => Ok(NewlineStyle::CR),
            _ => Err(CharsetError::InvalidNewline(s.to_string())),
        }
    }
}

impl fmt::Display for NewlineStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A candidate encoding that survived detection, with its scores.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    /// Canonical encoding name.
    pub encoding: &'static str,
    /// Mess score in `[0, 1]`; lower is better.
    pub mess: f64,
    /// Best coherence ratio in `[0, 1]`; higher is better.
    pub coherence: f64,
    /// Languages that matched, best first.
    pub languages: Vec<String>,
    /// The encoding was identified by its byte-order mark.
    pub bom: bool,
    /// chardetng guessed this encoding.
    pub hinted: bool,
    /// Malformed sequences seen while decoding the sample.
    pub errors: usize,
    pub(crate) preference: usize,
}

impl Match {
    /// Most likely language, or `"Unknown"`.
    pub fn language(&self) -> &str {
        self.languages.first().map_or("Unknown", String::as_str)
    }
}

/// Ranked, non-empty detection results.
#[derive(Debug, Clone, PartialEq)]
pub struct CharsetMatches {
    matches: Vec<Match>,
}

impl CharsetMatches {
    /// Wrap ranked matches. Returns `None` if there are none.
    pub(crate) fn new(matches: Vec<Match>) -> Option<Self> {
        if matches.is_empty() {
            None
        } else {
            Some(Self { matches })
        }
    }

    /// The best match.
    pub fn best(&self) -> &Match {
        &self.matches[0]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Match> {
        self.matches.iter()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl<'a> IntoIterator for &'a CharsetMatches {
    type Item = &'a Match;
    type IntoIter = std::slice::Iter<'a, Match>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.iter()
    }
}

/// Detected encoding and line-ending style of a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    /// Canonical encoding name.
    pub encoding: String,
    pub newlines: NewlineStyle,
}

impl AnalysisResult {
    pub fn new(encoding: impl Into<String>, newlines: NewlineStyle) -> Self {
        Self {
            encoding: encoding.into(),
            newlines,
        }
    }
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "encoding={}, newlines={}", self.encoding, self.newlines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_match(encoding: &'static str, languages: &[&str]) -> Match {
        Match {
            encoding,
            mess: 0.0,
            coherence: 0.5,
            languages: languages.iter().map(|s| s.to_string()).collect(),
            bom: false,
            hinted: false,
            errors: 0,
            preference: 0,
        }
    }

    #[test]
    fn test_newline_from_str() {
        assert_eq!("LF".parse::<NewlineStyle>().unwrap(), NewlineStyle::LF);
        assert_eq!("crlf".parse::<NewlineStyle>().unwrap(), NewlineStyle::CRLF);
        assert_eq!("Cr".parse::<NewlineStyle>().unwrap(), NewlineStyle::CR);
        assert_eq!("\r\n".parse::<NewlineStyle>().unwrap(), NewlineStyle::CRLF);
        assert_eq!("\\n".parse::<NewlineStyle>().unwrap(), NewlineStyle::LF);

        let err = "LFCR".parse::<NewlineStyle>().unwrap_err();
        assert!(matches!(err, CharsetError::InvalidNewline(ref s) if s == "LFCR"));
    }

    #[test]
    fn test_newline_bytes_and_display() {
        assert_eq!(NewlineStyle::CRLF.as_bytes(), b"\r\n");
        assert_eq!(NewlineStyle::CR.as_str(), "\r");
        assert_eq!(NewlineStyle::LF.to_string(), "LF");
        assert_eq!(NewlineStyle::default(), NewlineStyle::LF);
    }

    #[test]
    fn test_charset_matches() {
        assert!(CharsetMatches::new(Vec::new()).is_none());

        let matches = CharsetMatches::new(vec![
            sample_match("utf_8", &["English"]),
            sample_match("cp1252", &[]),
        ])
        .unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches.best().encoding, "utf_8");
        assert_eq!(matches.best().language(), "English");
        let names: Vec<_> = matches.iter().map(|m| m.encoding).collect();
        assert_eq!(names, vec!["utf_8", "cp1252"]);
        assert_eq!((&matches).into_iter().nth(1).unwrap().language(), "Unknown");
    }

    #[test]
    fn test_analysis_result_display() {
        let result = AnalysisResult::new("cp1252", NewlineStyle::CRLF);
        assert_eq!(result.to_string(), "encoding=cp1252, newlines=CRLF");
    }
}
