//! Candidate encodings and the languages they usually carry.

use std::sync::LazyLock;

use encoding_rs::{
    BIG5, EUC_JP, EUC_KR, GBK, IBM866, ISO_2022_JP, ISO_8859_2, ISO_8859_5, ISO_8859_6,
    ISO_8859_7, ISO_8859_8, ISO_8859_15, KOI8_R, KOI8_U, MACINTOSH, SHIFT_JIS, UTF_8, UTF_16BE,
    UTF_16LE, WINDOWS_874, WINDOWS_1250, WINDOWS_1251, WINDOWS_1252, WINDOWS_1253, WINDOWS_1254,
    WINDOWS_1255, WINDOWS_1256, WINDOWS_1257, WINDOWS_1258, X_MAC_CYRILLIC,
};

use crate::codec::Codec;
use crate::encoding::normalize_encoding_name;

/// Language family of an encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// Unicode transformation formats; any language.
    Unicode,
    Latin,
    Cyrillic,
    Greek,
    Arabic,
    Hebrew,
    Thai,
    Japanese,
    Chinese,
    Korean,
}

impl Family {
    /// Languages this family is expected to carry.
    pub fn languages(self) -> &'static [&'static str] {
        match self {
            Family::Unicode => &[],
            Family::Latin => &["Latin Based"],
            Family::Cyrillic => &["Russian", "Ukrainian", "Bulgarian", "Serbian"],
            Family::Greek => &["Greek"],
            Family::Arabic => &["Arabic", "Farsi"],
            Family::Hebrew => &["Hebrew"],
            Family::Thai => &["Thai"],
            Family::Japanese => &["Japanese"],
            Family::Chinese => &["Chinese"],
            Family::Korean => &["Korean"],
        }
    }

    /// Whether coherence should pick languages by alphabet coverage instead of by family.
    pub fn is_open(self) -> bool {
        matches!(self, Family::Unicode | Family::Latin)
    }
}

/// A candidate encoding with its static metadata.
#[derive(Debug, Clone, Copy)]
pub struct CandidateEncoding {
    /// Canonical name.
    pub name: &'static str,
    pub codec: Codec,
    pub multi_byte: bool,
    pub bom: Option<&'static [u8]>,
    pub family: Family,
}

impl CandidateEncoding {
    const fn single(name: &'static str, encoding: &'static encoding_rs::Encoding, family: Family) -> Self {
        Self {
            name,
            codec: Codec::Web(encoding),
            multi_byte: false,
            bom: None,
            family,
        }
    }

    const fn multi(name: &'static str, encoding: &'static encoding_rs::Encoding, family: Family) -> Self {
        Self {
            name,
            codec: Codec::Web(encoding),
            multi_byte: true,
            bom: None,
            family,
        }
    }

    /// Whether this is one of the UTF-16/UTF-32 variants.
    pub fn is_wide_unicode(&self) -> bool {
        matches!(self.name, "utf_16le" | "utf_16be" | "utf_32le" | "utf_32be")
    }
}

/// All candidates in tie-break preference order.
static CANDIDATES: LazyLock<Vec<CandidateEncoding>> = LazyLock::new(|| {
    use Family::*;
    vec![
        CandidateEncoding {
            name: "ascii",
            codec: Codec::Ascii,
            multi_byte: false,
            bom: None,
            family: Unicode,
        },
        CandidateEncoding {
            name: "utf_8",
            codec: Codec::Web(UTF_8),
            multi_byte: true,
            bom: Some(&[0xEF, 0xBB, 0xBF]),
            family: Unicode,
        },
        // Latin single-byte pages
        CandidateEncoding::single("cp1252", WINDOWS_1252, Latin),
        CandidateEncoding::single("iso8859_15", ISO_8859_15, Latin),
        CandidateEncoding::single("cp1250", WINDOWS_1250, Latin),
        CandidateEncoding::single("iso8859_2", ISO_8859_2, Latin),
        CandidateEncoding::single("cp1254", WINDOWS_1254, Latin),
        CandidateEncoding::single("cp1257", WINDOWS_1257, Latin),
        CandidateEncoding::single("cp1258", WINDOWS_1258, Latin),
        CandidateEncoding::single("mac_roman", MACINTOSH, Latin),
        // Other single-byte pages
        CandidateEncoding::single("cp1251", WINDOWS_1251, Cyrillic),
        CandidateEncoding::single("koi8_r", KOI8_R, Cyrillic),
        CandidateEncoding::single("koi8_u", KOI8_U, Cyrillic),
        CandidateEncoding::single("mac_cyrillic", X_MAC_CYRILLIC, Cyrillic),
        CandidateEncoding::single("iso8859_5", ISO_8859_5, Cyrillic),
        CandidateEncoding::single("cp866", IBM866, Cyrillic),
        CandidateEncoding::single("cp1253", WINDOWS_1253, Greek),
        CandidateEncoding::single("iso8859_7", ISO_8859_7, Greek),
        CandidateEncoding::single("cp1256", WINDOWS_1256, Arabic),
        CandidateEncoding::single("iso8859_6", ISO_8859_6, Arabic),
        CandidateEncoding::single("cp1255", WINDOWS_1255, Hebrew),
        CandidateEncoding::single("iso8859_8", ISO_8859_8, Hebrew),
        CandidateEncoding::single("cp874", WINDOWS_874, Thai),
        // Multi-byte legacy pages
        CandidateEncoding::multi("shift_jis", SHIFT_JIS, Japanese),
        CandidateEncoding::multi("euc_jp", EUC_JP, Japanese),
        CandidateEncoding::multi("iso2022_jp", ISO_2022_JP, Japanese),
        CandidateEncoding::multi("gbk", GBK, Chinese),
        CandidateEncoding::multi("big5", BIG5, Chinese),
        CandidateEncoding::multi("cp949", EUC_KR, Korean),
        // Wide Unicode, only reachable through a BOM or the NUL-parity hint
        CandidateEncoding {
            name: "utf_16le",
            codec: Codec::Web(UTF_16LE),
            multi_byte: true,
            bom: Some(&[0xFF, 0xFE]),
            family: Unicode,
        },
        CandidateEncoding {
            name: "utf_16be",
            codec: Codec::Web(UTF_16BE),
            multi_byte: true,
            bom: Some(&[0xFE, 0xFF]),
            family: Unicode,
        },
        CandidateEncoding {
            name: "utf_32le",
            codec: Codec::Utf32 { big_endian: false },
            multi_byte: true,
            bom: Some(&[0xFF, 0xFE, 0x00, 0x00]),
            family: Unicode,
        },
        CandidateEncoding {
            name: "utf_32be",
            codec: Codec::Utf32 { big_endian: true },
            multi_byte: true,
            bom: Some(&[0x00, 0x00, 0xFE, 0xFF]),
            family: Unicode,
        },
    ]
});

/// Legacy code pages that are recognised by name but not decoded.
const LEGACY_LANGUAGES: &[(&str, &[&str])] = &[
    ("cp864", &["Arabic", "Farsi"]),
    ("cp720", &["Arabic", "Farsi"]),
    ("cp862", &["Hebrew"]),
    ("cp424", &["Hebrew"]),
    ("cp856", &["Hebrew"]),
    ("cp737", &["Greek"]),
    ("cp869", &["Greek"]),
    ("cp875", &["Greek"]),
    ("mac_greek", &["Greek"]),
    ("cp855", &["Russian", "Ukrainian", "Bulgarian", "Serbian"]),
    ("cp1125", &["Russian", "Ukrainian", "Bulgarian", "Serbian"]),
    ("cp857", &["Latin Based"]),
    ("cp273", &["Latin Based"]),
    ("cp437", &["Latin Based"]),
    ("cp500", &["Latin Based"]),
    ("cp037", &["Latin Based"]),
    ("cp850", &["Latin Based"]),
    ("cp852", &["Latin Based"]),
    ("cp858", &["Latin Based"]),
    ("cp1026", &["Latin Based"]),
    ("cp1140", &["Latin Based"]),
    ("latin_1", &["Latin Based"]),
    ("tis_620", &["Thai"]),
];

/// All candidate encodings, in tie-break preference order.
pub fn candidates() -> &'static [CandidateEncoding] {
    &CANDIDATES
}

/// Look up a candidate by canonical name.
pub fn candidate(name: &str) -> Option<&'static CandidateEncoding> {
    CANDIDATES.iter().find(|c| c.name == name)
}

/// Position of a candidate in the preference order.
pub fn preference(name: &str) -> usize {
    CANDIDATES
        .iter()
        .position(|c| c.name == name)
        .unwrap_or(CANDIDATES.len())
}

/// Languages an encoding is usually associated with.
///
/// Unicode encodings carry no specific language and return an empty list. Unknown
/// single-byte pages default to "Latin Based".
///
/// ```
/// use charset_nose::encoding_languages;
///
/// assert_eq!(encoding_languages("cp1256"), vec!["Arabic", "Farsi"]);
/// assert_eq!(encoding_languages("mac_greek"), vec!["Greek"]);
/// ```
pub fn encoding_languages(name: &str) -> Vec<&'static str> {
    let name = normalize_encoding_name(name);
    if let Some(candidate) = candidate(&name) {
        return candidate.family.languages().to_vec();
    }
    if let Some((_, languages)) = LEGACY_LANGUAGES.iter().find(|(n, _)| *n == name) {
        return languages.to_vec();
    }
    if let Some(family) = multi_byte_family(&name) {
        return family.languages().to_vec();
    }
    if name.starts_with("utf") {
        return Vec::new();
    }
    vec!["Latin Based"]
}

/// Family of a multi-byte encoding not present in the candidate table.
fn multi_byte_family(name: &str) -> Option<Family> {
    if name.starts_with("shift_") || name.starts_with("euc_j") || name.starts_with("iso2022_jp")
    {
        Some(Family::Japanese)
    } else if name.starts_with("gb") || name.starts_with("hz") || name.starts_with("big5") {
        Some(Family::Chinese)
    } else if name == "johab" || name.starts_with("iso2022_kr") || name.starts_with("euc_kr") {
        Some(Family::Korean)
    } else {
        None
    }
}

/// Whether the named encoding uses more than one byte for some characters.
pub fn is_multi_byte_encoding(name: &str) -> bool {
    let name = normalize_encoding_name(name);
    match candidate(&name) {
        Some(candidate) => candidate.multi_byte,
        None => {
            multi_byte_family(&name).is_some()
                || matches!(name.as_str(), "utf_8_sig" | "utf_16" | "utf_32")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preference_order() {
        assert_eq!(candidates()[0].name, "ascii");
        assert_eq!(candidates()[1].name, "utf_8");
        assert!(preference("cp1252") < preference("cp1251"));
        assert!(preference("cp1251") < preference("shift_jis"));
        assert_eq!(preference("no_such_encoding"), candidates().len());
    }

    #[test]
    fn test_names_are_unique_and_canonical() {
        for (i, c) in candidates().iter().enumerate() {
            assert_eq!(normalize_encoding_name(c.name), c.name);
            assert_eq!(preference(c.name), i);
        }
    }

    #[test]
    fn test_encoding_languages() {
        assert_eq!(encoding_languages("cp864"), vec!["Arabic", "Farsi"]);
        assert_eq!(encoding_languages("cp862"), vec!["Hebrew"]);
        assert_eq!(encoding_languages("cp737"), vec!["Greek"]);
        assert_eq!(encoding_languages("cp424"), vec!["Hebrew"]);
        assert_eq!(encoding_languages("cp273"), vec!["Latin Based"]);
        assert_eq!(encoding_languages("johab"), vec!["Korean"]);
        assert_eq!(encoding_languages("shift_jis"), vec!["Japanese"]);
        assert_eq!(encoding_languages("mac_greek"), vec!["Greek"]);
        assert_eq!(encoding_languages("iso2022_jp"), vec!["Japanese"]);
        assert_eq!(encoding_languages("windows-1251")[0], "Russian");
        assert!(encoding_languages("utf-8").is_empty());
    }

    #[test]
    fn test_is_multi_byte_encoding() {
        assert!(is_multi_byte_encoding("utf_8"));
        assert!(is_multi_byte_encoding("Shift-JIS"));
        assert!(is_multi_byte_encoding("johab"));
        assert!(!is_multi_byte_encoding("cp1252"));
        assert!(!is_multi_byte_encoding("ascii"));
    }
}
