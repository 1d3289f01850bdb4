//! Encoding names, aliases and byte-level helpers.
//!
//! Names are canonicalised to Python codec spelling (`utf_8`, `cp1252`, `shift_jis`), which
//! is what detection reports. Input names are case-insensitive and treat `-`, `_`, `.` and
//! spaces as the same separator.

use std::sync::LazyLock;

use encoding_rs::{Encoding, GB18030, REPLACEMENT, UTF_8, UTF_16LE, WINDOWS_1252};
use regex::Regex;
use simdutf8::basic::from_utf8;

use crate::candidates::{candidate, candidates};
use crate::codec::Codec;
use crate::error::{CharsetError, Result};

/// Code-page spellings such as `windows_1252`, `cp_1251`, `ibm866` or `ms932`.
static CODE_PAGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:cp|windows|win|ibm|ms)_?(\d{3,5})$").expect("Invalid code page pattern")
});

/// Check if the given bytes are valid UTF-8.
///
/// Uses SIMD-accelerated validation for performance.
pub fn is_utf8(data: &[u8]) -> bool {
    from_utf8(data).is_ok()
}

fn fold_separators(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' | '.' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Fixed alias table. Input must already be separator-folded.
fn alias(name: &str) -> Option<&'static str> {
    let canonical = match name {
        "utf_8" | "utf8" | "u8" | "utf" | "cp65001" => "utf_8",
        "utf_8_sig" | "utf8_sig" => "utf_8_sig",
        "utf_16" | "utf16" => "utf_16",
        "utf_16le" | "utf_16_le" | "utf16le" | "utf16_le" => "utf_16le",
        "utf_16be" | "utf_16_be" | "utf16be" | "utf16_be" => "utf_16be",
        "utf_32" | "utf32" => "utf_32",
        "utf_32le" | "utf_32_le" | "utf32le" | "utf32_le" => "utf_32le",
        "utf_32be" | "utf_32_be" | "utf32be" | "utf32_be" => "utf_32be",
        "ascii" | "us_ascii" | "646" | "ansi_x3_4_1968" | "cp367" => "ascii",
        "latin_1" | "latin1" | "l1" | "iso_8859_1" | "iso8859_1" | "8859" | "cp819"
        | "iso_ir_100" => "latin_1",
        "iso_8859_2" | "iso8859_2" | "latin_2" | "latin2" | "l2" => "iso8859_2",
        "iso_8859_5" | "iso8859_5" | "cyrillic" => "iso8859_5",
        "iso_8859_6" | "iso8859_6" | "arabic" => "iso8859_6",
        "iso_8859_7" | "iso8859_7" | "greek" | "greek8" => "iso8859_7",
        "iso_8859_8" | "iso8859_8" | "hebrew" => "iso8859_8",
        "iso_8859_15" | "iso8859_15" | "latin_9" | "latin9" | "l9" => "iso8859_15",
        "cp1250" => "cp1250",
        "cp1251" => "cp1251",
        "cp1252" => "cp1252",
        "cp1253" => "cp1253",
        "cp1254" => "cp1254",
        "cp1255" => "cp1255",
        "cp1256" => "cp1256",
        "cp1257" => "cp1257",
        "cp1258" => "cp1258",
        "cp866" => "cp866",
        "cp874" => "cp874",
        "cp949" => "cp949",
        "euc_kr" | "euckr" | "uhc" | "ks_c_5601_1987" | "ksc5601" | "korean" => "cp949",
        "shift_jis" | "shift_jis_2004" | "shiftjis" | "sjis" | "s_jis" | "cp932"
        | "windows_31j" => "shift_jis",
        "euc_jp" | "eucjp" | "ujis" | "u_jis" => "euc_jp",
        "iso2022_jp" | "iso_2022_jp" | "csiso2022jp" => "iso2022_jp",
        "gbk" | "gb2312" | "gb_2312" | "gb2312_1980" | "cp936" | "euc_cn" | "chinese" => "gbk",
        "gb18030" | "gb18030_2000" => "gb18030",
        "big5" | "big_5" | "big5_tw" | "csbig5" | "cp950" => "big5",
        "mac_roman" | "macroman" | "macintosh" => "mac_roman",
        "mac_cyrillic" | "maccyrillic" | "x_mac_cyrillic" => "mac_cyrillic",
        "koi8_r" | "koi8r" => "koi8_r",
        "koi8_u" | "koi8u" => "koi8_u",
        "tis_620" | "tis620" => "cp874",
        _ => return None,
    };
    Some(canonical)
}

/// Normalize an encoding name to its canonical spelling.
///
/// Unrecognized names are returned separator-folded and lowercased.
///
/// ```
/// use charset_nose::normalize_encoding_name;
///
/// assert_eq!(normalize_encoding_name("UTF-8"), "utf_8");
/// assert_eq!(normalize_encoding_name("windows-1252"), "cp1252");
/// assert_eq!(normalize_encoding_name("Latin-1"), "latin_1");
/// ```
pub fn normalize_encoding_name(name: &str) -> String {
    let folded = fold_separators(name);
    if let Some(canonical) = alias(&folded) {
        return canonical.to_string();
    }
    if let Some(caps) = CODE_PAGE_PATTERN.captures(&folded) {
        let code_page = format!("cp{}", &caps[1]);
        return alias(&code_page).map_or(code_page, str::to_string);
    }
    folded
}

/// Whether two names denote the same canonical codec.
pub fn is_equivalent(a: &str, b: &str) -> bool {
    normalize_encoding_name(a) == normalize_encoding_name(b)
}

/// A target or source encoding resolved to a codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEncoding {
    /// Canonical name.
    pub name: String,
    /// Codec implementing it.
    pub codec: Codec,
    /// Whether output in this encoding starts with a BOM.
    pub write_bom: bool,
}

/// Resolve an encoding name to a codec.
///
/// The alias table and candidate table are consulted first. Anything else is handed to
/// `encoding_rs`'s WHATWG label lookup, and fails there if unsupported.
pub fn resolve_encoding(name: &str) -> Result<ResolvedEncoding> {
    let canonical = normalize_encoding_name(name);
    let resolved = |codec: Codec, write_bom: bool| ResolvedEncoding {
        name: canonical.clone(),
        codec,
        write_bom,
    };

    match canonical.as_str() {
        "utf_8_sig" => return Ok(resolved(Codec::Web(UTF_8), true)),
        "utf_16" => return Ok(resolved(Codec::Web(UTF_16LE), true)),
        "utf_32" => return Ok(resolved(Codec::Utf32 { big_endian: false }, true)),
        // encoding_rs follows WHATWG and decodes ISO-8859-1 as windows-1252.
        "latin_1" => return Ok(resolved(Codec::Web(WINDOWS_1252), false)),
        "gb18030" => return Ok(resolved(Codec::Web(GB18030), false)),
        _ => {}
    }

    if let Some(candidate) = candidate(&canonical) {
        return Ok(resolved(candidate.codec, false));
    }

    let label = canonical.replace('_', "-");
    let encoding = Encoding::for_label(label.as_bytes())
        .or_else(|| Encoding::for_label(name.trim().as_bytes()))
        .filter(|&e| e != REPLACEMENT)
        .ok_or_else(|| CharsetError::UnsupportedEncoding(name.to_string()))?;

    Ok(ResolvedEncoding {
        name: canonical_name_for(encoding),
        codec: Codec::Web(encoding),
        write_bom: false,
    })
}

/// Canonical name for an `encoding_rs` encoding.
pub fn canonical_name_for(encoding: &'static Encoding) -> String {
    candidates()
        .iter()
        .find(|c| c.codec == Codec::Web(encoding))
        .map_or_else(
            || normalize_encoding_name(encoding.name()),
            |c| c.name.to_string(),
        )
}

/// Check the sample head for a Unicode BOM, longest signature first.
///
/// Returns the canonical name and the BOM length.
pub fn sniff_bom(data: &[u8]) -> Option<(&'static str, usize)> {
    candidates()
        .iter()
        .filter_map(|c| c.bom.map(|bom| (c.name, bom)))
        .filter(|(_, bom)| data.starts_with(bom))
        .max_by_key(|(_, bom)| bom.len())
        .map(|(name, bom)| (name, bom.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_utf8() {
        assert!(is_utf8(b"Hello, World!"));
        assert!(is_utf8("こんにちは".as_bytes()));
        assert!(is_utf8(b""));
        assert!(!is_utf8(&[0xFF, 0xFE]));
        assert!(!is_utf8(&[0x80, 0x81, 0x82]));
    }

    #[test]
    fn test_normalize_aliases() {
        assert_eq!(normalize_encoding_name("UTF-8"), "utf_8");
        assert_eq!(normalize_encoding_name("utf8"), "utf_8");
        assert_eq!(normalize_encoding_name("CP1252"), "cp1252");
        assert_eq!(normalize_encoding_name("windows-1252"), "cp1252");
        assert_eq!(normalize_encoding_name("Windows_1256"), "cp1256");
        assert_eq!(normalize_encoding_name("cp_1251"), "cp1251");
        assert_eq!(normalize_encoding_name("EUC-KR"), "cp949");
        assert_eq!(normalize_encoding_name("ms932"), "shift_jis");
        assert_eq!(normalize_encoding_name("IBM866"), "cp866");
        assert_eq!(normalize_encoding_name("x-mac-cyrillic"), "mac_cyrillic");
        assert_eq!(normalize_encoding_name("ISO-8859-1"), "latin_1");
        assert_eq!(normalize_encoding_name("Some Odd.Name"), "some_odd_name");
    }

    #[test]
    fn test_equivalence() {
        assert!(is_equivalent("UTF-8", "utf8"));
        assert!(is_equivalent("CP1252", "windows-1252"));
        assert!(!is_equivalent("cp1252", "cp1250"));
        assert!(!is_equivalent("utf_8", "utf_8_sig"));
    }

    #[test]
    fn test_resolve_known_and_label_fallback() {
        let utf16 = resolve_encoding("UTF-16").unwrap();
        assert_eq!(utf16.codec, Codec::Web(UTF_16LE));
        assert!(utf16.write_bom);

        let latin = resolve_encoding("iso-8859-1").unwrap();
        assert_eq!(latin.name, "latin_1");
        assert_eq!(latin.codec, Codec::Web(WINDOWS_1252));

        // Not in the alias table, but a WHATWG label.
        let baltic = resolve_encoding("iso-8859-13").unwrap();
        assert_eq!(baltic.codec, Codec::Web(encoding_rs::ISO_8859_13));
    }

    #[test]
    fn test_resolve_unknown_encoding() {
        let err = resolve_encoding("INVALID-ENCODING-XYZ").unwrap_err();
        assert!(matches!(err, CharsetError::UnsupportedEncoding(_)));
        assert!(err.to_string().to_lowercase().contains("encoding"));
    }

    #[test]
    fn test_sniff_bom_prefers_longest() {
        assert_eq!(sniff_bom(&[0xFF, 0xFE, 0x00, 0x00, b'a']), Some(("utf_32le", 4)));
        assert_eq!(sniff_bom(&[0xFF, 0xFE, b'a', 0x00]), Some(("utf_16le", 2)));
        assert_eq!(sniff_bom(&[0xFE, 0xFF, 0x00, b'a']), Some(("utf_16be", 2)));
        assert_eq!(sniff_bom(&[0xEF, 0xBB, 0xBF, b'a']), Some(("utf_8", 3)));
        assert_eq!(sniff_bom(b"plain"), None);
    }
}
