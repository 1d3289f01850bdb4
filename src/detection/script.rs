//! Unicode script and character-class helpers.
//!
//! Coarse block-based classification is enough here: the analyzers only need to know
//! whether two neighbouring letters could plausibly share a word.

/// Writing system of a character, by Unicode block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Script {
    Latin,
    Greek,
    Cyrillic,
    Armenian,
    Hebrew,
    Arabic,
    Devanagari,
    Thai,
    Georgian,
    Hangul,
    Hiragana,
    Katakana,
    HalfwidthKatakana,
    Han,
    Other,
}

impl Script {
    pub fn of(c: char) -> Script {
        match c as u32 {
            0x41..=0x5A | 0x61..=0x7A => Script::Latin,
            0xC0..=0xD6 | 0xD8..=0xF6 | 0xF8..=0x2AF => Script::Latin,
            0x1E00..=0x1EFF | 0x2C60..=0x2C7F | 0xA720..=0xA7FF => Script::Latin,
            0xFF21..=0xFF3A | 0xFF41..=0xFF5A => Script::Latin,
            0x370..=0x3FF | 0x1F00..=0x1FFF => Script::Greek,
            0x400..=0x52F | 0x1C80..=0x1C8F | 0x2DE0..=0x2DFF | 0xA640..=0xA69F => {
                Script::Cyrillic
            }
            0x530..=0x58F => Script::Armenian,
            0x590..=0x5FF | 0xFB1D..=0xFB4F => Script::Hebrew,
            0x600..=0x6FF | 0x750..=0x77F | 0x8A0..=0x8FF | 0xFB50..=0xFDFF | 0xFE70..=0xFEFF => {
                Script::Arabic
            }
            0x900..=0x97F => Script::Devanagari,
            0xE00..=0xE7F => Script::Thai,
            0x10A0..=0x10FF => Script::Georgian,
            0x1100..=0x11FF | 0x3130..=0x318F | 0xAC00..=0xD7AF | 0xFFA0..=0xFFDC => {
                Script::Hangul
            }
            0x3040..=0x309F => Script::Hiragana,
            0x30A0..=0x30FF | 0x31F0..=0x31FF => Script::Katakana,
            0xFF66..=0xFF9F => Script::HalfwidthKatakana,
            0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xF900..=0xFAFF | 0x20000..=0x2FA1F => Script::Han,
            _ => Script::Other,
        }
    }

    /// Scripts written with East Asian ideographs or syllabaries.
    pub fn is_cjk(self) -> bool {
        matches!(
            self,
            Script::Han
                | Script::Hiragana
                | Script::Katakana
                | Script::HalfwidthKatakana
                | Script::Hangul
        )
    }

    /// Whether letters of `self` and `other` can legitimately sit next to each other.
    pub fn is_compatible_with(self, other: Script) -> bool {
        if self == other || self == Script::Other || other == Script::Other {
            return true;
        }
        match (self, other) {
            // Japanese mixes kanji and kana freely
            (a, b) if is_japanese(a) && is_japanese(b) => true,
            // Korean occasionally embeds hanja
            (Script::Hangul, Script::Han) | (Script::Han, Script::Hangul) => true,
            // Latin identifiers are common inside CJK text; halfwidth katakana is not
            (Script::Latin, s) | (s, Script::Latin) => s.is_cjk() && s != Script::HalfwidthKatakana,
            _ => false,
        }
    }
}

fn is_japanese(script: Script) -> bool {
    matches!(
        script,
        Script::Han | Script::Hiragana | Script::Katakana | Script::HalfwidthKatakana
    )
}

/// Latin letter carrying a diacritic.
pub fn is_accentuated(c: char) -> bool {
    if c.is_ascii() || !c.is_alphabetic() || Script::of(c) != Script::Latin {
        return false;
    }
    !matches!(
        c,
        'ß' | 'æ' | 'Æ' | 'œ' | 'Œ' | 'ð' | 'Ð' | 'þ' | 'Þ' | 'ĸ' | 'ı' | 'ª' | 'º'
    )
}

pub fn is_combining_mark(c: char) -> bool {
    matches!(
        c as u32,
        0x300..=0x36F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF | 0xFE20..=0xFE2F
    )
}

pub fn is_private_use(c: char) -> bool {
    matches!(c as u32, 0xE000..=0xF8FF | 0xF0000..=0xFFFFD | 0x100000..=0x10FFFD)
}

pub fn is_noncharacter(c: char) -> bool {
    let cp = c as u32;
    (0xFDD0..=0xFDEF).contains(&cp) || cp & 0xFFFE == 0xFFFE
}

/// Characters that never appear in well-formed text.
pub fn is_unprintable(c: char) -> bool {
    (c.is_control() && !matches!(c, '\t' | '\n' | '\r' | '\x0c'))
        || c == '\u{FFFD}'
        || is_private_use(c)
        || is_noncharacter(c)
}

/// Non-ASCII punctuation and symbols that ordinary prose uses.
pub fn is_common_punctuation(c: char) -> bool {
    matches!(
        c as u32,
        // Latin-1 signs: ¡ ¢ £ ¤ ¥ § © « ­ ® ° ± ² ³ µ ¶ · ¹ » ¼ ½ ¾ ¿ × ÷
        0xA1..=0xA5 | 0xA7 | 0xA9 | 0xAB | 0xAD..=0xB7 | 0xB9 | 0xBB..=0xBF | 0xD7 | 0xF7
        // General punctuation: dashes, quotes, bullets, ellipsis, per mille, primes
        | 0x2010..=0x2044
        // Currency, letterlike and number forms: €, №, ™, fractions
        | 0x20A0..=0x20BF | 0x2100..=0x218F
        // Arrows and a few maths operators that turn up in prose
        | 0x2190..=0x21FF | 0x2212 | 0x2248 | 0x2260 | 0x2264 | 0x2265
        // CJK punctuation, fullwidth forms and halfwidth CJK punctuation
        | 0x3000..=0x303F | 0xFF01..=0xFF20 | 0xFF3B..=0xFF40 | 0xFF5B..=0xFF65
        // Arabic comma, semicolon, question mark, percent and separators
        | 0x60C | 0x61B | 0x61F | 0x66A..=0x66D | 0x6D4
        // Hebrew maqaf, paseq, sof pasuq, geresh, gershayim
        | 0x5BE | 0x5C0 | 0x5C3 | 0x5F3 | 0x5F4
        // Greek question mark and ano teleia
        | 0x37E | 0x387
        // Thai paiyannoi, fongman and angkhankhu, Devanagari danda
        | 0xE2F | 0xE4F | 0xE5A | 0xE5B | 0x964 | 0x965
    )
}
