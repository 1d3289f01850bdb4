//! Streaming decoders and encoders.
//!
//! `encoding_rs` covers the WHATWG encodings. This module adds the pieces it leaves out:
//! strict 7-bit ASCII, UTF-16 output and UTF-32 in both directions. Both the sample decoder
//! and the stream normalizer drive these types with the same stepwise contract: decode
//! until the input is exhausted or a malformed sequence is hit, then call again with the
//! rest of the input.

use encoding_rs::{DecoderResult, EncoderResult, Encoding, UTF_8, UTF_16BE, UTF_16LE};

/// Fallback reservation when `encoding_rs` cannot bound the output size.
const FALLBACK_RESERVE: usize = 8192;

/// A concrete text codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// Strict 7-bit ASCII.
    Ascii,
    /// UTF-32 in the given byte order.
    Utf32 { big_endian: bool },
    /// Any encoding implemented by `encoding_rs`.
    Web(&'static Encoding),
}

/// Outcome of one decode step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStep {
    /// All input was consumed.
    InputEmpty,
    /// A malformed sequence ended just before the reported read position.
    Malformed,
}

impl Codec {
    /// Byte-order mark written for this codec when a BOM is requested.
    pub fn bom(&self) -> Option<&'static [u8]> {
        match self {
            Codec::Ascii => None,
            Codec::Utf32 { big_endian: false } => Some(&[0xFF, 0xFE, 0x00, 0x00]),
            Codec::Utf32 { big_endian: true } => Some(&[0x00, 0x00, 0xFE, 0xFF]),
            Codec::Web(encoding) if *encoding == UTF_8 => Some(&[0xEF, 0xBB, 0xBF]),
            Codec::Web(encoding) if *encoding == UTF_16LE => Some(&[0xFF, 0xFE]),
            Codec::Web(encoding) if *encoding == UTF_16BE => Some(&[0xFE, 0xFF]),
            Codec::Web(_) => None,
        }
    }

    /// Whether bytes `0x00..=0x7F` mean the same ASCII characters under this codec.
    pub fn is_ascii_compatible(&self) -> bool {
        match self {
            Codec::Ascii => true,
            Codec::Utf32 { .. } => false,
            Codec::Web(encoding) => encoding.is_ascii_compatible(),
        }
    }

    /// Create a decoder. With `strip_bom`, a leading BOM of this codec is dropped.
    pub fn decoder(&self, strip_bom: bool) -> TextDecoder {
        let kind = match *self {
            Codec::Ascii => DecoderKind::Ascii,
            Codec::Utf32 { big_endian } => DecoderKind::Utf32 {
                big_endian,
                pending: Vec::with_capacity(4),
                skip_bom: strip_bom,
            },
            Codec::Web(encoding) => DecoderKind::Web(if strip_bom {
                encoding.new_decoder_with_bom_removal()
            } else {
                encoding.new_decoder_without_bom_handling()
            }),
        };
        TextDecoder { kind }
    }

    /// Create an encoder.
    pub fn encoder(&self) -> TextEncoder {
        let kind = match *self {
            Codec::Ascii => EncoderKind::Ascii,
            Codec::Utf32 { big_endian } => EncoderKind::Utf32 { big_endian },
            Codec::Web(encoding) if encoding == UTF_16LE => EncoderKind::Utf16 { big_endian: false },
            Codec::Web(encoding) if encoding == UTF_16BE => EncoderKind::Utf16 { big_endian: true },
            Codec::Web(encoding) => EncoderKind::Web(encoding.new_encoder()),
        };
        TextEncoder { kind }
    }

    /// Decode a complete buffer, returning `None` on the first malformed sequence.
    pub fn decode_strict(&self, bytes: &[u8], strip_bom: bool) -> Option<String> {
        let mut decoder = self.decoder(strip_bom);
        let mut text = String::with_capacity(bytes.len());
        match decoder.decode_step(bytes, &mut text, true) {
            (DecodeStep::InputEmpty, _) => Some(text),
            (DecodeStep::Malformed, _) => None,
        }
    }
}

/// Incremental decoder for a [`Codec`].
pub struct TextDecoder {
    kind: DecoderKind,
}

enum DecoderKind {
    Ascii,
    Utf32 {
        big_endian: bool,
        pending: Vec<u8>,
        skip_bom: bool,
    },
    Web(encoding_rs::Decoder),
}

impl TextDecoder {
    /// Decode `src` into `dst`.
    ///
    /// Returns the step outcome and the number of bytes read from `src`. After
    /// [`DecodeStep::Malformed`], call again with `&src[read..]` to continue.
    pub fn decode_step(&mut self, src: &[u8], dst: &mut String, last: bool) -> (DecodeStep, usize) {
        match &mut self.kind {
            DecoderKind::Ascii => match src.iter().position(|&b| b >= 0x80) {
                Some(pos) => {
                    dst.extend(src[..pos].iter().map(|&b| b as char));
                    (DecodeStep::Malformed, pos + 1)
                }
                None => {
                    dst.extend(src.iter().map(|&b| b as char));
                    (DecodeStep::InputEmpty, src.len())
                }
            },
            DecoderKind::Utf32 {
                big_endian,
                pending,
                skip_bom,
            } => decode_utf32(*big_endian, pending, skip_bom, src, dst, last),
            DecoderKind::Web(decoder) => {
                let mut total = 0;
                loop {
                    let remaining = src.len() - total;
                    let needed = decoder
                        .max_utf8_buffer_length_without_replacement(remaining)
                        .unwrap_or(FALLBACK_RESERVE);
                    dst.reserve(needed);
                    let (result, read) =
                        decoder.decode_to_string_without_replacement(&src[total..], dst, last);
                    total += read;
                    match result {
                        DecoderResult::InputEmpty => return (DecodeStep::InputEmpty, total),
                        DecoderResult::OutputFull => continue,
                        DecoderResult::Malformed(_, _) => return (DecodeStep::Malformed, total),
                    }
                }
            }
        }
    }
}

fn decode_utf32(
    big_endian: bool,
    pending: &mut Vec<u8>,
    skip_bom: &mut bool,
    src: &[u8],
    dst: &mut String,
    last: bool,
) -> (DecodeStep, usize) {
    let mut consumed = 0;
    loop {
        while pending.len() < 4 && consumed < src.len() {
            pending.push(src[consumed]);
            consumed += 1;
        }
        if pending.len() < 4 {
            if last && !pending.is_empty() {
                pending.clear();
                return (DecodeStep::Malformed, consumed);
            }
            return (DecodeStep::InputEmpty, consumed);
        }

        let unit = [pending[0], pending[1], pending[2], pending[3]];
        pending.clear();
        let value = if big_endian {
            u32::from_be_bytes(unit)
        } else {
            u32::from_le_bytes(unit)
        };

        let bom = std::mem::take(skip_bom) && value == 0xFEFF;
        if bom {
            continue;
        }
        match char::from_u32(value) {
            Some(c) => dst.push(c),
            None => return (DecodeStep::Malformed, consumed),
        }
    }
}

/// Incremental encoder for a [`Codec`].
pub struct TextEncoder {
    kind: EncoderKind,
}

enum EncoderKind {
    Ascii,
    Utf16 { big_endian: bool },
    Utf32 { big_endian: bool },
    Web(encoding_rs::Encoder),
}

impl TextEncoder {
    /// Encode `src`, appending to `dst`.
    ///
    /// Returns the first character the target cannot represent as the error.
    /// Pass `last = true` on the final call so stateful encoders (ISO-2022-JP)
    /// can return to their initial state.
    pub fn encode(&mut self, src: &str, dst: &mut Vec<u8>, last: bool) -> Result<(), char> {
        match &mut self.kind {
            EncoderKind::Ascii => {
                if let Some(c) = src.chars().find(|c| !c.is_ascii()) {
                    return Err(c);
                }
                dst.extend_from_slice(src.as_bytes());
                Ok(())
            }
            EncoderKind::Utf16 { big_endian } => {
                dst.reserve(src.len() * 2);
                for unit in src.encode_utf16() {
                    let bytes = if *big_endian {
                        unit.to_be_bytes()
                    } else {
                        unit.to_le_bytes()
                    };
                    dst.extend_from_slice(&bytes);
                }
                Ok(())
            }
            EncoderKind::Utf32 { big_endian } => {
                dst.reserve(src.len() * 4);
                for c in src.chars() {
                    let bytes = if *big_endian {
                        (c as u32).to_be_bytes()
                    } else {
                        (c as u32).to_le_bytes()
                    };
                    dst.extend_from_slice(&bytes);
                }
                Ok(())
            }
            EncoderKind::Web(encoder) => {
                let mut total = 0;
                loop {
                    let remaining = src.len() - total;
                    let needed = encoder
                        .max_buffer_length_from_utf8_without_replacement(remaining)
                        .unwrap_or(FALLBACK_RESERVE);
                    dst.reserve(needed);
                    let (result, read) = encoder.encode_from_utf8_to_vec_without_replacement(
                        &src[total..],
                        dst,
                        last,
                    );
                    total += read;
                    match result {
                        EncoderResult::InputEmpty => return Ok(()),
                        EncoderResult::OutputFull => continue,
                        EncoderResult::Unmappable(c) => return Err(c),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{ISO_2022_JP, SHIFT_JIS, WINDOWS_1252};

    fn encode_all(codec: Codec, text: &str) -> Result<Vec<u8>, char> {
        let mut out = Vec::new();
        codec.encoder().encode(text, &mut out, true)?;
        Ok(out)
    }

    #[test]
    fn test_ascii_rejects_high_bytes() {
        assert_eq!(
            Codec::Ascii.decode_strict(b"plain", false).as_deref(),
            Some("plain")
        );
        assert!(Codec::Ascii.decode_strict(&[b'a', 0xE9], false).is_none());
        assert_eq!(encode_all(Codec::Ascii, "café"), Err('é'));
    }

    #[test]
    fn test_ascii_compatibility() {
        assert!(Codec::Ascii.is_ascii_compatible());
        assert!(Codec::Web(UTF_8).is_ascii_compatible());
        assert!(Codec::Web(SHIFT_JIS).is_ascii_compatible());
        assert!(!Codec::Web(UTF_16LE).is_ascii_compatible());
        assert!(!Codec::Web(ISO_2022_JP).is_ascii_compatible());
        assert!(!Codec::Utf32 { big_endian: false }.is_ascii_compatible());
    }

    #[test]
    fn test_malformed_step_reports_position() {
        let mut decoder = Codec::Web(UTF_8).decoder(false);
        let mut text = String::new();
        let data = [b'a', b'b', 0xFF, b'c'];

        let (step, read) = decoder.decode_step(&data, &mut text, true);
        assert_eq!(step, DecodeStep::Malformed);
        assert_eq!(read, 3);

        let (step, _) = decoder.decode_step(&data[read..], &mut text, true);
        assert_eq!(step, DecodeStep::InputEmpty);
        assert_eq!(text, "abc");
    }

    #[test]
    fn test_utf16_encoding_is_handled_locally() {
        let bytes = encode_all(Codec::Web(UTF_16LE), "Hi").unwrap();
        assert_eq!(bytes, vec![b'H', 0x00, b'i', 0x00]);

        let bytes = encode_all(Codec::Web(UTF_16BE), "Hi").unwrap();
        assert_eq!(bytes, vec![0x00, b'H', 0x00, b'i']);
    }

    #[test]
    fn test_utf32_round_trip_with_bom() {
        let codec = Codec::Utf32 { big_endian: false };
        let mut bytes = codec.bom().unwrap().to_vec();
        bytes.extend(encode_all(codec, "añ€").unwrap());

        assert_eq!(codec.decode_strict(&bytes, true).as_deref(), Some("añ€"));
        // Without BOM removal the BOM survives as U+FEFF.
        assert_eq!(
            codec.decode_strict(&bytes, false).as_deref(),
            Some("\u{FEFF}añ€")
        );
    }

    #[test]
    fn test_utf32_truncated_unit_is_malformed() {
        let codec = Codec::Utf32 { big_endian: true };
        assert!(codec.decode_strict(&[0x00, 0x00, 0x00], false).is_none());
        assert!(codec.decode_strict(&[0x00, 0x00, 0xD8, 0x00], false).is_none());
    }

    #[test]
    fn test_utf32_split_across_calls() {
        let codec = Codec::Utf32 { big_endian: false };
        let mut decoder = codec.decoder(false);
        let mut text = String::new();

        let (step, read) = decoder.decode_step(&[0x41, 0x00], &mut text, false);
        assert_eq!((step, read), (DecodeStep::InputEmpty, 2));
        let (step, _) = decoder.decode_step(&[0x00, 0x00], &mut text, true);
        assert_eq!(step, DecodeStep::InputEmpty);
        assert_eq!(text, "A");
    }

    #[test]
    fn test_legacy_encoder_unmappable() {
        assert_eq!(encode_all(Codec::Web(WINDOWS_1252), "€").unwrap(), vec![0x80]);
        assert_eq!(encode_all(Codec::Web(WINDOWS_1252), "日本"), Err('日'));
    }

    #[test]
    fn test_stateful_encoder_returns_to_ascii() {
        let bytes = encode_all(Codec::Web(ISO_2022_JP), "日本").unwrap();
        assert!(bytes.starts_with(&[0x1B, b'$', b'B']));
        assert!(bytes.ends_with(&[0x1B, b'(', b'B']));
    }

    #[test]
    fn test_shift_jis_decode() {
        let (bytes, _, _) = SHIFT_JIS.encode("こんにちは");
        assert_eq!(
            Codec::Web(SHIFT_JIS).decode_strict(&bytes, false).as_deref(),
            Some("こんにちは")
        );
    }

    #[test]
    fn test_bom_table() {
        assert_eq!(Codec::Web(UTF_8).bom(), Some(&[0xEF, 0xBB, 0xBF][..]));
        assert_eq!(Codec::Web(WINDOWS_1252).bom(), None);
        assert_eq!(Codec::Ascii.bom(), None);
    }
}
