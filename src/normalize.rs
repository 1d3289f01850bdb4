//! Stream normalizer: rewrite a file into a target encoding and line-ending style.
//!
//! The source is streamed through decode, newline translation and encode in fixed-size
//! chunks, so memory stays bounded by the buffer size. Output goes to a temporary file in
//! the destination directory, which is then swapped into place.

use std::fs;
use std::io::{self, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};

use encoding_rs::UTF_8;
use log::{debug, info, warn};
use tempfile::NamedTempFile;

use crate::codec::{Codec, DecodeStep};
use crate::detector::{Detector, open_source};
use crate::encoding::{ResolvedEncoding, resolve_encoding};
use crate::error::{CharsetError, Result};
use crate::result::NewlineStyle;
use crate::sample::SamplingParams;

/// Default streaming chunk size.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

const TEMP_PREFIX: &str = ".charset-nose-";

/// What a normalization run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The file already had the target encoding and newline style.
    Skipped {
        encoding: String,
        newline: NewlineStyle,
    },
    /// The file was rewritten.
    Rewritten {
        from: String,
        to: String,
        newline: NewlineStyle,
        bytes_written: u64,
    },
}

impl Outcome {
    /// Whether the destination was written.
    pub fn is_rewritten(&self) -> bool {
        matches!(self, Outcome::Rewritten { .. })
    }
}

/// File normalizer.
///
/// # Example
///
/// ```no_run
/// use charset_nose::{NewlineStyle, Normalizer};
///
/// let mut normalizer = Normalizer::new();
/// normalizer.buffer_size(128 * 1024);
///
/// let outcome = normalizer
///     .normalize_in_place("legacy.txt", "utf-8", NewlineStyle::LF)
///     .unwrap();
/// println!("{outcome:?}");
/// ```
#[derive(Debug, Clone)]
pub struct Normalizer {
    detector: Detector,
    buffer_size: usize,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    /// Create a new Normalizer with default settings.
    pub fn new() -> Self {
        Self {
            detector: Detector::new(),
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Set the sampling parameters used to detect the source encoding.
    pub fn sampling(&mut self, sampling: SamplingParams) -> &mut Self {
        self.detector.sampling(sampling);
        self
    }

    /// Set the mess threshold used to detect the source encoding.
    pub fn threshold(&mut self, threshold: f64) -> &mut Self {
        self.detector.threshold(threshold);
        self
    }

    /// Set the streaming chunk size in bytes.
    pub fn buffer_size(&mut self, buffer_size: usize) -> &mut Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Rewrite `path` in place.
    ///
    /// Nothing is written when the file's bytes would come out unchanged: the detected
    /// encoding writes the same bytes as `target_encoding` and the detected newline style
    /// already matches.
    pub fn normalize_in_place<P: AsRef<Path>>(
        &self,
        path: P,
        target_encoding: &str,
        target_newline: NewlineStyle,
    ) -> Result<Outcome> {
        let path = path.as_ref();
        let target = resolve_encoding(target_encoding)?;
        let mut reader = open_source(path)?;
        let (matches, newlines) = self.detector.inspect_reader(&mut reader)?;
        let best = matches.best();
        let from = best.encoding.to_string();

        if newlines == target_newline && writes_same_bytes(best.encoding, best.bom, &target)? {
            info!(
                "{}: already {} with {} line endings",
                path.display(),
                target.name,
                target_newline
            );
            return Ok(Outcome::Skipped {
                encoding: from,
                newline: target_newline,
            });
        }

        reader.rewind()?;
        let mut temp = temp_file_beside(path)?;
        let written = self.transcode(
            &mut reader,
            temp.as_file_mut(),
            &from,
            &target,
            target_newline,
        )?;
        temp.as_file().sync_all()?;
        fs::set_permissions(temp.path(), fs::metadata(path)?.permissions())?;
        drop(reader);

        replace_with_backup(temp, path)?;
        info!(
            "{}: rewrote {} -> {} with {} line endings ({} bytes)",
            path.display(),
            from,
            target.name,
            target_newline,
            written
        );
        Ok(Outcome::Rewritten {
            from,
            to: target.name,
            newline: target_newline,
            bytes_written: written,
        })
    }

    /// Write a normalized copy of `path` to `dest`, leaving the source untouched.
    ///
    /// The destination is always written, even when no conversion is needed.
    pub fn normalize_to<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        path: P,
        dest: Q,
        target_encoding: &str,
        target_newline: NewlineStyle,
    ) -> Result<Outcome> {
        let (path, dest) = (path.as_ref(), dest.as_ref());
        let target = resolve_encoding(target_encoding)?;
        let mut reader = open_source(path)?;
        let analysis = self.detector.analyse_reader(&mut reader)?;

        reader.rewind()?;
        let mut temp = temp_file_beside(dest)?;
        let written = self.transcode(
            &mut reader,
            temp.as_file_mut(),
            &analysis.encoding,
            &target,
            target_newline,
        )?;
        temp.as_file().sync_all()?;
        fs::set_permissions(temp.path(), fs::metadata(path)?.permissions())?;
        temp.persist(dest).map_err(|e| CharsetError::Io(e.error))?;

        info!(
            "{}: wrote {} as {} with {} line endings to {} ({} bytes)",
            path.display(),
            analysis.encoding,
            target.name,
            target_newline,
            dest.display(),
            written
        );
        Ok(Outcome::Rewritten {
            from: analysis.encoding,
            to: target.name,
            newline: target_newline,
            bytes_written: written,
        })
    }

    /// Decode `path` with its detected encoding and check the text fits in `to`.
    ///
    /// Returns the decoded text. Nothing is written.
    pub fn convert<P: AsRef<Path>>(&self, path: P, to: &str) -> Result<String> {
        let path = path.as_ref();
        let target = resolve_encoding(to)?;
        let from = self.detector.analyse_path(path)?.encoding;
        let text = read_with_codec(path, &from, source_codec(&from)?)?;

        let mut scratch = Vec::new();
        let mut encoder = target.codec.encoder();
        for chunk in chunks_at_char_boundaries(&text, self.buffer_size.max(4)) {
            scratch.clear();
            encoder
                .encode(chunk, &mut scratch, false)
                .map_err(|c| unmappable(&from, &target.name, c))?;
        }
        scratch.clear();
        encoder
            .encode("", &mut scratch, true)
            .map_err(|c| unmappable(&from, &target.name, c))?;

        debug!("{}: {} content fits in {}", path.display(), from, target.name);
        Ok(text)
    }

    /// Stream `reader` into `writer`, returning the number of bytes written.
    fn transcode<R: Read, W: Write>(
        &self,
        reader: &mut R,
        writer: W,
        from: &str,
        target: &ResolvedEncoding,
        newline: NewlineStyle,
    ) -> Result<u64> {
        if self.buffer_size == 0 {
            return Err(CharsetError::InvalidConfig(
                "buffer_size must be greater than zero".to_string(),
            ));
        }

        let mut writer = BufWriter::with_capacity(self.buffer_size, writer);
        let mut decoder = source_codec(from)?.decoder(true);
        let mut encoder = target.codec.encoder();
        let mut translator = NewlineTranslator::new(newline);

        let mut buffer = vec![0u8; self.buffer_size];
        let mut decoded = String::with_capacity(self.buffer_size);
        let mut translated = String::with_capacity(self.buffer_size);
        let mut encoded = Vec::with_capacity(self.buffer_size);
        let mut offset = 0u64;
        let mut written = 0u64;

        if target.write_bom
            && let Some(bom) = target.codec.bom()
        {
            writer.write_all(bom)?;
            written += bom.len() as u64;
        }

        loop {
            let n = read_chunk(reader, &mut buffer)?;
            let last = n == 0;

            decoded.clear();
            let (step, read) = decoder.decode_step(&buffer[..n], &mut decoded, last);
            if step == DecodeStep::Malformed {
                return Err(CharsetError::Conversion {
                    from: from.to_string(),
                    to: target.name.clone(),
                    reason: format!(
                        "malformed {from} sequence ending at byte {}",
                        offset + read as u64
                    ),
                });
            }
            offset += n as u64;

            translated.clear();
            translator.translate(&decoded, &mut translated, last);

            encoded.clear();
            encoder
                .encode(&translated, &mut encoded, last)
                .map_err(|c| unmappable(from, &target.name, c))?;
            writer.write_all(&encoded)?;
            written += encoded.len() as u64;

            if last {
                break;
            }
        }

        writer.flush()?;
        Ok(written)
    }
}

/// Whether content detected as `detected` (with or without a BOM) is already laid out
/// byte for byte as `target` would write it.
fn writes_same_bytes(detected: &str, has_bom: bool, target: &ResolvedEncoding) -> Result<bool> {
    if detected == "ascii" {
        return Ok(!target.write_bom && target.codec.is_ascii_compatible());
    }
    Ok(source_codec(detected)? == target.codec && has_bom == target.write_bom)
}

/// Codec that reads content detected as `name`. ASCII is read as UTF-8, its superset.
fn source_codec(name: &str) -> Result<Codec> {
    if name == "ascii" {
        return Ok(Codec::Web(UTF_8));
    }
    Ok(resolve_encoding(name)?.codec)
}

fn unmappable(from: &str, to: &str, c: char) -> CharsetError {
    CharsetError::Conversion {
        from: from.to_string(),
        to: to.to_string(),
        reason: format!("character {c:?} (U+{:04X}) cannot be represented", c as u32),
    }
}

/// Fill as much of `buffer` as the reader gives in one call, retrying on interrupts.
fn read_chunk<R: Read>(reader: &mut R, buffer: &mut [u8]) -> Result<usize> {
    loop {
        match reader.read(buffer) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

fn chunks_at_char_boundaries(text: &str, size: usize) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let mut end = size.min(rest.len());
        while !rest.is_char_boundary(end) {
            end += 1;
        }
        let (chunk, tail) = rest.split_at(end);
        rest = tail;
        Some(chunk)
    })
}

/// Rewrites every line terminator to one style.
///
/// A CR at the end of a chunk is held back until the next chunk shows whether it starts
/// a CRLF pair.
struct NewlineTranslator {
    terminator: &'static str,
    pending_cr: bool,
}

impl NewlineTranslator {
    fn new(style: NewlineStyle) -> Self {
        Self {
            terminator: style.as_str(),
            pending_cr: false,
        }
    }

    fn translate(&mut self, src: &str, dst: &mut String, last: bool) {
        if !self.pending_cr && !src.contains('\r') && self.terminator == "\n" {
            dst.push_str(src);
            return;
        }

        for c in src.chars() {
            match c {
                '\r' => {
                    if self.pending_cr {
                        dst.push_str(self.terminator);
                    }
                    self.pending_cr = true;
                }
                '\n' => {
                    self.pending_cr = false;
                    dst.push_str(self.terminator);
                }
                c => {
                    if self.pending_cr {
                        dst.push_str(self.terminator);
                        self.pending_cr = false;
                    }
                    dst.push(c);
                }
            }
        }

        if last && self.pending_cr {
            dst.push_str(self.terminator);
            self.pending_cr = false;
        }
    }
}

fn temp_file_beside(path: &Path) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok(tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempfile_in(dir)?)
}

/// First free `<name>.bak`, `<name>.bak.1`, `<name>.bak.2`, ...
fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".bak");
    let first = path.with_file_name(&name);
    if !first.exists() {
        return first;
    }
    let mut n = 1u32;
    loop {
        let mut numbered = name.clone();
        numbered.push(format!(".{n}"));
        let candidate = path.with_file_name(numbered);
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Swap `temp` into `path`, keeping the original as a backup until the swap succeeds.
fn replace_with_backup(temp: NamedTempFile, path: &Path) -> Result<()> {
    swap_with_backup(path, |dest| temp.persist(dest).map(drop).map_err(|e| e.error))
}

/// Move `path` aside, run `install` to put the new file at `path`, then drop the backup.
///
/// If `install` fails the original is moved back.
fn swap_with_backup<F>(path: &Path, install: F) -> Result<()>
where
    F: FnOnce(&Path) -> io::Result<()>,
{
    let backup = backup_path(path);
    fs::rename(path, &backup)?;

    if let Err(e) = install(path) {
        if let Err(restore) = fs::rename(&backup, path) {
            warn!(
                "could not restore {} from {}: {restore}",
                path.display(),
                backup.display()
            );
        }
        return Err(CharsetError::Io(e));
    }

    if let Err(e) = fs::remove_file(&backup) {
        warn!("could not remove backup {}: {e}", backup.display());
    }
    Ok(())
}

/// Strictly decode a whole file with a named encoding, dropping its BOM.
pub fn read_with_encoding<P: AsRef<Path>>(path: P, encoding: &str) -> Result<String> {
    let resolved = resolve_encoding(encoding)?;
    read_with_codec(path.as_ref(), &resolved.name, resolved.codec)
}

fn read_with_codec(path: &Path, name: &str, codec: Codec) -> Result<String> {
    let mut bytes = Vec::new();
    open_source(path)?.read_to_end(&mut bytes)?;
    codec
        .decode_strict(&bytes, true)
        .ok_or_else(|| CharsetError::Conversion {
            from: name.to_string(),
            to: "utf_8".to_string(),
            reason: format!("{} is not valid {name}", path.display()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn translate_chunks(chunks: &[&str], style: NewlineStyle) -> String {
        let mut translator = NewlineTranslator::new(style);
        let mut out = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            translator.translate(chunk, &mut out, i + 1 == chunks.len());
        }
        out
    }

    #[test]
    fn test_translate_all_terminators() {
        assert_eq!(
            translate_chunks(&["a\r\nb\nc\rd"], NewlineStyle::LF),
            "a\nb\nc\nd"
        );
        assert_eq!(
            translate_chunks(&["a\r\nb\nc\rd"], NewlineStyle::CRLF),
            "a\r\nb\r\nc\r\nd"
        );
        assert_eq!(translate_chunks(&["a\nb\n"], NewlineStyle::CR), "a\rb\r");
    }

    #[test]
    fn test_translate_cr_split_across_chunks() {
        assert_eq!(
            translate_chunks(&["one\r", "\ntwo\r", "three\r"], NewlineStyle::LF),
            "one\ntwo\nthree\n"
        );
        assert_eq!(
            translate_chunks(&["x\r", "", "\ny"], NewlineStyle::CRLF),
            "x\r\ny"
        );
    }

    #[test]
    fn test_translate_consecutive_crs() {
        assert_eq!(translate_chunks(&["a\r\r\nb"], NewlineStyle::LF), "a\n\nb");
    }

    #[test]
    fn test_transcode_small_buffer() {
        let mut normalizer = Normalizer::new();
        normalizer.buffer_size(3);
        let target = resolve_encoding("cp1252").unwrap();
        let source = "café\r\nnaïve\r\n";

        let mut out = Vec::new();
        let written = normalizer
            .transcode(
                &mut Cursor::new(source.as_bytes()),
                &mut out,
                "utf_8",
                &target,
                NewlineStyle::LF,
            )
            .unwrap();

        assert_eq!(out, b"caf\xe9\nna\xefve\n");
        assert_eq!(written, out.len() as u64);
    }

    #[test]
    fn test_transcode_writes_bom() {
        let normalizer = Normalizer::new();
        let target = resolve_encoding("utf-16").unwrap();
        let mut out = Vec::new();
        normalizer
            .transcode(
                &mut Cursor::new(b"hi\n".as_slice()),
                &mut out,
                "ascii",
                &target,
                NewlineStyle::CRLF,
            )
            .unwrap();
        assert_eq!(out, [0xFF, 0xFE, b'h', 0, b'i', 0, b'\r', 0, b'\n', 0]);
    }

    #[test]
    fn test_transcode_unmappable() {
        let normalizer = Normalizer::new();
        let target = resolve_encoding("ascii").unwrap();
        let err = normalizer
            .transcode(
                &mut Cursor::new("naïve".as_bytes()),
                &mut Vec::new(),
                "utf_8",
                &target,
                NewlineStyle::LF,
            )
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("U+00EF"), "{msg}");
        assert!(matches!(err, CharsetError::Conversion { .. }));
    }

    #[test]
    fn test_transcode_malformed_source() {
        let normalizer = Normalizer::new();
        let target = resolve_encoding("utf_8").unwrap();
        let err = normalizer
            .transcode(
                &mut Cursor::new([b'a', 0xFF, b'b'].as_slice()),
                &mut Vec::new(),
                "utf_8",
                &target,
                NewlineStyle::LF,
            )
            .unwrap_err();
        assert!(matches!(err, CharsetError::Conversion { .. }));
    }

    #[test]
    fn test_zero_buffer_is_rejected() {
        let mut normalizer = Normalizer::new();
        normalizer.buffer_size(0);
        let target = resolve_encoding("utf_8").unwrap();
        let err = normalizer
            .transcode(
                &mut Cursor::new(b"x".as_slice()),
                &mut Vec::new(),
                "ascii",
                &target,
                NewlineStyle::LF,
            )
            .unwrap_err();
        assert!(matches!(err, CharsetError::InvalidConfig(_)));
    }

    #[test]
    fn test_backup_path_skips_taken_names() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        assert_eq!(backup_path(&file), dir.path().join("notes.txt.bak"));

        fs::write(dir.path().join("notes.txt.bak"), b"").unwrap();
        fs::write(dir.path().join("notes.txt.bak.1"), b"").unwrap();
        assert_eq!(backup_path(&file), dir.path().join("notes.txt.bak.2"));
    }

    #[test]
    fn test_failed_install_restores_original() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        fs::write(&file, b"original").unwrap();

        let err = swap_with_backup(&file, |dest| {
            // The original must already be out of the way here
            assert!(!dest.exists());
            Err(io::Error::other("disk full"))
        })
        .unwrap_err();

        assert!(matches!(err, CharsetError::Io(_)));
        assert_eq!(fs::read(&file).unwrap(), b"original");
        assert!(!dir.path().join("notes.txt.bak").exists());
    }

    #[test]
    fn test_successful_install_drops_backup() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        fs::write(&file, b"original").unwrap();

        swap_with_backup(&file, |dest| fs::write(dest, b"rewritten")).unwrap();

        assert_eq!(fs::read(&file).unwrap(), b"rewritten");
        assert!(!dir.path().join("notes.txt.bak").exists());
    }

    #[test]
    fn test_writes_same_bytes() {
        let utf8 = resolve_encoding("utf-8").unwrap();
        let utf8_sig = resolve_encoding("utf-8-sig").unwrap();
        let latin1 = resolve_encoding("latin-1").unwrap();
        let utf16 = resolve_encoding("utf-16").unwrap();

        assert!(writes_same_bytes("ascii", false, &utf8).unwrap());
        assert!(writes_same_bytes("ascii", false, &latin1).unwrap());
        assert!(!writes_same_bytes("ascii", false, &utf8_sig).unwrap());
        assert!(!writes_same_bytes("ascii", false, &utf16).unwrap());

        assert!(writes_same_bytes("cp1252", false, &latin1).unwrap());
        assert!(writes_same_bytes("utf_8", true, &utf8_sig).unwrap());
        assert!(!writes_same_bytes("utf_8", true, &utf8).unwrap());
        assert!(writes_same_bytes("utf_16le", true, &utf16).unwrap());
        assert!(!writes_same_bytes("cp1250", false, &latin1).unwrap());
    }

    #[test]
    fn test_chunks_respect_char_boundaries() {
        let chunks: Vec<&str> = chunks_at_char_boundaries("aéé", 2).collect();
        assert_eq!(chunks, vec!["aé", "é"]);
    }
}
