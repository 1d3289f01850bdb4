use std::io::{Read, Seek, SeekFrom};
use std::ops::Range;

use log::trace;

use crate::error::{CharsetError, Result};

/// Default lower bound on the sample size (1 MiB).
pub const DEFAULT_MIN_SAMPLE_SIZE: usize = 1024 * 1024;
/// Default share of the file to sample, in percent.
pub const DEFAULT_PERCENTAGE_SAMPLE_SIZE: f64 = 1.0;
/// Default upper bound on the sample size (16 MiB).
pub const DEFAULT_MAX_SAMPLE_SIZE: usize = 16 * 1024 * 1024;

/// Spacing that decides how many middle chunks a sample gets.
const MIDDLE_CHUNK_SPACING: u64 = 4 * 1024;
const MAX_MIDDLE_CHUNKS: u64 = 16;
/// Sample boundaries are aligned to this so UTF-16/32 code units are not split.
const ALIGNMENT: u64 = 4;
/// The head always covers the longest byte-order mark.
const BOM_PREFIX: u64 = 4;

/// Sample size configuration for detection.
///
/// The sample is `max(min, total * percentage / 100)` bytes, capped by `max` when set and
/// never larger than the file. It is never smaller than four bytes either, so a
/// byte-order mark is always seen whole.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    /// Lower bound on the sample size, in bytes.
    pub min_sample_size: usize,
    /// Share of the file to sample, in percent.
    pub percentage_sample_size: f64,
    /// Upper bound on the sample size, in bytes. `None` leaves it unbounded.
    ///
    /// # Warning
    ///
    /// Without a cap, a large percentage on a multi-gigabyte file holds that many bytes
    /// in memory.
    pub max_sample_size: Option<usize>,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            min_sample_size: DEFAULT_MIN_SAMPLE_SIZE,
            percentage_sample_size: DEFAULT_PERCENTAGE_SAMPLE_SIZE,
            max_sample_size: Some(DEFAULT_MAX_SAMPLE_SIZE),
        }
    }
}

impl SamplingParams {
    /// Create sampling parameters, validating them.
    pub fn new(
        min_sample_size: usize,
        percentage_sample_size: f64,
        max_sample_size: Option<usize>,
    ) -> Result<Self> {
        let params = Self {
            min_sample_size,
            percentage_sample_size,
            max_sample_size,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check the parameters for values that cannot produce a sample.
    pub fn validate(&self) -> Result<()> {
        if !self.percentage_sample_size.is_finite() || self.percentage_sample_size < 0.0 {
            return Err(CharsetError::InvalidConfig(format!(
                "percentage_sample_size must be a non-negative number, got {}",
                self.percentage_sample_size
            )));
        }
        if self.max_sample_size == Some(0) {
            return Err(CharsetError::InvalidConfig(
                "max_sample_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of bytes to sample from a source of `total` bytes.
    ///
    /// Never below the BOM prefix, whatever the parameters say.
    pub fn target_size(&self, total: u64) -> u64 {
        let proportional = (total as f64 * self.percentage_sample_size / 100.0) as u64;
        let mut target = (self.min_sample_size as u64).max(proportional);
        if let Some(max) = self.max_sample_size {
            target = target.min(max as u64);
        }
        target.max(BOM_PREFIX).min(total)
    }

    /// Byte ranges to read from a source of `total` bytes.
    ///
    /// Ranges are sorted, disjoint and lie within `0..total`. The head starts at 0, is at
    /// least four bytes long, and the tail ends at `total`.
    pub fn plan(&self, total: u64) -> Vec<Range<u64>> {
        let target = self.target_size(total);
        if target >= total {
            return vec![0..total];
        }

        let head_len = (target * 35 / 100).max(BOM_PREFIX);
        let tail_len = (target * 15 / 100).max(1);
        let middle_len = target.saturating_sub(head_len + tail_len);

        let tail_start = align_down(total - tail_len, ALIGNMENT).max(head_len);
        let gap_len = tail_start - head_len;

        let mut ranges = Vec::with_capacity(MAX_MIDDLE_CHUNKS as usize + 2);
        ranges.push(0..head_len);

        let chunks = (middle_len / MIDDLE_CHUNK_SPACING).clamp(1, MAX_MIDDLE_CHUNKS);
        let chunk_len = (middle_len / chunks).min(gap_len / chunks);
        if chunk_len > 0 {
            let mut floor = head_len;
            for i in 0..chunks {
                let centre = head_len + gap_len * (2 * i + 1) / (2 * chunks);
                let start = align_down(centre.saturating_sub(chunk_len / 2), ALIGNMENT).max(floor);
                let end = (start + chunk_len).min(tail_start);
                if end > start {
                    ranges.push(start..end);
                    floor = end;
                }
            }
        }

        if tail_start < total {
            ranges.push(tail_start..total);
        }
        ranges
    }
}

fn align_down(value: u64, alignment: u64) -> u64 {
    value - value % alignment
}

/// A run of bytes read from the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// File offset of the first byte.
    pub offset: u64,
    pub bytes: Vec<u8>,
}

impl Segment {
    /// End offset (exclusive).
    pub fn end(&self) -> u64 {
        self.offset + self.bytes.len() as u64
    }
}

/// A bounded, representative sample of a byte source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteSample {
    segments: Vec<Segment>,
    total_len: u64,
}

impl ByteSample {
    /// Read a sample from `reader` according to `params`.
    ///
    /// Returns [`CharsetError::EmptyInput`] for a zero-length source.
    pub fn capture<R: Read + Seek>(reader: &mut R, params: &SamplingParams) -> Result<Self> {
        params.validate()?;
        let total_len = reader.seek(SeekFrom::End(0))?;
        if total_len == 0 {
            return Err(CharsetError::EmptyInput);
        }

        let plan = params.plan(total_len);
        trace!("sampling {} bytes in {} segments", total_len, plan.len());

        let mut segments = Vec::with_capacity(plan.len());
        for range in plan {
            reader.seek(SeekFrom::Start(range.start))?;
            let mut bytes = Vec::with_capacity((range.end - range.start) as usize);
            reader
                .by_ref()
                .take(range.end - range.start)
                .read_to_end(&mut bytes)?;
            trace!("segment {}..{} read {} bytes", range.start, range.end, bytes.len());
            if !bytes.is_empty() {
                segments.push(Segment {
                    offset: range.start,
                    bytes,
                });
            }
        }

        if segments.is_empty() {
            return Err(CharsetError::EmptyInput);
        }
        Ok(Self {
            segments,
            total_len,
        })
    }

    /// Sample an in-memory buffer.
    pub fn from_bytes(data: &[u8], params: &SamplingParams) -> Result<Self> {
        Self::capture(&mut std::io::Cursor::new(data), params)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Length of the whole source, not just the sample.
    pub fn total_len(&self) -> u64 {
        self.total_len
    }

    /// Number of sampled bytes.
    pub fn len(&self) -> usize {
        self.segments.iter().map(|s| s.bytes.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes at the start of the source.
    pub fn head(&self) -> &[u8] {
        self.segments
            .first()
            .filter(|s| s.offset == 0)
            .map(|s| s.bytes.as_slice())
            .unwrap_or_default()
    }

    /// Whether the sample covers the whole source.
    pub fn is_complete(&self) -> bool {
        self.len() as u64 == self.total_len
    }

    /// Whether any sampled byte is outside 7-bit ASCII.
    pub fn has_high_bytes(&self) -> bool {
        self.segments
            .iter()
            .any(|s| s.bytes.iter().any(|&b| b >= 0x80))
    }

    /// Whether any sampled byte matches `byte`.
    pub fn contains(&self, byte: u8) -> bool {
        self.segments.iter().any(|s| s.bytes.contains(&byte))
    }
}
