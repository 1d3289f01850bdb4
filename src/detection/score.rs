//! Scoring of decode attempts and ranking of matches.
//!
//! Every match is ordered by one comparator, so ranking is deterministic for a given sample:
//! mess ascending, then coherence descending (both bucketed to 0.01), then the chardetng
//! hint, then the fixed candidate preference.

use std::cmp::Ordering;

use chardetng::EncodingDetector;
use log::{debug, warn};

use super::coherence::coherence_ratio;
use super::decode::DecodeAttempt;
use super::mess::{ByteView, mess_ratio_with};
use crate::candidates::{candidates, preference};
use crate::codec::Codec;
use crate::result::Match;
use crate::sample::ByteSample;

/// Scores are compared at this resolution so noise does not outrank the tie-breakers.
fn bucket(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

/// Total order over matches; the best match sorts first.
pub fn compare(a: &Match, b: &Match) -> Ordering {
    bucket(a.mess)
        .cmp(&bucket(b.mess))
        .then_with(|| bucket(b.coherence).cmp(&bucket(a.coherence)))
        .then_with(|| b.hinted.cmp(&a.hinted))
        .then_with(|| a.preference.cmp(&b.preference))
}

/// Candidate that chardetng guesses for `sample`.
///
/// Pure ASCII samples get no hint: every candidate decodes them identically.
pub fn chardetng_hint(sample: &ByteSample) -> Option<&'static str> {
    if !sample.has_high_bytes() {
        return None;
    }
    let mut detector = EncodingDetector::new();
    for segment in sample.segments() {
        detector.feed(&segment.bytes, false);
    }
    detector.feed(&[], true);
    let guess = detector.guess(None, true);
    candidates()
        .iter()
        .find(|c| c.codec == Codec::Web(guess))
        .map(|c| c.name)
}

/// Score one decode attempt.
///
/// Coherence is only computed for attempts that pass the mess threshold; the others can
/// only surface through the fallback, where it does not matter.
pub fn score_attempt(attempt: &DecodeAttempt, threshold: f64, hint: Option<&str>) -> Match {
    let candidate = attempt.candidate;
    let mess = mess_ratio_with(&attempt.text, ByteView::for_codec(candidate.codec), threshold);
    let coherence = if mess <= threshold {
        coherence_ratio(&attempt.text, candidate.family)
    } else {
        Vec::new()
    };

    let best_coherence = coherence.first().map_or(0.0, |(_, ratio)| *ratio);
    let languages = if coherence.is_empty() {
        candidate
            .family
            .languages()
            .iter()
            .map(|l| l.to_string())
            .collect()
    } else {
        coherence.into_iter().map(|(language, _)| language).collect()
    };

    debug!(
        "{}: mess {:.3}, coherence {:.3}, errors {}",
        candidate.name, mess, best_coherence, attempt.errors
    );

    Match {
        encoding: candidate.name,
        mess,
        coherence: best_coherence,
        languages,
        bom: false,
        hinted: hint == Some(candidate.name),
        errors: attempt.errors,
        preference: preference(candidate.name),
    }
}

/// Rank matches, keeping those at or under the mess threshold.
///
/// If none qualifies, the least-bad match is returned alone so callers always get an
/// answer.
pub fn rank(mut matches: Vec<Match>, threshold: f64) -> Vec<Match> {
    matches.sort_by(compare);
    let passing = matches.iter().filter(|m| m.mess <= threshold).count();
    if passing == 0 {
        if let Some(first) = matches.first() {
            warn!(
                "no candidate under mess threshold {threshold}; falling back to {} (mess {:.3})",
                first.encoding, first.mess
            );
        }
        matches.truncate(1);
    } else {
        matches.retain(|m| m.mess <= threshold);
    }
    matches
}
