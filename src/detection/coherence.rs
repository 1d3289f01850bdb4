//! Coherence analysis: how well decoded text matches known language letter rankings.

use foldhash::{HashMap, HashMapExt};

use super::frequencies::{LanguageProfile, profiles, variants};
use super::script::{Script, is_accentuated};
use crate::candidates::Family;

/// Ratios below this are not reported.
pub const COHERENCE_THRESHOLD: f64 = 0.1;
/// Layers with this many letters or fewer carry too little signal.
const TOO_SMALL_LAYER: usize = 32;
const SUFFICIENT_RATIO: f64 = 0.8;
const SUFFICIENT_MATCHES: usize = 3;
/// Share of reference letters a language must cover to be considered.
const ALPHABET_COVERAGE: f64 = 0.2;

/// A language and how well the text matched it.
pub type CoherenceMatch = (String, f64);

/// Letters of one script, most frequent first.
struct Layer {
    script: Script,
    ordered: Vec<char>,
    count: usize,
}

fn split_layers(text: &str) -> Vec<Layer> {
    let mut counts: HashMap<Script, HashMap<char, usize>> = HashMap::new();
    for c in text.chars().filter(|c| c.is_alphabetic()) {
        for lower in c.to_lowercase() {
            *counts
                .entry(Script::of(lower))
                .or_insert_with(HashMap::new)
                .entry(lower)
                .or_insert(0) += 1;
        }
    }

    let mut layers: Vec<Layer> = counts
        .into_iter()
        .map(|(script, letters)| {
            let count = letters.values().sum();
            let mut ranked: Vec<(char, usize)> = letters.into_iter().collect();
            // Sort by count descending, then by char for determinism
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
            Layer {
                script,
                ordered: ranked.into_iter().map(|(c, _)| c).collect(),
                count,
            }
        })
        .collect();
    layers.sort_by_key(|layer| layer.script);
    layers
}

/// Languages whose reference alphabet covers enough of `characters`.
///
/// With `ignore_non_latin`, only Latin-only languages are considered. Languages without
/// accents are skipped when the text has accented letters.
fn alphabet_languages(characters: &[char], ignore_non_latin: bool) -> Vec<&'static LanguageProfile> {
    let source_have_accents = characters.iter().any(|&c| is_accentuated(c));

    let mut languages: Vec<(&'static LanguageProfile, f64)> = profiles()
        .iter()
        .filter(|p| !(ignore_non_latin && !p.pure_latin))
        .filter(|p| !(source_have_accents && !p.have_accents))
        .filter_map(|p| {
            let matched = p.characters.iter().filter(|&c| characters.contains(c)).count();
            let coverage = matched as f64 / p.characters.len() as f64;
            (coverage >= ALPHABET_COVERAGE).then_some((p, coverage))
        })
        .collect();
    languages.sort_by(|a, b| b.1.total_cmp(&a.1));
    languages.into_iter().map(|(p, _)| p).collect()
}

/// Compare the observed ranking against a language's reference ranking.
///
/// A letter is approved when its projected rank lands close to its reference rank, or when
/// enough of the letters ranked before or after it agree with the reference.
pub fn characters_popularity_compare(language: &LanguageProfile, ordered: &[char]) -> f64 {
    if ordered.is_empty() {
        return 0.0;
    }
    let reference = &language.characters;
    let reference_count = reference.len();
    let large_alphabet = reference_count > 26;
    let projection = reference_count as f64 / ordered.len() as f64;

    let mut approved = 0usize;
    for (rank, c) in ordered.iter().enumerate() {
        let Some(reference_rank) = reference.iter().position(|r| r == c) else {
            continue;
        };
        let projected = (rank as f64 * projection) as usize;
        let distance = projected.abs_diff(reference_rank);

        if !large_alphabet && distance > 4 {
            continue;
        }
        if large_alphabet && (distance as f64) < reference_count as f64 / 3.0 {
            approved += 1;
            continue;
        }

        let before_source = &reference[..reference_rank];
        let after_source = &reference[reference_rank..];
        let before = &ordered[..rank];
        let after = &ordered[rank..];

        let before_matches = before.iter().filter(|&c| before_source.contains(c)).count();
        let after_matches = after.iter().filter(|&c| after_source.contains(c)).count();

        if before_source.is_empty() && before_matches <= 4 {
            approved += 1;
            continue;
        }
        if before_matches as f64 / before_source.len().max(1) as f64 >= 0.4
            || after_matches as f64 / after_source.len() as f64 >= 0.4
        {
            approved += 1;
        }
    }
    approved as f64 / ordered.len() as f64
}

/// Fold `—` variants into their base language, keeping the best ratio of each.
///
/// ```
/// use charset_nose::detection::coherence::filter_alt_coherence_matches;
///
/// let merged = filter_alt_coherence_matches(vec![
///     ("English".to_string(), 0.88),
///     ("English—".to_string(), 0.99),
/// ]);
/// assert_eq!(merged, vec![("English".to_string(), 0.99)]);
/// ```
pub fn filter_alt_coherence_matches(results: Vec<CoherenceMatch>) -> Vec<CoherenceMatch> {
    let mut merged: Vec<CoherenceMatch> = Vec::with_capacity(results.len());
    for (language, ratio) in results {
        let base = language.trim_end_matches('—');
        match merged.iter_mut().find(|(name, _)| name == base) {
            Some((_, best)) => *best = best.max(ratio),
            None => merged.push((base.to_string(), ratio)),
        }
    }
    merged
}

/// Languages to try for a layer of text decoded with an encoding of `family`.
fn layer_languages(family: Family, layer: &Layer) -> Vec<&'static LanguageProfile> {
    if family.is_open() {
        return alphabet_languages(&layer.ordered, family == Family::Latin);
    }
    family
        .languages()
        .iter()
        .flat_map(|&language| variants(language))
        .filter(|p| p.script == layer.script)
        .collect()
}

/// Score the language coherence of `text` decoded with an encoding of `family`.
///
/// Returns languages best-first; an empty list means nothing cleared the threshold.
pub fn coherence_ratio(text: &str, family: Family) -> Vec<CoherenceMatch> {
    let mut totals: Vec<(&'static str, f64, usize)> = Vec::new();
    let mut sufficient = 0usize;

    'layers: for layer in split_layers(text) {
        if layer.count <= TOO_SMALL_LAYER {
            continue;
        }
        for language in layer_languages(family, &layer) {
            let ratio = characters_popularity_compare(language, &layer.ordered);
            if ratio < COHERENCE_THRESHOLD {
                continue;
            }
            if ratio >= SUFFICIENT_RATIO {
                sufficient += 1;
            }
            match totals.iter_mut().find(|(name, _, _)| *name == language.name) {
                Some((_, sum, n)) => {
                    *sum += ratio;
                    *n += 1;
                }
                None => totals.push((language.name, ratio, 1)),
            }
            if sufficient >= SUFFICIENT_MATCHES {
                break 'layers;
            }
        }
    }

    let averaged = totals
        .into_iter()
        .map(|(name, sum, n)| (name.to_string(), round4(sum / n as f64)))
        .collect();
    let mut results = filter_alt_coherence_matches(averaged);
    results.sort_by(|a, b| b.1.total_cmp(&a.1));
    results
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::frequencies::profile;

    const ENGLISH: &str = "It was the best of times, it was the worst of times, it was the age \
        of wisdom, it was the age of foolishness, it was the epoch of belief, it was the epoch \
        of incredulity, it was the season of Light, it was the season of Darkness, it was the \
        spring of hope, it was the winter of despair, we had everything before us, we had \
        nothing before us, we were all going direct to Heaven, we were all going direct the \
        other way.";

    const RUSSIAN: &str = "Все счастливые семьи похожи друг на друга, каждая несчастливая семья \
        несчастлива по-своему. Все смешалось в доме Облонских. Жена узнала, что муж был в связи \
        с бывшею в их доме француженкою-гувернанткой, и объявила мужу, что не может жить с ним \
        в одном доме.";

    fn owned(pairs: &[(&str, f64)]) -> Vec<CoherenceMatch> {
        pairs.iter().map(|&(n, r)| (n.to_string(), r)).collect()
    }

    #[test]
    fn test_filter_alt_coherence_matches() {
        assert_eq!(
            filter_alt_coherence_matches(owned(&[("English", 0.88), ("English—", 0.99)])),
            owned(&[("English", 0.99)])
        );
        assert_eq!(
            filter_alt_coherence_matches(owned(&[
                ("English", 0.88),
                ("English—", 0.99),
                ("English——", 0.999)
            ])),
            owned(&[("English", 0.999)])
        );
        assert_eq!(
            filter_alt_coherence_matches(owned(&[("English", 0.88), ("English—", 0.77)])),
            owned(&[("English", 0.88)])
        );
        assert_eq!(
            filter_alt_coherence_matches(owned(&[("English", 0.88), ("Italian", 0.77)])),
            owned(&[("English", 0.88), ("Italian", 0.77)])
        );
    }

    #[test]
    fn test_identical_ranking_is_fully_coherent() {
        let english = profile("English").unwrap();
        let ratio = characters_popularity_compare(english, &english.characters);
        assert_eq!(ratio, 1.0);
    }

    #[test]
    fn test_english_text() {
        let results = coherence_ratio(ENGLISH, Family::Latin);
        assert!(!results.is_empty());
        assert_eq!(results[0].0, "English");
        assert!(results[0].1 >= 0.5);
    }

    #[test]
    fn test_russian_text() {
        let results = coherence_ratio(RUSSIAN, Family::Cyrillic);
        assert!(!results.is_empty());
        assert_eq!(results[0].0, "Russian");
    }

    #[test]
    fn test_short_text_has_no_layers() {
        assert!(coherence_ratio("Hello there", Family::Latin).is_empty());
    }

    #[test]
    fn test_results_sorted_descending() {
        let results = coherence_ratio(ENGLISH, Family::Unicode);
        for pair in results.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
    }
}
