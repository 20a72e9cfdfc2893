//! N-gram extraction engine
//!
//! Builds sliding windows of n consecutive annotated tokens inside document
//! ranges, runs them through the [`FilterPipeline`](crate::gram_filter::FilterPipeline),
//! and aggregates the survivors into a descending frequency table plus the
//! by-first-word auxiliary map consumed by the association measures.
//!
//! Two scopes are supported:
//! - [`NgramEngine::extract`] scans one address predicate in a single pass
//!   (the sub-corpus query);
//! - [`NgramEngine::extract_two_phase`] aggregates per document and then
//!   backfills the head of the distribution with first-word-scoped rescans,
//!   bounded by [`NgramConfig::backfill_cap`]. Exhaustive corpus-wide counts
//!   for rare grams outside the cap are deliberately not guaranteed.

use crate::address::{AddressPredicate, Document};
use crate::error::{CollocateError, Result};
use crate::gram_filter::{Candidate, FilterPipeline, GramFilter, PosTagExpander};
use crate::schema::Layer;
use crate::store::{Token, TokenStore};
use std::collections::HashMap;
use std::collections::HashSet;

/// Separator between the words of a gram key.
pub const NGRAM_SEPARATOR: char = '+';

/// Default bound on the phase-2 backfill (the head of the distribution).
pub const DEFAULT_BACKFILL_CAP: usize = 2000;

/// The required-word stage of an extraction, if any.
#[derive(Debug, Clone)]
pub struct RequiredWord {
    /// The word (or lemma) a gram must contain in one of its slots.
    pub word: String,
    /// Match against lemmas instead of layer forms.
    pub match_lemma: bool,
    /// Also accept either half of a `#`-marked compound lemma.
    pub split_compounds: bool,
}

/// Configuration of one extraction run.
#[derive(Debug, Clone)]
pub struct NgramConfig {
    /// Gram order, at least 2.
    pub n: usize,
    /// Retain only grams with count strictly greater than this.
    pub min_count: u64,
    /// Optional required-word filter.
    pub include_word: Option<RequiredWord>,
    /// Optional POS category patterns, each of length `n`.
    pub pos_patterns: Vec<Vec<String>>,
    /// Phase-2 bound for the corpus-wide variant.
    pub backfill_cap: usize,
}

impl NgramConfig {
    /// Configuration for order `n` with all optional filters off.
    pub fn new(n: usize) -> Result<Self> {
        if n < 2 {
            return Err(CollocateError::Config(format!(
                "ngram order must be at least 2, got {n}"
            )));
        }
        Ok(Self {
            n,
            min_count: 0,
            include_word: None,
            pos_patterns: Vec::new(),
            backfill_cap: DEFAULT_BACKFILL_CAP,
        })
    }
}

/// Result of an extraction: the retained grams sorted descending by count
/// (ties ascending by gram text), and the total count of each distinct first
/// word across the retained grams.
#[derive(Debug, Clone, Default)]
pub struct NgramExtract {
    pub frequencies: Vec<(String, u64)>,
    pub by_first_word: HashMap<String, u64>,
}

impl NgramExtract {
    /// Look up the count for a gram key.
    pub fn count(&self, gram: &str) -> Option<u64> {
        self.frequencies
            .iter()
            .find(|(g, _)| g == gram)
            .map(|&(_, c)| c)
    }
}

/// Sort a frequency map into the presentation order: count descending, then
/// gram text ascending for reproducible ties.
pub fn sort_descending(counts: HashMap<String, u64>) -> Vec<(String, u64)> {
    let mut rows: Vec<(String, u64)> = counts.into_iter().collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows
}

/// The extraction engine: a token store plus the layer and language it reads.
pub struct NgramEngine<'a> {
    store: &'a dyn TokenStore,
    layer: Layer,
    language: &'a str,
    expander: &'a dyn PosTagExpander,
}

impl<'a> NgramEngine<'a> {
    pub fn new(
        store: &'a dyn TokenStore,
        layer: Layer,
        language: &'a str,
        expander: &'a dyn PosTagExpander,
    ) -> Self {
        Self {
            store,
            layer,
            language,
            expander,
        }
    }

    /// Extract grams in a single pass over `addresses`.
    pub fn extract(
        &self,
        config: &NgramConfig,
        addresses: &AddressPredicate,
        stopwords: &HashSet<String>,
    ) -> Result<NgramExtract> {
        let pipeline = self.build_pipeline(config, stopwords)?;
        let mut counts: HashMap<String, u64> = HashMap::new();
        for &(start, end) in addresses.ranges() {
            self.count_range(config.n, &pipeline, start, end, None, &mut counts)?;
        }
        Ok(Self::aggregate(counts, config.min_count))
    }

    /// Two-phase corpus-wide extraction over `documents`.
    ///
    /// Phase 1 sums exact per-document counts. Phase 2 rescans the store for
    /// each of the `backfill_cap` most frequent grams, restricted only by the
    /// gram's first word, and merges grams not already present; existing
    /// counts are never overwritten, so a second run adds nothing.
    pub fn extract_two_phase(
        &self,
        config: &NgramConfig,
        documents: &[Document],
        stopwords: &HashSet<String>,
    ) -> Result<NgramExtract> {
        let pipeline = self.build_pipeline(config, stopwords)?;

        let mut counts: HashMap<String, u64> = HashMap::new();
        for doc in documents {
            let mut doc_counts: HashMap<String, u64> = HashMap::new();
            self.count_range(
                config.n,
                &pipeline,
                doc.start_id,
                doc.end_id,
                None,
                &mut doc_counts,
            )?;
            for (gram, count) in doc_counts {
                *counts.entry(gram).or_insert(0) += count;
            }
        }
        let phase1 = Self::aggregate(counts, config.min_count);
        tracing::debug!(grams = phase1.frequencies.len(), "phase-1 extraction done");

        // Backfill the head of the distribution: rescan with the first word
        // pinned, at store scope, and merge only previously unseen grams.
        let segments = self.store.segments()?;
        let head: Vec<String> = phase1
            .frequencies
            .iter()
            .take(config.backfill_cap)
            .map(|(gram, _)| {
                gram.split(NGRAM_SEPARATOR)
                    .next()
                    .unwrap_or_default()
                    .to_string()
            })
            .collect();

        let mut merged: HashMap<String, u64> = phase1.frequencies.iter().cloned().collect();
        let mut added = 0usize;
        let mut seen_first_words: HashSet<String> = HashSet::new();
        for first_word in head {
            // The same first word may head many grams; one rescan suffices.
            if !seen_first_words.insert(first_word.clone()) {
                continue;
            }
            let mut scoped: HashMap<String, u64> = HashMap::new();
            for &(start, end) in &segments {
                self.count_range(
                    config.n,
                    &pipeline,
                    start,
                    end,
                    Some(&first_word),
                    &mut scoped,
                )?;
            }
            for (gram, count) in Self::aggregate(scoped, config.min_count).frequencies {
                if !merged.contains_key(&gram) {
                    merged.insert(gram, count);
                    added += 1;
                }
            }
        }
        tracing::debug!(added, "phase-2 backfill merged");
        Ok(Self::aggregate_sorted(merged))
    }

    fn build_pipeline(
        &self,
        config: &NgramConfig,
        stopwords: &HashSet<String>,
    ) -> Result<FilterPipeline> {
        if config.n < 2 {
            return Err(CollocateError::Config(format!(
                "ngram order must be at least 2, got {}",
                config.n
            )));
        }
        let required = config.include_word.as_ref().map(|req| {
            GramFilter::required_word(&req.word, req.match_lemma, req.split_compounds)
        });
        let pos = if config.pos_patterns.is_empty() {
            None
        } else {
            Some(GramFilter::pos_patterns(
                &config.pos_patterns,
                config.n,
                self.language,
                self.expander,
            )?)
        };
        Ok(FilterPipeline::new(stopwords, required, pos))
    }

    /// Count filtered windows of one inclusive range into `counts`.
    ///
    /// Windows are assembled from the tokens inside the range only, so a
    /// lookahead can never cross the range's end boundary.
    fn count_range(
        &self,
        n: usize,
        pipeline: &FilterPipeline,
        start: u64,
        end: u64,
        first_word: Option<&str>,
        counts: &mut HashMap<String, u64>,
    ) -> Result<()> {
        let tokens = self.store.tokens_in(start, end)?;
        if tokens.len() < n {
            return Ok(());
        }
        for window in tokens.windows(n) {
            let candidate = self.candidate(window);
            if let Some(first) = first_word {
                if candidate.forms[0] != first {
                    continue;
                }
            }
            if pipeline.accepts(&candidate) {
                let key = candidate.joined(NGRAM_SEPARATOR);
                *counts.entry(key).or_insert(0) += 1;
            }
        }
        Ok(())
    }

    fn candidate(&self, window: &[Token]) -> Candidate {
        Candidate {
            forms: window
                .iter()
                .map(|t| t.layer_value(self.layer).to_lowercase())
                .collect(),
            pos: window.iter().map(|t| t.pos.clone()).collect(),
            lemmas: window.iter().map(|t| t.lemma.clone()).collect(),
        }
    }

    /// Apply the strict `min_count` threshold, sort, and derive the
    /// by-first-word totals over the retained grams.
    fn aggregate(counts: HashMap<String, u64>, min_count: u64) -> NgramExtract {
        let retained: HashMap<String, u64> = counts
            .into_iter()
            .filter(|&(_, count)| count > min_count)
            .collect();
        Self::aggregate_sorted(retained)
    }

    fn aggregate_sorted(retained: HashMap<String, u64>) -> NgramExtract {
        let frequencies = sort_descending(retained);
        let mut by_first_word: HashMap<String, u64> = HashMap::new();
        for (gram, count) in &frequencies {
            let first = gram.split(NGRAM_SEPARATOR).next().unwrap_or_default();
            *by_first_word.entry(first.to_string()).or_insert(0) += count;
        }
        NgramExtract {
            frequencies,
            by_first_word,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::compute_addresses;
    use crate::gram_filter::UdTagset;
    use crate::store::MemoryStore;

    const CORPUS: &str = "\
#doc alpha
the\tDET\tthe
quick\tADJ\tquick
fox\tNOUN\tfox
#doc beta
the\tDET\tthe
lazy\tADJ\tlazy
fox\tNOUN\tfox
";

    fn docs(store: &MemoryStore) -> Vec<Document> {
        store
            .documents()
            .iter()
            .map(|d| Document::from_stored(d, "en"))
            .collect()
    }

    fn engine(store: &MemoryStore) -> NgramEngine<'_> {
        NgramEngine::new(store, Layer::Token, "en", &UdTagset)
    }

    #[test]
    fn test_stopword_filtering_end_to_end() {
        // 2 documents, 6 tokens, stopwords = {"the"}: the grams touching
        // "the" are voided, and windows never cross the document boundary,
        // so "fox+the" does not even get assembled.
        let store = MemoryStore::parse(CORPUS).unwrap();
        let stopwords = HashSet::from(["the".to_string()]);
        let config = NgramConfig::new(2).unwrap();

        let addresses = compute_addresses(&docs(&store));
        let extract = engine(&store).extract(&config, &addresses, &stopwords).unwrap();

        assert_eq!(
            extract.frequencies,
            vec![
                ("lazy+fox".to_string(), 1),
                ("quick+fox".to_string(), 1)
            ]
        );
        assert_eq!(extract.by_first_word.get("lazy"), Some(&1));
        assert_eq!(extract.by_first_word.get("quick"), Some(&1));
    }

    #[test]
    fn test_windows_never_cross_document_boundary() {
        // Without any stopwords, "fox+the" would only appear if a window
        // spanned the alpha/beta boundary.
        let store = MemoryStore::parse(CORPUS).unwrap();
        let config = NgramConfig::new(2).unwrap();
        let addresses = compute_addresses(&docs(&store));
        let extract = engine(&store)
            .extract(&config, &addresses, &HashSet::new())
            .unwrap();
        assert!(extract.count("fox+the").is_none());
        assert_eq!(extract.count("the+quick"), Some(1));
        assert_eq!(extract.count("the+lazy"), Some(1));
    }

    #[test]
    fn test_empty_address_predicate_yields_nothing() {
        let store = MemoryStore::parse(CORPUS).unwrap();
        let config = NgramConfig::new(2).unwrap();
        let extract = engine(&store)
            .extract(&config, &compute_addresses(&[]), &HashSet::new())
            .unwrap();
        assert!(extract.frequencies.is_empty());
        assert!(extract.by_first_word.is_empty());
    }

    #[test]
    fn test_min_count_is_strict() {
        let store = MemoryStore::parse(CORPUS).unwrap();
        let mut config = NgramConfig::new(2).unwrap();
        config.min_count = 1;
        let addresses = compute_addresses(&docs(&store));
        let extract = engine(&store)
            .extract(&config, &addresses, &HashSet::new())
            .unwrap();
        // Every bigram here occurs exactly once; 1 > 1 is false.
        assert!(extract.frequencies.is_empty());
    }

    #[test]
    fn test_order_below_two_is_config_error() {
        assert!(matches!(
            NgramConfig::new(1),
            Err(CollocateError::Config(_))
        ));
    }

    #[test]
    fn test_trigram_extraction() {
        let store = MemoryStore::parse(CORPUS).unwrap();
        let config = NgramConfig::new(3).unwrap();
        let addresses = compute_addresses(&docs(&store));
        let extract = engine(&store)
            .extract(&config, &addresses, &HashSet::new())
            .unwrap();
        assert_eq!(extract.count("the+quick+fox"), Some(1));
        assert_eq!(extract.count("the+lazy+fox"), Some(1));
        assert_eq!(extract.frequencies.len(), 2);
    }

    #[test]
    fn test_grams_are_case_folded() {
        let store = MemoryStore::parse("#doc a\nThe\tDET\tthe\nFox\tNOUN\tfox\n").unwrap();
        let config = NgramConfig::new(2).unwrap();
        let addresses = compute_addresses(&docs(&store));
        let extract = engine(&store)
            .extract(&config, &addresses, &HashSet::new())
            .unwrap();
        assert_eq!(extract.count("the+fox"), Some(1));
    }

    #[test]
    fn test_lemma_layer_builds_grams_from_lemmas() {
        let store = MemoryStore::parse("#doc a\nquick\tADJ\tquick\nfoxes\tNOUN\tfox\n").unwrap();
        let config = NgramConfig::new(2).unwrap();
        let addresses = compute_addresses(&docs(&store));
        let eng = NgramEngine::new(&store, Layer::Lemma, "en", &UdTagset);
        let extract = eng.extract(&config, &addresses, &HashSet::new()).unwrap();
        assert_eq!(extract.count("quick+fox"), Some(1));
    }

    #[test]
    fn test_pos_pattern_restricts_output() {
        let store = MemoryStore::parse(CORPUS).unwrap();
        let mut config = NgramConfig::new(2).unwrap();
        config.pos_patterns = vec![vec!["adjective".to_string(), "noun".to_string()]];
        let addresses = compute_addresses(&docs(&store));
        let extract = engine(&store)
            .extract(&config, &addresses, &HashSet::new())
            .unwrap();
        assert_eq!(extract.count("quick+fox"), Some(1));
        assert_eq!(extract.count("lazy+fox"), Some(1));
        assert!(extract.count("the+quick").is_none());
    }

    #[test]
    fn test_required_word_and_pos_pattern_combine_via_and() {
        let store = MemoryStore::parse(CORPUS).unwrap();
        let mut config = NgramConfig::new(2).unwrap();
        config.include_word = Some(RequiredWord {
            word: "lazy".to_string(),
            match_lemma: false,
            split_compounds: false,
        });
        config.pos_patterns = vec![vec!["adjective".to_string(), "noun".to_string()]];
        let addresses = compute_addresses(&docs(&store));
        let extract = engine(&store)
            .extract(&config, &addresses, &HashSet::new())
            .unwrap();
        assert_eq!(extract.count("lazy+fox"), Some(1));
        assert!(extract.count("quick+fox").is_none());
    }

    #[test]
    fn test_descending_sort_with_lexicographic_tie_break() {
        let input = "#doc a\n\
b\tX\tb\nb\tX\tb\nb\tX\tb\na\tX\ta\na\tX\ta\na\tX\ta\nz\tX\tz\n";
        let store = MemoryStore::parse(input).unwrap();
        let config = NgramConfig::new(2).unwrap();
        let addresses = compute_addresses(&docs(&store));
        let extract = engine(&store)
            .extract(&config, &addresses, &HashSet::new())
            .unwrap();
        // a+a and b+b both occur twice; the tie resolves lexicographically,
        // then the singletons follow in lexicographic order.
        assert_eq!(extract.frequencies[0], ("a+a".to_string(), 2));
        assert_eq!(extract.frequencies[1], ("b+b".to_string(), 2));
        let tail: Vec<&str> = extract.frequencies[2..]
            .iter()
            .map(|(g, _)| g.as_str())
            .collect();
        assert_eq!(tail, vec!["a+z", "b+a"]);
    }

    #[test]
    fn test_two_phase_sums_per_document_counts() {
        let input = "\
#doc a
red\tADJ\tred
car\tNOUN\tcar
#doc b
red\tADJ\tred
car\tNOUN\tcar
";
        let store = MemoryStore::parse(input).unwrap();
        let config = NgramConfig::new(2).unwrap();
        let extract = engine(&store)
            .extract_two_phase(&config, &docs(&store), &HashSet::new())
            .unwrap();
        assert_eq!(extract.count("red+car"), Some(2));
    }

    #[test]
    fn test_two_phase_backfill_never_decreases_and_is_idempotent() {
        let store = MemoryStore::parse(CORPUS).unwrap();
        let config = NgramConfig::new(2).unwrap();
        let eng = engine(&store);
        let docs = docs(&store);

        let first = eng
            .extract_two_phase(&config, &docs, &HashSet::new())
            .unwrap();
        let second = eng
            .extract_two_phase(&config, &docs, &HashSet::new())
            .unwrap();

        // Idempotent: re-running produces the identical table.
        assert_eq!(first.frequencies, second.frequencies);

        // Backfill never decreased any phase-1 count.
        let addresses = compute_addresses(&docs);
        let phase1_only = eng.extract(&config, &addresses, &HashSet::new()).unwrap();
        for (gram, count) in &phase1_only.frequencies {
            assert!(first.count(gram).unwrap_or(0) >= *count);
        }
    }

    #[test]
    fn test_two_phase_backfill_recovers_grams_outside_subcorpus_head() {
        // Sub-corpus of only document "a"; the backfill scans whole-store
        // segments for the head first words, so "the+lazy" (document b,
        // first word "the") gets merged in.
        let input = "\
#doc a
the\tDET\tthe
quick\tADJ\tquick
#doc b
the\tDET\tthe
lazy\tADJ\tlazy
";
        let store = MemoryStore::parse(input).unwrap();
        let config = NgramConfig::new(2).unwrap();
        let only_a: Vec<Document> = docs(&store).into_iter().take(1).collect();
        let extract = engine(&store)
            .extract_two_phase(&config, &only_a, &HashSet::new())
            .unwrap();
        assert_eq!(extract.count("the+quick"), Some(1));
        assert_eq!(extract.count("the+lazy"), Some(1));
    }

    #[test]
    fn test_backfill_cap_zero_disables_phase_two() {
        let input = "\
#doc a
the\tDET\tthe
quick\tADJ\tquick
#doc b
the\tDET\tthe
lazy\tADJ\tlazy
";
        let store = MemoryStore::parse(input).unwrap();
        let mut config = NgramConfig::new(2).unwrap();
        config.backfill_cap = 0;
        let only_a: Vec<Document> = docs(&store).into_iter().take(1).collect();
        let extract = engine(&store)
            .extract_two_phase(&config, &only_a, &HashSet::new())
            .unwrap();
        assert_eq!(extract.count("the+quick"), Some(1));
        assert!(extract.count("the+lazy").is_none());
    }
}
