//! Output table builders
//!
//! Joins the frequency caches with the association measures into ordered
//! rows. A gram whose measures are undefined (or whose constituent data is
//! missing) is dropped from the table, never zero-filled; every builder
//! reports how many grams it dropped so partial results stay observable.

use crate::corpus::{Corpus, NgramStats};
use crate::error::{CollocateError, Result};
use crate::measures::{chain_rule, log_likelihood, naive_bayes_salience, pmi};
use crate::ngram::NGRAM_SEPARATOR;
use serde::Serialize;
use std::collections::HashMap;

/// Success prior of the topic-word salience score.
pub const TOPIC_COEF_SUCCESS: f64 = 0.95;
/// Failure prior of the topic-word salience score.
pub const TOPIC_COEF_FAIL: f64 = 0.05;

/// One scored n-gram row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NgramRow {
    pub ngram: String,
    pub freq: u64,
    pub ll: f64,
    pub pmi: f64,
}

/// One topic-word row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicWordRow {
    pub lemma: String,
    pub freq: u64,
    pub nb: f64,
}

/// A scored n-gram table with its dropped-gram count.
#[derive(Debug, Clone, Serialize)]
pub struct NgramTable {
    pub rows: Vec<NgramRow>,
    pub dropped: u64,
}

/// A topic-word table with its dropped-lemma count.
#[derive(Debug, Clone, Serialize)]
pub struct TopicWordTable {
    pub rows: Vec<TopicWordRow>,
    pub dropped: u64,
}

/// Build the scored bigram table and populate the order-2 stats cache.
///
/// Requires the order-2 extraction, the word frequencies and the total word
/// count to be computed; rows keep the extraction's presentation order.
pub fn bigram_table(corpus: &mut Corpus) -> Result<NgramTable> {
    let (extract, order) = corpus
        .ngrams()
        .ok_or_else(|| CollocateError::Precondition("ngram frequencies not computed".into()))?;
    if order != 2 {
        return Err(CollocateError::Precondition(format!(
            "bigram table requested over an order-{order} extraction"
        )));
    }
    let total = corpus.total_words();
    if total == 0 {
        return Err(CollocateError::Precondition(
            "total word count not computed".into(),
        ));
    }

    let frequencies = extract.frequencies.clone();
    let mut rows = Vec::with_capacity(frequencies.len());
    let mut stats: HashMap<String, NgramStats> = HashMap::with_capacity(frequencies.len());
    let mut dropped = 0u64;

    for (gram, freq) in frequencies {
        let scored = score_bigram(corpus, &gram, freq, total);
        match scored {
            Some((ll, pmi)) => {
                rows.push(NgramRow {
                    ngram: gram.clone(),
                    freq,
                    ll,
                    pmi,
                });
                stats.insert(
                    gram,
                    NgramStats {
                        freq,
                        ll: Some(ll),
                        pmi: Some(pmi),
                    },
                );
            }
            None => {
                dropped += 1;
                stats.insert(
                    gram,
                    NgramStats {
                        freq,
                        ll: None,
                        pmi: None,
                    },
                );
            }
        }
    }

    corpus.ngramdata.insert(2, stats);
    Ok(NgramTable { rows, dropped })
}

fn score_bigram(corpus: &Corpus, gram: &str, freq: u64, total: u64) -> Option<(f64, f64)> {
    let mut words = gram.split(NGRAM_SEPARATOR);
    let first = words.next()?;
    let second = words.next()?;

    let freq_a = corpus.word_frequency(first);
    let freq_b = corpus.word_frequency(second);
    let firstpos = corpus.ngram_frequency_by_first_word(first);
    let (Some(freq_a), Some(freq_b), Some(firstpos)) = (freq_a, freq_b, firstpos) else {
        tracing::warn!(gram, "dropped: missing constituent frequency");
        return None;
    };

    let ll = log_likelihood(freq, firstpos, freq_a, freq_b, total);
    let pmi = pmi(freq, freq_a, freq_b, total);
    match (ll, pmi) {
        (Ok(ll), Ok(pmi)) => Some((ll, pmi)),
        (Err(err), _) | (_, Err(err)) => {
            tracing::warn!(gram, %err, "dropped: undefined association measure");
            None
        }
    }
}

/// Build the n>2 table via the chain rule over the cached bigram scores.
///
/// Hard precondition: [`bigram_table`] must have populated the order-2 cache.
/// A gram with any missing (or unscored) constituent bigram is absent from
/// the output entirely.
pub fn chain_rule_table(corpus: &mut Corpus, n: usize) -> Result<NgramTable> {
    if n < 3 {
        return Err(CollocateError::Config(format!(
            "chain-rule table requires order above 2, got {n}"
        )));
    }
    let bigrams = corpus
        .ngramdata(2)
        .ok_or_else(|| {
            CollocateError::Precondition("order-2 stats not cached before n>2 scoring".into())
        })?
        .clone();
    let (extract, order) = corpus
        .ngrams()
        .ok_or_else(|| CollocateError::Precondition("ngram frequencies not computed".into()))?;
    if order != n {
        return Err(CollocateError::Precondition(format!(
            "order-{n} table requested over an order-{order} extraction"
        )));
    }

    let frequencies = extract.frequencies.clone();
    let mut rows = Vec::new();
    let mut stats: HashMap<String, NgramStats> = HashMap::with_capacity(frequencies.len());
    let mut dropped = 0u64;

    for (gram, freq) in frequencies {
        let words: Vec<&str> = gram.split(NGRAM_SEPARATOR).collect();
        match chain_rule(&words, |key| {
            bigrams.get(key).and_then(|s| s.ll.zip(s.pmi))
        }) {
            Some((ll, pmi)) => {
                rows.push(NgramRow {
                    ngram: gram.clone(),
                    freq,
                    ll,
                    pmi,
                });
                stats.insert(
                    gram,
                    NgramStats {
                        freq,
                        ll: Some(ll),
                        pmi: Some(pmi),
                    },
                );
            }
            None => {
                tracing::warn!(gram, "dropped: constituent bigram missing from cache");
                dropped += 1;
                stats.insert(
                    gram,
                    NgramStats {
                        freq,
                        ll: None,
                        pmi: None,
                    },
                );
            }
        }
    }

    corpus.ngramdata.insert(n, stats);
    Ok(NgramTable { rows, dropped })
}

/// Build the topic-word table: noun lemmas ranked with the naive-Bayes
/// salience score.
pub fn topic_word_table(
    corpus: &Corpus,
    coef_success: f64,
    coef_fail: f64,
) -> Result<TopicWordTable> {
    let total = corpus.total_words();
    if total == 0 {
        return Err(CollocateError::Precondition(
            "total word count not computed".into(),
        ));
    }
    let mut rows = Vec::new();
    let mut dropped = 0u64;
    for (lemma, freq) in corpus.noun_frequency_table() {
        match naive_bayes_salience(total, freq, coef_success, coef_fail) {
            Ok(nb) => rows.push(TopicWordRow { lemma, freq, nb }),
            Err(err) => {
                tracing::warn!(lemma, %err, "dropped: undefined salience score");
                dropped += 1;
            }
        }
    }
    Ok(TopicWordTable { rows, dropped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gram_filter::UdTagset;
    use crate::ngram::NgramConfig;
    use crate::schema::SchemaDescriptor;
    use crate::store::MemoryStore;
    use std::collections::HashSet;

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

    fn prepared<'a>(store: &'a MemoryStore, expander: &'a UdTagset) -> Corpus<'a> {
        let mut c = Corpus::new(store, expander, "en", SchemaDescriptor::tokens());
        c.set_full_corpus().unwrap();
        c.set_stopwords(HashSet::from(["the".to_string()]));
        c.count_all_words().unwrap();
        c.set_word_frequencies().unwrap();
        c
    }

    #[test]
    fn test_bigram_table_scores_retained_grams() {
        let store = MemoryStore::parse(CORPUS).unwrap();
        let expander = UdTagset;
        let mut c = prepared(&store, &expander);
        c.set_ngram_frequencies(&NgramConfig::new(2).unwrap()).unwrap();

        let table = bigram_table(&mut c).unwrap();
        assert_eq!(table.dropped, 0);
        assert_eq!(table.rows.len(), 2);

        let quick_fox = table.rows.iter().find(|r| r.ngram == "quick+fox").unwrap();
        assert_eq!(quick_fox.freq, 1);
        // PMI = log2((1/6) / ((1/6)*(2/6))) = log2(3)
        assert!((quick_fox.pmi - 3.0_f64.log2()).abs() < 1e-12);
        assert!(quick_fox.ll > 0.0);

        // The order-2 cache is populated for later chain-rule scoring.
        let stats = c.ngramdata(2).unwrap();
        assert_eq!(stats["quick+fox"].freq, 1);
        assert!(stats["quick+fox"].ll.is_some());
    }

    #[test]
    fn test_bigram_table_requires_order_two_extraction() {
        let store = MemoryStore::parse(CORPUS).unwrap();
        let expander = UdTagset;
        let mut c = prepared(&store, &expander);
        assert!(matches!(
            bigram_table(&mut c),
            Err(CollocateError::Precondition(_))
        ));

        c.set_ngram_frequencies(&NgramConfig::new(3).unwrap()).unwrap();
        assert!(matches!(
            bigram_table(&mut c),
            Err(CollocateError::Precondition(_))
        ));
    }

    #[test]
    fn test_chain_rule_before_bigram_cache_is_precondition_error() {
        let store = MemoryStore::parse(CORPUS).unwrap();
        let expander = UdTagset;
        let mut c = prepared(&store, &expander);
        c.set_ngram_frequencies(&NgramConfig::new(3).unwrap()).unwrap();
        assert!(matches!(
            chain_rule_table(&mut c, 3),
            Err(CollocateError::Precondition(_))
        ));
    }

    #[test]
    fn test_chain_rule_table_sums_constituent_scores() {
        let input = "\
#doc a
big\tADJ\tbig
red\tADJ\tred
fox\tNOUN\tfox
big\tADJ\tbig
red\tADJ\tred
fox\tNOUN\tfox
";
        let store = MemoryStore::parse(input).unwrap();
        let expander = UdTagset;
        let mut c = Corpus::new(&store, &expander, "en", SchemaDescriptor::tokens());
        c.set_full_corpus().unwrap();
        c.count_all_words().unwrap();
        c.set_word_frequencies().unwrap();

        c.set_ngram_frequencies(&NgramConfig::new(2).unwrap()).unwrap();
        let bigrams = bigram_table(&mut c).unwrap();
        let ll_of = |g: &str| bigrams.rows.iter().find(|r| r.ngram == g).unwrap().ll;
        let pmi_of = |g: &str| bigrams.rows.iter().find(|r| r.ngram == g).unwrap().pmi;
        let expected_ll = ll_of("big+red") + ll_of("red+fox");
        let expected_pmi = pmi_of("big+red") + pmi_of("red+fox");

        c.set_ngram_frequencies(&NgramConfig::new(3).unwrap()).unwrap();
        let trigrams = chain_rule_table(&mut c, 3).unwrap();
        let row = trigrams
            .rows
            .iter()
            .find(|r| r.ngram == "big+red+fox")
            .unwrap();
        assert_eq!(row.freq, 2);
        assert!((row.ll - expected_ll).abs() < 1e-9);
        assert!((row.pmi - expected_pmi).abs() < 1e-9);
    }

    #[test]
    fn test_chain_rule_drops_grams_with_missing_constituents() {
        // a+b occurs twice, every other bigram once; with min_count=1 the
        // order-2 cache holds only a+b, so every trigram lacks a
        // constituent and is dropped.
        let input = "\
#doc a
a\tX\ta
b\tX\tb
c\tX\tc
a\tX\ta
b\tX\tb
d\tX\td
";
        let store = MemoryStore::parse(input).unwrap();
        let expander = UdTagset;
        let mut c = Corpus::new(&store, &expander, "en", SchemaDescriptor::tokens());
        c.set_full_corpus().unwrap();
        c.count_all_words().unwrap();
        c.set_word_frequencies().unwrap();

        let mut bigram_config = NgramConfig::new(2).unwrap();
        bigram_config.min_count = 1;
        c.set_ngram_frequencies(&bigram_config).unwrap();
        bigram_table(&mut c).unwrap();

        c.set_ngram_frequencies(&NgramConfig::new(3).unwrap()).unwrap();
        let trigrams = chain_rule_table(&mut c, 3).unwrap();
        assert!(trigrams.rows.is_empty());
        assert_eq!(trigrams.dropped, 4);
    }

    #[test]
    fn test_chain_rule_order_mismatch_is_precondition_error() {
        let store = MemoryStore::parse(CORPUS).unwrap();
        let expander = UdTagset;
        let mut c = prepared(&store, &expander);
        c.set_ngram_frequencies(&NgramConfig::new(2).unwrap()).unwrap();
        bigram_table(&mut c).unwrap();
        // Extraction still holds order 2, so an order-3 table is premature.
        assert!(matches!(
            chain_rule_table(&mut c, 3),
            Err(CollocateError::Precondition(_))
        ));
    }

    #[test]
    fn test_topic_word_table_ranks_noun_lemmas() {
        let store = MemoryStore::parse(CORPUS).unwrap();
        let expander = UdTagset;
        let mut c = prepared(&store, &expander);
        c.set_stopwords(HashSet::new());
        c.set_noun_frequencies().unwrap();

        let table = topic_word_table(&c, TOPIC_COEF_SUCCESS, TOPIC_COEF_FAIL).unwrap();
        assert_eq!(table.dropped, 0);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].lemma, "fox");
        assert_eq!(table.rows[0].freq, 2);
        assert!(table.rows[0].nb.is_finite());
    }

    #[test]
    fn test_topic_word_table_requires_total() {
        let store = MemoryStore::parse(CORPUS).unwrap();
        let expander = UdTagset;
        let c = Corpus::new(&store, &expander, "en", SchemaDescriptor::tokens());
        assert!(matches!(
            topic_word_table(&c, TOPIC_COEF_SUCCESS, TOPIC_COEF_FAIL),
            Err(CollocateError::Precondition(_))
        ));
    }
}
