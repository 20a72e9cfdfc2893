//! Corpus aggregator: documents, stopwords and per-request caches
//!
//! A [`Corpus`] owns everything one statistics request touches: the selected
//! documents, the stopword set read at session start, and the cached
//! frequency tables. One instance per logical session; the caches are never
//! shared across concurrent computations.
//!
//! The merge logic lives here: per-document word/lemma frequencies summed
//! into corpus-wide maps, manual lemma corrections, and the orchestration of
//! the two-phase corpus-wide n-gram extraction. Association scores are
//! attached by the table builders in [`crate::table`], which also populate
//! `ngramdata` (keyed by gram order).

use crate::address::{compute_addresses, AddressPredicate, Document};
use crate::error::{CollocateError, Result};
use crate::gram_filter::PosTagExpander;
use crate::ngram::{sort_descending, NgramConfig, NgramEngine, NgramExtract};
use crate::schema::SchemaDescriptor;
use crate::store::TokenStore;
use std::collections::{HashMap, HashSet};

/// Cached statistics for one gram: its frequency and, once a table builder
/// has scored it, its association measures. `None` scores mark grams whose
/// measures were undefined (the gram was dropped from the scored table).
#[derive(Debug, Clone, PartialEq)]
pub struct NgramStats {
    pub freq: u64,
    pub ll: Option<f64>,
    pub pmi: Option<f64>,
}

/// The current (sub)corpus and its request-scoped caches.
pub struct Corpus<'a> {
    store: &'a dyn TokenStore,
    expander: &'a dyn PosTagExpander,
    language: String,
    schema: SchemaDescriptor,
    documents: Vec<Document>,
    stopwords: HashSet<String>,
    lemma_corrections: HashMap<String, String>,

    total_words: u64,
    word_frequencies: HashMap<String, u64>,
    noun_frequencies: HashMap<String, u64>,
    ngrams: Option<NgramExtract>,
    ngram_order: usize,
    /// gram order -> gram -> cached stats; `[2]` is the prerequisite for any
    /// n>2 scoring.
    pub(crate) ngramdata: HashMap<usize, HashMap<String, NgramStats>>,
}

impl<'a> Corpus<'a> {
    pub fn new(
        store: &'a dyn TokenStore,
        expander: &'a dyn PosTagExpander,
        language: &str,
        schema: SchemaDescriptor,
    ) -> Self {
        Self {
            store,
            expander,
            language: language.to_string(),
            schema,
            documents: Vec::new(),
            stopwords: HashSet::new(),
            lemma_corrections: HashMap::new(),
            total_words: 0,
            word_frequencies: HashMap::new(),
            noun_frequencies: HashMap::new(),
            ngrams: None,
            ngram_order: 0,
            ngramdata: HashMap::new(),
        }
    }

    /// Assemble a sub-corpus from document codes. Unknown codes are a
    /// configuration error.
    pub fn set_subcorpus(&mut self, codes: &[String]) -> Result<()> {
        let stored = self.store.stored_documents()?;
        let language = self.language.clone();
        for code in codes {
            let segment = stored
                .iter()
                .find(|d| &d.code == code)
                .ok_or_else(|| CollocateError::Config(format!("unknown document: {code}")))?;
            self.add_document(Document::from_stored(segment, &language));
        }
        Ok(())
    }

    /// Include every document the store holds.
    pub fn set_full_corpus(&mut self) -> Result<()> {
        let language = self.language.clone();
        for segment in self.store.stored_documents()? {
            self.add_document(Document::from_stored(&segment, &language));
        }
        Ok(())
    }

    /// Add one document; a document with the same code is replaced.
    pub fn add_document(&mut self, doc: Document) {
        if let Some(existing) = self.documents.iter_mut().find(|d| d.code == doc.code) {
            *existing = doc;
        } else {
            self.documents.push(doc);
        }
    }

    /// The documents of the sub-corpus, in insertion order.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// The address predicate scoping every aggregate scan. Recomputed on
    /// each call so it can never go stale after a document-set mutation.
    pub fn addresses(&self) -> AddressPredicate {
        compute_addresses(&self.documents)
    }

    /// Replace the stopword set (read once at session start).
    pub fn set_stopwords(&mut self, stopwords: HashSet<String>) {
        self.stopwords = stopwords.into_iter().map(|w| w.to_lowercase()).collect();
    }

    pub fn stopwords(&self) -> &HashSet<String> {
        &self.stopwords
    }

    /// Register a manual lemma remap applied after noun-frequency
    /// aggregation; the corrected key collides additively with any existing
    /// count.
    pub fn add_lemma_correction(&mut self, wrong: &str, fixed: &str) {
        self.lemma_corrections
            .insert(wrong.to_lowercase(), fixed.to_lowercase());
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Count the total number of tokens across the documents and cache it.
    pub fn count_all_words(&mut self) -> Result<u64> {
        let mut total = 0;
        for doc in &self.documents {
            total += self.store.count_in(doc.start_id, doc.end_id)?;
        }
        self.total_words = total;
        Ok(total)
    }

    pub fn total_words(&self) -> u64 {
        self.total_words
    }

    /// Number of documents, or the number of documents whose noun lemma
    /// table contains `word`.
    pub fn number_of_texts(&self, word: Option<&str>) -> Result<usize> {
        match word {
            None => Ok(self.documents.len()),
            Some(word) => {
                let word = word.to_lowercase();
                let mut n = 0;
                for doc in &self.documents {
                    if self.noun_frequencies_for(doc)?.contains_key(&word) {
                        n += 1;
                    }
                }
                Ok(n)
            }
        }
    }

    /// Per-document word frequencies summed into the corpus-wide map.
    /// Documents are iterated in insertion order.
    pub fn set_word_frequencies(&mut self) -> Result<()> {
        let mut merged: HashMap<String, u64> = HashMap::new();
        for doc in &self.documents {
            for token in self.store.tokens_in(doc.start_id, doc.end_id)? {
                let value = token.layer_value(self.schema.layer).to_lowercase();
                if value.is_empty() {
                    continue;
                }
                *merged.entry(value).or_insert(0) += 1;
            }
        }
        self.word_frequencies = merged;
        Ok(())
    }

    /// Word frequencies in one pass over the whole sub-corpus (the address
    /// predicate), without going document by document.
    pub fn set_word_frequencies_whole_corpus(&mut self) -> Result<()> {
        let mut merged: HashMap<String, u64> = HashMap::new();
        for &(start, end) in self.addresses().ranges() {
            for token in self.store.tokens_in(start, end)? {
                let value = token.layer_value(self.schema.layer).to_lowercase();
                if value.is_empty() {
                    continue;
                }
                *merged.entry(value).or_insert(0) += 1;
            }
        }
        self.word_frequencies = merged;
        Ok(())
    }

    /// Look up a cached word frequency (case-folded key).
    pub fn word_frequency(&self, word: &str) -> Option<u64> {
        self.word_frequencies.get(word).copied()
    }

    /// The cached word frequencies in presentation order (count descending,
    /// word ascending on ties).
    pub fn word_frequency_table(&self) -> Vec<(String, u64)> {
        sort_descending(self.word_frequencies.clone())
    }

    /// Noun frequencies by lemma across the documents: stopwords excluded,
    /// manual corrections applied, collisions additive.
    pub fn set_noun_frequencies(&mut self) -> Result<()> {
        let mut merged: HashMap<String, u64> = HashMap::new();
        for doc in &self.documents {
            for (lemma, freq) in self.noun_frequencies_for(doc)? {
                *merged.entry(lemma).or_insert(0) += freq;
            }
        }
        self.noun_frequencies = merged;
        Ok(())
    }

    fn noun_frequencies_for(&self, doc: &Document) -> Result<HashMap<String, u64>> {
        let noun_tags = self.expander.expand(&self.language, "noun");
        let mut freqs: HashMap<String, u64> = HashMap::new();
        for token in self.store.tokens_in(doc.start_id, doc.end_id)? {
            if !noun_tags.contains(&token.pos) {
                continue;
            }
            let lemma = token.lemma.to_lowercase();
            if lemma.is_empty() || self.stopwords.contains(&lemma) {
                continue;
            }
            *freqs.entry(lemma).or_insert(0) += 1;
        }
        Ok(self.fix_wrong_lemmas(freqs))
    }

    /// Remap manually corrected lemma keys; a corrected key collides
    /// additively with any pre-existing count for the target lemma.
    fn fix_wrong_lemmas(&self, mut freqs: HashMap<String, u64>) -> HashMap<String, u64> {
        for (wrong, fixed) in &self.lemma_corrections {
            if let Some(count) = freqs.remove(wrong) {
                *freqs.entry(fixed.clone()).or_insert(0) += count;
            }
        }
        freqs
    }

    /// The cached noun frequencies in presentation order.
    pub fn noun_frequency_table(&self) -> Vec<(String, u64)> {
        sort_descending(self.noun_frequencies.clone())
    }

    fn engine(&self) -> NgramEngine<'_> {
        NgramEngine::new(self.store, self.schema.layer, &self.language, self.expander)
    }

    /// Extract n-grams for the sub-corpus in a single scan of the address
    /// predicate.
    pub fn set_ngram_frequencies(&mut self, config: &NgramConfig) -> Result<()> {
        let extract = self
            .engine()
            .extract(config, &self.addresses(), &self.stopwords)?;
        tracing::debug!(
            n = config.n,
            grams = extract.frequencies.len(),
            "sub-corpus ngram extraction done"
        );
        self.ngrams = Some(extract);
        self.ngram_order = config.n;
        Ok(())
    }

    /// Corpus-wide extraction: exact per-document counts plus the bounded
    /// first-word backfill.
    pub fn set_ngram_frequencies_per_document(&mut self, config: &NgramConfig) -> Result<()> {
        let extract = self
            .engine()
            .extract_two_phase(config, &self.documents, &self.stopwords)?;
        self.ngrams = Some(extract);
        self.ngram_order = config.n;
        Ok(())
    }

    /// The current extraction result, if any, with its gram order.
    pub fn ngrams(&self) -> Option<(&NgramExtract, usize)> {
        self.ngrams.as_ref().map(|e| (e, self.ngram_order))
    }

    /// Total occurrences of `word` in first-gram-word position across the
    /// retained grams.
    pub fn ngram_frequency_by_first_word(&self, word: &str) -> Option<u64> {
        self.ngrams
            .as_ref()
            .and_then(|e| e.by_first_word.get(word).copied())
    }

    /// Cached stats for one gram order.
    pub fn ngramdata(&self, n: usize) -> Option<&HashMap<String, NgramStats>> {
        self.ngramdata.get(&n)
    }
}
