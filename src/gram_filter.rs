//! Linguistic filter pipeline for n-gram candidates
//!
//! Each filter is an explicit predicate over a candidate window, applied in
//! a fixed order. Later filters only see candidates that passed earlier
//! ones:
//!
//! 1. `LeadingLetter` — gram text must start with a letter
//! 2. `HasLetter` — gram must contain at least one letter anywhere
//! 3. `NotStopword` — no constituent form may be a stopword
//! 4. `RequiredWord` — some slot must equal a caller-supplied target
//! 5. `PosPattern` — the realized POS sequence must satisfy some pattern
//!
//! 4 and 5 are optional and combine via AND when both are present.

use crate::error::{CollocateError, Result};
use regex::Regex;
use std::collections::HashSet;

/// A candidate n-gram window, ready for filtering.
///
/// `forms` are the case-folded values of the selected layer; `pos` and
/// `lemmas` carry the annotations at each offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub forms: Vec<String>,
    pub pos: Vec<String>,
    pub lemmas: Vec<String>,
}

impl Candidate {
    /// The gram key: the n forms joined with `separator`.
    pub fn joined(&self, separator: char) -> String {
        self.forms.join(&separator.to_string())
    }
}

/// Maps an abstract POS category name to the concrete tags it covers for a
/// given language. External collaborator; [`UdTagset`] is the default.
pub trait PosTagExpander {
    fn expand(&self, language: &str, category: &str) -> HashSet<String>;
}

/// Universal-Dependencies-style category expansion, language-independent.
/// Unknown categories pass through as literal tags.
#[derive(Debug, Default)]
pub struct UdTagset;

impl PosTagExpander for UdTagset {
    fn expand(&self, _language: &str, category: &str) -> HashSet<String> {
        let tags: &[&str] = match category.to_ascii_lowercase().as_str() {
            "noun" => &["NOUN", "PROPN"],
            "verb" => &["VERB", "AUX"],
            "adjective" | "adj" => &["ADJ"],
            "adverb" | "adv" => &["ADV"],
            "pronoun" => &["PRON"],
            "numeral" | "num" => &["NUM"],
            "adposition" | "adp" => &["ADP"],
            _ => return HashSet::from([category.to_string()]),
        };
        tags.iter().map(|t| t.to_string()).collect()
    }
}

/// One filter stage over a candidate window.
#[derive(Debug, Clone)]
pub enum GramFilter {
    /// Gram text must start with a letter (rejects leading punctuation,
    /// digits, parentheses, apostrophes).
    LeadingLetter(Regex),
    /// Gram must contain at least one letter (rejects pure numeric or
    /// symbolic sequences).
    HasLetter(Regex),
    /// No constituent form may be in the stopword set; one disqualifying
    /// token voids the whole gram.
    NotStopword(HashSet<String>),
    /// At least one slot must equal `word`, matched against the layer form
    /// or the lemma. With `split_compounds`, either half of a `#`-marked
    /// compound lemma also matches.
    RequiredWord {
        word: String,
        match_lemma: bool,
        split_compounds: bool,
    },
    /// The realized POS sequence must satisfy any of the supplied patterns
    /// (OR across patterns, AND across the n positions within one pattern).
    PosPattern(Vec<Vec<HashSet<String>>>),
}

impl GramFilter {
    /// The leading-letter filter.
    pub fn leading_letter() -> Self {
        // The pattern cannot fail to compile.
        GramFilter::LeadingLetter(Regex::new(r"^\p{Alphabetic}").unwrap())
    }

    /// The must-contain-a-letter filter.
    pub fn has_letter() -> Self {
        GramFilter::HasLetter(Regex::new(r"\p{Alphabetic}").unwrap())
    }

    /// The stopword filter; the set is matched case-folded.
    pub fn not_stopword(stopwords: &HashSet<String>) -> Self {
        GramFilter::NotStopword(stopwords.iter().map(|w| w.to_lowercase()).collect())
    }

    /// The required-word filter; the target is matched case-folded.
    pub fn required_word(word: &str, match_lemma: bool, split_compounds: bool) -> Self {
        GramFilter::RequiredWord {
            word: word.to_lowercase(),
            match_lemma,
            split_compounds,
        }
    }

    /// Expand POS category patterns into concrete tag sets for `language`.
    ///
    /// Every pattern must have exactly `n` positions.
    pub fn pos_patterns(
        patterns: &[Vec<String>],
        n: usize,
        language: &str,
        expander: &dyn PosTagExpander,
    ) -> Result<Self> {
        let mut expanded = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            if pattern.len() != n {
                return Err(CollocateError::Config(format!(
                    "POS pattern has {} positions, expected {}",
                    pattern.len(),
                    n
                )));
            }
            expanded.push(
                pattern
                    .iter()
                    .map(|cat| expander.expand(language, cat))
                    .collect(),
            );
        }
        Ok(GramFilter::PosPattern(expanded))
    }

    /// Whether `candidate` passes this filter.
    pub fn accepts(&self, candidate: &Candidate) -> bool {
        match self {
            GramFilter::LeadingLetter(re) => {
                candidate.forms.first().is_some_and(|f| re.is_match(f))
            }
            GramFilter::HasLetter(re) => candidate.forms.iter().any(|f| re.is_match(f)),
            GramFilter::NotStopword(stopwords) => {
                !candidate.forms.iter().any(|f| stopwords.contains(f))
            }
            GramFilter::RequiredWord {
                word,
                match_lemma,
                split_compounds,
            } => {
                if *match_lemma {
                    candidate.lemmas.iter().any(|lemma| {
                        let lemma = lemma.to_lowercase();
                        if lemma == *word {
                            return true;
                        }
                        if *split_compounds {
                            if let Some((head, tail)) = lemma.split_once('#') {
                                return head == word || tail == word;
                            }
                        }
                        false
                    })
                } else {
                    candidate.forms.iter().any(|f| f == word)
                }
            }
            GramFilter::PosPattern(patterns) => patterns.iter().any(|pattern| {
                pattern.len() == candidate.pos.len()
                    && pattern
                        .iter()
                        .zip(candidate.pos.iter())
                        .all(|(tags, pos)| tags.contains(pos))
            }),
        }
    }
}

/// Build the ordered pipeline for one extraction run.
pub struct FilterPipeline {
    filters: Vec<GramFilter>,
}

impl FilterPipeline {
    /// Assemble the pipeline in its fixed order from the optional stages.
    pub fn new(
        stopwords: &HashSet<String>,
        required: Option<GramFilter>,
        pos: Option<GramFilter>,
    ) -> Self {
        let mut filters = vec![
            GramFilter::leading_letter(),
            GramFilter::has_letter(),
            GramFilter::not_stopword(stopwords),
        ];
        filters.extend(required);
        filters.extend(pos);
        Self { filters }
    }

    /// Whether `candidate` passes every stage.
    pub fn accepts(&self, candidate: &Candidate) -> bool {
        self.filters.iter().all(|f| f.accepts(candidate))
    }

    /// The pipeline stages in application order.
    pub fn stages(&self) -> &[GramFilter] {
        &self.filters
    }
}
