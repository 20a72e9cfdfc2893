//! CLI argument parsing for collocate

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for statistics tables
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
    /// CSV format for spreadsheet analysis
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "collocate")]
#[command(version)]
#[command(about = "Corpus n-gram and association statistics", long_about = None)]
pub struct Cli {
    /// Annotated corpus file (one 'form<TAB>pos<TAB>lemma' token per line,
    /// '#doc <code>' document headers)
    pub corpus: PathBuf,

    /// Gram order (2 for bigrams, 3+ scored via the chain rule)
    #[arg(short = 'n', long = "ngram", default_value = "2", value_name = "N")]
    pub n: usize,

    /// Retain only grams occurring strictly more often than this
    #[arg(long = "min-count", default_value = "0", value_name = "COUNT")]
    pub min_count: u64,

    /// Require this word in one of the gram slots
    #[arg(long = "include-word", value_name = "WORD")]
    pub include_word: Option<String>,

    /// Match --include-word against lemmas instead of surface forms
    #[arg(long = "word-is-lemma", requires = "include_word")]
    pub word_is_lemma: bool,

    /// Also match either half of a '#'-marked compound lemma
    #[arg(long = "split-compounds", requires = "word_is_lemma")]
    pub split_compounds: bool,

    /// POS category pattern, comma-separated per position (e.g. adjective,noun);
    /// repeat the flag for alternative patterns
    #[arg(long = "pos-pattern", value_name = "CATS")]
    pub pos_patterns: Vec<String>,

    /// Read the lemma layer instead of surface tokens
    #[arg(long = "lemmas")]
    pub lemmas: bool,

    /// Stopword file, one word per line
    #[arg(long = "stopwords", value_name = "FILE")]
    pub stopwords: Option<PathBuf>,

    /// Restrict to a sub-corpus of document codes (comma-separated)
    #[arg(long = "docs", value_name = "CODES", value_delimiter = ',')]
    pub docs: Vec<String>,

    /// Corpus language tag (passed to the POS tag expander)
    #[arg(long = "language", default_value = "en", value_name = "LANG")]
    pub language: String,

    /// Aggregate per document with the bounded corpus-wide backfill
    #[arg(long = "per-document")]
    pub per_document: bool,

    /// Bound on the phase-2 backfill (number of head grams rescanned)
    #[arg(long = "backfill-cap", default_value = "2000", value_name = "K")]
    pub backfill_cap: usize,

    /// Print the topic-word table instead of the n-gram table
    #[arg(long = "topic-words")]
    pub topic_words: bool,

    /// Output format (text, json or csv)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug logging to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}
