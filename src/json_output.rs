//! JSON output format for statistics tables

use crate::table::{NgramRow, NgramTable, TopicWordRow, TopicWordTable};
use serde::{Deserialize, Serialize};

/// One n-gram row as emitted to JSON consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonNgramRow {
    pub ngram: String,
    pub freq: u64,
    pub ll: f64,
    pub pmi: f64,
}

impl From<&NgramRow> for JsonNgramRow {
    fn from(row: &NgramRow) -> Self {
        Self {
            ngram: row.ngram.clone(),
            freq: row.freq,
            ll: row.ll,
            pmi: row.pmi,
        }
    }
}

/// One topic-word row as emitted to JSON consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonTopicWordRow {
    pub lemma: String,
    pub freq: u64,
    pub nb: f64,
}

impl From<&TopicWordRow> for JsonTopicWordRow {
    fn from(row: &TopicWordRow) -> Self {
        Self {
            lemma: row.lemma.clone(),
            freq: row.freq,
            nb: row.nb,
        }
    }
}

/// Top-level report: exactly one of the tables, plus the dropped-row count
/// so partial results remain visible to machine consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonReport {
    /// Gram order for n-gram reports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ngrams: Option<Vec<JsonNgramRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_words: Option<Vec<JsonTopicWordRow>>,
    pub dropped: u64,
}

impl JsonReport {
    /// Wrap an n-gram table.
    pub fn ngrams(table: &NgramTable, n: usize) -> Self {
        Self {
            n: Some(n),
            ngrams: Some(table.rows.iter().map(JsonNgramRow::from).collect()),
            topic_words: None,
            dropped: table.dropped,
        }
    }

    /// Wrap a topic-word table.
    pub fn topic_words(table: &TopicWordTable) -> Self {
        Self {
            n: None,
            ngrams: None,
            topic_words: Some(table.rows.iter().map(JsonTopicWordRow::from).collect()),
            dropped: table.dropped,
        }
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
