//! CSV output format for statistics tables

use crate::table::{NgramTable, TopicWordTable};

/// Escape a CSV field (handle separators, quotes, newlines).
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render an n-gram table as CSV with a header row.
pub fn ngram_csv(table: &NgramTable) -> String {
    let mut out = String::from("ngram,freq,ll,pmi\n");
    for row in &table.rows {
        out.push_str(&format!(
            "{},{},{:.6},{:.6}\n",
            escape_field(&row.ngram),
            row.freq,
            row.ll,
            row.pmi
        ));
    }
    out
}

/// Render a topic-word table as CSV with a header row.
pub fn topic_word_csv(table: &TopicWordTable) -> String {
    let mut out = String::from("lemma,freq,nb\n");
    for row in &table.rows {
        out.push_str(&format!(
            "{},{},{:.6}\n",
            escape_field(&row.lemma),
            row.freq,
            row.nb
        ));
    }
    out
}
