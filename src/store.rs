//! Token store: the shared ordered sequence of annotated tokens
//!
//! The engine only depends on the [`TokenStore`] trait: an ordered range scan
//! over position ids, the document-segment boundaries of the store, and range
//! counts. [`MemoryStore`] is the in-process implementation backing the CLI
//! and the tests; it is loaded from an annotated corpus file with one token
//! per line (`form<TAB>pos<TAB>lemma`) and `#doc <code>` headers.

use crate::error::{CollocateError, Result};
use crate::schema::Layer;

/// One annotated token in the ordered store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Monotonic position id, unique across the store.
    pub id: u64,
    /// Surface form.
    pub form: String,
    /// Part-of-speech tag.
    pub pos: String,
    /// Lemma. Compound lemmas may carry a `#` boundary marker.
    pub lemma: String,
}

impl Token {
    /// The value of the selected annotation layer.
    pub fn layer_value(&self, layer: Layer) -> &str {
        match layer {
            Layer::Token => &self.form,
            Layer::Lemma => &self.lemma,
        }
    }
}

/// Read-only access to the ordered token sequence.
///
/// Implementations must return tokens in ascending id order. Document
/// boundaries are modeled as segments; callers that assemble lookahead
/// windows never let a window cross a segment boundary.
pub trait TokenStore {
    /// Ordered scan of the inclusive id range `[start, end]`.
    fn tokens_in(&self, start: u64, end: u64) -> Result<Vec<Token>>;

    /// The stored documents, in store order.
    fn stored_documents(&self) -> Result<Vec<StoredDocument>>;

    /// Document-segment boundaries `(start, end)` in store order.
    fn segments(&self) -> Result<Vec<(u64, u64)>> {
        Ok(self
            .stored_documents()?
            .iter()
            .map(|d| (d.start_id, d.end_id))
            .collect())
    }

    /// Number of tokens in the inclusive id range `[start, end]`.
    fn count_in(&self, start: u64, end: u64) -> Result<u64> {
        Ok(self.tokens_in(start, end)?.len() as u64)
    }
}

/// A parsed document segment: its code and token range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub code: String,
    pub start_id: u64,
    pub end_id: u64,
}

/// In-memory token store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tokens: Vec<Token>,
    documents: Vec<StoredDocument>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an annotated corpus from text.
    ///
    /// Format, one record per line:
    /// - `#doc <code>` starts a new document segment
    /// - `form<TAB>pos<TAB>lemma` adds a token (pos and lemma optional;
    ///   a missing lemma defaults to the lowercased form)
    /// - blank lines and `#` comment lines are skipped
    ///
    /// A document that ends without any token is dropped, so the stored
    /// ranges are pairwise disjoint.
    pub fn parse(input: &str) -> Result<Self> {
        let mut store = Self::new();
        let mut current_doc: Option<StoredDocument> = None;
        let mut next_id: u64 = 1;

        for (lineno, line) in input.lines().enumerate() {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            if let Some(rest) = line.strip_prefix("#doc") {
                let code = rest.trim();
                if code.is_empty() {
                    return Err(CollocateError::Store(format!(
                        "line {}: document header without a code",
                        lineno + 1
                    )));
                }
                if let Some(doc) = current_doc.take() {
                    if doc.end_id >= doc.start_id {
                        store.documents.push(doc);
                    }
                }
                current_doc = Some(StoredDocument {
                    code: code.to_string(),
                    start_id: next_id,
                    // end < start until the first token lands; a document
                    // still in that state at flush time is dropped.
                    end_id: next_id - 1,
                });
                continue;
            }
            if line.starts_with('#') {
                continue;
            }
            let doc = current_doc.as_mut().ok_or_else(|| {
                CollocateError::Store(format!(
                    "line {}: token before any '#doc' header",
                    lineno + 1
                ))
            })?;

            let mut fields = line.split('\t');
            let form = fields.next().unwrap_or_default().to_string();
            let pos = fields.next().unwrap_or_default().to_string();
            let lemma = fields
                .next()
                .map(str::to_string)
                .unwrap_or_else(|| form.to_lowercase());

            store.tokens.push(Token {
                id: next_id,
                form,
                pos,
                lemma,
            });
            doc.end_id = next_id;
            next_id += 1;
        }
        if let Some(doc) = current_doc.take() {
            if doc.end_id >= doc.start_id {
                store.documents.push(doc);
            }
        }
        Ok(store)
    }

    /// Documents found in the store, in file order.
    pub fn documents(&self) -> &[StoredDocument] {
        &self.documents
    }

    /// Look up a stored document by code.
    pub fn document(&self, code: &str) -> Option<&StoredDocument> {
        self.documents.iter().find(|d| d.code == code)
    }

    /// Total number of tokens in the store.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl TokenStore for MemoryStore {
    fn tokens_in(&self, start: u64, end: u64) -> Result<Vec<Token>> {
        if end < start {
            return Ok(Vec::new());
        }
        // Ids are assigned densely from 1, so the range maps to a slice.
        let lo = self.tokens.partition_point(|t| t.id < start);
        let hi = self.tokens.partition_point(|t| t.id <= end);
        Ok(self.tokens[lo..hi].to_vec())
    }

    fn stored_documents(&self) -> Result<Vec<StoredDocument>> {
        Ok(self.documents.clone())
    }

    fn count_in(&self, start: u64, end: u64) -> Result<u64> {
        if end < start {
            return Ok(0);
        }
        let lo = self.tokens.partition_point(|t| t.id < start);
        let hi = self.tokens.partition_point(|t| t.id <= end);
        Ok((hi - lo) as u64)
    }
}
