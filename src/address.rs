//! Document address index: sub-corpus restriction over the token store
//!
//! Each document occupies one inclusive id range in the shared ordered store.
//! A set of documents is turned into an [`AddressPredicate`], the OR of their
//! ranges, which scopes every subsequent aggregate scan. The predicate is
//! recomputed whenever the document set changes; it is never cached across a
//! mutation.

use crate::store::StoredDocument;

/// A document in a (sub)corpus: a code unique within the corpus and the
/// inclusive token-id range it occupies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub code: String,
    pub language: String,
    pub start_id: u64,
    pub end_id: u64,
}

impl Document {
    /// Build a document from its stored segment.
    pub fn from_stored(stored: &StoredDocument, language: &str) -> Self {
        Self {
            code: stored.code.clone(),
            language: language.to_string(),
            start_id: stored.start_id,
            end_id: stored.end_id,
        }
    }
}

/// OR-combination of inclusive document ranges.
///
/// An empty document set yields a predicate that matches nothing; this is an
/// explicit empty case, not an accidental match-all.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AddressPredicate {
    ranges: Vec<(u64, u64)>,
}

impl AddressPredicate {
    /// The inclusive ranges, in document order.
    pub fn ranges(&self) -> &[(u64, u64)] {
        &self.ranges
    }

    /// Whether a token position id falls inside any document range.
    pub fn matches(&self, id: u64) -> bool {
        self.ranges.iter().any(|&(start, end)| start <= id && id <= end)
    }

    /// True when the predicate can never match (zero documents).
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Compute the address predicate for a set of documents.
pub fn compute_addresses(documents: &[Document]) -> AddressPredicate {
    AddressPredicate {
        ranges: documents.iter().map(|d| (d.start_id, d.end_id)).collect(),
    }
}
