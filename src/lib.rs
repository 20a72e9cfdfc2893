//! Collocate - corpus n-gram extraction and association statistics
//!
//! This library computes corpus-linguistics statistics over collections of
//! annotated documents: word and lemma frequency tables, n-gram extraction
//! under a fixed pipeline of linguistic filters, and association measures
//! (log-likelihood, pointwise mutual information, a naive-Bayes salience
//! score) used to rank collocations and topic words. Aggregates can be
//! restricted to an arbitrary sub-corpus; corpus-wide n-gram frequencies are
//! computed exactly per document with a cost-bounded approximate backfill
//! for the head of the distribution.

pub mod address;
pub mod cli;
pub mod corpus;
pub mod csv_output;
pub mod error;
pub mod gram_filter;
pub mod json_output;
pub mod measures;
pub mod ngram;
pub mod schema;
pub mod store;
pub mod table;
