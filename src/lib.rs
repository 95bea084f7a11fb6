//! # Ferret
//!
//! A full-text search query evaluation core: structured queries over an
//! inverted index, tf·idf / cosine-normalized scoring, top-k ranking,
//! and human-readable score explanations.
//!
//! ## Features
//!
//! - Term, boolean (MUST / SHOULD / MUST_NOT), phrase (exact and
//!   sloppy, with per-slot alternatives), prefix, wildcard, range,
//!   typed numeric range, multi-term, match-all, and filter-backed
//!   queries
//! - Query rewriting against the index term dictionary to primitive
//!   fixed points
//! - Conjunctive and disjunctive posting-iterator lock-step with
//!   `skip_to` semantics
//! - Pluggable similarity; the default implements the classic
//!   tf·idf model with byte-packed field norms
//! - Single-reader and offset-remapping multi-reader searchers
//! - An in-memory index for embedding and tests
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use ferret::analysis::LowercaseAnalyzer;
//! use ferret::document::Document;
//! use ferret::index::MemoryIndex;
//! use ferret::query::TermQuery;
//! use ferret::search::{IndexSearcher, SearchRequest, Searcher};
//!
//! # fn main() -> ferret::error::Result<()> {
//! let index = MemoryIndex::new(Arc::new(LowercaseAnalyzer));
//! index.add_document(Document::new().add("body", "the quick brown fox"))?;
//! index.add_document(Document::new().add("body", "lazy dogs"))?;
//!
//! let searcher = IndexSearcher::new(index.reader());
//! let top_docs = searcher.search(&TermQuery::new("body", "fox"), &SearchRequest::top(10))?;
//! assert_eq!(top_docs.total_hits, 1);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod document;
pub mod error;
pub mod index;
pub mod query;
pub mod search;
pub mod util;

pub use crate::error::{FerretError, Result};
pub use crate::index::{DocId, Term, NO_MORE_DOCS};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
