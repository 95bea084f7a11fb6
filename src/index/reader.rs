//! The reader interface the query evaluator consumes.
//!
//! An [`IndexReader`] is a point-in-time snapshot of an index. All
//! scoring state flows through it: posting cursors, the ordered term
//! dictionary, per-field norms, deletions, and stored documents.

use std::fmt::Debug;
use std::sync::Arc;

use crate::document::Document;
use crate::error::Result;
use crate::index::postings::Postings;
use crate::index::{DocId, Term};

/// Ordered cursor over a field's term dictionary.
///
/// A fresh enum is positioned before the first term; `next` and
/// `skip_to` return whether a current term exists, and `term` /
/// `doc_freq` are only meaningful after one of them returned `true`.
pub trait TermEnum: Send {
    /// Advance to the next term in ascending text order.
    fn next(&mut self) -> bool;

    /// Position at the first term >= `text`.
    fn skip_to(&mut self, text: &str) -> bool;

    /// The current term text.
    fn term(&self) -> &str;

    /// Document frequency of the current term.
    fn doc_freq(&self) -> u32;
}

/// Point-in-time snapshot of an inverted index.
pub trait IndexReader: Send + Sync + Debug {
    /// One greater than the largest document id ever assigned.
    fn max_doc(&self) -> DocId;

    /// Number of live (non-deleted) documents.
    fn num_docs(&self) -> u32;

    /// Number of documents containing `text` in `field`.
    fn doc_freq(&self, field: &str, text: &str) -> Result<u32>;

    /// Positioned posting cursor for `term`, or `None` when the term is
    /// absent. The cursor skips deleted documents.
    fn term_positions(&self, term: &Term) -> Result<Option<Box<dyn Postings>>>;

    /// Ordered term dictionary for `field`, or `None` for an unknown
    /// field.
    fn terms(&self, field: &str) -> Result<Option<Box<dyn TermEnum>>>;

    /// Norm bytes for `field`, one per document, or `None` when the
    /// field carries no norms.
    fn norms(&self, field: &str) -> Option<Arc<[u8]>>;

    /// True when any document has been deleted.
    fn has_deletions(&self) -> bool;

    /// True when `doc` is deleted.
    fn is_deleted(&self, doc: DocId) -> bool;

    /// The stored fields of `doc`.
    fn get_doc(&self, doc: DocId) -> Result<Document>;

    /// True when no commit happened after this snapshot was taken.
    fn is_latest(&self) -> bool;

    /// Release resources held by this reader.
    fn close(&self) -> Result<()> {
        Ok(())
    }
}
