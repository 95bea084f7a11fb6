//! Document filters.
//!
//! A [`Filter`] selects a reader-wide document set independent of
//! scoring; ranked searches intersect matches with it, and
//! `ConstantScoreQuery` turns one directly into a query. A
//! [`PostFilter`] instead sees each scored hit and may veto it.

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::index::{DocId, IndexReader};
use crate::query::query::Query;
use crate::search::searcher::IndexSearcher;
use crate::search::Searcher;
use crate::util::BitVector;

/// Reader-level document filter.
pub trait Filter: Send + Sync + Debug {
    /// The documents this filter admits in `reader`.
    fn bits(&self, reader: &Arc<dyn IndexReader>) -> Result<Arc<BitVector>>;

    /// Query-string-style rendering, used by filter queries.
    fn to_filter_string(&self) -> String;
}

/// Per-hit predicate applied after scoring.
pub trait PostFilter: Send + Sync {
    /// Keep or drop the hit `(doc, score)`.
    fn keep(&self, doc: DocId, score: f32) -> bool;
}

impl<F> PostFilter for F
where
    F: Fn(DocId, f32) -> bool + Send + Sync,
{
    fn keep(&self, doc: DocId, score: f32) -> bool {
        self(doc, score)
    }
}

/// Filter admitting the documents matched by a query.
///
/// Bits are computed once per reader snapshot and cached by snapshot
/// identity.
#[derive(Debug)]
pub struct QueryFilter {
    query: Box<dyn Query>,
    cache: Mutex<Vec<(usize, Arc<BitVector>)>>,
}

impl QueryFilter {
    /// Filter on the documents matching `query`.
    pub fn new(query: Box<dyn Query>) -> Self {
        QueryFilter {
            query,
            cache: Mutex::new(Vec::new()),
        }
    }

    fn reader_key(reader: &Arc<dyn IndexReader>) -> usize {
        Arc::as_ptr(reader) as *const () as usize
    }
}

impl Filter for QueryFilter {
    fn bits(&self, reader: &Arc<dyn IndexReader>) -> Result<Arc<BitVector>> {
        let key = Self::reader_key(reader);
        {
            let cache = self.cache.lock();
            if let Some((_, bits)) = cache.iter().find(|(k, _)| *k == key) {
                return Ok(Arc::clone(bits));
            }
        }

        let searcher = IndexSearcher::new(Arc::clone(reader));
        let mut bits = BitVector::with_capacity(reader.max_doc() as usize);
        searcher.search_each(self.query.as_ref(), None, None, &mut |doc, _| {
            bits.set(doc as usize);
        })?;
        let bits = Arc::new(bits);
        self.cache.lock().push((key, Arc::clone(&bits)));
        Ok(bits)
    }

    fn to_filter_string(&self) -> String {
        format!("QueryFilter<{}>", self.query.to_query_string(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::LowercaseAnalyzer;
    use crate::document::Document;
    use crate::index::MemoryIndex;
    use crate::query::term::TermQuery;

    fn sample_reader() -> Arc<dyn IndexReader> {
        let index = MemoryIndex::new(Arc::new(LowercaseAnalyzer));
        for text in ["apple pie", "apple tart", "plum tart"] {
            index
                .add_document(Document::new().add("body", text))
                .unwrap();
        }
        index.reader()
    }

    #[test]
    fn test_query_filter_bits() {
        let reader = sample_reader();
        let filter = QueryFilter::new(Box::new(TermQuery::new("body", "apple")));

        let bits = filter.bits(&reader).unwrap();
        assert!(bits.get(0));
        assert!(bits.get(1));
        assert!(!bits.get(2));
    }

    #[test]
    fn test_query_filter_cached_per_reader() {
        let reader = sample_reader();
        let filter = QueryFilter::new(Box::new(TermQuery::new("body", "tart")));

        let first = filter.bits(&reader).unwrap();
        let second = filter.bits(&reader).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_post_filter_closure() {
        let keep_even = |doc: DocId, _score: f32| doc % 2 == 0;
        assert!(keep_even.keep(2, 1.0));
        assert!(!keep_even.keep(3, 1.0));
    }
}
