//! Match-all query: every live document, at a constant score.

use std::any::Any;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use ahash::AHasher;

use crate::error::Result;
use crate::index::{DocId, IndexReader};
use crate::query::query::{boost_suffix, Query, Weight};
use crate::query::scorer::{AllScorer, Scorer};
use crate::search::explanation::Explanation;
use crate::search::Searcher;

/// A query matching every live document.
#[derive(Debug, Clone)]
pub struct MatchAllQuery {
    boost: f32,
}

impl MatchAllQuery {
    /// Create a match-all query.
    pub fn new() -> Self {
        MatchAllQuery { boost: 1.0 }
    }

    /// Set the boost factor.
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }
}

impl Default for MatchAllQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl Query for MatchAllQuery {
    fn create_weight(&self, _searcher: &dyn Searcher) -> Result<Box<dyn Weight>> {
        Ok(Box::new(MatchAllWeight {
            boost: self.boost,
            query_weight: 0.0,
            value: 0.0,
        }))
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn set_boost(&mut self, boost: f32) {
        self.boost = boost;
    }

    fn to_query_string(&self, _default_field: &str) -> String {
        format!("*{}", boost_suffix(self.boost))
    }

    fn query_eq(&self, other: &dyn Query) -> bool {
        other
            .as_any()
            .downcast_ref::<MatchAllQuery>()
            .is_some_and(|o| self.boost == o.boost)
    }

    fn query_hash(&self) -> u64 {
        let mut hasher = AHasher::default();
        "match_all".hash(&mut hasher);
        self.boost.to_bits().hash(&mut hasher);
        hasher.finish()
    }

    fn clone_box(&self) -> Box<dyn Query> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
struct MatchAllWeight {
    boost: f32,
    query_weight: f32,
    value: f32,
}

impl Weight for MatchAllWeight {
    fn value(&self) -> f32 {
        self.value
    }

    fn sum_of_squared_weights(&mut self) -> f32 {
        self.query_weight = self.boost;
        self.query_weight * self.query_weight
    }

    fn normalize(&mut self, norm: f32) {
        self.query_weight *= norm;
        self.value = self.query_weight;
    }

    fn scorer(&self, reader: &Arc<dyn IndexReader>) -> Result<Option<Box<dyn Scorer>>> {
        Ok(Some(Box::new(AllScorer::new(
            Arc::clone(reader),
            self.value,
        ))))
    }

    fn explain(&self, reader: &Arc<dyn IndexReader>, doc: DocId) -> Result<Explanation> {
        if doc < reader.max_doc() && !reader.is_deleted(doc) {
            Ok(Explanation::new(self.value, "MatchAllQuery"))
        } else {
            Ok(Explanation::new(0.0, format!("doc {doc} not live")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::LowercaseAnalyzer;
    use crate::document::Document;
    use crate::index::MemoryIndex;
    use crate::query::wildcard::WildcardQuery;
    use crate::search::searcher::IndexSearcher;
    use crate::search::{SearchRequest, Searcher as _};

    #[test]
    fn test_matches_all_live_docs() {
        let index = MemoryIndex::new(Arc::new(LowercaseAnalyzer));
        for text in ["a", "b", "c", "d"] {
            index
                .add_document(Document::new().add("body", text))
                .unwrap();
        }
        index.delete_doc(2).unwrap();
        let searcher = IndexSearcher::new(index.reader());

        let top = searcher
            .search(&MatchAllQuery::new(), &SearchRequest::top(10))
            .unwrap();
        assert_eq!(top.total_hits, 3);
        let mut docs: Vec<u32> = top.hits.iter().map(|h| h.doc).collect();
        docs.sort_unstable();
        assert_eq!(docs, vec![0, 1, 3]);
        for hit in &top.hits {
            assert_eq!(hit.score, top.max_score);
        }
    }

    #[test]
    fn test_eq_hash() {
        let q1 = MatchAllQuery::new();
        let q2 = MatchAllQuery::new();
        assert!(q1.query_eq(&q2));
        assert_eq!(q1.query_hash(), q2.query_hash());

        let boosted = MatchAllQuery::new().with_boost(2.0);
        assert!(!q1.query_eq(&boosted));

        let other = WildcardQuery::new("a", "a*");
        assert!(!q1.query_eq(&other));
        assert_ne!(q1.query_hash(), other.query_hash());
    }
}
