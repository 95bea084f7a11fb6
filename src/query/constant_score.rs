//! Filter-backed queries: constant-score over a filter, and an inner
//! query intersected with a filter.

use std::any::Any;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use ahash::AHasher;

use crate::error::Result;
use crate::index::{DocId, IndexReader, NO_MORE_DOCS};
use crate::query::filter::Filter;
use crate::query::query::{boost_suffix, Query, Weight};
use crate::query::scorer::Scorer;
use crate::search::explanation::Explanation;
use crate::search::Searcher;
use crate::util::BitVector;

/// Scores every document of a filter at a constant value.
#[derive(Debug, Clone)]
pub struct ConstantScoreQuery {
    filter: Arc<dyn Filter>,
    boost: f32,
}

impl ConstantScoreQuery {
    /// Create a constant-score query over `filter`.
    pub fn new(filter: Arc<dyn Filter>) -> Self {
        ConstantScoreQuery {
            filter,
            boost: 1.0,
        }
    }

    /// Set the boost factor.
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    /// The backing filter.
    pub fn filter(&self) -> &Arc<dyn Filter> {
        &self.filter
    }
}

impl Query for ConstantScoreQuery {
    fn create_weight(&self, _searcher: &dyn Searcher) -> Result<Box<dyn Weight>> {
        Ok(Box::new(ConstantScoreWeight {
            filter: Arc::clone(&self.filter),
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
        format!(
            "ConstantScore({}){}",
            self.filter.to_filter_string(),
            boost_suffix(self.boost)
        )
    }

    fn query_eq(&self, other: &dyn Query) -> bool {
        other
            .as_any()
            .downcast_ref::<ConstantScoreQuery>()
            .is_some_and(|o| Arc::ptr_eq(&self.filter, &o.filter) && self.boost == o.boost)
    }

    fn query_hash(&self) -> u64 {
        let mut hasher = AHasher::default();
        "constant_score".hash(&mut hasher);
        (Arc::as_ptr(&self.filter) as *const () as usize).hash(&mut hasher);
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
struct ConstantScoreWeight {
    filter: Arc<dyn Filter>,
    boost: f32,
    query_weight: f32,
    value: f32,
}

impl Weight for ConstantScoreWeight {
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
        let bits = self.filter.bits(reader)?;
        Ok(Some(Box::new(BitScorer {
            bits,
            doc: NO_MORE_DOCS,
            started: false,
            score_value: self.value,
        })))
    }

    fn explain(&self, reader: &Arc<dyn IndexReader>, doc: DocId) -> Result<Explanation> {
        let bits = self.filter.bits(reader)?;
        if bits.get(doc as usize) {
            Ok(Explanation::new(
                self.value,
                format!("ConstantScore({})", self.filter.to_filter_string()),
            ))
        } else {
            Ok(Explanation::new(0.0, "filter does not match"))
        }
    }
}

/// Scorer over the set bits of a filter result.
struct BitScorer {
    bits: Arc<BitVector>,
    doc: DocId,
    started: bool,
    score_value: f32,
}

impl Scorer for BitScorer {
    fn next(&mut self) -> Result<bool> {
        let from = if self.started {
            match self.doc {
                NO_MORE_DOCS => return Ok(false),
                doc => doc as usize + 1,
            }
        } else {
            self.started = true;
            0
        };
        match self.bits.next_set_bit(from) {
            Some(bit) => {
                self.doc = bit as DocId;
                Ok(true)
            }
            None => {
                self.doc = NO_MORE_DOCS;
                Ok(false)
            }
        }
    }

    fn skip_to(&mut self, target: DocId) -> Result<bool> {
        if self.started && self.doc != NO_MORE_DOCS && self.doc >= target {
            return Ok(true);
        }
        self.started = true;
        match self.bits.next_set_bit(target as usize) {
            Some(bit) => {
                self.doc = bit as DocId;
                Ok(true)
            }
            None => {
                self.doc = NO_MORE_DOCS;
                Ok(false)
            }
        }
    }

    fn doc(&self) -> DocId {
        self.doc
    }

    fn score(&mut self) -> Result<f32> {
        Ok(self.score_value)
    }
}

/// An inner query restricted to the documents of a filter; hits keep
/// the inner query's scores.
#[derive(Debug, Clone)]
pub struct FilteredQuery {
    query: Box<dyn Query>,
    filter: Arc<dyn Filter>,
}

impl FilteredQuery {
    /// Restrict `query` to `filter`.
    pub fn new(query: Box<dyn Query>, filter: Arc<dyn Filter>) -> Self {
        FilteredQuery { query, filter }
    }
}

impl Query for FilteredQuery {
    fn create_weight(&self, searcher: &dyn Searcher) -> Result<Box<dyn Weight>> {
        Ok(Box::new(FilteredWeight {
            inner: self.query.create_weight(searcher)?,
            filter: Arc::clone(&self.filter),
        }))
    }

    fn rewrite(&self, reader: &Arc<dyn IndexReader>) -> Result<Box<dyn Query>> {
        Ok(Box::new(FilteredQuery {
            query: self.query.rewrite(reader)?,
            filter: Arc::clone(&self.filter),
        }))
    }

    fn boost(&self) -> f32 {
        self.query.boost()
    }

    fn set_boost(&mut self, boost: f32) {
        self.query.set_boost(boost);
    }

    fn to_query_string(&self, default_field: &str) -> String {
        format!(
            "FilteredQuery(query: {}, filter: {})",
            self.query.to_query_string(default_field),
            self.filter.to_filter_string()
        )
    }

    fn query_eq(&self, other: &dyn Query) -> bool {
        other
            .as_any()
            .downcast_ref::<FilteredQuery>()
            .is_some_and(|o| {
                self.query.query_eq(o.query.as_ref()) && Arc::ptr_eq(&self.filter, &o.filter)
            })
    }

    fn query_hash(&self) -> u64 {
        let mut hasher = AHasher::default();
        "filtered".hash(&mut hasher);
        self.query.query_hash().hash(&mut hasher);
        (Arc::as_ptr(&self.filter) as *const () as usize).hash(&mut hasher);
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
struct FilteredWeight {
    inner: Box<dyn Weight>,
    filter: Arc<dyn Filter>,
}

impl Weight for FilteredWeight {
    fn value(&self) -> f32 {
        self.inner.value()
    }

    fn sum_of_squared_weights(&mut self) -> f32 {
        self.inner.sum_of_squared_weights()
    }

    fn normalize(&mut self, norm: f32) {
        self.inner.normalize(norm);
    }

    fn scorer(&self, reader: &Arc<dyn IndexReader>) -> Result<Option<Box<dyn Scorer>>> {
        let inner = match self.inner.scorer(reader)? {
            Some(scorer) => scorer,
            None => return Ok(None),
        };
        Ok(Some(Box::new(FilteredScorer {
            inner,
            bits: self.filter.bits(reader)?,
        })))
    }

    fn explain(&self, reader: &Arc<dyn IndexReader>, doc: DocId) -> Result<Explanation> {
        let bits = self.filter.bits(reader)?;
        if !bits.get(doc as usize) {
            return Ok(Explanation::new(0.0, "filter does not match"));
        }
        self.inner.explain(reader, doc)
    }
}

struct FilteredScorer {
    inner: Box<dyn Scorer>,
    bits: Arc<BitVector>,
}

impl Scorer for FilteredScorer {
    fn next(&mut self) -> Result<bool> {
        while self.inner.next()? {
            if self.bits.get(self.inner.doc() as usize) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn skip_to(&mut self, target: DocId) -> Result<bool> {
        if !self.inner.skip_to(target)? {
            return Ok(false);
        }
        if self.bits.get(self.inner.doc() as usize) {
            return Ok(true);
        }
        self.next()
    }

    fn doc(&self) -> DocId {
        self.inner.doc()
    }

    fn score(&mut self) -> Result<f32> {
        self.inner.score()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::LowercaseAnalyzer;
    use crate::document::Document;
    use crate::index::MemoryIndex;
    use crate::query::filter::QueryFilter;
    use crate::query::term::TermQuery;
    use crate::search::searcher::IndexSearcher;
    use crate::search::{SearchRequest, Searcher as _};

    fn searcher() -> IndexSearcher {
        let index = MemoryIndex::new(Arc::new(LowercaseAnalyzer));
        for text in ["red apple", "green apple", "red plum", "green plum"] {
            index
                .add_document(Document::new().add("body", text))
                .unwrap();
        }
        IndexSearcher::new(index.reader())
    }

    fn red_filter() -> Arc<dyn Filter> {
        Arc::new(QueryFilter::new(Box::new(TermQuery::new("body", "red"))))
    }

    #[test]
    fn test_constant_score_hits_and_scores() {
        let searcher = searcher();
        let query = ConstantScoreQuery::new(red_filter());
        let top = searcher.search(&query, &SearchRequest::top(10)).unwrap();

        assert_eq!(top.total_hits, 2);
        let mut docs: Vec<u32> = top.hits.iter().map(|h| h.doc).collect();
        docs.sort_unstable();
        assert_eq!(docs, vec![0, 2]);
        assert_eq!(top.hits[0].score, top.hits[1].score);
    }

    #[test]
    fn test_filtered_query_intersects() {
        let searcher = searcher();
        let query = FilteredQuery::new(
            Box::new(TermQuery::new("body", "apple")),
            red_filter(),
        );
        let top = searcher.search(&query, &SearchRequest::top(10)).unwrap();

        assert_eq!(top.total_hits, 1);
        assert_eq!(top.hits[0].doc, 0);
    }

    #[test]
    fn test_filtered_explanation_matches_score() {
        let searcher = searcher();
        let query = FilteredQuery::new(
            Box::new(TermQuery::new("body", "apple")),
            red_filter(),
        );
        let top = searcher.search(&query, &SearchRequest::top(10)).unwrap();
        let hit = top.hits[0];
        let expl = searcher.explain(&query, hit.doc).unwrap();
        assert!((expl.value - hit.score).abs() <= hit.score * 1e-4);

        let excluded = searcher.explain(&query, 1).unwrap();
        assert_eq!(excluded.value, 0.0);
    }

    #[test]
    fn test_constant_score_eq_by_filter_identity() {
        let filter = red_filter();
        let q1 = ConstantScoreQuery::new(Arc::clone(&filter));
        let q2 = ConstantScoreQuery::new(Arc::clone(&filter));
        assert!(q1.query_eq(&q2));
        assert_eq!(q1.query_hash(), q2.query_hash());

        let q3 = ConstantScoreQuery::new(red_filter());
        assert!(!q1.query_eq(&q3));
    }
}
