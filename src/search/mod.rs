//! Search orchestration: the searcher protocol, ranking, sorting, and
//! score explanations.

pub mod explanation;
pub mod multi_searcher;
pub mod searcher;
pub mod similarity;
pub mod sort;
pub mod top_docs;

pub use self::explanation::Explanation;
pub use self::multi_searcher::MultiSearcher;
pub use self::searcher::IndexSearcher;
pub use self::similarity::{DefaultSimilarity, Similarity};
pub use self::sort::{Sort, SortField};
pub use self::top_docs::{Hit, HitQueue, TopDocs};

use std::sync::Arc;

use crate::document::Document;
use crate::error::Result;
use crate::index::DocId;
use crate::query::filter::{Filter, PostFilter};
use crate::query::query::{Query, Weight};

/// Parameters of one ranked search.
#[derive(Default)]
pub struct SearchRequest<'a> {
    /// Number of ranked hits to skip.
    pub first_doc: usize,
    /// Number of ranked hits to return.
    pub num_docs: usize,
    /// Documents outside this filter are not matched.
    pub filter: Option<&'a dyn Filter>,
    /// Replaces score ranking with a field comparator chain.
    pub sort: Option<&'a Sort>,
    /// Per-hit predicate applied after scoring.
    pub post_filter: Option<&'a dyn PostFilter>,
}

impl<'a> SearchRequest<'a> {
    /// Request the top `num_docs` hits starting at rank `first_doc`.
    pub fn new(first_doc: usize, num_docs: usize) -> Self {
        SearchRequest {
            first_doc,
            num_docs,
            ..Default::default()
        }
    }

    /// Request the top `num_docs` hits.
    pub fn top(num_docs: usize) -> Self {
        Self::new(0, num_docs)
    }

    /// Restrict matches to `filter`.
    pub fn with_filter(mut self, filter: &'a dyn Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Order hits by `sort` instead of score.
    pub fn with_sort(mut self, sort: &'a Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Apply `post_filter` to each scored hit.
    pub fn with_post_filter(mut self, post_filter: &'a dyn PostFilter) -> Self {
        self.post_filter = Some(post_filter);
        self
    }
}

/// The search protocol.
///
/// Implemented by [`IndexSearcher`] over one reader and by
/// [`MultiSearcher`] over several; weights consult the searcher they
/// were created on for corpus-wide statistics, which is what keeps
/// multi-reader idf consistent.
pub trait Searcher: Send + Sync {
    /// Number of documents containing `text` in `field`.
    fn doc_freq(&self, field: &str, text: &str) -> Result<u32>;

    /// One greater than the largest document id addressable here.
    fn max_doc(&self) -> DocId;

    /// The similarity scoring primitives in effect.
    fn similarity(&self) -> &Arc<dyn Similarity>;

    /// Fetch the stored fields of `doc`.
    fn get_doc(&self, doc: DocId) -> Result<Document>;

    /// Rewrite `query` to its primitive fixed point.
    fn rewrite(&self, query: &dyn Query) -> Result<Box<dyn Query>>;

    /// Run a ranked search.
    fn search(&self, query: &dyn Query, request: &SearchRequest<'_>) -> Result<TopDocs>;

    /// Run a ranked search with an already normalized weight.
    fn search_with_weight(
        &self,
        weight: &dyn Weight,
        request: &SearchRequest<'_>,
    ) -> Result<TopDocs>;

    /// Invoke `callback(doc, score)` for every match, in ascending doc
    /// order; returns the match count.
    fn search_each(
        &self,
        query: &dyn Query,
        filter: Option<&dyn Filter>,
        post_filter: Option<&dyn PostFilter>,
        callback: &mut dyn FnMut(DocId, f32),
    ) -> Result<u64>;

    /// [`search_each`] with an already normalized weight.
    ///
    /// [`search_each`]: Searcher::search_each
    fn search_each_with_weight(
        &self,
        weight: &dyn Weight,
        filter: Option<&dyn Filter>,
        post_filter: Option<&dyn PostFilter>,
        callback: &mut dyn FnMut(DocId, f32),
    ) -> Result<u64>;

    /// Fill `buf` with matching doc ids >= `offset`, ascending; returns
    /// how many were written.
    fn search_unscored(
        &self,
        query: &dyn Query,
        buf: &mut [DocId],
        offset: DocId,
    ) -> Result<usize>;

    /// Explain the score `query` produces for `doc`.
    fn explain(&self, query: &dyn Query, doc: DocId) -> Result<Explanation>;

    /// [`explain`] with an already normalized weight.
    ///
    /// [`explain`]: Searcher::explain
    fn explain_with_weight(&self, weight: &dyn Weight, doc: DocId) -> Result<Explanation>;
}

/// Rewrite `query`, create its weight, and apply the cosine query norm.
pub fn create_normalized_weight(
    searcher: &dyn Searcher,
    query: &dyn Query,
) -> Result<Box<dyn Weight>> {
    let rewritten = searcher.rewrite(query)?;
    let mut weight = rewritten.create_weight(searcher)?;
    let sum = weight.sum_of_squared_weights();
    let norm = searcher.similarity().query_norm(sum);
    weight.normalize(norm);
    Ok(weight)
}
