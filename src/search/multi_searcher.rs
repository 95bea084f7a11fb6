//! Searcher fanning out over several sub-searchers.
//!
//! Document ids are remapped through cumulative offsets: sub-searcher
//! `i` owns the global range `[offsets[i], offsets[i+1])`. Corpus
//! statistics aggregate over all subs, and one weight — created against
//! this searcher, so its idf sees the merged corpus — drives every
//! sub-search.

use std::sync::Arc;

use rayon::prelude::*;

use crate::document::Document;
use crate::error::{FerretError, Result};
use crate::index::DocId;
use crate::query::boolean::combine_queries;
use crate::query::filter::{Filter, PostFilter};
use crate::query::query::{Query, Weight};
use crate::search::explanation::Explanation;
use crate::search::similarity::{DefaultSimilarity, Similarity};
use crate::search::top_docs::{Hit, HitQueue, TopDocs};
use crate::search::{create_normalized_weight, SearchRequest, Searcher};

/// A searcher over N sub-searchers with offset-remapped doc ids.
pub struct MultiSearcher {
    searchers: Vec<Box<dyn Searcher>>,
    offsets: Vec<DocId>,
    similarity: Arc<dyn Similarity>,
}

impl MultiSearcher {
    /// Combine `searchers`; their doc-id ranges are stacked in order.
    pub fn new(searchers: Vec<Box<dyn Searcher>>) -> Result<Self> {
        if searchers.is_empty() {
            return Err(FerretError::invalid_argument(
                "multi-searcher needs at least one sub-searcher",
            ));
        }
        let mut offsets = Vec::with_capacity(searchers.len() + 1);
        let mut total = 0;
        for searcher in &searchers {
            offsets.push(total);
            total += searcher.max_doc();
        }
        offsets.push(total);
        Ok(MultiSearcher {
            searchers,
            offsets,
            similarity: Arc::new(DefaultSimilarity),
        })
    }

    /// Replace the similarity.
    pub fn with_similarity(mut self, similarity: Arc<dyn Similarity>) -> Self {
        self.similarity = similarity;
        self
    }

    /// Sub-searcher index and local doc id for a global doc id.
    fn locate(&self, doc: DocId) -> Result<(usize, DocId)> {
        if doc >= *self.offsets.last().expect("offsets never empty") {
            return Err(FerretError::invalid_argument(format!(
                "doc {doc} out of range"
            )));
        }
        let idx = self.offsets.partition_point(|&base| base <= doc) - 1;
        Ok((idx, doc - self.offsets[idx]))
    }
}

impl Searcher for MultiSearcher {
    fn doc_freq(&self, field: &str, text: &str) -> Result<u32> {
        let mut sum = 0;
        for searcher in &self.searchers {
            sum += searcher.doc_freq(field, text)?;
        }
        Ok(sum)
    }

    fn max_doc(&self) -> DocId {
        *self.offsets.last().expect("offsets never empty")
    }

    fn similarity(&self) -> &Arc<dyn Similarity> {
        &self.similarity
    }

    fn get_doc(&self, doc: DocId) -> Result<Document> {
        let (idx, local) = self.locate(doc)?;
        self.searchers[idx].get_doc(local)
    }

    fn rewrite(&self, query: &dyn Query) -> Result<Box<dyn Query>> {
        let mut rewritten = Vec::with_capacity(self.searchers.len());
        for searcher in &self.searchers {
            rewritten.push(searcher.rewrite(query)?);
        }
        Ok(combine_queries(&rewritten))
    }

    fn search(&self, query: &dyn Query, request: &SearchRequest<'_>) -> Result<TopDocs> {
        let weight = create_normalized_weight(self, query)?;
        self.search_with_weight(weight.as_ref(), request)
    }

    fn search_with_weight(
        &self,
        weight: &dyn Weight,
        request: &SearchRequest<'_>,
    ) -> Result<TopDocs> {
        if request.num_docs == 0 {
            return Err(FerretError::invalid_argument(
                "num_docs must be positive",
            ));
        }

        if let Some(sort) = request.sort {
            // Gather every match globally, then order once.
            let mut hits = Vec::new();
            let mut max_score = 0.0f32;
            self.search_each_with_weight(
                weight,
                request.filter,
                request.post_filter,
                &mut |doc, score| {
                    if score > max_score {
                        max_score = score;
                    }
                    hits.push(Hit { doc, score });
                },
            )?;

            let key_fields = sort.stored_fields();
            let mut decorated = Vec::with_capacity(hits.len());
            for hit in hits {
                let doc = self.get_doc(hit.doc)?;
                let keys: Vec<Option<String>> = key_fields
                    .iter()
                    .map(|field| doc.get_value(field).map(str::to_string))
                    .collect();
                decorated.push((hit, keys));
            }
            decorated.sort_by(|(a, a_keys), (b, b_keys)| sort.compare(a, a_keys, b, b_keys));

            let total_hits = decorated.len() as u64;
            let hits = decorated
                .into_iter()
                .map(|(hit, _)| hit)
                .skip(request.first_doc)
                .take(request.num_docs)
                .collect();
            return Ok(TopDocs {
                total_hits,
                hits,
                max_score,
            });
        }

        let window = request.first_doc + request.num_docs;
        let sub_results: Vec<Result<TopDocs>> = self
            .searchers
            .par_iter()
            .enumerate()
            .map(|(idx, searcher)| {
                let base = self.offsets[idx];
                let remapped = request
                    .post_filter
                    .map(|pf| move |doc: DocId, score: f32| pf.keep(doc + base, score));
                let sub_request = SearchRequest {
                    first_doc: 0,
                    num_docs: window,
                    filter: request.filter,
                    sort: None,
                    post_filter: remapped.as_ref().map(|pf| pf as &dyn PostFilter),
                };
                searcher.search_with_weight(weight, &sub_request)
            })
            .collect();

        let mut total_hits = 0u64;
        let mut max_score = 0.0f32;
        let mut queue = HitQueue::new(window);
        for (idx, sub_result) in sub_results.into_iter().enumerate() {
            let sub = sub_result?;
            total_hits += sub.total_hits;
            if sub.max_score > max_score {
                max_score = sub.max_score;
            }
            let base = self.offsets[idx];
            for hit in sub.hits {
                queue.insert(Hit {
                    doc: hit.doc + base,
                    score: hit.score,
                });
            }
        }

        let hits: Vec<Hit> = queue
            .into_ranked_hits()
            .into_iter()
            .skip(request.first_doc)
            .collect();
        Ok(TopDocs {
            total_hits,
            hits,
            max_score,
        })
    }

    fn search_each(
        &self,
        query: &dyn Query,
        filter: Option<&dyn Filter>,
        post_filter: Option<&dyn PostFilter>,
        callback: &mut dyn FnMut(DocId, f32),
    ) -> Result<u64> {
        let weight = create_normalized_weight(self, query)?;
        self.search_each_with_weight(weight.as_ref(), filter, post_filter, callback)
    }

    fn search_each_with_weight(
        &self,
        weight: &dyn Weight,
        filter: Option<&dyn Filter>,
        post_filter: Option<&dyn PostFilter>,
        callback: &mut dyn FnMut(DocId, f32),
    ) -> Result<u64> {
        let mut count = 0u64;
        for (idx, searcher) in self.searchers.iter().enumerate() {
            let base = self.offsets[idx];
            let remapped = post_filter.map(|pf| move |doc: DocId, score: f32| pf.keep(doc + base, score));
            count += searcher.search_each_with_weight(
                weight,
                filter,
                remapped.as_ref().map(|pf| pf as &dyn PostFilter),
                &mut |doc, score| callback(doc + base, score),
            )?;
        }
        Ok(count)
    }

    fn search_unscored(
        &self,
        query: &dyn Query,
        buf: &mut [DocId],
        offset: DocId,
    ) -> Result<usize> {
        let mut written = 0;
        for (idx, searcher) in self.searchers.iter().enumerate() {
            if written >= buf.len() {
                break;
            }
            let base = self.offsets[idx];
            let local_offset = offset.saturating_sub(base);
            let count = searcher.search_unscored(query, &mut buf[written..], local_offset)?;
            for slot in &mut buf[written..written + count] {
                *slot += base;
            }
            written += count;
        }
        Ok(written)
    }

    fn explain(&self, query: &dyn Query, doc: DocId) -> Result<Explanation> {
        let weight = create_normalized_weight(self, query)?;
        self.explain_with_weight(weight.as_ref(), doc)
    }

    fn explain_with_weight(&self, weight: &dyn Weight, doc: DocId) -> Result<Explanation> {
        let (idx, local) = self.locate(doc)?;
        self.searchers[idx].explain_with_weight(weight, local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::LowercaseAnalyzer;
    use crate::index::MemoryIndex;
    use crate::query::term::TermQuery;
    use crate::search::searcher::IndexSearcher;

    fn split_searchers() -> (IndexSearcher, MultiSearcher) {
        let texts = [
            "apple pie",
            "plum tart",
            "apple plum",
            "cherry apple",
            "plum jam",
            "apple",
        ];

        let single = MemoryIndex::new(Arc::new(LowercaseAnalyzer));
        for text in texts {
            single
                .add_document(Document::new().add("body", text))
                .unwrap();
        }

        let left = MemoryIndex::new(Arc::new(LowercaseAnalyzer));
        let right = MemoryIndex::new(Arc::new(LowercaseAnalyzer));
        for (i, text) in texts.iter().enumerate() {
            let target = if i < 3 { &left } else { &right };
            target
                .add_document(Document::new().add("body", *text))
                .unwrap();
        }

        let multi = MultiSearcher::new(vec![
            Box::new(IndexSearcher::new(left.reader())),
            Box::new(IndexSearcher::new(right.reader())),
        ])
        .unwrap();
        (IndexSearcher::new(single.reader()), multi)
    }

    #[test]
    fn test_aggregate_stats() {
        let (single, multi) = split_searchers();
        assert_eq!(multi.max_doc(), single.max_doc());
        assert_eq!(
            multi.doc_freq("body", "apple").unwrap(),
            single.doc_freq("body", "apple").unwrap()
        );
    }

    #[test]
    fn test_same_results_as_single_searcher() {
        let (single, multi) = split_searchers();
        let query = TermQuery::new("body", "apple");

        let expected = single.search(&query, &SearchRequest::top(10)).unwrap();
        let actual = multi.search(&query, &SearchRequest::top(10)).unwrap();

        assert_eq!(actual.total_hits, expected.total_hits);
        let expected_docs: Vec<DocId> = expected.hits.iter().map(|h| h.doc).collect();
        let actual_docs: Vec<DocId> = actual.hits.iter().map(|h| h.doc).collect();
        assert_eq!(actual_docs, expected_docs);
        for (a, b) in actual.hits.iter().zip(&expected.hits) {
            assert!((a.score - b.score).abs() < 1e-6);
        }
    }

    #[test]
    fn test_get_doc_routes_by_offset() {
        let (_, multi) = split_searchers();
        assert_eq!(
            multi.get_doc(4).unwrap().get_value("body"),
            Some("plum jam")
        );
        assert!(multi.get_doc(6).is_err());
    }

    #[test]
    fn test_search_unscored_spans_subs() {
        let (_, multi) = split_searchers();
        let query = TermQuery::new("body", "plum");
        let mut buf = [0u32; 8];

        let count = multi.search_unscored(&query, &mut buf, 0).unwrap();
        assert_eq!(&buf[..count], &[1, 2, 4]);

        let count = multi.search_unscored(&query, &mut buf, 2).unwrap();
        assert_eq!(&buf[..count], &[2, 4]);
    }

    #[test]
    fn test_explanation_matches_score() {
        let (_, multi) = split_searchers();
        let query = TermQuery::new("body", "apple");
        let top = multi.search(&query, &SearchRequest::top(10)).unwrap();
        for hit in &top.hits {
            let expl = multi.explain(&query, hit.doc).unwrap();
            assert!(
                (expl.value - hit.score).abs() <= hit.score * 1e-4,
                "doc {}: {} vs {}",
                hit.doc,
                expl.value,
                hit.score
            );
        }
    }
}
