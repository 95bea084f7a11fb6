//! Term query: matches documents containing one exact term.

use std::any::Any;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use ahash::AHasher;

use crate::error::Result;
use crate::index::postings::Postings;
use crate::index::{DocId, IndexReader, Term};
use crate::query::query::{boost_suffix, field_prefix, Query, Weight};
use crate::query::scorer::Scorer;
use crate::search::explanation::Explanation;
use crate::search::similarity::Similarity;
use crate::search::Searcher;

/// Number of term frequencies with a precomputed score.
pub(crate) const SCORE_CACHE_SIZE: usize = 32;

/// A query that matches documents containing a specific term.
///
/// The term is matched exactly; normalize it the way the indexed text
/// was analyzed before constructing the query.
#[derive(Debug, Clone)]
pub struct TermQuery {
    term: Term,
    boost: f32,
}

impl TermQuery {
    /// Create a new term query.
    pub fn new<F, T>(field: F, text: T) -> Self
    where
        F: Into<String>,
        T: Into<String>,
    {
        TermQuery {
            term: Term::new(field, text),
            boost: 1.0,
        }
    }

    /// Set the boost factor.
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    /// The queried term.
    pub fn term(&self) -> &Term {
        &self.term
    }

    /// The field searched.
    pub fn field(&self) -> &str {
        &self.term.field
    }

    /// The term text.
    pub fn text(&self) -> &str {
        &self.term.text
    }
}

impl Query for TermQuery {
    fn create_weight(&self, searcher: &dyn Searcher) -> Result<Box<dyn Weight>> {
        let doc_freq = searcher.doc_freq(&self.term.field, &self.term.text)?;
        let idf = searcher.similarity().idf(doc_freq, searcher.max_doc());
        Ok(Box::new(TermWeight {
            similarity: Arc::clone(searcher.similarity()),
            term: self.term.clone(),
            boost: self.boost,
            doc_freq,
            idf,
            query_weight: 0.0,
            query_norm: 0.0,
            value: 0.0,
        }))
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn set_boost(&mut self, boost: f32) {
        self.boost = boost;
    }

    fn to_query_string(&self, default_field: &str) -> String {
        format!(
            "{}{}{}",
            field_prefix(&self.term.field, default_field),
            self.term.text,
            boost_suffix(self.boost)
        )
    }

    fn query_eq(&self, other: &dyn Query) -> bool {
        other
            .as_any()
            .downcast_ref::<TermQuery>()
            .is_some_and(|o| self.term == o.term && self.boost == o.boost)
    }

    fn query_hash(&self) -> u64 {
        let mut hasher = AHasher::default();
        "term".hash(&mut hasher);
        self.term.hash(&mut hasher);
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

/// Per-searcher weight of a [`TermQuery`].
#[derive(Debug)]
pub(crate) struct TermWeight {
    similarity: Arc<dyn Similarity>,
    term: Term,
    boost: f32,
    doc_freq: u32,
    idf: f32,
    query_weight: f32,
    query_norm: f32,
    value: f32,
}

impl Weight for TermWeight {
    fn value(&self) -> f32 {
        self.value
    }

    fn sum_of_squared_weights(&mut self) -> f32 {
        self.query_weight = self.idf * self.boost;
        self.query_weight * self.query_weight
    }

    fn normalize(&mut self, norm: f32) {
        self.query_norm = norm;
        self.query_weight *= norm;
        self.value = self.query_weight * self.idf;
    }

    fn scorer(&self, reader: &Arc<dyn IndexReader>) -> Result<Option<Box<dyn Scorer>>> {
        let postings = match reader.term_positions(&self.term)? {
            Some(postings) => postings,
            None => return Ok(None),
        };
        Ok(Some(Box::new(TermScorer::new(
            postings,
            reader.norms(&self.term.field),
            Arc::clone(&self.similarity),
            self.value,
        ))))
    }

    fn explain(&self, reader: &Arc<dyn IndexReader>, doc: DocId) -> Result<Explanation> {
        let freq = match reader.term_positions(&self.term)? {
            Some(mut postings) => {
                if postings.skip_to(doc)? && postings.doc() == doc {
                    postings.freq()
                } else {
                    0
                }
            }
            None => 0,
        };
        if freq == 0 {
            return Ok(Explanation::new(
                0.0,
                format!("no matching term {} in doc {doc}", self.term),
            ));
        }

        let mut query_expl = Explanation::new(
            self.query_weight,
            format!("query_weight({}), product of:", self.term),
        );
        if self.boost != 1.0 {
            query_expl.add_detail(Explanation::new(self.boost, "boost"));
        }
        query_expl.add_detail(Explanation::new(
            self.idf,
            format!("idf(doc_freq={})", self.doc_freq),
        ));
        query_expl.add_detail(Explanation::new(self.query_norm, "query_norm"));

        let field_expl = explain_field_weight(
            &self.similarity,
            &self.term.field,
            format!("{}", self.term),
            doc,
            freq as f32,
            self.idf,
            self.doc_freq,
            reader,
        );

        if query_expl.value == 1.0 {
            return Ok(field_expl);
        }

        let mut expl = Explanation::new(
            query_expl.value * field_expl.value,
            format!("weight({} in {doc}), product of:", self.term),
        );
        expl.add_detail(query_expl);
        expl.add_detail(field_expl);
        Ok(expl)
    }
}

/// Build the `field_weight = tf · idf · norm` explanation subtree shared
/// by the term-family weights.
#[allow(clippy::too_many_arguments)]
pub(crate) fn explain_field_weight(
    similarity: &Arc<dyn Similarity>,
    field: &str,
    label: String,
    doc: DocId,
    freq: f32,
    idf: f32,
    doc_freq: u32,
    reader: &Arc<dyn IndexReader>,
) -> Explanation {
    let tf = similarity.tf(freq);
    let norm = reader
        .norms(field)
        .map(|norms| similarity.decode_norm(norms[doc as usize]))
        .unwrap_or(1.0);

    let mut field_expl = Explanation::new(
        tf * idf * norm,
        format!("field_weight({label} in {doc}), product of:"),
    );
    field_expl.add_detail(Explanation::new(tf, format!("tf(term_freq={freq})")));
    field_expl.add_detail(Explanation::new(
        idf,
        format!("idf(doc_freq={doc_freq})"),
    ));
    field_expl.add_detail(Explanation::new(
        norm,
        format!("field_norm(field={field}, doc={doc})"),
    ));
    field_expl
}

/// Scores one term's postings: `tf(freq) · value · norm`.
pub(crate) struct TermScorer {
    postings: Box<dyn Postings>,
    norms: Option<Arc<[u8]>>,
    similarity: Arc<dyn Similarity>,
    value: f32,
    score_cache: [f32; SCORE_CACHE_SIZE],
}

impl TermScorer {
    pub(crate) fn new(
        postings: Box<dyn Postings>,
        norms: Option<Arc<[u8]>>,
        similarity: Arc<dyn Similarity>,
        value: f32,
    ) -> Self {
        let mut score_cache = [0.0f32; SCORE_CACHE_SIZE];
        for (freq, slot) in score_cache.iter_mut().enumerate() {
            *slot = similarity.tf(freq as f32) * value;
        }
        TermScorer {
            postings,
            norms,
            similarity,
            value,
            score_cache,
        }
    }

    fn norm(&self, doc: DocId) -> f32 {
        self.norms
            .as_ref()
            .map(|norms| self.similarity.decode_norm(norms[doc as usize]))
            .unwrap_or(1.0)
    }
}

impl Scorer for TermScorer {
    fn next(&mut self) -> Result<bool> {
        self.postings.next()
    }

    fn skip_to(&mut self, target: DocId) -> Result<bool> {
        self.postings.skip_to(target)
    }

    fn doc(&self) -> DocId {
        self.postings.doc()
    }

    fn score(&mut self) -> Result<f32> {
        let freq = self.postings.freq() as usize;
        let raw = if freq < SCORE_CACHE_SIZE {
            self.score_cache[freq]
        } else {
            self.similarity.tf(freq as f32) * self.value
        };
        Ok(raw * self.norm(self.postings.doc()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::LowercaseAnalyzer;
    use crate::document::Document;
    use crate::index::MemoryIndex;
    use crate::search::searcher::IndexSearcher;
    use crate::search::SearchRequest;

    fn searcher() -> IndexSearcher {
        let index = MemoryIndex::new(Arc::new(LowercaseAnalyzer));
        for text in ["rust search", "rust rust rust", "other things"] {
            index
                .add_document(Document::new().add("body", text))
                .unwrap();
        }
        IndexSearcher::new(index.reader())
    }

    #[test]
    fn test_term_query_strings() {
        let query = TermQuery::new("body", "rust");
        assert_eq!(query.to_query_string("body"), "rust");
        assert_eq!(query.to_query_string(""), "body:rust");

        let query = query.with_boost(100.0);
        assert_eq!(query.to_query_string("body"), "rust^100.0");
        assert_eq!(query.to_query_string(""), "body:rust^100.0");
    }

    #[test]
    fn test_term_query_eq_hash() {
        let q1 = TermQuery::new("a", "x");
        let q2 = TermQuery::new("a", "x");
        assert!(q1.query_eq(&q2));
        assert_eq!(q1.query_hash(), q2.query_hash());

        let other_text = TermQuery::new("a", "y");
        assert!(!q1.query_eq(&other_text));
        assert_ne!(q1.query_hash(), other_text.query_hash());

        let other_field = TermQuery::new("b", "x");
        assert!(!q1.query_eq(&other_field));
        assert_ne!(q1.query_hash(), other_field.query_hash());

        let other_boost = TermQuery::new("a", "x").with_boost(2.0);
        assert!(!q1.query_eq(&other_boost));
    }

    #[test]
    fn test_term_search_ranks_by_frequency() {
        let searcher = searcher();
        let query = TermQuery::new("body", "rust");
        let top_docs = searcher.search(&query, &SearchRequest::top(10)).unwrap();

        assert_eq!(top_docs.total_hits, 2);
        assert_eq!(top_docs.hits[0].doc, 1);
        assert_eq!(top_docs.hits[1].doc, 0);
        assert!(top_docs.hits[0].score > top_docs.hits[1].score);
    }

    #[test]
    fn test_missing_term_matches_nothing() {
        let searcher = searcher();
        for query in [
            TermQuery::new("body", "absent"),
            TermQuery::new("missing_field", "rust"),
        ] {
            let top_docs = searcher.search(&query, &SearchRequest::top(10)).unwrap();
            assert_eq!(top_docs.total_hits, 0);
            assert!(top_docs.hits.is_empty());
        }
    }

    #[test]
    fn test_explanation_matches_score() {
        let searcher = searcher();
        let query = TermQuery::new("body", "rust").with_boost(2.0);
        let top_docs = searcher.search(&query, &SearchRequest::top(10)).unwrap();

        for hit in &top_docs.hits {
            let expl = searcher.explain(&query, hit.doc).unwrap();
            assert!(
                (expl.value - hit.score).abs() <= hit.score * 1e-4,
                "doc {}: explained {} vs scored {}\n{}",
                hit.doc,
                expl.value,
                hit.score,
                expl
            );
        }
    }
}
