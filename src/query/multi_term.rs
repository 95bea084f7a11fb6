//! Multi-term query: a capped disjunction over boosted terms of one
//! field.
//!
//! This is the expanded form of prefix / wildcard / range queries: the
//! rewrite enumerates matching terms into one of these. The term set is
//! capped at `max_terms` keeping the highest boosts, and terms boosted
//! below `min_score` are dropped on entry.

use std::any::Any;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use ahash::AHasher;

use crate::error::Result;
use crate::index::{DocId, IndexReader, Term};
use crate::query::query::{boost_suffix, field_prefix, Query, Weight};
use crate::query::scorer::{DisjunctionSumScorer, Scorer};
use crate::query::term::TermScorer;
use crate::search::explanation::Explanation;
use crate::search::similarity::Similarity;
use crate::search::Searcher;

/// Default cap on the number of expanded terms.
pub const DEFAULT_MAX_TERMS: usize = 512;

/// One term of a [`MultiTermQuery`] with its boost.
#[derive(Debug, Clone, PartialEq)]
pub struct BoostedTerm {
    /// The term text.
    pub text: String,
    /// The per-term boost.
    pub boost: f32,
}

/// A disjunction over boosted terms of one field.
#[derive(Debug, Clone)]
pub struct MultiTermQuery {
    field: String,
    terms: Vec<BoostedTerm>,
    max_terms: usize,
    min_score: f32,
    boost: f32,
}

impl MultiTermQuery {
    /// Create an empty multi-term query with the default cap.
    pub fn new<F: Into<String>>(field: F) -> Self {
        Self::with_config(field, DEFAULT_MAX_TERMS, 0.0)
    }

    /// Create an empty multi-term query with an explicit term cap and
    /// minimum accepted boost.
    pub fn with_config<F: Into<String>>(field: F, max_terms: usize, min_score: f32) -> Self {
        MultiTermQuery {
            field: field.into(),
            terms: Vec::new(),
            max_terms,
            min_score,
            boost: 1.0,
        }
    }

    /// Set the boost factor.
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    /// Add a term at boost 1.
    pub fn add_term<T: Into<String>>(&mut self, text: T) {
        self.add_term_boost(text, 1.0);
    }

    /// Add a term with a boost. Terms below the minimum score are
    /// dropped; once the cap is reached a new term only enters by
    /// displacing the weakest kept term.
    pub fn add_term_boost<T: Into<String>>(&mut self, text: T, boost: f32) {
        if boost < self.min_score {
            return;
        }
        if self.terms.len() < self.max_terms {
            self.terms.push(BoostedTerm {
                text: text.into(),
                boost,
            });
            return;
        }
        let weakest = self
            .terms
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.boost.partial_cmp(&b.boost).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, term)| (i, term.boost));
        if let Some((idx, weakest_boost)) = weakest {
            if boost > weakest_boost {
                self.terms.remove(idx);
                self.terms.push(BoostedTerm {
                    text: text.into(),
                    boost,
                });
            }
        }
    }

    /// The field searched.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The kept terms in insertion order.
    pub fn terms(&self) -> &[BoostedTerm] {
        &self.terms
    }
}

impl Query for MultiTermQuery {
    fn create_weight(&self, searcher: &dyn Searcher) -> Result<Box<dyn Weight>> {
        let mut idf = 0.0;
        for term in &self.terms {
            let doc_freq = searcher.doc_freq(&self.field, &term.text)?;
            idf += searcher.similarity().idf(doc_freq, searcher.max_doc());
        }
        Ok(Box::new(MultiTermWeight {
            similarity: Arc::clone(searcher.similarity()),
            query: self.clone(),
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
        let mut sorted = self.terms.clone();
        sorted.sort_by(|a, b| {
            b.boost
                .partial_cmp(&a.boost)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.text.cmp(&b.text))
        });
        let body = sorted
            .iter()
            .map(|t| format!("{}{}", t.text, boost_suffix(t.boost)))
            .collect::<Vec<_>>()
            .join("|");
        format!(
            "{}\"{body}\"{}",
            field_prefix(&self.field, default_field),
            boost_suffix(self.boost)
        )
    }

    fn query_eq(&self, other: &dyn Query) -> bool {
        other
            .as_any()
            .downcast_ref::<MultiTermQuery>()
            .is_some_and(|o| {
                self.field == o.field && self.terms == o.terms && self.boost == o.boost
            })
    }

    fn query_hash(&self) -> u64 {
        let mut hasher = AHasher::default();
        "multi_term".hash(&mut hasher);
        self.field.hash(&mut hasher);
        for term in &self.terms {
            term.text.hash(&mut hasher);
            term.boost.to_bits().hash(&mut hasher);
        }
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
struct MultiTermWeight {
    similarity: Arc<dyn Similarity>,
    query: MultiTermQuery,
    idf: f32,
    query_weight: f32,
    query_norm: f32,
    value: f32,
}

impl MultiTermWeight {
    fn build_scorer(&self, reader: &Arc<dyn IndexReader>) -> Result<Option<DisjunctionSumScorer>> {
        let mut scorers: Vec<Box<dyn Scorer>> = Vec::new();
        let norms = reader.norms(&self.query.field);
        for term in &self.query.terms {
            if let Some(postings) =
                reader.term_positions(&Term::new(&self.query.field, &term.text))?
            {
                scorers.push(Box::new(TermScorer::new(
                    postings,
                    norms.clone(),
                    Arc::clone(&self.similarity),
                    self.value * term.boost,
                )));
            }
        }
        if scorers.is_empty() {
            return Ok(None);
        }
        Ok(Some(DisjunctionSumScorer::new(scorers)))
    }
}

impl Weight for MultiTermWeight {
    fn value(&self) -> f32 {
        self.value
    }

    fn sum_of_squared_weights(&mut self) -> f32 {
        self.query_weight = self.idf * self.query.boost;
        self.query_weight * self.query_weight
    }

    fn normalize(&mut self, norm: f32) {
        self.query_norm = norm;
        self.query_weight *= norm;
        self.value = self.query_weight * self.idf;
    }

    fn scorer(&self, reader: &Arc<dyn IndexReader>) -> Result<Option<Box<dyn Scorer>>> {
        Ok(self
            .build_scorer(reader)?
            .map(|scorer| Box::new(scorer) as Box<dyn Scorer>))
    }

    fn explain(&self, reader: &Arc<dyn IndexReader>, doc: DocId) -> Result<Explanation> {
        let label = self.query.to_query_string("");
        let mut scorer = match self.build_scorer(reader)? {
            Some(scorer) => scorer,
            None => return Ok(Explanation::new(0.0, format!("no match for {label}"))),
        };
        if !scorer.skip_to(doc)? || scorer.doc() != doc {
            return Ok(Explanation::new(
                0.0,
                format!("no match for {label} in doc {doc}"),
            ));
        }
        let score = scorer.score()?;
        let mut expl = Explanation::new(
            score,
            format!("multi_term({label} in {doc}), sum over matching terms:"),
        );
        expl.add_detail(Explanation::new(
            self.value,
            "query_weight * idf(sum over terms)",
        ));
        Ok(expl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::LowercaseAnalyzer;
    use crate::document::Document;
    use crate::index::MemoryIndex;
    use crate::search::searcher::IndexSearcher;
    use crate::search::{SearchRequest, Searcher as _};

    fn searcher() -> IndexSearcher {
        let index = MemoryIndex::new(Arc::new(LowercaseAnalyzer));
        for text in ["brown fox", "fast fox", "brown bear", "red wolf"] {
            index
                .add_document(Document::new().add("body", text))
                .unwrap();
        }
        IndexSearcher::new(index.reader())
    }

    fn docs_of(searcher: &IndexSearcher, query: &dyn Query) -> Vec<DocId> {
        let mut docs: Vec<DocId> = searcher
            .search(query, &SearchRequest::top(20))
            .unwrap()
            .hits
            .iter()
            .map(|h| h.doc)
            .collect();
        docs.sort_unstable();
        docs
    }

    #[test]
    fn test_empty_matches_nothing() {
        let searcher = searcher();
        let query = MultiTermQuery::new("body");
        assert!(docs_of(&searcher, &query).is_empty());
    }

    #[test]
    fn test_union_of_terms() {
        let searcher = searcher();
        let mut query = MultiTermQuery::new("body");
        query.add_term("brown");
        query.add_term("fast");
        assert_eq!(docs_of(&searcher, &query), vec![0, 1, 2]);
    }

    #[test]
    fn test_min_score_drops_weak_terms() {
        let searcher = searcher();
        let mut query = MultiTermQuery::with_config("body", 4, 0.5);
        query.add_term("brown");
        query.add_term_boost("fox", 0.1);
        assert_eq!(docs_of(&searcher, &query), vec![0, 2]);
        assert_eq!(query.to_query_string(""), "body:\"brown\"");

        query.add_term_boost("fox", 0.6);
        assert_eq!(docs_of(&searcher, &query), vec![0, 1, 2]);
    }

    #[test]
    fn test_cap_keeps_highest_boosts() {
        let mut query = MultiTermQuery::with_config("body", 2, 0.0);
        query.add_term_boost("a", 1.0);
        query.add_term_boost("b", 0.5);
        query.add_term_boost("c", 2.0);

        let texts: Vec<&str> = query.terms().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "c"]);

        // ties do not displace
        query.add_term_boost("d", 1.0);
        let texts: Vec<&str> = query.terms().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "c"]);
    }

    #[test]
    fn test_term_boost_ranks_hits() {
        let searcher = searcher();
        let mut query = MultiTermQuery::new("body");
        query.add_term_boost("brown", 1.0);
        query.add_term_boost("fast", 50.0);
        let top = searcher.search(&query, &SearchRequest::top(10)).unwrap();
        assert_eq!(top.hits[0].doc, 1);
    }

    #[test]
    fn test_to_query_string_sorted_by_boost_then_text() {
        let mut query = MultiTermQuery::new("body");
        query.add_term("brown");
        query.add_term_boost("fox", 0.6);
        query.add_term_boost("fast", 50.0);
        assert_eq!(query.to_query_string("body"), "\"fast^50.0|brown|fox^0.6\"");
        assert_eq!(
            query.to_query_string(""),
            "body:\"fast^50.0|brown|fox^0.6\""
        );

        let boosted = query.clone().with_boost(80.1);
        assert_eq!(
            boosted.to_query_string(""),
            "body:\"fast^50.0|brown|fox^0.6\"^80.1"
        );
    }

    #[test]
    fn test_eq_hash() {
        let mut q1 = MultiTermQuery::with_config("body", 100, 0.4);
        let mut q2 = MultiTermQuery::new("body");
        assert!(q1.query_eq(&q2));
        assert_eq!(q1.query_hash(), q2.query_hash());

        q1.add_term("word1");
        assert!(!q1.query_eq(&q2));

        q2.add_term("word1");
        assert!(q1.query_eq(&q2));
        assert_eq!(q1.query_hash(), q2.query_hash());

        q1.add_term("word2");
        q2.add_term_boost("word2", 1.5);
        assert!(!q1.query_eq(&q2));
        assert_ne!(q1.query_hash(), q2.query_hash());
    }
}
