//! Boolean query: combines clauses with MUST / SHOULD / MUST_NOT
//! occurrence requirements.
//!
//! Required clauses are AND-merged by conjunctive lock-step advance,
//! optional clauses contribute score on the docs they share with the
//! merged stream (or drive a disjunction when nothing is required), and
//! prohibited clauses only prune — they never contribute score. The
//! coord factor rewards docs matching more clauses unless disabled.

use std::any::Any;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use ahash::AHasher;

use crate::error::Result;
use crate::index::{DocId, IndexReader, NO_MORE_DOCS};
use crate::query::query::{boost_suffix, Query, Weight};
use crate::query::scorer::{AllScorer, DisjunctionSumScorer, Scorer};
use crate::search::explanation::Explanation;
use crate::search::similarity::Similarity;
use crate::search::Searcher;

/// Occurrence requirement of a boolean clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Occur {
    /// The clause must match.
    Must,
    /// The clause may match and then contributes score.
    Should,
    /// The clause must not match.
    MustNot,
}

impl Occur {
    fn prefix(&self) -> &'static str {
        match self {
            Occur::Must => "+",
            Occur::Should => "",
            Occur::MustNot => "-",
        }
    }
}

/// One clause of a [`BooleanQuery`].
#[derive(Debug)]
pub struct BooleanClause {
    /// The clause query.
    pub query: Box<dyn Query>,
    /// The occurrence requirement.
    pub occur: Occur,
}

impl Clone for BooleanClause {
    fn clone(&self) -> Self {
        BooleanClause {
            query: self.query.clone_box(),
            occur: self.occur,
        }
    }
}

impl BooleanClause {
    /// Create a clause.
    pub fn new(query: Box<dyn Query>, occur: Occur) -> Self {
        BooleanClause { query, occur }
    }
}

/// A query combining clauses with boolean logic.
#[derive(Debug, Clone)]
pub struct BooleanQuery {
    clauses: Vec<BooleanClause>,
    coord_disabled: bool,
    boost: f32,
}

impl Default for BooleanQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl BooleanQuery {
    /// Create an empty boolean query with coord scoring enabled.
    pub fn new() -> Self {
        BooleanQuery {
            clauses: Vec::new(),
            coord_disabled: false,
            boost: 1.0,
        }
    }

    /// Enable or disable the coord factor.
    pub fn with_coord_disabled(mut self, disabled: bool) -> Self {
        self.coord_disabled = disabled;
        self
    }

    /// Set the boost factor.
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    /// Add a clause.
    pub fn add_clause(&mut self, query: Box<dyn Query>, occur: Occur) {
        self.clauses.push(BooleanClause::new(query, occur));
    }

    /// Add a MUST clause.
    pub fn add_must(&mut self, query: Box<dyn Query>) {
        self.add_clause(query, Occur::Must);
    }

    /// Add a SHOULD clause.
    pub fn add_should(&mut self, query: Box<dyn Query>) {
        self.add_clause(query, Occur::Should);
    }

    /// Add a MUST_NOT clause.
    pub fn add_must_not(&mut self, query: Box<dyn Query>) {
        self.add_clause(query, Occur::MustNot);
    }

    /// The clauses in insertion order.
    pub fn clauses(&self) -> &[BooleanClause] {
        &self.clauses
    }

    /// True when no clause was added.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// True when the coord factor is disabled.
    pub fn is_coord_disabled(&self) -> bool {
        self.coord_disabled
    }
}

impl Query for BooleanQuery {
    fn create_weight(&self, searcher: &dyn Searcher) -> Result<Box<dyn Weight>> {
        let mut weights = Vec::with_capacity(self.clauses.len());
        for clause in &self.clauses {
            weights.push((clause.query.create_weight(searcher)?, clause.occur));
        }
        Ok(Box::new(BooleanWeight {
            similarity: Arc::clone(searcher.similarity()),
            weights,
            boost: self.boost,
            coord_disabled: self.coord_disabled,
        }))
    }

    fn rewrite(&self, reader: &Arc<dyn IndexReader>) -> Result<Box<dyn Query>> {
        if self.clauses.len() == 1 && self.clauses[0].occur == Occur::Must {
            let mut inner = self.clauses[0].query.rewrite(reader)?;
            if self.boost != 1.0 {
                let merged = inner.boost() * self.boost;
                inner.set_boost(merged);
            }
            return Ok(inner);
        }

        let mut rewritten = BooleanQuery {
            clauses: Vec::with_capacity(self.clauses.len()),
            coord_disabled: self.coord_disabled,
            boost: self.boost,
        };
        for clause in &self.clauses {
            rewritten
                .clauses
                .push(BooleanClause::new(clause.query.rewrite(reader)?, clause.occur));
        }
        Ok(Box::new(rewritten))
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn set_boost(&mut self, boost: f32) {
        self.boost = boost;
    }

    fn to_query_string(&self, default_field: &str) -> String {
        let mut parts = Vec::with_capacity(self.clauses.len());
        for clause in &self.clauses {
            let sub = if clause.query.as_any().is::<BooleanQuery>() {
                format!("({})", clause.query.to_query_string(default_field))
            } else {
                clause.query.to_query_string(default_field)
            };
            parts.push(format!("{}{}", clause.occur.prefix(), sub));
        }
        let joined = parts.join(" ");
        if self.boost == 1.0 {
            joined
        } else {
            format!("({joined}){}", boost_suffix(self.boost))
        }
    }

    fn query_eq(&self, other: &dyn Query) -> bool {
        other
            .as_any()
            .downcast_ref::<BooleanQuery>()
            .is_some_and(|o| {
                self.boost == o.boost
                    && self.coord_disabled == o.coord_disabled
                    && self.clauses.len() == o.clauses.len()
                    && self
                        .clauses
                        .iter()
                        .zip(&o.clauses)
                        .all(|(a, b)| a.occur == b.occur && a.query.query_eq(b.query.as_ref()))
            })
    }

    fn query_hash(&self) -> u64 {
        let mut hasher = AHasher::default();
        "boolean".hash(&mut hasher);
        self.coord_disabled.hash(&mut hasher);
        self.boost.to_bits().hash(&mut hasher);
        for clause in &self.clauses {
            clause.occur.hash(&mut hasher);
            clause.query.query_hash().hash(&mut hasher);
        }
        hasher.finish()
    }

    fn clone_box(&self) -> Box<dyn Query> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Combine several already-rewritten queries into one equivalent query.
///
/// Duplicates collapse; coord-disabled SHOULD-only booleans are spliced
/// into the result instead of nested. One unique query comes back
/// as-is, several become a coord-disabled SHOULD-of-all boolean. This
/// is how the multi-searcher folds its per-reader rewrites together.
pub fn combine_queries(queries: &[Box<dyn Query>]) -> Box<dyn Query> {
    fn add_unique(uniques: &mut Vec<Box<dyn Query>>, query: &dyn Query) {
        if !uniques.iter().any(|u| u.query_eq(query)) {
            uniques.push(query.clone_box());
        }
    }

    let mut uniques: Vec<Box<dyn Query>> = Vec::new();
    for query in queries {
        let spliceable = query.as_any().downcast_ref::<BooleanQuery>().filter(|bq| {
            bq.is_coord_disabled()
                && bq.boost() == 1.0
                && bq.clauses().iter().all(|c| c.occur == Occur::Should)
        });
        match spliceable {
            Some(bq) => {
                for clause in bq.clauses() {
                    add_unique(&mut uniques, clause.query.as_ref());
                }
            }
            None => add_unique(&mut uniques, query.as_ref()),
        }
    }

    if uniques.len() == 1 {
        uniques.pop().expect("one unique query")
    } else {
        let mut combined = BooleanQuery::new().with_coord_disabled(true);
        for unique in uniques {
            combined.add_should(unique);
        }
        Box::new(combined)
    }
}

#[derive(Debug)]
struct BooleanWeight {
    similarity: Arc<dyn Similarity>,
    weights: Vec<(Box<dyn Weight>, Occur)>,
    boost: f32,
    coord_disabled: bool,
}

impl BooleanWeight {
    /// Clause count entering the coord denominator.
    fn max_coord(&self) -> usize {
        self.weights
            .iter()
            .filter(|(_, occur)| *occur != Occur::MustNot)
            .count()
    }

    fn coord_factors(&self, max_matchers: usize) -> Vec<f32> {
        let max_coord = self.max_coord();
        (0..=max_matchers)
            .map(|n| {
                if self.coord_disabled {
                    1.0
                } else {
                    self.similarity.coord(n, max_coord)
                }
            })
            .collect()
    }
}

impl Weight for BooleanWeight {
    fn value(&self) -> f32 {
        self.boost
    }

    fn sum_of_squared_weights(&mut self) -> f32 {
        let mut sum = 0.0;
        for (weight, occur) in &mut self.weights {
            if *occur != Occur::MustNot {
                sum += weight.sum_of_squared_weights();
            }
        }
        sum * self.boost * self.boost
    }

    fn normalize(&mut self, norm: f32) {
        let norm = norm * self.boost;
        for (weight, _) in &mut self.weights {
            weight.normalize(norm);
        }
    }

    fn scorer(&self, reader: &Arc<dyn IndexReader>) -> Result<Option<Box<dyn Scorer>>> {
        if self.weights.is_empty() {
            return Ok(None);
        }

        // One MUST clause alone reduces to its scorer.
        if self.weights.len() == 1 && self.weights[0].1 == Occur::Must {
            return self.weights[0].0.scorer(reader);
        }

        let mut required = Vec::new();
        let mut optional = Vec::new();
        let mut prohibited = Vec::new();
        let mut has_positive_clause = false;
        for (weight, occur) in &self.weights {
            match occur {
                Occur::Must => {
                    has_positive_clause = true;
                    match weight.scorer(reader)? {
                        Some(scorer) => required.push(scorer),
                        None => return Ok(None),
                    }
                }
                Occur::Should => {
                    has_positive_clause = true;
                    if let Some(scorer) = weight.scorer(reader)? {
                        optional.push(scorer);
                    }
                }
                Occur::MustNot => {
                    if let Some(scorer) = weight.scorer(reader)? {
                        prohibited.push(scorer);
                    }
                }
            }
        }

        if !has_positive_clause {
            // Only MUST_NOT clauses: iterate the complement of their
            // union over live docs.
            required.push(Box::new(AllScorer::new(Arc::clone(reader), self.boost)) as Box<dyn Scorer>);
        } else if required.is_empty() && optional.is_empty() {
            return Ok(None);
        }

        let max_matchers = required.len() + optional.len();
        let coord_factors = self.coord_factors(max_matchers);
        let prohibited_len = prohibited.len();
        Ok(Some(Box::new(BooleanScorer {
            required,
            optional: if optional.is_empty() {
                None
            } else {
                Some(DisjunctionSumScorer::new(optional))
            },
            optional_exhausted: false,
            prohibited,
            prohibited_exhausted: vec![false; prohibited_len],
            prohibited_started: false,
            coord_factors,
            current: NO_MORE_DOCS,
            started: false,
            exhausted: false,
        })))
    }

    fn explain(&self, reader: &Arc<dyn IndexReader>, doc: DocId) -> Result<Explanation> {
        let mut scorer = match self.scorer(reader)? {
            Some(scorer) => scorer,
            None => return Ok(Explanation::new(0.0, "no matching clauses")),
        };
        if !scorer.skip_to(doc)? || scorer.doc() != doc {
            return Ok(Explanation::new(0.0, format!("no match in doc {doc}")));
        }

        let mut positive_clauses = 0;
        let mut sum_expl = Explanation::new(0.0, "sum of:");
        let mut sum = 0.0;
        let mut matchers = 0usize;
        for (weight, occur) in &self.weights {
            if *occur == Occur::MustNot {
                continue;
            }
            positive_clauses += 1;
            let matched = match weight.scorer(reader)? {
                Some(mut sub) => sub.skip_to(doc)? && sub.doc() == doc,
                None => false,
            };
            if matched {
                let sub_expl = weight.explain(reader, doc)?;
                sum += sub_expl.value;
                matchers += 1;
                sum_expl.add_detail(sub_expl);
            }
        }

        if positive_clauses == 0 {
            return Ok(Explanation::new(
                self.boost,
                "match through exclusion of prohibited clauses",
            ));
        }

        sum_expl.value = sum;
        let max_coord = self.max_coord();
        let coord = if self.coord_disabled {
            1.0
        } else {
            self.similarity.coord(matchers, max_coord)
        };
        if coord == 1.0 {
            return Ok(sum_expl);
        }
        let mut expl = Explanation::new(sum * coord, "product of:");
        expl.add_detail(sum_expl);
        expl.add_detail(Explanation::new(
            coord,
            format!("coord({matchers}/{max_coord})"),
        ));
        Ok(expl)
    }
}

/// Composite scorer over required / optional / prohibited groups.
struct BooleanScorer {
    required: Vec<Box<dyn Scorer>>,
    optional: Option<DisjunctionSumScorer>,
    optional_exhausted: bool,
    prohibited: Vec<Box<dyn Scorer>>,
    prohibited_exhausted: Vec<bool>,
    prohibited_started: bool,
    coord_factors: Vec<f32>,
    current: DocId,
    started: bool,
    exhausted: bool,
}

impl BooleanScorer {
    /// True when a prohibited clause contains `doc`.
    fn excluded(&mut self, doc: DocId) -> Result<bool> {
        for i in 0..self.prohibited.len() {
            if self.prohibited_exhausted[i] {
                continue;
            }
            let scorer = &mut self.prohibited[i];
            if !self.prohibited_started || scorer.doc() < doc {
                if !scorer.skip_to(doc)? {
                    self.prohibited_exhausted[i] = true;
                    continue;
                }
            }
            if scorer.doc() == doc {
                return Ok(true);
            }
        }
        self.prohibited_started = true;
        Ok(false)
    }

    /// Lock-step the required scorers onto a shared, non-excluded doc.
    /// Every required scorer must already have a current doc.
    fn align_required(&mut self) -> Result<bool> {
        loop {
            let mut target = 0;
            for scorer in &self.required {
                target = target.max(scorer.doc());
            }
            if target == NO_MORE_DOCS {
                return Ok(false);
            }
            loop {
                let mut moved = false;
                for scorer in &mut self.required {
                    if scorer.doc() < target {
                        if !scorer.skip_to(target)? {
                            return Ok(false);
                        }
                        if scorer.doc() > target {
                            target = scorer.doc();
                            moved = true;
                        }
                    }
                }
                if !moved {
                    break;
                }
            }
            if self.excluded(target)? {
                if !self.required[0].next()? {
                    return Ok(false);
                }
                continue;
            }
            self.current = target;
            return Ok(true);
        }
    }

    fn next_optional_driven(&mut self) -> Result<bool> {
        loop {
            if !self.optional.as_mut().expect("no positive scorers").next()? {
                return Ok(false);
            }
            let doc = self.optional.as_ref().expect("no positive scorers").doc();
            if !self.excluded(doc)? {
                self.current = doc;
                return Ok(true);
            }
        }
    }
}

impl Scorer for BooleanScorer {
    fn next(&mut self) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        let more = if !self.required.is_empty() {
            if !self.started {
                self.started = true;
                let mut alive = true;
                for scorer in &mut self.required {
                    if !scorer.next()? {
                        alive = false;
                        break;
                    }
                }
                alive && self.align_required()?
            } else if !self.required[0].next()? {
                false
            } else {
                self.align_required()?
            }
        } else {
            self.started = true;
            self.next_optional_driven()?
        };
        if !more {
            self.exhausted = true;
            self.current = NO_MORE_DOCS;
        }
        Ok(more)
    }

    fn skip_to(&mut self, target: DocId) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        if self.started && self.current != NO_MORE_DOCS && self.current >= target {
            return Ok(true);
        }
        let more = if !self.required.is_empty() {
            let fresh = !self.started;
            self.started = true;
            let mut alive = true;
            for scorer in &mut self.required {
                if fresh || scorer.doc() < target {
                    if !scorer.skip_to(target)? {
                        alive = false;
                        break;
                    }
                }
            }
            alive && self.align_required()?
        } else {
            self.started = true;
            let optional = self.optional.as_mut().expect("no positive scorers");
            if !optional.skip_to(target)? {
                false
            } else {
                let mut found = false;
                loop {
                    let doc = self.optional.as_ref().expect("no positive scorers").doc();
                    if !self.excluded(doc)? {
                        self.current = doc;
                        found = true;
                        break;
                    }
                    let optional = self.optional.as_mut().expect("no positive scorers");
                    if !optional.next()? {
                        break;
                    }
                }
                found
            }
        };
        if !more {
            self.exhausted = true;
            self.current = NO_MORE_DOCS;
        }
        Ok(more)
    }

    fn doc(&self) -> DocId {
        self.current
    }

    fn score(&mut self) -> Result<f32> {
        let mut sum = 0.0;
        let mut matchers = 0usize;
        for scorer in &mut self.required {
            sum += scorer.score()?;
            matchers += 1;
        }
        if !self.required.is_empty() {
            if let Some(optional) = self.optional.as_mut() {
                if !self.optional_exhausted {
                    if optional.skip_to(self.current)? {
                        if optional.doc() == self.current {
                            sum += optional.score()?;
                            matchers += optional.nr_matchers();
                        }
                    } else {
                        self.optional_exhausted = true;
                    }
                }
            }
        } else if let Some(optional) = self.optional.as_mut() {
            sum = optional.score()?;
            matchers = optional.nr_matchers();
        }
        Ok(sum * self.coord_factors[matchers.min(self.coord_factors.len() - 1)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::LowercaseAnalyzer;
    use crate::document::Document;
    use crate::index::MemoryIndex;
    use crate::query::term::TermQuery;
    use crate::search::searcher::IndexSearcher;
    use crate::search::SearchRequest;

    fn term(field: &str, text: &str) -> Box<dyn Query> {
        Box::new(TermQuery::new(field, text))
    }

    fn searcher() -> IndexSearcher {
        let index = MemoryIndex::new(Arc::new(LowercaseAnalyzer));
        for text in [
            "apple banana",
            "apple cherry",
            "banana cherry",
            "apple banana cherry",
            "date",
        ] {
            index
                .add_document(Document::new().add("body", text))
                .unwrap();
        }
        IndexSearcher::new(index.reader())
    }

    fn docs_of(searcher: &IndexSearcher, query: &dyn Query) -> Vec<DocId> {
        let mut top = searcher
            .search(query, &SearchRequest::top(20))
            .unwrap()
            .hits
            .iter()
            .map(|h| h.doc)
            .collect::<Vec<_>>();
        top.sort_unstable();
        top
    }

    #[test]
    fn test_must_conjunction() {
        let searcher = searcher();
        let mut bq = BooleanQuery::new();
        bq.add_must(term("body", "apple"));
        bq.add_must(term("body", "banana"));
        assert_eq!(docs_of(&searcher, &bq), vec![0, 3]);
    }

    #[test]
    fn test_should_disjunction() {
        let searcher = searcher();
        let mut bq = BooleanQuery::new();
        bq.add_should(term("body", "apple"));
        bq.add_should(term("body", "date"));
        assert_eq!(docs_of(&searcher, &bq), vec![0, 1, 3, 4]);
    }

    #[test]
    fn test_must_not_prunes() {
        let searcher = searcher();
        let mut bq = BooleanQuery::new();
        bq.add_must(term("body", "apple"));
        bq.add_must_not(term("body", "cherry"));
        assert_eq!(docs_of(&searcher, &bq), vec![0]);
    }

    #[test]
    fn test_only_must_not_is_complement() {
        let searcher = searcher();
        let mut bq = BooleanQuery::new();
        bq.add_must_not(term("body", "apple"));
        assert_eq!(docs_of(&searcher, &bq), vec![2, 4]);
    }

    #[test]
    fn test_coord_favors_more_matches() {
        let searcher = searcher();
        let mut bq = BooleanQuery::new();
        bq.add_should(term("body", "apple"));
        bq.add_should(term("body", "banana"));
        bq.add_should(term("body", "cherry"));
        let top = searcher.search(&bq, &SearchRequest::top(10)).unwrap();
        assert_eq!(top.hits[0].doc, 3);
    }

    #[test]
    fn test_missing_should_terms_ignored() {
        let searcher = searcher();
        let mut bq = BooleanQuery::new();
        bq.add_should(term("nothere", "apple"));
        bq.add_should(term("body", "date"));
        assert_eq!(docs_of(&searcher, &bq), vec![4]);
    }

    #[test]
    fn test_missing_must_term_matches_nothing() {
        let searcher = searcher();
        let mut bq = BooleanQuery::new();
        bq.add_must(term("body", "absent"));
        bq.add_should(term("body", "apple"));
        assert!(docs_of(&searcher, &bq).is_empty());
    }

    #[test]
    fn test_to_query_string() {
        let mut bq = BooleanQuery::new();
        bq.add_must(term("title", "hello"));
        bq.add_should(term("body", "world"));
        bq.add_must_not(term("title", "spam"));
        assert_eq!(
            bq.to_query_string(""),
            "+title:hello body:world -title:spam"
        );

        let boosted = bq.clone().with_boost(2.0);
        assert_eq!(
            boosted.to_query_string(""),
            "(+title:hello body:world -title:spam)^2.0"
        );
    }

    #[test]
    fn test_eq_hash() {
        let mut q1 = BooleanQuery::new();
        q1.add_must(term("a", "1"));
        q1.add_must(term("b", "2"));
        let mut q2 = BooleanQuery::new();
        q2.add_must(term("a", "1"));
        q2.add_must(term("b", "2"));

        assert!(q1.query_eq(&q2));
        assert_eq!(q1.query_hash(), q2.query_hash());

        let coordless = q2.clone().with_coord_disabled(true);
        assert!(!q1.query_eq(&coordless));
        assert_ne!(q1.query_hash(), coordless.query_hash());

        let mut different_occur = BooleanQuery::new();
        different_occur.add_should(term("a", "1"));
        different_occur.add_must_not(term("b", "2"));
        assert!(!q1.query_eq(&different_occur));

        let mut longer = q2.clone();
        longer.add_clause(term("c", "3"), Occur::Must);
        assert!(!q1.query_eq(&longer));
        q1.add_must(term("c", "3"));
        assert!(q1.query_eq(&longer));
        assert_eq!(q1.query_hash(), longer.query_hash());
    }

    #[test]
    fn test_combine_identical_queries() {
        let queries = vec![term("a", "x"), term("a", "x"), term("a", "x")];
        let combined = combine_queries(&queries);
        assert!(combined.query_eq(queries[0].as_ref()));
    }

    #[test]
    fn test_combine_splices_coordless_should_boolean() {
        let mut spliceable = BooleanQuery::new().with_coord_disabled(true);
        spliceable.add_should(term("a", "x"));
        spliceable.add_should(term("a", "x"));
        spliceable.add_should(term("b", "y"));

        let queries: Vec<Box<dyn Query>> = vec![term("a", "x"), Box::new(spliceable)];
        let combined = combine_queries(&queries);
        let bq = combined
            .as_any()
            .downcast_ref::<BooleanQuery>()
            .expect("combined boolean");
        assert_eq!(bq.clauses().len(), 2);
        assert!(bq.clauses()[0].query.query_eq(&TermQuery::new("a", "x")));
        assert!(bq.clauses()[1].query.query_eq(&TermQuery::new("b", "y")));
    }

    #[test]
    fn test_combine_keeps_coord_enabled_boolean_nested() {
        let mut nested = BooleanQuery::new();
        nested.add_should(term("a", "x"));
        nested.add_should(term("b", "y"));
        let nested_box: Box<dyn Query> = Box::new(nested);

        let queries: Vec<Box<dyn Query>> = vec![term("a", "x"), nested_box.clone()];
        let combined = combine_queries(&queries);
        let bq = combined
            .as_any()
            .downcast_ref::<BooleanQuery>()
            .expect("combined boolean");
        assert_eq!(bq.clauses().len(), 2);
        assert!(bq.clauses()[1].query.query_eq(nested_box.as_ref()));
    }

    #[test]
    fn test_single_must_rewrites_to_clause() {
        let searcher = searcher();
        let mut bq = BooleanQuery::new().with_boost(3.0);
        bq.add_must(term("body", "apple"));
        let rewritten = searcher.rewrite(&bq).unwrap();
        let tq = rewritten
            .as_any()
            .downcast_ref::<TermQuery>()
            .expect("term query");
        assert_eq!(tq.text(), "apple");
        assert_eq!(tq.boost(), 3.0);
    }
}
