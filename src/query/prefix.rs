//! Prefix query: matches every term starting with a prefix.
//!
//! Pure rewrite query — against a reader it expands into the matching
//! terms of the field's dictionary (empty boolean / term / multi-term
//! depending on how many matched) and never scores directly.

use std::any::Any;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use ahash::AHasher;

use crate::error::{FerretError, Result};
use crate::index::IndexReader;
use crate::query::boolean::BooleanQuery;
use crate::query::multi_term::MultiTermQuery;
use crate::query::query::{boost_suffix, field_prefix, Query, Weight};
use crate::query::term::TermQuery;
use crate::search::Searcher;

/// A query matching all terms with a common prefix.
#[derive(Debug, Clone)]
pub struct PrefixQuery {
    field: String,
    prefix: String,
    boost: f32,
}

impl PrefixQuery {
    /// Create a new prefix query.
    pub fn new<F, P>(field: F, prefix: P) -> Self
    where
        F: Into<String>,
        P: Into<String>,
    {
        PrefixQuery {
            field: field.into(),
            prefix: prefix.into(),
            boost: 1.0,
        }
    }

    /// Set the boost factor.
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    /// The field searched.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

/// Fold a list of expanded terms into the canonical rewritten query:
/// nothing → empty boolean, one term → term query, otherwise a
/// multi-term query. Shared by the prefix / wildcard / range rewrites.
pub(crate) fn expansion_to_query(field: &str, terms: Vec<String>, boost: f32) -> Box<dyn Query> {
    match terms.len() {
        0 => Box::new(BooleanQuery::new().with_boost(boost)),
        1 => Box::new(TermQuery::new(field, terms.into_iter().next().expect("one term")).with_boost(boost)),
        _ => {
            let mut multi = MultiTermQuery::new(field).with_boost(boost);
            for term in terms {
                multi.add_term(term);
            }
            Box::new(multi)
        }
    }
}

impl Query for PrefixQuery {
    fn create_weight(&self, _searcher: &dyn Searcher) -> Result<Box<dyn Weight>> {
        Err(FerretError::invalid_state(
            "prefix query must be rewritten before weighting",
        ))
    }

    fn rewrite(&self, reader: &Arc<dyn IndexReader>) -> Result<Box<dyn Query>> {
        let mut terms = Vec::new();
        if let Some(mut term_enum) = reader.terms(&self.field)? {
            let mut more = term_enum.skip_to(&self.prefix);
            while more {
                let text = term_enum.term();
                if !text.starts_with(&self.prefix) {
                    break;
                }
                terms.push(text.to_string());
                more = term_enum.next();
            }
        }
        Ok(expansion_to_query(&self.field, terms, self.boost))
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn set_boost(&mut self, boost: f32) {
        self.boost = boost;
    }

    fn to_query_string(&self, default_field: &str) -> String {
        format!(
            "{}{}*{}",
            field_prefix(&self.field, default_field),
            self.prefix,
            boost_suffix(self.boost)
        )
    }

    fn query_eq(&self, other: &dyn Query) -> bool {
        other
            .as_any()
            .downcast_ref::<PrefixQuery>()
            .is_some_and(|o| {
                self.field == o.field && self.prefix == o.prefix && self.boost == o.boost
            })
    }

    fn query_hash(&self) -> u64 {
        let mut hasher = AHasher::default();
        "prefix".hash(&mut hasher);
        self.field.hash(&mut hasher);
        self.prefix.hash(&mut hasher);
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
