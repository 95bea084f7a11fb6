//! Wildcard query: matches terms against a `*`/`?` pattern.
//!
//! `*` matches any run of characters including none, `?` matches
//! exactly one. Rewrite enumerates the term dictionary from the
//! pattern's literal prefix and keeps matching terms; an empty pattern
//! matches nothing.

use std::any::Any;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use ahash::AHasher;

use crate::error::{FerretError, Result};
use crate::index::IndexReader;
use crate::query::prefix::expansion_to_query;
use crate::query::query::{boost_suffix, field_prefix, Query, Weight};
use crate::search::Searcher;

/// Match `text` against a wildcard `pattern`.
///
/// Iterative matcher: on mismatch it backtracks to the most recent `*`,
/// remembering the suffix position it already consumed, so each star is
/// re-expanded at most once per text position.
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    let mut p = 0;
    let mut t = 0;
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((star_p, star_t)) = star {
            p = star_p + 1;
            t = star_t + 1;
            star = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }
    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }
    p == pattern.len()
}

/// A query matching all terms that fit a wildcard pattern.
#[derive(Debug, Clone)]
pub struct WildcardQuery {
    field: String,
    pattern: String,
    boost: f32,
}

impl WildcardQuery {
    /// Create a new wildcard query.
    pub fn new<F, P>(field: F, pattern: P) -> Self
    where
        F: Into<String>,
        P: Into<String>,
    {
        WildcardQuery {
            field: field.into(),
            pattern: pattern.into(),
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

    /// The wildcard pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Literal prefix of the pattern up to the first wildcard.
    fn literal_prefix(&self) -> &str {
        let end = self
            .pattern
            .find(['*', '?'])
            .unwrap_or(self.pattern.len());
        &self.pattern[..end]
    }
}

impl Query for WildcardQuery {
    fn create_weight(&self, _searcher: &dyn Searcher) -> Result<Box<dyn Weight>> {
        Err(FerretError::invalid_state(
            "wildcard query must be rewritten before weighting",
        ))
    }

    fn rewrite(&self, reader: &Arc<dyn IndexReader>) -> Result<Box<dyn Query>> {
        let mut terms = Vec::new();
        if !self.pattern.is_empty() {
            if let Some(mut term_enum) = reader.terms(&self.field)? {
                let prefix = self.literal_prefix();
                let mut more = if prefix.is_empty() {
                    term_enum.next()
                } else {
                    term_enum.skip_to(prefix)
                };
                while more {
                    let text = term_enum.term();
                    if !text.starts_with(prefix) {
                        break;
                    }
                    if wildcard_match(&self.pattern, text) {
                        terms.push(text.to_string());
                    }
                    more = term_enum.next();
                }
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
            "{}{}{}",
            field_prefix(&self.field, default_field),
            self.pattern,
            boost_suffix(self.boost)
        )
    }

    fn query_eq(&self, other: &dyn Query) -> bool {
        other
            .as_any()
            .downcast_ref::<WildcardQuery>()
            .is_some_and(|o| {
                self.field == o.field && self.pattern == o.pattern && self.boost == o.boost
            })
    }

    fn query_hash(&self) -> u64 {
        let mut hasher = AHasher::default();
        "wildcard".hash(&mut hasher);
        self.field.hash(&mut hasher);
        self.pattern.hash(&mut hasher);
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
