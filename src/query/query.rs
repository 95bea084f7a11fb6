//! Base query and weight traits.
//!
//! A [`Query`] is an immutable description of what to match. Searching
//! turns it into a [`Weight`] (per query, per searcher — this is where
//! corpus-wide statistics like idf are captured), and the weight
//! produces one scorer per reader. Queries compare by value:
//! `query_eq` / `query_hash` see through the trait object, and two
//! queries differing only in boost are not equal.

use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

use crate::error::Result;
use crate::index::{DocId, IndexReader};
use crate::query::scorer::Scorer;
use crate::search::explanation::Explanation;
use crate::search::Searcher;

/// Trait for search queries.
pub trait Query: Send + Sync + Debug {
    /// Create the per-searcher weight for this query.
    fn create_weight(&self, searcher: &dyn Searcher) -> Result<Box<dyn Weight>>;

    /// Rewrite this query against a reader into a more primitive form.
    ///
    /// Rewriting reaches a fixed point: rewriting the result again
    /// yields an equal query.
    fn rewrite(&self, reader: &Arc<dyn IndexReader>) -> Result<Box<dyn Query>> {
        let _ = reader;
        Ok(self.clone_box())
    }

    /// Get the boost factor for this query.
    fn boost(&self) -> f32;

    /// Set the boost factor for this query.
    fn set_boost(&mut self, boost: f32);

    /// Render this query in query-string form. `default_field` is
    /// omitted from term references that match it.
    fn to_query_string(&self, default_field: &str) -> String;

    /// Value equality through the trait object.
    fn query_eq(&self, other: &dyn Query) -> bool;

    /// Hash consistent with [`query_eq`].
    ///
    /// [`query_eq`]: Query::query_eq
    fn query_hash(&self) -> u64;

    /// Clone this query.
    fn clone_box(&self) -> Box<dyn Query>;

    /// Get this query as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl Clone for Box<dyn Query> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Per-(query, searcher) scoring state.
///
/// Lifecycle: `sum_of_squared_weights` is called once so the searcher
/// can derive the cosine query norm, `normalize` applies it, and only
/// then are scorers created. A weight may produce scorers for several
/// readers (the multi-searcher does exactly that).
pub trait Weight: Send + Sync + Debug {
    /// The query-side score factor after normalization.
    fn value(&self) -> f32;

    /// Contribution to the squared query vector length.
    fn sum_of_squared_weights(&mut self) -> f32;

    /// Apply the cosine query norm.
    fn normalize(&mut self, norm: f32);

    /// Create a scorer over `reader`, or `None` when this query cannot
    /// match any of its documents.
    fn scorer(&self, reader: &Arc<dyn IndexReader>) -> Result<Option<Box<dyn Scorer>>>;

    /// Explain the score of `doc`; the root value equals the score the
    /// scorer produces for a matching doc, and 0 otherwise.
    fn explain(&self, reader: &Arc<dyn IndexReader>, doc: DocId) -> Result<Explanation>;
}

/// `^boost` suffix for query strings; empty at the default boost.
pub(crate) fn boost_suffix(boost: f32) -> String {
    if boost == 1.0 {
        String::new()
    } else {
        format!("^{boost:?}")
    }
}

/// `field:` prefix unless `field` is the default field.
pub(crate) fn field_prefix(field: &str, default_field: &str) -> String {
    if field == default_field {
        String::new()
    } else {
        format!("{field}:")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boost_suffix() {
        assert_eq!(boost_suffix(1.0), "");
        assert_eq!(boost_suffix(100.0), "^100.0");
        assert_eq!(boost_suffix(0.6), "^0.6");
    }

    #[test]
    fn test_field_prefix() {
        assert_eq!(field_prefix("field", "field"), "");
        assert_eq!(field_prefix("cat", "field"), "cat:");
        assert_eq!(field_prefix("cat", ""), "cat:");
    }
}
