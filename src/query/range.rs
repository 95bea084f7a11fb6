//! Range queries over a field's term dictionary.
//!
//! [`RangeQuery`] compares terms lexicographically; [`TypedRangeQuery`]
//! compares numerically when its bounds parse as numbers (decimal
//! forms, or `0x`-prefixed hex integers) and silently behaves as a
//! lexicographic range otherwise. Both are rewrite-only: against a
//! reader they expand to the matching terms.

use std::any::Any;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use ahash::AHasher;

use crate::error::{FerretError, Result};
use crate::index::reader::TermEnum;
use crate::index::IndexReader;
use crate::query::prefix::expansion_to_query;
use crate::query::query::{boost_suffix, field_prefix, Query, Weight};
use crate::search::Searcher;

/// Inclusive/exclusive bounds of a range, either side optional.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RangeBounds {
    /// Lower bound term, `None` for open.
    pub lower: Option<String>,
    /// Upper bound term, `None` for open.
    pub upper: Option<String>,
    /// Whether the lower bound itself is included.
    pub include_lower: bool,
    /// Whether the upper bound itself is included.
    pub include_upper: bool,
}

impl RangeBounds {
    fn to_range_string(&self) -> String {
        format!(
            "{}{}..{}{}",
            if self.include_lower { '[' } else { '{' },
            self.lower.as_deref().unwrap_or("*"),
            self.upper.as_deref().unwrap_or("*"),
            if self.include_upper { ']' } else { '}' },
        )
    }
}

/// Collect the field's terms falling inside `bounds`, lexicographically.
fn enumerate_lexical(term_enum: &mut dyn TermEnum, bounds: &RangeBounds) -> Vec<String> {
    let mut terms = Vec::new();
    let mut more = match bounds.lower.as_deref() {
        Some(lower) => term_enum.skip_to(lower),
        None => term_enum.next(),
    };
    while more {
        let text = term_enum.term();
        if let Some(lower) = bounds.lower.as_deref() {
            if !bounds.include_lower && text == lower {
                more = term_enum.next();
                continue;
            }
        }
        if let Some(upper) = bounds.upper.as_deref() {
            if text > upper || (!bounds.include_upper && text == upper) {
                break;
            }
        }
        terms.push(text.to_string());
        more = term_enum.next();
    }
    terms
}

/// Parse a term as a number: optional sign, then decimal (`.5`, `8.9`,
/// `3999`) or a `0x` hex integer.
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    let (sign, rest) = match text.as_bytes().first() {
        Some(b'+') => (1.0, &text[1..]),
        Some(b'-') => (-1.0, &text[1..]),
        _ => (1.0, text),
    };
    if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok().map(|v| sign * v as f64);
    }
    rest.parse::<f64>().ok().map(|v| sign * v).filter(|v| v.is_finite())
}

/// A lexicographic range query.
#[derive(Debug, Clone)]
pub struct RangeQuery {
    field: String,
    bounds: RangeBounds,
    boost: f32,
}

impl RangeQuery {
    /// Range with both bounds given.
    pub fn new<F: Into<String>>(
        field: F,
        lower: Option<&str>,
        upper: Option<&str>,
        include_lower: bool,
        include_upper: bool,
    ) -> Self {
        RangeQuery {
            field: field.into(),
            bounds: RangeBounds {
                lower: lower.map(str::to_string),
                upper: upper.map(str::to_string),
                include_lower,
                include_upper,
            },
            boost: 1.0,
        }
    }

    /// All terms below `upper`.
    pub fn less_than<F: Into<String>>(field: F, upper: &str, include_upper: bool) -> Self {
        Self::new(field, None, Some(upper), false, include_upper)
    }

    /// All terms above `lower`.
    pub fn greater_than<F: Into<String>>(field: F, lower: &str, include_lower: bool) -> Self {
        Self::new(field, Some(lower), None, include_lower, false)
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

    /// The range bounds.
    pub fn bounds(&self) -> &RangeBounds {
        &self.bounds
    }
}

impl Query for RangeQuery {
    fn create_weight(&self, _searcher: &dyn Searcher) -> Result<Box<dyn Weight>> {
        Err(FerretError::invalid_state(
            "range query must be rewritten before weighting",
        ))
    }

    fn rewrite(&self, reader: &Arc<dyn IndexReader>) -> Result<Box<dyn Query>> {
        let terms = match reader.terms(&self.field)? {
            Some(mut term_enum) => enumerate_lexical(term_enum.as_mut(), &self.bounds),
            None => Vec::new(),
        };
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
            self.bounds.to_range_string(),
            boost_suffix(self.boost)
        )
    }

    fn query_eq(&self, other: &dyn Query) -> bool {
        other
            .as_any()
            .downcast_ref::<RangeQuery>()
            .is_some_and(|o| {
                self.field == o.field && self.bounds == o.bounds && self.boost == o.boost
            })
    }

    fn query_hash(&self) -> u64 {
        let mut hasher = AHasher::default();
        "range".hash(&mut hasher);
        self.field.hash(&mut hasher);
        self.bounds.hash(&mut hasher);
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

/// A range query that compares numerically when its bounds allow it.
#[derive(Debug, Clone)]
pub struct TypedRangeQuery {
    field: String,
    bounds: RangeBounds,
    boost: f32,
}

impl TypedRangeQuery {
    /// Range with both bounds given.
    pub fn new<F: Into<String>>(
        field: F,
        lower: Option<&str>,
        upper: Option<&str>,
        include_lower: bool,
        include_upper: bool,
    ) -> Self {
        TypedRangeQuery {
            field: field.into(),
            bounds: RangeBounds {
                lower: lower.map(str::to_string),
                upper: upper.map(str::to_string),
                include_lower,
                include_upper,
            },
            boost: 1.0,
        }
    }

    /// Set the boost factor.
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    /// Numeric bounds, if every supplied bound parses.
    fn numeric_bounds(&self) -> Option<(Option<f64>, Option<f64>)> {
        let lower = match self.bounds.lower.as_deref() {
            Some(text) => Some(parse_number(text)?),
            None => None,
        };
        let upper = match self.bounds.upper.as_deref() {
            Some(text) => Some(parse_number(text)?),
            None => None,
        };
        Some((lower, upper))
    }
}

impl Query for TypedRangeQuery {
    fn create_weight(&self, _searcher: &dyn Searcher) -> Result<Box<dyn Weight>> {
        Err(FerretError::invalid_state(
            "range query must be rewritten before weighting",
        ))
    }

    fn rewrite(&self, reader: &Arc<dyn IndexReader>) -> Result<Box<dyn Query>> {
        let (lower, upper) = match self.numeric_bounds() {
            Some(bounds) => bounds,
            None => {
                // Unparseable bound: plain lexicographic range.
                let terms = match reader.terms(&self.field)? {
                    Some(mut term_enum) => enumerate_lexical(term_enum.as_mut(), &self.bounds),
                    None => Vec::new(),
                };
                return Ok(expansion_to_query(&self.field, terms, self.boost));
            }
        };

        let mut terms = Vec::new();
        if let Some(mut term_enum) = reader.terms(&self.field)? {
            let mut more = term_enum.next();
            while more {
                let text = term_enum.term();
                if let Some(value) = parse_number(text) {
                    let above = match lower {
                        Some(lo) => value > lo || (self.bounds.include_lower && value == lo),
                        None => true,
                    };
                    let below = match upper {
                        Some(hi) => value < hi || (self.bounds.include_upper && value == hi),
                        None => true,
                    };
                    if above && below {
                        terms.push(text.to_string());
                    }
                }
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
            "{}#{}{}",
            field_prefix(&self.field, default_field),
            self.bounds.to_range_string(),
            boost_suffix(self.boost)
        )
    }

    fn query_eq(&self, other: &dyn Query) -> bool {
        other
            .as_any()
            .downcast_ref::<TypedRangeQuery>()
            .is_some_and(|o| {
                self.field == o.field && self.bounds == o.bounds && self.boost == o.boost
            })
    }

    fn query_hash(&self) -> u64 {
        let mut hasher = AHasher::default();
        "typed_range".hash(&mut hasher);
        self.field.hash(&mut hasher);
        self.bounds.hash(&mut hasher);
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
