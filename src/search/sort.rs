//! Sort specifications for ranked searches.
//!
//! A [`Sort`] replaces pure score ranking with a comparator chain over
//! per-document field values read from the reader's stored fields.
//! Score-descending / doc-ascending tiebreaks always apply last.

use std::cmp::Ordering;

use crate::search::top_docs::Hit;

/// One criterion in a sort chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortField {
    /// Relevance score, descending.
    Score,
    /// Document id, ascending.
    Doc,
    /// A stored field's first value, compared as text.
    Field {
        /// The stored field to read.
        name: String,
        /// Descending instead of ascending.
        reverse: bool,
    },
}

impl SortField {
    /// Ascending sort on a stored field.
    pub fn field<S: Into<String>>(name: S) -> Self {
        SortField::Field {
            name: name.into(),
            reverse: false,
        }
    }

    /// Descending sort on a stored field.
    pub fn field_desc<S: Into<String>>(name: S) -> Self {
        SortField::Field {
            name: name.into(),
            reverse: true,
        }
    }
}

/// An ordered chain of sort criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// The criteria, most significant first.
    pub fields: Vec<SortField>,
}

impl Sort {
    /// Sort by the given criteria.
    pub fn new(fields: Vec<SortField>) -> Self {
        Sort { fields }
    }

    /// Sort by one stored field ascending.
    pub fn by_field<S: Into<String>>(name: S) -> Self {
        Sort::new(vec![SortField::field(name)])
    }

    /// Relevance order (the default ranking made explicit).
    pub fn by_score() -> Self {
        Sort::new(vec![SortField::Score])
    }

    /// Names of the stored fields this sort reads, in criterion order.
    pub(crate) fn stored_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter_map(|f| match f {
                SortField::Field { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Compare two hits decorated with their stored sort keys (one entry
    /// per `Field` criterion, in order).
    pub(crate) fn compare(
        &self,
        a: &Hit,
        a_keys: &[Option<String>],
        b: &Hit,
        b_keys: &[Option<String>],
    ) -> Ordering {
        let mut key_idx = 0;
        for field in &self.fields {
            let ordering = match field {
                SortField::Score => b
                    .score
                    .partial_cmp(&a.score)
                    .unwrap_or(Ordering::Equal),
                SortField::Doc => a.doc.cmp(&b.doc),
                SortField::Field { reverse, .. } => {
                    let ordering = a_keys[key_idx].cmp(&b_keys[key_idx]);
                    key_idx += 1;
                    if *reverse {
                        ordering.reverse()
                    } else {
                        ordering
                    }
                }
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.doc.cmp(&b.doc))
    }
}
