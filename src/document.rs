//! Stored document model.
//!
//! A [`Document`] is what `IndexReader::get_doc` hands back: the stored
//! field values of one indexed document. Fields keep insertion order and
//! may carry multiple values.

use serde::{Deserialize, Serialize};

/// A stored field: a name, its values, and an index-time boost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocField {
    /// The field name.
    pub name: String,
    /// The stored values, in the order they were added.
    pub values: Vec<String>,
    /// Index-time boost folded into this field's norm.
    pub boost: f32,
}

impl DocField {
    /// Create a field with a single value.
    pub fn new<N, V>(name: N, value: V) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        DocField {
            name: name.into(),
            values: vec![value.into()],
            boost: 1.0,
        }
    }

    /// Set the field boost.
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    /// Add another value to this field.
    pub fn add_value<V: Into<String>>(&mut self, value: V) {
        self.values.push(value.into());
    }
}

/// A document: an ordered collection of stored fields plus a boost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// The stored fields.
    pub fields: Vec<DocField>,
    /// Document boost folded into every field norm.
    pub boost: f32,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Document {
            fields: Vec::new(),
            boost: 1.0,
        }
    }

    /// Set the document boost.
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    /// Append a field.
    pub fn add_field(&mut self, field: DocField) -> &mut Self {
        self.fields.push(field);
        self
    }

    /// Append a single-valued field.
    pub fn add<N, V>(mut self, name: N, value: V) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        self.fields.push(DocField::new(name, value));
        self
    }

    /// Get the first field with the given name.
    pub fn get(&self, name: &str) -> Option<&DocField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Get the first stored value of the given field.
    pub fn get_value(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(|f| f.values.first())
            .map(|s| s.as_str())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_fields() {
        let doc = Document::new()
            .add("title", "hello")
            .add("body", "hello world");

        assert_eq!(doc.get_value("title"), Some("hello"));
        assert_eq!(doc.get_value("body"), Some("hello world"));
        assert_eq!(doc.get_value("missing"), None);
        assert_eq!(doc.boost, 1.0);
    }

    #[test]
    fn test_multi_value_field() {
        let mut doc = Document::new();
        let mut field = DocField::new("tag", "a");
        field.add_value("b");
        doc.add_field(field);

        assert_eq!(doc.get("tag").unwrap().values, vec!["a", "b"]);
    }

    #[test]
    fn test_document_boost() {
        let doc = Document::new().with_boost(3.0);
        assert_eq!(doc.boost, 3.0);
    }
}
