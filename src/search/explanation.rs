//! Score explanations.
//!
//! An [`Explanation`] is a tree describing how a hit's score was
//! computed; `Searcher::explain` guarantees the root value equals the
//! score the search produced for that document.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One node of a score explanation tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    /// The value this node contributes.
    pub value: f32,
    /// Human-readable description of the contribution.
    pub description: String,
    /// Sub-contributions.
    pub details: Vec<Explanation>,
}

impl Explanation {
    /// Create a leaf explanation.
    pub fn new<S: Into<String>>(value: f32, description: S) -> Self {
        Explanation {
            value,
            description: description.into(),
            details: Vec::new(),
        }
    }

    /// Add a child node.
    pub fn add_detail(&mut self, detail: Explanation) -> &mut Self {
        self.details.push(detail);
        self
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        writeln!(
            f,
            "{:indent$}{:?} = {}",
            "",
            self.value,
            self.description,
            indent = depth * 2
        )?;
        for detail in &self.details {
            detail.write_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_to_string() {
        let expl = Explanation::new(1.6, "short description");
        assert_eq!(expl.to_string(), "1.6 = short description\n");
    }

    #[test]
    fn test_nested_to_string() {
        let mut expl = Explanation::new(1.6, "short description");
        expl.add_detail(Explanation::new(0.8, "half the score"));
        expl.add_detail(Explanation::new(2.0, "to make the difference"));
        expl.details[1].add_detail(Explanation::new(0.5, "sub-sub"));
        expl.details[1].add_detail(Explanation::new(4.0, "another sub-sub"));
        expl.details[0].add_detail(Explanation::new(0.8, "and sub-sub for 1st sub"));

        assert_eq!(
            expl.to_string(),
            "1.6 = short description\n\
             \x20 0.8 = half the score\n\
             \x20   0.8 = and sub-sub for 1st sub\n\
             \x20 2.0 = to make the difference\n\
             \x20   0.5 = sub-sub\n\
             \x20   4.0 = another sub-sub\n"
        );
    }
}
