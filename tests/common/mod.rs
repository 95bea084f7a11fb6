#![allow(dead_code)]

//! Shared fixture for the end-to-end search tests.
//!
//! Eighteen documents over four fields, each document boosted by its
//! ordinal plus one. The analyzer doubles every lowercase-leading token
//! with an uppercased copy one position later, so phrase tests can
//! exercise same-position constraints and position increments.

use std::sync::Arc;

use ferret::analysis::{Analyzer, Token};
use ferret::document::Document;
use ferret::index::{DocId, MemoryIndex};
use ferret::query::Query;
use ferret::search::{SearchRequest, Searcher};

pub const FIELD: &str = "field";
pub const DATE: &str = "date";
pub const CAT: &str = "cat";
pub const NUMBER: &str = "number";

pub const TEST_DATA: [(&str, &str, &str, &str); 18] = [
    ("20050930", "word1", "cat1/", ".123"),
    ("20051001", "word1 word2 the quick brown fox", "cat1/sub1", "0.954"),
    ("20051002", "word1 word3", "cat1/sub1/subsub1", "908.123434"),
    ("20051003", "word1 word3", "cat1/sub2", "3999"),
    ("20051004", "word1 word2", "cat1/sub2/subsub2", "+.3413"),
    ("20051005", "word1", "cat2/sub1", "-1.1298"),
    ("20051006", "word1 word3", "cat2/sub1", "2"),
    ("20051007", "word1", "cat2/sub1", "+8.894"),
    (
        "20051008",
        "word1 word2 word3 the fast brown fox",
        "cat2/sub1",
        "+84783.13747",
    ),
    ("20051009", "word1", "cat3/sub1", "10.0"),
    ("20051010", "word1", "cat3/sub1", "1"),
    (
        "20051011",
        "word1 word3 the quick red fox",
        "cat3/sub1",
        "-12518419",
    ),
    ("20051012", "word1", "cat3/sub1", "10"),
    ("20051013", "word1", "cat1/sub2", "15682954"),
    (
        "20051014",
        "word1 word3 the quick hairy fox",
        "cat1/sub1",
        "98132",
    ),
    ("20051015", "word1", "cat1/sub2/subsub1", "-.89321"),
    (
        "20051016",
        "word1 the quick fox is brown and hairy and a little red",
        "cat1/sub1/subsub2",
        "-89",
    ),
    (
        "20051017",
        "word1 the brown fox is quick and red",
        "cat1/",
        "-1.0",
    ),
];

/// Whitespace tokenizer that emits an uppercased twin one position
/// after every lowercase-leading token.
#[derive(Debug, Default)]
pub struct UpcaseDoublingAnalyzer;

impl Analyzer for UpcaseDoublingAnalyzer {
    fn analyze(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        for (i, word) in text.split_whitespace().enumerate() {
            if word.chars().next().is_some_and(|c| c.is_ascii_lowercase()) {
                tokens.push(Token::with_pos_inc(word, 0));
                tokens.push(Token::with_pos_inc(word.to_uppercase(), 1));
            } else {
                tokens.push(Token::with_pos_inc(word, if i == 0 { 0 } else { 1 }));
            }
        }
        tokens
    }
}

/// Build an index over `rows`, boosting document `i` by `i + boost_base`.
pub fn build_index(rows: &[(&str, &str, &str, &str)], boost_base: f32) -> MemoryIndex {
    let index = MemoryIndex::new(Arc::new(UpcaseDoublingAnalyzer));
    for (i, (date, field, cat, number)) in rows.iter().enumerate() {
        let doc = Document::new()
            .with_boost(i as f32 + boost_base)
            .add(DATE, *date)
            .add(FIELD, *field)
            .add(CAT, *cat)
            .add(NUMBER, *number);
        index.add_document(doc).expect("add fixture doc");
    }
    index
}

/// The standard 18-document index.
pub fn build_full_index() -> MemoryIndex {
    build_index(&TEST_DATA, 1.0)
}

/// Assert the query's rendered form against the given default field.
pub fn check_to_s(query: &dyn Query, default_field: &str, expected: &str) {
    assert_eq!(
        query.to_query_string(default_field),
        expected,
        "query string mismatch"
    );
}

/// Run `query` and verify the result set, ranking invariants,
/// explanations, and unscored iteration against `expected`.
///
/// `top` pins the best-ranked document when the ordering matters.
pub fn check_hits(
    searcher: &dyn Searcher,
    query: &dyn Query,
    expected: &[DocId],
    top: Option<DocId>,
) {
    let request = SearchRequest::top(expected.len() + 1);
    let top_docs = searcher.search(query, &request).expect("search");

    let mut seen: Vec<DocId> = top_docs.hits.iter().map(|h| h.doc).collect();
    assert_eq!(
        top_docs.total_hits,
        expected.len() as u64,
        "total_hits mismatch: expected {expected:?}, saw {seen:?}"
    );
    assert_eq!(top_docs.hits.len(), expected.len(), "hit count mismatch");

    if let (Some(top), false) = (top, top_docs.hits.is_empty()) {
        assert_eq!(top_docs.hits[0].doc, top, "top doc mismatch");
    }

    for hit in &top_docs.hits {
        let normalized = hit.score / top_docs.max_score;
        assert!(
            normalized > 0.0 && normalized <= 1.0,
            "normalized score {normalized} out of (0, 1] for doc {}",
            hit.doc
        );
        assert!(
            expected.contains(&hit.doc),
            "doc {} was found unexpectedly",
            hit.doc
        );

        let explanation = searcher.explain(query, hit.doc).expect("explain");
        let tolerance = hit.score.abs() * 1e-4 + 1e-6;
        assert!(
            (explanation.value - hit.score).abs() <= tolerance,
            "explanation for doc {} gave {} but score was {}\n{}",
            hit.doc,
            explanation.value,
            hit.score,
            explanation
        );
    }

    let mut sorted = expected.to_vec();
    sorted.sort_unstable();
    let mut buf = [0u32; 40];
    let count = searcher
        .search_unscored(query, &mut buf, 0)
        .expect("search_unscored");
    assert_eq!(&buf[..count], &sorted[..], "unscored docs mismatch");

    seen.sort_unstable();
    assert_eq!(seen, sorted, "ranked doc set mismatch");

    if count > 3 {
        let resumed = searcher
            .search_unscored(query, &mut buf, sorted[3])
            .expect("search_unscored resume");
        assert_eq!(&buf[..resumed], &sorted[3..], "resumed unscored mismatch");
    }
}
