//! Minimal analysis surface for feeding the in-memory index.
//!
//! The full analyzer chain (stemming, stop words, language handling) is
//! not part of this crate; indexing only needs a way to turn field text
//! into a stream of positioned tokens. Positions accumulate by
//! `pos_inc`, so a filter can stack synonyms on one position by emitting
//! them with `pos_inc = 0`.

use std::fmt::Debug;

/// A single token produced by analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The term text.
    pub text: String,
    /// Position increment relative to the previous token.
    pub pos_inc: u32,
}

impl Token {
    /// Create a token with the default position increment of 1.
    pub fn new<S: Into<String>>(text: S) -> Self {
        Token {
            text: text.into(),
            pos_inc: 1,
        }
    }

    /// Create a token with an explicit position increment.
    pub fn with_pos_inc<S: Into<String>>(text: S, pos_inc: u32) -> Self {
        Token {
            text: text.into(),
            pos_inc,
        }
    }
}

/// Turns field text into a token stream.
pub trait Analyzer: Send + Sync + Debug {
    /// Tokenize `text`.
    fn analyze(&self, text: &str) -> Vec<Token>;
}

/// Splits on whitespace, keeps token text verbatim.
#[derive(Debug, Clone, Default)]
pub struct WhitespaceAnalyzer;

impl Analyzer for WhitespaceAnalyzer {
    fn analyze(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        for (i, word) in text.split_whitespace().enumerate() {
            tokens.push(Token::with_pos_inc(word, if i == 0 { 0 } else { 1 }));
        }
        tokens
    }
}

/// Splits on whitespace and lowercases.
#[derive(Debug, Clone, Default)]
pub struct LowercaseAnalyzer;

impl Analyzer for LowercaseAnalyzer {
    fn analyze(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        for (i, word) in text.split_whitespace().enumerate() {
            tokens.push(Token::with_pos_inc(
                word.to_lowercase(),
                if i == 0 { 0 } else { 1 },
            ));
        }
        tokens
    }
}
