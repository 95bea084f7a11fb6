//! Scorer protocol and shared scorer building blocks.
//!
//! A scorer is a finite cursor yielding `(doc, score)` pairs in
//! strictly increasing doc order. Iteration uses the explicit
//! `next`/`skip_to`/`doc`/`score` shape because conjunctive lock-step
//! advancing needs `skip_to` semantics; `skip_to` never moves a cursor
//! backwards, and calling either advance on a fresh scorer is valid.

use std::sync::Arc;

use crate::error::Result;
use crate::index::{DocId, IndexReader, NO_MORE_DOCS};
use crate::util::PriorityQueue;

/// Cursor over scored matching documents.
pub trait Scorer: Send {
    /// Advance to the next matching document.
    fn next(&mut self) -> Result<bool>;

    /// Advance to the first matching document >= `target`.
    fn skip_to(&mut self, target: DocId) -> Result<bool>;

    /// Current document, or [`NO_MORE_DOCS`] when exhausted.
    fn doc(&self) -> DocId;

    /// Score of the current document. Undefined before the first
    /// successful advance.
    fn score(&mut self) -> Result<f32>;
}

/// A scorer that matches nothing.
#[derive(Debug, Default)]
pub struct EmptyScorer;

impl Scorer for EmptyScorer {
    fn next(&mut self) -> Result<bool> {
        Ok(false)
    }

    fn skip_to(&mut self, _target: DocId) -> Result<bool> {
        Ok(false)
    }

    fn doc(&self) -> DocId {
        NO_MORE_DOCS
    }

    fn score(&mut self) -> Result<f32> {
        Ok(0.0)
    }
}

/// A scorer over every live document of a reader, at a constant score.
pub struct AllScorer {
    reader: Arc<dyn IndexReader>,
    max_doc: DocId,
    doc: DocId,
    started: bool,
    score_value: f32,
}

impl AllScorer {
    /// Iterate all live docs of `reader`, scoring each `score_value`.
    pub fn new(reader: Arc<dyn IndexReader>, score_value: f32) -> Self {
        let max_doc = reader.max_doc();
        AllScorer {
            reader,
            max_doc,
            doc: 0,
            started: false,
            score_value,
        }
    }

    fn settle(&mut self) -> bool {
        while self.doc < self.max_doc {
            if !self.reader.is_deleted(self.doc) {
                return true;
            }
            self.doc += 1;
        }
        self.doc = NO_MORE_DOCS;
        false
    }
}

impl Scorer for AllScorer {
    fn next(&mut self) -> Result<bool> {
        if self.started {
            if self.doc >= self.max_doc {
                return Ok(false);
            }
            self.doc += 1;
        }
        self.started = true;
        Ok(self.settle())
    }

    fn skip_to(&mut self, target: DocId) -> Result<bool> {
        self.started = true;
        if target > self.doc {
            self.doc = target;
        }
        Ok(self.settle())
    }

    fn doc(&self) -> DocId {
        self.doc
    }

    fn score(&mut self) -> Result<f32> {
        Ok(self.score_value)
    }
}

type ScorerLessThan = fn(&Box<dyn Scorer>, &Box<dyn Scorer>) -> bool;

fn by_doc(a: &Box<dyn Scorer>, b: &Box<dyn Scorer>) -> bool {
    a.doc() < b.doc()
}

/// Disjunctive union of scorers: yields every doc matched by at least
/// one sub-scorer, scoring the sum of the matching sub-scores.
///
/// Sub-scorers live in a priority queue keyed by current doc; advancing
/// pops the tied heads, accumulates their scores, and re-heaps. The
/// matcher count feeds the boolean coord factor.
pub struct DisjunctionSumScorer {
    queue: PriorityQueue<Box<dyn Scorer>, ScorerLessThan>,
    pending: Vec<Box<dyn Scorer>>,
    current_doc: DocId,
    current_score: f32,
    nr_matchers: usize,
}

impl DisjunctionSumScorer {
    /// Combine `scorers` disjunctively.
    pub fn new(scorers: Vec<Box<dyn Scorer>>) -> Self {
        let capacity = scorers.len();
        DisjunctionSumScorer {
            queue: PriorityQueue::new(capacity, by_doc),
            pending: scorers,
            current_doc: NO_MORE_DOCS,
            current_score: 0.0,
            nr_matchers: 0,
        }
    }

    /// Number of sub-scorers matching the current doc.
    pub fn nr_matchers(&self) -> usize {
        self.nr_matchers
    }

    fn initialized(&self) -> bool {
        self.pending.is_empty()
    }

    fn init(&mut self) -> Result<()> {
        for mut scorer in std::mem::take(&mut self.pending) {
            if scorer.next()? {
                self.queue.push(scorer);
            }
        }
        Ok(())
    }

    /// Set the current doc from the queue head, accumulate every tied
    /// sub-score, and advance all tied sub-scorers past it.
    fn advance_after_current(&mut self) -> Result<bool> {
        let top = match self.queue.top_mut() {
            Some(top) => top,
            None => {
                self.current_doc = NO_MORE_DOCS;
                return Ok(false);
            }
        };
        self.current_doc = top.doc();
        self.current_score = top.score()?;
        self.nr_matchers = 1;
        loop {
            let top = self.queue.top_mut().expect("queue head vanished");
            if top.next()? {
                self.queue.adjust_top();
            } else {
                self.queue.pop();
            }
            match self.queue.top() {
                Some(top) if top.doc() == self.current_doc => {}
                _ => break,
            }
            let top = self.queue.top_mut().expect("queue head vanished");
            self.current_score += top.score()?;
            self.nr_matchers += 1;
        }
        Ok(true)
    }
}

impl Scorer for DisjunctionSumScorer {
    fn next(&mut self) -> Result<bool> {
        if !self.initialized() {
            self.init()?;
        }
        self.advance_after_current()
    }

    fn skip_to(&mut self, target: DocId) -> Result<bool> {
        if !self.initialized() {
            self.init()?;
            if !self.advance_after_current()? {
                return Ok(false);
            }
        }
        if self.current_doc >= target && self.current_doc != NO_MORE_DOCS {
            return Ok(true);
        }
        loop {
            let top_doc = match self.queue.top() {
                Some(top) => top.doc(),
                None => {
                    self.current_doc = NO_MORE_DOCS;
                    return Ok(false);
                }
            };
            if top_doc >= target {
                return self.advance_after_current();
            }
            let top = self.queue.top_mut().expect("queue head vanished");
            if top.skip_to(target)? {
                self.queue.adjust_top();
            } else {
                self.queue.pop();
            }
        }
    }

    fn doc(&self) -> DocId {
        self.current_doc
    }

    fn score(&mut self) -> Result<f32> {
        Ok(self.current_score)
    }
}
