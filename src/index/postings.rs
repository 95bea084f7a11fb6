//! Posting-list cursors.
//!
//! A [`Postings`] is a forward-only cursor over one term's
//! `(doc, freq, positions)` entries, with the `skip_to` contract that
//! conjunctive lock-step advancing needs. Cursors start positioned
//! before the first document; `next`/`skip_to` return whether a current
//! document exists.

use crate::error::Result;
use crate::index::{DocId, NO_MORE_DOCS};

/// Cursor over one posting list.
pub trait Postings: Send {
    /// Advance to the next document.
    fn next(&mut self) -> Result<bool>;

    /// Advance to the first document >= `target`.
    fn skip_to(&mut self, target: DocId) -> Result<bool>;

    /// Current document, or [`NO_MORE_DOCS`] when exhausted.
    fn doc(&self) -> DocId;

    /// Within-document frequency of the term.
    fn freq(&self) -> u32;

    /// Next position of the term within the current document, ascending.
    fn next_position(&mut self) -> Result<Option<u32>>;
}

/// Union of several posting cursors presented as one stream.
///
/// Documents are the union of the sub-cursors' documents; positions
/// within a document merge all matching sub-cursors' positions into one
/// ascending stream. This is how a phrase slot with alternative terms
/// becomes a single position source.
pub struct UnionPostings {
    subs: Vec<Box<dyn Postings>>,
    alive: Vec<bool>,
    started: bool,
    doc: DocId,
    positions: Vec<u32>,
    pos_idx: usize,
}

impl UnionPostings {
    /// Merge `subs` into one cursor. At least one sub is required.
    pub fn new(subs: Vec<Box<dyn Postings>>) -> Self {
        let alive = vec![true; subs.len()];
        UnionPostings {
            subs,
            alive,
            started: false,
            doc: NO_MORE_DOCS,
            positions: Vec::new(),
            pos_idx: 0,
        }
    }

    fn start(&mut self) -> Result<()> {
        for (i, sub) in self.subs.iter_mut().enumerate() {
            self.alive[i] = sub.next()?;
        }
        self.started = true;
        Ok(())
    }

    fn settle(&mut self) -> Result<bool> {
        self.doc = NO_MORE_DOCS;
        for (i, sub) in self.subs.iter().enumerate() {
            if self.alive[i] && sub.doc() < self.doc {
                self.doc = sub.doc();
            }
        }
        if self.doc == NO_MORE_DOCS {
            return Ok(false);
        }
        self.load_positions()?;
        Ok(true)
    }

    fn load_positions(&mut self) -> Result<()> {
        self.positions.clear();
        self.pos_idx = 0;
        for (i, sub) in self.subs.iter_mut().enumerate() {
            if self.alive[i] && sub.doc() == self.doc {
                while let Some(pos) = sub.next_position()? {
                    self.positions.push(pos);
                }
            }
        }
        self.positions.sort_unstable();
        Ok(())
    }
}

impl Postings for UnionPostings {
    fn next(&mut self) -> Result<bool> {
        if !self.started {
            self.start()?;
        } else {
            let current = self.doc;
            for (i, sub) in self.subs.iter_mut().enumerate() {
                if self.alive[i] && sub.doc() == current {
                    self.alive[i] = sub.next()?;
                }
            }
        }
        self.settle()
    }

    fn skip_to(&mut self, target: DocId) -> Result<bool> {
        if !self.started {
            self.start()?;
        }
        for (i, sub) in self.subs.iter_mut().enumerate() {
            if self.alive[i] && sub.doc() < target {
                self.alive[i] = sub.skip_to(target)?;
            }
        }
        self.settle()
    }

    fn doc(&self) -> DocId {
        self.doc
    }

    fn freq(&self) -> u32 {
        self.positions.len() as u32
    }

    fn next_position(&mut self) -> Result<Option<u32>> {
        if self.pos_idx < self.positions.len() {
            let pos = self.positions[self.pos_idx];
            self.pos_idx += 1;
            Ok(Some(pos))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test cursor over fixed (doc, positions) pairs.
    pub(crate) struct VecPostings {
        entries: Vec<(DocId, Vec<u32>)>,
        idx: usize,
        pos_idx: usize,
        started: bool,
    }

    impl VecPostings {
        pub(crate) fn new(entries: Vec<(DocId, Vec<u32>)>) -> Self {
            VecPostings {
                entries,
                idx: 0,
                pos_idx: 0,
                started: false,
            }
        }
    }

    impl Postings for VecPostings {
        fn next(&mut self) -> Result<bool> {
            if self.started {
                self.idx += 1;
            }
            self.started = true;
            self.pos_idx = 0;
            Ok(self.idx < self.entries.len())
        }

        fn skip_to(&mut self, target: DocId) -> Result<bool> {
            if !self.started {
                self.started = true;
            }
            while self.idx < self.entries.len() && self.entries[self.idx].0 < target {
                self.idx += 1;
            }
            self.pos_idx = 0;
            Ok(self.idx < self.entries.len())
        }

        fn doc(&self) -> DocId {
            self.entries
                .get(self.idx)
                .map(|e| e.0)
                .unwrap_or(NO_MORE_DOCS)
        }

        fn freq(&self) -> u32 {
            self.entries
                .get(self.idx)
                .map(|e| e.1.len() as u32)
                .unwrap_or(0)
        }

        fn next_position(&mut self) -> Result<Option<u32>> {
            let positions = match self.entries.get(self.idx) {
                Some(e) => &e.1,
                None => return Ok(None),
            };
            if self.pos_idx < positions.len() {
                let pos = positions[self.pos_idx];
                self.pos_idx += 1;
                Ok(Some(pos))
            } else {
                Ok(None)
            }
        }
    }

    #[test]
    fn test_union_docs_and_positions() {
        let a = VecPostings::new(vec![(1, vec![0, 5]), (4, vec![2])]);
        let b = VecPostings::new(vec![(1, vec![3]), (2, vec![7])]);
        let mut union = UnionPostings::new(vec![Box::new(a), Box::new(b)]);

        assert!(union.next().unwrap());
        assert_eq!(union.doc(), 1);
        assert_eq!(union.freq(), 3);
        assert_eq!(union.next_position().unwrap(), Some(0));
        assert_eq!(union.next_position().unwrap(), Some(3));
        assert_eq!(union.next_position().unwrap(), Some(5));
        assert_eq!(union.next_position().unwrap(), None);

        assert!(union.next().unwrap());
        assert_eq!(union.doc(), 2);
        assert!(union.next().unwrap());
        assert_eq!(union.doc(), 4);
        assert!(!union.next().unwrap());
        assert_eq!(union.doc(), NO_MORE_DOCS);
    }

    #[test]
    fn test_union_skip_to() {
        let a = VecPostings::new(vec![(1, vec![0]), (6, vec![1])]);
        let b = VecPostings::new(vec![(3, vec![2]), (9, vec![3])]);
        let mut union = UnionPostings::new(vec![Box::new(a), Box::new(b)]);

        assert!(union.skip_to(2).unwrap());
        assert_eq!(union.doc(), 3);
        assert!(union.skip_to(7).unwrap());
        assert_eq!(union.doc(), 9);
        assert!(!union.skip_to(10).unwrap());
    }
}
