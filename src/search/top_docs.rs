//! Ranked search results and the bounded hit queue.

use serde::{Deserialize, Serialize};

use crate::index::DocId;
use crate::util::PriorityQueue;

/// One ranked hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// The document id.
    pub doc: DocId,
    /// The relevance score.
    pub score: f32,
}

/// The bounded result of a ranked search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopDocs {
    /// Total number of matching documents, including those outside the
    /// returned window.
    pub total_hits: u64,
    /// The returned hits, best first.
    pub hits: Vec<Hit>,
    /// Highest score over all matches.
    pub max_score: f32,
}

impl TopDocs {
    /// An empty result.
    pub fn empty() -> Self {
        TopDocs {
            total_hits: 0,
            hits: Vec::new(),
            max_score: 0.0,
        }
    }
}

type HitLessThan = fn(&Hit, &Hit) -> bool;

/// `a` is a weaker hit than `b`: lower score, ties broken toward the
/// higher doc id. The weakest hit sits at the queue head so a full
/// queue evicts it first.
fn weaker(a: &Hit, b: &Hit) -> bool {
    if a.score == b.score {
        a.doc > b.doc
    } else {
        a.score < b.score
    }
}

/// Bounded priority queue of the best hits seen so far.
#[derive(Debug)]
pub struct HitQueue {
    queue: PriorityQueue<Hit, HitLessThan>,
}

impl HitQueue {
    /// Keep at most `capacity` hits.
    pub fn new(capacity: usize) -> Self {
        HitQueue {
            queue: PriorityQueue::new(capacity, weaker),
        }
    }

    /// Offer a hit; a full queue keeps it only if it beats the current
    /// weakest.
    pub fn insert(&mut self, hit: Hit) {
        self.queue.insert_with_overflow(hit);
    }

    /// Number of hits retained.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True when no hit is retained.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drain into best-first order (score desc, doc asc).
    pub fn into_ranked_hits(self) -> Vec<Hit> {
        self.queue.into_sorted_vec()
    }
}
