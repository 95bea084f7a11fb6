//! Phrase query: matches terms at constrained relative positions.
//!
//! A phrase is a sequence of slots, each carrying one or more
//! alternative terms at a declared position. Slots may leave gaps
//! (`"quick <> fox"`), stack several constraints on one position, and a
//! slot with alternatives acts as a disjunction at that spot — that
//! last form is the multi-phrase case, handled by merging the
//! alternatives' position streams into one.
//!
//! With `slop == 0` a document matches where every slot's term appears
//! at `base + slot_pos` for some base; the scorer aligns all slot
//! cursors by seeking the smallest common `position − slot_pos`. With
//! `slop > 0` each candidate window within the edit-distance budget
//! contributes `sloppy_freq(distance)` to the phrase frequency.

use std::any::Any;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use ahash::AHasher;

use crate::error::{FerretError, Result};
use crate::index::postings::{Postings, UnionPostings};
use crate::index::{DocId, IndexReader, Term, NO_MORE_DOCS};
use crate::query::boolean::BooleanQuery;
use crate::query::query::{boost_suffix, field_prefix, Query, Weight};
use crate::query::scorer::Scorer;
use crate::query::term::TermQuery;
use crate::search::explanation::Explanation;
use crate::search::similarity::Similarity;
use crate::search::Searcher;
use crate::util::PriorityQueue;

/// One position slot of a phrase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhraseSlot {
    /// Declared position within the phrase.
    pub pos: i32,
    /// Alternative terms accepted at this slot.
    pub terms: Vec<String>,
}

/// A query matching phrases against one field.
#[derive(Debug, Clone)]
pub struct PhraseQuery {
    field: String,
    slots: Vec<PhraseSlot>,
    slop: u32,
    boost: f32,
}

impl PhraseQuery {
    /// Create an empty phrase over `field`.
    pub fn new<F: Into<String>>(field: F) -> Self {
        PhraseQuery {
            field: field.into(),
            slots: Vec::new(),
            slop: 0,
            boost: 1.0,
        }
    }

    /// Append a slot `pos_inc` positions after the last one (the first
    /// slot lands at position 0).
    pub fn add_term<T: Into<String>>(&mut self, text: T, pos_inc: i32) {
        let pos = match self.slots.last() {
            Some(slot) => slot.pos + pos_inc,
            None => 0,
        };
        self.add_term_at(text, pos);
    }

    /// Append a slot at an absolute position.
    pub fn add_term_at<T: Into<String>>(&mut self, text: T, pos: i32) {
        self.slots.push(PhraseSlot {
            pos,
            terms: vec![text.into()],
        });
    }

    /// Add an alternative term to the most recently added slot.
    pub fn append_alternative<T: Into<String>>(&mut self, text: T) -> Result<()> {
        match self.slots.last_mut() {
            Some(slot) => {
                slot.terms.push(text.into());
                Ok(())
            }
            None => Err(FerretError::invalid_argument(
                "phrase has no slot to extend",
            )),
        }
    }

    /// Set the slop budget.
    pub fn with_slop(mut self, slop: u32) -> Self {
        self.slop = slop;
        self
    }

    /// Set the slop budget in place.
    pub fn set_slop(&mut self, slop: u32) {
        self.slop = slop;
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

    /// The slots in insertion order.
    pub fn slots(&self) -> &[PhraseSlot] {
        &self.slots
    }

    /// The slop budget.
    pub fn slop(&self) -> u32 {
        self.slop
    }

    /// Slots sorted by position, insertion order preserved within a
    /// position.
    fn sorted_slots(&self) -> Vec<&PhraseSlot> {
        let mut sorted: Vec<&PhraseSlot> = self.slots.iter().collect();
        sorted.sort_by_key(|slot| slot.pos);
        sorted
    }
}

impl Query for PhraseQuery {
    fn create_weight(&self, searcher: &dyn Searcher) -> Result<Box<dyn Weight>> {
        let mut idf = 0.0;
        for slot in &self.slots {
            for text in &slot.terms {
                let doc_freq = searcher.doc_freq(&self.field, text)?;
                idf += searcher.similarity().idf(doc_freq, searcher.max_doc());
            }
        }
        Ok(Box::new(PhraseWeight {
            similarity: Arc::clone(searcher.similarity()),
            query: self.clone(),
            idf,
            query_weight: 0.0,
            query_norm: 0.0,
            value: 0.0,
        }))
    }

    fn rewrite(&self, _reader: &Arc<dyn IndexReader>) -> Result<Box<dyn Query>> {
        if self.slots.len() != 1 {
            return Ok(self.clone_box());
        }
        let slot = &self.slots[0];
        if slot.terms.len() == 1 {
            let term = TermQuery::new(&self.field, &slot.terms[0]).with_boost(self.boost);
            return Ok(Box::new(term));
        }
        let mut bq = BooleanQuery::new().with_boost(self.boost);
        for text in &slot.terms {
            bq.add_should(Box::new(TermQuery::new(&self.field, text)));
        }
        Ok(Box::new(bq))
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn set_boost(&mut self, boost: f32) {
        self.boost = boost;
    }

    fn to_query_string(&self, default_field: &str) -> String {
        let mut body = String::new();
        let sorted = self.sorted_slots();
        let mut last_pos = None;
        for slot in sorted {
            match last_pos {
                None => {}
                Some(last) if slot.pos == last => body.push('&'),
                Some(last) => {
                    for _ in last + 1..slot.pos {
                        body.push_str(" <>");
                    }
                    body.push(' ');
                }
            }
            body.push_str(&slot.terms.join("|"));
            last_pos = Some(slot.pos);
        }

        let slop_suffix = if self.slop > 0 {
            format!("~{}", self.slop)
        } else {
            String::new()
        };
        format!(
            "{}\"{body}\"{slop_suffix}{}",
            field_prefix(&self.field, default_field),
            boost_suffix(self.boost)
        )
    }

    fn query_eq(&self, other: &dyn Query) -> bool {
        other
            .as_any()
            .downcast_ref::<PhraseQuery>()
            .is_some_and(|o| {
                self.field == o.field
                    && self.slots == o.slots
                    && self.slop == o.slop
                    && self.boost == o.boost
            })
    }

    fn query_hash(&self) -> u64 {
        let mut hasher = AHasher::default();
        "phrase".hash(&mut hasher);
        self.field.hash(&mut hasher);
        self.slots.hash(&mut hasher);
        self.slop.hash(&mut hasher);
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

#[derive(Debug)]
struct PhraseWeight {
    similarity: Arc<dyn Similarity>,
    query: PhraseQuery,
    idf: f32,
    query_weight: f32,
    query_norm: f32,
    value: f32,
}

impl PhraseWeight {
    fn build_scorer(&self, reader: &Arc<dyn IndexReader>) -> Result<Option<PhraseScorer>> {
        if self.query.slots.is_empty() {
            return Ok(None);
        }
        let mut positions = Vec::with_capacity(self.query.slots.len());
        for slot in &self.query.slots {
            let postings: Box<dyn Postings> = if slot.terms.len() == 1 {
                match reader.term_positions(&Term::new(&self.query.field, &slot.terms[0]))? {
                    Some(postings) => postings,
                    None => return Ok(None),
                }
            } else {
                let mut subs = Vec::new();
                for text in &slot.terms {
                    if let Some(sub) =
                        reader.term_positions(&Term::new(&self.query.field, text))?
                    {
                        subs.push(sub);
                    }
                }
                if subs.is_empty() {
                    return Ok(None);
                }
                Box::new(UnionPostings::new(subs))
            };
            positions.push(PhrasePositions {
                postings,
                offset: slot.pos,
                position: 0,
            });
        }
        Ok(Some(PhraseScorer {
            similarity: Arc::clone(&self.similarity),
            pps: positions,
            norms: reader.norms(&self.query.field),
            value: self.value,
            slop: self.query.slop,
            freq: 0.0,
            current: NO_MORE_DOCS,
            started: false,
            exhausted: false,
        }))
    }
}

impl Weight for PhraseWeight {
    fn value(&self) -> f32 {
        self.value
    }

    fn sum_of_squared_weights(&mut self) -> f32 {
        self.query_weight = self.idf * self.query.boost;
        self.query_weight * self.query_weight
    }

    fn normalize(&mut self, norm: f32) {
        self.query_norm = norm;
        self.query_weight *= norm;
        self.value = self.query_weight * self.idf;
    }

    fn scorer(&self, reader: &Arc<dyn IndexReader>) -> Result<Option<Box<dyn Scorer>>> {
        Ok(self
            .build_scorer(reader)?
            .map(|scorer| Box::new(scorer) as Box<dyn Scorer>))
    }

    fn explain(&self, reader: &Arc<dyn IndexReader>, doc: DocId) -> Result<Explanation> {
        let label = self.query.to_query_string("");
        let mut scorer = match self.build_scorer(reader)? {
            Some(scorer) => scorer,
            None => return Ok(Explanation::new(0.0, format!("no match for {label}"))),
        };
        if !scorer.skip_to(doc)? || scorer.doc() != doc {
            return Ok(Explanation::new(
                0.0,
                format!("no match for {label} in doc {doc}"),
            ));
        }
        let freq = scorer.freq;

        let mut query_expl = Explanation::new(
            self.query_weight,
            format!("query_weight({label}), product of:"),
        );
        if self.query.boost != 1.0 {
            query_expl.add_detail(Explanation::new(self.query.boost, "boost"));
        }
        query_expl.add_detail(Explanation::new(self.idf, "idf(sum over phrase terms)"));
        query_expl.add_detail(Explanation::new(self.query_norm, "query_norm"));

        let tf = self.similarity.tf(freq);
        let norm = reader
            .norms(&self.query.field)
            .map(|norms| self.similarity.decode_norm(norms[doc as usize]))
            .unwrap_or(1.0);
        let mut field_expl = Explanation::new(
            tf * self.idf * norm,
            format!("field_weight({label} in {doc}), product of:"),
        );
        field_expl.add_detail(Explanation::new(tf, format!("tf(phrase_freq={freq})")));
        field_expl.add_detail(Explanation::new(self.idf, "idf(sum over phrase terms)"));
        field_expl.add_detail(Explanation::new(
            norm,
            format!("field_norm(field={}, doc={doc})", self.query.field),
        ));

        if query_expl.value == 1.0 {
            return Ok(field_expl);
        }
        let mut expl = Explanation::new(
            query_expl.value * field_expl.value,
            format!("weight({label} in {doc}), product of:"),
        );
        expl.add_detail(query_expl);
        expl.add_detail(field_expl);
        Ok(expl)
    }
}

/// One slot's position stream, shifted by the slot position so every
/// slot seeks a common base value.
struct PhrasePositions {
    postings: Box<dyn Postings>,
    offset: i32,
    position: i32,
}

impl PhrasePositions {
    fn next_position(&mut self) -> Result<bool> {
        match self.postings.next_position()? {
            Some(pos) => {
                self.position = pos as i32 - self.offset;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

struct PhraseScorer {
    similarity: Arc<dyn Similarity>,
    pps: Vec<PhrasePositions>,
    norms: Option<Arc<[u8]>>,
    value: f32,
    slop: u32,
    freq: f32,
    current: DocId,
    started: bool,
    exhausted: bool,
}

impl PhraseScorer {
    /// Lock-step the slot cursors onto docs containing the phrase.
    /// Every cursor must already have a current doc.
    fn do_next(&mut self) -> Result<bool> {
        loop {
            let mut target = 0;
            for pp in &self.pps {
                target = target.max(pp.postings.doc());
            }
            if target == NO_MORE_DOCS {
                return Ok(false);
            }
            loop {
                let mut moved = false;
                for pp in &mut self.pps {
                    if pp.postings.doc() < target {
                        if !pp.postings.skip_to(target)? {
                            return Ok(false);
                        }
                        if pp.postings.doc() > target {
                            target = pp.postings.doc();
                            moved = true;
                        }
                    }
                }
                if !moved {
                    break;
                }
            }

            let freq = self.phrase_freq()?;
            if freq > 0.0 {
                self.freq = freq;
                self.current = target;
                return Ok(true);
            }
            if !self.pps[0].postings.next()? {
                return Ok(false);
            }
        }
    }

    fn phrase_freq(&mut self) -> Result<f32> {
        for pp in &mut self.pps {
            if !pp.next_position()? {
                return Ok(0.0);
            }
        }
        if self.slop == 0 {
            self.exact_freq()
        } else {
            self.sloppy_freq()
        }
    }

    /// Count bases where every slot aligns exactly.
    fn exact_freq(&mut self) -> Result<f32> {
        let mut freq = 0u32;
        'align: loop {
            let target = self
                .pps
                .iter()
                .map(|pp| pp.position)
                .max()
                .expect("phrase has slots");
            for i in 0..self.pps.len() {
                while self.pps[i].position < target {
                    if !self.pps[i].next_position()? {
                        return Ok(freq as f32);
                    }
                }
                if self.pps[i].position > target {
                    continue 'align;
                }
            }
            freq += 1;
            if !self.pps[0].next_position()? {
                return Ok(freq as f32);
            }
        }
    }

    /// Accumulate `sloppy_freq` over candidate windows within the slop
    /// budget, driving a heap of slot cursors ordered by position.
    fn sloppy_freq(&mut self) -> Result<f32> {
        let mut heap: PriorityQueue<(i32, usize), fn(&(i32, usize), &(i32, usize)) -> bool> =
            PriorityQueue::new(self.pps.len(), |a, b| a.0 < b.0);
        let mut end = i32::MIN;
        for (idx, pp) in self.pps.iter().enumerate() {
            heap.push((pp.position, idx));
            end = end.max(pp.position);
        }

        let mut freq = 0.0f32;
        let mut done = false;
        while !done {
            let (pos, idx) = heap.pop().expect("phrase has slots");
            let mut start = pos;
            let next = heap.top().map(|(p, _)| *p).unwrap_or(i32::MAX);
            let mut pos = start;
            while pos <= next {
                start = pos;
                if !self.pps[idx].next_position()? {
                    done = true;
                    break;
                }
                pos = self.pps[idx].position;
            }

            let match_length = end - start;
            if match_length <= self.slop as i32 {
                freq += self.similarity.sloppy_freq(match_length as u32);
            }
            if self.pps[idx].position > end {
                end = self.pps[idx].position;
            }
            heap.push((self.pps[idx].position, idx));
        }
        Ok(freq)
    }

    fn norm(&self, doc: DocId) -> f32 {
        self.norms
            .as_ref()
            .map(|norms| self.similarity.decode_norm(norms[doc as usize]))
            .unwrap_or(1.0)
    }
}

impl Scorer for PhraseScorer {
    fn next(&mut self) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        let more = if !self.started {
            self.started = true;
            let mut alive = true;
            for pp in &mut self.pps {
                if !pp.postings.next()? {
                    alive = false;
                    break;
                }
            }
            alive && self.do_next()?
        } else if !self.pps[0].postings.next()? {
            false
        } else {
            self.do_next()?
        };
        if !more {
            self.exhausted = true;
            self.current = NO_MORE_DOCS;
        }
        Ok(more)
    }

    fn skip_to(&mut self, target: DocId) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        if self.started && self.current != NO_MORE_DOCS && self.current >= target {
            return Ok(true);
        }
        self.started = true;
        let mut alive = true;
        for pp in &mut self.pps {
            if !pp.postings.skip_to(target)? {
                alive = false;
                break;
            }
        }
        let more = alive && self.do_next()?;
        if !more {
            self.exhausted = true;
            self.current = NO_MORE_DOCS;
        }
        Ok(more)
    }

    fn doc(&self) -> DocId {
        self.current
    }

    fn score(&mut self) -> Result<f32> {
        Ok(self.similarity.tf(self.freq) * self.value * self.norm(self.current))
    }
}
