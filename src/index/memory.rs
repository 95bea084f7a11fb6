//! In-memory inverted index.
//!
//! `MemoryIndex` is the reference `IndexReader` producer: a writer that
//! analyzes documents into per-field posting lists with positions and
//! norms, and hands out point-in-time reader snapshots. Mutations and
//! snapshot acquisition serialize through one lock; scoring never takes
//! it — readers operate on an `Arc` of the committed state, so a search
//! keeps seeing its snapshot while later commits build new state.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ahash::AHashMap;
use log::debug;
use parking_lot::RwLock;

use crate::analysis::Analyzer;
use crate::document::Document;
use crate::error::{FerretError, Result};
use crate::index::postings::Postings;
use crate::index::reader::{IndexReader, TermEnum};
use crate::index::{DocId, Term, NO_MORE_DOCS};
use crate::search::similarity::{float_to_byte, DefaultSimilarity, Similarity};
use crate::util::BitVector;

#[derive(Debug, Clone, Default)]
struct PostingList {
    postings: Vec<PostingEntry>,
}

#[derive(Debug, Clone)]
struct PostingEntry {
    doc: DocId,
    positions: Vec<u32>,
}

#[derive(Debug, Clone, Default)]
struct FieldData {
    terms: BTreeMap<String, Arc<PostingList>>,
    norms: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
struct Segment {
    fields: AHashMap<String, FieldData>,
    docs: Vec<Document>,
    deleted: BitVector,
    generation: u64,
}

/// A writable in-memory index producing snapshot readers.
#[derive(Debug)]
pub struct MemoryIndex {
    segment: RwLock<Arc<Segment>>,
    generation: Arc<AtomicU64>,
    analyzer: Arc<dyn Analyzer>,
    similarity: Arc<dyn Similarity>,
}

impl MemoryIndex {
    /// Create an empty index with the given analyzer.
    pub fn new(analyzer: Arc<dyn Analyzer>) -> Self {
        MemoryIndex {
            segment: RwLock::new(Arc::new(Segment::default())),
            generation: Arc::new(AtomicU64::new(0)),
            analyzer,
            similarity: Arc::new(DefaultSimilarity),
        }
    }

    /// Replace the similarity used for norm computation.
    pub fn with_similarity(mut self, similarity: Arc<dyn Similarity>) -> Self {
        self.similarity = similarity;
        self
    }

    /// Analyze and add `doc`, assigning the next document id.
    /// Same-named fields merge into one inverted field.
    pub fn add_document(&self, doc: Document) -> Result<DocId> {
        let mut guard = self.segment.write();
        let segment = Arc::make_mut(&mut guard);
        let doc_id = segment.docs.len() as DocId;

        let mut merged: Vec<(&str, f32, Vec<&str>)> = Vec::new();
        for field in &doc.fields {
            let values = field.values.iter().map(String::as_str);
            match merged.iter_mut().find(|(name, _, _)| *name == field.name) {
                Some((_, _, all_values)) => all_values.extend(values),
                None => merged.push((field.name.as_str(), field.boost, values.collect())),
            }
        }

        for (name, field_boost, values) in merged {
            let field_data = segment.fields.entry(name.to_string()).or_default();
            let mut pos = 0u32;
            let mut num_terms = 0u32;
            for (value_idx, value) in values.into_iter().enumerate() {
                if value_idx > 0 {
                    pos += 1;
                }
                for token in self.analyzer.analyze(value) {
                    pos += token.pos_inc;
                    num_terms += 1;
                    let list = field_data
                        .terms
                        .entry(token.text)
                        .or_insert_with(|| Arc::new(PostingList::default()));
                    let list = Arc::make_mut(list);
                    match list.postings.last_mut() {
                        Some(entry) if entry.doc == doc_id => entry.positions.push(pos),
                        _ => list.postings.push(PostingEntry {
                            doc: doc_id,
                            positions: vec![pos],
                        }),
                    }
                }
            }

            let norm = doc.boost * field_boost * self.similarity.length_norm(name, num_terms);
            field_data.norms.resize(doc_id as usize, 0);
            field_data.norms.push(float_to_byte(norm));
        }

        segment.docs.push(doc);
        segment.generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("added doc {doc_id}, generation {}", segment.generation);
        Ok(doc_id)
    }

    /// Mark `doc` as deleted.
    pub fn delete_doc(&self, doc: DocId) -> Result<()> {
        let mut guard = self.segment.write();
        let segment = Arc::make_mut(&mut guard);
        if doc as usize >= segment.docs.len() {
            return Err(FerretError::invalid_argument(format!(
                "doc {doc} out of range"
            )));
        }
        segment.deleted.set(doc as usize);
        segment.generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("deleted doc {doc}, generation {}", segment.generation);
        Ok(())
    }

    /// Take a point-in-time reader snapshot.
    pub fn reader(&self) -> Arc<MemoryIndexReader> {
        let segment = Arc::clone(&self.segment.read());
        Arc::new(MemoryIndexReader {
            segment,
            generation: Arc::clone(&self.generation),
        })
    }
}

/// Snapshot reader over a [`MemoryIndex`].
#[derive(Debug)]
pub struct MemoryIndexReader {
    segment: Arc<Segment>,
    generation: Arc<AtomicU64>,
}

impl MemoryIndexReader {
    fn field(&self, name: &str) -> Option<&FieldData> {
        self.segment.fields.get(name)
    }
}

impl IndexReader for MemoryIndexReader {
    fn max_doc(&self) -> DocId {
        self.segment.docs.len() as DocId
    }

    fn num_docs(&self) -> u32 {
        (self.segment.docs.len() - self.segment.deleted.count()) as u32
    }

    fn doc_freq(&self, field: &str, text: &str) -> Result<u32> {
        Ok(self
            .field(field)
            .and_then(|f| f.terms.get(text))
            .map(|list| list.postings.len() as u32)
            .unwrap_or(0))
    }

    fn term_positions(&self, term: &Term) -> Result<Option<Box<dyn Postings>>> {
        let list = match self.field(&term.field).and_then(|f| f.terms.get(&term.text)) {
            Some(list) => Arc::clone(list),
            None => return Ok(None),
        };
        Ok(Some(Box::new(MemoryPostings {
            segment: Arc::clone(&self.segment),
            list,
            idx: usize::MAX,
            pos_idx: 0,
        })))
    }

    fn terms(&self, field: &str) -> Result<Option<Box<dyn TermEnum>>> {
        let field_data = match self.field(field) {
            Some(data) => data,
            None => return Ok(None),
        };
        let entries: Vec<(String, u32)> = field_data
            .terms
            .iter()
            .map(|(text, list)| (text.clone(), list.postings.len() as u32))
            .collect();
        Ok(Some(Box::new(MemoryTermEnum {
            entries,
            idx: usize::MAX,
        })))
    }

    fn norms(&self, field: &str) -> Option<Arc<[u8]>> {
        self.field(field).map(|data| {
            let mut norms = data.norms.clone();
            norms.resize(self.segment.docs.len(), 0);
            Arc::from(norms.into_boxed_slice())
        })
    }

    fn has_deletions(&self) -> bool {
        self.segment.deleted.count() > 0
    }

    fn is_deleted(&self, doc: DocId) -> bool {
        self.segment.deleted.get(doc as usize)
    }

    fn get_doc(&self, doc: DocId) -> Result<Document> {
        self.segment
            .docs
            .get(doc as usize)
            .cloned()
            .ok_or_else(|| FerretError::invalid_argument(format!("doc {doc} out of range")))
    }

    fn is_latest(&self) -> bool {
        self.segment.generation == self.generation.load(Ordering::SeqCst)
    }
}

/// Posting cursor over one in-memory posting list; deleted documents
/// are skipped.
struct MemoryPostings {
    segment: Arc<Segment>,
    list: Arc<PostingList>,
    idx: usize,
    pos_idx: usize,
}

impl MemoryPostings {
    fn settle(&mut self) -> bool {
        while let Some(entry) = self.list.postings.get(self.idx) {
            if self.segment.deleted.get(entry.doc as usize) {
                self.idx += 1;
            } else {
                self.pos_idx = 0;
                return true;
            }
        }
        false
    }
}

impl Postings for MemoryPostings {
    fn next(&mut self) -> Result<bool> {
        self.idx = self.idx.wrapping_add(1);
        Ok(self.settle())
    }

    fn skip_to(&mut self, target: DocId) -> Result<bool> {
        if self.idx == usize::MAX {
            self.idx = 0;
        }
        while self
            .list
            .postings
            .get(self.idx)
            .is_some_and(|entry| entry.doc < target)
        {
            self.idx += 1;
        }
        Ok(self.settle())
    }

    fn doc(&self) -> DocId {
        self.list
            .postings
            .get(self.idx)
            .map(|entry| entry.doc)
            .unwrap_or(NO_MORE_DOCS)
    }

    fn freq(&self) -> u32 {
        self.list
            .postings
            .get(self.idx)
            .map(|entry| entry.positions.len() as u32)
            .unwrap_or(0)
    }

    fn next_position(&mut self) -> Result<Option<u32>> {
        let entry = match self.list.postings.get(self.idx) {
            Some(entry) => entry,
            None => return Ok(None),
        };
        if self.pos_idx < entry.positions.len() {
            let pos = entry.positions[self.pos_idx];
            self.pos_idx += 1;
            Ok(Some(pos))
        } else {
            Ok(None)
        }
    }
}

struct MemoryTermEnum {
    entries: Vec<(String, u32)>,
    idx: usize,
}

impl TermEnum for MemoryTermEnum {
    fn next(&mut self) -> bool {
        self.idx = self.idx.wrapping_add(1);
        self.idx < self.entries.len()
    }

    fn skip_to(&mut self, text: &str) -> bool {
        self.idx = self
            .entries
            .partition_point(|(term, _)| term.as_str() < text);
        self.idx < self.entries.len()
    }

    fn term(&self) -> &str {
        &self.entries[self.idx].0
    }

    fn doc_freq(&self) -> u32 {
        self.entries[self.idx].1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::LowercaseAnalyzer;

    fn sample_index() -> MemoryIndex {
        let index = MemoryIndex::new(Arc::new(LowercaseAnalyzer));
        for text in ["the quick brown fox", "a lazy dog", "the quick dog"] {
            index
                .add_document(Document::new().add("body", text))
                .unwrap();
        }
        index
    }

    #[test]
    fn test_doc_freq_and_counts() {
        let reader = sample_index().reader();

        assert_eq!(reader.max_doc(), 3);
        assert_eq!(reader.num_docs(), 3);
        assert_eq!(reader.doc_freq("body", "quick").unwrap(), 2);
        assert_eq!(reader.doc_freq("body", "dog").unwrap(), 2);
        assert_eq!(reader.doc_freq("body", "wolf").unwrap(), 0);
        assert_eq!(reader.doc_freq("title", "quick").unwrap(), 0);
    }

    #[test]
    fn test_postings_positions() {
        let reader = sample_index().reader();
        let mut postings = reader
            .term_positions(&Term::new("body", "quick"))
            .unwrap()
            .unwrap();

        assert!(postings.next().unwrap());
        assert_eq!(postings.doc(), 0);
        assert_eq!(postings.freq(), 1);
        assert_eq!(postings.next_position().unwrap(), Some(1));
        assert_eq!(postings.next_position().unwrap(), None);

        assert!(postings.next().unwrap());
        assert_eq!(postings.doc(), 2);
        assert!(!postings.next().unwrap());
        assert_eq!(postings.doc(), NO_MORE_DOCS);
    }

    #[test]
    fn test_postings_skip_to() {
        let reader = sample_index().reader();
        let mut postings = reader
            .term_positions(&Term::new("body", "the"))
            .unwrap()
            .unwrap();

        assert!(postings.skip_to(1).unwrap());
        assert_eq!(postings.doc(), 2);
        assert!(!postings.skip_to(3).unwrap());
    }

    #[test]
    fn test_deletions_skipped() {
        let index = sample_index();
        index.delete_doc(0).unwrap();
        let reader = index.reader();

        assert_eq!(reader.num_docs(), 2);
        assert!(reader.has_deletions());
        assert!(reader.is_deleted(0));

        let mut postings = reader
            .term_positions(&Term::new("body", "quick"))
            .unwrap()
            .unwrap();
        assert!(postings.next().unwrap());
        assert_eq!(postings.doc(), 2);
        assert!(!postings.next().unwrap());
    }

    #[test]
    fn test_snapshot_isolation() {
        let index = sample_index();
        let before = index.reader();
        assert!(before.is_latest());

        index
            .add_document(Document::new().add("body", "new doc"))
            .unwrap();

        assert_eq!(before.max_doc(), 3);
        assert!(!before.is_latest());

        let after = index.reader();
        assert_eq!(after.max_doc(), 4);
        assert!(after.is_latest());
    }

    #[test]
    fn test_term_enum_order_and_skip() {
        let reader = sample_index().reader();
        let mut terms = reader.terms("body").unwrap().unwrap();

        let mut collected = Vec::new();
        while terms.next() {
            collected.push(terms.term().to_string());
        }
        assert_eq!(collected, vec!["a", "brown", "dog", "fox", "lazy", "quick", "the"]);

        let mut terms = reader.terms("body").unwrap().unwrap();
        assert!(terms.skip_to("e"));
        assert_eq!(terms.term(), "fox");
        assert!(terms.skip_to("quick"));
        assert_eq!(terms.term(), "quick");
        assert!(!terms.skip_to("zzz"));
    }

    #[test]
    fn test_norms_present() {
        let reader = sample_index().reader();
        let norms = reader.norms("body").unwrap();
        assert_eq!(norms.len(), 3);
        // doc 0 has 4 terms: norm encodes 1/sqrt(4)
        let sim = DefaultSimilarity;
        assert!((sim.decode_norm(norms[0]) - 0.5).abs() < 1e-6);
        assert!(reader.norms("missing").is_none());
    }

    #[test]
    fn test_get_doc_round_trip() {
        let reader = sample_index().reader();
        let doc = reader.get_doc(1).unwrap();
        assert_eq!(doc.get_value("body"), Some("a lazy dog"));
        assert!(reader.get_doc(99).is_err());
    }
}
