//! Searcher over a single index reader.

use std::sync::Arc;

use log::debug;

use crate::document::Document;
use crate::error::{FerretError, Result};
use crate::index::{DocId, IndexReader};
use crate::query::filter::{Filter, PostFilter};
use crate::query::query::{Query, Weight};
use crate::search::explanation::Explanation;
use crate::search::similarity::{DefaultSimilarity, Similarity};
use crate::search::top_docs::{Hit, HitQueue, TopDocs};
use crate::search::{create_normalized_weight, SearchRequest, Searcher};

/// Executes queries against one [`IndexReader`] snapshot.
#[derive(Debug)]
pub struct IndexSearcher {
    reader: Arc<dyn IndexReader>,
    similarity: Arc<dyn Similarity>,
}

impl IndexSearcher {
    /// Create a searcher over `reader` with the default similarity.
    pub fn new(reader: Arc<dyn IndexReader>) -> Self {
        IndexSearcher {
            reader,
            similarity: Arc::new(DefaultSimilarity),
        }
    }

    /// Replace the similarity.
    pub fn with_similarity(mut self, similarity: Arc<dyn Similarity>) -> Self {
        self.similarity = similarity;
        self
    }

    /// The reader snapshot searched.
    pub fn reader(&self) -> &Arc<dyn IndexReader> {
        &self.reader
    }

    /// Decorate each hit with its stored sort keys, order by the sort
    /// chain, and cut the requested window.
    fn sorted_top_docs(
        &self,
        hits: Vec<Hit>,
        request: &SearchRequest<'_>,
        max_score: f32,
    ) -> Result<TopDocs> {
        let sort = request.sort.expect("sorted path requires a sort");
        let key_fields = sort.stored_fields();
        let mut decorated = Vec::with_capacity(hits.len());
        for hit in hits {
            let doc = self.get_doc(hit.doc)?;
            let keys: Vec<Option<String>> = key_fields
                .iter()
                .map(|field| doc.get_value(field).map(str::to_string))
                .collect();
            decorated.push((hit, keys));
        }
        decorated.sort_by(|(a, a_keys), (b, b_keys)| sort.compare(a, a_keys, b, b_keys));

        let total_hits = decorated.len() as u64;
        let hits = decorated
            .into_iter()
            .map(|(hit, _)| hit)
            .skip(request.first_doc)
            .take(request.num_docs)
            .collect();
        Ok(TopDocs {
            total_hits,
            hits,
            max_score,
        })
    }
}

impl Searcher for IndexSearcher {
    fn doc_freq(&self, field: &str, text: &str) -> Result<u32> {
        self.reader.doc_freq(field, text)
    }

    fn max_doc(&self) -> DocId {
        self.reader.max_doc()
    }

    fn similarity(&self) -> &Arc<dyn Similarity> {
        &self.similarity
    }

    fn get_doc(&self, doc: DocId) -> Result<Document> {
        self.reader.get_doc(doc)
    }

    fn rewrite(&self, query: &dyn Query) -> Result<Box<dyn Query>> {
        let mut current = query.rewrite(&self.reader)?;
        loop {
            let next = current.rewrite(&self.reader)?;
            if next.query_eq(current.as_ref()) {
                break;
            }
            current = next;
        }
        debug!(
            "rewrote query to {}",
            current.to_query_string("")
        );
        Ok(current)
    }

    fn search(&self, query: &dyn Query, request: &SearchRequest<'_>) -> Result<TopDocs> {
        let weight = create_normalized_weight(self, query)?;
        self.search_with_weight(weight.as_ref(), request)
    }

    fn search_with_weight(
        &self,
        weight: &dyn Weight,
        request: &SearchRequest<'_>,
    ) -> Result<TopDocs> {
        if request.num_docs == 0 {
            return Err(FerretError::invalid_argument(
                "num_docs must be positive",
            ));
        }
        let mut scorer = match weight.scorer(&self.reader)? {
            Some(scorer) => scorer,
            None => return Ok(TopDocs::empty()),
        };
        let bits = match request.filter {
            Some(filter) => Some(filter.bits(&self.reader)?),
            None => None,
        };

        let mut total_hits = 0u64;
        let mut max_score = 0.0f32;
        if request.sort.is_some() {
            let mut hits = Vec::new();
            while scorer.next()? {
                let doc = scorer.doc();
                if let Some(bits) = &bits {
                    if !bits.get(doc as usize) {
                        continue;
                    }
                }
                let score = scorer.score()?;
                if let Some(post_filter) = request.post_filter {
                    if !post_filter.keep(doc, score) {
                        continue;
                    }
                }
                if score > max_score {
                    max_score = score;
                }
                hits.push(Hit { doc, score });
            }
            return self.sorted_top_docs(hits, request, max_score);
        }

        let mut queue = HitQueue::new(request.first_doc + request.num_docs);
        while scorer.next()? {
            let doc = scorer.doc();
            if let Some(bits) = &bits {
                if !bits.get(doc as usize) {
                    continue;
                }
            }
            let score = scorer.score()?;
            if let Some(post_filter) = request.post_filter {
                if !post_filter.keep(doc, score) {
                    continue;
                }
            }
            total_hits += 1;
            if score > max_score {
                max_score = score;
            }
            queue.insert(Hit { doc, score });
        }

        let hits: Vec<Hit> = queue
            .into_ranked_hits()
            .into_iter()
            .skip(request.first_doc)
            .collect();
        Ok(TopDocs {
            total_hits,
            hits,
            max_score,
        })
    }

    fn search_each(
        &self,
        query: &dyn Query,
        filter: Option<&dyn Filter>,
        post_filter: Option<&dyn PostFilter>,
        callback: &mut dyn FnMut(DocId, f32),
    ) -> Result<u64> {
        let weight = create_normalized_weight(self, query)?;
        self.search_each_with_weight(weight.as_ref(), filter, post_filter, callback)
    }

    fn search_each_with_weight(
        &self,
        weight: &dyn Weight,
        filter: Option<&dyn Filter>,
        post_filter: Option<&dyn PostFilter>,
        callback: &mut dyn FnMut(DocId, f32),
    ) -> Result<u64> {
        let mut scorer = match weight.scorer(&self.reader)? {
            Some(scorer) => scorer,
            None => return Ok(0),
        };
        let bits = match filter {
            Some(filter) => Some(filter.bits(&self.reader)?),
            None => None,
        };

        let mut count = 0u64;
        while scorer.next()? {
            let doc = scorer.doc();
            if let Some(bits) = &bits {
                if !bits.get(doc as usize) {
                    continue;
                }
            }
            let score = scorer.score()?;
            if let Some(post_filter) = post_filter {
                if !post_filter.keep(doc, score) {
                    continue;
                }
            }
            count += 1;
            callback(doc, score);
        }
        Ok(count)
    }

    fn search_unscored(
        &self,
        query: &dyn Query,
        buf: &mut [DocId],
        offset: DocId,
    ) -> Result<usize> {
        let weight = create_normalized_weight(self, query)?;
        let mut scorer = match weight.scorer(&self.reader)? {
            Some(scorer) => scorer,
            None => return Ok(0),
        };
        let mut count = 0;
        if scorer.skip_to(offset)? {
            while count < buf.len() {
                buf[count] = scorer.doc();
                count += 1;
                if !scorer.next()? {
                    break;
                }
            }
        }
        Ok(count)
    }

    fn explain(&self, query: &dyn Query, doc: DocId) -> Result<Explanation> {
        let weight = create_normalized_weight(self, query)?;
        self.explain_with_weight(weight.as_ref(), doc)
    }

    fn explain_with_weight(&self, weight: &dyn Weight, doc: DocId) -> Result<Explanation> {
        weight.explain(&self.reader, doc)
    }
}
