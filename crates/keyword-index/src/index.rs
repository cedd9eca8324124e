use crate::stemmer::stem;
use crate::{IndexError, Result};
use quarry_protocol::DocumentType;
use quarry_vocabulary::{split_identifier, Vocabulary};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// One entry in a term's posting list. Owned exclusively by the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc: u32,
    /// Raw in-document frequency scaled by the document-type boost.
    pub weighted_freq: f32,
    /// Token ordinals where the term occurred.
    pub positions: Vec<u32>,
}

/// Caller-supplied document metadata, echoed back in hits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub file: String,
    /// 1-based line the document starts at; 0 for whole files.
    pub line: u32,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct DocumentEntry {
    pub(crate) external_id: String,
    pub(crate) doc_type: DocumentType,
    pub(crate) meta: DocumentMeta,
    /// Distinct stemmed terms, kept for O(terms) removal.
    pub(crate) terms: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct KeywordSearchOptions {
    pub max_results: usize,
    pub expand_synonyms: bool,
    pub type_filter: Option<DocumentType>,
}

impl Default for KeywordSearchOptions {
    fn default() -> Self {
        Self {
            max_results: 20,
            expand_synonyms: true,
            type_filter: None,
        }
    }
}

/// A ranked keyword match.
#[derive(Debug, Clone)]
pub struct KeywordHit {
    pub doc_id: String,
    pub doc_type: DocumentType,
    pub meta: DocumentMeta,
    pub score: f32,
    pub matched_terms: Vec<String>,
}

/// Term -> posting-list inverted index.
///
/// Scoring: per matched term, `ln(1 + weighted_freq) * ln(N / (1 + df)) *
/// (1 + ln(1 + learned_weight) * 0.1)`, summed per document, then multiplied
/// by `1 + matched / total` to reward broader query-term coverage.
pub struct KeywordIndex {
    vocabulary: Arc<Vocabulary>,
    pub(crate) documents: HashMap<u32, DocumentEntry>,
    pub(crate) id_of: HashMap<String, u32>,
    pub(crate) postings: HashMap<String, Vec<Posting>>,
    pub(crate) next_doc: u32,
}

/// Weight applied to synonym-expanded terms relative to original ones.
const EXPANSION_WEIGHT: f32 = 0.5;
/// Synonym expansions considered per query term.
const EXPANSIONS_PER_TERM: usize = 3;

impl KeywordIndex {
    #[must_use]
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        Self {
            vocabulary,
            documents: HashMap::new(),
            id_of: HashMap::new(),
            postings: HashMap::new(),
            next_doc: 0,
        }
    }

    /// Add (or replace) a document. Re-adding an id removes the old postings
    /// first, so incremental file updates cannot leave stale entries.
    pub fn add_document(
        &mut self,
        id: impl Into<String>,
        text: &str,
        doc_type: DocumentType,
        meta: DocumentMeta,
    ) {
        let external_id = id.into();
        if self.id_of.contains_key(&external_id) {
            // Ignore the result: the id is known to exist.
            let _ = self.remove_document(&external_id);
        }

        let doc = self.next_doc;
        self.next_doc += 1;

        let occurrences = self.extract_terms(text);
        let boost = doc_type.boost();
        let mut terms = Vec::with_capacity(occurrences.len());
        for (term, positions) in occurrences {
            let weighted_freq = positions.len() as f32 * boost;
            self.postings.entry(term.clone()).or_default().push(Posting {
                doc,
                weighted_freq,
                positions,
            });
            terms.push(term);
        }

        self.id_of.insert(external_id.clone(), doc);
        self.documents.insert(
            doc,
            DocumentEntry {
                external_id,
                doc_type,
                meta,
                terms,
            },
        );
    }

    /// Remove a document and all of its postings.
    pub fn remove_document(&mut self, id: &str) -> Result<()> {
        let doc = self
            .id_of
            .remove(id)
            .ok_or_else(|| IndexError::UnknownDocument(id.to_string()))?;
        let entry = self
            .documents
            .remove(&doc)
            .ok_or_else(|| IndexError::UnknownDocument(id.to_string()))?;

        for term in &entry.terms {
            if let Some(list) = self.postings.get_mut(term) {
                list.retain(|p| p.doc != doc);
                if list.is_empty() {
                    self.postings.remove(term);
                }
            }
        }
        Ok(())
    }

    /// Ranked search across all documents. An unbuilt (empty) index returns
    /// an empty vector; the caller reports the reason through its stats.
    #[must_use]
    pub fn search(&self, query: &str, opts: &KeywordSearchOptions) -> Vec<KeywordHit> {
        if self.documents.is_empty() {
            log::debug!("Keyword search on empty index");
            return Vec::new();
        }

        let query_terms = self.query_terms(query);
        if query_terms.is_empty() {
            return Vec::new();
        }
        let total_query_terms = query_terms.len();

        // (term, weight factor, counts toward coverage)
        let mut weighted_terms: Vec<(String, f32, bool)> = query_terms
            .iter()
            .map(|t| (t.clone(), 1.0, true))
            .collect();
        if opts.expand_synonyms {
            for term in &query_terms {
                for expansion in self.vocabulary.expand_term(term, EXPANSIONS_PER_TERM) {
                    let stemmed = stem(&expansion);
                    if weighted_terms.iter().all(|(t, _, _)| *t != stemmed) {
                        weighted_terms.push((stemmed, EXPANSION_WEIGHT, false));
                    }
                }
            }
        }

        let n = self.documents.len() as f32;
        let mut scores: HashMap<u32, f32> = HashMap::new();
        let mut matched: HashMap<u32, Vec<String>> = HashMap::new();

        for (term, factor, counts_coverage) in &weighted_terms {
            let Some(list) = self.postings.get(term) else {
                continue;
            };
            let df = list.len() as f32;
            let idf = (n / (1.0 + df)).ln();
            if idf <= 0.0 {
                // Term present in effectively every document; no signal.
                continue;
            }
            let learned = self.vocabulary.weight(term);
            let learned_factor = 1.0 + (1.0 + learned).ln() * 0.1;

            for posting in list {
                let tf = (1.0 + posting.weighted_freq).ln();
                *scores.entry(posting.doc).or_insert(0.0) += tf * idf * learned_factor * factor;
                if *counts_coverage {
                    let terms = matched.entry(posting.doc).or_default();
                    if !terms.contains(term) {
                        terms.push(term.clone());
                    }
                }
            }
        }

        let mut hits: Vec<KeywordHit> = scores
            .into_iter()
            .filter_map(|(doc, base)| {
                let entry = self.documents.get(&doc)?;
                if let Some(filter) = opts.type_filter {
                    if entry.doc_type != filter {
                        return None;
                    }
                }
                let matched_terms = matched.remove(&doc).unwrap_or_default();
                let coverage = 1.0 + matched_terms.len() as f32 / total_query_terms as f32;
                Some(KeywordHit {
                    doc_id: entry.external_id.clone(),
                    doc_type: entry.doc_type,
                    meta: entry.meta.clone(),
                    score: base * coverage,
                    matched_terms,
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(opts.max_results);
        hits
    }

    #[must_use]
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn clear(&mut self) {
        self.documents.clear();
        self.id_of.clear();
        self.postings.clear();
        self.next_doc = 0;
    }

    /// Stemmed, stop-word-filtered query terms.
    fn query_terms(&self, query: &str) -> Vec<String> {
        let mut terms = Vec::new();
        for word in query.split(|c: char| !c.is_ascii_alphanumeric() && c != '_') {
            for part in split_identifier(word) {
                if self.vocabulary.is_stop_word(&part) {
                    continue;
                }
                let stemmed = stem(&part);
                if !terms.contains(&stemmed) {
                    terms.push(stemmed);
                }
            }
        }
        terms
    }

    /// Distinct stemmed terms with their token positions.
    fn extract_terms(&self, text: &str) -> HashMap<String, Vec<u32>> {
        let mut occurrences: HashMap<String, Vec<u32>> = HashMap::new();
        let mut position = 0u32;
        for word in text.split(|c: char| !c.is_ascii_alphanumeric() && c != '_') {
            for part in split_identifier(word) {
                if self.vocabulary.is_stop_word(&part) {
                    position += 1;
                    continue;
                }
                occurrences.entry(stem(&part)).or_default().push(position);
                position += 1;
            }
        }
        occurrences
    }
}
