use crate::tokenizer::is_bootstrap_stopword;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Learned statistics for one term.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TermStats {
    /// Raw occurrence count across the corpus.
    pub frequency: u64,
    /// Number of documents containing the term.
    pub doc_frequency: u32,
    /// Source-weighted accumulated frequency.
    pub weighted_frequency: f32,
    /// Final learned importance: weighted_frequency * idf.
    pub weight: f32,
    /// ln((N + 1) / (doc_frequency + 1)); recomputed whenever doc frequency
    /// changes.
    pub idf: f32,
    /// Stable slot assignment for the vocabulary-weighted embedder.
    pub slot: u32,
}

/// Terms sharing a frequent naming-convention prefix or suffix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConcept {
    pub affix: String,
    pub is_prefix: bool,
    pub terms: Vec<String>,
}

/// Summary counts for diagnostics and the host stats contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VocabularyStats {
    pub total_documents: usize,
    pub unique_terms: usize,
    pub stop_words: usize,
    pub synonym_clusters: usize,
    pub domain_concepts: usize,
}

/// The learned vocabulary. Built once per corpus snapshot by
/// [`crate::VocabularyLearner`]; read-only afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vocabulary {
    pub(crate) terms: HashMap<String, TermStats>,
    pub(crate) stop_words: HashSet<String>,
    pub(crate) synonyms: HashMap<String, Vec<String>>,
    pub(crate) concepts: Vec<DomainConcept>,
    pub(crate) total_documents: usize,
}

impl Vocabulary {
    /// True for both bootstrap stop words and learned corpus-local ones.
    #[must_use]
    pub fn is_stop_word(&self, term: &str) -> bool {
        is_bootstrap_stopword(term) || self.stop_words.contains(term)
    }

    #[must_use]
    pub fn weight(&self, term: &str) -> f32 {
        self.terms.get(term).map_or(0.0, |t| t.weight)
    }

    #[must_use]
    pub fn idf(&self, term: &str) -> f32 {
        self.terms.get(term).map_or(0.0, |t| t.idf)
    }

    #[must_use]
    pub fn doc_frequency(&self, term: &str) -> u32 {
        self.terms.get(term).map_or(0, |t| t.doc_frequency)
    }

    #[must_use]
    pub fn term_stats(&self, term: &str) -> Option<&TermStats> {
        self.terms.get(term)
    }

    /// Stable embedding slot for a known term.
    #[must_use]
    pub fn term_slot(&self, term: &str) -> Option<u32> {
        self.terms.get(term).map(|t| t.slot)
    }

    /// Co-occurrence synonyms of a term, excluding stop words.
    #[must_use]
    pub fn synonyms_of(&self, term: &str) -> &[String] {
        self.synonyms.get(term).map_or(&[], Vec::as_slice)
    }

    /// Other members of every domain concept `term` belongs to.
    #[must_use]
    pub fn concepts_of(&self, term: &str) -> Vec<&str> {
        let mut out = Vec::new();
        for concept in &self.concepts {
            if concept.terms.iter().any(|t| t == term) {
                out.extend(
                    concept
                        .terms
                        .iter()
                        .filter(|t| t.as_str() != term)
                        .map(String::as_str),
                );
            }
        }
        out
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    #[must_use]
    pub fn total_documents(&self) -> usize {
        self.total_documents
    }

    #[must_use]
    pub fn stats(&self) -> VocabularyStats {
        VocabularyStats {
            total_documents: self.total_documents,
            unique_terms: self.terms.len(),
            stop_words: self.stop_words.len(),
            synonym_clusters: self.synonyms.len(),
            domain_concepts: self.concepts.len(),
        }
    }

    /// Expansion terms for a query token: synonyms first, then concept
    /// members. Deduplicated, stop words excluded, bounded by `limit`.
    #[must_use]
    pub fn expand_term(&self, term: &str, limit: usize) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for syn in self.synonyms_of(term) {
            if out.len() >= limit {
                return out;
            }
            if !self.is_stop_word(syn) && seen.insert(syn.clone()) {
                out.push(syn.clone());
            }
        }
        for member in self.concepts_of(term) {
            if out.len() >= limit {
                break;
            }
            if !self.is_stop_word(member) && seen.insert(member.to_string()) {
                out.push(member.to_string());
            }
        }
        out
    }
}
