use serde::{Deserialize, Serialize};

/// Per-source weight multipliers applied when accumulating term frequency.
/// Identifiers and type names carry more signal than raw code body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceWeights {
    pub identifier: f32,
    pub type_name: f32,
    pub comment: f32,
    pub string_literal: f32,
    pub path: f32,
    pub body: f32,
}

impl Default for SourceWeights {
    fn default() -> Self {
        Self {
            identifier: 3.0,
            type_name: 4.0,
            comment: 1.5,
            string_literal: 1.0,
            path: 2.0,
            body: 0.5,
        }
    }
}

/// Tuning knobs for vocabulary learning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyConfig {
    /// Terms whose document frequency exceeds `ratio * total_docs` become
    /// corpus-local stop words.
    pub max_doc_frequency_ratio: f64,

    /// Jaccard threshold for admitting a synonym pair:
    /// cooccurrence / (df(a) + df(b) - cooccurrence).
    pub jaccard_threshold: f64,

    /// A pair must co-occur in at least this many documents to be considered
    /// at all; raw Jaccard on tiny counts is noise.
    pub min_cooccurrence: usize,

    /// Documents with more distinct terms than this are skipped during
    /// co-occurrence counting (generated files, bundles).
    pub max_terms_per_doc_for_cooccurrence: usize,

    /// Minimum group size for a shared prefix/suffix to become a concept.
    pub min_concept_group: usize,

    /// Affix lengths examined for domain concepts.
    pub affix_min_len: usize,
    pub affix_max_len: usize,

    /// Vocabulary is pruned to this many terms by learned weight.
    pub max_vocabulary_size: usize,

    pub source_weights: SourceWeights,
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            max_doc_frequency_ratio: 0.5,
            jaccard_threshold: 0.25,
            min_cooccurrence: 2,
            max_terms_per_doc_for_cooccurrence: 120,
            min_concept_group: 3,
            affix_min_len: 3,
            affix_max_len: 5,
            max_vocabulary_size: 20_000,
            source_weights: SourceWeights::default(),
        }
    }
}

impl VocabularyConfig {
    pub fn validate(&self) -> crate::Result<()> {
        if !(0.0..=1.0).contains(&self.max_doc_frequency_ratio) {
            return Err(crate::VocabularyError::InvalidConfig(format!(
                "max_doc_frequency_ratio must be in [0, 1], got {}",
                self.max_doc_frequency_ratio
            )));
        }
        if !(0.0..=1.0).contains(&self.jaccard_threshold) {
            return Err(crate::VocabularyError::InvalidConfig(format!(
                "jaccard_threshold must be in [0, 1], got {}",
                self.jaccard_threshold
            )));
        }
        if self.affix_min_len == 0 || self.affix_min_len > self.affix_max_len {
            return Err(crate::VocabularyError::InvalidConfig(format!(
                "invalid affix length range {}..={}",
                self.affix_min_len, self.affix_max_len
            )));
        }
        Ok(())
    }
}
