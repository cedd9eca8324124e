use crate::config::VocabularyConfig;
use crate::tokenizer::{split_identifier, tokenize_file, TokenSource};
use crate::vocabulary::{DomainConcept, TermStats, Vocabulary};
use crate::Result;
use quarry_protocol::{ParsedSymbol, SourceFile, SymbolKind};
use std::collections::{HashMap, HashSet};

/// Learns a [`Vocabulary`] from a corpus snapshot.
///
/// One document = one file. All counts are commutative accumulations, so the
/// result does not depend on file iteration order.
pub struct VocabularyLearner {
    config: VocabularyConfig,
}

impl VocabularyLearner {
    pub fn new(config: VocabularyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            config: VocabularyConfig::default(),
        }
    }

    /// Learn term weights, stop words, synonym clusters and domain concepts.
    /// `symbols` is the host's optional per-file parse output; symbol names
    /// get the identifier/type-name weight on top of whatever the raw text
    /// scan attributed.
    pub fn learn(
        &self,
        files: &[SourceFile],
        symbols: &HashMap<String, Vec<ParsedSymbol>>,
    ) -> Vocabulary {
        let total_docs = files.len();
        let weights = &self.config.source_weights;

        let mut terms: HashMap<String, TermStats> = HashMap::new();
        // Distinct term set per document, for doc frequency and co-occurrence.
        let mut doc_terms: Vec<HashSet<String>> = Vec::with_capacity(total_docs);

        for file in files {
            let mut seen = HashSet::new();
            for (term, source) in tokenize_file(file) {
                let weight = match source {
                    TokenSource::Identifier => weights.identifier,
                    TokenSource::TypeName => weights.type_name,
                    TokenSource::Comment => weights.comment,
                    TokenSource::StringLiteral => weights.string_literal,
                    TokenSource::Path => weights.path,
                    TokenSource::Body => weights.body,
                };
                let entry = terms.entry(term.clone()).or_default();
                entry.frequency += 1;
                entry.weighted_frequency += weight;
                seen.insert(term);
            }

            if let Some(parsed) = symbols.get(&file.path) {
                for symbol in parsed {
                    let weight = match symbol.kind {
                        SymbolKind::Class
                        | SymbolKind::Struct
                        | SymbolKind::Enum
                        | SymbolKind::Interface => weights.type_name,
                        _ => weights.identifier,
                    };
                    for part in split_identifier(&symbol.name) {
                        let entry = terms.entry(part.clone()).or_default();
                        entry.frequency += 1;
                        entry.weighted_frequency += weight;
                        seen.insert(part);
                    }
                }
            }

            for term in &seen {
                if let Some(entry) = terms.get_mut(term) {
                    entry.doc_frequency += 1;
                }
            }
            doc_terms.push(seen);
        }

        // IDF and final weight, recomputed from the finished doc frequencies.
        let n = total_docs as f32;
        for stats in terms.values_mut() {
            stats.idf = ((n + 1.0) / (stats.doc_frequency as f32 + 1.0)).ln();
            stats.weight = stats.weighted_frequency * stats.idf;
        }

        let stop_words = self.learn_stop_words(&terms, total_docs);
        self.prune(&mut terms);
        let synonyms = self.learn_synonyms(&terms, &stop_words, &doc_terms);
        let concepts = self.learn_concepts(&terms, &stop_words);
        assign_slots(&mut terms);

        log::info!(
            "Learned vocabulary: {} terms, {} stop words, {} synonym clusters, {} concepts from {} documents",
            terms.len(),
            stop_words.len(),
            synonyms.len(),
            concepts.len(),
            total_docs
        );

        Vocabulary {
            terms,
            stop_words,
            synonyms,
            concepts,
            total_documents: total_docs,
        }
    }

    /// Terms present in more than `ratio * total_docs` documents carry no
    /// discriminative signal in this corpus.
    fn learn_stop_words(
        &self,
        terms: &HashMap<String, TermStats>,
        total_docs: usize,
    ) -> HashSet<String> {
        if total_docs == 0 {
            return HashSet::new();
        }
        let cutoff = self.config.max_doc_frequency_ratio * total_docs as f64;
        terms
            .iter()
            .filter(|(_, stats)| f64::from(stats.doc_frequency) > cutoff)
            .map(|(term, _)| term.clone())
            .collect()
    }

    fn prune(&self, terms: &mut HashMap<String, TermStats>) {
        if terms.len() <= self.config.max_vocabulary_size {
            return;
        }
        let mut by_weight: Vec<(String, f32)> = terms
            .iter()
            .map(|(t, s)| (t.clone(), s.weight))
            .collect();
        by_weight.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        let keep: HashSet<String> = by_weight
            .into_iter()
            .take(self.config.max_vocabulary_size)
            .map(|(t, _)| t)
            .collect();
        terms.retain(|t, _| keep.contains(t));
    }

    /// Synonym discovery: count pairwise co-occurrence within documents, then
    /// admit a pair when its Jaccard over documents clears the threshold.
    /// Documents with pathologically large term sets are skipped; they would
    /// dominate the pair counts without meaning anything.
    fn learn_synonyms(
        &self,
        terms: &HashMap<String, TermStats>,
        stop_words: &HashSet<String>,
        doc_terms: &[HashSet<String>],
    ) -> HashMap<String, Vec<String>> {
        let mut pair_counts: HashMap<(String, String), usize> = HashMap::new();

        for doc in doc_terms {
            if doc.len() > self.config.max_terms_per_doc_for_cooccurrence {
                continue;
            }
            let mut eligible: Vec<&String> = doc
                .iter()
                .filter(|t| terms.contains_key(*t) && !stop_words.contains(*t))
                .collect();
            eligible.sort();
            for i in 0..eligible.len() {
                for j in (i + 1)..eligible.len() {
                    let key = (eligible[i].clone(), eligible[j].clone());
                    *pair_counts.entry(key).or_insert(0) += 1;
                }
            }
        }

        let mut synonyms: HashMap<String, Vec<String>> = HashMap::new();
        for ((a, b), cooc) in pair_counts {
            if cooc < self.config.min_cooccurrence {
                continue;
            }
            let df_a = terms.get(&a).map_or(0, |s| s.doc_frequency) as usize;
            let df_b = terms.get(&b).map_or(0, |s| s.doc_frequency) as usize;
            let union = df_a + df_b - cooc;
            if union == 0 {
                continue;
            }
            let jaccard = cooc as f64 / union as f64;
            if jaccard >= self.config.jaccard_threshold {
                synonyms.entry(a.clone()).or_default().push(b.clone());
                synonyms.entry(b).or_default().push(a);
            }
        }
        for related in synonyms.values_mut() {
            related.sort();
            related.dedup();
        }
        synonyms
    }

    /// Concept discovery: group non-stop terms by shared 3-5 character
    /// prefixes and suffixes; groups above the minimum size become concepts.
    fn learn_concepts(
        &self,
        terms: &HashMap<String, TermStats>,
        stop_words: &HashSet<String>,
    ) -> Vec<DomainConcept> {
        let mut prefix_groups: HashMap<String, Vec<String>> = HashMap::new();
        let mut suffix_groups: HashMap<String, Vec<String>> = HashMap::new();

        for term in terms.keys() {
            if stop_words.contains(term) {
                continue;
            }
            for len in self.config.affix_min_len..=self.config.affix_max_len {
                // Affix must be a proper part of the term.
                if term.len() <= len {
                    break;
                }
                prefix_groups
                    .entry(term[..len].to_string())
                    .or_default()
                    .push(term.clone());
                suffix_groups
                    .entry(term[term.len() - len..].to_string())
                    .or_default()
                    .push(term.clone());
            }
        }

        let mut concepts = Vec::new();
        for (is_prefix, groups) in [(true, prefix_groups), (false, suffix_groups)] {
            for (affix, mut members) in groups {
                if members.len() < self.config.min_concept_group {
                    continue;
                }
                members.sort();
                members.dedup();
                if members.len() >= self.config.min_concept_group {
                    concepts.push(DomainConcept {
                        affix,
                        is_prefix,
                        terms: members,
                    });
                }
            }
        }
        // Longest affixes first: more specific naming families are more useful
        // expansion sources than short common fragments.
        concepts.sort_by(|a, b| b.affix.len().cmp(&a.affix.len()).then(a.affix.cmp(&b.affix)));
        concepts
    }
}

/// Stable slot per term: sorted enumeration, so the same vocabulary always
/// maps the same term to the same embedding slot.
fn assign_slots(terms: &mut HashMap<String, TermStats>) {
    let mut names: Vec<String> = terms.keys().cloned().collect();
    names.sort();
    for (slot, name) in names.into_iter().enumerate() {
        if let Some(stats) = terms.get_mut(&name) {
            stats.slot = slot as u32;
        }
    }
}
