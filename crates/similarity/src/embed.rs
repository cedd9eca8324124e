use quarry_vocabulary::{split_identifier, Vocabulary};
use std::collections::HashMap;
use std::sync::Arc;

/// Embedding strategy. Selected once per corpus snapshot via
/// [`Embedder::select`]; a non-empty vocabulary switches on the weighted path.
pub enum Embedder {
    /// Each known term contributes `tf * idf` into its stable slot.
    VocabularyWeighted {
        vocabulary: Arc<Vocabulary>,
        dimension: usize,
    },
    /// Content-hash fallback used before a vocabulary exists: words, adjacent
    /// word pairs and overlapping 3-char sub-tokens hashed into slots with
    /// decreasing weight.
    Hashed { dimension: usize },
}

const WORD_WEIGHT: f32 = 1.0;
const PAIR_WEIGHT: f32 = 0.6;
const SUBTOKEN_WEIGHT: f32 = 0.3;

impl Embedder {
    /// Pick the strategy for a (possibly absent) vocabulary.
    #[must_use]
    pub fn select(vocabulary: Option<Arc<Vocabulary>>, dimension: usize) -> Self {
        match vocabulary {
            Some(v) if !v.is_empty() => Self::VocabularyWeighted {
                vocabulary: v,
                dimension,
            },
            _ => Self::Hashed { dimension },
        }
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        match self {
            Self::VocabularyWeighted { dimension, .. } | Self::Hashed { dimension } => *dimension,
        }
    }

    /// Embed text into an L2-normalized fixed-dimension vector. All-stop-word
    /// or empty input produces the zero vector.
    #[must_use]
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension()];
        match self {
            Self::VocabularyWeighted {
                vocabulary,
                dimension,
            } => {
                let mut counts: HashMap<String, usize> = HashMap::new();
                for word in words_of(text) {
                    for part in split_identifier(&word) {
                        if !vocabulary.is_stop_word(&part) {
                            *counts.entry(part).or_insert(0) += 1;
                        }
                    }
                }
                for (term, count) in counts {
                    // Unknown terms have zero idf and would contribute nothing.
                    let Some(slot) = vocabulary.term_slot(&term) else {
                        continue;
                    };
                    let tf = (1.0 + count as f32).ln();
                    vector[slot as usize % dimension] += tf * vocabulary.idf(&term);
                }
            }
            Self::Hashed { dimension } => {
                let words: Vec<String> = words_of(text).collect();
                for word in &words {
                    vector[djb2(word) as usize % dimension] += WORD_WEIGHT;
                    for sub in subtokens(word) {
                        vector[djb2(&sub) as usize % dimension] += SUBTOKEN_WEIGHT;
                    }
                }
                for pair in words.windows(2) {
                    let joined = format!("{} {}", pair[0], pair[1]);
                    vector[djb2(&joined) as usize % dimension] += PAIR_WEIGHT;
                }
            }
        }
        l2_normalize(&mut vector);
        vector
    }
}

fn words_of(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .filter(|w| w.len() >= 2)
        .map(str::to_lowercase)
}

/// Overlapping 3-character windows of a word.
fn subtokens(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    if chars.len() < 3 {
        return Vec::new();
    }
    chars.windows(3).map(|w| w.iter().collect()).collect()
}

/// Classic djb2 string hash.
fn djb2(s: &str) -> u64 {
    let mut hash: u64 = 5381;
    for b in s.bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(u64::from(b));
    }
    hash
}

fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

/// Cosine similarity of two equal-length vectors. Zero vectors yield 0.0.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
