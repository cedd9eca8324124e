use crate::index::{DocumentEntry, KeywordIndex, Posting};
use crate::{IndexError, Result};
use quarry_protocol::SNAPSHOT_VERSION;
use quarry_vocabulary::Vocabulary;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Plain serializable export of a [`KeywordIndex`]. The version tag is
/// checked on import; a mismatch fails fast instead of best-effort coercion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordIndexSnapshot {
    pub version: u32,
    pub(crate) documents: Vec<(u32, DocumentEntry)>,
    pub(crate) postings: Vec<(String, Vec<Posting>)>,
    pub(crate) next_doc: u32,
}

impl KeywordIndex {
    /// Export the full index state.
    #[must_use]
    pub fn export(&self) -> KeywordIndexSnapshot {
        let mut documents: Vec<(u32, DocumentEntry)> = self
            .documents
            .iter()
            .map(|(id, entry)| (*id, entry.clone()))
            .collect();
        documents.sort_by_key(|(id, _)| *id);

        let mut postings: Vec<(String, Vec<Posting>)> = self
            .postings
            .iter()
            .map(|(term, list)| (term.clone(), list.clone()))
            .collect();
        postings.sort_by(|a, b| a.0.cmp(&b.0));

        KeywordIndexSnapshot {
            version: SNAPSHOT_VERSION,
            documents,
            postings,
            next_doc: self.next_doc,
        }
    }

    /// Rebuild an index from a snapshot. The vocabulary is supplied by the
    /// caller; it is persisted separately as part of the engine snapshot.
    pub fn import(snapshot: KeywordIndexSnapshot, vocabulary: Arc<Vocabulary>) -> Result<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(IndexError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                actual: snapshot.version,
            });
        }

        let mut index = KeywordIndex::new(vocabulary);
        index.next_doc = snapshot.next_doc;
        for (id, entry) in snapshot.documents {
            index.id_of.insert(entry.external_id.clone(), id);
            index.documents.insert(id, entry);
        }
        index.postings = snapshot
            .postings
            .into_iter()
            .collect::<HashMap<String, Vec<Posting>>>();

        log::info!(
            "Imported keyword index: {} documents, {} terms",
            index.document_count(),
            index.term_count()
        );
        Ok(index)
    }
}
