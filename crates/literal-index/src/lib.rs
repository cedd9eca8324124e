//! # Quarry Literal Index
//!
//! Exact and regex substring search over raw file text, plus a pre-built
//! function-call-site index. Raw content and a per-file line table give O(1)
//! line/column recovery from a character offset; the call-site map turns
//! "who calls X" into a lookup instead of a corpus rescan.
//!
//! Independent of the learned vocabulary by design: literal search must work
//! on exactly what is in the files.

mod call_sites;
mod files;
mod search;

pub use call_sites::{CallSearchOptions, DEFINITION_PATTERNS};
pub use files::FileEntry;
pub use search::{LiteralMatch, LiteralSearchOptions, RegexOutcome};

use quarry_protocol::{CallSite, SourceFile};
use std::collections::HashMap;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LiteralError>;

#[derive(Error, Debug)]
pub enum LiteralError {
    #[error("Unknown file: {0}")]
    UnknownFile(String),
}

/// Raw-text index over a corpus snapshot.
pub struct LiteralIndex {
    pub(crate) files: HashMap<String, FileEntry>,
    /// Callee name -> every call site observed at build time.
    pub(crate) call_sites: HashMap<String, Vec<CallSite>>,
}

impl LiteralIndex {
    #[must_use]
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
            call_sites: HashMap::new(),
        }
    }

    /// Build from a full snapshot, replacing any previous state.
    pub fn build(&mut self, files: &[SourceFile]) {
        self.files.clear();
        self.call_sites.clear();
        for file in files {
            self.add_file(file);
        }
        log::info!(
            "Literal index built: {} files, {} distinct callees",
            self.files.len(),
            self.call_sites.len()
        );
    }

    /// Add (or replace) one file, re-deriving its call sites.
    pub fn add_file(&mut self, file: &SourceFile) {
        if self.files.contains_key(&file.path) {
            let _ = self.remove_file(&file.path);
        }
        let entry = FileEntry::new(&file.content);
        call_sites::scan_file(&file.path, &entry, &mut self.call_sites);
        self.files.insert(file.path.clone(), entry);
    }

    /// Remove a file and all call sites recorded from it.
    pub fn remove_file(&mut self, path: &str) -> Result<()> {
        self.files
            .remove(path)
            .ok_or_else(|| LiteralError::UnknownFile(path.to_string()))?;
        self.call_sites.retain(|_, sites| {
            sites.retain(|s| s.file != path);
            !sites.is_empty()
        });
        Ok(())
    }

    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    #[must_use]
    pub fn file(&self, path: &str) -> Option<&FileEntry> {
        self.files.get(path)
    }

    /// Paths currently indexed, sorted for deterministic iteration.
    #[must_use]
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.files.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }
}

impl Default for LiteralIndex {
    fn default() -> Self {
        Self::new()
    }
}
