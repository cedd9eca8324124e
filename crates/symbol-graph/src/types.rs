use petgraph::graph::{DiGraph, NodeIndex};
use quarry_protocol::{CallGraphInput, CallSite, ParsedSymbol, SymbolKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One known symbol: definition location plus an optional generated summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolRecord {
    pub name: String,
    pub kind: SymbolKind,
    pub file: String,
    /// 1-based definition line.
    pub line: u32,
    pub signature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Caller -> callee relation. Call-site locations are attached separately
/// from the literal index when available.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallEdge {
    /// How many times the host reported this relation.
    pub count: u32,
}

/// Node payload: every name seen in the call graph gets a node; names the
/// parser never defined (externals, libc calls) carry no record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SymbolNode {
    pub(crate) name: String,
    pub(crate) record: Option<SymbolRecord>,
}

/// Symbol table plus call graph over a corpus snapshot.
pub struct SymbolGraph {
    pub(crate) graph: DiGraph<SymbolNode, CallEdge>,
    /// Bare name -> node. First writer wins; later definitions of the same
    /// bare name are reachable through the exact key only.
    pub(crate) by_name: HashMap<String, NodeIndex>,
    /// `name@file` -> defining node, exact identity.
    pub(crate) by_key: HashMap<String, NodeIndex>,
    /// Callee name -> concrete call sites, attached from the literal index.
    pub(crate) call_sites: HashMap<String, Vec<CallSite>>,
}

impl SymbolGraph {
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            by_name: HashMap::new(),
            by_key: HashMap::new(),
            call_sites: HashMap::new(),
        }
    }

    /// Build from the host's parse output: per-file symbol lists and a
    /// caller -> callees name adjacency.
    #[must_use]
    pub fn build(
        symbols: &HashMap<String, Vec<ParsedSymbol>>,
        calls: &CallGraphInput,
    ) -> Self {
        let mut graph = Self::new();
        // Sorted iteration keeps "first writer wins" deterministic.
        let mut files: Vec<&String> = symbols.keys().collect();
        files.sort();
        for file in files {
            for parsed in &symbols[file] {
                graph.add_symbol(file, parsed);
            }
        }

        let mut callers: Vec<&String> = calls.keys().collect();
        callers.sort();
        for caller in callers {
            for callee in &calls[caller] {
                graph.add_call(caller, callee);
            }
        }

        log::info!(
            "Symbol graph built: {} nodes, {} edges",
            graph.graph.node_count(),
            graph.graph.edge_count()
        );
        graph
    }

    /// Register one symbol definition.
    pub fn add_symbol(&mut self, file: &str, parsed: &ParsedSymbol) {
        let record = SymbolRecord {
            name: parsed.name.clone(),
            kind: parsed.kind,
            file: file.to_string(),
            line: parsed.line,
            signature: parsed.signature.clone(),
            summary: None,
        };
        let key = format!("{}@{}", parsed.name, file);

        if let Some(&idx) = self.by_key.get(&key) {
            // Same identity re-added (incremental update): refresh the record.
            if let Some(node) = self.graph.node_weight_mut(idx) {
                node.record = Some(record);
            }
            return;
        }

        let idx = match self.by_name.get(&parsed.name) {
            // Bare name already taken by a node without a record (seen only
            // in call edges so far): claim it.
            Some(&idx) if self.graph[idx].record.is_none() => {
                self.graph[idx].record = Some(record);
                idx
            }
            // Bare name taken by another definition: new node, exact key only.
            Some(_) => self.graph.add_node(SymbolNode {
                name: parsed.name.clone(),
                record: Some(record),
            }),
            None => {
                let idx = self.graph.add_node(SymbolNode {
                    name: parsed.name.clone(),
                    record: Some(record),
                });
                self.by_name.insert(parsed.name.clone(), idx);
                idx
            }
        };
        self.by_key.insert(key, idx);
    }

    /// Record a caller -> callee relation, creating placeholder nodes for
    /// names with no known definition.
    pub fn add_call(&mut self, caller: &str, callee: &str) {
        let from = self.node_for_name(caller);
        let to = self.node_for_name(callee);
        if let Some(edge) = self.graph.find_edge(from, to) {
            self.graph[edge].count += 1;
        } else {
            self.graph.add_edge(from, to, CallEdge { count: 1 });
        }
    }

    fn node_for_name(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.by_name.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(SymbolNode {
            name: name.to_string(),
            record: None,
        });
        self.by_name.insert(name.to_string(), idx);
        idx
    }

    /// Attach concrete call-site locations for a callee.
    pub fn attach_call_sites(&mut self, callee: &str, sites: Vec<CallSite>) {
        if !sites.is_empty() {
            self.call_sites.insert(callee.to_string(), sites);
        }
    }

    /// Set a generated summary on a symbol, by bare name.
    pub fn set_summary(&mut self, name: &str, summary: String) -> crate::Result<()> {
        let idx = self
            .by_name
            .get(name)
            .copied()
            .ok_or_else(|| crate::GraphError::SymbolNotFound(name.to_string()))?;
        if let Some(record) = self
            .graph
            .node_weight_mut(idx)
            .and_then(|n| n.record.as_mut())
        {
            record.summary = Some(summary);
            Ok(())
        } else {
            Err(crate::GraphError::SymbolNotFound(name.to_string()))
        }
    }

    /// Convenience lookup by bare name (first writer wins).
    #[must_use]
    pub fn get_symbol(&self, name: &str) -> Option<&SymbolRecord> {
        self.by_name
            .get(name)
            .and_then(|idx| self.graph.node_weight(*idx))
            .and_then(|node| node.record.as_ref())
    }

    /// Exact-identity lookup.
    #[must_use]
    pub fn get_symbol_in_file(&self, name: &str, file: &str) -> Option<&SymbolRecord> {
        self.by_key
            .get(&format!("{name}@{file}"))
            .and_then(|idx| self.graph.node_weight(*idx))
            .and_then(|node| node.record.as_ref())
    }

    /// Remove every symbol defined in `file` and all edges touching them.
    pub fn remove_file(&mut self, file: &str) {
        let suffix = format!("@{file}");
        // petgraph's remove_node swaps the last index into the hole, so each
        // removal re-resolves through the rebuilt key map instead of holding
        // stale indices.
        loop {
            let Some(idx) = self
                .by_key
                .iter()
                .find(|(key, _)| key.ends_with(&suffix))
                .map(|(_, idx)| *idx)
            else {
                break;
            };
            let name = self.graph[idx].name.clone();
            self.graph.remove_node(idx);
            self.call_sites.remove(&name);
            self.rebuild_lookups();
        }
    }

    /// Recompute name maps after node removal shifted indices.
    fn rebuild_lookups(&mut self) {
        self.by_name.clear();
        self.by_key.clear();
        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            self.by_name.entry(node.name.clone()).or_insert(idx);
            if let Some(record) = &node.record {
                self.by_key
                    .insert(format!("{}@{}", record.name, record.file), idx);
            }
        }
    }

    #[must_use]
    pub fn symbol_count(&self) -> usize {
        self.by_key.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// All symbol records, for iteration by the planner.
    pub fn symbols(&self) -> impl Iterator<Item = &SymbolRecord> {
        self.graph
            .node_weights()
            .filter_map(|node| node.record.as_ref())
    }
}

impl Default for SymbolGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(name: &str, kind: SymbolKind, line: u32) -> ParsedSymbol {
        ParsedSymbol {
            name: name.to_string(),
            kind,
            line,
            signature: format!("{name}()"),
        }
    }

    #[test]
    fn bare_name_first_writer_wins_exact_key_disambiguates() {
        let mut graph = SymbolGraph::new();
        graph.add_symbol("a.c", &parsed("init", SymbolKind::Function, 1));
        graph.add_symbol("b.c", &parsed("init", SymbolKind::Function, 9));

        assert_eq!(graph.get_symbol("init").unwrap().file, "a.c");
        assert_eq!(graph.get_symbol_in_file("init", "b.c").unwrap().line, 9);
        assert_eq!(graph.symbol_count(), 2);
    }

    #[test]
    fn calls_to_unknown_names_create_placeholders() {
        let mut graph = SymbolGraph::new();
        graph.add_symbol("a.c", &parsed("main", SymbolKind::Function, 1));
        graph.add_call("main", "printf");
        assert!(graph.get_symbol("printf").is_none());
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn remove_file_drops_symbols_and_edges() {
        let mut graph = SymbolGraph::new();
        graph.add_symbol("a.c", &parsed("alpha", SymbolKind::Function, 1));
        graph.add_symbol("b.c", &parsed("beta", SymbolKind::Function, 1));
        graph.add_call("alpha", "beta");
        graph.remove_file("a.c");

        assert!(graph.get_symbol("alpha").is_none());
        assert!(graph.get_symbol("beta").is_some());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn repeated_calls_increment_edge_count() {
        let mut graph = SymbolGraph::new();
        graph.add_call("a", "b");
        graph.add_call("a", "b");
        assert_eq!(graph.edge_count(), 1);
    }
}
