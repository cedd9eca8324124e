use crate::types::{SymbolGraph, SymbolNode};
use crate::{CallEdge, GraphError, Result};
use petgraph::graph::NodeIndex;
use quarry_protocol::{CallSite, SNAPSHOT_VERSION};
use serde::{Deserialize, Serialize};

/// Serializable flattening of a [`SymbolGraph`]. Edges reference nodes by
/// position in the `nodes` vector; name maps are rebuilt on import. The
/// version tag is checked on import and a mismatch fails fast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolGraphSnapshot {
    pub version: u32,
    pub(crate) nodes: Vec<SymbolNode>,
    pub(crate) edges: Vec<(usize, usize, CallEdge)>,
    pub(crate) call_sites: Vec<(String, Vec<CallSite>)>,
}

impl SymbolGraph {
    /// Export the full graph state.
    #[must_use]
    pub fn export(&self) -> SymbolGraphSnapshot {
        let nodes: Vec<SymbolNode> = self.graph.node_weights().cloned().collect();
        let mut edges: Vec<(usize, usize, CallEdge)> = self
            .graph
            .edge_indices()
            .filter_map(|edge| {
                let (from, to) = self.graph.edge_endpoints(edge)?;
                Some((from.index(), to.index(), self.graph[edge].clone()))
            })
            .collect();
        edges.sort_by_key(|(from, to, _)| (*from, *to));

        let mut call_sites: Vec<(String, Vec<CallSite>)> = self
            .call_sites
            .iter()
            .map(|(name, sites)| (name.clone(), sites.clone()))
            .collect();
        call_sites.sort_by(|a, b| a.0.cmp(&b.0));

        SymbolGraphSnapshot {
            version: SNAPSHOT_VERSION,
            nodes,
            edges,
            call_sites,
        }
    }

    /// Rebuild a graph from a snapshot.
    pub fn import(snapshot: SymbolGraphSnapshot) -> Result<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(GraphError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                actual: snapshot.version,
            });
        }

        let mut graph = SymbolGraph::new();
        let mut indices: Vec<NodeIndex> = Vec::with_capacity(snapshot.nodes.len());
        for node in snapshot.nodes {
            let name = node.name.clone();
            let key = node
                .record
                .as_ref()
                .map(|r| format!("{}@{}", r.name, r.file));
            let idx = graph.graph.add_node(node);
            graph.by_name.entry(name).or_insert(idx);
            if let Some(key) = key {
                graph.by_key.insert(key, idx);
            }
            indices.push(idx);
        }
        for (from, to, edge) in snapshot.edges {
            let (Some(&from), Some(&to)) = (indices.get(from), indices.get(to)) else {
                return Err(GraphError::SymbolNotFound(format!(
                    "snapshot edge references node {from} or {to} out of range"
                )));
            };
            graph.graph.add_edge(from, to, edge);
        }
        graph.call_sites = snapshot.call_sites.into_iter().collect();

        log::info!(
            "Imported symbol graph: {} symbols, {} edges",
            graph.symbol_count(),
            graph.edge_count()
        );
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_protocol::{ParsedSymbol, SymbolKind};

    fn sample_graph() -> SymbolGraph {
        let mut graph = SymbolGraph::new();
        graph.add_symbol(
            "heap.c",
            &ParsedSymbol {
                name: "heap_insert".to_string(),
                kind: SymbolKind::Function,
                line: 12,
                signature: "int heap_insert(Heap *h, int v)".to_string(),
            },
        );
        graph.add_symbol(
            "main.c",
            &ParsedSymbol {
                name: "main".to_string(),
                kind: SymbolKind::Function,
                line: 1,
                signature: "int main(void)".to_string(),
            },
        );
        graph.add_call("main", "heap_insert");
        graph.add_call("heap_insert", "memcpy");
        graph.attach_call_sites(
            "heap_insert",
            vec![CallSite {
                file: "main.c".to_string(),
                line: 4,
                column: 8,
                line_text: "    heap_insert(h, 7);".to_string(),
            }],
        );
        graph
    }

    #[test]
    fn round_trip_preserves_structure() {
        let graph = sample_graph();
        let json = serde_json::to_string(&graph.export()).unwrap();
        let snapshot: SymbolGraphSnapshot = serde_json::from_str(&json).unwrap();
        let imported = SymbolGraph::import(snapshot).unwrap();

        assert_eq!(imported.symbol_count(), graph.symbol_count());
        assert_eq!(imported.edge_count(), graph.edge_count());
        assert_eq!(imported.callers_of("heap_insert"), vec!["main"]);
        assert_eq!(imported.callees_of("heap_insert"), vec!["memcpy"]);
        assert_eq!(
            imported.get_symbol_in_file("heap_insert", "heap.c").map(|r| r.line),
            Some(12)
        );
        assert_eq!(imported.trace_symbol("heap_insert").call_sites.len(), 1);
    }

    #[test]
    fn placeholder_nodes_survive_round_trip() {
        let graph = sample_graph();
        let imported = SymbolGraph::import(graph.export()).unwrap();
        // memcpy was only ever a callee; no record, still reachable by edge.
        assert!(imported.get_symbol("memcpy").is_none());
        assert_eq!(imported.callers_of("memcpy"), vec!["heap_insert"]);
    }

    #[test]
    fn version_mismatch_fails_fast() {
        let mut snapshot = sample_graph().export();
        snapshot.version += 1;
        let Err(err) = SymbolGraph::import(snapshot) else {
            panic!("import accepted a mismatched snapshot version");
        };
        assert!(matches!(err, GraphError::VersionMismatch { .. }));
    }
}
