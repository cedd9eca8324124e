use crate::types::SymbolGraph;
use crate::SymbolRecord;
use petgraph::graph::NodeIndex;
use petgraph::Direction;
use quarry_protocol::CallSite;
use std::collections::HashSet;

/// Traversal direction over the call graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraversalDirection {
    /// Follow calls outward: who does this call (callees).
    Callees,
    /// Follow calls inward: who calls this (callers).
    Callers,
    /// Both directions at once.
    Both,
}

impl TraversalDirection {
    fn petgraph_directions(self) -> &'static [Direction] {
        match self {
            Self::Callees => &[Direction::Outgoing],
            Self::Callers => &[Direction::Incoming],
            Self::Both => &[Direction::Outgoing, Direction::Incoming],
        }
    }
}

/// Everything known about one symbol's neighborhood.
#[derive(Debug, Clone)]
pub struct SymbolTrace {
    pub symbol: Option<SymbolRecord>,
    pub callers: Vec<String>,
    pub callees: Vec<String>,
    pub call_sites: Vec<CallSite>,
}

/// Bounded-depth neighborhood extraction result.
#[derive(Debug, Clone, Default)]
pub struct Subgraph {
    pub nodes: Vec<String>,
    pub edges: Vec<(String, String)>,
}

/// One caller-to-callee path, endpoints included.
pub type CallPath = Vec<String>;

impl SymbolGraph {
    /// Direct callers of a symbol, sorted.
    #[must_use]
    pub fn callers_of(&self, name: &str) -> Vec<String> {
        self.neighbor_names(name, Direction::Incoming)
    }

    /// Direct callees of a symbol, sorted.
    #[must_use]
    pub fn callees_of(&self, name: &str) -> Vec<String> {
        self.neighbor_names(name, Direction::Outgoing)
    }

    fn neighbor_names(&self, name: &str, direction: Direction) -> Vec<String> {
        let Some(&idx) = self.by_name.get(name) else {
            return Vec::new();
        };
        let mut names: Vec<String> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].name.clone())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Symbol record, direct callers/callees and any attached call sites.
    #[must_use]
    pub fn trace_symbol(&self, name: &str) -> SymbolTrace {
        SymbolTrace {
            symbol: self.get_symbol(name).cloned(),
            callers: self.callers_of(name),
            callees: self.callees_of(name),
            call_sites: self
                .call_sites
                .get(name)
                .cloned()
                .unwrap_or_default(),
        }
    }

    /// Bounded neighborhood around `start`. An explicit worklist with a
    /// `(node, direction)` visited set keeps termination obvious and lets a
    /// node be reached once per direction when traversing both ways.
    #[must_use]
    pub fn build_subgraph(
        &self,
        start: &str,
        max_depth: usize,
        direction: TraversalDirection,
    ) -> Subgraph {
        let Some(&root) = self.by_name.get(start) else {
            return Subgraph::default();
        };

        let mut visited: HashSet<(NodeIndex, Direction)> = HashSet::new();
        let mut nodes: Vec<String> = Vec::new();
        let mut node_set: HashSet<NodeIndex> = HashSet::new();
        let mut edges: Vec<(String, String)> = Vec::new();
        let mut worklist: Vec<(NodeIndex, usize)> = vec![(root, 0)];

        if node_set.insert(root) {
            nodes.push(self.graph[root].name.clone());
        }

        while let Some((current, depth)) = worklist.pop() {
            if depth >= max_depth {
                continue;
            }
            for &dir in direction.petgraph_directions() {
                if !visited.insert((current, dir)) {
                    continue;
                }
                for neighbor in self.graph.neighbors_directed(current, dir) {
                    let (from, to) = match dir {
                        Direction::Outgoing => (current, neighbor),
                        Direction::Incoming => (neighbor, current),
                    };
                    let edge = (self.graph[from].name.clone(), self.graph[to].name.clone());
                    if !edges.contains(&edge) {
                        edges.push(edge);
                    }
                    if node_set.insert(neighbor) {
                        nodes.push(self.graph[neighbor].name.clone());
                    }
                    worklist.push((neighbor, depth + 1));
                }
            }
        }

        nodes.sort();
        edges.sort();
        Subgraph { nodes, edges }
    }

    /// Functions nobody calls that call at least one thing themselves.
    #[must_use]
    pub fn find_entry_points(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .next()
                    .is_none()
                    && self
                        .graph
                        .neighbors_directed(idx, Direction::Outgoing)
                        .next()
                        .is_some()
            })
            .map(|idx| self.graph[idx].name.clone())
            .collect();
        out.sort();
        out
    }

    /// Called functions that call nothing themselves.
    #[must_use]
    pub fn find_leaf_functions(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Outgoing)
                    .next()
                    .is_none()
                    && self
                        .graph
                        .neighbors_directed(idx, Direction::Incoming)
                        .next()
                        .is_some()
            })
            .map(|idx| self.graph[idx].name.clone())
            .collect();
        out.sort();
        out
    }

    /// All call paths from `from` to `to` up to `max_depth` edges, shortest
    /// first. Bounded DFS; the visited set is popped on backtrack so sibling
    /// branches through a shared node each get their own path.
    #[must_use]
    pub fn find_call_path(&self, from: &str, to: &str, max_depth: usize) -> Vec<CallPath> {
        let (Some(&start), Some(&goal)) = (self.by_name.get(from), self.by_name.get(to)) else {
            return Vec::new();
        };

        let mut paths: Vec<CallPath> = Vec::new();
        let mut on_path: HashSet<NodeIndex> = HashSet::new();
        let mut path: Vec<NodeIndex> = Vec::new();
        self.dfs_paths(start, goal, max_depth, &mut on_path, &mut path, &mut paths);
        paths.sort_by_key(Vec::len);
        paths
    }

    fn dfs_paths(
        &self,
        current: NodeIndex,
        goal: NodeIndex,
        max_depth: usize,
        on_path: &mut HashSet<NodeIndex>,
        path: &mut Vec<NodeIndex>,
        out: &mut Vec<CallPath>,
    ) {
        path.push(current);
        on_path.insert(current);

        if current == goal && path.len() > 1 {
            out.push(path.iter().map(|&idx| self.graph[idx].name.clone()).collect());
        } else if current == goal && path.len() == 1 {
            // from == to: only a real cycle qualifies. Allow the goal to be
            // re-entered once by keeping it off the visited set here.
            on_path.remove(&current);
            for neighbor in self.graph.neighbors_directed(current, Direction::Outgoing) {
                if path.len() <= max_depth && !on_path.contains(&neighbor) {
                    self.dfs_paths(neighbor, goal, max_depth, on_path, path, out);
                }
            }
            on_path.insert(current);
        } else if path.len() <= max_depth {
            for neighbor in self.graph.neighbors_directed(current, Direction::Outgoing) {
                if !on_path.contains(&neighbor) {
                    self.dfs_paths(neighbor, goal, max_depth, on_path, path, out);
                }
            }
        }

        path.pop();
        on_path.remove(&current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quarry_protocol::{ParsedSymbol, SymbolKind};
    use std::collections::HashMap;

    fn graph_of(edges: &[(&str, &str)]) -> SymbolGraph {
        let mut symbols: HashMap<String, Vec<ParsedSymbol>> = HashMap::new();
        let mut calls: HashMap<String, Vec<String>> = HashMap::new();
        let mut names: Vec<&str> = Vec::new();
        for (from, to) in edges {
            for name in [from, to] {
                if !names.contains(name) {
                    names.push(name);
                }
            }
            calls
                .entry((*from).to_string())
                .or_default()
                .push((*to).to_string());
        }
        for (i, name) in names.iter().enumerate() {
            symbols
                .entry(format!("f{i}.c"))
                .or_default()
                .push(ParsedSymbol {
                    name: (*name).to_string(),
                    kind: SymbolKind::Function,
                    line: 1,
                    signature: format!("{name}()"),
                });
        }
        SymbolGraph::build(&symbols, &calls)
    }

    #[test]
    fn callers_and_callees_are_mirrored() {
        let graph = graph_of(&[("main", "parse"), ("main", "run"), ("run", "parse")]);
        assert_eq!(graph.callees_of("main"), vec!["parse", "run"]);
        assert_eq!(graph.callers_of("parse"), vec!["main", "run"]);
        assert!(graph.callers_of("main").is_empty());
    }

    #[test]
    fn trace_combines_record_and_neighbors() {
        let graph = graph_of(&[("main", "parse")]);
        let trace = graph.trace_symbol("parse");
        assert!(trace.symbol.is_some());
        assert_eq!(trace.callers, vec!["main"]);
        assert!(trace.callees.is_empty());
    }

    #[test]
    fn unknown_symbol_traces_empty_not_error() {
        let graph = graph_of(&[("a", "b")]);
        let trace = graph.trace_symbol("missing");
        assert!(trace.symbol.is_none());
        assert!(trace.callers.is_empty() && trace.callees.is_empty());
    }

    #[test]
    fn subgraph_respects_depth_and_direction() {
        let graph = graph_of(&[("a", "b"), ("b", "c"), ("c", "d")]);
        let one = graph.build_subgraph("a", 1, TraversalDirection::Callees);
        assert_eq!(one.nodes, vec!["a", "b"]);

        let two = graph.build_subgraph("a", 2, TraversalDirection::Callees);
        assert_eq!(two.nodes, vec!["a", "b", "c"]);

        let up = graph.build_subgraph("d", 2, TraversalDirection::Callers);
        assert_eq!(up.nodes, vec!["b", "c", "d"]);
    }

    #[test]
    fn subgraph_terminates_on_cycles() {
        let graph = graph_of(&[("a", "b"), ("b", "a")]);
        let sub = graph.build_subgraph("a", 10, TraversalDirection::Both);
        assert_eq!(sub.nodes, vec!["a", "b"]);
    }

    #[test]
    fn entry_points_and_leaves() {
        let graph = graph_of(&[("main", "parse"), ("parse", "emit")]);
        assert_eq!(graph.find_entry_points(), vec!["main"]);
        assert_eq!(graph.find_leaf_functions(), vec!["emit"]);
    }

    #[test]
    fn call_paths_find_all_routes_shortest_first() {
        // Two routes from a to d: a->d and a->b->c->d, sharing no middle, plus
        // a->b->d sharing node b with the longer route.
        let graph = graph_of(&[
            ("a", "d"),
            ("a", "b"),
            ("b", "d"),
            ("b", "c"),
            ("c", "d"),
        ]);
        let paths = graph.find_call_path("a", "d", 5);
        assert_eq!(paths.len(), 3);
        assert_eq!(paths[0], vec!["a", "d"]);
        assert_eq!(paths[1], vec!["a", "b", "d"]);
        assert_eq!(paths[2], vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn call_paths_respect_depth_bound() {
        let graph = graph_of(&[("a", "b"), ("b", "c"), ("c", "d")]);
        assert!(graph.find_call_path("a", "d", 2).is_empty());
        assert_eq!(graph.find_call_path("a", "d", 3).len(), 1);
    }
}
