//! Cycle detection over the reverse dependency graph.
//!
//! `detect_cycles` is a two-step heuristic: a Kahn reduction finds every node
//! that can never be ordered, then a refinement pass drops candidates that
//! merely depend on a cycle. `cycle_groups` computes exact strongly connected
//! components for reporting.
use super::DependencyGraph;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Nodes whose in-degree never reaches zero under reverse-graph reduction.
#[must_use]
pub fn cycle_candidates(graph: &DependencyGraph<'_>) -> BTreeSet<String> {
    let reverse = graph.reverse_adjacency();
    let mut remaining = graph.dependency_counts();
    let mut queue: VecDeque<&str> =
        remaining.iter().filter(|(_, d)| **d == 0).map(|(n, _)| *n).collect();

    let mut processed = 0usize;
    while let Some(u) = queue.pop_front() {
        processed += 1;
        for &v in reverse.get(u).map_or(&[][..], Vec::as_slice) {
            if let Some(d) = remaining.get_mut(v) {
                *d -= 1;
                if *d == 0 {
                    queue.push_back(v);
                }
            }
        }
    }

    let candidates: BTreeSet<String> =
        remaining.iter().filter(|(_, d)| **d > 0).map(|(n, _)| n.to_string()).collect();
    if !candidates.is_empty() {
        tracing::warn!(processed, expected = graph.len(), "cycle detected in dependencies");
        for node in &candidates {
            tracing::warn!(module = %node, remaining = remaining.get(node.as_str()).copied().unwrap_or(0), "cycle candidate");
        }
    }
    candidates
}

/// Shrink `candidates` to the nodes depended upon by some remaining
/// candidate, repeating until nothing changes.
#[must_use]
pub fn refine_candidates(graph: &DependencyGraph<'_>, mut candidates: BTreeSet<String>) -> BTreeSet<String> {
    if candidates.is_empty() {
        return candidates;
    }
    tracing::debug!(candidates = candidates.len(), "refining cycle candidates");
    let mut iteration = 0usize;
    loop {
        iteration += 1;
        // A self-dependency counts: the node depends on itself.
        let unused: Vec<String> = candidates
            .iter()
            .filter(|node| !candidates.iter().any(|other| graph.depends_on(other, node)))
            .cloned()
            .collect();
        if unused.is_empty() {
            tracing::debug!(iteration, "cycle set stable");
            break;
        }
        tracing::debug!(iteration, removed = ?unused, "dropping candidates not depended upon within the set");
        for node in &unused {
            candidates.remove(node);
        }
    }
    tracing::debug!(cycles = candidates.len(), "refined cycle set");
    candidates
}

/// The refined cycle set for `graph`.
#[must_use]
pub fn detect_cycles(graph: &DependencyGraph<'_>) -> BTreeSet<String> {
    refine_candidates(graph, cycle_candidates(graph))
}

/// Exact cycles: strongly connected components with more than one member,
/// plus single nodes that depend on themselves. Members and groups are sorted.
#[must_use]
pub fn cycle_groups(graph: &DependencyGraph<'_>) -> Vec<Vec<String>> {
    let mut g: DiGraph<&str, ()> = DiGraph::new();
    let index: BTreeMap<&str, NodeIndex> = graph.nodes().map(|n| (n, g.add_node(n))).collect();
    for edge in graph.edges() {
        if let (Some(&a), Some(&b)) = (index.get(edge.from), index.get(edge.to)) {
            g.add_edge(a, b, ());
        }
    }

    let mut groups: Vec<Vec<String>> = tarjan_scc(&g)
        .into_iter()
        .filter(|scc| scc.len() > 1 || scc.iter().any(|&n| g.contains_edge(n, n)))
        .map(|scc| {
            let mut members: Vec<String> = scc.iter().map(|&n| g[n].to_string()).collect();
            members.sort();
            members
        })
        .collect();
    groups.sort();
    groups
}
