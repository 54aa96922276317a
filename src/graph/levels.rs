//! Leaves-first leveling.
//!
//! Levels come out of a layered Kahn reduction over the reverse graph, in
//! three phases: acyclic nodes that can be ordered before any cycle, one
//! merged level holding the whole cycle set, then everything that was
//! waiting on the cycle set. Two nodes that depend on each other and land
//! in the same level are reported as a single `A <-> B` entry.
use super::cycles::detect_cycles;
use super::DependencyGraph;
use crate::errors::DepgraphError;
use std::collections::{BTreeMap, BTreeSet};

/// One line of a level: a module, or a pair of modules depending on each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelEntry {
    Single(String),
    Pair(String, String),
}

impl LevelEntry {
    pub fn members(&self) -> Vec<&str> {
        match self {
            Self::Single(a) => vec![a.as_str()],
            Self::Pair(a, b) => vec![a.as_str(), b.as_str()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    pub index: usize,
    pub cyclic: bool,
    pub entries: Vec<LevelEntry>,
}

impl Level {
    /// `Level 3`, or `Level 3 (Cycles)` for the cycle level.
    pub fn label(&self) -> String {
        if self.cyclic {
            format!("Level {} (Cycles)", self.index)
        } else {
            format!("Level {}", self.index)
        }
    }

    /// Identities in this level, in entry order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().flat_map(LevelEntry::members)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Leveling {
    pub levels: Vec<Level>,
    /// Back-edge pairs keyed by the lexicographically smaller identity.
    pub bidirectional: BTreeMap<String, String>,
    /// The refined cycle set the leveling was computed with.
    pub cycles: BTreeSet<String>,
}

impl Leveling {
    /// Detect cycles in `graph` and level it.
    ///
    /// # Errors
    /// Returns `DepgraphError::Invariant` if leveling bookkeeping breaks.
    pub fn compute(graph: &DependencyGraph<'_>) -> Result<Self, DepgraphError> {
        let cycles = detect_cycles(graph);
        sequence(graph, &cycles)
    }

    /// Index of the level holding `id`.
    pub fn level_of(&self, id: &str) -> Option<usize> {
        self.levels.iter().find(|l| l.nodes().any(|n| n == id)).map(|l| l.index)
    }
}

/// Pairs of internal nodes that depend on each other, keyed by the smaller
/// identity. When a node has several partners the first one in edge order
/// is kept.
#[must_use]
pub fn bidirectional_pairs(graph: &DependencyGraph<'_>) -> BTreeMap<String, String> {
    let internal = |id: &str| graph.classification(id).is_some_and(|c| c.is_internal());
    let mut pairs: BTreeMap<String, String> = BTreeMap::new();
    for edge in graph.edges() {
        if edge.from == edge.to || !internal(edge.from) || !internal(edge.to) {
            continue;
        }
        if graph.depends_on(edge.to, edge.from) {
            let (a, b) = if edge.from < edge.to { (edge.from, edge.to) } else { (edge.to, edge.from) };
            pairs.entry(a.to_string()).or_insert_with(|| b.to_string());
        }
    }
    pairs
}

/// Sort `nodes` and pair up back-edge partners present in the same level.
fn level_entries(mut nodes: Vec<&str>, pairs: &BTreeMap<String, String>) -> Vec<LevelEntry> {
    nodes.sort_unstable();
    let present: BTreeSet<&str> = nodes.iter().copied().collect();
    let mut emitted: BTreeSet<&str> = BTreeSet::new();
    let mut entries = Vec::with_capacity(nodes.len());
    for node in nodes {
        if emitted.contains(node) {
            continue;
        }
        let partner = pairs
            .get(node)
            .map(String::as_str)
            .filter(|p| present.contains(p) && !emitted.contains(p));
        emitted.insert(node);
        match partner {
            Some(p) => {
                emitted.insert(p);
                entries.push(LevelEntry::Pair(node.to_string(), p.to_string()));
            }
            None => entries.push(LevelEntry::Single(node.to_string())),
        }
    }
    entries
}

/// Mutable state of the reduction.
struct Reduction<'g> {
    reverse: BTreeMap<&'g str, Vec<&'g str>>,
    remaining: BTreeMap<&'g str, usize>,
    processed: BTreeSet<&'g str>,
}

impl<'g> Reduction<'g> {
    /// Count one satisfied dependency of `node`; true once it has none left.
    fn satisfy(&mut self, node: &'g str, by: &str) -> Result<bool, DepgraphError> {
        let Some(d) = self.remaining.get_mut(node) else {
            return Err(DepgraphError::Invariant(format!("{node} is not a graph node (dependent of {by})")));
        };
        if *d == 0 {
            return Err(DepgraphError::Invariant(format!("in-degree of {node} would go negative after {by}")));
        }
        *d -= 1;
        Ok(*d == 0)
    }

    /// Mark `level` processed and return the dependents it releases.
    fn release(
        &mut self,
        level: &[&'g str],
        cycles: Option<&BTreeSet<String>>,
    ) -> Result<Vec<&'g str>, DepgraphError> {
        self.processed.extend(level.iter().copied());
        let mut next = Vec::new();
        for &u in level {
            let dependents = self.reverse.get(u).cloned().unwrap_or_default();
            for v in dependents {
                if self.processed.contains(v) || cycles.is_some_and(|c| c.contains(v)) {
                    continue;
                }
                if self.satisfy(v, u)? {
                    next.push(v);
                }
            }
        }
        next.sort_unstable();
        Ok(next)
    }
}

/// Level `graph` leaves first, collapsing `cycles` into one level.
///
/// # Errors
/// Returns `DepgraphError::Invariant` if an in-degree would go negative or
/// if some node never gets a level. Either one is a bug in graph
/// construction, not a property of the input.
pub fn sequence(graph: &DependencyGraph<'_>, cycles: &BTreeSet<String>) -> Result<Leveling, DepgraphError> {
    let bidirectional = bidirectional_pairs(graph);
    let mut red = Reduction {
        reverse: graph.reverse_adjacency(),
        remaining: graph.dependency_counts(),
        processed: BTreeSet::new(),
    };
    let mut levels: Vec<Level> = Vec::new();
    let push = |nodes: Vec<&str>, cyclic: bool, levels: &mut Vec<Level>| {
        let index = levels.len();
        tracing::debug!(index, cyclic, nodes = nodes.len(), "level");
        levels.push(Level { index, cyclic, entries: level_entries(nodes, &bidirectional) });
    };

    // Pre-cycle levels
    let mut ready: Vec<&str> = red
        .remaining
        .iter()
        .filter(|(n, d)| **d == 0 && !cycles.contains(**n))
        .map(|(n, _)| *n)
        .collect();
    while !ready.is_empty() {
        let next = red.release(&ready, Some(cycles))?;
        push(std::mem::replace(&mut ready, next), false, &mut levels);
    }

    // Cycle level
    let cycle_nodes: Vec<&str> = graph.nodes().filter(|n| cycles.contains(*n)).collect();
    if !cycle_nodes.is_empty() {
        ready = red.release(&cycle_nodes, None)?;
        push(cycle_nodes, true, &mut levels);
    }

    // Post-cycle levels
    while !ready.is_empty() {
        let next = red.release(&ready, None)?;
        push(std::mem::replace(&mut ready, next), false, &mut levels);
    }

    if red.processed.len() != graph.len() {
        let missing: Vec<&str> = graph.nodes().filter(|n| !red.processed.contains(n)).collect();
        return Err(DepgraphError::Invariant(format!(
            "leveled {} of {} nodes; never leveled: {}",
            red.processed.len(),
            graph.len(),
            missing.join(", ")
        )));
    }
    tracing::info!(levels = levels.len(), nodes = graph.len(), cycles = cycles.len(), "leveling complete");
    Ok(Leveling { levels, bidirectional, cycles: cycles.clone() })
}
