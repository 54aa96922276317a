//! Dependency graph construction.
//!
//! `DependencyGraph::build` decides which module identities become nodes and
//! how each one is classified. Node selection runs four additive passes:
//!
//! 1. every resolved primary record is a node; its dependencies become
//!    "referenced";
//! 2. a secondary record (fork) qualifies when it depends on one of those
//!    primary nodes; qualification is tracked by origin location;
//! 3. a secondary record is a node when it qualifies or its identity is
//!    referenced; its own dependencies then become referenced too. This pass
//!    repeats until no more forks are added, so the result does not depend
//!    on record order;
//! 4. unless externals are excluded, every referenced identity without a
//!    resolved record becomes an external node.
//!
//! With externals excluded, forks that were only referenced (never
//! qualified) are dropped as well.
//!
//! Edges are implied by the dependencies of nodes that have a resolved
//! record, restricted to targets that are nodes. Every traversal below walks
//! identities in lexicographic order so results are stable run to run.
use crate::model::{ModuleRecord, ModuleSet};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub mod cycles;
pub mod levels;

/// How a node relates to the scanned input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Classification {
    /// Authoritative, non-fork declaration.
    Primary,
    /// Fork that depends on a primary node.
    SecondaryQualified,
    /// Fork included only because something references its identity.
    SecondaryUnqualified,
    /// Referenced identity with no resolved record.
    External,
}

impl Classification {
    /// Primary and qualified forks are treated as part of the internal set.
    #[must_use]
    pub fn is_internal(self) -> bool {
        matches!(self, Self::Primary | Self::SecondaryQualified)
    }
}

/// A dependency edge: `from` requires `to` at `version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Edge<'g> {
    pub from: &'g str,
    pub to: &'g str,
    pub version: &'g str,
}

#[derive(Debug, Clone)]
pub struct DependencyGraph<'m> {
    modules: &'m ModuleSet,
    nodes: BTreeMap<String, Classification>,
    qualifying: BTreeSet<String>,
}

impl<'m> DependencyGraph<'m> {
    /// Select and classify the nodes for one rendering of `modules`.
    #[must_use]
    pub fn build(modules: &'m ModuleSet, exclude_external: bool) -> Self {
        let mut nodes: BTreeMap<String, Classification> = BTreeMap::new();
        let mut referenced: BTreeSet<&str> = BTreeSet::new();
        let ids = modules.sorted_identities();
        let resolved = move |id: &str| modules.get(id).filter(|r| r.resolved);

        // Pass 1: primary records
        tracing::debug!("node selection pass 1: primary records");
        for &id in &ids {
            if let Some(rec) = resolved(id).filter(|r| !r.is_secondary) {
                tracing::trace!(module = id, "including primary");
                nodes.insert(id.to_string(), Classification::Primary);
                referenced.extend(rec.dependencies.keys().map(String::as_str));
            }
        }

        // Pass 2: forks that depend on a primary node
        tracing::debug!("node selection pass 2: qualifying forks");
        let forks: Vec<&ModuleRecord> =
            ids.iter().filter_map(|&id| resolved(id)).filter(|r| r.is_secondary).collect();
        let mut qualifying: BTreeSet<String> = BTreeSet::new();
        for rec in &forks {
            let dep = rec
                .dependencies
                .keys()
                .find(|d| nodes.get(d.as_str()) == Some(&Classification::Primary));
            if let Some(dep) = dep {
                tracing::trace!(
                    module = %rec.identity,
                    origin = %rec.origin_location,
                    via = %dep,
                    "fork qualifies"
                );
                qualifying.insert(rec.origin_location.clone());
            }
        }

        // Pass 3: qualifying or referenced forks, to a fixed point
        tracing::debug!("node selection pass 3: forks");
        let mut changed = true;
        while changed {
            changed = false;
            for rec in &forks {
                if nodes.contains_key(&rec.identity) {
                    continue;
                }
                let qualifies = qualifying.contains(&rec.origin_location);
                if !qualifies && !referenced.contains(rec.identity.as_str()) {
                    continue;
                }
                let class = if qualifies {
                    Classification::SecondaryQualified
                } else {
                    Classification::SecondaryUnqualified
                };
                tracing::trace!(module = %rec.identity, origin = %rec.origin_location, ?class, "including fork");
                nodes.insert(rec.identity.clone(), class);
                referenced.extend(rec.dependencies.keys().map(String::as_str));
                changed = true;
            }
        }

        // Pass 4: externals
        if exclude_external {
            let before = nodes.len();
            nodes.retain(|_, class| *class != Classification::SecondaryUnqualified);
            tracing::debug!(dropped = before - nodes.len(), "excluding unqualified forks");
        } else {
            tracing::debug!("node selection pass 4: external dependencies");
            for id in &modules.all_identities {
                if resolved(id.as_str()).is_none()
                    && referenced.contains(id.as_str())
                    && !nodes.contains_key(id)
                {
                    tracing::trace!(module = %id, "including external");
                    nodes.insert(id.clone(), Classification::External);
                }
            }
        }

        tracing::info!(nodes = nodes.len(), qualifying = qualifying.len(), exclude_external, "graph nodes selected");
        Self { modules, nodes, qualifying }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Node identities in lexicographic order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> + '_ {
        self.nodes.keys().map(String::as_str)
    }

    pub fn classification(&self, id: &str) -> Option<Classification> {
        self.nodes.get(id).copied()
    }

    /// Origin locations of forks that qualified as internal.
    pub fn qualifying_locations(&self) -> &BTreeSet<String> {
        &self.qualifying
    }

    /// The resolved record backing node `id`, if any.
    pub fn record(&self, id: &str) -> Option<&'m ModuleRecord> {
        if !self.contains(id) {
            return None;
        }
        self.modules.get(id).filter(|r| r.resolved)
    }

    /// Dependencies of `id` that are nodes, sorted by target.
    pub fn dependencies(&self, id: &str) -> Vec<Edge<'_>> {
        let Some(rec) = self.record(id) else {
            return Vec::new();
        };
        rec.dependencies
            .iter()
            .filter(|(to, _)| self.contains(to))
            .map(|(to, version)| Edge { from: rec.identity.as_str(), to: to.as_str(), version: version.as_str() })
            .collect()
    }

    /// Does node `from` depend on node `to`?
    pub fn depends_on(&self, from: &str, to: &str) -> bool {
        self.contains(to) && self.record(from).is_some_and(|r| r.depends_on(to))
    }

    /// Every edge, sorted by source then target.
    pub fn edges(&self) -> Vec<Edge<'_>> {
        self.nodes().flat_map(|id| self.dependencies(id)).collect()
    }

    /// Target -> sources that depend on it. Every node has an entry and
    /// source lists are sorted.
    pub fn reverse_adjacency(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut reverse: BTreeMap<&str, Vec<&str>> = self.nodes().map(|n| (n, Vec::new())).collect();
        for edge in self.edges() {
            if let Some(sources) = reverse.get_mut(edge.to) {
                sources.push(edge.from);
            }
        }
        for sources in reverse.values_mut() {
            sources.sort_unstable();
        }
        reverse
    }

    /// Number of in-graph dependencies of each node; this is the node's
    /// in-degree in the reverse graph.
    pub fn dependency_counts(&self) -> BTreeMap<&str, usize> {
        self.nodes().map(|n| (n, self.dependencies(n).len())).collect()
    }
}
