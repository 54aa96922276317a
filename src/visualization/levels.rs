//! Leveled report renderers: indented text and JSON.
use crate::errors::DepgraphError;
use crate::graph::levels::{LevelEntry, Leveling};
use crate::graph::{Classification, DependencyGraph};
use serde::Serialize;
use std::fmt::Write as _;

pub const TEXT_HEADER: &str = "Topological Sort Levels (Leaves First):";

/// Single-line name for a node. Qualified forks read as their origin
/// location plus what they fork.
#[must_use]
pub fn display_name(graph: &DependencyGraph<'_>, id: &str) -> String {
    if graph.classification(id) != Some(Classification::SecondaryQualified) {
        return id.to_string();
    }
    let Some(rec) = graph.record(id) else {
        return id.to_string();
    };
    match rec.original_identity.as_deref() {
        Some(orig) if orig == rec.identity => format!("{} (fork of {orig})", rec.origin_location),
        Some(orig) => format!("{} ({} fork of {orig})", rec.origin_location, rec.identity),
        None => format!("{} (fork)", rec.origin_location),
    }
}

#[derive(Debug, Default)]
pub struct LevelsRenderer;

impl LevelsRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self {}
    }

    #[must_use]
    pub fn render_text(&self, graph: &DependencyGraph<'_>, leveling: &Leveling) -> String {
        let mut s = String::new();
        s.push_str(TEXT_HEADER);
        s.push('\n');
        for level in &leveling.levels {
            let _ = writeln!(s, "{}:", level.label());
            for entry in &level.entries {
                match entry {
                    LevelEntry::Single(a) => {
                        let _ = writeln!(s, "  - {}", display_name(graph, a));
                    }
                    LevelEntry::Pair(a, b) => {
                        let _ = writeln!(s, "  - {} <-> {}", display_name(graph, a), display_name(graph, b));
                    }
                }
            }
        }
        s
    }

    /// JSON array of `{ index, cyclic, entries }`; each entry is a one- or
    /// two-element array of identities.
    ///
    /// # Errors
    /// Returns `DepgraphError::Visualization` if encoding fails.
    pub fn render_json(&self, leveling: &Leveling) -> Result<String, DepgraphError> {
        #[derive(Serialize)]
        struct LevelRow<'a> {
            index: usize,
            cyclic: bool,
            entries: Vec<Vec<&'a str>>,
        }
        let rows: Vec<LevelRow<'_>> = leveling
            .levels
            .iter()
            .map(|l| LevelRow { index: l.index, cyclic: l.cyclic, entries: l.entries.iter().map(LevelEntry::members).collect() })
            .collect();
        serde_json::to_string_pretty(&rows).map_err(|e| DepgraphError::Visualization(format!("JSON encode error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModuleRecord, ModuleSet};

    #[test]
    fn fork_names_follow_original_identity() {
        let modules: ModuleSet = [
            ModuleRecord::new("example.com/app", "acme/app"),
            ModuleRecord::new("example.com/lib", "me/lib")
                .secondary(Some("example.com/lib"))
                .with_dependency("example.com/app", "v1"),
            ModuleRecord::new("me.dev/renamed", "me/renamed")
                .secondary(Some("upstream.dev/orig"))
                .with_dependency("example.com/app", "v1"),
            ModuleRecord::new("me.dev/bare", "me/bare").secondary(None).with_dependency("example.com/app", "v1"),
        ]
        .into_iter()
        .collect();
        let g = DependencyGraph::build(&modules, true);
        assert_eq!(display_name(&g, "example.com/app"), "example.com/app");
        assert_eq!(display_name(&g, "example.com/lib"), "me/lib (fork of example.com/lib)");
        assert_eq!(display_name(&g, "me.dev/renamed"), "me/renamed (me.dev/renamed fork of upstream.dev/orig)");
        assert_eq!(display_name(&g, "me.dev/bare"), "me/bare (fork)");
    }

    #[test]
    fn text_report_for_a_simple_cycle() {
        let modules: ModuleSet =
            [ModuleRecord::new("a", "o/a").with_dependency("b", "v1"), ModuleRecord::new("b", "o/b").with_dependency("a", "v2")]
                .into_iter()
                .collect();
        let g = DependencyGraph::build(&modules, true);
        let l = Leveling::compute(&g).unwrap();
        let text = LevelsRenderer::new().render_text(&g, &l);
        assert_eq!(text, "Topological Sort Levels (Leaves First):\nLevel 0 (Cycles):\n  - a <-> b\n");
    }

    #[test]
    fn json_report_uses_arrays_for_entries() {
        let modules: ModuleSet = [ModuleRecord::new("a", "o/a").with_dependency("b", "v1"), ModuleRecord::new("b", "o/b")]
            .into_iter()
            .collect();
        let g = DependencyGraph::build(&modules, true);
        let l = Leveling::compute(&g).unwrap();
        let json = LevelsRenderer::new().render_json(&l).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v[0]["index"], 0);
        assert_eq!(v[0]["cyclic"], false);
        assert_eq!(v[0]["entries"][0][0], "b");
        assert_eq!(v[1]["entries"][0][0], "a");
    }
}
