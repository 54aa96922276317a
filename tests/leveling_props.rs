use depgraph::graph::cycles::{cycle_groups, detect_cycles};
use depgraph::graph::levels::Leveling;
use depgraph::graph::DependencyGraph;
use depgraph::model::{ModuleRecord, ModuleSet};
use depgraph::visualization::levels::LevelsRenderer;
use proptest::prelude::*;
use std::collections::BTreeMap;

fn name(i: usize) -> String {
    format!("example.com/m{i:02}")
}

fn build(n: usize, edges: &[(usize, usize)]) -> ModuleSet {
    (0..n)
        .map(|i| {
            edges
                .iter()
                .filter(|(from, _)| *from == i)
                .fold(ModuleRecord::new(name(i), format!("acme/m{i:02}")), |r, (_, to)| r.with_dependency(name(*to), "v1"))
        })
        .collect()
}

fn any_graph() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (1usize..12).prop_flat_map(|n| (Just(n), prop::collection::vec((0..n, 0..n), 0..n * 3)))
}

/// Edges only point from higher to lower index, so there are no cycles.
fn any_dag() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    any_graph().prop_map(|(n, edges)| {
        let edges = edges.into_iter().filter(|(a, b)| a != b).map(|(a, b)| (a.max(b), a.min(b))).collect();
        (n, edges)
    })
}

proptest! {
    #[test]
    fn every_node_lands_in_exactly_one_level((n, edges) in any_graph()) {
        let modules = build(n, &edges);
        let graph = DependencyGraph::build(&modules, true);
        let leveling = Leveling::compute(&graph).unwrap();
        let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
        for level in &leveling.levels {
            prop_assert!(!level.entries.is_empty());
            for node in level.nodes() {
                *seen.entry(node).or_default() += 1;
            }
        }
        prop_assert_eq!(seen.len(), graph.len());
        prop_assert!(seen.values().all(|&c| c == 1));
        prop_assert!(leveling.levels.iter().filter(|l| l.cyclic).count() <= 1);
    }

    #[test]
    fn acyclic_dependencies_come_first((n, edges) in any_graph()) {
        let modules = build(n, &edges);
        let graph = DependencyGraph::build(&modules, true);
        let leveling = Leveling::compute(&graph).unwrap();
        for edge in graph.edges() {
            if leveling.cycles.contains(edge.from) || leveling.cycles.contains(edge.to) {
                continue;
            }
            let from = leveling.level_of(edge.from).unwrap();
            let to = leveling.level_of(edge.to).unwrap();
            prop_assert!(to < from, "{} (level {}) depends on {} (level {})", edge.from, from, edge.to, to);
        }
    }

    #[test]
    fn dags_have_no_cycle_level((n, edges) in any_dag()) {
        let modules = build(n, &edges);
        let graph = DependencyGraph::build(&modules, true);
        let leveling = Leveling::compute(&graph).unwrap();
        prop_assert!(leveling.cycles.is_empty());
        prop_assert!(leveling.levels.iter().all(|l| !l.cyclic));
        prop_assert!(cycle_groups(&graph).is_empty());
    }

    #[test]
    fn exact_cycle_groups_are_inside_the_cycle_set((n, edges) in any_graph()) {
        let modules = build(n, &edges);
        let graph = DependencyGraph::build(&modules, true);
        let merged = detect_cycles(&graph);
        for group in cycle_groups(&graph) {
            for member in group {
                prop_assert!(merged.contains(&member));
            }
        }
    }

    #[test]
    fn report_is_deterministic((n, edges) in any_graph()) {
        let a = build(n, &edges);
        let mut reversed = edges.clone();
        reversed.reverse();
        let b = build(n, &reversed);
        let render = |m: &ModuleSet| {
            let graph = DependencyGraph::build(m, false);
            let leveling = Leveling::compute(&graph).unwrap();
            LevelsRenderer::new().render_text(&graph, &leveling)
        };
        prop_assert_eq!(render(&a), render(&b));
    }
}
