//! depgraph: dependency graphs for groups of Go modules
//!
//! Scan directories of `go.mod` files (or load a JSON inventory of module
//! records), decide which modules belong in the graph, find dependency
//! cycles and print the result as Graphviz DOT or as leaves-first levels.
//!
//! # Features
//! - Manifest discovery with `.gitignore`/`.ignore` support, parsed in parallel
//! - Node classification: primary modules, qualified and unqualified forks, externals
//! - Cycle detection, with exact cycle groups via Tarjan's algorithm
//! - Leveled report (text or JSON) with a single `(Cycles)` level
//! - DOT and SVG rendering with a configurable palette
//!
//! # Quickstart (Library)
//! ```
//! use depgraph::graph::levels::Leveling;
//! use depgraph::graph::DependencyGraph;
//! use depgraph::model::{ModuleRecord, ModuleSet};
//!
//! let modules: ModuleSet = [
//!     ModuleRecord::new("example.com/app", "acme/app").with_dependency("example.com/lib", "v1.2.0"),
//!     ModuleRecord::new("example.com/lib", "acme/lib"),
//! ]
//! .into_iter()
//! .collect();
//! let graph = DependencyGraph::build(&modules, true);
//! let leveling = Leveling::compute(&graph).expect("levels");
//! assert_eq!(leveling.level_of("example.com/lib"), Some(0));
//! assert_eq!(leveling.level_of("example.com/app"), Some(1));
//! ```
//!
//! # Quickstart (CLI)
//! ```text
//! depgraph graph ~/src/acme ~/src/me --left-to-right > deps.dot
//! depgraph levels --records modules.json --no-ext
//! depgraph cycles ~/src/acme --format json
//! ```
pub mod app;
pub mod cli;
pub mod errors;
pub mod graph;
pub mod model;
pub mod parser;
pub mod scan;
pub mod utils;
pub mod visualization;
