use crate::errors::DepgraphError;
use crate::graph::{Classification, DependencyGraph};
use crate::model::ModuleRecord;
use std::collections::BTreeSet;
use std::fmt::Write as _;

pub mod levels;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RankDir {
    LR,
    #[default]
    TB,
}

impl RankDir {
    /// Parse a config value; anything but `LR` is top-down.
    #[must_use]
    pub fn from_config(v: &str) -> Self {
        if v.eq_ignore_ascii_case("LR") {
            Self::LR
        } else {
            Self::TB
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::LR => "LR",
            Self::TB => "TB",
        }
    }
}

/// Fill colors per classification. Primary and qualified forks cycle
/// through their list by input group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub primary: Vec<String>,
    pub secondary: Vec<String>,
    pub external: String,
    pub cycle: String,
}

impl Default for Palette {
    fn default() -> Self {
        let owned = |xs: &[&str]| -> Vec<String> { xs.iter().map(|s| (*s).to_string()).collect() };
        Self {
            primary: owned(&["lightblue", "lightgreen", "lightsalmon", "lightgoldenrodyellow", "lightpink"]),
            secondary: owned(&["steelblue", "darkseagreen", "coral", "darkkhaki", "mediumvioletred"]),
            external: "lightgrey".to_string(),
            cycle: "red".to_string(),
        }
    }
}

impl Palette {
    /// Fill color for a node. Unqualified forks are drawn like externals.
    #[must_use]
    pub fn color_for(&self, class: Classification, group_index: usize) -> &str {
        let slots = match class {
            Classification::Primary => &self.primary,
            Classification::SecondaryQualified => &self.secondary,
            Classification::SecondaryUnqualified | Classification::External => return &self.external,
        };
        if slots.is_empty() {
            &self.external
        } else {
            &slots[group_index % slots.len()]
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DotOptions {
    pub rankdir: RankDir,
    pub palette: Palette,
}

#[derive(Debug, Default)]
pub struct DotGenerator;

impl DotGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self {}
    }

    /// Generate DOT with default options.
    #[must_use]
    pub fn generate_dot(&self, graph: &DependencyGraph<'_>, cycles: &BTreeSet<String>) -> String {
        self.generate_dot_with_options(graph, cycles, &DotOptions::default())
    }

    /// Generate DOT for `graph`, highlighting nodes in `cycles` and edges
    /// between two of them.
    #[must_use]
    pub fn generate_dot_with_options(
        &self,
        graph: &DependencyGraph<'_>,
        cycles: &BTreeSet<String>,
        opts: &DotOptions,
    ) -> String {
        let mut s = String::new();
        s.push_str("digraph dependencies {\n");
        let _ = write!(
            s,
            "  rankdir=\"{}\";\n  node [shape=box, style=\"rounded,filled\", fontname=\"Helvetica\"];\n  edge [fontname=\"Helvetica\", fontsize=10];\n",
            opts.rankdir.as_str()
        );

        s.push_str("\n  // Node Definitions\n");
        for id in graph.nodes() {
            let class = graph.classification(id).unwrap_or(Classification::External);
            let rec = graph.record(id);
            let group = rec.map_or(0, |r| r.group_index);
            let label = match (class, rec) {
                (Classification::SecondaryQualified, Some(r)) => diagram_fork_label(r),
                _ => id.to_string(),
            };
            let _ = write!(
                s,
                "  \"{}\" [label=\"{}\", fillcolor=\"{}\"",
                escape_label(id),
                escape_label(&label),
                opts.palette.color_for(class, group)
            );
            if cycles.contains(id) {
                let _ = write!(s, ", color=\"{}\", penwidth=2", opts.palette.cycle);
            }
            s.push_str("];\n");
        }

        s.push_str("\n  // Edges (Dependencies)\n");
        for edge in graph.edges() {
            let _ = write!(
                s,
                "  \"{}\" -> \"{}\" [label=\"{}\"",
                escape_label(edge.from),
                escape_label(edge.to),
                escape_label(edge.version)
            );
            if cycles.contains(edge.from) && cycles.contains(edge.to) {
                let _ = write!(s, ", color=\"{}\", penwidth=1.5", opts.palette.cycle);
            }
            s.push_str("];\n");
        }

        s.push_str("}\n");
        s
    }
}

#[derive(Debug, Default)]
pub struct SvgGenerator;

impl SvgGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self {}
    }

    /// Generate an SVG rendering using Graphviz.
    ///
    /// # Errors
    /// Returns `DepgraphError::Visualization` if invoking Graphviz fails,
    /// if the process exits with a non-success status, or if its output is not valid UTF-8.
    pub fn generate_svg_with_options(
        &self,
        graph: &DependencyGraph<'_>,
        cycles: &BTreeSet<String>,
        opts: &DotOptions,
    ) -> Result<String, DepgraphError> {
        let dot = DotGenerator::new().generate_dot_with_options(graph, cycles, opts);
        render_svg(&dot)
    }
}

/// Pipe DOT text through `dot -Tsvg`.
fn render_svg(dot: &str) -> Result<String, DepgraphError> {
    let output = std::process::Command::new("dot")
        .arg("-Tsvg")
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
        .and_then(|mut child| {
            use std::io::Write;
            if let Some(stdin) = child.stdin.as_mut() {
                stdin.write_all(dot.as_bytes())?;
            }
            child.wait_with_output()
        })
        .map_err(|e| DepgraphError::Visualization(format!("Failed to run graphviz 'dot': {e}")))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DepgraphError::Visualization(format!(
            "Graphviz 'dot' failed with code {:?}: {}",
            output.status.code(),
            stderr.trim()
        )));
    }
    String::from_utf8(output.stdout)
        .map_err(|e| DepgraphError::Visualization(format!("Invalid UTF-8 from dot: {e}")))
}

/// Two-line label for a qualified fork. The `\n` is DOT's line break, kept literal.
fn diagram_fork_label(rec: &ModuleRecord) -> String {
    match rec.original_identity.as_deref() {
        Some(orig) => format!("{}\\n(fork of {orig})", rec.origin_location),
        None => format!("{}\\n(fork)", rec.origin_location),
    }
}

/// Escape DOT's quote character. Backslashes are left alone so label line
/// breaks survive.
#[must_use]
pub fn escape_label(s: &str) -> String {
    s.replace('"', "\\\"")
}
