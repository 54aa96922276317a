use crate::cli::{Cli, Commands, InputArgs, OutputFormat};
use crate::errors::DepgraphError;
use crate::graph::cycles::{cycle_groups, detect_cycles};
use crate::graph::levels::Leveling;
use crate::graph::DependencyGraph;
use crate::model::ModuleSet;
use crate::scan::Scanner;
use crate::utils::config::{self, Config};
use crate::visualization::levels::LevelsRenderer;
use crate::visualization::{DotGenerator, DotOptions, RankDir, SvgGenerator};
use clap::CommandFactory;
use clap_complete::generate;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Exit code for an empty node set and for usage problems.
pub const EXIT_NO_MODULES: i32 = 2;
/// Exit code for a leveling invariant violation (an internal bug).
pub const EXIT_INTERNAL: i32 = 70;

/// Run the CLI logic in-process.
///
/// Returns an exit code (0 = success).
#[must_use]
pub fn run_cli(cli: Cli) -> i32 {
    let result = match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = crate::cli::Cli::command();
            let bin_name = env!("CARGO_PKG_NAME");
            let mut out = io::stdout();
            generate(shell, &mut cmd, bin_name, &mut out);
            return 0;
        }
        Commands::Graph { input, left_to_right, svg, output } => {
            run_graph(&input, left_to_right, svg, output.as_deref())
        }
        Commands::Levels { input, format, output } => run_levels(&input, format, output.as_deref()),
        Commands::Cycles { input, format } => run_cycles(&input, format),
    };
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            exit_code(&e)
        }
    }
}

/// Map an error to the process exit code.
#[must_use]
pub fn exit_code(err: &DepgraphError) -> i32 {
    match err {
        DepgraphError::Invariant(_) => EXIT_INTERNAL,
        _ => 1,
    }
}

/// Config from `--config`, or `depgraph.toml` in the working directory.
fn load_config(input: &InputArgs) -> Result<Config, DepgraphError> {
    match &input.config {
        Some(path) => config::load_config_at(path),
        None => Ok(config::load_config_near(Path::new("."))?.unwrap_or_default()),
    }
}

fn load_modules(input: &InputArgs, cfg: &Config) -> Result<ModuleSet, DepgraphError> {
    match &input.records {
        Some(path) => {
            let modules = ModuleSet::load_json(path)?;
            tracing::info!(path = %path.display(), records = modules.len(), "loaded module records");
            Ok(modules)
        }
        None => Scanner::new(cfg.forks.clone(), input.no_ignore).scan(&input.roots),
    }
}

fn resolve_format(flag: Option<OutputFormat>, cfg: &Config) -> OutputFormat {
    flag.unwrap_or(match cfg.default_format() {
        Some("json") => OutputFormat::Json,
        _ => OutputFormat::Text,
    })
}

/// `--no-ext` when given, else `[graph] exclude_external`, else include.
fn exclude_external(input: &InputArgs, cfg: &Config) -> bool {
    input.no_ext.or(cfg.exclude_external()).unwrap_or(false)
}

/// Write to `output`, or stdout when none is given.
fn emit(output: Option<&Path>, content: &str) -> Result<(), DepgraphError> {
    match output {
        Some(path) => {
            fs::write(path, content)?;
            tracing::info!(path = %path.display(), bytes = content.len(), "wrote output");
        }
        None => {
            let mut out = io::stdout().lock();
            out.write_all(content.as_bytes())?;
            out.flush()?;
        }
    }
    Ok(())
}

fn no_modules() -> i32 {
    eprintln!("no modules found");
    EXIT_NO_MODULES
}

fn run_graph(input: &InputArgs, left_to_right: bool, svg: bool, output: Option<&Path>) -> Result<i32, DepgraphError> {
    let cfg = load_config(input)?;
    let modules = load_modules(input, &cfg)?;
    let graph = DependencyGraph::build(&modules, exclude_external(input, &cfg));
    if graph.is_empty() {
        return Ok(no_modules());
    }
    let cycles = detect_cycles(&graph);
    let rankdir = if left_to_right { RankDir::LR } else { cfg.rankdir().map(RankDir::from_config).unwrap_or_default() };
    let opts = DotOptions { rankdir, palette: cfg.palette() };
    let content = if svg {
        SvgGenerator::new().generate_svg_with_options(&graph, &cycles, &opts)?
    } else {
        DotGenerator::new().generate_dot_with_options(&graph, &cycles, &opts)
    };
    emit(output, &content)?;
    Ok(0)
}

fn run_levels(input: &InputArgs, format: Option<OutputFormat>, output: Option<&Path>) -> Result<i32, DepgraphError> {
    let cfg = load_config(input)?;
    let modules = load_modules(input, &cfg)?;
    let graph = DependencyGraph::build(&modules, exclude_external(input, &cfg));
    if graph.is_empty() {
        return Ok(no_modules());
    }
    let leveling = Leveling::compute(&graph)?;
    let renderer = LevelsRenderer::new();
    let content = match resolve_format(format, &cfg) {
        OutputFormat::Json => {
            let mut s = renderer.render_json(&leveling)?;
            s.push('\n');
            s
        }
        OutputFormat::Text => renderer.render_text(&graph, &leveling),
    };
    emit(output, &content)?;
    Ok(0)
}

fn run_cycles(input: &InputArgs, format: Option<OutputFormat>) -> Result<i32, DepgraphError> {
    let cfg = load_config(input)?;
    let modules = load_modules(input, &cfg)?;
    let graph = DependencyGraph::build(&modules, exclude_external(input, &cfg));
    if graph.is_empty() {
        return Ok(no_modules());
    }
    let groups = cycle_groups(&graph);
    let merged = detect_cycles(&graph);
    let exact: usize = groups.iter().map(Vec::len).sum();
    if exact != merged.len() {
        tracing::info!(exact, merged = merged.len(), "cycle level also holds modules between cycles");
    }

    let content = match resolve_format(format, &cfg) {
        OutputFormat::Json => {
            let mut s = serde_json::to_string_pretty(&groups)
                .map_err(|e| DepgraphError::Visualization(format!("JSON encode error: {e}")))?;
            s.push('\n');
            s
        }
        OutputFormat::Text if groups.is_empty() => "<no cycles>\n".to_string(),
        OutputFormat::Text => {
            let rows: Vec<Vec<String>> = groups
                .iter()
                .enumerate()
                .map(|(i, g)| vec![(i + 1).to_string(), g.len().to_string(), g.join(", ")])
                .collect();
            let mut s = crate::utils::table::render(&["#", "Size", "Modules"], &rows);
            s.push('\n');
            s
        }
    };
    emit(None, &content)?;
    Ok(0)
}
