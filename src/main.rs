use std::env;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Logs go to stderr. `DEPGRAPH_LOG` overrides the level picked from flags.
fn init_tracing(quiet: bool, verbose: u8) {
    let fallback = match (quiet, verbose) {
        (true, _) => "depgraph=error",
        (false, 0) => "depgraph=warn",
        (false, 1) => "depgraph=info",
        (false, _) => "depgraph=debug",
    };
    let filter = EnvFilter::try_from_env("DEPGRAPH_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));

    let format = env::var("DEPGRAPH_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry.with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr)).init();
        }
        _ => {
            registry.with(fmt::layer().compact().with_writer(std::io::stderr)).init();
        }
    }
}

fn main() {
    let cli = depgraph::cli::parse();
    init_tracing(cli.quiet, cli.verbose);
    let code = depgraph::app::run_cli(cli);
    if code != 0 {
        std::process::exit(code);
    }
}
