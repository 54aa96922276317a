use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("missing module directive")]
    MissingModule,
    #[error("malformed {directive} directive at line {line}: {text}")]
    Malformed { directive: &'static str, line: usize, text: String },
    #[error("unterminated {directive} block opened at line {line}")]
    Unterminated { directive: &'static str, line: usize },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum DepgraphError {
    #[error("Manifest error in file {file}: {source}")]
    Manifest { file: PathBuf, source: ManifestError },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid module records: {0}")]
    Records(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Visualization error: {0}")]
    Visualization(String),

    /// Leveling bookkeeping went wrong; this is a bug, not a dependency cycle.
    #[error("BUG: leveling invariant violated: {0}")]
    Invariant(String),
}
