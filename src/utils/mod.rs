pub mod table {
    fn width(s: &str) -> usize {
        s.chars().count()
    }

    // Helper to render a separator line
    fn sep(widths: &[usize]) -> String {
        let mut s = String::from("+");
        for w in widths {
            s.push_str(&"-".repeat(w + 2));
            s.push('+');
        }
        s
    }

    // Helper to render a row line
    fn line(cells: &[String], widths: &[usize]) -> String {
        let mut s = String::from("|");
        for (cell, &w) in cells.iter().zip(widths) {
            s.push(' ');
            s.push_str(cell);
            s.push_str(&" ".repeat(w.saturating_sub(width(cell))));
            s.push_str(" |");
        }
        s
    }

    /// Render an ASCII table. Short rows are padded with empty cells and
    /// extra cells are dropped.
    #[must_use]
    pub fn render(headers: &[&str], rows: &[Vec<String>]) -> String {
        let cols = headers.len();
        let mut widths: Vec<usize> = headers.iter().map(|h| width(h)).collect();
        for row in rows {
            for (c, w) in widths.iter_mut().enumerate() {
                *w = (*w).max(row.get(c).map_or(0, |s| width(s)));
            }
        }

        let mut out = String::new();
        out.push_str(&sep(&widths));
        out.push('\n');
        let header_cells: Vec<String> = headers.iter().map(|s| (*s).to_string()).collect();
        out.push_str(&line(&header_cells, &widths));
        out.push('\n');
        out.push_str(&sep(&widths));
        out.push('\n');
        for row in rows {
            let cells: Vec<String> = (0..cols).map(|i| row.get(i).cloned().unwrap_or_default()).collect();
            out.push_str(&line(&cells, &widths));
            out.push('\n');
        }
        out.push_str(&sep(&widths));
        out
    }
}

pub mod config {
    use crate::errors::DepgraphError;
    use crate::visualization::Palette;
    use serde::Deserialize;
    use std::fs;
    use std::path::{Path, PathBuf};

    pub const DEFAULT_CONFIG_NAME: &str = "depgraph.toml";

    #[derive(Debug, Clone, Deserialize, Default)]
    pub struct GraphConfig {
        pub exclude_external: Option<bool>,
    }

    #[derive(Debug, Clone, Deserialize, Default)]
    pub struct DotConfig {
        pub rankdir: Option<String>, // "TB" | "LR"
    }

    #[derive(Debug, Clone, Deserialize, Default)]
    pub struct OutputConfig {
        pub default_format: Option<String>, // "text" | "json"
    }

    #[derive(Debug, Clone, Deserialize, Default)]
    pub struct PaletteConfig {
        pub primary: Option<Vec<String>>,
        pub secondary: Option<Vec<String>>,
        pub external: Option<String>,
        pub cycle: Option<String>,
    }

    /// Marks the manifest found at `location` as a fork of `original`.
    #[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
    pub struct ForkConfig {
        pub location: String,
        pub original: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize, Default)]
    pub struct Config {
        pub graph: Option<GraphConfig>,
        pub dot: Option<DotConfig>,
        pub output: Option<OutputConfig>,
        pub palette: Option<PaletteConfig>,
        #[serde(default, rename = "fork")]
        pub forks: Vec<ForkConfig>,
    }

    impl Config {
        /// Default palette with configured slots swapped in.
        #[must_use]
        pub fn palette(&self) -> Palette {
            let mut p = Palette::default();
            if let Some(cfg) = &self.palette {
                if let Some(v) = &cfg.primary {
                    p.primary.clone_from(v);
                }
                if let Some(v) = &cfg.secondary {
                    p.secondary.clone_from(v);
                }
                if let Some(v) = &cfg.external {
                    p.external.clone_from(v);
                }
                if let Some(v) = &cfg.cycle {
                    p.cycle.clone_from(v);
                }
            }
            p
        }

        #[must_use]
        pub fn exclude_external(&self) -> Option<bool> {
            self.graph.as_ref().and_then(|g| g.exclude_external)
        }

        #[must_use]
        pub fn rankdir(&self) -> Option<&str> {
            self.dot.as_ref().and_then(|d| d.rankdir.as_deref())
        }

        #[must_use]
        pub fn default_format(&self) -> Option<&str> {
            self.output.as_ref().and_then(|o| o.default_format.as_deref())
        }
    }

    fn default_config_path(dir: &Path) -> PathBuf {
        dir.join(DEFAULT_CONFIG_NAME)
    }

    /// Load a TOML config file.
    ///
    /// # Errors
    /// Returns `DepgraphError::Io` if the file cannot be read and
    /// `DepgraphError::Config` if it is not valid.
    pub fn load_config_at(path: &Path) -> Result<Config, DepgraphError> {
        let data = fs::read_to_string(path)?;
        let cfg = toml::from_str::<Config>(&data)
            .map_err(|e| DepgraphError::Config(format!("{}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), forks = cfg.forks.len(), "loaded config");
        Ok(cfg)
    }

    /// Load `depgraph.toml` from `dir` when it exists.
    ///
    /// # Errors
    /// Same as [`load_config_at`] for a config file that exists.
    pub fn load_config_near(dir: &Path) -> Result<Option<Config>, DepgraphError> {
        let p = default_config_path(dir);
        if p.is_file() {
            load_config_at(&p).map(Some)
        } else {
            Ok(None)
        }
    }
}

pub mod file_walker {
    use std::path::{Path, PathBuf};

    pub const MANIFEST_NAME: &str = "go.mod";

    /// Directories the go tool never treats as part of a module tree.
    fn is_go_ignored_dir(name: &str) -> bool {
        name == "testdata" || name == "vendor" || name.starts_with('_')
    }

    /// Find `go.mod` files under `root`, sorted. `.gitignore` and `.ignore`
    /// rules apply (also outside a git checkout) unless `no_ignore` is set.
    /// `testdata`, `vendor` and `_`-prefixed directories below the root are
    /// always skipped.
    #[must_use]
    pub fn go_mod_files(root: &Path, no_ignore: bool) -> Vec<PathBuf> {
        let mut walker = ignore::WalkBuilder::new(root);
        walker
            .follow_links(false)
            .git_ignore(!no_ignore)
            .git_global(false)
            .git_exclude(false)
            .ignore(!no_ignore)
            .parents(!no_ignore)
            .require_git(false)
            .filter_entry(|e| {
                e.depth() == 0
                    || !e.file_type().is_some_and(|t| t.is_dir())
                    || !is_go_ignored_dir(&e.file_name().to_string_lossy())
            });
        let mut out: Vec<PathBuf> = walker
            .build()
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(err) => {
                    tracing::warn!(root = %root.display(), error = %err, "walk error");
                    None
                }
            })
            .filter(|e| e.file_type().is_some_and(|t| t.is_file()) && e.file_name() == MANIFEST_NAME)
            .map(ignore::DirEntry::into_path)
            .collect();
        out.sort();
        out
    }
}
