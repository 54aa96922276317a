//! Turn directories of Go modules into a `ModuleSet`.
//!
//! Every root passed to the scanner is one input group. Each `go.mod` below
//! it becomes a record whose origin location is the root's directory name
//! joined with the manifest's directory relative to the root.
use crate::errors::{DepgraphError, ManifestError};
use crate::model::{ModuleRecord, ModuleSet};
use crate::parser::{GoModParser, Manifest};
use crate::utils::config::ForkConfig;
use crate::utils::file_walker;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// One manifest waiting to be parsed.
#[derive(Debug, Clone)]
struct ManifestJob {
    group_index: usize,
    path: PathBuf,
    origin_location: String,
}

#[derive(Debug, Default)]
pub struct Scanner {
    forks: Vec<ForkConfig>,
    no_ignore: bool,
}

impl Scanner {
    #[must_use]
    pub fn new(forks: Vec<ForkConfig>, no_ignore: bool) -> Self {
        Self { forks, no_ignore }
    }

    /// Scan `roots` in order. Manifests that fail to parse are skipped with
    /// a warning.
    ///
    /// # Errors
    /// Returns `DepgraphError::Io` if a root is not a readable directory, and
    /// `DepgraphError::Config` if two roots share a directory name, since
    /// their origin locations (and `[[fork]]` entries) would collide.
    pub fn scan(&self, roots: &[PathBuf]) -> Result<ModuleSet, DepgraphError> {
        let mut seen: HashMap<String, &Path> = HashMap::new();
        let mut named = Vec::with_capacity(roots.len());
        for root in roots {
            let name = root_name(root)?;
            if let Some(first) = seen.insert(name.clone(), root) {
                return Err(DepgraphError::Config(format!(
                    "roots {} and {} share the directory name {name:?}; origin locations must be unique",
                    first.display(),
                    root.display()
                )));
            }
            named.push((root, name));
        }

        let mut jobs = Vec::new();
        for (group_index, (root, name)) in named.into_iter().enumerate() {
            let found = file_walker::go_mod_files(root, self.no_ignore);
            tracing::info!(root = %root.display(), group = group_index, manifests = found.len(), "scanned root");
            jobs.extend(found.into_iter().map(|path| {
                let origin_location = origin_location(&name, root, &path);
                ManifestJob { group_index, path, origin_location }
            }));
        }

        // Parse in parallel; results keep job order.
        let parser = GoModParser::new();
        let parsed: Vec<(ManifestJob, Result<Manifest, DepgraphError>)> = jobs
            .into_par_iter()
            .map(|job| {
                let res = read_manifest(&parser, &job.path);
                (job, res)
            })
            .collect();

        let mut modules = ModuleSet::new();
        for (job, res) in parsed {
            let manifest = match res {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping manifest");
                    continue;
                }
            };
            let record = self.to_record(&job, manifest);
            tracing::debug!(
                module = %record.identity,
                origin = %record.origin_location,
                secondary = record.is_secondary,
                deps = record.dependencies.len(),
                "module record"
            );
            modules.insert(record);
        }
        tracing::info!(records = modules.len(), identities = modules.all_identities.len(), "scan complete");
        Ok(modules)
    }

    fn fork_for(&self, origin_location: &str) -> Option<&ForkConfig> {
        self.forks.iter().find(|f| f.location.trim_matches('/') == origin_location)
    }

    fn to_record(&self, job: &ManifestJob, manifest: Manifest) -> ModuleRecord {
        let mut record = ModuleRecord::new(manifest.module, job.origin_location.clone()).in_group(job.group_index);
        record.dependencies = manifest.requires;
        if let Some(fork) = self.fork_for(&job.origin_location) {
            record = record.secondary(fork.original.as_deref());
        }
        record
    }
}

fn read_manifest(parser: &GoModParser, path: &Path) -> Result<Manifest, DepgraphError> {
    let wrap = |source: ManifestError| DepgraphError::Manifest { file: path.to_path_buf(), source };
    let content = fs::read_to_string(path).map_err(|e| wrap(ManifestError::Io(e)))?;
    parser.parse(&content).map_err(wrap)
}

/// Directory name of `root`, resolving `.` and friends.
fn root_name(root: &Path) -> Result<String, DepgraphError> {
    let resolved = fs::canonicalize(root)?;
    if !resolved.is_dir() {
        return Err(DepgraphError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a directory", root.display()),
        )));
    }
    Ok(resolved
        .file_name()
        .map_or_else(|| resolved.display().to_string(), |n| n.to_string_lossy().into_owned()))
}

/// `<root name>/<dir of manifest relative to root>`, with `/` separators.
fn origin_location(root_name: &str, root: &Path, manifest: &Path) -> String {
    let rel_dir = manifest.strip_prefix(root).ok().and_then(Path::parent).unwrap_or_else(|| Path::new(""));
    let mut origin = root_name.to_string();
    for part in rel_dir.components() {
        if let Component::Normal(p) = part {
            origin.push('/');
            origin.push_str(&p.to_string_lossy());
        }
    }
    origin
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn origin_location_joins_root_name_and_relative_dir() {
        let root = Path::new("/work/acme");
        assert_eq!(origin_location("acme", root, &root.join("go.mod")), "acme");
        assert_eq!(origin_location("acme", root, &root.join("svc/api/go.mod")), "acme/svc/api");
    }

    #[test]
    fn scan_builds_records_per_group() {
        let tmp = tempfile::tempdir().unwrap();
        let org_a = tmp.path().join("org-a");
        let org_b = tmp.path().join("org-b");
        write(&org_a.join("app/go.mod"), "module example.com/app\n\nrequire example.com/lib v1.0.0\n");
        write(&org_b.join("lib/go.mod"), "module example.com/lib\n");
        write(&org_b.join("broken/go.mod"), "go 1.22\n");

        let modules = Scanner::new(Vec::new(), false).scan(&[org_a, org_b]).unwrap();
        assert_eq!(modules.len(), 2);
        let app = modules.get("example.com/app").unwrap();
        assert_eq!(app.origin_location, "org-a/app");
        assert_eq!(app.group_index, 0);
        assert_eq!(app.dependencies.get("example.com/lib").map(String::as_str), Some("v1.0.0"));
        let lib = modules.get("example.com/lib").unwrap();
        assert_eq!(lib.origin_location, "org-b/lib");
        assert_eq!(lib.group_index, 1);
        assert!(!lib.is_secondary);
    }

    #[test]
    fn fork_entries_mark_records_secondary() {
        let tmp = tempfile::tempdir().unwrap();
        let me = tmp.path().join("me");
        write(&me.join("cobra/go.mod"), "module github.com/spf13/cobra\n");
        let forks = vec![ForkConfig { location: "me/cobra".into(), original: Some("github.com/spf13/cobra".into()) }];

        let modules = Scanner::new(forks, false).scan(&[me]).unwrap();
        let rec = modules.get("github.com/spf13/cobra").unwrap();
        assert!(rec.is_secondary);
        assert_eq!(rec.original_identity.as_deref(), Some("github.com/spf13/cobra"));
    }

    #[test]
    fn roots_with_the_same_name_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let work = tmp.path().join("work/src");
        let oss = tmp.path().join("oss/src");
        write(&work.join("cobra/go.mod"), "module github.com/spf13/cobra\n");
        write(&oss.join("cobra/go.mod"), "module github.com/spf13/cobra\n");
        let forks = vec![ForkConfig { location: "src/cobra".into(), original: None }];

        let err = Scanner::new(forks, false).scan(&[work.clone(), oss]).unwrap_err();
        assert!(matches!(&err, DepgraphError::Config(msg) if msg.contains("\"src\"")), "{err}");

        // One of them alone is fine.
        let modules = Scanner::default().scan(&[work]).unwrap();
        assert_eq!(modules.get("github.com/spf13/cobra").unwrap().origin_location, "src/cobra");
    }

    #[test]
    fn one_parser_serves_every_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("many");
        for i in 0..32 {
            write(&root.join(format!("m{i:02}/go.mod")), &format!("module example.com/m{i:02}\n\nrequire example.com/m00 v1.0.0\n"));
        }
        let parser = GoModParser::new();
        let manifest = read_manifest(&parser, &root.join("m07/go.mod")).unwrap();
        assert_eq!(manifest.module, "example.com/m07");

        let modules = Scanner::default().scan(&[root]).unwrap();
        assert_eq!(modules.len(), 32);
        assert!(modules.get("example.com/m31").unwrap().dependencies.contains_key("example.com/m00"));
    }

    #[test]
    fn missing_root_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Scanner::default().scan(&[tmp.path().join("nope")]).unwrap_err();
        assert!(matches!(err, DepgraphError::Io(_)));
    }
}
