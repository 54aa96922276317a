use crate::errors::ManifestError;
use regex::Regex;
use std::collections::BTreeMap;

/// The parts of a `go.mod` the dependency graph needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub module: String,
    /// Direct requirements: module path -> version. `// indirect` ones are left out.
    pub requires: BTreeMap<String, String>,
}

#[derive(Debug)]
pub struct RegexPatterns {
    pub module: Regex,
    pub require_line: Regex,
    pub block_open: Regex,
    pub block_entry: Regex,
}

/// Directives that may open a `( ... )` block.
const BLOCK_DIRECTIVES: [&str; 7] = ["require", "replace", "exclude", "retract", "godebug", "tool", "ignore"];

impl RegexPatterns {
    /// # Panics
    /// Only if one of the fixed patterns is invalid.
    #[must_use]
    pub fn compile() -> Self {
        let path = r#"(?P<path>"[^"]*"|`[^`]*`|[^\s"`()]+)"#;
        let module = Regex::new(&format!(r"^module\s+{path}$")).expect("module pattern");
        let require_line = Regex::new(&format!(r"^require\s+{path}\s+(?P<version>\S+)$")).expect("require pattern");
        let block_open = Regex::new(r"^(?P<directive>[a-z]+)\s*\($").expect("block pattern");
        let block_entry = Regex::new(&format!(r"^{path}\s+(?P<version>\S+)$")).expect("block entry pattern");
        Self { module, require_line, block_open, block_entry }
    }
}

impl Default for RegexPatterns {
    fn default() -> Self {
        Self::compile()
    }
}

#[derive(Debug, Default)]
pub struct GoModParser {
    patterns: RegexPatterns,
}

impl GoModParser {
    #[must_use]
    pub fn new() -> Self {
        Self { patterns: RegexPatterns::compile() }
    }

    /// Parse `go.mod` text.
    ///
    /// # Errors
    /// Returns `ManifestError::MissingModule` when there is no `module`
    /// directive, `Malformed` for a `module` or `require` line that does not
    /// parse, and `Unterminated` for a block missing its `)`.
    pub fn parse(&self, content: &str) -> Result<Manifest, ManifestError> {
        let mut module: Option<String> = None;
        let mut requires = BTreeMap::new();
        let mut block: Option<(&'static str, usize)> = None;

        for (idx, raw) in content.lines().enumerate() {
            let line = idx + 1;
            let (code, comment) = split_comment(raw);
            let code = code.trim();
            if code.is_empty() {
                continue;
            }

            if let Some((directive, _)) = block {
                if code == ")" {
                    block = None;
                } else if directive == "require" {
                    let cap = self.patterns.block_entry.captures(code).ok_or_else(|| ManifestError::Malformed {
                        directive,
                        line,
                        text: code.to_string(),
                    })?;
                    if !is_indirect(comment) {
                        requires.insert(unquote(&cap["path"]).to_string(), cap["version"].to_string());
                    }
                }
                continue;
            }

            if let Some(cap) = self.patterns.block_open.captures(code) {
                let name = &cap["directive"];
                if let Some(directive) = BLOCK_DIRECTIVES.into_iter().find(|d| *d == name) {
                    block = Some((directive, line));
                    continue;
                }
            }

            let keyword = code.split_whitespace().next().unwrap_or_default();
            match keyword {
                "module" => {
                    let cap = self.patterns.module.captures(code).ok_or_else(|| ManifestError::Malformed {
                        directive: "module",
                        line,
                        text: code.to_string(),
                    })?;
                    module = Some(unquote(&cap["path"]).to_string());
                }
                "require" => {
                    let cap = self.patterns.require_line.captures(code).ok_or_else(|| ManifestError::Malformed {
                        directive: "require",
                        line,
                        text: code.to_string(),
                    })?;
                    if !is_indirect(comment) {
                        requires.insert(unquote(&cap["path"]).to_string(), cap["version"].to_string());
                    }
                }
                _ => {}
            }
        }

        if let Some((directive, line)) = block {
            return Err(ManifestError::Unterminated { directive, line });
        }
        match module {
            Some(module) if !module.is_empty() => Ok(Manifest { module, requires }),
            _ => Err(ManifestError::MissingModule),
        }
    }
}

/// Split a line at its `//` comment, ignoring `//` inside quoted strings.
fn split_comment(line: &str) -> (&str, Option<&str>) {
    let mut quote: Option<char> = None;
    let mut prev_slash = false;
    for (i, c) in line.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '`' => quote = Some(c),
            None if c == '/' && prev_slash => return (&line[..i - 1], Some(&line[i + 1..])),
            None => {}
        }
        prev_slash = quote.is_none() && c == '/';
    }
    (line, None)
}

fn is_indirect(comment: Option<&str>) -> bool {
    comment.is_some_and(|c| {
        let c = c.trim();
        c == "indirect" || c.starts_with("indirect;")
    })
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .or_else(|| s.strip_prefix('`').and_then(|r| r.strip_suffix('`')))
        .unwrap_or(s)
}
