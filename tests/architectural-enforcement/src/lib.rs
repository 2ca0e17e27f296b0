//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles:
//! - No sleep() calls that block a runtime thread
//! - Async I/O only, outside of startup code
//!
//! The helpers here scan Rust sources line by line. Test modules are cut off
//! at their `#[cfg(test)]` marker, so only production code is checked.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// A forbidden pattern and why it is forbidden
#[derive(Clone, Copy, Debug)]
pub struct Rule {
    /// Substring to look for
    pub pattern: &'static str,
    /// Shown in the failure report
    pub reason: &'static str,
}

/// Calls that stall the tokio runtime
pub const BLOCKING_RULES: &[Rule] = &[
    Rule {
        pattern: "thread::sleep",
        reason: "blocks the runtime thread; use tokio::time::sleep",
    },
    Rule {
        pattern: "std::fs::",
        reason: "blocking file I/O; use tokio::fs",
    },
    Rule {
        pattern: "use std::fs",
        reason: "blocking file I/O; use tokio::fs",
    },
    Rule {
        pattern: ".blocking_send(",
        reason: "panics inside the runtime; use send().await",
    },
    Rule {
        pattern: "block_on(",
        reason: "nested runtime; await instead",
    },
];

/// One match of a [`Rule`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    /// File containing the match
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// The offending line, trimmed
    pub text: String,
    /// Why the pattern is forbidden
    pub reason: &'static str,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: {} ({})",
            self.path.display(),
            self.line,
            self.text,
            self.reason
        )
    }
}

/// The production part of a source file: everything before `#[cfg(test)]`
pub fn production_code(source: &str) -> &str {
    match source.find("#[cfg(test)]") {
        Some(end) => &source[..end],
        None => source,
    }
}

/// Find rule matches in one file's source, skipping comments
pub fn scan_source(path: &Path, source: &str, rules: &[Rule]) -> Vec<Violation> {
    let mut violations = Vec::new();
    for (i, line) in production_code(source).lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.starts_with("//") {
            continue;
        }
        for rule in rules {
            if trimmed.contains(rule.pattern) {
                violations.push(Violation {
                    path: path.to_path_buf(),
                    line: i + 1,
                    text: trimmed.to_string(),
                    reason: rule.reason,
                });
            }
        }
    }
    violations
}

/// Scan every `.rs` file under `root`, except paths ending in one of `allowed`
///
/// # Errors
///
/// Returns an error if a file cannot be read.
pub fn scan_tree(root: &Path, rules: &[Rule], allowed: &[&str]) -> std::io::Result<Vec<Violation>> {
    let mut violations = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::other)?;
        let path = entry.path();
        if path.extension().map_or(true, |ext| ext != "rs") {
            continue;
        }
        if allowed.iter().any(|suffix| path.ends_with(suffix)) {
            continue;
        }
        let source = std::fs::read_to_string(path)?;
        violations.extend(scan_source(path, &source, rules));
    }
    Ok(violations)
}

/// Workspace root, resolved from this crate's manifest directory
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_code_stops_at_test_module() {
        let source = "fn a() {}\n#[cfg(test)]\nmod tests { std::thread::sleep(x); }\n";
        assert_eq!(production_code(source), "fn a() {}\n");
    }

    #[test]
    fn test_scan_source_reports_line_numbers() {
        let source = "fn a() {\n    std::thread::sleep(d);\n}\n";
        let found = scan_source(Path::new("a.rs"), source, BLOCKING_RULES);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, 2);
        assert_eq!(found[0].text, "std::thread::sleep(d);");
    }

    #[test]
    fn test_scan_source_ignores_comments_and_tests() {
        let source = "// std::fs::read is blocking\nfn a() {}\n#[cfg(test)]\nmod tests {\n    fn b() { std::fs::read(\"x\"); }\n}\n";
        assert!(scan_source(Path::new("a.rs"), source, BLOCKING_RULES).is_empty());
    }
}
