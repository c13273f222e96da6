//! Hygiene: source-level rules for every crate in the workspace.
//!
//! Scans the production sources of the relay (`src/`), the wire crate
//! (`frames/src/`) and the client library (`client/src/`). Sibling
//! `_test.rs` modules and comment lines are not scanned. Each rule carries a
//! budget; lowering a budget is fine, raising one needs a reviewer.

use std::fs;
use std::path::{Path, PathBuf};

const SOURCE_ROOTS: &[&str] = &["src", "frames/src", "client/src"];

struct Rule {
    pattern: &'static str,
    budget: usize,
    why: &'static str,
}

const RULES: &[Rule] = &[
    Rule { pattern: ".unwrap()", budget: 0, why: "propagate with `?` or handle the failure" },
    Rule { pattern: ".expect(", budget: 0, why: "propagate with `?` or handle the failure" },
    Rule { pattern: "panic!(", budget: 0, why: "a relay or client task must not crash the process" },
    Rule { pattern: "unreachable!(", budget: 0, why: "model the case in the type instead" },
    Rule { pattern: "todo!(", budget: 0, why: "unfinished code paths" },
    Rule { pattern: "unimplemented!(", budget: 0, why: "unfinished code paths" },
    Rule { pattern: "let _ =", budget: 0, why: "log or match the discarded result" },
    // `ServerConfig::from_env`: an unset or non-unicode variable means "use the default".
    Rule { pattern: ".ok()", budget: 1, why: "errors are discarded without inspection" },
    Rule { pattern: "#[allow(dead_code)]", budget: 0, why: "delete unused code" },
];

/// One rule violation site.
struct Hit {
    path: String,
    line: usize,
    text: String,
}

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

fn production_files() -> Vec<PathBuf> {
    let root = workspace_root();
    let mut out = Vec::new();
    for dir in SOURCE_ROOTS {
        walk(&root.join(dir), &mut out);
    }
    out.sort();
    out
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk(&path, out);
            continue;
        }
        let is_rs = path.extension().is_some_and(|ext| ext == "rs");
        let is_test = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with("_test.rs"));
        if is_rs && !is_test {
            out.push(path);
        }
    }
}

fn scan(files: &[PathBuf], pattern: &str) -> Vec<Hit> {
    let root = workspace_root();
    let mut hits = Vec::new();
    for path in files {
        let content = fs::read_to_string(path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()));
        let shown = path.strip_prefix(&root).unwrap_or(path).display().to_string();
        for (index, line) in content.lines().enumerate() {
            if line.trim_start().starts_with("//") {
                continue;
            }
            if line.contains(pattern) {
                hits.push(Hit { path: shown.clone(), line: index + 1, text: line.trim().to_owned() });
            }
        }
    }
    hits
}

#[test]
fn every_source_root_contributes_files() {
    let root = workspace_root();
    let files = production_files();
    for dir in SOURCE_ROOTS {
        let prefix = root.join(dir);
        assert!(files.iter().any(|f| f.starts_with(&prefix)), "no production sources found under {dir}");
    }
}

#[test]
fn test_modules_are_not_scanned() {
    let files = production_files();
    assert!(!files.is_empty());
    assert!(files.iter().all(|f| !f.to_string_lossy().ends_with("_test.rs")));
    assert!(files.iter().any(|f| f.ends_with("client/src/net/transport.rs")));
    assert!(files.iter().any(|f| f.ends_with("src/services/relay.rs")));
}

#[test]
fn rule_budgets_hold_across_workspace() {
    let files = production_files();
    let mut report = Vec::new();
    for rule in RULES {
        let hits = scan(&files, rule.pattern);
        if hits.len() > rule.budget {
            report.push(format!("`{}`: {} found, budget {} ({})", rule.pattern, hits.len(), rule.budget, rule.why));
            report.extend(hits.iter().map(|h| format!("  {}:{}  {}", h.path, h.line, h.text)));
        }
    }
    assert!(report.is_empty(), "hygiene budgets exceeded:\n{}", report.join("\n"));
}
