//! Hygiene: source-scan budgets for patterns that crash or hide failures.
//!
//! Host code talks to a socket and a page it does not control, so errors are
//! logged or returned. Every budget is zero; `*_test.rs` files are exempt.

use std::fs;
use std::path::{Path, PathBuf};

struct SourceFile {
    path: String,
    content: String,
}

fn source_files() -> Vec<SourceFile> {
    let mut paths = Vec::new();
    collect_rs_paths(Path::new("src"), &mut paths);
    paths.sort();
    paths
        .into_iter()
        .filter_map(|path| {
            let content = fs::read_to_string(&path).ok()?;
            Some(SourceFile { path: path.display().to_string(), content })
        })
        .collect()
}

fn collect_rs_paths(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for path in entries.flatten().map(|entry| entry.path()) {
        if path.is_dir() {
            collect_rs_paths(&path, out);
        } else if path.extension().is_some_and(|e| e == "rs")
            && !path.to_string_lossy().ends_with("_test.rs")
        {
            out.push(path);
        }
    }
}

/// `(path, line number)` of every line containing `pattern`.
fn hits(files: &[SourceFile], pattern: &str) -> Vec<(String, usize)> {
    files
        .iter()
        .flat_map(|file| {
            file.content
                .lines()
                .enumerate()
                .filter(|(_, line)| line.contains(pattern))
                .map(|(n, _)| (file.path.clone(), n + 1))
        })
        .collect()
}

fn check(pattern: &str, budget: usize) {
    let files = source_files();
    assert!(!files.is_empty(), "no sources found; run from the crate root");
    let found = hits(&files, pattern);
    let listing: Vec<String> = found.iter().map(|(path, line)| format!("  {path}:{line}")).collect();
    assert!(
        found.len() <= budget,
        "`{pattern}` budget exceeded: found {}, max {budget}.\n{}",
        found.len(),
        listing.join("\n")
    );
}

macro_rules! budget {
    ($($name:ident => $pattern:expr, $max:expr;)*) => {
        $(
            #[test]
            fn $name() {
                check($pattern, $max);
            }
        )*
    };
}

// =============================================================
// Panics
// =============================================================

budget! {
    unwrap_budget => ".unwrap()", 0;
    expect_budget => ".expect(", 0;
    panic_budget => "panic!(", 0;
    unreachable_budget => "unreachable!(", 0;
    todo_budget => "todo!(", 0;
    unimplemented_budget => "unimplemented!(", 0;
}

// =============================================================
// Silent loss
// =============================================================

budget! {
    silent_discard_budget => "let _ =", 0;
    dot_ok_budget => ".ok()", 0;
}

// =============================================================
// Structure
// =============================================================

budget! {
    allow_dead_code_budget => "#[allow(dead_code)]", 0;
}
