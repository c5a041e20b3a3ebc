//! Workspace discovery
//!
//! Finds the project root used as the report base directory and picks the
//! language/document a server is started for when the user names neither.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::models::symbol::Language;

/// Version control and wsymbol markers; these win over build manifests
const ROOT_MARKERS: &[&str] = &[".git", ".hg", ".svn", ".wsymbol"];

/// Build manifests, used when no root marker exists
const MANIFEST_MARKERS: &[&str] = &[
    "Cargo.toml",
    "go.mod",
    "package.json",
    "pyproject.toml",
    "setup.py",
    "pom.xml",
    "build.gradle",
    "build.gradle.kts",
    "Gemfile",
    "composer.json",
    "build.zig",
    "compile_commands.json",
];

const SCAN_DEPTH: usize = 6;

/// Nearest ancestor of `start` that looks like a project root
///
/// Falls back to `start` itself when nothing matches.
pub fn project_root(start: &Path) -> PathBuf {
    nearest_with(start, ROOT_MARKERS)
        .or_else(|| nearest_with(start, MANIFEST_MARKERS))
        .unwrap_or_else(|| start.to_path_buf())
}

fn nearest_with(start: &Path, markers: &[&str]) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| markers.iter().any(|m| dir.join(m).exists()))
        .map(Path::to_path_buf)
}

fn walker(root: &Path) -> ignore::Walk {
    WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_exclude(true)
        .max_depth(Some(SCAN_DEPTH))
        .sort_by_file_name(|a, b| a.cmp(b))
        .build()
}

/// Languages present under `root`, most files first
pub fn detect_languages(root: &Path) -> Vec<Language> {
    let mut counts: HashMap<Language, usize> = HashMap::new();
    for entry in walker(root).filter_map(Result::ok) {
        if entry.file_type().is_some_and(|t| t.is_file()) {
            let language = Language::from_path(entry.path());
            if language != Language::Unknown {
                *counts.entry(language).or_default() += 1;
            }
        }
    }

    let mut languages: Vec<(Language, usize)> = counts.into_iter().collect();
    languages.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.lsp_id().cmp(b.0.lsp_id())));
    languages.into_iter().map(|(lang, _)| lang).collect()
}

/// First source file of `language` under `root`, in file-name order
pub fn first_source_file(root: &Path, language: Language) -> Option<PathBuf> {
    walker(root)
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_some_and(|t| t.is_file()))
        .map(|e| e.into_path())
        .find(|path| Language::from_path(path) == language)
}
