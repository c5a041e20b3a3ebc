//! Chooser labels and the grouped report
//!
//! Report layout:
//!
//! ```text
//! 3 references for 'foo'
//!
//! ◌ src/a.rs:
//! \t       1:1    fn foo() {}
//! \t       5:3    let x = foo();
//!
//! ◌ src/b.rs:
//! \t      10:1    foo
//!
//! ```

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::models::lsp::{Position, is_file_uri, uri_to_path};
use crate::models::report::{RenderedReport, Span};
use crate::models::symbol::{Query, SymbolEntity};

/// One-line chooser label: `name (kind) - container -- basename`
pub fn chooser_item(entity: &SymbolEntity) -> String {
    format!(
        "{} ({}) - {} -- {}",
        entity.name,
        entity.kind.label(),
        entity.container(),
        basename(&entity.location.uri)
    )
}

/// Last path segment; empty for a bare `file:///`, the whole URI when a
/// non-file URI has no segment at all
fn basename(uri: &str) -> String {
    if is_file_uri(uri) {
        return uri_to_path(uri)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    let rest = uri.split_once("://").map_or(uri, |(_, rest)| rest);
    match rest.trim_end_matches('/').rsplit('/').next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => uri.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    /// Zero-based start of the symbol
    pub point: Position,
    /// Source line at `point.line`, as read while building the report
    pub text: String,
}

/// Entities grouped by relative file path in first-encounter order
///
/// Built once per response and never reused: the captured source lines are
/// only as fresh as the moment the report was built.
#[derive(Debug, Default)]
pub struct GroupedReport {
    groups: Vec<(String, Vec<ReportEntry>)>,
    index: HashMap<String, usize>,
    count: usize,
}

impl GroupedReport {
    /// Group `entities` relative to `base_dir`, reading each start line
    pub async fn build(entities: &[SymbolEntity], base_dir: &Path) -> Self {
        let mut lines = LineReader::default();
        let mut report = Self::default();

        for entity in entities {
            let uri = &entity.location.uri;
            let point = entity.start();
            let (relative, text) = if is_file_uri(uri) {
                let path = uri_to_path(uri);
                let text = lines.line(&path, point.line).await;
                (relative_path(&path, base_dir), text)
            } else {
                tracing::debug!("No source preview for non-file location {}", uri);
                (uri.clone(), String::new())
            };
            report.push(relative, ReportEntry { point, text });
        }

        report
    }

    /// Append an entry to its file's group, opening the group if new
    pub fn push(&mut self, relative: String, entry: ReportEntry) {
        self.count += 1;
        match self.index.get(&relative) {
            Some(&slot) => self.groups[slot].1.push(entry),
            None => {
                self.index.insert(relative.clone(), self.groups.len());
                self.groups.push((relative, vec![entry]));
            }
        }
    }

    /// Number of entries across all files
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn files(&self) -> impl Iterator<Item = (&str, &[ReportEntry])> {
        self.groups
            .iter()
            .map(|(path, entries)| (path.as_str(), entries.as_slice()))
    }

    pub fn render(&self, query: &Query) -> RenderedReport {
        let mut text = format!("{} references for '{}'\n\n", self.count, query.text);

        for (path, entries) in self.files() {
            let _ = writeln!(text, "◌ {path}:");
            for entry in entries {
                let (line, column) = entry.point.to_host();
                let _ = writeln!(text, "\t{:>8}:{:<4} {}", line, column, entry.text.trim());
            }
            text.push('\n');
        }

        let highlights = highlight_spans(&text, &query.text);
        RenderedReport { text, highlights }
    }
}

/// Byte spans of every whole-word occurrence of `query` in `text`
pub fn highlight_spans(text: &str, query: &str) -> Vec<Span> {
    if query.is_empty() {
        return Vec::new();
    }
    match Regex::new(&format!(r"\b{}\b", regex::escape(query))) {
        Ok(pattern) => pattern
            .find_iter(text)
            .map(|m| Span::new(m.start(), m.end()))
            .collect(),
        Err(e) => {
            tracing::warn!("Cannot highlight query '{}': {}", query, e);
            Vec::new()
        }
    }
}

fn relative_path(path: &Path, base_dir: &Path) -> String {
    pathdiff::diff_paths(path, base_dir)
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

/// Reads source lines for a single report
///
/// Each file is read at most once per report and the contents are dropped
/// with the reader.
#[derive(Default)]
struct LineReader {
    files: HashMap<PathBuf, Option<Vec<String>>>,
}

impl LineReader {
    async fn line(&mut self, path: &Path, row: u32) -> String {
        if !self.files.contains_key(path) {
            let contents = match tokio::fs::read(path).await {
                Ok(bytes) => Some(
                    String::from_utf8_lossy(&bytes)
                        .lines()
                        .map(str::to_string)
                        .collect(),
                ),
                Err(e) => {
                    tracing::debug!("Cannot read {} for preview: {}", path.display(), e);
                    None
                }
            };
            self.files.insert(path.to_path_buf(), contents);
        }

        self.files
            .get(path)
            .and_then(|lines| lines.as_ref())
            .and_then(|lines| lines.get(row as usize))
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lsp::path_to_uri;
    use crate::models::symbol::{Location, SymbolKind};
    use tempfile::TempDir;

    fn entry(line: u32, character: u32, text: &str) -> ReportEntry {
        ReportEntry {
            point: Position::new(line, character),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_chooser_item_layout() {
        let entity = SymbolEntity::new(
            "parse",
            SymbolKind::Method,
            Location::point("file:///work/src/parser.rs", 10, 4),
        )
        .with_container("Parser");
        assert_eq!(chooser_item(&entity), "parse (method) - Parser -- parser.rs");

        let bare = SymbolEntity::new(
            "Thing",
            SymbolKind::Unknown(77),
            Location::point("file:///work/thing%20one.rs", 0, 0),
        );
        assert_eq!(chooser_item(&bare), "Thing (unknown) -  -- thing one.rs");
    }

    #[test]
    fn test_basename_edge_uris() {
        assert_eq!(basename("file:///"), "");
        assert_eq!(basename("file:///work/src/"), "src");
        assert_eq!(basename("jdt://contents/java.base/String.class"), "String.class");
        assert_eq!(basename("untitled:Untitled-1"), "untitled:Untitled-1");
        assert_eq!(basename("jdt://"), "jdt://");
    }

    #[test]
    fn test_fixed_report_layout() {
        let mut report = GroupedReport::default();
        report.push("a.txt".to_string(), entry(0, 0, "foo"));
        report.push("a.txt".to_string(), entry(4, 2, "  bar baz  "));
        report.push("b.txt".to_string(), entry(9, 0, "qux"));

        let rendered = report.render(&Query::new("foo"));
        assert_eq!(
            rendered.text,
            "3 references for 'foo'\n\n\
             ◌ a.txt:\n\
             \t       1:1    foo\n\
             \t       5:3    bar baz\n\
             \n\
             ◌ b.txt:\n\
             \t      10:1    qux\n\
             \n"
        );
    }

    #[test]
    fn test_grouping_is_stable_partition() {
        let mut report = GroupedReport::default();
        report.push("b.rs".to_string(), entry(1, 0, "one"));
        report.push("a.rs".to_string(), entry(2, 0, "two"));
        report.push("b.rs".to_string(), entry(3, 0, "three"));
        report.push("a.rs".to_string(), entry(0, 0, "four"));

        let files: Vec<_> = report
            .files()
            .map(|(path, entries)| {
                (
                    path.to_string(),
                    entries.iter().map(|e| e.text.clone()).collect::<Vec<_>>(),
                )
            })
            .collect();
        assert_eq!(
            files,
            vec![
                ("b.rs".to_string(), vec!["one".to_string(), "three".to_string()]),
                ("a.rs".to_string(), vec!["two".to_string(), "four".to_string()]),
            ]
        );
        assert_eq!(report.len(), 4);
    }

    #[test]
    fn test_highlight_whole_words_only() {
        let text = "\t       1:1    foo foobar barfoo foo_x (foo)\n";
        let spans = highlight_spans(text, "foo");
        let marked: Vec<_> = spans.iter().map(|s| &text[s.start..s.end]).collect();
        assert_eq!(marked, vec!["foo", "foo"]);
        assert_eq!(spans[0].start, text.find("foo ").unwrap());
    }

    #[test]
    fn test_highlight_escapes_and_empty_query() {
        assert!(highlight_spans("anything", "").is_empty());
        let spans = highlight_spans("a.b axb a.b", "a.b");
        assert_eq!(spans, vec![Span::new(0, 3), Span::new(8, 11)]);
    }

    #[tokio::test]
    async fn test_build_reads_lines_relative_to_base() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("lib.rs"), "// header\n    pub fn foo() {}\n").unwrap();

        let uri = path_to_uri(&src.join("lib.rs"));
        let entities = vec![
            SymbolEntity::new("foo", SymbolKind::Function, Location::point(&uri, 1, 11)),
            SymbolEntity::new("gone", SymbolKind::Function, Location::point(&uri, 40, 0)),
        ];

        let report = GroupedReport::build(&entities, dir.path()).await;
        let files: Vec<_> = report.files().collect();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].0, Path::new("src").join("lib.rs").to_string_lossy());
        assert_eq!(files[0].1[0].text, "    pub fn foo() {}");
        assert_eq!(files[0].1[1].text, "");

        let rendered = report.render(&Query::new("foo"));
        assert!(rendered.text.contains("\t       2:12   pub fn foo() {}\n"));
    }

    #[tokio::test]
    async fn test_build_reads_fresh_each_time() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "old\n").unwrap();
        let entities = vec![SymbolEntity::new(
            "x",
            SymbolKind::Variable,
            Location::point(path_to_uri(&file), 0, 0),
        )];

        let first = GroupedReport::build(&entities, dir.path()).await;
        std::fs::write(&file, "new\n").unwrap();
        let second = GroupedReport::build(&entities, dir.path()).await;

        assert_eq!(first.files().next().unwrap().1[0].text, "old");
        assert_eq!(second.files().next().unwrap().1[0].text, "new");
    }

    #[test]
    fn test_relative_path_outside_base() {
        let rel = relative_path(Path::new("/work/other/x.rs"), Path::new("/work/proj"));
        assert_eq!(rel, Path::new("..").join("other").join("x.rs").to_string_lossy());
    }
}
