//! Terminal implementation of the editor surface
//!
//! Status lines, dialogs and the chooser go to stderr so stdout carries only
//! results: the report text and navigation targets.

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use super::color::{self, ERASE_LINE, HEADER, RESET};
use super::{Host, ReportPanel};
use crate::models::report::Span;
use crate::models::symbol::OpenInstruction;

type Input = Box<dyn AsyncBufRead + Send + Unpin>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct TerminalHost {
    interactive: bool,
    open_command: Option<String>,
    statuses: Mutex<Vec<(String, String)>>,
    input: tokio::sync::Mutex<Input>,
    panel: Arc<TerminalPanel>,
}

impl TerminalHost {
    /// Host reading from stdin
    pub fn new(color: bool, open_command: Option<String>) -> Self {
        Self::with_input(
            Box::new(BufReader::new(tokio::io::stdin())),
            color,
            open_command,
        )
    }

    pub fn with_input(input: Input, color: bool, open_command: Option<String>) -> Self {
        Self {
            interactive: io::stderr().is_terminal(),
            open_command,
            statuses: Mutex::new(Vec::new()),
            input: tokio::sync::Mutex::new(input),
            panel: Arc::new(TerminalPanel::new(color)),
        }
    }

    pub fn panel(&self) -> Arc<TerminalPanel> {
        Arc::clone(&self.panel)
    }

    fn redraw_status(&self, statuses: &[(String, String)]) {
        if !self.interactive {
            return;
        }
        let line = statuses
            .iter()
            .map(|(_, text)| text.as_str())
            .collect::<Vec<_>>()
            .join(" | ");
        let mut err = io::stderr().lock();
        let _ = write!(err, "{ERASE_LINE}{line}");
        let _ = err.flush();
    }

    /// Print a full line to stderr without clobbering the status line
    fn print_line(&self, text: &str) {
        let mut err = io::stderr().lock();
        if self.interactive {
            let _ = write!(err, "{ERASE_LINE}");
        }
        let _ = writeln!(err, "{text}");
        drop(err);
        let statuses = lock(&self.statuses).clone();
        if !statuses.is_empty() {
            self.redraw_status(&statuses);
        }
    }

    async fn read_line(&self, label: &str) -> Option<String> {
        {
            let mut err = io::stderr().lock();
            if self.interactive {
                let _ = write!(err, "{ERASE_LINE}");
            }
            let _ = write!(err, "{label}");
            let _ = err.flush();
        }

        let mut line = String::new();
        let mut input = self.input.lock().await;
        match input.read_line(&mut line).await {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(e) => {
                tracing::warn!("Failed to read input: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl Host for TerminalHost {
    fn status_message(&self, text: &str) {
        self.print_line(text);
    }

    fn set_status(&self, key: &str, text: &str) {
        let snapshot = {
            let mut statuses = lock(&self.statuses);
            match statuses.iter_mut().find(|(k, _)| k == key) {
                Some(entry) => entry.1 = text.to_string(),
                None => statuses.push((key.to_string(), text.to_string())),
            }
            statuses.clone()
        };
        tracing::debug!("status {}: {}", key, text);
        self.redraw_status(&snapshot);
    }

    fn erase_status(&self, key: &str) {
        let snapshot = {
            let mut statuses = lock(&self.statuses);
            statuses.retain(|(k, _)| k != key);
            statuses.clone()
        };
        self.redraw_status(&snapshot);
    }

    fn message_dialog(&self, text: &str) {
        self.print_line(text);
    }

    fn error_dialog(&self, text: &str) {
        self.print_line(&format!("error: {text}"));
    }

    async fn prompt(&self, label: &str) -> Option<String> {
        self.read_line(label).await
    }

    async fn choose(&self, items: Vec<String>) -> Option<usize> {
        if items.is_empty() {
            return None;
        }

        {
            let mut err = io::stderr().lock();
            if self.interactive {
                let _ = write!(err, "{ERASE_LINE}");
            }
            for (i, item) in items.iter().enumerate() {
                let _ = writeln!(err, "{:>4}) {}", i + 1, item);
            }
        }

        let label = format!("select [1-{}], empty to cancel: ", items.len());
        loop {
            let answer = self.read_line(&label).await?;
            match parse_choice(&answer, items.len()) {
                Choice::Cancel => return None,
                Choice::Pick(index) => return Some(index),
                Choice::Invalid => self.print_line(&format!("not a choice: {}", answer.trim())),
            }
        }
    }

    async fn open_file(&self, target: &OpenInstruction) -> io::Result<()> {
        let Some(template) = self.open_command.as_deref() else {
            let mut out = io::stdout().lock();
            writeln!(out, "{}", target.encoded())?;
            return out.flush();
        };

        let argv = expand_open_command(template, target);
        let Some((program, args)) = argv.split_first() else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "navigation.open_command is empty",
            ));
        };

        tracing::debug!("Opening {} with {:?}", target.encoded(), argv);
        let status = tokio::process::Command::new(program)
            .args(args)
            .status()
            .await?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!("{program} exited with {status}")))
        }
    }

    fn report_panel(&self) -> Arc<dyn ReportPanel> {
        self.panel.clone()
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Choice {
    Cancel,
    Pick(usize),
    Invalid,
}

/// Interpret a 1-based answer to the chooser
fn parse_choice(answer: &str, count: usize) -> Choice {
    let answer = answer.trim();
    if answer.is_empty() || answer.eq_ignore_ascii_case("q") {
        return Choice::Cancel;
    }
    match answer.parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => Choice::Pick(n - 1),
        _ => Choice::Invalid,
    }
}

/// Split the template on whitespace and substitute placeholders per word
fn expand_open_command(template: &str, target: &OpenInstruction) -> Vec<String> {
    let path = target.path.display().to_string();
    template
        .split_whitespace()
        .map(|word| {
            word.replace("{path}", &path)
                .replace("{line}", &target.line.to_string())
                .replace("{column}", &target.column.to_string())
        })
        .collect()
}

#[derive(Debug, Default)]
struct PanelState {
    text: String,
    highlights: Vec<Span>,
    read_only: bool,
    visible: bool,
    base_dir: Option<PathBuf>,
}

/// Report panel printed to stdout when shown
pub struct TerminalPanel {
    color: bool,
    state: Mutex<PanelState>,
}

impl TerminalPanel {
    pub fn new(color: bool) -> Self {
        Self {
            color,
            state: Mutex::new(PanelState::default()),
        }
    }

    pub fn text(&self) -> String {
        lock(&self.state).text.clone()
    }

    pub fn highlights(&self) -> Vec<Span> {
        lock(&self.state).highlights.clone()
    }

    pub fn is_read_only(&self) -> bool {
        lock(&self.state).read_only
    }

    pub fn is_visible(&self) -> bool {
        lock(&self.state).visible
    }

    pub fn base_dir(&self) -> Option<PathBuf> {
        lock(&self.state).base_dir.clone()
    }

    fn render(&self, state: &PanelState) -> String {
        if !self.color {
            return state.text.clone();
        }
        let painted = color::paint_spans(&state.text, &state.highlights);
        painted
            .lines()
            .map(|line| {
                if line.starts_with('◌') {
                    format!("{HEADER}{line}{RESET}\n")
                } else {
                    format!("{line}\n")
                }
            })
            .collect()
    }
}

impl ReportPanel for TerminalPanel {
    fn set_read_only(&self, read_only: bool) {
        lock(&self.state).read_only = read_only;
    }

    fn clear(&self) {
        let mut state = lock(&self.state);
        if state.read_only {
            tracing::warn!("Ignoring clear on read-only report panel");
            return;
        }
        state.text.clear();
        state.highlights.clear();
    }

    fn append(&self, text: &str) {
        let mut state = lock(&self.state);
        if state.read_only {
            tracing::warn!("Ignoring append on read-only report panel");
            return;
        }
        state.text.push_str(text);
    }

    fn add_highlights(&self, spans: &[Span]) {
        let mut state = lock(&self.state);
        let len = state.text.len();
        state
            .highlights
            .extend(spans.iter().copied().filter(|s| s.end <= len && !s.is_empty()));
        state.highlights.sort_by_key(|s| s.start);
    }

    fn set_base_dir(&self, dir: &Path) {
        lock(&self.state).base_dir = Some(dir.to_path_buf());
    }

    fn show(&self) {
        let rendered = {
            let mut state = lock(&self.state);
            state.visible = true;
            self.render(&state)
        };
        let mut out = io::stdout().lock();
        let _ = out.write_all(rendered.as_bytes());
        let _ = out.flush();
    }

    fn hide(&self) {
        lock(&self.state).visible = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_with_input(input: &'static str) -> TerminalHost {
        TerminalHost::with_input(Box::new(BufReader::new(input.as_bytes())), false, None)
    }

    fn target() -> OpenInstruction {
        OpenInstruction {
            path: PathBuf::from("/work/src/main.rs"),
            line: 12,
            column: 5,
        }
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice("2", 3), Choice::Pick(1));
        assert_eq!(parse_choice(" 1 \n", 3), Choice::Pick(0));
        assert_eq!(parse_choice("", 3), Choice::Cancel);
        assert_eq!(parse_choice("q", 3), Choice::Cancel);
        assert_eq!(parse_choice("0", 3), Choice::Invalid);
        assert_eq!(parse_choice("4", 3), Choice::Invalid);
        assert_eq!(parse_choice("two", 3), Choice::Invalid);
    }

    #[test]
    fn test_expand_open_command() {
        let argv = expand_open_command("code --goto {path}:{line}:{column}", &target());
        assert_eq!(argv, vec!["code", "--goto", "/work/src/main.rs:12:5"]);

        let argv = expand_open_command("vim +{line} {path}", &target());
        assert_eq!(argv, vec!["vim", "+12", "/work/src/main.rs"]);
    }

    #[tokio::test]
    async fn test_choose_retries_invalid_answers() {
        let host = host_with_input("9\nabc\n2\n");
        let picked = host
            .choose(vec!["a".to_string(), "b".to_string(), "c".to_string()])
            .await;
        assert_eq!(picked, Some(1));
    }

    #[tokio::test]
    async fn test_choose_eof_dismisses() {
        let host = host_with_input("");
        assert_eq!(host.choose(vec!["a".to_string()]).await, None);
        assert_eq!(host.choose(Vec::new()).await, None);
    }

    #[tokio::test]
    async fn test_prompt_reads_lines() {
        let host = host_with_input("Foo\r\nbar\n");
        assert_eq!(host.prompt("symbol: ").await.as_deref(), Some("Foo"));
        assert_eq!(host.prompt("symbol: ").await.as_deref(), Some("bar"));
        assert_eq!(host.prompt("symbol: ").await, None);
    }

    #[tokio::test]
    async fn test_failing_open_command_is_error() {
        let host = TerminalHost::with_input(
            Box::new(BufReader::new("".as_bytes())),
            false,
            Some("wsymbol-definitely-not-a-real-binary {path}".to_string()),
        );
        assert!(host.open_file(&target()).await.is_err());
    }

    #[test]
    fn test_panel_rejects_writes_when_read_only() {
        let panel = TerminalPanel::new(false);
        panel.append("first");
        panel.set_read_only(true);
        panel.append(" second");
        panel.clear();
        assert_eq!(panel.text(), "first");

        panel.set_read_only(false);
        panel.clear();
        assert_eq!(panel.text(), "");
    }

    #[test]
    fn test_panel_highlights_sorted_and_bounded() {
        let panel = TerminalPanel::new(false);
        panel.append("foo bar foo");
        panel.add_highlights(&[Span::new(8, 11), Span::new(0, 3), Span::new(9, 40)]);
        assert_eq!(panel.highlights(), vec![Span::new(0, 3), Span::new(8, 11)]);
    }

    #[test]
    fn test_panel_color_render_marks_headers() {
        let panel = TerminalPanel::new(true);
        panel.append("◌ a.txt:\n\t       1:1    foo\n");
        panel.add_highlights(&[Span::new(26, 29)]);
        let state = lock(&panel.state);
        let rendered = panel.render(&state);
        assert!(rendered.starts_with(HEADER));
        assert!(rendered.contains(color::MATCH));
    }
}
