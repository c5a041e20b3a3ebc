//! Editor surface
//!
//! The search never touches a terminal or an editor directly; it talks to a
//! [`Host`]. [`terminal::TerminalHost`] is the implementation the CLI uses.

pub mod color;
pub mod terminal;

use std::io;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::models::report::Span;
use crate::models::symbol::OpenInstruction;

pub use terminal::{TerminalHost, TerminalPanel};

#[async_trait]
pub trait Host: Send + Sync {
    /// One-off, non-blocking notice
    fn status_message(&self, text: &str);

    /// Keyed status that stays until erased
    fn set_status(&self, key: &str, text: &str);

    fn erase_status(&self, key: &str);

    /// Informational dialog
    fn message_dialog(&self, text: &str);

    /// Blocking error dialog
    fn error_dialog(&self, text: &str);

    /// Ask for one line of input; `None` when input is exhausted
    async fn prompt(&self, label: &str) -> Option<String>;

    /// Let the user pick one of `items`; `None` when dismissed
    async fn choose(&self, items: Vec<String>) -> Option<usize>;

    /// Open a file at a 1-based position
    async fn open_file(&self, target: &OpenInstruction) -> io::Result<()>;

    /// The read-only panel reports are rendered into
    fn report_panel(&self) -> Arc<dyn ReportPanel>;
}

/// A text panel the host owns
///
/// Writes are only accepted while the panel is writable.
pub trait ReportPanel: Send + Sync {
    fn set_read_only(&self, read_only: bool);
    fn clear(&self);
    fn append(&self, text: &str);
    /// Mark query occurrences in the current text
    fn add_highlights(&self, spans: &[Span]);
    /// Directory that relative paths in the report are relative to
    fn set_base_dir(&self, dir: &Path);
    fn show(&self);
    fn hide(&self);
}
