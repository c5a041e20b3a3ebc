//! The shared report surface
//!
//! One surface per workspace root, shared by every search in the process.
//! Renders are serialised so a newer report replaces an older one whole.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use tokio::sync::Mutex as AsyncMutex;

use crate::host::ReportPanel;
use crate::models::report::RenderedReport;

static SURFACES: OnceLock<Mutex<HashMap<PathBuf, Arc<ReportSurface>>>> = OnceLock::new();

pub struct ReportSurface {
    root: PathBuf,
    panel: Arc<dyn ReportPanel>,
    writing: AsyncMutex<()>,
    visible: AtomicBool,
}

impl ReportSurface {
    /// The surface registered for `root`, created around `panel` on first use
    pub fn for_root(root: &Path, panel: Arc<dyn ReportPanel>) -> Arc<Self> {
        let registry = SURFACES.get_or_init(|| Mutex::new(HashMap::new()));
        let mut surfaces = registry.lock().unwrap_or_else(|p| p.into_inner());
        surfaces
            .entry(root.to_path_buf())
            .or_insert_with(|| {
                tracing::debug!("Creating report surface for {}", root.display());
                Arc::new(Self {
                    root: root.to_path_buf(),
                    panel,
                    writing: AsyncMutex::new(()),
                    visible: AtomicBool::new(false),
                })
            })
            .clone()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Acquire)
    }

    /// Replace the panel's contents with `report` and show it
    pub async fn publish(&self, report: &RenderedReport, base_dir: &Path) {
        let _guard = self.writing.lock().await;
        self.panel.set_read_only(false);
        self.panel.clear();
        self.panel.append(&report.text);
        self.panel.add_highlights(&report.highlights);
        self.panel.set_base_dir(base_dir);
        self.panel.set_read_only(true);
        self.panel.show();
        self.visible.store(true, Ordering::Release);
    }

    pub async fn hide(&self) {
        let _guard = self.writing.lock().await;
        self.panel.hide();
        self.visible.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::TerminalPanel;
    use crate::models::report::Span;
    use tempfile::TempDir;

    fn report(text: &str) -> RenderedReport {
        RenderedReport {
            text: text.to_string(),
            highlights: vec![Span::new(0, 1)],
        }
    }

    #[tokio::test]
    async fn test_one_surface_per_root() {
        let dir = TempDir::new().unwrap();
        let first = ReportSurface::for_root(dir.path(), Arc::new(TerminalPanel::new(false)));
        let second = ReportSurface::for_root(dir.path(), Arc::new(TerminalPanel::new(false)));
        assert!(Arc::ptr_eq(&first, &second));

        let other = TempDir::new().unwrap();
        let third = ReportSurface::for_root(other.path(), Arc::new(TerminalPanel::new(false)));
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[tokio::test]
    async fn test_publish_replaces_and_locks() {
        let dir = TempDir::new().unwrap();
        let panel = Arc::new(TerminalPanel::new(false));
        let surface = ReportSurface::for_root(dir.path(), panel.clone());

        surface.publish(&report("first report\n"), dir.path()).await;
        surface.publish(&report("second\n"), dir.path()).await;

        assert_eq!(panel.text(), "second\n");
        assert_eq!(panel.highlights(), vec![Span::new(0, 1)]);
        assert!(panel.is_read_only());
        assert!(panel.is_visible());
        assert_eq!(panel.base_dir().as_deref(), Some(dir.path()));

        surface.hide().await;
        assert!(!panel.is_visible());
        assert!(!surface.is_visible());
    }

    #[tokio::test]
    async fn test_concurrent_publishes_do_not_interleave() {
        let dir = TempDir::new().unwrap();
        let panel = Arc::new(TerminalPanel::new(false));
        let surface = ReportSurface::for_root(dir.path(), panel.clone());

        let a = report("aaaa\n");
        let b = report("bbbb\n");
        tokio::join!(
            surface.publish(&a, dir.path()),
            surface.publish(&b, dir.path())
        );

        let text = panel.text();
        assert!(text == "aaaa\n" || text == "bbbb\n", "mixed report: {text:?}");
    }
}
