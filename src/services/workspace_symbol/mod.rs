//! Workspace symbol search
//!
//! A search session ties the pieces together:
//! - [`dispatcher`] sends `workspace/symbol` and queues completions
//! - [`aggregator`] classifies each completion into a [`SearchOutcome`]
//! - [`formatter`] renders chooser labels and the grouped report
//! - [`navigator`] opens the chosen symbol in the host
//! - [`report`] owns the per-workspace report panel
//!
//! Queries may overlap. Every completion carries the ticket of the query that
//! produced it, so messages always name the right query text.

pub mod aggregator;
pub mod dispatcher;
pub mod formatter;
pub mod navigator;
pub mod report;

#[cfg(test)]
pub(crate) mod testing;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use crate::error::SearchError;
use crate::host::Host;
use crate::infra::lsp::protocol::ServerCapabilities;
use crate::infra::lsp::{LspClient, RequestSender};
use crate::models::symbol::{OpenInstruction, Query, SymbolEntity};

pub use crate::models::config::DisplayMode;
pub use aggregator::{SearchOutcome, failure_text, resolve};
pub use dispatcher::{Completion, QueryDispatcher, QueryTicket};
pub use formatter::{GroupedReport, chooser_item, highlight_spans};
pub use navigator::SymbolNavigator;
pub use report::ReportSurface;

/// Status key for the "searching…" indicator
pub const STATUS_KEY: &str = "lsp_workspace_symbol";
pub const WORKSPACE_SYMBOL: &str = "workspace/symbol";
/// Report-mode notice for an empty result
pub const NO_SYMBOLS: &str = "No symbols found";

/// The server a search talks to
pub struct SearchTarget {
    /// Human-readable server name for messages
    pub server: String,
    pub capabilities: ServerCapabilities,
    pub sender: Arc<dyn RequestSender>,
}

impl SearchTarget {
    pub async fn from_client(client: &Arc<LspClient>) -> Self {
        let server = client
            .server_name()
            .await
            .unwrap_or_else(|| format!("{} language server", client.language()));
        Self {
            server,
            capabilities: client.capabilities().await,
            sender: client.clone(),
        }
    }
}

/// What presenting an outcome did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presented {
    Failed { reason: String },
    NoMatches,
    Navigated(OpenInstruction),
    NavigationFailed { reason: String },
    /// The chooser was closed without a pick
    Dismissed,
    Reported { files: usize, references: usize },
    /// An older query answered after a newer one already navigated
    Superseded,
}

pub struct WorkspaceSymbolSearch {
    dispatcher: QueryDispatcher,
    completions: Mutex<mpsc::UnboundedReceiver<Completion>>,
    host: Arc<dyn Host>,
    navigator: SymbolNavigator,
    report: Arc<ReportSurface>,
    mode: DisplayMode,
    base_dir: PathBuf,
}

impl WorkspaceSymbolSearch {
    /// Session for `target`; fails when the server lacks workspace symbols
    pub fn new(
        target: &SearchTarget,
        host: Arc<dyn Host>,
        mode: DisplayMode,
        base_dir: &Path,
    ) -> Result<Self, SearchError> {
        let (dispatcher, completions) = QueryDispatcher::new(target, Arc::clone(&host))?;
        Ok(Self {
            dispatcher,
            completions: Mutex::new(completions),
            navigator: SymbolNavigator::new(Arc::clone(&host)),
            report: ReportSurface::for_root(base_dir, host.report_panel()),
            host,
            mode,
            base_dir: base_dir.to_path_buf(),
        })
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn dispatch(&self, query: Query) -> QueryTicket {
        self.dispatcher.dispatch(query)
    }

    /// Next completion from any in-flight query
    pub async fn next_completion(&self) -> Option<Completion> {
        self.completions.lock().await.recv().await
    }

    /// Classify and present a completion
    pub async fn handle(&self, completion: Completion) -> Presented {
        let outcome = resolve(&completion.result);
        self.present(&completion.ticket, outcome).await
    }

    /// Dispatch `query` and present completions until its own has been shown
    ///
    /// Completions of earlier queries that arrive first are presented too.
    pub async fn run(&self, query: Query) -> Result<Presented, SearchError> {
        let ticket = self.dispatch(query);
        loop {
            let completion = self
                .next_completion()
                .await
                .ok_or(SearchError::SessionClosed)?;
            let own = completion.ticket == ticket;
            let presented = self.handle(completion).await;
            if !own {
                continue;
            }
            return match presented {
                Presented::Failed { reason } => Err(SearchError::RequestFailed { reason }),
                other => Ok(other),
            };
        }
    }

    pub async fn present(&self, ticket: &QueryTicket, outcome: SearchOutcome) -> Presented {
        tracing::debug!(
            "Presenting {} result(s) for '{}' (#{})",
            outcome.len(),
            ticket.query,
            ticket.generation
        );

        match outcome {
            SearchOutcome::Failure { reason } => {
                self.host.error_dialog(&failure_text(&reason));
                Presented::Failed { reason }
            }
            SearchOutcome::Empty => {
                if self.report.is_visible() {
                    self.report.hide().await;
                }
                match self.mode {
                    DisplayMode::Report => self
                        .host
                        .status_message(&format!("{NO_SYMBOLS} for '{}'", ticket.query.text)),
                    DisplayMode::Chooser => self.host.message_dialog(&format!(
                        "No matches found for query string: '{}'",
                        ticket.query.text
                    )),
                }
                Presented::NoMatches
            }
            SearchOutcome::Single(entity) => {
                if self.is_stale(ticket) {
                    return Presented::Superseded;
                }
                self.navigate(ticket, &entity).await
            }
            SearchOutcome::Multiple(entities) => match self.mode {
                DisplayMode::Report => self.publish_report(ticket, &entities).await,
                DisplayMode::Chooser => {
                    if self.is_stale(ticket) {
                        return Presented::Superseded;
                    }
                    let items = entities.iter().map(chooser_item).collect();
                    match self.host.choose(items).await {
                        Some(index) => match entities.get(index) {
                            Some(entity) => self.navigate(ticket, entity).await,
                            None => Presented::Dismissed,
                        },
                        None => Presented::Dismissed,
                    }
                }
            },
        }
    }

    /// Whether a newer query has already navigated somewhere
    fn is_stale(&self, ticket: &QueryTicket) -> bool {
        self.mode == DisplayMode::Chooser && self.dispatcher.is_superseded(ticket)
    }

    async fn navigate(&self, ticket: &QueryTicket, entity: &SymbolEntity) -> Presented {
        match self.navigator.navigate(entity).await {
            Ok(target) => {
                self.dispatcher.mark_applied(ticket);
                Presented::Navigated(target)
            }
            Err(e) => {
                tracing::debug!("Navigation to {} failed: {}", entity.location, e);
                let reason = e.to_string();
                self.host.error_dialog(&reason);
                Presented::NavigationFailed { reason }
            }
        }
    }

    async fn publish_report(&self, ticket: &QueryTicket, entities: &[SymbolEntity]) -> Presented {
        let grouped = GroupedReport::build(entities, &self.base_dir).await;
        let rendered = grouped.render(&ticket.query);
        self.report.publish(&rendered, &self.base_dir).await;
        Presented::Reported {
            files: grouped.files().count(),
            references: grouped.len(),
        }
    }
}
