//! Sending `workspace/symbol` requests
//!
//! Each dispatch hands the transport a continuation that closes over its own
//! [`QueryTicket`]. The continuation clears the status line and queues a
//! [`Completion`]; nothing waits or polls for the response.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use tokio::sync::mpsc;

use super::{STATUS_KEY, SearchTarget, WORKSPACE_SYMBOL};
use crate::error::SearchError;
use crate::host::Host;
use crate::infra::lsp::RequestSender;
use crate::infra::lsp::capabilities::provides_workspace_symbols;
use crate::infra::lsp::protocol::{ResponseError, WorkspaceSymbolParams};
use crate::models::symbol::Query;

/// Identifies one dispatched query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTicket {
    pub query: Query,
    /// Dispatch order, starting at 1
    pub generation: u64,
}

/// A response delivered for a ticket
#[derive(Debug)]
pub struct Completion {
    pub ticket: QueryTicket,
    pub result: Result<Value, ResponseError>,
}

pub struct QueryDispatcher {
    sender: Arc<dyn RequestSender>,
    host: Arc<dyn Host>,
    completions: mpsc::UnboundedSender<Completion>,
    generation: AtomicU64,
    /// Newest generation whose result has taken effect
    applied: AtomicU64,
}

impl QueryDispatcher {
    /// Dispatcher for `target`, plus the queue its completions arrive on
    ///
    /// Fails when the target's server does not advertise workspace symbols;
    /// no request is ever sent in that case.
    pub fn new(
        target: &SearchTarget,
        host: Arc<dyn Host>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Completion>), SearchError> {
        if !provides_workspace_symbols(&target.capabilities) {
            return Err(SearchError::CapabilityUnavailable {
                server: target.server.clone(),
            });
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = Self {
            sender: Arc::clone(&target.sender),
            host,
            completions: tx,
            generation: AtomicU64::new(0),
            applied: AtomicU64::new(0),
        };
        Ok((dispatcher, rx))
    }

    /// Send `query` and return immediately
    pub fn dispatch(&self, query: Query) -> QueryTicket {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let ticket = QueryTicket { query, generation };

        tracing::debug!(
            "Dispatching workspace/symbol #{} for '{}'",
            generation,
            ticket.query
        );
        self.host.set_status(STATUS_KEY, "searching…");

        let params = WorkspaceSymbolParams {
            query: ticket.query.text.clone(),
        };
        let params = match serde_json::to_value(&params) {
            Ok(params) => params,
            Err(e) => {
                self.host.erase_status(STATUS_KEY);
                if self
                    .completions
                    .send(Completion {
                        ticket: ticket.clone(),
                        result: Err(ResponseError::new(-1, e.to_string())),
                    })
                    .is_err()
                {
                    tracing::debug!("Search session closed; dropping completion");
                }
                return ticket;
            }
        };

        let host = Arc::clone(&self.host);
        let completions = self.completions.clone();
        let owned = ticket.clone();
        Arc::clone(&self.sender).send_request(
            WORKSPACE_SYMBOL,
            params,
            Box::new(move |result| {
                host.erase_status(STATUS_KEY);
                tracing::debug!("workspace/symbol #{} completed", owned.generation);
                if completions
                    .send(Completion {
                        ticket: owned,
                        result,
                    })
                    .is_err()
                {
                    tracing::debug!("Search session closed; dropping completion");
                }
            }),
        );

        ticket
    }

    /// Record that `ticket`'s result took effect (the user was moved somewhere)
    pub fn mark_applied(&self, ticket: &QueryTicket) {
        self.applied.fetch_max(ticket.generation, Ordering::AcqRel);
    }

    /// Whether a newer query's result has already taken effect
    ///
    /// Replies to older queries are still delivered; only their UI effect
    /// is skipped once this holds.
    pub fn is_superseded(&self, ticket: &QueryTicket) -> bool {
        ticket.generation < self.applied.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::lsp::protocol::ServerCapabilities;
    use crate::services::workspace_symbol::testing::{MockSender, RecordingHost};
    use serde_json::json;

    fn target(sender: Arc<MockSender>, provider: Option<Value>) -> SearchTarget {
        SearchTarget {
            server: "mock-ls".to_string(),
            capabilities: ServerCapabilities {
                workspace_symbol_provider: provider,
                ..Default::default()
            },
            sender,
        }
    }

    #[test]
    fn test_refuses_without_capability() {
        let sender = Arc::new(MockSender::default());
        let host = Arc::new(RecordingHost::default());
        for provider in [None, Some(json!(false))] {
            let err = QueryDispatcher::new(&target(sender.clone(), provider), host.clone())
                .err()
                .unwrap();
            assert!(matches!(err, SearchError::CapabilityUnavailable { .. }));
        }
        assert_eq!(sender.pending(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_sends_query_and_clears_status() {
        let sender = Arc::new(MockSender::default());
        let host = Arc::new(RecordingHost::default());
        let (dispatcher, mut rx) =
            QueryDispatcher::new(&target(sender.clone(), Some(json!({}))), host.clone()).unwrap();

        let ticket = dispatcher.dispatch(Query::new("Widget"));
        assert_eq!(ticket.generation, 1);
        assert_eq!(sender.requests(), vec![(WORKSPACE_SYMBOL.to_string(), json!({"query": "Widget"}))]);
        assert!(host.status(STATUS_KEY).is_some());

        sender.complete(0, Ok(json!([])));
        let completion = rx.recv().await.unwrap();
        assert_eq!(completion.ticket, ticket);
        assert!(host.status(STATUS_KEY).is_none());
    }

    #[tokio::test]
    async fn test_completion_after_session_closed_is_dropped() {
        let sender = Arc::new(MockSender::default());
        let host = Arc::new(RecordingHost::default());
        let (dispatcher, rx) =
            QueryDispatcher::new(&target(sender.clone(), Some(json!(true))), host.clone()).unwrap();
        drop(rx);

        dispatcher.dispatch(Query::new("late"));
        sender.complete(0, Ok(json!([])));
        assert!(host.status(STATUS_KEY).is_none());
    }

    #[tokio::test]
    async fn test_status_cleared_on_error() {
        let sender = Arc::new(MockSender::default());
        let host = Arc::new(RecordingHost::default());
        let (dispatcher, mut rx) =
            QueryDispatcher::new(&target(sender.clone(), Some(json!(true))), host.clone()).unwrap();

        dispatcher.dispatch(Query::new("x"));
        sender.complete(0, Err(ResponseError::new(-32603, "boom")));
        assert!(rx.recv().await.unwrap().result.is_err());
        assert!(host.status(STATUS_KEY).is_none());
    }

    #[test]
    fn test_generations_track_supersession() {
        let sender = Arc::new(MockSender::default());
        let host = Arc::new(RecordingHost::default());
        let (dispatcher, _rx) =
            QueryDispatcher::new(&target(sender, Some(json!(true))), host).unwrap();

        let first = dispatcher.dispatch(Query::new("abc"));
        let second = dispatcher.dispatch(Query::new("abcd"));
        assert_eq!((first.generation, second.generation), (1, 2));

        // a newer dispatch alone does not make the older reply stale
        assert!(!dispatcher.is_superseded(&first));

        dispatcher.mark_applied(&second);
        assert!(dispatcher.is_superseded(&first));
        assert!(!dispatcher.is_superseded(&second));

        // applying an older ticket never moves the mark backwards
        dispatcher.mark_applied(&first);
        assert!(dispatcher.is_superseded(&first));
    }
}
