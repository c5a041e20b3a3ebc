use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{Mutex, Notify, RwLock, oneshot};
use tokio::time::timeout;

use super::protocol::{
    ClientInfo, DidOpenTextDocumentParams, InitializeParams, InitializeResult, LogMessageParams,
    Message, MessageType, Notification, Request, RequestId, Response, ResponseError,
    ServerCapabilities, TextDocumentItem, WorkspaceFolder, error_codes,
};
use super::transport::{Transport, write_message};
use crate::error::LspError;
use crate::models::lsp::path_to_uri;
use crate::models::symbol::{Language, SymbolKind};

type PendingRequest = oneshot::Sender<Response>;

/// Completion continuation for a request sent through [`RequestSender`]
///
/// Invoked exactly once, with the server result or its error payload.
/// Client-side failures (timeout, dead server) arrive as an error payload too.
pub type ResponseCallback = Box<dyn FnOnce(Result<Value, ResponseError>) + Send + 'static>;

/// Fire-and-forget request seam used by the symbol search
///
/// `send_request` returns immediately; the response is delivered later
/// through `on_complete` on the runtime that owns the sender.
pub trait RequestSender: Send + Sync {
    fn send_request(self: Arc<Self>, method: &str, params: Value, on_complete: ResponseCallback);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IndexingState {
    NotStarted = 0,
    InProgress = 1,
    Ready = 2,
    TimedOut = 3,
}

impl IndexingState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::InProgress,
            2 => Self::Ready,
            3 => Self::TimedOut,
            _ => Self::NotStarted,
        }
    }
}

pub struct LspClient {
    language: Language,
    root: PathBuf,
    process: Mutex<Option<Child>>,
    stdin: Mutex<Option<ChildStdin>>,
    next_id: AtomicU64,
    pending: RwLock<HashMap<RequestId, PendingRequest>>,
    initialized: RwLock<Option<InitializeResult>>,
    opened: Mutex<HashSet<String>>,
    shutdown: AtomicBool,
    terminated: AtomicBool,
    indexing_state: AtomicU8,
    indexing_notify: Notify,
}

impl LspClient {
    pub fn new(language: Language, root: PathBuf) -> Arc<Self> {
        Arc::new(Self {
            language,
            root,
            process: Mutex::new(None),
            stdin: Mutex::new(None),
            next_id: AtomicU64::new(1),
            pending: RwLock::new(HashMap::new()),
            initialized: RwLock::new(None),
            opened: Mutex::new(HashSet::new()),
            shutdown: AtomicBool::new(false),
            terminated: AtomicBool::new(false),
            indexing_state: AtomicU8::new(IndexingState::NotStarted as u8),
            indexing_notify: Notify::new(),
        })
    }

    /// Spawn the server process and run the initialize handshake
    pub async fn start(self: &Arc<Self>, command: &str, args: &[String]) -> Result<(), LspError> {
        if self.is_running().await {
            return Ok(());
        }

        tracing::info!(
            "Starting {} language server: {} {:?}",
            self.language,
            command,
            args
        );

        let mut child = Command::new(command)
            .args(args)
            .current_dir(&self.root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| LspError::ServerStart(format!("{}: {}", command, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| LspError::ServerStart("Failed to get stdin".to_string()))?;
        let stdout: ChildStdout = child
            .stdout
            .take()
            .ok_or_else(|| LspError::ServerStart("Failed to get stdout".to_string()))?;

        *self.process.lock().await = Some(child);
        *self.stdin.lock().await = Some(stdin);

        let client = Arc::clone(self);
        tokio::spawn(async move {
            client.read_responses(Transport::new(stdout)).await;
        });

        self.initialize().await?;

        tracing::info!("{} language server started", self.language);
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        let mut process = self.process.lock().await;
        match process.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    async fn initialize(&self) -> Result<(), LspError> {
        let params = InitializeParams {
            process_id: Some(std::process::id()),
            root_uri: Some(path_to_uri(&self.root)),
            capabilities: Self::client_capabilities(),
            client_info: Some(ClientInfo {
                name: "wsymbol".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            workspace_folders: Some(vec![self.workspace_folder()]),
        };

        let result: InitializeResult = self
            .request("initialize", Some(serde_json::to_value(params)?))
            .await?;

        tracing::debug!(
            "{} server ready: {}, workspace symbols: {}",
            self.language,
            result
                .server_info
                .as_ref()
                .map(|s| s.name.as_str())
                .unwrap_or("unnamed"),
            result.capabilities.workspace_symbol_provider.is_some()
        );

        *self.initialized.write().await = Some(result);

        self.notify("initialized", Some(serde_json::json!({})))
            .await
    }

    fn workspace_folder(&self) -> WorkspaceFolder {
        WorkspaceFolder {
            uri: path_to_uri(&self.root),
            name: self
                .root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "workspace".to_string()),
        }
    }

    /// Capabilities a workspace symbol client needs to advertise
    fn client_capabilities() -> Value {
        let kinds: Vec<u32> = SymbolKind::ALL_LSP_CODES.collect();
        serde_json::json!({
            "window": {
                "workDoneProgress": true
            },
            "textDocument": {
                "synchronization": {
                    "dynamicRegistration": false,
                    "didSave": false
                }
            },
            "workspace": {
                "symbol": {
                    "dynamicRegistration": false,
                    "symbolKind": { "valueSet": kinds }
                },
                "workspaceFolders": true,
                "configuration": true
            }
        })
    }

    /// Send a request and decode its result
    pub async fn request<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<T, LspError> {
        let value = self.request_raw(method, params).await??;
        serde_json::from_value(value).map_err(|e| LspError::Protocol(e.to_string()))
    }

    /// Send a request, keeping the server's error payload untouched
    ///
    /// The outer error is a client-side failure; the inner one is what the
    /// server replied.
    pub async fn request_raw(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<Result<Value, ResponseError>, LspError> {
        if self.terminated.load(Ordering::Acquire) {
            return Err(LspError::ServerTerminated {
                language: self.language,
            });
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.write().await.insert(RequestId::Number(id), tx);

        let request = Request::new(id, method, params);
        tracing::debug!("{} LSP request {}: {}", self.language, id, method);

        {
            let mut stdin_guard = self.stdin.lock().await;
            let Some(stdin) = stdin_guard.as_mut() else {
                self.pending.write().await.remove(&RequestId::Number(id));
                return Err(LspError::ServerTerminated {
                    language: self.language,
                });
            };
            write_message(stdin, &request).await?;
        }

        match timeout(crate::config::timeout_for(self.language, method), rx).await {
            Ok(Ok(response)) => match response.into_result() {
                Err(err) if err.code == error_codes::SERVER_TERMINATED => {
                    Err(LspError::ServerTerminated {
                        language: self.language,
                    })
                }
                other => Ok(other),
            },
            Ok(Err(_)) => Err(LspError::ServerTerminated {
                language: self.language,
            }),
            Err(_) => {
                self.cancel_request(id).await;
                Err(LspError::Timeout(format!(
                    "{} '{}' timed out. The language server may be busy or unresponsive",
                    self.language, method
                )))
            }
        }
    }

    async fn cancel_request(&self, id: u64) {
        self.pending.write().await.remove(&RequestId::Number(id));
        let _ = self
            .notify("$/cancelRequest", Some(serde_json::json!({ "id": id })))
            .await;
    }

    /// Send a notification (no response expected)
    pub async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), LspError> {
        let notification = Notification::new(method, params);
        let mut stdin_guard = self.stdin.lock().await;
        let stdin = stdin_guard
            .as_mut()
            .ok_or(LspError::ServerTerminated {
                language: self.language,
            })?;
        write_message(stdin, &notification).await?;
        Ok(())
    }

    /// Hand a document to the server once; later calls are no-ops
    pub async fn open_document(&self, path: &Path) -> Result<(), LspError> {
        let uri = path_to_uri(path);
        if self.opened.lock().await.contains(&uri) {
            return Ok(());
        }

        let text = tokio::fs::read_to_string(path).await?;
        self.opened.lock().await.insert(uri.clone());
        let params = DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri,
                language_id: self.language.lsp_id().to_string(),
                version: 1,
                text,
            },
        };
        self.notify(
            "textDocument/didOpen",
            Some(serde_json::to_value(params)?),
        )
        .await
    }

    async fn read_responses<R>(self: Arc<Self>, mut transport: Transport<R>)
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        loop {
            match transport.read_message().await {
                Ok(message) => self.handle_message(message).await,
                Err(e) => {
                    if !self.shutdown.load(Ordering::Acquire) {
                        tracing::error!("{} LSP read error: {}", self.language, e);
                        self.fail_pending(
                            error_codes::SERVER_TERMINATED,
                            &format!("{} language server terminated unexpectedly", self.language),
                        )
                        .await;
                        self.terminated.store(true, Ordering::Release);
                    }
                    break;
                }
            }
        }
    }

    /// Resolve every pending request with an error payload
    async fn fail_pending(&self, code: i32, message: &str) {
        let mut pending = self.pending.write().await;
        if !pending.is_empty() {
            tracing::debug!("Failing {} pending requests: {}", pending.len(), message);
        }
        for (id, sender) in pending.drain() {
            let _ = sender.send(Response::failure(id, ResponseError::new(code, message)));
        }
    }

    async fn handle_message(&self, message: Message) {
        match message {
            Message::Response(response) => {
                let Some(id) = response.id.clone() else {
                    return;
                };
                let mut pending = self.pending.write().await;
                // Some servers echo numeric ids back as strings
                let sender = pending.remove(&id).or_else(|| match &id {
                    RequestId::String(s) => s
                        .parse::<u64>()
                        .ok()
                        .and_then(|n| pending.remove(&RequestId::Number(n))),
                    RequestId::Number(_) => None,
                });
                match sender {
                    Some(tx) => {
                        let _ = tx.send(response);
                    }
                    None => tracing::debug!(
                        "Received response for unknown request ID {:?} (may have timed out)",
                        id
                    ),
                }
            }
            Message::Request(request) => self.handle_server_request(request).await,
            Message::Notification(notification) => self.handle_notification(notification),
        }
    }

    fn handle_notification(&self, notification: Notification) {
        let params = notification.params.unwrap_or(Value::Null);
        match notification.method.as_str() {
            "window/logMessage" | "window/showMessage" => {
                if let Ok(log) = serde_json::from_value::<LogMessageParams>(params) {
                    if Self::is_readiness_signal(self.language, &log.message) {
                        self.set_indexing_state(IndexingState::Ready);
                    }
                    let (lang, msg) = (self.language, &log.message);
                    match log.typ {
                        MessageType::Error => tracing::error!("LSP {}: {}", lang, msg),
                        MessageType::Warning => tracing::warn!("LSP {}: {}", lang, msg),
                        MessageType::Info => tracing::info!("LSP {}: {}", lang, msg),
                        MessageType::Log | MessageType::Debug => {
                            tracing::debug!("LSP {}: {}", lang, msg)
                        }
                    }
                }
            }
            "$/progress" => {
                if let Some(value) = params.get("value")
                    && value.get("kind").and_then(|k| k.as_str()) == Some("end")
                {
                    let title = value
                        .get("title")
                        .and_then(|t| t.as_str())
                        .unwrap_or_default()
                        .to_lowercase();
                    let token = params
                        .get("token")
                        .map(|t| t.to_string().to_lowercase())
                        .unwrap_or_default();
                    if ["index", "load", "analyz"]
                        .iter()
                        .any(|k| title.contains(k) || token.contains(k))
                    {
                        self.set_indexing_state(IndexingState::Ready);
                    }
                }
            }
            "experimental/serverStatus" => {
                if params.get("quiescent").and_then(|v| v.as_bool()) == Some(true) {
                    self.set_indexing_state(IndexingState::Ready);
                }
            }
            "language/status" => {
                if params.get("type").and_then(|v| v.as_str()) == Some("ProjectStatus")
                    && params.get("message").and_then(|v| v.as_str()) == Some("OK")
                {
                    self.set_indexing_state(IndexingState::Ready);
                }
            }
            other => tracing::trace!("Unhandled notification: {}", other),
        }
    }

    fn is_readiness_signal(language: Language, message: &str) -> bool {
        match language {
            Language::Python => message.contains("Found") && message.contains("source file"),
            Language::TypeScript | Language::JavaScript => {
                message.contains("Loading completed") || message.contains("project load finished")
            }
            Language::Java => message.contains("initialized") || message.contains("Initialized"),
            _ => false,
        }
    }

    async fn handle_server_request(&self, request: Request) {
        let response = match request.method.as_str() {
            "workspace/configuration" => {
                Response::success(request.id, Self::configuration_reply(&request.params))
            }
            "client/registerCapability"
            | "client/unregisterCapability"
            | "window/workDoneProgress/create" => Response::success(request.id, Value::Null),
            "workspace/workspaceFolders" => {
                let folders = serde_json::to_value(vec![self.workspace_folder()]);
                Response::success(request.id, folders.unwrap_or_default())
            }
            other => {
                tracing::debug!("Unhandled server request: {}", other);
                Response::failure(
                    request.id,
                    ResponseError::new(
                        error_codes::METHOD_NOT_FOUND,
                        format!("Method not found: {}", other),
                    ),
                )
            }
        };

        let mut stdin_guard = self.stdin.lock().await;
        if let Some(stdin) = stdin_guard.as_mut()
            && let Err(e) = write_message(stdin, &response).await
        {
            tracing::warn!("{} failed to answer server request: {}", self.language, e);
        }
    }

    /// One empty settings object per requested item
    fn configuration_reply(params: &Option<Value>) -> Value {
        let items = params
            .as_ref()
            .and_then(|p| p.get("items"))
            .and_then(|i| i.as_array())
            .map(|arr| arr.len())
            .unwrap_or(0);
        Value::Array(vec![Value::Object(serde_json::Map::new()); items])
    }

    pub fn indexing_state(&self) -> IndexingState {
        IndexingState::from_u8(self.indexing_state.load(Ordering::Acquire))
    }

    fn set_indexing_state(&self, state: IndexingState) {
        self.indexing_state.store(state as u8, Ordering::Release);
        if state == IndexingState::Ready {
            self.indexing_notify.notify_waiters();
        }
    }

    /// Wait until the server signals readiness, bounded by the language's
    /// indexing budget
    pub async fn wait_for_indexing(&self) -> IndexingState {
        if self.indexing_state() == IndexingState::Ready {
            return IndexingState::Ready;
        }

        let max_wait = crate::config::indexing_wait(self.language);
        if max_wait.is_zero() {
            return self.indexing_state();
        }

        self.indexing_state
            .store(IndexingState::InProgress as u8, Ordering::Release);
        tracing::debug!(
            "Waiting up to {}ms for {} workspace indexing",
            max_wait.as_millis(),
            self.language
        );

        tokio::select! {
            _ = self.indexing_notify.notified() => {
                tracing::debug!("{} indexing completed via notification", self.language);
                IndexingState::Ready
            }
            _ = tokio::time::sleep(max_wait) => {
                tracing::debug!("{} indexing wait elapsed", self.language);
                self.set_indexing_state(IndexingState::TimedOut);
                IndexingState::TimedOut
            }
        }
    }

    /// Shutdown the language server with 3-stage graceful termination
    pub async fn shutdown(&self) -> Result<(), LspError> {
        self.shutdown.store(true, Ordering::Release);

        // Stage 1: shutdown request + exit notification
        let polite = timeout(Duration::from_secs(2), async {
            if self.request_raw("shutdown", None).await.is_ok() {
                let _ = self.notify("exit", None).await;
            }
        })
        .await;
        if polite.is_err() {
            tracing::debug!("{} LSP shutdown request timed out", self.language);
        }

        self.stdin.lock().await.take();

        // Stage 2 & 3: wait for exit, then kill
        if let Some(mut child) = self.process.lock().await.take() {
            match timeout(Duration::from_secs(5), child.wait()).await {
                Ok(Ok(status)) => {
                    tracing::debug!("{} language server exited: {:?}", self.language, status)
                }
                Ok(Err(e)) => tracing::warn!("{} language server wait error: {}", self.language, e),
                Err(_) => {
                    tracing::warn!(
                        "{} language server termination timed out, forcing kill",
                        self.language
                    );
                    let _ = child.kill().await;
                }
            }
        }

        self.fail_pending(error_codes::REQUEST_CANCELLED, "Server shutdown")
            .await;
        Ok(())
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub async fn capabilities(&self) -> ServerCapabilities {
        self.initialized
            .read()
            .await
            .as_ref()
            .map(|r| r.capabilities.clone())
            .unwrap_or_default()
    }

    /// Name the server reported at initialization, if any
    pub async fn server_name(&self) -> Option<String> {
        self.initialized
            .read()
            .await
            .as_ref()
            .and_then(|r| r.server_info.as_ref())
            .map(|info| info.name.clone())
    }
}

impl RequestSender for LspClient {
    fn send_request(self: Arc<Self>, method: &str, params: Value, on_complete: ResponseCallback) {
        let method = method.to_string();
        tokio::spawn(async move {
            let result = match self.request_raw(&method, Some(params)).await {
                Ok(reply) => reply,
                Err(e) => Err(ResponseError::new(e.error_code(), e.to_string())),
            };
            on_complete(result);
        });
    }
}

impl Drop for LspClient {
    fn drop(&mut self) {
        if let Ok(mut process_guard) = self.process.try_lock()
            && let Some(child) = process_guard.as_mut()
        {
            let _ = child.start_kill();
            tracing::debug!("LspClient for {} dropped, process killed", self.language);
        }
    }
}
