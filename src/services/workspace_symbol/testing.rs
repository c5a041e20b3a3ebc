//! Test doubles for the search session

use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::host::{Host, ReportPanel, TerminalPanel};
use crate::infra::lsp::protocol::ResponseError;
use crate::infra::lsp::{RequestSender, ResponseCallback};
use crate::models::symbol::OpenInstruction;

/// Records requests and completes them when the test says so
///
/// Replies queued with [`MockSender::reply_with`] are delivered immediately
/// from inside `send_request`.
#[derive(Default)]
pub struct MockSender {
    requests: Mutex<Vec<(String, Value)>>,
    callbacks: Mutex<Vec<Option<ResponseCallback>>>,
    replies: Mutex<VecDeque<Result<Value, ResponseError>>>,
}

impl MockSender {
    pub fn reply_with(&self, result: Result<Value, ResponseError>) {
        self.replies.lock().unwrap().push_back(result);
    }

    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn pending(&self) -> usize {
        self.callbacks.lock().unwrap().iter().flatten().count()
    }

    /// Complete the `index`-th stored request
    pub fn complete(&self, index: usize, result: Result<Value, ResponseError>) {
        let callback = self.callbacks.lock().unwrap()[index]
            .take()
            .expect("request already completed");
        callback(result);
    }
}

impl RequestSender for MockSender {
    fn send_request(self: Arc<Self>, method: &str, params: Value, on_complete: ResponseCallback) {
        self.requests
            .lock()
            .unwrap()
            .push((method.to_string(), params));
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(result) => {
                self.callbacks.lock().unwrap().push(None);
                on_complete(result);
            }
            None => self.callbacks.lock().unwrap().push(Some(on_complete)),
        }
    }
}

/// Host that records every interaction and answers the chooser from a script
pub struct RecordingHost {
    statuses: Mutex<HashMap<String, String>>,
    messages: Mutex<Vec<String>>,
    dialogs: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
    choices: Mutex<VecDeque<Option<usize>>>,
    chooser_calls: Mutex<Vec<Vec<String>>>,
    opened: Mutex<Vec<OpenInstruction>>,
    panel: Arc<TerminalPanel>,
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self {
            statuses: Mutex::default(),
            messages: Mutex::default(),
            dialogs: Mutex::default(),
            errors: Mutex::default(),
            choices: Mutex::default(),
            chooser_calls: Mutex::default(),
            opened: Mutex::default(),
            panel: Arc::new(TerminalPanel::new(false)),
        }
    }
}

impl RecordingHost {
    pub fn answer(&self, choice: Option<usize>) {
        self.choices.lock().unwrap().push_back(choice);
    }

    pub fn status(&self, key: &str) -> Option<String> {
        self.statuses.lock().unwrap().get(key).cloned()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn dialogs(&self) -> Vec<String> {
        self.dialogs.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn chooser_calls(&self) -> Vec<Vec<String>> {
        self.chooser_calls.lock().unwrap().clone()
    }

    pub fn opened(&self) -> Vec<OpenInstruction> {
        self.opened.lock().unwrap().clone()
    }

    pub fn panel(&self) -> Arc<TerminalPanel> {
        Arc::clone(&self.panel)
    }
}

#[async_trait]
impl Host for RecordingHost {
    fn status_message(&self, text: &str) {
        self.messages.lock().unwrap().push(text.to_string());
    }

    fn set_status(&self, key: &str, text: &str) {
        self.statuses
            .lock()
            .unwrap()
            .insert(key.to_string(), text.to_string());
    }

    fn erase_status(&self, key: &str) {
        self.statuses.lock().unwrap().remove(key);
    }

    fn message_dialog(&self, text: &str) {
        self.dialogs.lock().unwrap().push(text.to_string());
    }

    fn error_dialog(&self, text: &str) {
        self.errors.lock().unwrap().push(text.to_string());
    }

    async fn prompt(&self, _label: &str) -> Option<String> {
        None
    }

    async fn choose(&self, items: Vec<String>) -> Option<usize> {
        self.chooser_calls.lock().unwrap().push(items);
        self.choices.lock().unwrap().pop_front().flatten()
    }

    async fn open_file(&self, target: &OpenInstruction) -> io::Result<()> {
        self.opened.lock().unwrap().push(target.clone());
        Ok(())
    }

    fn report_panel(&self) -> Arc<dyn ReportPanel> {
        self.panel.clone()
    }
}

/// Write `lines` to `dir/name` and return its `file://` URI
pub fn source_file(dir: &Path, name: &str, lines: &[&str]) -> String {
    let path = dir.join(name);
    std::fs::write(&path, lines.join("\n")).unwrap();
    crate::models::lsp::path_to_uri(&path)
}
