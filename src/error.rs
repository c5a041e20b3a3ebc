//! Error types for wsymbol

use std::path::PathBuf;

use thiserror::Error;

use crate::models::symbol::Language;

pub type WsResult<T> = std::result::Result<T, WsError>;

#[derive(Debug, Error)]
pub enum WsError {
    #[error("{0}")]
    Lsp(#[from] LspError),

    #[error("{0}")]
    Search(#[from] SearchError),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum LspError {
    #[error("Failed to start server: {0}")]
    ServerStart(String),

    #[error("Server not installed: {name}. Install: {install_hint}")]
    ServerNotInstalled { name: String, install_hint: String },

    #[error("Unsupported language: {0}. Run 'wsymbol doctor' to see supported languages.")]
    UnsupportedLanguage(String),

    #[error("{language} language server terminated unexpectedly")]
    ServerTerminated { language: Language },

    #[error("{0}")]
    Timeout(String),

    #[error("Server error [{code}]: {message}")]
    ServerError { code: i32, message: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl LspError {
    /// JSON-RPC code used when a client-side failure is reported as a
    /// response error
    pub fn error_code(&self) -> i32 {
        match self {
            Self::ServerError { code, .. } => *code,
            Self::ServerTerminated { .. } => -32099,
            Self::Timeout(_) => -32001,
            _ => -32000,
        }
    }

    /// Server error with well-known codes rewritten for people
    pub fn server_error_friendly(code: i32, message: String) -> Self {
        let message = match code {
            -32601 => format!("Method not supported by server: {}", message.trim()),
            -32002 => "Server initializing. Try again in a moment.".to_string(),
            -32800 => "Request cancelled by server".to_string(),
            _ => message,
        };
        Self::ServerError { code, message }
    }
}

impl From<crate::infra::lsp::protocol::ResponseError> for LspError {
    fn from(err: crate::infra::lsp::protocol::ResponseError) -> Self {
        LspError::server_error_friendly(err.code, err.message)
    }
}

/// Failures of a workspace symbol search
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{server} does not provide workspace symbols")]
    CapabilityUnavailable { server: String },

    #[error("command 'workspace/symbol' failed. Reason: {reason}")]
    RequestFailed { reason: String },

    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error("Search session closed before a response arrived")]
    SessionClosed,
}

/// Failures turning a chosen symbol into an opened file
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("Cannot open non-file location: {0}")]
    UnsupportedUri(String),

    #[error("Not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("Failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config parse error: {0}")]
    Parse(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::lsp::protocol::ResponseError;

    #[test]
    fn test_server_terminated_error() {
        let err = LspError::ServerTerminated {
            language: Language::Rust,
        };
        assert_eq!(err.error_code(), -32099);
        assert_eq!(
            err.to_string(),
            "rust language server terminated unexpectedly"
        );
    }

    #[test]
    fn test_timeout_code() {
        let err = LspError::Timeout("workspace/symbol timed out".to_string());
        assert_eq!(err.error_code(), -32001);
    }

    #[test]
    fn test_response_error_conversion_keeps_message() {
        let err: LspError = ResponseError {
            code: -1,
            message: "timeout".to_string(),
            data: None,
        }
        .into();
        assert_eq!(err.error_code(), -1);
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_method_not_found_friendly() {
        let err = LspError::server_error_friendly(-32601, "workspace/symbol".to_string());
        assert!(err.to_string().contains("Method not supported"));
    }

    #[test]
    fn test_request_failed_message() {
        let err = SearchError::RequestFailed {
            reason: "timeout".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "command 'workspace/symbol' failed. Reason: timeout"
        );
    }

    #[test]
    fn test_navigation_error_wraps() {
        let err: SearchError = NavigationError::UnsupportedUri("jdt://x".to_string()).into();
        assert!(matches!(err, SearchError::Navigation(_)));
        assert!(err.to_string().contains("jdt://x"));
    }
}
