//! Process-wide runtime settings
//!
//! Derived once from [`WsConfig`] at startup; the LSP layer reads timeouts
//! from here without threading the config through every call.

use std::sync::OnceLock;
use std::time::Duration;

use crate::models::config::WsConfig;
use crate::models::symbol::Language;

static RUNTIME: OnceLock<RuntimeConfig> = OnceLock::new();

/// How slow a language server is to start and to answer project-wide queries
#[derive(Debug, Clone, Copy)]
pub struct ServerProfile {
    pub timeout_multiplier: f64,
    pub indexing_wait_ms: u64,
}

impl ServerProfile {
    pub const fn new(timeout_multiplier: f64, indexing_wait_ms: u64) -> Self {
        Self {
            timeout_multiplier,
            indexing_wait_ms,
        }
    }

    pub fn for_language(language: Language) -> Self {
        match language {
            // Gradle/Maven import dominates startup
            Language::Kotlin | Language::Java => Self::new(4.0, 15000),
            // pyright crawls the whole environment on first query
            Language::Python => Self::new(3.0, 20000),
            Language::TypeScript | Language::JavaScript => Self::new(2.0, 10000),
            Language::Rust => Self::new(1.5, 8000),
            Language::CSharp => Self::new(2.0, 8000),
            Language::Cpp => Self::new(1.5, 5000),
            Language::Go => Self::new(1.0, 5000),
            _ => Self::new(1.0, 3000),
        }
    }
}

/// Request class, used to scale the base timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    Request,
    WorkspaceQuery,
    Initialization,
    Shutdown,
}

impl OperationType {
    pub fn from_method(method: &str) -> Self {
        match method {
            "workspace/symbol" => Self::WorkspaceQuery,
            "initialize" => Self::Initialization,
            "shutdown" => Self::Shutdown,
            _ => Self::Request,
        }
    }

    fn base_multiplier(self) -> f64 {
        match self {
            Self::Request => 1.0,
            Self::WorkspaceQuery => 4.0,
            Self::Initialization => 2.0,
            Self::Shutdown => 0.5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    base_timeout: Duration,
    pub wait_for_indexing: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            base_timeout: Duration::from_secs(30),
            wait_for_indexing: true,
        }
    }
}

impl From<&WsConfig> for RuntimeConfig {
    fn from(config: &WsConfig) -> Self {
        Self {
            base_timeout: Duration::from_secs(config.lsp.timeout_secs.max(1)),
            wait_for_indexing: config.lsp.wait_for_indexing,
        }
    }
}

impl RuntimeConfig {
    pub fn timeout_for(&self, language: Language, method: &str) -> Duration {
        let profile = ServerProfile::for_language(language);
        let op_type = OperationType::from_method(method);
        let multiplier = profile.timeout_multiplier * op_type.base_multiplier();
        Duration::from_secs_f64(self.base_timeout.as_secs_f64() * multiplier)
    }

    /// Upper bound on the indexing wait; zero when waiting is disabled
    pub fn indexing_wait(&self, language: Language) -> Duration {
        if !self.wait_for_indexing {
            return Duration::ZERO;
        }
        Duration::from_millis(ServerProfile::for_language(language).indexing_wait_ms)
    }
}

/// Install the runtime settings; later calls are ignored
pub fn init(config: &WsConfig) {
    let _ = RUNTIME.set(RuntimeConfig::from(config));
}

pub fn timeout_for(language: Language, method: &str) -> Duration {
    runtime().timeout_for(language, method)
}

pub fn indexing_wait(language: Language) -> Duration {
    runtime().indexing_wait(language)
}

fn runtime() -> RuntimeConfig {
    RUNTIME.get().cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_calculation() {
        let config = RuntimeConfig::default();

        // 30s * 1.5 * 4.0
        assert_eq!(
            config.timeout_for(Language::Rust, "workspace/symbol"),
            Duration::from_secs(180)
        );
        // 30s * 1.0 * 1.0
        assert_eq!(
            config.timeout_for(Language::Go, "textDocument/didOpen"),
            Duration::from_secs(30)
        );
        // 30s * 3.0 * 2.0
        assert_eq!(
            config.timeout_for(Language::Python, "initialize"),
            Duration::from_secs(180)
        );
    }

    #[test]
    fn test_indexing_wait_disabled() {
        let mut ws = WsConfig::default();
        ws.lsp.wait_for_indexing = false;
        let config = RuntimeConfig::from(&ws);
        assert_eq!(config.indexing_wait(Language::Kotlin), Duration::ZERO);

        let config = RuntimeConfig::default();
        assert_eq!(
            config.indexing_wait(Language::Go),
            Duration::from_millis(5000)
        );
    }

    #[test]
    fn test_zero_timeout_clamped() {
        let mut ws = WsConfig::default();
        ws.lsp.timeout_secs = 0;
        let config = RuntimeConfig::from(&ws);
        assert_eq!(
            config.timeout_for(Language::Go, "shutdown"),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn test_operation_type_parsing() {
        assert_eq!(
            OperationType::from_method("workspace/symbol"),
            OperationType::WorkspaceQuery
        );
        assert_eq!(
            OperationType::from_method("initialize"),
            OperationType::Initialization
        );
        assert_eq!(
            OperationType::from_method("shutdown"),
            OperationType::Shutdown
        );
        assert_eq!(
            OperationType::from_method("textDocument/didOpen"),
            OperationType::Request
        );
    }
}
