//! Configuration model for wsymbol
//!
//! Small, LSP-first configuration: server timeouts, how results are shown
//! and how the terminal host opens a chosen symbol.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::symbol::Language;

/// wsymbol configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WsConfig {
    #[serde(default)]
    pub lsp: LspConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub navigation: NavigationConfig,
}

/// LSP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LspConfig {
    #[serde(default = "defaults::timeout_secs")]
    pub timeout_secs: u64,

    /// Wait for the server to finish indexing before the first query
    #[serde(default = "defaults::wait_for_indexing")]
    pub wait_for_indexing: bool,

    /// Command line overrides keyed by language id (`rust = "rust-analyzer"`)
    #[serde(default)]
    pub servers: BTreeMap<String, String>,
}

impl Default for LspConfig {
    fn default() -> Self {
        Self {
            timeout_secs: defaults::timeout_secs(),
            wait_for_indexing: defaults::wait_for_indexing(),
            servers: BTreeMap::new(),
        }
    }
}

impl LspConfig {
    /// Override command for a language, if one is configured
    pub fn server_override(&self, language: Language) -> Option<&str> {
        self.servers
            .get(language.lsp_id())
            .map(String::as_str)
            .filter(|cmd| !cmd.trim().is_empty())
    }
}

mod defaults {
    pub fn timeout_secs() -> u64 {
        30
    }
    pub fn wait_for_indexing() -> bool {
        true
    }
}

/// How a multi-result search is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Interactive list, one entry per symbol
    #[default]
    Chooser,
    /// Grouped, read-only report panel
    Report,
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chooser => f.write_str("chooser"),
            Self::Report => f.write_str("report"),
        }
    }
}

impl FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chooser" | "choose" | "list" => Ok(Self::Chooser),
            "report" | "panel" => Ok(Self::Report),
            other => Err(format!("expected 'chooser' or 'report', got '{other}'")),
        }
    }
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SearchConfig {
    #[serde(default)]
    pub mode: DisplayMode,
}

/// When to emit ANSI colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub color: ColorChoice,
}

/// Navigation configuration
///
/// `open_command` is a shell-free template split on whitespace; `{path}`,
/// `{line}` and `{column}` are substituted per argument. Line and column are
/// 1-based. Without a template the encoded position is printed instead.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NavigationConfig {
    #[serde(default)]
    pub open_command: Option<String>,
}
