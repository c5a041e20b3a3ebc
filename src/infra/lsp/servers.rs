//! Language Server Configurations
//!
//! Built-in server commands per language, optionally replaced by
//! `[lsp.servers]` entries from the config file.

use std::process::Command;

use crate::models::config::LspConfig;
use crate::models::symbol::Language;

struct BuiltinServer {
    language: Language,
    name: &'static str,
    command: &'static str,
    args: &'static [&'static str],
    install_hint: &'static str,
}

const BUILTIN: &[BuiltinServer] = &[
    BuiltinServer {
        language: Language::Rust,
        name: "rust-analyzer",
        command: "rust-analyzer",
        args: &[],
        install_hint: "rustup component add rust-analyzer",
    },
    BuiltinServer {
        language: Language::Cpp,
        name: "clangd",
        command: "clangd",
        args: &["--background-index"],
        install_hint: "brew install llvm / apt install clangd",
    },
    BuiltinServer {
        language: Language::Zig,
        name: "zls",
        command: "zls",
        args: &[],
        install_hint: "https://github.com/zigtools/zls/releases",
    },
    BuiltinServer {
        language: Language::Java,
        name: "jdtls",
        command: "jdtls",
        args: &[],
        install_hint: "brew install jdtls",
    },
    BuiltinServer {
        language: Language::Kotlin,
        name: "kotlin-lsp",
        command: "kotlin-lsp",
        args: &["--stdio"],
        install_hint: "brew install JetBrains/utils/kotlin-lsp",
    },
    BuiltinServer {
        language: Language::CSharp,
        name: "csharp-ls",
        command: "csharp-ls",
        args: &[],
        install_hint: "dotnet tool install --global csharp-ls",
    },
    BuiltinServer {
        language: Language::TypeScript,
        name: "typescript-language-server",
        command: "typescript-language-server",
        args: &["--stdio"],
        install_hint: "npm install -g typescript-language-server typescript",
    },
    BuiltinServer {
        language: Language::JavaScript,
        name: "typescript-language-server",
        command: "typescript-language-server",
        args: &["--stdio"],
        install_hint: "npm install -g typescript-language-server typescript",
    },
    BuiltinServer {
        language: Language::Python,
        name: "pyright",
        command: "pyright-langserver",
        args: &["--stdio"],
        install_hint: "npm install -g pyright",
    },
    BuiltinServer {
        language: Language::Ruby,
        name: "ruby-lsp",
        command: "ruby-lsp",
        args: &[],
        install_hint: "gem install ruby-lsp",
    },
    BuiltinServer {
        language: Language::PHP,
        name: "intelephense",
        command: "intelephense",
        args: &["--stdio"],
        install_hint: "npm install -g intelephense",
    },
    BuiltinServer {
        language: Language::Lua,
        name: "lua-language-server",
        command: "lua-language-server",
        args: &[],
        install_hint: "brew install lua-language-server",
    },
    BuiltinServer {
        language: Language::Go,
        name: "gopls",
        command: "gopls",
        args: &[],
        install_hint: "go install golang.org/x/tools/gopls@latest",
    },
];

/// How to launch one language server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub language: Language,
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub install_hint: String,
}

impl ServerConfig {
    /// Built-in configuration for a language
    pub fn builtin(language: Language) -> Option<Self> {
        BUILTIN
            .iter()
            .find(|s| s.language == language)
            .map(|s| Self {
                language,
                name: s.name.to_string(),
                command: s.command.to_string(),
                args: s.args.iter().map(|a| a.to_string()).collect(),
                install_hint: s.install_hint.to_string(),
            })
    }

    /// Built-in configuration with a config-file override applied
    ///
    /// An override is a whitespace-separated command line; its first word
    /// becomes both the command and the display name.
    pub fn resolve(language: Language, lsp: &LspConfig) -> Option<Self> {
        let mut config = Self::builtin(language)?;
        if let Some(line) = lsp.server_override(language) {
            let mut words = line.split_whitespace().map(str::to_string);
            if let Some(command) = words.next() {
                config.name = command.clone();
                config.command = command;
                config.args = words.collect();
            }
        }
        Some(config)
    }

    pub fn is_installed(&self) -> bool {
        #[cfg(unix)]
        let finder = "which";
        #[cfg(windows)]
        let finder = "where";

        Command::new(finder)
            .arg(&self.command)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

/// Server health check result
#[derive(Debug, Clone)]
pub struct ServerHealth {
    pub language: Language,
    pub name: String,
    pub command: String,
    pub installed: bool,
    pub install_hint: String,
}

/// Check which configured servers are on `PATH`
pub fn check_all_servers(lsp: &LspConfig) -> Vec<ServerHealth> {
    Language::all()
        .into_iter()
        .filter_map(|language| ServerConfig::resolve(language, lsp))
        .map(|config| ServerHealth {
            language: config.language,
            installed: config.is_installed(),
            name: config.name,
            command: config.command,
            install_hint: config.install_hint,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_language_has_builtin() {
        for language in Language::all() {
            assert!(
                ServerConfig::builtin(language).is_some(),
                "missing server for {language}"
            );
        }
        assert!(ServerConfig::builtin(Language::Unknown).is_none());
    }

    #[test]
    fn test_override_replaces_command_and_args() {
        let mut lsp = LspConfig::default();
        lsp.servers
            .insert("python".to_string(), "basedpyright-langserver --stdio".to_string());

        let config = ServerConfig::resolve(Language::Python, &lsp).unwrap();
        assert_eq!(config.command, "basedpyright-langserver");
        assert_eq!(config.args, vec!["--stdio".to_string()]);
        assert_eq!(config.name, "basedpyright-langserver");

        let go = ServerConfig::resolve(Language::Go, &lsp).unwrap();
        assert_eq!(go.command, "gopls");
    }

    #[test]
    fn test_missing_binary_not_installed() {
        let config = ServerConfig {
            language: Language::Go,
            name: "nope".to_string(),
            command: "wsymbol-definitely-not-a-real-binary".to_string(),
            args: Vec::new(),
            install_hint: String::new(),
        };
        assert!(!config.is_installed());
    }

    #[test]
    fn test_check_all_servers_covers_languages() {
        let health = check_all_servers(&LspConfig::default());
        assert_eq!(health.len(), Language::all().len());
    }
}
