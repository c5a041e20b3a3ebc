//! LSP Server Manager
//!
//! One language server per language for a workspace root. Concurrent callers
//! asking for the same language share a single startup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Notify, RwLock};

use super::client::LspClient;
use super::servers::ServerConfig;
use crate::error::LspError;
use crate::models::config::LspConfig;
use crate::models::symbol::Language;

enum ClientState {
    Starting(Arc<Notify>),
    Ready(Arc<LspClient>),
}

pub struct LspManager {
    root: PathBuf,
    lsp: LspConfig,
    clients: RwLock<HashMap<Language, ClientState>>,
}

impl LspManager {
    pub fn new(root: PathBuf, lsp: LspConfig) -> Self {
        Self {
            root,
            lsp,
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Get or start the client for a language
    pub async fn get_client(&self, language: Language) -> Result<Arc<LspClient>, LspError> {
        loop {
            let (ready, starting) = {
                let clients = self.clients.read().await;
                match clients.get(&language) {
                    Some(ClientState::Ready(client)) => (Some(Arc::clone(client)), None),
                    Some(ClientState::Starting(notify)) => (None, Some(Arc::clone(notify))),
                    None => (None, None),
                }
            };

            if let Some(client) = ready {
                if client.is_running().await {
                    return Ok(client);
                }
                tracing::warn!("{} language server is gone, restarting", language);
                self.clients.write().await.remove(&language);
                continue;
            }

            if let Some(notify) = starting {
                notify.notified().await;
                continue;
            }

            let notify = Arc::new(Notify::new());
            {
                let mut clients = self.clients.write().await;
                if clients.contains_key(&language) {
                    continue;
                }
                clients.insert(language, ClientState::Starting(Arc::clone(&notify)));
            }

            let result = self.start_client(language).await;
            {
                let mut clients = self.clients.write().await;
                match &result {
                    Ok(client) => {
                        clients.insert(language, ClientState::Ready(Arc::clone(client)));
                    }
                    Err(_) => {
                        clients.remove(&language);
                    }
                }
            }
            notify.notify_waiters();
            return result;
        }
    }

    async fn start_client(&self, language: Language) -> Result<Arc<LspClient>, LspError> {
        let config = self
            .server_config(language)
            .ok_or_else(|| LspError::UnsupportedLanguage(language.to_string()))?;

        if !config.is_installed() {
            return Err(LspError::ServerNotInstalled {
                name: config.name,
                install_hint: config.install_hint,
            });
        }

        let client = LspClient::new(language, self.root.clone());
        client.start(&config.command, &config.args).await?;
        Ok(client)
    }

    /// Resolved launch configuration, with config-file overrides applied
    pub fn server_config(&self, language: Language) -> Option<ServerConfig> {
        ServerConfig::resolve(language, &self.lsp)
    }

    pub async fn shutdown_all(&self) {
        let running: Vec<(Language, Arc<LspClient>)> = {
            let mut clients = self.clients.write().await;
            clients
                .drain()
                .filter_map(|(lang, state)| match state {
                    ClientState::Ready(client) => Some((lang, client)),
                    ClientState::Starting(_) => None,
                })
                .collect()
        };

        for (lang, client) in running {
            if let Err(e) = client.shutdown().await {
                tracing::warn!("Error shutting down {} server: {}", lang, e);
            }
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_language_rejected() {
        let manager = LspManager::new(PathBuf::from("/tmp"), LspConfig::default());
        let err = manager.get_client(Language::Unknown).await.err().unwrap();
        assert!(matches!(err, LspError::UnsupportedLanguage(_)));
    }

    #[tokio::test]
    async fn test_missing_server_reports_install_hint() {
        let mut lsp = LspConfig::default();
        lsp.servers.insert(
            "go".to_string(),
            "wsymbol-definitely-not-a-real-binary".to_string(),
        );
        let manager = LspManager::new(PathBuf::from("/tmp"), lsp);

        match manager.get_client(Language::Go).await {
            Err(LspError::ServerNotInstalled { name, install_hint }) => {
                assert_eq!(name, "wsymbol-definitely-not-a-real-binary");
                assert!(install_hint.contains("gopls"));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("fake server must not start"),
        }
    }

    #[test]
    fn test_server_config_uses_overrides() {
        let mut lsp = LspConfig::default();
        lsp.servers.insert("rust".to_string(), "ra-multiplex".to_string());
        let manager = LspManager::new(PathBuf::from("/tmp"), lsp);
        assert_eq!(
            manager.server_config(Language::Rust).unwrap().command,
            "ra-multiplex"
        );
    }
}
