//! Application container for wsymbol

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::OutputContext;
use crate::config;
use crate::host::TerminalHost;
use crate::host::color::resolve_color;
use crate::infra::lsp::LspManager;
use crate::infra::workspace;
use crate::models::config::WsConfig;
use crate::services::config::{ConfigService, DefaultConfigService};

pub struct App {
    root: PathBuf,
    pub(crate) output: OutputContext,
    pub(crate) config_service: Arc<dyn ConfigService>,
    pub(crate) config: WsConfig,
    pub(crate) lsp: LspManager,
    pub(crate) host: Arc<TerminalHost>,
}

impl App {
    /// Build the application for the project containing `start`
    pub async fn new(start: &Path) -> anyhow::Result<Self> {
        let start = std::path::absolute(start)?;
        let root = workspace::project_root(&start);

        tracing::debug!("Initializing wsymbol at {:?}", root);

        let output = OutputContext::new(root.clone());
        let config_service = Arc::new(DefaultConfigService::new(&root));
        let config = match config_service.load(false).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Using default configuration: {}", e);
                WsConfig::default()
            }
        };

        config::init(&config);

        let host = Arc::new(TerminalHost::new(
            resolve_color(config.output.color),
            config.navigation.open_command.clone(),
        ));
        let lsp = LspManager::new(root.clone(), config.lsp.clone());

        Ok(Self {
            root,
            output,
            config_service,
            config,
            lsp,
            host,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &WsConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_root_is_nearest_marker() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        let nested = dir.path().join("src").join("deep");
        std::fs::create_dir_all(&nested).unwrap();

        let app = App::new(&nested).await.unwrap();
        assert_eq!(app.root(), dir.path());
        assert_eq!(app.lsp.root(), dir.path());
    }
}
