//! Configuration service for wsymbol
//!
//! Global file, then project file, then environment. Files are merged key by
//! key, so a project file only needs the settings it changes.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::ConfigError;
use crate::models::config::WsConfig;

pub const ENV_LSP_TIMEOUT: &str = "WSYMBOL_LSP_TIMEOUT";
pub const ENV_SEARCH_MODE: &str = "WSYMBOL_SEARCH_MODE";
pub const ENV_OPEN_COMMAND: &str = "WSYMBOL_OPEN_COMMAND";

#[async_trait]
pub trait ConfigService: Send + Sync {
    async fn load(&self, global_only: bool) -> Result<WsConfig, ConfigError>;
    fn config_path(&self, global: bool) -> PathBuf;
    async fn init(&self, global: bool, force: bool) -> Result<PathBuf, ConfigError>;
    async fn edit(&self, global: bool) -> Result<PathBuf, ConfigError>;
}

pub struct DefaultConfigService {
    root: PathBuf,
    global_path: PathBuf,
}

impl DefaultConfigService {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            global_path: Self::global_config_path(),
        }
    }

    /// Service reading its global file from an explicit location
    pub fn with_global_path(root: &Path, global_path: PathBuf) -> Self {
        Self {
            root: root.to_path_buf(),
            global_path,
        }
    }

    fn global_config_path() -> PathBuf {
        // XDG standard: ~/.config/wsymbol/config.toml
        std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wsymbol")
            .join("config.toml")
    }

    fn project_config_path(&self) -> PathBuf {
        self.root.join(".wsymbol").join("config.toml")
    }

    async fn read_table(path: &Path) -> Result<toml::Table, ConfigError> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Ok(toml::Table::new());
        }
        let content = tokio::fs::read_to_string(path).await?;
        content
            .parse::<toml::Table>()
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))
    }

    async fn write_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = toml::to_string_pretty(&WsConfig::default())
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    fn get_editor() -> String {
        std::env::var("VISUAL")
            .or_else(|_| std::env::var("EDITOR"))
            .unwrap_or_else(|_| {
                if cfg!(target_os = "windows") {
                    "notepad".to_string()
                } else {
                    "vi".to_string()
                }
            })
    }
}

#[async_trait]
impl ConfigService for DefaultConfigService {
    async fn load(&self, global_only: bool) -> Result<WsConfig, ConfigError> {
        let mut table = Self::read_table(&self.global_path).await?;
        if !global_only {
            merge_tables(&mut table, Self::read_table(&self.project_config_path()).await?);
        }

        let config: WsConfig = toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Parse(e.to_string()))?;

        if global_only {
            return Ok(config);
        }
        apply_env_overrides(config, |key| std::env::var(key).ok())
    }

    fn config_path(&self, global: bool) -> PathBuf {
        if global {
            self.global_path.clone()
        } else {
            self.project_config_path()
        }
    }

    async fn init(&self, global: bool, force: bool) -> Result<PathBuf, ConfigError> {
        let path = self.config_path(global);

        if path.exists() && !force {
            return Err(ConfigError::InvalidValue {
                key: "config".to_string(),
                message: format!(
                    "Config already exists: {}. Use --force to overwrite.",
                    path.display()
                ),
            });
        }

        Self::write_default_config(&path).await?;
        Ok(path)
    }

    async fn edit(&self, global: bool) -> Result<PathBuf, ConfigError> {
        let path = self.config_path(global);

        if !path.exists() {
            return Err(ConfigError::NotFound(format!(
                "Config file does not exist: {}\nRun: wsymbol config init{}",
                path.display(),
                if global { " --global" } else { "" }
            )));
        }

        let editor = Self::get_editor();
        let status = tokio::process::Command::new(&editor)
            .arg(&path)
            .status()
            .await
            .map_err(|e| ConfigError::InvalidValue {
                key: "editor".to_string(),
                message: format!("Failed to launch editor '{}': {}", editor, e),
            })?;

        if !status.success() {
            return Err(ConfigError::InvalidValue {
                key: "editor".to_string(),
                message: "Editor exited with error".to_string(),
            });
        }

        Ok(path)
    }
}

/// Recursively overlay `overlay` onto `base`; nested tables merge, other
/// values replace
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(incoming) => {
                if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                    merge_tables(existing, incoming);
                } else {
                    base.insert(key, toml::Value::Table(incoming));
                }
            }
            other => {
                base.insert(key, other);
            }
        }
    }
}

fn apply_env_overrides<F>(mut config: WsConfig, lookup: F) -> Result<WsConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup(ENV_LSP_TIMEOUT) {
        config.lsp.timeout_secs = val.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: ENV_LSP_TIMEOUT.to_string(),
            message: format!("expected seconds, got '{}'", val),
        })?;
    }
    if let Some(val) = lookup(ENV_SEARCH_MODE) {
        config.search.mode = val.parse().map_err(|message| ConfigError::InvalidValue {
            key: ENV_SEARCH_MODE.to_string(),
            message,
        })?;
    }
    if let Some(val) = lookup(ENV_OPEN_COMMAND) {
        config.navigation.open_command = Some(val).filter(|v| !v.trim().is_empty());
    }
    Ok(config)
}
