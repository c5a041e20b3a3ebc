//! Jump from a symbol to its source location

use std::sync::Arc;

use crate::error::NavigationError;
use crate::host::Host;
use crate::models::lsp::{is_file_uri, uri_to_path};
use crate::models::symbol::{OpenInstruction, SymbolEntity};

pub struct SymbolNavigator {
    host: Arc<dyn Host>,
}

impl SymbolNavigator {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self { host }
    }

    /// Host instruction for `entity`
    ///
    /// The protocol position is zero-based, the host's is 1-based: row 4,
    /// column 2 becomes line 5, column 3.
    pub fn instruction_for(entity: &SymbolEntity) -> Result<OpenInstruction, NavigationError> {
        let uri = &entity.location.uri;
        if !is_file_uri(uri) {
            return Err(NavigationError::UnsupportedUri(uri.clone()));
        }
        let (line, column) = entity.start().to_host();
        Ok(OpenInstruction {
            path: uri_to_path(uri),
            line,
            column,
        })
    }

    /// Open the entity's file at its start position
    pub async fn navigate(&self, entity: &SymbolEntity) -> Result<OpenInstruction, NavigationError> {
        let target = Self::instruction_for(entity)?;

        match tokio::fs::metadata(&target.path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(NavigationError::NotAFile(target.path)),
            Err(source) => {
                return Err(NavigationError::Open {
                    path: target.path,
                    source,
                });
            }
        }

        tracing::debug!("Navigating to {}", target.encoded());
        self.host
            .open_file(&target)
            .await
            .map_err(|source| NavigationError::Open {
                path: target.path.clone(),
                source,
            })?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lsp::path_to_uri;
    use crate::models::symbol::{Location, SymbolKind};
    use crate::services::workspace_symbol::testing::RecordingHost;
    use tempfile::TempDir;

    fn entity_at(uri: &str, line: u32, character: u32) -> SymbolEntity {
        SymbolEntity::new("target", SymbolKind::Class, Location::point(uri, line, character))
    }

    #[test]
    fn test_instruction_is_one_based() {
        let target =
            SymbolNavigator::instruction_for(&entity_at("file:///work/a.txt", 4, 2)).unwrap();
        assert_eq!(target.line, 5);
        assert_eq!(target.column, 3);
        assert_eq!(target.encoded(), "/work/a.txt:5:3");

        let origin =
            SymbolNavigator::instruction_for(&entity_at("file:///work/a.txt", 0, 0)).unwrap();
        assert_eq!(origin.encoded(), "/work/a.txt:1:1");
    }

    #[test]
    fn test_non_file_uri_rejected() {
        let err =
            SymbolNavigator::instruction_for(&entity_at("jdt://contents/Foo.class", 0, 0))
                .unwrap_err();
        assert!(matches!(err, NavigationError::UnsupportedUri(_)));
    }

    #[tokio::test]
    async fn test_navigate_opens_existing_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("main.rs");
        std::fs::write(&file, "fn main() {}\n").unwrap();

        let host = Arc::new(RecordingHost::default());
        let navigator = SymbolNavigator::new(host.clone());
        let target = navigator
            .navigate(&entity_at(&path_to_uri(&file), 0, 3))
            .await
            .unwrap();

        assert_eq!(target.path, file);
        assert_eq!(host.opened(), vec![target]);
    }

    #[tokio::test]
    async fn test_navigate_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let host = Arc::new(RecordingHost::default());
        let navigator = SymbolNavigator::new(host.clone());

        let missing = path_to_uri(&dir.path().join("gone.rs"));
        let err = navigator.navigate(&entity_at(&missing, 0, 0)).await.unwrap_err();
        assert!(matches!(err, NavigationError::Open { .. }));

        let directory = path_to_uri(dir.path());
        let err = navigator.navigate(&entity_at(&directory, 0, 0)).await.unwrap_err();
        assert!(matches!(err, NavigationError::NotAFile(_)));
        assert!(host.opened().is_empty());
    }
}
