//! Response classification
//!
//! Turns one `workspace/symbol` completion into exactly one [`SearchOutcome`].
//! Entries are validated here, once; everything downstream works on
//! [`SymbolEntity`] values whose location is known to be present.

use serde_json::Value;

use crate::error::SearchError;
use crate::infra::lsp::protocol::{ResponseError, WorkspaceSymbolEntry};
use crate::models::lsp::Range;
use crate::models::symbol::{Location, SymbolEntity, SymbolKind};

/// Reason shown when the server's error carries no message
pub const UNKNOWN_REASON: &str = "unknown error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Failure { reason: String },
    Empty,
    Single(SymbolEntity),
    /// Two or more entities, in server order
    Multiple(Vec<SymbolEntity>),
}

impl SearchOutcome {
    pub fn len(&self) -> usize {
        match self {
            Self::Failure { .. } | Self::Empty => 0,
            Self::Single(_) => 1,
            Self::Multiple(entities) => entities.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Classify a completion
///
/// Pure: resolving the same completion twice gives the same outcome.
pub fn resolve(result: &Result<Value, ResponseError>) -> SearchOutcome {
    let value = match result {
        Ok(value) => value,
        Err(error) => {
            return SearchOutcome::Failure {
                reason: reason_of(error),
            };
        }
    };

    let entries = match value {
        Value::Null => return SearchOutcome::Empty,
        Value::Array(entries) => entries,
        other => {
            tracing::warn!("Unexpected workspace/symbol result shape: {}", other);
            return SearchOutcome::Failure {
                reason: "server returned a malformed symbol list".to_string(),
            };
        }
    };

    let mut entities: Vec<SymbolEntity> = entries
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| parse_entry(index, raw))
        .collect();

    match entities.len() {
        0 => SearchOutcome::Empty,
        1 => SearchOutcome::Single(entities.remove(0)),
        _ => SearchOutcome::Multiple(entities),
    }
}

/// Error dialog text for a failure reason
pub fn failure_text(reason: &str) -> String {
    SearchError::RequestFailed {
        reason: reason.to_string(),
    }
    .to_string()
}

fn reason_of(error: &ResponseError) -> String {
    let message = error.message.trim();
    if message.is_empty() {
        UNKNOWN_REASON.to_string()
    } else {
        message.to_string()
    }
}

/// Validate one entry; malformed entries are logged and dropped
fn parse_entry(index: usize, raw: &Value) -> Option<SymbolEntity> {
    let entry: WorkspaceSymbolEntry = match serde_json::from_value(raw.clone()) {
        Ok(entry) => entry,
        Err(e) => {
            tracing::warn!("Skipping unparsable symbol #{}: {}", index, e);
            return None;
        }
    };

    let Some(name) = entry.name else {
        tracing::warn!("Skipping symbol #{} without a name", index);
        return None;
    };
    let Some(uri) = entry.location.as_ref().and_then(|l| l.uri.clone()) else {
        tracing::warn!("Skipping symbol '{}' without a location", name);
        return None;
    };
    let range: Range = entry.location.and_then(|l| l.range).unwrap_or_default();
    if !range.start.is_addressable() {
        tracing::warn!(
            "Skipping symbol '{}' at out-of-range position {:?}",
            name,
            range.start
        );
        return None;
    }
    let kind = kind_of(entry.kind.as_ref());

    let entity = SymbolEntity::new(name, kind, Location::new(uri, range));
    Some(match entry.container_name {
        Some(container) => entity.with_container(container),
        None => entity,
    })
}

/// Kind codes outside `u32` (negative, fractional, non-numeric) read as unknown
fn kind_of(raw: Option<&Value>) -> SymbolKind {
    raw.and_then(Value::as_u64)
        .and_then(|code| u32::try_from(code).ok())
        .map_or(SymbolKind::Unknown(0), SymbolKind::from_lsp)
}
