//! LSP Common Types
//!
//! Positions, ranges and URI conversion shared by the protocol layer and the
//! workspace symbol models.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ============================================================================
// Core LSP Types
// ============================================================================

/// Position within a document (0-indexed, LSP standard)
///
/// `line` is the row and `character` the column of a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }

    /// Largest line or character an LSP `uinteger` can carry
    pub const MAX_COORDINATE: u32 = i32::MAX as u32;

    /// Both coordinates fit the LSP `uinteger` range
    pub fn is_addressable(&self) -> bool {
        self.line <= Self::MAX_COORDINATE && self.character <= Self::MAX_COORDINATE
    }

    /// Convert 0-indexed LSP position to the 1-indexed host position
    ///
    /// Exact for addressable positions; saturates beyond that.
    pub fn to_host(&self) -> (u32, u32) {
        (self.line.saturating_add(1), self.character.saturating_add(1))
    }
}

/// Range within a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Convert a single position to a range
    pub fn point(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }
}

// ============================================================================
// URI Utilities
// ============================================================================

/// Convert file path to RFC 3986 compliant file:// URI
pub fn path_to_uri(path: &Path) -> String {
    let abs_path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    };

    let path_str = abs_path.to_string_lossy();
    let encoded: String = path_str
        .chars()
        .map(|c| match c {
            '/' | '.' | '-' | '_' | '~' => c.to_string(),
            c if c.is_ascii_alphanumeric() => c.to_string(),
            c => {
                let mut buf = [0u8; 4];
                c.encode_utf8(&mut buf)
                    .bytes()
                    .map(|b| format!("%{:02X}", b))
                    .collect()
            }
        })
        .collect();

    format!("file://{encoded}")
}

/// Whether the URI uses the `file` scheme
pub fn is_file_uri(uri: &str) -> bool {
    uri.starts_with("file://")
}

/// Convert file:// URI to PathBuf with full percent-decoding
pub fn uri_to_path(uri: &str) -> PathBuf {
    let path = match uri.strip_prefix("file://") {
        Some(p) => p,
        None => {
            tracing::warn!("Invalid file URI (missing file:// prefix): {}", uri);
            return PathBuf::from(uri);
        }
    };

    // Windows: file:///C:/path → C:/path (strip leading /)
    #[cfg(windows)]
    let path = path.strip_prefix('/').unwrap_or(path);

    PathBuf::from(percent_decode(path))
}

fn percent_decode(input: &str) -> String {
    let mut result = Vec::with_capacity(input.len());
    let bytes = input.as_bytes();
    let mut index = 0;

    while let Some(&byte) = bytes.get(index) {
        if byte == b'%'
            && let Some(decoded) = decode_escape(&bytes[index + 1..])
        {
            result.push(decoded);
            index += 3;
            continue;
        }
        result.push(byte);
        index += 1;
    }

    String::from_utf8_lossy(&result).into_owned()
}

/// Byte for a `%XY` escape whose two hex digits start `rest`
fn decode_escape(rest: &[u8]) -> Option<u8> {
    let high = hex_value(*rest.first()?)?;
    let low = hex_value(*rest.get(1)?)?;
    Some((high << 4) | low)
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
