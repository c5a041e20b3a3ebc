//! Data models for wsymbol
//!
//! Contains core type definitions used throughout the application.

pub mod config;
pub mod lsp;
pub mod report;
pub mod symbol;

// Re-export commonly used types
pub use config::{DisplayMode, WsConfig};
pub use lsp::{Position, Range};
pub use report::{RenderedReport, Span};
pub use symbol::{Language, Location, OpenInstruction, Query, SymbolEntity, SymbolKind};
