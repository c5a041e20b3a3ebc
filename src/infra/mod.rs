//! Infrastructure layer for wsymbol
//!
//! Contains low-level implementations and external integrations.

pub mod lsp;
pub mod workspace;
