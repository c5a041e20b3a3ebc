//! LSP Infrastructure for wsymbol
//!
//! Provides Language Server Protocol communication:
//! - JSON-RPC 2.0 protocol types
//! - Async message transport with Content-Length framing
//! - Client with atomic request IDs and a callback-based request seam
//! - Server manager, one server per language
//! - Workspace symbol capability checks

pub mod capabilities;
pub mod client;
pub mod manager;
pub mod protocol;
pub mod servers;
pub mod transport;

pub use capabilities::{language_display_name, provides_workspace_symbols};
pub use client::{IndexingState, LspClient, RequestSender, ResponseCallback};
pub use manager::LspManager;
pub use servers::ServerConfig;
