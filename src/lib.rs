//! wsymbol - workspace symbol search over the Language Server Protocol
//!
//! Sends `workspace/symbol` to a project's language server, then either jumps
//! to the chosen match or renders every match as a report grouped by file.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod infra;
pub mod models;
pub mod services;

pub use error::{WsError, WsResult};
