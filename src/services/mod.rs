//! Service layer for wsymbol

pub mod config;
pub mod workspace_symbol;

pub use config::{ConfigService, DefaultConfigService};
pub use workspace_symbol::{Presented, SearchTarget, WorkspaceSymbolSearch};
