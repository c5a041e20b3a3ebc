//! Doctor command - language server health check

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::app::App;
use crate::infra::lsp::capabilities::{
    language_display_name, support_note, workspace_symbol_support,
};
use crate::infra::lsp::servers::{ServerHealth, check_all_servers};

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Only list servers that are not installed
    #[arg(long)]
    pub missing_only: bool,
}

#[derive(Serialize)]
struct DoctorResponse {
    summary: DoctorSummary,
    servers: Vec<ServerEntry>,
}

#[derive(Serialize)]
struct DoctorSummary {
    installed: usize,
    missing: usize,
}

#[derive(Serialize)]
struct ServerEntry {
    language: &'static str,
    name: String,
    command: String,
    installed: bool,
    /// How well `workspace/symbol` works with this server
    workspace_symbols: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    install_command: Option<String>,
}

impl From<ServerHealth> for ServerEntry {
    fn from(health: ServerHealth) -> Self {
        Self {
            language: language_display_name(health.language),
            name: health.name,
            command: health.command,
            installed: health.installed,
            workspace_symbols: workspace_symbol_support(health.language).as_str(),
            note: support_note(health.language),
            install_command: (!health.installed).then_some(health.install_hint),
        }
    }
}

fn build_response(health: Vec<ServerHealth>, missing_only: bool) -> DoctorResponse {
    let servers: Vec<ServerEntry> = health
        .into_iter()
        .filter(|h| !missing_only || !h.installed)
        .map(ServerEntry::from)
        .collect();

    let installed = servers.iter().filter(|s| s.installed).count();
    DoctorResponse {
        summary: DoctorSummary {
            installed,
            missing: servers.len() - installed,
        },
        servers,
    }
}

pub fn execute(args: DoctorArgs, app: &App) -> Result<()> {
    let health = check_all_servers(&app.config().lsp);
    app.output
        .print_success_flat(build_response(health, args.missing_only));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::symbol::Language;

    fn health(language: Language, installed: bool) -> ServerHealth {
        ServerHealth {
            language,
            name: format!("{language}-ls"),
            command: format!("{language}-ls"),
            installed,
            install_hint: format!("install {language}-ls"),
        }
    }

    #[test]
    fn test_missing_only_filters_installed() {
        let response = build_response(
            vec![health(Language::Rust, true), health(Language::Kotlin, false)],
            true,
        );
        assert_eq!(response.servers.len(), 1);
        assert_eq!(response.summary.installed, 0);
        assert_eq!(response.summary.missing, 1);

        let entry = &response.servers[0];
        assert_eq!(entry.language, "Kotlin");
        assert_eq!(entry.workspace_symbols, "partial");
        assert!(entry.note.is_some());
        assert_eq!(entry.install_command.as_deref(), Some("install kotlin-ls"));
    }

    #[test]
    fn test_installed_server_has_no_install_command() {
        let response = build_response(vec![health(Language::Rust, true)], false);
        let value = serde_json::to_value(&response.servers[0]).unwrap();
        assert!(value.get("install_command").is_none());
        assert_eq!(value["workspace_symbols"], "full");
    }
}
