//! `wsymbol config`: create, inspect and edit configuration files

use std::path::Path;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::app::App;
use crate::cli::OutputContext;
use crate::services::config::{ENV_LSP_TIMEOUT, ENV_OPEN_COMMAND, ENV_SEARCH_MODE};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write a configuration file with every default spelled out
    Init {
        /// Write the global file (~/.config/wsymbol/config.toml)
        #[arg(long)]
        global: bool,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show the effective configuration
    Show {
        /// Global file only, without project file or environment
        #[arg(long)]
        global: bool,
    },

    /// Print where a configuration file lives
    Path {
        #[arg(long)]
        global: bool,
    },

    /// Open a configuration file in $VISUAL / $EDITOR
    Edit {
        #[arg(long)]
        global: bool,
    },
}

#[derive(Serialize)]
struct FileResponse {
    status: &'static str,
    scope: &'static str,
    path: String,
}

#[derive(Serialize)]
struct PathResponse {
    scope: &'static str,
    path: String,
    exists: bool,
}

#[derive(Serialize)]
struct ShowResponse {
    scope: &'static str,
    /// Environment variables that override file settings
    #[serde(skip_serializing_if = "Vec::is_empty")]
    env_overrides: Vec<&'static str>,
    config: serde_json::Value,
}

fn scope(global: bool) -> &'static str {
    if global { "global" } else { "project" }
}

fn display_path(ctx: &OutputContext, path: &Path, global: bool) -> String {
    if global {
        path.display().to_string()
    } else {
        ctx.relative_path(path)
    }
}

fn active_env_overrides() -> Vec<&'static str> {
    [ENV_LSP_TIMEOUT, ENV_SEARCH_MODE, ENV_OPEN_COMMAND]
        .into_iter()
        .filter(|key| std::env::var_os(key).is_some())
        .collect()
}

pub async fn execute(args: ConfigArgs, app: &App) -> Result<()> {
    let ctx = &app.output;
    let service = &app.config_service;

    match args.command {
        ConfigCommand::Init { global, force } => match service.init(global, force).await {
            Ok(path) => ctx.print_success_flat(FileResponse {
                status: "created",
                scope: scope(global),
                path: display_path(ctx, &path, global),
            }),
            Err(e) => ctx.print_error(&e.to_string()),
        },

        ConfigCommand::Show { global } => match service.load(global).await {
            Ok(config) => ctx.print_success_flat(ShowResponse {
                scope: if global { "global" } else { "merged" },
                env_overrides: if global {
                    Vec::new()
                } else {
                    active_env_overrides()
                },
                config: serde_json::to_value(&config)?,
            }),
            Err(e) => ctx.print_error(&e.to_string()),
        },

        ConfigCommand::Path { global } => {
            let path = service.config_path(global);
            ctx.print_success_flat(PathResponse {
                scope: scope(global),
                exists: path.exists(),
                path: display_path(ctx, &path, global),
            });
        }

        ConfigCommand::Edit { global } => match service.edit(global).await {
            Ok(path) => ctx.print_success_flat(FileResponse {
                status: "edited",
                scope: scope(global),
                path: display_path(ctx, &path, global),
            }),
            Err(e) => ctx.print_error(&e.to_string()),
        },
    }

    Ok(())
}
