//! CLI module for wsymbol
//!
//! Provides command-line interface using clap derive macros.

pub mod commands;
pub mod output;

pub use output::OutputContext;

use clap::{Parser, Subcommand};

use commands::{config::ConfigArgs, doctor::DoctorArgs, search::SearchArgs};

const LONG_ABOUT: &str = r#"
wsymbol - workspace symbol search over the Language Server Protocol

Asks the project's language server for symbols matching a query, then jumps
to the one you pick or prints a grouped report of every match.

QUICK START:
  1. Check servers:           wsymbol doctor
  2. Search and jump:         wsymbol search LspClient
  3. Grouped report:          wsymbol search parse --report

SEARCH EXAMPLES:
  wsymbol search                                  # Prompt for the query
  wsymbol search Config --lang rust               # Pick the server explicitly
  wsymbol search handler --file src/api/mod.ts    # Server for this file
  wsymbol search --live --report                  # One query per input line

NAVIGATION:
  Without [navigation] open_command the chosen symbol is printed as
  path:line:column (1-based). With it, the command is run, e.g.
  open_command = "code --goto {path}:{line}:{column}"
"#;

/// wsymbol - workspace symbol search over LSP
#[derive(Parser, Debug)]
#[command(name = "wsymbol")]
#[command(author, version, about, long_about = LONG_ABOUT)]
#[command(propagate_version = true)]
#[command(after_help = "Use 'wsymbol <COMMAND> --help' for more information about a command.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output (show debug info)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search workspace symbols and jump to one
    Search(SearchArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Check which language servers are installed
    Doctor(DoctorArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::symbol::Language;

    #[test]
    fn test_parse_search_flags() {
        let cli = Cli::parse_from(["wsymbol", "search", "Foo", "--lang", "rust", "--report"]);
        let Commands::Search(args) = cli.command else {
            panic!("expected search");
        };
        assert_eq!(args.query.as_deref(), Some("Foo"));
        assert_eq!(args.lang, Some(Language::Rust));
        assert!(args.report);
        assert!(!args.live);
    }

    #[test]
    fn test_report_conflicts_with_chooser() {
        assert!(Cli::try_parse_from(["wsymbol", "search", "x", "--report", "--chooser"]).is_err());
    }

    #[test]
    fn test_live_requires_report() {
        assert!(Cli::try_parse_from(["wsymbol", "search", "--live"]).is_err());
        assert!(Cli::try_parse_from(["wsymbol", "search", "--live", "--report"]).is_ok());
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = Cli::parse_from(["wsymbol", "doctor", "--verbose"]);
        assert!(cli.verbose);
    }
}
