//! wsymbol - workspace symbol search CLI

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wsymbol::app::App;
use wsymbol::cli::output::error_value;
use wsymbol::cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    // Quiet by default; RUST_LOG=wsymbol=debug or --verbose for more
    let default_filter = if cli.verbose {
        "wsymbol=debug"
    } else {
        "wsymbol=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();

    // Server callbacks and UI effects share one thread
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!(
                r#"{{"success":false,"error":"Failed to create runtime: {}"}}"#,
                e
            );
            std::process::exit(1);
        }
    };
    let result = runtime.block_on(async_main(cli));

    if let Err(e) = result {
        let response = error_value(&format!("{e:#}"));
        println!(
            "{}",
            serde_json::to_string_pretty(&response)
                .unwrap_or_else(|_| format!(r#"{{"success":false,"error":"{}"}}"#, e))
        );
        std::process::exit(2);
    }
}

async fn async_main(cli: Cli) -> anyhow::Result<()> {
    let start = match &cli.command {
        Commands::Search(args) => args.root.clone(),
        _ => None,
    };
    let start = match start {
        Some(root) => root,
        None => std::env::current_dir()?,
    };

    let app = App::new(&start)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize: {}", e))?;

    execute_command(cli.command, &app).await
}

async fn execute_command(command: Commands, app: &App) -> anyhow::Result<()> {
    use wsymbol::cli::commands;

    match command {
        Commands::Search(args) => commands::search::execute(args, app).await,
        Commands::Config(args) => commands::config::execute(args, app).await,
        Commands::Doctor(args) => commands::doctor::execute(args, app),
    }
}
