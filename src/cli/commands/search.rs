//! Search command implementation
//!
//! Two stages connected by plain values: the query is captured first (from
//! the argument or a prompt), then the session presents whatever the server
//! returns. `--live` keeps reading queries, one per line, and dispatches each
//! without waiting for the previous answer.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, bail};
use clap::Args;
use tokio::sync::mpsc;

use crate::app::App;
use crate::error::LspError;
use crate::host::Host;
use crate::infra::workspace::{detect_languages, first_source_file};
use crate::models::config::DisplayMode;
use crate::models::symbol::{Language, Query};
use crate::services::workspace_symbol::{Presented, SearchTarget, WorkspaceSymbolSearch};

const QUERY_PROMPT: &str = "symbol: ";

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Query text; prompted for when omitted. An empty query asks for every symbol
    #[arg(conflicts_with = "live")]
    pub query: Option<String>,

    /// Ask the server for this file's language and open the file on it
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Language server to ask (rust, python, typescript, go, ...)
    #[arg(short, long)]
    pub lang: Option<Language>,

    /// Project root (defaults to the nearest VCS or project marker)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Show every match in a grouped report
    #[arg(long, conflicts_with = "chooser")]
    pub report: bool,

    /// Pick one match from a list and jump to it
    #[arg(long)]
    pub chooser: bool,

    /// Read one query per input line and search as you type
    #[arg(long, requires = "report")]
    pub live: bool,
}

impl SearchArgs {
    fn mode(&self, configured: DisplayMode) -> DisplayMode {
        if self.report {
            DisplayMode::Report
        } else if self.chooser {
            DisplayMode::Chooser
        } else {
            configured
        }
    }
}

pub async fn execute(args: SearchArgs, app: &App) -> Result<()> {
    let query = if args.live {
        None
    } else {
        match capture_query(&args, app.host.as_ref()).await {
            Some(query) => Some(query),
            None => return Ok(()),
        }
    };

    let (language, document) = resolve_target(&args, app.root())?;
    let result = search(&args, app, language, document.as_deref(), query).await;
    app.lsp.shutdown_all().await;
    result
}

/// Stage one: the query from the argument, else from a prompt
async fn capture_query(args: &SearchArgs, host: &dyn Host) -> Option<Query> {
    match &args.query {
        Some(text) => Some(Query::new(text.clone())),
        None => host.prompt(QUERY_PROMPT).await.map(Query::new),
    }
}

async fn search(
    args: &SearchArgs,
    app: &App,
    language: Language,
    document: Option<&Path>,
    query: Option<Query>,
) -> Result<()> {
    let client = app.lsp.get_client(language).await?;
    if let Some(document) = document
        && let Err(e) = client.open_document(document).await
    {
        tracing::warn!("Could not open {} on the server: {}", document.display(), e);
    }
    let state = client.wait_for_indexing().await;
    tracing::debug!("{} indexing state: {:?}", language, state);

    let target = SearchTarget::from_client(&client).await;
    let mode = args.mode(app.config.search.mode);
    let host: Arc<dyn Host> = app.host.clone();
    let session = WorkspaceSymbolSearch::new(&target, host, mode, app.root())?;

    match query {
        Some(query) => match session.run(query).await? {
            Presented::NavigationFailed { reason } => bail!(reason),
            presented => {
                tracing::debug!("Search finished: {:?}", presented);
                Ok(())
            }
        },
        None => live(&session, Arc::clone(&app.host)).await,
    }
}

/// Dispatch every input line as a query and present answers as they arrive
async fn live<H: Host + 'static>(session: &WorkspaceSymbolSearch, host: Arc<H>) -> Result<()> {
    let (tx, mut lines) = mpsc::unbounded_channel();
    let reader = tokio::spawn(async move {
        while let Some(line) = host.prompt("").await {
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let mut in_flight = 0usize;
    let mut input_open = true;
    while input_open || in_flight > 0 {
        tokio::select! {
            line = lines.recv(), if input_open => match line {
                Some(text) => {
                    session.dispatch(Query::new(text));
                    in_flight += 1;
                }
                None => input_open = false,
            },
            completion = session.next_completion(), if in_flight > 0 => match completion {
                Some(completion) => {
                    in_flight -= 1;
                    session.handle(completion).await;
                }
                None => break,
            },
        }
    }

    reader.abort();
    Ok(())
}

/// Language to ask and the document to open on its server
fn resolve_target(args: &SearchArgs, root: &Path) -> Result<(Language, Option<PathBuf>)> {
    let file = args.file.as_deref().map(std::path::absolute).transpose()?;

    let language = match (args.lang, &file) {
        (Some(language), _) => language,
        (None, Some(file)) => Language::from_path(file),
        (None, None) => detect_languages(root)
            .into_iter()
            .next()
            .unwrap_or(Language::Unknown),
    };

    if language == Language::Unknown {
        let what = match &file {
            Some(file) => file.display().to_string(),
            None => root.display().to_string(),
        };
        return Err(LspError::UnsupportedLanguage(what).into());
    }

    if let Some(file) = &file
        && !file.is_file()
    {
        bail!("Not a file: {}", file.display());
    }

    let document = file.or_else(|| first_source_file(root, language));
    Ok((language, document))
}
