//! grabby CLI: tag files with AI and embed them into AnythingLLM workspaces.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod review;

use review::Prompter;

use grabby::pipeline::GroupResult;
use grabby::tagging::normalize_tag;
use grabby::{
    embed_selected, load_workspaces, run_intake, AnythingLlmClient, BatchReport, Config,
    DocumentBackend, FileId, FileStatus, GeminiProvider, Session, TagSuggester, Upload,
};

#[derive(Parser)]
#[command(name = "grabby", version, about = "AI-tagged batch embedding for AnythingLLM")]
struct Cli {
    /// Config file (defaults to the platform config dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug-level logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List workspaces with their document counts.
    Workspaces,

    /// Print suggested tags for a filename.
    Suggest {
        filename: String,
    },

    /// Upload files to the locker and tag them; optionally embed them.
    Ingest {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Primary tag for every file (otherwise the first suggested tag).
        #[arg(long, conflicts_with = "review")]
        primary: Option<String>,

        /// Edit tags and pick the primary tag of each file interactively.
        #[arg(long)]
        review: bool,

        /// Embed all confirmed files into their workspaces.
        #[arg(long)]
        embed: bool,
    },
}

fn init_tracing(config: &Config, verbose: bool) {
    let fallback = if verbose {
        "grabby=debug".to_string()
    } else {
        config
            .log_level
            .clone()
            .unwrap_or_else(|| "grabby=info".to_string())
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config, cli.verbose);

    match cli.command {
        Commands::Workspaces => {
            let backend = AnythingLlmClient::new(&config.anythingllm)?;
            let workspaces = backend
                .list_workspaces()
                .await
                .context("Failed to fetch workspaces")?;
            if workspaces.is_empty() {
                println!("No workspaces found.");
            }
            for ws in workspaces {
                println!("{:<32} {:<32} {:>6}", ws.name, ws.slug, ws.documents);
            }
        }

        Commands::Suggest { filename } => {
            let tagger = TagSuggester::new(Arc::new(GeminiProvider::new(&config.tagging)?));
            println!("{}", tagger.suggest(&filename).await.join(", "));
        }

        Commands::Ingest {
            paths,
            primary,
            review,
            embed,
        } => {
            let primary = primary
                .as_deref()
                .map(|tag| normalize_tag(tag).context("--primary must not be blank"))
                .transpose()?;
            let backend = AnythingLlmClient::new(&config.anythingllm)?;
            let tagger = TagSuggester::new(Arc::new(GeminiProvider::new(&config.tagging)?));
            let session = Session::new();

            let mut uploads = Vec::with_capacity(paths.len());
            for path in &paths {
                uploads.push(Upload::from_path(path).await?);
            }

            load_workspaces(&session, &backend).await;
            let ids = run_intake(&session, &backend, &tagger, uploads).await;

            let run_batch = if review {
                let mut terminal = review::Terminal::default();
                let selected = review::review_all(&session, &ids, &mut terminal)?;
                selected > 0
                    && (embed
                        || terminal.confirm(&format!("Embed {selected} selected file(s) now?"))?)
            } else {
                for id in &ids {
                    auto_confirm(&session, id, primary.as_deref(), embed)?;
                }
                embed
            };

            if run_batch {
                let report = embed_selected(&session, &backend).await?;
                print_report(&report);
            }

            print_session(&session);
        }
    }

    Ok(())
}

/// Non-interactive confirmation: `primary` (added as a tag if needed) or the
/// first suggested tag becomes the primary tag.
fn auto_confirm(
    session: &Session,
    id: &FileId,
    primary: Option<&str>,
    select: bool,
) -> Result<()> {
    let Some(file) = session.file(id) else {
        return Ok(());
    };
    if file.status() != FileStatus::AwaitingConfirmation {
        return Ok(());
    }
    let tag = match primary {
        Some(tag) => {
            session.add_tag(id, tag)?;
            tag.to_string()
        }
        None => match file.state.tags().first() {
            Some(tag) => tag.clone(),
            None => return Ok(()),
        },
    };
    session.set_primary_tag(id, &tag)?;
    if select && !session.is_selected(id) {
        session.toggle_selection(id)?;
    }
    Ok(())
}

fn print_report(report: &BatchReport) {
    if !report.created_workspaces.is_empty() {
        println!("Created workspaces: {}", report.created_workspaces.join(", "));
    }
    for group in &report.groups {
        let outcome = match &group.result {
            GroupResult::Embedded { slug } => format!("embedded into {slug}"),
            GroupResult::CreationFailed { reason } => format!("workspace creation failed: {reason}"),
            GroupResult::WorkspaceNotFound => "workspace not found".to_string(),
            GroupResult::EmbeddingFailed { slug, reason } => {
                format!("embedding into {slug} failed: {reason}")
            }
        };
        println!("[{}] {} file(s): {outcome}", group.tag, group.files.len());
    }
    println!(
        "{} file(s) embedded, {} failed",
        report.embedded_files(),
        report.failed_files()
    );
}

fn print_session(session: &Session) {
    println!();
    println!("Files:");
    for file in session.files() {
        let detail = match file.state.error() {
            Some(message) => message.to_string(),
            None => file.state.tags().join(", "),
        };
        let primary = file
            .state
            .primary_tag()
            .map(|t| format!(" -> {t}"))
            .unwrap_or_default();
        println!(
            "  {:<40} {:<22} {detail}{primary}",
            file.filename(),
            file.status().to_string()
        );
    }

    println!();
    println!("Workspaces:");
    for ws in session.workspaces() {
        println!("  {:<32} {:>6}", ws.name, ws.documents);
    }

    println!();
    println!("Activity:");
    for entry in session.activity().iter().rev() {
        let marker = if entry.is_error { "!" } else { " " };
        println!(
            "{marker} {} {}",
            entry.timestamp.format("%H:%M:%S"),
            entry.message
        );
    }
}
