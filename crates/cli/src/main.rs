use anyhow::Result;
use clap::{Parser, Subcommand};
use finder_core::config;
use finder_core::roots;
use finder_core::scorer::RelevanceScorer;
use finder_core::semantic;
use finder_core::{search_by_content, SearchEngine};
use std::future::Future;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// How long exit waits for blocking work a timed-out search left behind.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

fn main() -> Result<()> {
    // stdout carries the JSON envelope; logs go to stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run_to_completion(run(cli), SHUTDOWN_GRACE)
}

/// Drives `fut` on a fresh runtime, then shuts it down without blocking on
/// extraction threads that outlived their task budget.
fn run_to_completion<F>(fut: F, grace: Duration) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(fut);
    runtime.shutdown_timeout(grace);
    result
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Search {
            root,
            extension,
            hint,
            max_results,
        } => run_search(cli.config.as_deref(), &root, &extension, &hint, max_results).await,
        Commands::Roots { json } => {
            let roots = roots::list_scan_roots();
            if json {
                println!("{}", serde_json::to_string_pretty(&roots)?);
            } else if roots.is_empty() {
                println!("No roots available.");
            } else {
                println!("{}", roots.join("\n"));
            }
            Ok(())
        }
    }
}

#[derive(Parser)]
#[command(name = "content-finder")]
#[command(about = "Find files whose content matches a description", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a directory tree (or drive letter) for matching files
    Search {
        /// Directory to search, or a drive letter on Windows
        root: String,
        /// File extension to match, e.g. pdf or .docx
        #[arg(short, long)]
        extension: String,
        /// What the file should be about
        #[arg(long)]
        hint: String,
        /// Maximum number of results (defaults to search.default_max_results)
        #[arg(short = 'n', long)]
        max_results: Option<usize>,
    },
    /// List places a search can start from
    Roots {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

async fn run_search(
    config_path: Option<&str>,
    root: &str,
    extension: &str,
    hint: &str,
    max_results: Option<usize>,
) -> Result<()> {
    let cfg = config::load(config_path)?;
    let model = semantic::load_model(&cfg.semantic);
    let scorer = RelevanceScorer::new(model, cfg.semantic.text_chars);
    let max_results = max_results.unwrap_or(cfg.search.default_max_results);
    let engine = SearchEngine::new(cfg.search, scorer);

    let response = search_by_content(&engine, root, extension, hint, max_results).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
