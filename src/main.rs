//! pubmed-crawler main entry point
//!
//! This is the command-line interface for the PubMed citation crawler.

use anyhow::Context;
use clap::{Parser, Subcommand};
use pubmed_crawler::config::{
    load_config_with_hash, validate_http_config, validate_pmid, CitationJob, HttpConfig,
    SearchJob, DEFAULT_MAX_RESULTS,
};
use pubmed_crawler::crawler::{run_jobs, CrawlEngine, CrawlReport};
use pubmed_crawler::fetch::HttpSource;
use pubmed_crawler::output::{export_markdown, load_statistics, print_report, print_statistics};
use pubmed_crawler::state::Snapshot;
use pubmed_crawler::CrawlerError;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// pubmed-crawler: a resumable PubMed citation crawler
///
/// Pages through PubMed search results, follows "cited by" links and archives
/// every article once, remembering which searches found it.
#[derive(Parser, Debug)]
#[command(name = "pubmed-crawler")]
#[command(version)]
#[command(about = "A resumable PubMed citation crawler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Archive directory, or SQLite file (.db, .sqlite, .sqlite3)
    #[arg(long, global = true, value_name = "PATH")]
    archive: Option<PathBuf>,

    /// Checkpoint written after every job, on failure and on Ctrl-C
    #[arg(long, global = true, value_name = "PATH")]
    checkpoint: Option<PathBuf>,

    /// Continue from a previously saved checkpoint
    #[arg(long, global = true, value_name = "PATH")]
    resume: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Archive the results of a free-text search
    Search {
        text: String,

        /// Publication window: 1_year, 5_years, 10_years or none
        #[arg(long, default_value = "none")]
        limited_to: String,

        /// Include articles without an abstract
        #[arg(long)]
        any_abstract: bool,

        #[arg(long, default_value_t = DEFAULT_MAX_RESULTS)]
        max_results: usize,

        /// Citation levels to follow from every new article
        #[arg(long, default_value_t = 0)]
        citation_depth: u32,

        /// Articles pulled per citation expansion
        #[arg(long, default_value_t = DEFAULT_MAX_RESULTS)]
        citation_limit: usize,
    },

    /// Archive the articles citing a PMID
    Citations {
        id: String,

        #[arg(long, default_value_t = DEFAULT_MAX_RESULTS)]
        max_results: usize,

        #[arg(long, default_value_t = 1)]
        depth: u32,
    },

    /// Archive the articles added to PubMed today
    Latest {
        #[arg(long, default_value_t = DEFAULT_MAX_RESULTS)]
        max_results: usize,
    },

    /// Run every job of a TOML configuration file
    Run {
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Ignore the configured checkpoint and start over
        #[arg(long)]
        fresh: bool,
    },

    /// Show statistics of a checkpoint and exit
    Stats {
        #[arg(value_name = "CHECKPOINT")]
        checkpoint: PathBuf,
    },

    /// Export a checkpoint as a markdown bibliography
    Export {
        #[arg(value_name = "CHECKPOINT")]
        checkpoint: PathBuf,

        #[arg(value_name = "OUT")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match &cli.command {
        Command::Stats { checkpoint } => handle_stats(checkpoint),
        Command::Export { checkpoint, output } => handle_export(checkpoint, output),
        Command::Run { config, fresh } => handle_run(&cli, config, *fresh).await,
        Command::Search {
            text,
            limited_to,
            any_abstract,
            max_results,
            citation_depth,
            citation_limit,
        } => {
            let job = SearchJob {
                text: text.clone(),
                limited_to: limited_to.clone(),
                require_abstract: !any_abstract,
                max_results: *max_results,
                citation_depth: *citation_depth,
                citation_limit: *citation_limit,
            };
            handle_crawl(&cli, Task::Search(job)).await
        }
        Command::Citations {
            id,
            max_results,
            depth,
        } => {
            let job = CitationJob {
                id: id.clone(),
                max_results: *max_results,
                depth: *depth,
            };
            handle_crawl(&cli, Task::Citations(job)).await
        }
        Command::Latest { max_results } => handle_crawl(&cli, Task::Latest(*max_results)).await,
    }
}

/// Crawl requested directly on the command line
enum Task {
    Search(SearchJob),
    Citations(CitationJob),
    Latest(usize),
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pubmed_crawler=info,warn"),
            1 => EnvFilter::new("pubmed_crawler=debug,info"),
            2 => EnvFilter::new("pubmed_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the stats command: shows statistics of a checkpoint
fn handle_stats(checkpoint: &Path) -> anyhow::Result<()> {
    println!("Checkpoint: {}\n", checkpoint.display());

    let stats = load_statistics(checkpoint)
        .with_context(|| format!("Failed to read checkpoint {}", checkpoint.display()))?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the export command: writes a markdown bibliography
fn handle_export(checkpoint: &Path, output: &Path) -> anyhow::Result<()> {
    println!("=== Exporting Bibliography ===\n");
    println!("Checkpoint: {}", checkpoint.display());
    println!("Output: {}", output.display());
    println!();

    let state = Snapshot::read_from(checkpoint)
        .and_then(Snapshot::into_state)
        .with_context(|| format!("Failed to read checkpoint {}", checkpoint.display()))?;

    tracing::info!("Writing {} records...", state.results.len());
    export_markdown(&state, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("✓ Bibliography exported to: {}", output.display());

    Ok(())
}

/// Handles the run command: executes every configured job
async fn handle_run(cli: &Cli, config_path: &Path, fresh: bool) -> anyhow::Result<()> {
    tracing::info!("Loading configuration from: {}", config_path.display());
    let (config, hash) = load_config_with_hash(config_path)
        .with_context(|| format!("Invalid configuration {}", config_path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    let archive = cli.archive.clone().or_else(|| config.archive.path.clone());
    let checkpoint = cli
        .checkpoint
        .clone()
        .or_else(|| config.checkpoint.path.clone());

    let resume = if fresh {
        tracing::info!("Starting fresh crawl (ignoring previous checkpoint)");
        None
    } else {
        cli.resume
            .clone()
            .or_else(|| checkpoint.clone().filter(|path| path.exists()))
    };

    tracing::info!(
        "Search jobs: {}, citation jobs: {}",
        config.search.len(),
        config.citations.len()
    );

    let mut engine = build_engine(&config.http, archive.as_deref(), resume.as_deref())?;
    if engine.adopt_config_hash(&hash) {
        println!("Note: {} changed since the checkpoint was saved", config_path.display());
    }
    watch_interrupt(&engine);

    let outcome = run_jobs(&mut engine, &config, checkpoint.as_deref()).await;
    finish(&engine, outcome, checkpoint.as_deref())
}

/// Handles the search, citations and latest commands
async fn handle_crawl(cli: &Cli, task: Task) -> anyhow::Result<()> {
    // Reject bad arguments before any request is made
    match &task {
        Task::Search(job) => {
            job.filters()?;
        }
        Task::Citations(job) => validate_pmid(&job.id)?,
        Task::Latest(_) => {}
    }

    let http = HttpConfig::default();
    validate_http_config(&http)?;

    let mut engine = build_engine(&http, cli.archive.as_deref(), cli.resume.as_deref())?;
    watch_interrupt(&engine);

    let outcome = match &task {
        Task::Search(job) => engine.run_search(job).await,
        Task::Citations(job) => engine.run_citation_job(job).await,
        Task::Latest(limit) => engine.latest(*limit).await,
    };

    finish(&engine, outcome, cli.checkpoint.as_deref())
}

fn build_engine(
    http: &HttpConfig,
    archive: Option<&Path>,
    resume: Option<&Path>,
) -> anyhow::Result<CrawlEngine<HttpSource>> {
    let source = Arc::new(HttpSource::new(http)?);

    let engine = match resume {
        Some(path) => {
            let engine = CrawlEngine::resume(path, source)
                .with_context(|| format!("Failed to resume from {}", path.display()))?;
            if let Some(requested) = archive {
                if engine.state().archive_path.as_deref() != Some(requested) {
                    tracing::warn!(
                        "Ignoring --archive {}: the checkpoint archives to {:?}",
                        requested.display(),
                        engine.state().archive_path
                    );
                }
            }
            engine
        }
        None => match archive {
            Some(path) => {
                tracing::info!("Archiving to {}", path.display());
                CrawlEngine::with_archive(source, path)?
            }
            None => {
                tracing::warn!("No archive configured, results are kept in memory only");
                CrawlEngine::new(source)
            }
        },
    };

    Ok(engine)
}

/// Stops the engine before its next pull on Ctrl-C
fn watch_interrupt(engine: &CrawlEngine<HttpSource>) {
    let cancel = engine.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current page");
            cancel.store(true, Ordering::SeqCst);
        }
    });
}

/// Saves the checkpoint and reports the outcome of a crawl
fn finish(
    engine: &CrawlEngine<HttpSource>,
    outcome: Result<CrawlReport, CrawlerError>,
    checkpoint: Option<&Path>,
) -> anyhow::Result<()> {
    if let Some(path) = checkpoint {
        if let Err(e) = engine.save_checkpoint(path) {
            tracing::error!("Failed to save checkpoint to {}: {}", path.display(), e);
        }
    }

    match outcome {
        Ok(report) => {
            print_report(&report);
            tracing::info!("Crawl completed: {} records archived", engine.state().len());
            Ok(())
        }
        Err(CrawlerError::Traversal { report, source }) => {
            print_report(&report);
            tracing::error!(
                "Crawl aborted on page {} of {}: {}",
                source.page(),
                source.query(),
                source
            );
            Err(CrawlerError::Traversal { report, source }.into())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
