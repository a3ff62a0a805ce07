//! Repo-Intel CLI
//!
//! The `repo-intel` command runs the same services as the HTTP server,
//! in-process, and prints results as pretty JSON.
//!
//! ## Commands
//!
//! - `index`: index a directory, file, or GitHub URL
//! - `ask`: answer a question about the indexed repository
//! - `validate`: validate a change request
//! - `impact`: assess the impact of a change request
//! - `analyze`: validate, assess impact, and decide

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rag_analysis::{ChangeRequest, QuestionRequest, DEFAULT_MAX_RESULTS};
use repo_intel_core::{init_tracing, LogFormat, RepoIntel, Settings};
use serde_json::{json, Value};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "repo-intel")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Question answering and change analysis over an indexed repository", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a local directory, a single file (PDFs included), or a GitHub URL
    Index {
        /// Path or URL to index
        path: String,

        /// Keep a cloned repository on disk instead of removing it
        #[arg(long)]
        no_cleanup: bool,
    },

    /// Ask a question about the indexed repository
    Ask {
        question: String,

        /// Evidence fragments to return (1-20)
        #[arg(long, default_value_t = DEFAULT_MAX_RESULTS)]
        max_results: usize,
    },

    /// Check a change request for conflicts, duplicates and contradictions
    Validate(ChangeArgs),

    /// Assess the impact of a change request
    Impact(ChangeArgs),

    /// Validate, assess impact, and decide whether a change is safe
    Analyze(ChangeArgs),
}

#[derive(Args, Debug, Clone)]
struct ChangeArgs {
    /// What the change does
    #[arg(long)]
    description: String,

    /// new_feature, modification, extension, deprecation, ...
    #[arg(long)]
    feature_type: String,

    /// Module the change targets (repeatable)
    #[arg(long = "module")]
    modules: Vec<String>,

    /// Business rule the change must respect (repeatable)
    #[arg(long = "rule")]
    rules: Vec<String>,
}

impl From<ChangeArgs> for ChangeRequest {
    fn from(args: ChangeArgs) -> Self {
        let mut request = ChangeRequest::new(args.description, args.feature_type);
        if !args.modules.is_empty() {
            request = request.with_target_modules(args.modules);
        }
        if !args.rules.is_empty() {
            request = request.with_business_rules(args.rules);
        }
        request
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().context("Invalid settings")?;
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        settings.log_level
    };
    init_tracing(cli.json || settings.log_format == LogFormat::Json, level);

    let app = RepoIntel::from_settings(settings)
        .await
        .context("Failed to initialise services")?;

    let output = run(&app, cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run(app: &RepoIntel, command: Commands) -> Result<Value> {
    match command {
        Commands::Index { path, no_cleanup } => cmd_index(app, &path, !no_cleanup).await,
        Commands::Ask {
            question,
            max_results,
        } => cmd_ask(app, QuestionRequest::new(question).with_max_results(max_results)).await,
        Commands::Validate(args) => {
            let response = app
                .analysis
                .validate_change(&args.into())
                .await
                .context("Failed to validate change")?;
            Ok(serde_json::to_value(response)?)
        }
        Commands::Impact(args) => {
            let response = app
                .analysis
                .analyze_impact(&args.into())
                .await
                .context("Failed to analyze impact")?;
            Ok(serde_json::to_value(response)?)
        }
        Commands::Analyze(args) => {
            let response = app
                .analysis
                .full_analysis(&args.into())
                .await
                .context("Failed to perform analysis")?;
            Ok(serde_json::to_value(response)?)
        }
    }
}

async fn cmd_index(app: &RepoIntel, path: &str, cleanup: bool) -> Result<Value> {
    info!("Indexing {}", path);
    let outcome = app
        .repository
        .index_source(path, cleanup)
        .await
        .with_context(|| format!("Failed to index {path}"))?;
    Ok(json!({
        "status": "success",
        "message": format!("Successfully indexed: {path}"),
        "source": outcome.source.label(),
        "documents": outcome.documents,
    }))
}

async fn cmd_ask(app: &RepoIntel, request: QuestionRequest) -> Result<Value> {
    let response = app
        .analysis
        .answer_question(&request)
        .await
        .context("Failed to answer question")?;
    Ok(serde_json::to_value(response)?)
}
