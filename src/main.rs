use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use edurag::{
    config::{self, Config, IngestFailurePolicy},
    logging,
    processing::{
        FixedQuestion, IngestService, QueryService, QuestionSource, StdinQuestion, format,
    },
};

#[derive(Parser)]
#[command(
    name = "edurag",
    about = "Upload PDF chunks to Firestore and summarize vector-search matches with Gemini"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chunk every PDF in a directory and upsert the chunks.
    Ingest {
        /// Directory to scan (defaults to `PDF_DIR`).
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Words per chunk (defaults to `CHUNK_SIZE`).
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        chunk_size: Option<u64>,
        /// `abort` or `skip` (defaults to `INGEST_FAILURE_POLICY`).
        #[arg(long, value_parser = parse_policy)]
        failure_policy: Option<IngestFailurePolicy>,
    },
    /// Ask a question and print a summary of the best matching chunks.
    Query {
        /// Question to ask instead of prompting on stdin.
        #[arg(long)]
        question: Option<String>,
        /// Number of chunks to retrieve (defaults to `SEARCH_LIMIT`).
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        limit: Option<u64>,
        /// Generative model (defaults to `GEMINI_MODEL`).
        #[arg(long)]
        model: Option<String>,
    },
}

fn parse_policy(value: &str) -> Result<IngestFailurePolicy, String> {
    value
        .parse()
        .map_err(|()| format!("unknown failure policy '{value}' (expected abort or skip)"))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = config::load();
    logging::init_tracing();

    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(err) => Err(anyhow::Error::new(err).context("failed to load configuration")),
    };
    if let Err(err) = result {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mut config: Config) -> Result<()> {
    tracing::debug!(
        project = %config.project_id,
        collection = %config.collection_name,
        chunk_size = config.chunk_size,
        search_limit = config.search_limit,
        failure_policy = ?config.failure_policy,
        has_access_token = config.google_access_token.is_some(),
        "Loaded configuration"
    );

    match cli.command {
        Command::Ingest {
            dir,
            chunk_size,
            failure_policy,
        } => {
            if let Some(size) = chunk_size {
                config.chunk_size = usize::try_from(size).context("chunk size out of range")?;
            }
            if let Some(policy) = failure_policy {
                config.failure_policy = policy;
            }
            let dir = dir.unwrap_or_else(|| PathBuf::from(&config.pdf_dir));

            let service =
                IngestService::from_config(&config).context("failed to build Firestore client")?;
            let report = service
                .ingest_directory(&dir)
                .await
                .with_context(|| format!("ingestion of {} failed", dir.display()))?;
            println!("{}", format::render_ingest_report(&report));
        }
        Command::Query {
            question,
            limit,
            model,
        } => {
            let credentials = config
                .query_credentials()
                .context("query pipeline requires FIREBASE_WEB_API_KEY and STUDIO_GEMINI_KEY")?;
            if let Some(limit) = limit {
                config.search_limit = usize::try_from(limit).context("limit out of range")?;
            }
            if let Some(model) = model {
                config.gemini_model = model;
            }

            let service = QueryService::from_config(&config, &credentials)
                .context("failed to build service clients")?;
            let mut source: Box<dyn QuestionSource> = match question {
                Some(question) => Box::new(FixedQuestion(question)),
                None => Box::new(StdinQuestion::new(format!(
                    "Ask a question about {} topics: ",
                    config.summary_topic
                ))),
            };
            let outcome = service.run(source.as_mut()).await?;
            println!("{}", format::render_outcome(&outcome));
        }
    }

    Ok(())
}
