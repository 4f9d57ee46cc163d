use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use lexscan::config::{self, AnalysisConfig};
use lexscan::db::{JobStore, MemoryJobStore, SqliteJobStore};
use lexscan::pipeline::extraction::{ExtractionCoordinator, ExtractionInput};
use lexscan::pipeline::processor::DocumentProcessor;
use lexscan::pipeline::redaction::Redactor;

#[derive(Parser)]
#[command(
    name = "lexscan",
    version,
    about = "Local analysis of uploaded legal documents"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline and print the JSON report.
    Analyze {
        file: PathBuf,
        /// Declared media type, e.g. application/pdf.
        #[arg(long)]
        media_type: Option<String>,
        /// SQLite job database. Jobs stay in memory when neither this nor
        /// --persist is given.
        #[arg(long)]
        db: Option<PathBuf>,
        /// Store the job in the default database under the data directory.
        #[arg(long, conflicts_with = "db")]
        persist: bool,
        /// Question to ask once analysis finishes. Repeatable.
        #[arg(long = "ask")]
        questions: Vec<String>,
    },
    /// Print the redacted text only.
    Redact {
        file: PathBuf,
        #[arg(long)]
        media_type: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    lexscan::init_tracing();
    if let Err(err) = run(Cli::parse()).await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AnalysisConfig::from_env();
    match cli.command {
        Command::Analyze {
            file,
            media_type,
            db,
            persist,
            questions,
        } => {
            let store = open_store(db, persist)?;
            analyze(store, config, &file, media_type, &questions).await
        }
        Command::Redact { file, media_type } => redact(&config, &file, media_type),
    }
}

async fn analyze(
    store: Arc<dyn JobStore>,
    config: AnalysisConfig,
    file: &Path,
    media_type: Option<String>,
    questions: &[String],
) -> Result<()> {
    let processor = DocumentProcessor::new(store, config);
    let report = processor.analyze(read_input(file, media_type)?).await?;

    let answers = questions
        .iter()
        .map(|q| {
            let answer = processor.ask(&report.id, q)?;
            Ok(serde_json::json!({ "question": q, "answer": answer }))
        })
        .collect::<Result<Vec<_>>>()?;

    let output = serde_json::json!({ "report": report, "answers": answers });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn redact(config: &AnalysisConfig, file: &Path, media_type: Option<String>) -> Result<()> {
    let input = read_input(file, media_type)?;
    if input.file_size_bytes > config.max_file_size_bytes {
        bail!(
            "{} is {} bytes, above the {} byte limit",
            file.display(),
            input.file_size_bytes,
            config.max_file_size_bytes
        );
    }

    let outcome = ExtractionCoordinator::new(config).extract(&input);
    let redacted = Redactor::new().redact(outcome.text.as_str(), &input.file_name);
    println!("{}", redacted.text);
    Ok(())
}

fn read_input(file: &Path, media_type: Option<String>) -> Result<ExtractionInput> {
    let bytes =
        std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    let input = ExtractionInput::new(name, bytes);
    Ok(match media_type {
        Some(media_type) => input.with_media_type(media_type),
        None => input,
    })
}

fn open_store(db: Option<PathBuf>, persist: bool) -> Result<Arc<dyn JobStore>> {
    let path = match db {
        Some(path) => Some(path),
        None if persist => Some(
            config::default_database_path().context("no home directory for the default database")?,
        ),
        None => None,
    };

    let Some(path) = path else {
        return Ok(Arc::new(MemoryJobStore::new()));
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let store = SqliteJobStore::open(&path)
        .with_context(|| format!("failed to open job database {}", path.display()))?;
    Ok(Arc::new(store))
}
