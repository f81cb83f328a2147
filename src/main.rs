use clap::Parser;
use miette::{IntoDiagnostic, Result};
use paydecide::application::pipeline::DecisionPipeline;
use paydecide::config::DecisionConfig;
use paydecide::domain::ports::{BalanceStoreBox, CaseStoreBox, IdempotencyStoreBox};
use paydecide::infrastructure::in_memory::{
    InMemoryBalanceStore, InMemoryCaseStore, InMemoryIdempotencyStore,
};
use paydecide::interfaces::csv::request_reader::RequestReader;
use paydecide::interfaces::jsonl::decision_writer::DecisionWriter;
use paydecide::telemetry;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input payment requests CSV file
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// JSON file overriding the default decision settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn in_memory_stores() -> (BalanceStoreBox, IdempotencyStoreBox, CaseStoreBox) {
    (
        Box::new(InMemoryBalanceStore::new()),
        Box::new(InMemoryIdempotencyStore::new()),
        Box::new(InMemoryCaseStore::new()),
    )
}

#[cfg(feature = "storage-rocksdb")]
fn open_stores(
    db_path: Option<PathBuf>,
) -> Result<(BalanceStoreBox, IdempotencyStoreBox, CaseStoreBox)> {
    use paydecide::infrastructure::rocksdb::RocksDBStore;

    match db_path {
        Some(path) => {
            let store = RocksDBStore::open(path).into_diagnostic()?;
            Ok((
                Box::new(store.clone()),
                Box::new(store.clone()),
                Box::new(store),
            ))
        }
        None => Ok(in_memory_stores()),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_stores(
    db_path: Option<PathBuf>,
) -> Result<(BalanceStoreBox, IdempotencyStoreBox, CaseStoreBox)> {
    if db_path.is_some() {
        eprintln!(
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(in_memory_stores())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.verbose);

    let config = DecisionConfig::load(cli.config.as_deref()).into_diagnostic()?;
    let (balances, idempotency, cases) = open_stores(cli.db_path)?;
    let pipeline = DecisionPipeline::new(&config, balances, idempotency, cases);

    let file = File::open(cli.input).into_diagnostic()?;
    let reader = RequestReader::new(file);
    let stdout = io::stdout();
    let mut writer = DecisionWriter::new(stdout.lock());

    for request in reader.requests() {
        match request {
            Ok(request) => match pipeline.decide(&request).await {
                Ok(response) => writer.write(&response).into_diagnostic()?,
                Err(e) => eprintln!("Error processing request: {}", e),
            },
            Err(e) => eprintln!("Error reading request: {}", e),
        }
    }
    writer.flush().into_diagnostic()?;

    let metrics = pipeline.metrics();
    info!(
        total = metrics.total_requests,
        allow = metrics.decision_allow,
        review = metrics.decision_review,
        block = metrics.decision_block,
        p95_latency_ms = metrics.p95_latency_ms,
        "run complete"
    );

    Ok(())
}
