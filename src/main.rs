use clap::Parser;
use miette::{IntoDiagnostic, Result};
use orderpay::config::{SettlementConfig, StockPolicy};
use orderpay::domain::money::Money;
use orderpay::infrastructure::in_memory::InMemoryStore;
use orderpay::interfaces::csv::command_reader::CommandReader;
use orderpay::interfaces::csv::dispatcher::CommandDispatcher;
use orderpay::interfaces::csv::outcome_writer::OutcomeWriter;
use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input commands CSV file
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Abort settlements that would take product stock below zero
    #[arg(long)]
    reject_stock_shortfall: bool,

    /// Balance granted to newly opened accounts
    #[arg(long, default_value = "10000")]
    initial_grant: Money,
}

impl Cli {
    fn settlement_config(&self) -> SettlementConfig {
        let stock_policy = if self.reject_stock_shortfall {
            StockPolicy::RejectShortfall
        } else {
            StockPolicy::AllowNegative
        };
        SettlementConfig::default()
            .with_stock_policy(stock_policy)
            .with_initial_grant(self.initial_grant)
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .init();
}

#[cfg(feature = "storage-rocksdb")]
fn dispatcher(cli: &Cli, config: SettlementConfig) -> Result<CommandDispatcher> {
    use orderpay::infrastructure::rocksdb::RocksDBStore;

    match &cli.db_path {
        Some(db_path) => {
            let store = RocksDBStore::open(db_path).into_diagnostic()?;
            Ok(CommandDispatcher::new(store, config))
        }
        None => Ok(CommandDispatcher::new(InMemoryStore::new(), config)),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn dispatcher(cli: &Cli, config: SettlementConfig) -> Result<CommandDispatcher> {
    if cli.db_path.is_some() {
        tracing::warn!(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(CommandDispatcher::new(InMemoryStore::new(), config))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let dispatcher = dispatcher(&cli, cli.settlement_config())?;

    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);

    let stdout = io::stdout();
    let mut writer = OutcomeWriter::new(stdout.lock());
    for command in reader.commands() {
        match command {
            Ok(command) => {
                let outcome = dispatcher.dispatch(command).await;
                writer.write(&outcome).into_diagnostic()?;
            }
            Err(e) => {
                error!("Error reading command: {e}");
            }
        }
    }
    writer.flush().into_diagnostic()?;

    Ok(())
}
