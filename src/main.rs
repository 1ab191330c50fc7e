use clap::Parser;
use fundflow::application::engine::PledgeEngine;
use fundflow::domain::ports::{SharedGateway, SharedStore, Store};
use fundflow::infrastructure::gateway::SimulatedGateway;
use fundflow::infrastructure::in_memory::InMemoryStore;
use fundflow::interfaces::csv::campaign_writer::CampaignWriter;
use fundflow::interfaces::csv::pledge_reader::PledgeReader;
use fundflow::interfaces::seed::load_seed;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Seed file describing users, campaigns and reward tiers
    seed: PathBuf,

    /// Pledge rows to replay (campaign, user, amount, tier)
    pledges: PathBuf,

    /// Gateway approval rate between 0 and 1
    #[arg(long, default_value_t = 1.0)]
    success_rate: f64,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[cfg(feature = "storage-rocksdb")]
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let store = build_store(&cli)?;
    let gateway: SharedGateway = Arc::new(SimulatedGateway::new(cli.success_rate));
    let engine = PledgeEngine::new(Arc::clone(&store), gateway);

    let seed_file = File::open(&cli.seed).into_diagnostic()?;
    let index = load_seed(store.as_ref(), seed_file).await.into_diagnostic()?;

    let pledges_file = File::open(&cli.pledges).into_diagnostic()?;
    for row in PledgeReader::new(pledges_file).rows() {
        let row = match row {
            Ok(row) => row,
            Err(error) => {
                eprintln!("Error reading pledge row: {error}");
                continue;
            }
        };
        let request = match index.resolve(&row) {
            Ok(request) => request,
            Err(error) => {
                eprintln!("Skipping pledge row: {error}");
                continue;
            }
        };
        match engine.create_pledge(request).await {
            Ok(receipt) => eprintln!("{}: {}", row.campaign, receipt.message),
            Err(error) => eprintln!("{}: {error}", row.campaign),
        }
    }

    let campaigns = store.list_campaigns().await.into_diagnostic()?;
    let mut summaries = Vec::with_capacity(campaigns.len());
    for campaign in campaigns {
        let pledge_count = store
            .list_pledges(campaign.id)
            .await
            .into_diagnostic()?
            .len();
        summaries.push((campaign, pledge_count));
    }

    let stdout = io::stdout();
    let mut writer = CampaignWriter::new(stdout.lock());
    writer.write_summaries(&summaries).into_diagnostic()?;

    Ok(())
}

#[cfg(feature = "storage-rocksdb")]
fn build_store(cli: &Cli) -> Result<SharedStore> {
    use fundflow::infrastructure::rocksdb::RocksDbStore;

    if let Some(db_path) = &cli.db_path {
        let store = RocksDbStore::open(db_path).into_diagnostic()?;
        return Ok(Arc::new(store));
    }
    Ok(Arc::new(InMemoryStore::new()))
}

#[cfg(not(feature = "storage-rocksdb"))]
fn build_store(_cli: &Cli) -> Result<SharedStore> {
    Ok(Arc::new(InMemoryStore::new()))
}
