//! Site directory sync
//!
//! Updates the site directory with the current primary hostnames from the
//! site table. Used when copying a database between environments, or to
//! populate a new database. Safe to run repeatedly; only the first run
//! should make changes.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use sitedata_sync::{db, load_sites};

#[derive(Parser, Debug)]
#[command(name = "sitedata-sync")]
#[command(about = "Synchronize the site directory with the site table", long_about = None)]
struct Args {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Site table file
    #[arg(long, env = "SITEDATA_FILE", default_value = "sitedata.toml")]
    sitedata_file: PathBuf,

    /// Root resource id attached to newly created directory entries
    #[arg(long, env = "SITEDATA_ROOT_RESOURCE")]
    root_resource: Option<i64>,

    /// Print what would change without writing anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (before parsing so env fallbacks see it)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let sites = load_sites(&args.sitedata_file)?;

    let pool = db::create_pool(&args.database_url).await?;
    db::run_migrations(&pool).await?;

    let outcomes = db::run_sync(&pool, &sites, args.root_resource, args.dry_run).await?;

    for outcome in &outcomes {
        println!("{}", outcome);
    }

    let changed = outcomes.iter().filter(|outcome| outcome.is_change()).count();
    if args.dry_run {
        println!("Dry run: {} of {} sites would change.", changed, outcomes.len());
    } else {
        println!("{} of {} sites changed.", changed, outcomes.len());
    }

    Ok(())
}
