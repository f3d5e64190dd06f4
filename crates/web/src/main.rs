//! Site data web server
//!
//! Serves the site pages for every site in the site table, picking the site
//! from each request's host.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use sitedata_core::table::DEFAULT_ROOT_URLCONF;
use sitedata_web::{routes::pages, AppState, Config, UrlConfs};

/// Name of the reduced page set sites can select with `urlconf = "compact"`
const COMPACT_URLCONF: &str = "compact";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    let bind_address = config.bind_address.clone();

    let urlconfs = UrlConfs::new(pages::urlconf(DEFAULT_ROOT_URLCONF))
        .with(pages::compact_urlconf(COMPACT_URLCONF));

    // Create application state
    let state = AppState::from_config(config, urlconfs.route_table())?;
    tracing::info!(
        sites = state.resolver.table().len(),
        default_site = %state.resolver.table().default_label(),
        "Site table ready"
    );

    let app = sitedata_web::create_router(state, urlconfs);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!(addr = %bind_address, "Starting server");

    axum::serve(listener, app).await?;

    Ok(())
}
