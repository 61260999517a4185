#![cfg(not(tarpaulin_include))]

use lotacao_dashboard::app;
use lotacao_dashboard::config::DashboardConfig;

/// Main entry point for the dashboard server
///
/// Initializes logging (filter from `RUST_LOG`, `info` by default) and serves
/// the dashboard with the built-in configuration.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    app::run(DashboardConfig::default()).await
}
