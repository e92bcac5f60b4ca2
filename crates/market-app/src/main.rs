use std::time::Duration;

use market_hex::application::expiry::spawn_expiry_sweep;
use market_hex::application::Services;
use market_hex::config::Config;
use market_hex::inbound::http::{HttpServer, HttpServerConfig};
use market_repo::{build_repo, Repo};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for DATABASE_URL / JWT_SECRET / ADMIN_EMAILS when present.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let config = Config::from_env()?;
    let repo: Repo = build_repo(config.database_url.as_deref()).await?;
    tracing::info!(
        backend = repo.backend(),
        port = %config.server_port,
        admins = config.admin_emails.len(),
        "configuration loaded"
    );

    let services = Services::new(repo, &config);
    let sweep = spawn_expiry_sweep(
        services.orders.clone(),
        Duration::from_secs(config.sweep_interval_secs),
    );

    let http = HttpServer::new(services, HttpServerConfig::from(&config));
    let result = http.run().await;
    sweep.abort();
    result
}
