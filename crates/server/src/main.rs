use server::{Server, config::ServerConfig, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS operations
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    dotenv::dotenv().ok();

    let config = ServerConfig::from_env()?;
    if let Some(dsn) = config.sentry_dsn.as_deref() {
        utils::sentry::init_once(dsn, config.environment.as_str());
    }
    init_tracing();

    Server::run(config).await
}
