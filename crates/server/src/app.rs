use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tracing::instrument;

use crate::{
    AppState,
    auth::USER_AGENT,
    config::ServerConfig,
    db::{self, notes::NoteRepository, users::UserRepository},
    routes,
};

pub struct Server;

impl Server {
    #[instrument(
        name = "notes_server",
        skip(config),
        fields(listen_addr = %config.listen_addr, environment = config.environment.as_str())
    )]
    pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
        let pool = db::create_pool(&config.database_url, config.pool_size)
            .await
            .context("failed to create postgres pool")?;

        db::migrate(&pool)
            .await
            .context("failed to run database migrations")?;

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("failed to create HTTP client")?;

        let users = Arc::new(UserRepository::new(pool.clone()));
        let notes = Arc::new(NoteRepository::new(pool.clone()));

        let state = AppState::new(config.clone(), http_client, users, notes);

        let router = routes::router(state);
        let addr: SocketAddr = config
            .listen_addr
            .parse()
            .context("listen address is invalid")?;
        let tcp_listener = tokio::net::TcpListener::bind(addr)
            .await
            .context("failed to bind tcp listener")?;

        tracing::info!(
            %addr,
            realm = config.auth().realm(),
            "notes server listening"
        );

        axum::serve(tcp_listener, router.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("notes server failure")?;

        pool.close().await;
        tracing::info!("notes server stopped");

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(?error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
