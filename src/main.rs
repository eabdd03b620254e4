use anyhow::Result;
use clap::Parser;
use sol_wallet_dashboard::application::{
    aggregator::LedgerAggregator, app::App, poller::DashboardPoller, session::Session, Poller,
};
use sol_wallet_dashboard::config::Config;
use sol_wallet_dashboard::domain::models::Network;
use sol_wallet_dashboard::infrastructure::{
    document_mirror::DocumentMirror, document_store::InMemoryDocumentStore,
    price_feed::CoinGeckoPriceSource, shutdown::ShutdownChannel, solana_client::SolanaClient,
};
use sol_wallet_dashboard::service::{self, proxy::ProxyState};
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::parse();
    let shutdown = ShutdownChannel::default();
    let http_client = config.http_client()?;

    let aggregators = [Network::MainnetBeta, Network::Devnet]
        .into_iter()
        .map(|network| {
            let endpoints: Vec<SolanaClient> = config
                .endpoints(network)
                .iter()
                .map(|url| SolanaClient::new(url, http_client.clone(), config.http_timeout()))
                .collect();
            for (index, client) in endpoints.iter().enumerate() {
                tracing::info!("{} endpoint {}: {}", network, index, client.url());
            }
            LedgerAggregator::builder()
                .network(network)
                .endpoints(endpoints)
                .build()
        })
        .collect();

    let store = Arc::new(InMemoryDocumentStore::default());
    let mirror = DocumentMirror::new(store, shutdown.clone());
    let app = App::new(
        Session::new(config.user.clone(), config.network),
        aggregators,
        CoinGeckoPriceSource::new(&config.price_api_url, http_client.clone()),
        Some(mirror),
    );
    app.initialize_user_document().await;

    // Start the poller
    let poller = DashboardPoller::builder()
        .app(app.clone())
        .shutdown(shutdown.clone())
        .interval(config.poll_interval())
        .build();
    let poller_handle = tokio::spawn(poller.run());

    // Start the API server
    let router = service::api::build_router(
        Arc::new(app),
        ProxyState::new(config.proxy_config(), http_client),
    );
    let server_handle = tokio::spawn(service::api::start_server(
        shutdown.clone(),
        router,
        config.listen_port,
    ));

    signal::ctrl_c().await?;
    tracing::warn!("Received Ctrl+C, shutting down...");
    shutdown.trigger();

    let (poller_result, server_result) = tokio::join!(poller_handle, server_handle);
    if let Err(e) = poller_result {
        tracing::error!("Poller task failed: {:?}", e);
    }
    server_result??;

    tracing::info!("Shutdown complete");
    Ok(())
}
