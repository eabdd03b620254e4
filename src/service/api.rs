use crate::{
    application::app::{Application, DashboardSummary},
    domain::{
        errors::ServerError,
        models::{BalanceReport, Network, TransactionRecord, WalletDescriptor},
    },
    infrastructure::shutdown::Shutdown,
    service::proxy::{self, ProxyState},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Dashboard routes plus both proxies, with permissive CORS on every route.
pub fn build_router<A>(app: Arc<A>, proxy_state: ProxyState) -> Router
where
    A: Application + 'static,
{
    Router::new()
        .merge(router(app))
        .merge(proxy::router(proxy_state))
        .layer(CorsLayer::permissive())
}

pub fn router<A>(app: Arc<A>) -> Router
where
    A: Application + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/wallets", get(list_wallets::<A>).post(add_wallet::<A>))
        .route("/wallets/:address", delete(remove_wallet::<A>))
        .route("/network", get(get_network::<A>).put(put_network::<A>))
        .route("/balances", get(get_balances::<A>))
        .route("/transactions", get(get_transactions::<A>))
        .route("/summary", get(get_summary::<A>))
        .route("/refresh", post(refresh::<A>))
        .with_state(app)
}

pub async fn start_server<S>(
    shutdown: S,
    router: Router,
    listen_port: u16,
) -> Result<(), ServerError>
where
    S: Shutdown,
{
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", listen_port)).await?;
    let server = axum::serve(listener, router);

    tracing::info!("API server started on port {}", listen_port);

    let mut shutdown_rx = shutdown.subscribe();

    tokio::select! {
        _ = shutdown_rx.recv() => {
            tracing::warn!("API server received shutdown signal");
        }
        result = server => {
            if let Err(e) = result {
                tracing::error!("API server stopped unexpectedly: {}", e);
            } else {
                tracing::warn!("API server stopped unexpectedly");
            }
        }
    }

    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_wallets<A: Application>(State(app): State<Arc<A>>) -> Json<Vec<WalletDescriptor>> {
    Json(app.wallets().await)
}

async fn add_wallet<A: Application + 'static>(
    State(app): State<Arc<A>>,
    Json(wallet): Json<WalletDescriptor>,
) -> Result<(StatusCode, Json<Vec<WalletDescriptor>>), StatusCode> {
    if wallet.address.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    if !app.add_wallet(wallet).await {
        return Ok((StatusCode::OK, Json(app.wallets().await)));
    }

    let background = app.clone();
    tokio::spawn(async move {
        background.refresh().await;
    });
    Ok((StatusCode::CREATED, Json(app.wallets().await)))
}

async fn remove_wallet<A: Application>(
    State(app): State<Arc<A>>,
    Path(address): Path<String>,
) -> StatusCode {
    match app.remove_wallet(&address).await {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

#[derive(Debug, Deserialize, Serialize)]
struct NetworkBody {
    network: Network,
}

async fn get_network<A: Application>(State(app): State<Arc<A>>) -> Json<NetworkBody> {
    Json(NetworkBody {
        network: app.network().await,
    })
}

async fn put_network<A: Application + 'static>(
    State(app): State<Arc<A>>,
    Json(body): Json<NetworkBody>,
) -> Json<NetworkBody> {
    if app.set_network(body.network).await {
        let background = app.clone();
        tokio::spawn(async move {
            background.refresh_price().await;
            background.refresh().await;
        });
    }
    Json(body)
}

async fn get_balances<A: Application>(State(app): State<Arc<A>>) -> Json<BalanceReport> {
    Json(app.balances().await)
}

#[derive(Debug, Deserialize)]
struct TransactionQuery {
    wallet: Option<String>,
    limit: Option<usize>,
}

async fn get_transactions<A: Application>(
    State(app): State<Arc<A>>,
    Query(params): Query<TransactionQuery>,
) -> Json<Vec<TransactionRecord>> {
    let transactions = app
        .transactions()
        .await
        .into_iter()
        .filter(|tx| {
            params
                .wallet
                .as_deref()
                .map_or(true, |wallet| tx.wallet_address == wallet)
        })
        .take(params.limit.unwrap_or(usize::MAX))
        .collect();
    Json(transactions)
}

async fn get_summary<A: Application>(State(app): State<Arc<A>>) -> Json<DashboardSummary> {
    Json(app.summary().await)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshOutcome {
    committed: bool,
    summary: DashboardSummary,
}

async fn refresh<A: Application>(State(app): State<Arc<A>>) -> Json<RefreshOutcome> {
    app.refresh_price().await;
    let committed = app.refresh().await;
    Json(RefreshOutcome {
        committed,
        summary: app.summary().await,
    })
}
