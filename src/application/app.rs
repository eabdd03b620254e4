use std::collections::HashMap;
use std::sync::Arc;

use super::aggregator::LedgerAggregator;
use super::session::Session;
use super::Aggregator;
use crate::domain::models::{
    BalanceReport, Network, PriceSnapshot, TransactionRecord, WalletDescriptor,
};
use crate::infrastructure::bc_client::BcClient;
use crate::infrastructure::document_mirror::DocumentMirror;
use crate::infrastructure::price_feed::PriceSource;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub user: Option<String>,
    pub network: Network,
    pub wallet_count: usize,
    pub total_native: f64,
    pub total_fiat: f64,
    pub price: PriceSnapshot,
    pub transaction_count: usize,
    pub last_refreshed: Option<DateTime<Utc>>,
    pub generation: u64,
}

#[async_trait::async_trait]
pub trait Application: Send + Sync {
    /// Connects a wallet. Returns `false` when the address is already connected.
    async fn add_wallet(&self, wallet: WalletDescriptor) -> bool;
    async fn remove_wallet(&self, address: &str) -> Option<WalletDescriptor>;
    async fn wallets(&self) -> Vec<WalletDescriptor>;
    async fn network(&self) -> Network;
    async fn set_network(&self, network: Network) -> bool;
    /// Runs one balance and transaction pass. Returns whether its results were kept.
    async fn refresh(&self) -> bool;
    async fn refresh_price(&self) -> PriceSnapshot;
    async fn balances(&self) -> BalanceReport;
    async fn transactions(&self) -> Vec<TransactionRecord>;
    async fn summary(&self) -> DashboardSummary;
}

pub struct App<C, P> {
    session: Arc<RwLock<Session>>,
    aggregators: Arc<HashMap<Network, LedgerAggregator<C>>>,
    price_source: Arc<P>,
    mirror: Option<DocumentMirror>,
}

impl<C, P> Clone for App<C, P> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            aggregators: self.aggregators.clone(),
            price_source: self.price_source.clone(),
            mirror: self.mirror.clone(),
        }
    }
}

impl<C, P> App<C, P>
where
    C: BcClient,
    P: PriceSource,
{
    pub fn new(
        session: Session,
        aggregators: Vec<LedgerAggregator<C>>,
        price_source: P,
        mirror: Option<DocumentMirror>,
    ) -> Self {
        let aggregators = aggregators
            .into_iter()
            .map(|aggregator| (aggregator.network(), aggregator))
            .collect();
        Self {
            session: Arc::new(RwLock::new(session)),
            aggregators: Arc::new(aggregators),
            price_source: Arc::new(price_source),
            mirror,
        }
    }

    /// Makes sure the signed in user has a wallet document.
    pub async fn initialize_user_document(&self) {
        let user = self.session.read().await.user().map(str::to_string);
        if let (Some(mirror), Some(user)) = (&self.mirror, user) {
            tracing::info!("Initializing wallet document for {}", user);
            mirror.initialize(&user).await;
        }
    }
}

#[async_trait::async_trait]
impl<C, P> Application for App<C, P>
where
    C: BcClient + 'static,
    P: PriceSource + 'static,
{
    async fn add_wallet(&self, wallet: WalletDescriptor) -> bool {
        let (added, user) = {
            let mut session = self.session.write().await;
            let added = session.add_wallet(wallet.clone());
            (added, session.user().map(str::to_string))
        };
        if !added {
            tracing::info!("Wallet {} already connected", wallet.address);
            return false;
        }

        tracing::info!("Connected {} wallet {}", wallet.name, wallet.address);
        if let (Some(mirror), Some(user)) = (&self.mirror, user) {
            mirror.sync(&user, vec![wallet]).await;
        }
        true
    }

    async fn remove_wallet(&self, address: &str) -> Option<WalletDescriptor> {
        let (removed, user) = {
            let mut session = self.session.write().await;
            let removed = session.remove_wallet(address);
            (removed, session.user().map(str::to_string))
        };
        let removed = removed?;

        tracing::info!("Disconnected wallet {}", address);
        if let (Some(mirror), Some(user)) = (&self.mirror, user) {
            mirror.remove(&user, address).await;
        }
        Some(removed)
    }

    async fn wallets(&self) -> Vec<WalletDescriptor> {
        self.session.read().await.wallets().to_vec()
    }

    async fn network(&self) -> Network {
        self.session.read().await.network()
    }

    async fn set_network(&self, network: Network) -> bool {
        let changed = self.session.write().await.set_network(network);
        if changed {
            tracing::info!("Switched to {}", network);
        }
        changed
    }

    async fn refresh(&self) -> bool {
        let ticket = self.session.write().await.begin_pass();
        let Some(aggregator) = self.aggregators.get(&ticket.network) else {
            tracing::warn!("No RPC endpoints configured for {}", ticket.network);
            return false;
        };

        let report = aggregator.balances(&ticket.wallets, ticket.price).await;
        if !self
            .session
            .write()
            .await
            .commit_balances(&ticket, report)
        {
            return false;
        }

        let records = aggregator.recent_transactions(&ticket.wallets).await;
        self.session
            .write()
            .await
            .commit_transactions(&ticket, records)
    }

    async fn refresh_price(&self) -> PriceSnapshot {
        let network = self.session.read().await.network();
        let price = if network.is_priced() {
            match self.price_source.spot_price().await {
                Ok(usd) => PriceSnapshot::new(usd),
                Err(e) => {
                    tracing::warn!("SOL price unavailable: {}", e);
                    PriceSnapshot::default()
                }
            }
        } else {
            PriceSnapshot::default()
        };

        let mut session = self.session.write().await;
        if session.network() == network {
            session.set_price(price);
        }
        price
    }

    async fn balances(&self) -> BalanceReport {
        self.session.read().await.balances().clone()
    }

    async fn transactions(&self) -> Vec<TransactionRecord> {
        self.session.read().await.transactions().to_vec()
    }

    async fn summary(&self) -> DashboardSummary {
        let session = self.session.read().await;
        DashboardSummary {
            user: session.user().map(str::to_string),
            network: session.network(),
            wallet_count: session.wallets().len(),
            total_native: session.balances().total_native,
            total_fiat: session.balances().total_fiat,
            price: session.price(),
            transaction_count: session.transactions().len(),
            last_refreshed: session.last_refreshed(),
            generation: session.generation(),
        }
    }
}
