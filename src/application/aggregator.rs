use super::classifier::{assemble_recent, classify_batch, SIGNATURE_WINDOW};
use super::Aggregator;
use crate::domain::models::{
    BalanceReport, Network, PriceSnapshot, TransactionRecord, WalletDescriptor,
};
use crate::infrastructure::bc_client::BcClient;
use solana_sdk::native_token::lamports_to_sol;
use typed_builder::TypedBuilder;

/// Reads balances and activity for one network, falling back through an ordered
/// list of RPC endpoints.
#[derive(TypedBuilder)]
pub struct LedgerAggregator<C> {
    network: Network,
    endpoints: Vec<C>,
}

impl<C> LedgerAggregator<C>
where
    C: BcClient,
{
    pub fn network(&self) -> Network {
        self.network
    }

    /// Balance in SOL from the first endpoint that answers, zero when none does.
    pub async fn wallet_balance(&self, address: &str) -> f64 {
        for (index, client) in self.endpoints.iter().enumerate() {
            match client.get_balance(address).await {
                Ok(lamports) => return lamports_to_sol(lamports),
                Err(e) => {
                    tracing::warn!(
                        "Balance lookup for {} failed on {} endpoint {}: {}",
                        address,
                        self.network,
                        index,
                        e
                    );
                }
            }
        }
        0.0
    }

    /// Classified activity for one wallet, in signature order.
    ///
    /// Bodies are fetched from the same endpoint that returned the signatures.
    pub async fn wallet_transactions(&self, address: &str) -> Vec<TransactionRecord> {
        let Some((client, signatures)) = self.recent_signatures(address).await else {
            return Vec::new();
        };
        if signatures.is_empty() {
            return Vec::new();
        }

        match client.get_parsed_transactions(&signatures).await {
            Ok(bodies) => classify_batch(address, &signatures, &bodies),
            Err(e) => {
                tracing::warn!("Transaction bodies for {} unavailable: {}", address, e);
                Vec::new()
            }
        }
    }

    async fn recent_signatures(&self, address: &str) -> Option<(&C, Vec<String>)> {
        for (index, client) in self.endpoints.iter().enumerate() {
            match client
                .get_signatures_for_address(address, SIGNATURE_WINDOW)
                .await
            {
                Ok(statuses) => {
                    let signatures = statuses
                        .into_iter()
                        .filter(|status| !status.failed && !status.signature.is_empty())
                        .map(|status| status.signature)
                        .collect();
                    return Some((client, signatures));
                }
                Err(e) => {
                    tracing::warn!(
                        "Signature lookup for {} failed on {} endpoint {}: {}",
                        address,
                        self.network,
                        index,
                        e
                    );
                }
            }
        }
        None
    }
}

#[async_trait::async_trait]
impl<C> Aggregator for LedgerAggregator<C>
where
    C: BcClient,
{
    async fn balances(&self, wallets: &[WalletDescriptor], price: PriceSnapshot) -> BalanceReport {
        let mut report = BalanceReport::default();

        for wallet in wallets {
            if wallet.chain_type.is_ledger_native() {
                let balance = self.wallet_balance(&wallet.address).await;
                report.total_native += balance;
                report.balances.insert(wallet.address.clone(), balance);
            } else {
                report.balances.insert(wallet.address.clone(), 0.0);
            }
        }

        report.total_fiat = if self.network.is_priced() {
            report.total_native * price.usd()
        } else {
            0.0
        };
        report
    }

    async fn recent_transactions(&self, wallets: &[WalletDescriptor]) -> Vec<TransactionRecord> {
        let mut records = Vec::new();
        for wallet in wallets.iter().filter(|w| w.chain_type.is_ledger_native()) {
            records.extend(self.wallet_transactions(&wallet.address).await);
        }
        tracing::info!(
            "Collected {} transactions across {} wallets on {}",
            records.len(),
            wallets.len(),
            self.network
        );
        assemble_recent(records)
    }
}
