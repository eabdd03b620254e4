use crate::domain::models::{BalanceReport, PriceSnapshot, TransactionRecord, WalletDescriptor};

pub mod aggregator;
pub mod app;
pub mod classifier;
pub mod poller;
pub mod session;
pub mod wallets;

/// The `Aggregator` trait defines the per-network reads behind the dashboard.
///
/// Implementors query balances and recent activity for a set of connected wallets.
/// Both operations degrade instead of failing: an unreachable network yields zero
/// balances and an empty transaction list.
///
/// # Examples
///
/// ```no_run
/// use sol_wallet_dashboard::application::Aggregator;
/// use sol_wallet_dashboard::domain::models::{
///     BalanceReport, PriceSnapshot, TransactionRecord, WalletDescriptor,
/// };
///
/// struct Offline;
///
/// #[async_trait::async_trait]
/// impl Aggregator for Offline {
///     async fn balances(&self, _: &[WalletDescriptor], _: PriceSnapshot) -> BalanceReport {
///         BalanceReport::default()
///     }
///
///     async fn recent_transactions(&self, _: &[WalletDescriptor]) -> Vec<TransactionRecord> {
///         Vec::new()
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait Aggregator {
    async fn balances(&self, wallets: &[WalletDescriptor], price: PriceSnapshot) -> BalanceReport;

    async fn recent_transactions(&self, wallets: &[WalletDescriptor]) -> Vec<TransactionRecord>;
}

/// A long running background task that stops on shutdown.
#[async_trait::async_trait]
pub trait Poller {
    async fn run(self);
}
