use crate::domain::models::{
    BalanceReport, Network, PriceSnapshot, TransactionRecord, WalletDescriptor,
};
use chrono::{DateTime, Utc};

/// What a refresh pass needs to know about the session when it starts.
#[derive(Clone, Debug)]
pub struct PassTicket {
    pub generation: u64,
    pub pass: u64,
    pub network: Network,
    pub wallets: Vec<WalletDescriptor>,
    pub price: PriceSnapshot,
}

/// In-memory state of one dashboard session.
///
/// Every change to the wallet set or network bumps `generation`, which voids the
/// results of passes started before it. Passes may overlap; each one gets a
/// sequence number and a commit is refused only when a later pass already
/// committed the same kind of result.
#[derive(Debug, Default)]
pub struct Session {
    user: Option<String>,
    network: Network,
    wallets: Vec<WalletDescriptor>,
    balances: BalanceReport,
    transactions: Vec<TransactionRecord>,
    price: PriceSnapshot,
    last_refreshed: Option<DateTime<Utc>>,
    generation: u64,
    passes_started: u64,
    balances_pass: u64,
    transactions_pass: u64,
}

impl Session {
    pub fn new(user: Option<String>, network: Network) -> Self {
        Self {
            user,
            network,
            ..Self::default()
        }
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn wallets(&self) -> &[WalletDescriptor] {
        &self.wallets
    }

    pub fn balances(&self) -> &BalanceReport {
        &self.balances
    }

    pub fn transactions(&self) -> &[TransactionRecord] {
        &self.transactions
    }

    pub fn price(&self) -> PriceSnapshot {
        self.price
    }

    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.last_refreshed
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Adds a wallet unless one with the same address is already connected.
    pub fn add_wallet(&mut self, wallet: WalletDescriptor) -> bool {
        if self.wallets.iter().any(|w| w.address == wallet.address) {
            return false;
        }
        self.wallets.push(wallet);
        self.generation += 1;
        true
    }

    pub fn remove_wallet(&mut self, address: &str) -> Option<WalletDescriptor> {
        let index = self.wallets.iter().position(|w| w.address == address)?;
        self.generation += 1;
        let removed = self.wallets.remove(index);
        self.balances.balances.remove(address);
        self.transactions.retain(|tx| tx.wallet_address != address);
        Some(removed)
    }

    /// Switches network and drops everything computed for the previous one.
    pub fn set_network(&mut self, network: Network) -> bool {
        if self.network == network {
            return false;
        }
        self.network = network;
        self.balances = BalanceReport::default();
        self.transactions.clear();
        self.price = PriceSnapshot::default();
        self.generation += 1;
        true
    }

    pub fn set_price(&mut self, price: PriceSnapshot) {
        self.price = price;
    }

    pub fn begin_pass(&mut self) -> PassTicket {
        self.passes_started += 1;
        PassTicket {
            generation: self.generation,
            pass: self.passes_started,
            network: self.network,
            wallets: self.wallets.clone(),
            price: self.price,
        }
    }

    fn is_current(&self, ticket: &PassTicket, last_committed: u64, what: &str) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(
                "Discarding {} from generation {} (current {})",
                what,
                ticket.generation,
                self.generation
            );
            return false;
        }
        if ticket.pass < last_committed {
            tracing::debug!(
                "Discarding {} from pass {}, pass {} already committed",
                what,
                ticket.pass,
                last_committed
            );
            return false;
        }
        true
    }

    pub fn commit_balances(&mut self, ticket: &PassTicket, report: BalanceReport) -> bool {
        if !self.is_current(ticket, self.balances_pass, "balances") {
            return false;
        }
        self.balances = report;
        self.balances_pass = ticket.pass;
        true
    }

    pub fn commit_transactions(
        &mut self,
        ticket: &PassTicket,
        records: Vec<TransactionRecord>,
    ) -> bool {
        if !self.is_current(ticket, self.transactions_pass, "transactions") {
            return false;
        }
        self.transactions = records;
        self.transactions_pass = ticket.pass;
        self.last_refreshed = Some(Utc::now());
        true
    }
}
