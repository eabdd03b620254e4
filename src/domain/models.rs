use super::errors::{DocumentStoreError, NetworkParseError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Solana cluster the dashboard is pointed at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    #[default]
    #[serde(rename = "mainnet-beta")]
    MainnetBeta,
    #[serde(rename = "devnet")]
    Devnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::MainnetBeta => "mainnet-beta",
            Network::Devnet => "devnet",
        }
    }

    /// Fiat valuation only makes sense on the primary network.
    pub fn is_priced(&self) -> bool {
        matches!(self, Network::MainnetBeta)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = NetworkParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet-beta" => Ok(Network::MainnetBeta),
            "devnet" => Ok(Network::Devnet),
            other => Err(NetworkParseError(other.to_string())),
        }
    }
}

/// Chain a connected wallet lives on. Only Solana balances and activity are tracked,
/// Ethereum wallets are kept for identity only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainType {
    Solana,
    Ethereum,
}

impl ChainType {
    pub fn is_ledger_native(&self) -> bool {
        matches!(self, ChainType::Solana)
    }
}

/// A wallet connected to the current session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletDescriptor {
    /// Display name of the wallet extension, e.g. `Phantom`
    pub name: String,
    pub chain_type: ChainType,
    /// Chain specific address, unique within the session
    pub address: String,
    #[serde(default = "connected_default")]
    pub connected: bool,
}

fn connected_default() -> bool {
    true
}

impl WalletDescriptor {
    pub fn new(name: impl Into<String>, chain_type: ChainType, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chain_type,
            address: address.into(),
            connected: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
    #[default]
    Unknown,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionType {
    NativeTransfer,
    TokenOperation,
    ProgramInteraction,
    #[default]
    ProgramCall,
    DataGap,
}

/// A transaction as seen from one connected wallet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Base58 transaction signature
    pub signature: String,
    pub slot: Option<u64>,
    /// Unix timestamp, absent for entries the RPC could not date
    pub block_time: Option<i64>,
    /// Magnitude of the wallet's balance change in SOL
    pub amount: f64,
    pub direction: Direction,
    pub success: bool,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub wallet_address: String,
}

impl TransactionRecord {
    /// Record for a signature whose body or metadata the RPC could not return.
    pub fn data_gap(signature: &str, wallet_address: &str) -> Self {
        Self {
            signature: signature.to_string(),
            slot: None,
            block_time: None,
            amount: 0.0,
            direction: Direction::Unknown,
            success: false,
            kind: TransactionType::DataGap,
            wallet_address: wallet_address.to_string(),
        }
    }
}

/// Wallet address -> balance in SOL.
pub type BalanceSnapshot = BTreeMap<String, f64>;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceReport {
    pub balances: BalanceSnapshot,
    pub total_native: f64,
    pub total_fiat: f64,
}

/// USD per SOL.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceSnapshot(pub f64);

impl PriceSnapshot {
    pub fn new(usd: f64) -> Self {
        if usd.is_finite() && usd > 0.0 {
            Self(usd)
        } else {
            Self(0.0)
        }
    }

    pub fn usd(&self) -> f64 {
        self.0
    }
}

/// A signature entry as returned by `getSignaturesForAddress`.
#[derive(Clone, Debug, PartialEq)]
pub struct SignatureStatus {
    pub signature: String,
    pub slot: u64,
    pub failed: bool,
    pub block_time: Option<i64>,
}

/// Remote per-user document holding the wallets a user has connected.
#[async_trait::async_trait]
pub trait WalletDocumentStore {
    /// Creates an empty document for the user if none exists yet.
    async fn initialize_user(&self, user: &str) -> Result<(), DocumentStoreError>;

    /// Merges wallets into the user's document, keyed by address.
    async fn sync_wallets(
        &self,
        user: &str,
        wallets: Vec<WalletDescriptor>,
    ) -> Result<(), DocumentStoreError>;

    /// Removes one wallet from the user's document.
    async fn remove_wallet(&self, user: &str, address: &str) -> Result<(), DocumentStoreError>;

    async fn get_wallets(&self, user: &str) -> Result<Vec<WalletDescriptor>, DocumentStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_parsing() {
        assert_eq!("devnet".parse::<Network>().unwrap(), Network::Devnet);
        assert_eq!(
            "mainnet-beta".parse::<Network>().unwrap(),
            Network::MainnetBeta
        );
        assert!("testnet".parse::<Network>().is_err());
    }

    #[test]
    fn test_price_snapshot_is_never_negative() {
        assert_eq!(PriceSnapshot::new(-3.0).usd(), 0.0);
        assert_eq!(PriceSnapshot::new(f64::NAN).usd(), 0.0);
        assert_eq!(PriceSnapshot::new(142.5).usd(), 142.5);
    }

    #[test]
    fn test_transaction_record_serialization() {
        let record = TransactionRecord::data_gap("sig", "wallet");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "data-gap");
        assert_eq!(value["direction"], "unknown");
        assert_eq!(value["walletAddress"], "wallet");
        assert!(value["blockTime"].is_null());
    }

    #[test]
    fn test_wallet_descriptor_defaults_to_connected() {
        let wallet: WalletDescriptor = serde_json::from_str(
            r#"{"name":"MetaMask","chainType":"ethereum","address":"0xabc"}"#,
        )
        .unwrap();
        assert!(wallet.connected);
        assert_eq!(wallet.chain_type, ChainType::Ethereum);
    }
}
