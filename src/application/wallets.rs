use super::app::Application;
use crate::domain::{
    errors::WalletError,
    models::{ChainType, WalletDescriptor},
};
use crate::infrastructure::wallet_provider::{
    EthereumExtensionAdapter, ProviderRegistry, SolanaExtensionAdapter, WalletProvider,
};
use std::sync::Arc;

/// A wallet extension found in the registry, ready to connect.
#[derive(Clone)]
pub struct AvailableWallet {
    pub name: String,
    pub chain_type: ChainType,
    pub provider: Arc<dyn WalletProvider>,
}

impl AvailableWallet {
    fn new(provider: Arc<dyn WalletProvider>) -> Self {
        Self {
            name: provider.name().to_string(),
            chain_type: provider.chain_type(),
            provider,
        }
    }
}

/// Detects installed wallet extensions and connects them to the dashboard.
pub struct WalletConnector {
    registry: ProviderRegistry,
}

impl WalletConnector {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self { registry }
    }

    /// Probes the registered globals in a fixed order: Phantom, Solflare, Backpack, MetaMask.
    pub fn detect_available(&self) -> Vec<AvailableWallet> {
        let mut wallets = Vec::new();

        if let Some(solana) = self.registry.get("solana").filter(|p| p.flag("isPhantom")) {
            wallets.push(AvailableWallet::new(Arc::new(SolanaExtensionAdapter::new(
                "Phantom", solana,
            ))));
        }

        if let Some(solflare) = self.registry.get("solflare") {
            wallets.push(AvailableWallet::new(Arc::new(
                SolanaExtensionAdapter::new("Solflare", solflare).with_public_key_fallback(),
            )));
        }

        if let Some(backpack) = self.registry.get("backpack") {
            let solana = backpack.nested("solana");
            if backpack.flag("isBackpack") || backpack.flag("solana") || solana.is_some() {
                // Backpack exposes its Solana provider under `backpack.solana` when present.
                let handle = solana.unwrap_or(backpack);
                wallets.push(AvailableWallet::new(Arc::new(SolanaExtensionAdapter::new(
                    "Backpack", handle,
                ))));
            }
        }

        if let Some(ethereum) = self
            .registry
            .get("ethereum")
            .filter(|p| p.flag("isMetaMask"))
        {
            wallets.push(AvailableWallet::new(Arc::new(
                EthereumExtensionAdapter::new("MetaMask", ethereum),
            )));
        }

        tracing::debug!("Detected {} wallet extensions", wallets.len());
        wallets
    }

    /// Runs the provider handshake and adds the resulting wallet to the session.
    ///
    /// Returns `None` when the address was already connected.
    pub async fn connect<A>(
        &self,
        app: &A,
        wallet: &AvailableWallet,
    ) -> Result<Option<WalletDescriptor>, WalletError>
    where
        A: Application,
    {
        let address = wallet.provider.connect().await.map_err(|e| {
            tracing::warn!("{} connection failed: {}", wallet.name, e);
            e
        })?;

        let descriptor = WalletDescriptor::new(wallet.name.clone(), wallet.chain_type, address);
        if app.add_wallet(descriptor.clone()).await {
            Ok(Some(descriptor))
        } else {
            Ok(None)
        }
    }

    /// Connects the detected extension called `name`, e.g. `"Phantom"`.
    pub async fn connect_named<A>(
        &self,
        app: &A,
        name: &str,
    ) -> Result<Option<WalletDescriptor>, WalletError>
    where
        A: Application,
    {
        let wallet = self
            .detect_available()
            .into_iter()
            .find(|wallet| wallet.name == name)
            .ok_or_else(|| WalletError::ProviderUnavailable(name.to_string()))?;
        self.connect(app, &wallet).await
    }

    pub async fn disconnect<A>(&self, app: &A, address: &str) -> Option<WalletDescriptor>
    where
        A: Application,
    {
        app.remove_wallet(address).await
    }
}
