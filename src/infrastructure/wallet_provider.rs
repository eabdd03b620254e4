use crate::domain::{errors::WalletError, models::ChainType};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// An object injected by a wallet extension, e.g. `window.solana`.
#[async_trait::async_trait]
pub trait InjectedProvider: Send + Sync {
    /// Reads a property such as `isPhantom` or `publicKey`.
    fn property(&self, name: &str) -> Option<Value>;

    /// Invokes a provider method and returns its result.
    async fn call(&self, method: &str, params: Value) -> Result<Value, WalletError>;

    /// A provider object hanging off this one, e.g. `window.backpack.solana`.
    fn nested(&self, _name: &str) -> Option<Arc<dyn InjectedProvider>> {
        None
    }

    fn flag(&self, name: &str) -> bool {
        self.property(name)
            .map(|value| value.as_bool().unwrap_or(!value.is_null()))
            .unwrap_or(false)
    }
}

/// What the dashboard needs from any wallet extension.
#[async_trait::async_trait]
pub trait WalletProvider: Send + Sync {
    fn name(&self) -> &str;

    fn chain_type(&self) -> ChainType;

    /// Runs the connection handshake and returns the wallet address.
    async fn connect(&self) -> Result<String, WalletError>;

    async fn request(&self, method: &str, params: Value) -> Result<Value, WalletError>;
}

/// Phantom, Solflare and Backpack: `connect()` resolves to `{ publicKey }`.
pub struct SolanaExtensionAdapter {
    name: String,
    handle: Arc<dyn InjectedProvider>,
    /// Read `publicKey` off the provider when `connect()` does not return it.
    public_key_fallback: bool,
}

impl SolanaExtensionAdapter {
    pub fn new(name: impl Into<String>, handle: Arc<dyn InjectedProvider>) -> Self {
        Self {
            name: name.into(),
            handle,
            public_key_fallback: false,
        }
    }

    pub fn with_public_key_fallback(mut self) -> Self {
        self.public_key_fallback = true;
        self
    }
}

fn value_as_address(value: &Value) -> Option<String> {
    match value {
        Value::String(address) if !address.is_empty() => Some(address.clone()),
        Value::Object(fields) => fields
            .get("publicKey")
            .or_else(|| fields.get("address"))
            .and_then(value_as_address),
        _ => None,
    }
}

#[async_trait::async_trait]
impl WalletProvider for SolanaExtensionAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn chain_type(&self) -> ChainType {
        ChainType::Solana
    }

    async fn connect(&self) -> Result<String, WalletError> {
        let response = self.handle.call("connect", Value::Null).await?;
        let address = response.get("publicKey").and_then(value_as_address);

        let address = match address {
            Some(address) => Some(address),
            None if self.public_key_fallback => self
                .handle
                .property("publicKey")
                .as_ref()
                .and_then(value_as_address),
            None => None,
        };

        address.ok_or_else(|| WalletError::MissingAddress(self.name.clone()))
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, WalletError> {
        self.handle.call(method, params).await
    }
}

/// MetaMask style providers speaking EIP-1193 `request`.
pub struct EthereumExtensionAdapter {
    name: String,
    handle: Arc<dyn InjectedProvider>,
}

impl EthereumExtensionAdapter {
    pub fn new(name: impl Into<String>, handle: Arc<dyn InjectedProvider>) -> Self {
        Self {
            name: name.into(),
            handle,
        }
    }
}

#[async_trait::async_trait]
impl WalletProvider for EthereumExtensionAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn chain_type(&self) -> ChainType {
        ChainType::Ethereum
    }

    async fn connect(&self) -> Result<String, WalletError> {
        let accounts = self
            .handle
            .call("eth_requestAccounts", Value::Array(vec![]))
            .await?;
        accounts
            .get(0)
            .and_then(value_as_address)
            .ok_or_else(|| WalletError::MissingAddress(self.name.clone()))
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, WalletError> {
        self.handle.call(method, params).await
    }
}

/// Injected providers by global name (`solana`, `solflare`, `backpack`, `ethereum`).
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    globals: HashMap<String, Arc<dyn InjectedProvider>>,
}

impl ProviderRegistry {
    pub fn register(&mut self, global: impl Into<String>, provider: Arc<dyn InjectedProvider>) {
        self.globals.insert(global.into(), provider);
    }

    pub fn get(&self, global: &str) -> Option<Arc<dyn InjectedProvider>> {
        self.globals.get(global).cloned()
    }
}
