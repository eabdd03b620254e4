use crate::domain::{
    errors::DocumentStoreError,
    models::{WalletDescriptor, WalletDocumentStore},
};
use dashmap::DashMap;

/// Per-user wallet documents kept in process memory.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    // user identity -> wallets, unique by address
    documents: DashMap<String, Vec<WalletDescriptor>>,
}

#[async_trait::async_trait]
impl WalletDocumentStore for InMemoryDocumentStore {
    async fn initialize_user(&self, user: &str) -> Result<(), DocumentStoreError> {
        self.documents.entry(user.to_string()).or_default();
        Ok(())
    }

    async fn sync_wallets(
        &self,
        user: &str,
        wallets: Vec<WalletDescriptor>,
    ) -> Result<(), DocumentStoreError> {
        let mut document = self.documents.entry(user.to_string()).or_default();
        for wallet in wallets {
            match document.iter_mut().find(|w| w.address == wallet.address) {
                Some(existing) => *existing = wallet,
                None => document.push(wallet),
            }
        }
        Ok(())
    }

    async fn remove_wallet(&self, user: &str, address: &str) -> Result<(), DocumentStoreError> {
        let mut document = self
            .documents
            .get_mut(user)
            .ok_or_else(|| DocumentStoreError::UserNotFound(user.to_string()))?;
        document.retain(|w| w.address != address);
        Ok(())
    }

    async fn get_wallets(&self, user: &str) -> Result<Vec<WalletDescriptor>, DocumentStoreError> {
        self.documents
            .get(user)
            .map(|v| v.value().clone())
            .ok_or_else(|| DocumentStoreError::UserNotFound(user.to_string()))
    }
}
