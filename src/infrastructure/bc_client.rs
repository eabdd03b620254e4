use crate::domain::{errors::BcClientError, models::SignatureStatus};
use solana_transaction_status::EncodedConfirmedTransactionWithStatusMeta;

/// A trait representing a blockchain client for reading wallet activity from a Solana RPC endpoint.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait BcClient: Send + Sync {
    /// Retrieves the balance of an account in lamports.
    ///
    /// # Arguments
    ///
    /// * `address` - The base58 address of the account.
    ///
    /// # Returns
    ///
    /// * `Result<u64, BcClientError>` - The balance if successful, or an error if the operation fails.
    async fn get_balance(&self, address: &str) -> Result<u64, BcClientError>;

    /// Retrieves the most recent finalized signatures involving an address, newest first.
    ///
    /// # Arguments
    ///
    /// * `address` - The base58 address of the account.
    /// * `limit` - Maximum number of signatures to return.
    async fn get_signatures_for_address(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<SignatureStatus>, BcClientError>;

    /// Retrieves the parsed bodies of several transactions in a single batch request.
    ///
    /// The result is positional: entry `i` belongs to `signatures[i]` and is `None`
    /// when the endpoint has no body for that signature.
    async fn get_parsed_transactions(
        &self,
        signatures: &[String],
    ) -> Result<Vec<Option<EncodedConfirmedTransactionWithStatusMeta>>, BcClientError>;
}
