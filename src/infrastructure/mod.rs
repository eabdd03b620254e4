pub mod bc_client;
pub mod document_mirror;
pub mod document_store;
pub mod price_feed;
pub mod shutdown;
pub mod solana_client;
pub mod wallet_provider;
