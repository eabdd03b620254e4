use thiserror::Error;

#[derive(Error, Debug)]
pub enum BcClientError {
    #[error("Invalid address {0}")]
    InvalidAddress(String),
    #[error("Failed to get balance: {0}")]
    FailedToGetBalance(String),
    #[error("Failed to get signatures: {0}")]
    FailedToGetSignatures(String),
    #[error("Failed to get transactions: {0}")]
    FailedToGetTransactions(String),
}

#[derive(Error, Debug)]
pub enum PriceError {
    #[error("Price request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Price response has no quote for {0}")]
    MissingQuote(String),
}

#[derive(Error, Debug)]
pub enum DocumentStoreError {
    #[error("User document not found: {0}")]
    UserNotFound(String),
}

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Wallet provider {0} is not available")]
    ProviderUnavailable(String),
    #[error("Wallet provider rejected {method}: {reason}")]
    Rejected { method: String, reason: String },
    #[error("Wallet provider {0} returned no address")]
    MissingAddress(String),
}

#[derive(Error, Debug)]
#[error("Unknown network {0}, expected mainnet-beta or devnet")]
pub struct NetworkParseError(pub String);

/// Errors surfaced by the two proxy handlers. Each variant maps to one HTTP status.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Address is required")]
    MissingAddress,
    #[error("Invalid request body")]
    InvalidBody(String),
    #[error("{0}")]
    MissingApiKey(&'static str),
    #[error("{service} returned {status}")]
    Upstream {
        service: &'static str,
        status: u16,
        body: String,
    },
    #[error("{context}: {details}")]
    Internal {
        context: &'static str,
        details: String,
    },
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind listener: {0}")]
    Bind(#[from] std::io::Error),
}
