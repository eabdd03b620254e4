use crate::domain::errors::PriceError;
use serde::Deserialize;
use std::collections::HashMap;

pub const COINGECKO_SIMPLE_PRICE_URL: &str = "https://api.coingecko.com/api/v3/simple/price";

/// Source of the SOL spot price in USD.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PriceSource: Send + Sync {
    async fn spot_price(&self) -> Result<f64, PriceError>;
}

/// Spot price from CoinGecko's `simple/price` endpoint.
#[derive(Clone)]
pub struct CoinGeckoPriceSource {
    http_client: reqwest::Client,
    url: String,
}

impl CoinGeckoPriceSource {
    const COIN_ID: &'static str = "solana";
    const VS_CURRENCY: &'static str = "usd";

    pub fn new(url: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            url: url.into(),
        }
    }
}

#[derive(Deserialize)]
struct SimplePriceResponse(HashMap<String, HashMap<String, f64>>);

#[async_trait::async_trait]
impl PriceSource for CoinGeckoPriceSource {
    async fn spot_price(&self) -> Result<f64, PriceError> {
        let response: SimplePriceResponse = self
            .http_client
            .get(&self.url)
            .query(&[("ids", Self::COIN_ID), ("vs_currencies", Self::VS_CURRENCY)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .0
            .get(Self::COIN_ID)
            .and_then(|quotes| quotes.get(Self::VS_CURRENCY))
            .copied()
            .ok_or_else(|| PriceError::MissingQuote(Self::COIN_ID.to_string()))
    }
}
