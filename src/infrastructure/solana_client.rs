use serde::Deserialize;
use serde_json::{json, Value};
use solana_client::{
    nonblocking::rpc_client::RpcClient, rpc_client::GetConfirmedSignaturesForAddress2Config,
};
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};
use solana_transaction_status::EncodedConfirmedTransactionWithStatusMeta;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{errors::BcClientError, models::SignatureStatus};

use super::bc_client::BcClient;

/// A client for reading wallet activity from one Solana RPC endpoint.
#[derive(Clone)]
pub struct SolanaClient {
    rpc_url: String,
    rpc_client: Arc<RpcClient>,
    http_client: reqwest::Client,
}

impl SolanaClient {
    /// Creates a new `SolanaClient` instance for the given RPC URL.
    ///
    /// # Arguments
    ///
    /// * `rpc_url` - The URL of the Solana RPC endpoint.
    /// * `http_client` - Client used for batch requests; its own timeout applies to them.
    /// * `timeout` - Request timeout of the underlying `RpcClient`.
    ///
    /// # Returns
    ///
    /// A new `SolanaClient` instance.
    pub fn new(rpc_url: &str, http_client: reqwest::Client, timeout: Duration) -> Self {
        Self {
            rpc_url: rpc_url.to_string(),
            rpc_client: Arc::new(RpcClient::new_with_timeout_and_commitment(
                rpc_url.to_string(),
                timeout,
                CommitmentConfig::confirmed(),
            )),
            http_client,
        }
    }

    pub fn url(&self) -> &str {
        &self.rpc_url
    }

    fn parse_address(address: &str) -> Result<Pubkey, BcClientError> {
        Pubkey::from_str(address).map_err(|_| BcClientError::InvalidAddress(address.to_string()))
    }
}

#[derive(Deserialize)]
struct RpcBatchEntry {
    id: usize,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

#[async_trait::async_trait]
impl BcClient for SolanaClient {
    async fn get_balance(&self, address: &str) -> Result<u64, BcClientError> {
        let pubkey = Self::parse_address(address)?;
        self.rpc_client
            .get_balance(&pubkey)
            .await
            .map_err(|e| BcClientError::FailedToGetBalance(e.to_string()))
    }

    async fn get_signatures_for_address(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<SignatureStatus>, BcClientError> {
        let pubkey = Self::parse_address(address)?;
        let result = self
            .rpc_client
            .get_signatures_for_address_with_config(
                &pubkey,
                GetConfirmedSignaturesForAddress2Config {
                    before: None,
                    until: None,
                    limit: Some(limit),
                    commitment: Some(CommitmentConfig::finalized()),
                },
            )
            .await
            .map_err(|e| BcClientError::FailedToGetSignatures(e.to_string()))?;

        Ok(result
            .into_iter()
            .map(|status| SignatureStatus {
                signature: status.signature,
                slot: status.slot,
                failed: status.err.is_some(),
                block_time: status.block_time,
            })
            .collect())
    }

    /// Fetches every body with one JSON-RPC batch of `getTransaction` calls.
    ///
    /// A `null` or undecodable result leaves a gap at that position. Any
    /// per-call JSON-RPC error fails the whole batch.
    async fn get_parsed_transactions(
        &self,
        signatures: &[String],
    ) -> Result<Vec<Option<EncodedConfirmedTransactionWithStatusMeta>>, BcClientError> {
        if signatures.is_empty() {
            return Ok(Vec::new());
        }

        let batch: Vec<Value> = signatures
            .iter()
            .enumerate()
            .map(|(id, signature)| {
                json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "method": "getTransaction",
                    "params": [
                        signature,
                        {
                            "encoding": "jsonParsed",
                            "commitment": "finalized",
                            "maxSupportedTransactionVersion": 0
                        }
                    ]
                })
            })
            .collect();

        let response = self
            .http_client
            .post(&self.rpc_url)
            .json(&batch)
            .send()
            .await
            .map_err(|e| BcClientError::FailedToGetTransactions(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BcClientError::FailedToGetTransactions(format!(
                "endpoint answered {}",
                status
            )));
        }

        let entries: Vec<RpcBatchEntry> = response
            .json()
            .await
            .map_err(|e| BcClientError::FailedToGetTransactions(e.to_string()))?;

        let mut bodies: Vec<Option<EncodedConfirmedTransactionWithStatusMeta>> =
            signatures.iter().map(|_| None).collect();
        for entry in entries {
            if let Some(error) = entry.error {
                return Err(BcClientError::FailedToGetTransactions(error.to_string()));
            }
            let Some(slot) = bodies.get_mut(entry.id) else {
                continue;
            };
            *slot = entry.result.and_then(|result| {
                serde_json::from_value(result)
                    .map_err(|e| {
                        tracing::debug!(
                            "Undecodable transaction body for {}: {}",
                            signatures[entry.id],
                            e
                        );
                    })
                    .ok()
            });
        }

        Ok(bodies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};

    fn test_client(url: &str) -> SolanaClient {
        SolanaClient::new(url, reqwest::Client::new(), Duration::from_secs(5))
    }

    async fn serve(reply: Value) -> String {
        let app = Router::new().route(
            "/",
            post(move |Json(_batch): Json<Value>| {
                let reply = reply.clone();
                async move { Json(reply) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    fn body(slot: u64) -> Value {
        json!({
            "slot": slot,
            "blockTime": 1_700_000_000,
            "transaction": {
                "signatures": ["sig"],
                "message": {
                    "accountKeys": [
                        { "pubkey": "11111111111111111111111111111111", "signer": false, "writable": false }
                    ],
                    "instructions": [],
                    "recentBlockhash": "11111111111111111111111111111111"
                }
            },
            "meta": {
                "err": null,
                "status": { "Ok": null },
                "fee": 5000,
                "preBalances": [1],
                "postBalances": [1],
                "innerInstructions": [],
                "logMessages": [],
                "preTokenBalances": [],
                "postTokenBalances": [],
                "rewards": []
            }
        })
    }

    #[tokio::test]
    async fn test_batch_results_are_positional() {
        let url = serve(json!([
            { "jsonrpc": "2.0", "id": 2, "result": body(30) },
            { "jsonrpc": "2.0", "id": 0, "result": body(10) },
            { "jsonrpc": "2.0", "id": 1, "result": null }
        ]))
        .await;
        let client = test_client(&url);
        let signatures = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        let bodies = client.get_parsed_transactions(&signatures).await.unwrap();

        assert_eq!(bodies.len(), 3);
        assert_eq!(bodies[0].as_ref().map(|tx| tx.slot), Some(10));
        assert!(bodies[1].is_none());
        assert_eq!(bodies[2].as_ref().map(|tx| tx.slot), Some(30));
    }

    #[tokio::test]
    async fn test_batch_fails_on_rpc_error_entry() {
        let url = serve(json!([
            { "jsonrpc": "2.0", "id": 0, "result": body(10) },
            { "jsonrpc": "2.0", "id": 1, "error": { "code": -32005, "message": "busy" } }
        ]))
        .await;
        let client = test_client(&url);
        let signatures = vec!["a".to_string(), "b".to_string()];

        let result = client.get_parsed_transactions(&signatures).await;

        assert!(matches!(
            result,
            Err(BcClientError::FailedToGetTransactions(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_batch_skips_the_request() {
        let client = test_client("http://127.0.0.1:9");
        let bodies = client.get_parsed_transactions(&[]).await.unwrap();
        assert!(bodies.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_address_is_rejected_before_any_request() {
        let client = test_client("http://127.0.0.1:9");
        let result = client.get_balance("not-a-pubkey").await;
        assert!(matches!(result, Err(BcClientError::InvalidAddress(_))));
    }

    #[tokio::test]
    async fn test_hanging_endpoint_times_out() {
        let app = Router::new().route(
            "/",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Json(json!([]))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .unwrap();
        let client = SolanaClient::new(
            &format!("http://{}/", addr),
            http_client,
            Duration::from_millis(100),
        );

        let started = std::time::Instant::now();
        let result = client.get_parsed_transactions(&["a".to_string()]).await;

        assert!(matches!(
            result,
            Err(BcClientError::FailedToGetTransactions(_))
        ));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
