//! Server side relays that keep third party API keys out of the browser.
//!
//! `/check-address` asks the address reputation API for fraud reports.
//! `/solana-rpc` forwards raw JSON-RPC bodies to the RPC provider.

use crate::domain::errors::ProxyError;
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Query, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

pub const REPUTATION_API_URL: &str = "https://api.chainabuse.com/v0/reports";
pub const RPC_MAINNET_UPSTREAM: &str = "https://mainnet.helius-rpc.com/";
pub const RPC_DEVNET_UPSTREAM: &str = "https://devnet.helius-rpc.com/";

const DEFAULT_CHAIN: &str = "solana";
const REPUTATION_SERVICE: &str = "ChainAbuse API";

#[derive(Clone, Debug)]
pub struct ProxyConfig {
    pub reputation_api_key: Option<String>,
    pub reputation_api_url: String,
    pub rpc_api_key: Option<String>,
    pub rpc_mainnet_url: String,
    pub rpc_devnet_url: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            reputation_api_key: None,
            reputation_api_url: REPUTATION_API_URL.to_string(),
            rpc_api_key: None,
            rpc_mainnet_url: RPC_MAINNET_UPSTREAM.to_string(),
            rpc_devnet_url: RPC_DEVNET_UPSTREAM.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct ProxyState {
    config: Arc<ProxyConfig>,
    http_client: reqwest::Client,
}

impl ProxyState {
    pub fn new(config: ProxyConfig, http_client: reqwest::Client) -> Self {
        Self {
            config: Arc::new(config),
            http_client,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ProxyError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                json!({ "error": self.to_string() }),
            ),
            ProxyError::MissingAddress => {
                (StatusCode::BAD_REQUEST, json!({ "error": self.to_string() }))
            }
            ProxyError::InvalidBody(details) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": self.to_string(), "details": details }),
            ),
            ProxyError::MissingApiKey(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": message }),
            ),
            ProxyError::Upstream { status, body, .. } => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                json!({ "error": self.to_string(), "details": body }),
            ),
            ProxyError::Internal { context, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": context, "details": details }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route(
            "/check-address",
            post(check_address)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route(
            "/solana-rpc",
            post(solana_rpc)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .with_state(state)
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed(method: Method) -> ProxyError {
    tracing::warn!("Method not allowed: {}", method);
    ProxyError::MethodNotAllowed
}

#[derive(Debug, Deserialize)]
pub struct CheckAddressRequest {
    address: Option<String>,
    chain: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAddressResponse {
    pub safe: bool,
    pub reports: Vec<Value>,
    pub total_reports: usize,
    pub checked: bool,
    pub message: String,
}

impl CheckAddressResponse {
    fn from_reports(reports: Vec<Value>) -> Self {
        let total_reports = reports.len();
        let message = if total_reports > 0 {
            format!("Found {} fraud report(s)", total_reports)
        } else {
            "No fraud reports found".to_string()
        };
        Self {
            safe: total_reports == 0,
            reports,
            total_reports,
            checked: true,
            message,
        }
    }
}

/// Upper-cases a chain name, with `solana` mapped to the `SOL` ticker.
pub fn normalize_chain(chain: &str) -> String {
    let upper = chain.to_uppercase();
    if upper == "SOLANA" {
        "SOL".to_string()
    } else {
        upper
    }
}

/// The reputation API answers with a bare list, `{ reports: [...] }` or `{ data: [...] }`.
pub fn extract_reports(data: Value) -> Vec<Value> {
    match data {
        Value::Array(reports) => reports,
        Value::Object(mut fields) => match (fields.remove("reports"), fields.remove("data")) {
            (Some(Value::Array(reports)), _) => reports,
            (_, Some(Value::Array(reports))) => reports,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn reputation_failure(e: reqwest::Error) -> ProxyError {
    tracing::error!("Reputation lookup failed: {}", e);
    ProxyError::Internal {
        context: "Internal server error",
        details: e.to_string(),
    }
}

async fn check_address(
    State(state): State<ProxyState>,
    payload: Result<Json<CheckAddressRequest>, JsonRejection>,
) -> Result<Json<CheckAddressResponse>, ProxyError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!("Rejected check-address body: {}", rejection);
        ProxyError::InvalidBody(rejection.body_text())
    })?;
    let address = request
        .address
        .filter(|address| !address.is_empty())
        .ok_or(ProxyError::MissingAddress)?;
    let api_key = state.config.reputation_api_key.as_deref().ok_or_else(|| {
        tracing::error!("Reputation API key is not configured");
        ProxyError::MissingApiKey("Server configuration error: API key is missing.")
    })?;
    let chain = normalize_chain(request.chain.as_deref().unwrap_or(DEFAULT_CHAIN));

    tracing::info!("Checking address {} on chain {}", address, chain);
    let response = state
        .http_client
        .get(&state.config.reputation_api_url)
        .query(&[
            ("address", address.as_str()),
            ("chain", chain.as_str()),
            ("includePrivate", "false"),
            ("page", "1"),
            ("perPage", "50"),
        ])
        .header("X-API-Key", api_key)
        .header(header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(reputation_failure)?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::error!("{} error: {} - {}", REPUTATION_SERVICE, status, body);
        return Err(ProxyError::Upstream {
            service: REPUTATION_SERVICE,
            status: status.as_u16(),
            body,
        });
    }

    let data: Value = response.json().await.map_err(reputation_failure)?;
    let result = CheckAddressResponse::from_reports(extract_reports(data));
    tracing::info!(
        "Check complete for {}: {} report(s)",
        address,
        result.total_reports
    );
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct RpcProxyQuery {
    network: Option<String>,
}

fn rpc_failure(e: reqwest::Error) -> ProxyError {
    tracing::error!("RPC proxy error: {}", e);
    ProxyError::Internal {
        context: "RPC proxy error",
        details: e.to_string(),
    }
}

async fn solana_rpc(
    State(state): State<ProxyState>,
    Query(query): Query<RpcProxyQuery>,
    body: Bytes,
) -> Result<Response, ProxyError> {
    let api_key = state
        .config
        .rpc_api_key
        .as_deref()
        .ok_or(ProxyError::MissingApiKey(
            "Missing HELIUS_API_KEY environment variable",
        ))?;
    let upstream = match query.network.as_deref() {
        Some("devnet") => &state.config.rpc_devnet_url,
        _ => &state.config.rpc_mainnet_url,
    };

    let response = state
        .http_client
        .post(upstream)
        .query(&[("api-key", api_key)])
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await
        .map_err(rpc_failure)?;

    let status = StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let payload = response.bytes().await.map_err(rpc_failure)?;
    Ok((
        status,
        [(header::CONTENT_TYPE, "application/json")],
        payload,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::HeaderMap, routing::get};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tower::ServiceExt;

    type Captured = Arc<Mutex<Vec<(HashMap<String, String>, HeaderMap, String)>>>;

    /// Fake upstream that records every request and answers with a fixed status and body.
    async fn upstream(status: StatusCode, reply: &'static str) -> (String, Captured) {
        let captured: Captured = Arc::default();
        let sink = captured.clone();
        let handler = move |Query(params): Query<HashMap<String, String>>,
                            headers: HeaderMap,
                            body: String| {
            let sink = sink.clone();
            async move {
                sink.lock().unwrap().push((params, headers, body));
                (status, reply)
            }
        };
        let app = Router::new().route("/upstream", get(handler.clone()).post(handler));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/upstream", addr), captured)
    }

    fn proxy(config: ProxyConfig) -> Router {
        router(ProxyState::new(config, reqwest::Client::new()))
    }

    fn reputation_config(url: &str) -> ProxyConfig {
        ProxyConfig {
            reputation_api_key: Some("reputation-key".to_string()),
            reputation_api_url: url.to_string(),
            ..ProxyConfig::default()
        }
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_chain_normalization() {
        assert_eq!(normalize_chain("solana"), "SOL");
        assert_eq!(normalize_chain("Solana"), "SOL");
        assert_eq!(normalize_chain("eth"), "ETH");
    }

    #[test]
    fn test_report_shapes() {
        assert_eq!(extract_reports(json!([1, 2])).len(), 2);
        assert_eq!(extract_reports(json!({ "reports": [1] })).len(), 1);
        assert_eq!(extract_reports(json!({ "data": [1, 2, 3] })).len(), 3);
        assert!(extract_reports(json!({ "count": 0 })).is_empty());
        assert!(extract_reports(json!("nothing")).is_empty());
    }

    #[tokio::test]
    async fn test_reports_found() {
        let (url, captured) = upstream(
            StatusCode::OK,
            r#"{"reports":[{"id":"r1"},{"id":"r2"}]}"#,
        )
        .await;

        let response = proxy(reputation_config(&url))
            .oneshot(post_json("/check-address", json!({ "address": "abc" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            read_json(response).await,
            json!({
                "safe": false,
                "reports": [{ "id": "r1" }, { "id": "r2" }],
                "totalReports": 2,
                "checked": true,
                "message": "Found 2 fraud report(s)"
            })
        );

        let requests = captured.lock().unwrap();
        let (params, headers, _) = &requests[0];
        assert_eq!(params["address"], "abc");
        assert_eq!(params["chain"], "SOL");
        assert_eq!(params["includePrivate"], "false");
        assert_eq!(params["perPage"], "50");
        assert_eq!(headers["x-api-key"], "reputation-key");
    }

    #[tokio::test]
    async fn test_clean_address() {
        let (url, captured) = upstream(StatusCode::OK, "[]").await;

        let response = proxy(reputation_config(&url))
            .oneshot(post_json(
                "/check-address",
                json!({ "address": "0xabc", "chain": "eth" }),
            ))
            .await
            .unwrap();

        let body = read_json(response).await;
        assert_eq!(body["safe"], true);
        assert_eq!(body["totalReports"], 0);
        assert_eq!(body["message"], "No fraud reports found");
        assert_eq!(captured.lock().unwrap()[0].0["chain"], "ETH");
    }

    #[tokio::test]
    async fn test_missing_address() {
        let response = proxy(reputation_config("http://127.0.0.1:9"))
            .oneshot(post_json("/check-address", json!({})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            read_json(response).await,
            json!({ "error": "Address is required" })
        );
    }

    #[tokio::test]
    async fn test_malformed_body_gets_json_error() {
        let response = proxy(reputation_config("http://127.0.0.1:9"))
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/check-address")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body["error"], "Invalid request body");
        assert!(body["details"].is_string());
    }

    #[tokio::test]
    async fn test_missing_reputation_key() {
        let response = proxy(ProxyConfig::default())
            .oneshot(post_json("/check-address", json!({ "address": "abc" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            read_json(response).await["error"],
            "Server configuration error: API key is missing."
        );
    }

    #[tokio::test]
    async fn test_wrong_method() {
        for uri in ["/check-address", "/solana-rpc"] {
            let response = proxy(ProxyConfig::default())
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(
                read_json(response).await,
                json!({ "error": "Method not allowed" })
            );
        }
    }

    #[tokio::test]
    async fn test_options_is_accepted() {
        let response = proxy(ProxyConfig::default())
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/check-address")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_upstream_error_is_relayed() {
        let (url, _) = upstream(StatusCode::UNAUTHORIZED, "bad key").await;

        let response = proxy(reputation_config(&url))
            .oneshot(post_json("/check-address", json!({ "address": "abc" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            read_json(response).await,
            json!({ "error": "ChainAbuse API returned 401", "details": "bad key" })
        );
    }

    #[tokio::test]
    async fn test_rpc_body_and_status_are_relayed() {
        let (mainnet, mainnet_requests) =
            upstream(StatusCode::TOO_MANY_REQUESTS, r#"{"error":"slow down"}"#).await;
        let (devnet, devnet_requests) =
            upstream(StatusCode::OK, r#"{"jsonrpc":"2.0","id":1,"result":42}"#).await;
        let config = ProxyConfig {
            rpc_api_key: Some("rpc-key".to_string()),
            rpc_mainnet_url: mainnet,
            rpc_devnet_url: devnet,
            ..ProxyConfig::default()
        };
        let request = json!({ "jsonrpc": "2.0", "id": 1, "method": "getSlot" });

        let response = proxy(config.clone())
            .oneshot(post_json("/solana-rpc?network=devnet", request.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["result"], 42);
        {
            let requests = devnet_requests.lock().unwrap();
            assert_eq!(requests[0].0["api-key"], "rpc-key");
            assert_eq!(requests[0].2, request.to_string());
        }

        let response = proxy(config)
            .oneshot(post_json("/solana-rpc", request))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(read_json(response).await["error"], "slow down");
        assert_eq!(mainnet_requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_rpc_key() {
        let response = proxy(ProxyConfig::default())
            .oneshot(post_json("/solana-rpc", json!({})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(read_json(response).await["error"]
            .as_str()
            .unwrap()
            .contains("HELIUS_API_KEY"));
    }
}
