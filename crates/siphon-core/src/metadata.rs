use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use siphon_trait::{AssetMetadata, MetadataProvider};
use url::Url;

pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
pub const TOKEN_2022_PROGRAM_ID: &str = "TokenzQdBNbLqP5VEhdkAS6EHFLC1ELWzc6ZRDb1ww7b";

pub const DEFAULT_RPC_URL: &str = "https://mainnet.helius-rpc.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON-RPC client for the Helius endpoint, used to describe token mints on first use.
#[derive(Clone, Debug)]
pub struct HeliusClient {
    inner: ClientWithMiddleware,
    endpoint: Url,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct Asset {
    #[serde(default)]
    content: Option<AssetContent>,
}

#[derive(Debug, Deserialize)]
struct AssetContent {
    #[serde(default)]
    metadata: Option<ContentMetadata>,
}

#[derive(Debug, Deserialize)]
struct ContentMetadata {
    #[serde(default)]
    name: String,
    #[serde(default)]
    symbol: String,
}

#[derive(Debug, Deserialize)]
struct AccountInfo {
    value: Option<AccountValue>,
}

#[derive(Debug, Deserialize)]
struct AccountValue {
    owner: String,
}

impl HeliusClient {
    /// `api_key` is sent as the `api-key` query parameter on every call.
    pub fn new(rpc_url: &str, api_key: Option<&str>) -> Result<Self> {
        let mut endpoint = Url::parse(rpc_url).with_context(|| format!("Invalid RPC url {rpc_url}"))?;
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            endpoint.query_pairs_mut().append_pair("api-key", key);
        }

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_millis(100), Duration::from_secs(1))
            .build_with_max_retries(3);

        let http = ReqwestClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        let inner = ClientBuilder::new(http)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self { inner, endpoint })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: serde_json::Value) -> Result<Option<T>> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": "siphon",
            "method": method,
            "params": params,
        });

        let response = self
            .inner
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .with_context(|| format!("{method} request failed"))?
            .error_for_status()
            .with_context(|| format!("{method} returned an error status"))?;

        let text = response.text().await?;
        parse_rpc_response(method, &text)
    }
}

fn parse_rpc_response<T: DeserializeOwned>(method: &str, body: &str) -> Result<Option<T>> {
    let response: RpcResponse<T> =
        serde_json::from_str(body).with_context(|| format!("Malformed {method} response"))?;
    if let Some(err) = response.error {
        return Err(anyhow!("{method} failed with code {}: {}", err.code, err.message));
    }
    Ok(response.result)
}

fn asset_to_metadata(asset: Asset) -> Option<AssetMetadata> {
    let metadata = asset.content?.metadata?;
    if metadata.name.trim().is_empty() && metadata.symbol.trim().is_empty() {
        return None;
    }
    Some(AssetMetadata { name: metadata.name.trim().to_string(), symbol: metadata.symbol.trim().to_string() })
}

#[async_trait]
impl MetadataProvider for HeliusClient {
    async fn asset_metadata(&self, address: &str) -> Result<Option<AssetMetadata>> {
        let asset: Option<Asset> = self.call("getAsset", json!({ "id": address })).await?;
        Ok(asset.and_then(asset_to_metadata))
    }

    async fn account_owner(&self, address: &str) -> Result<String> {
        let info: Option<AccountInfo> =
            self.call("getAccountInfo", json!([address, { "encoding": "base64" }])).await?;
        info.and_then(|i| i.value)
            .map(|v| v.owner)
            .ok_or_else(|| anyhow!("account {address} does not exist"))
    }
}
