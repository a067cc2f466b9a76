use anyhow::Result;
use async_trait::async_trait;
#[cfg(any(test, feature = "mock"))]
use mockall::automock;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AssetMetadata {
    pub name: String,
    pub symbol: String,
}

/// Upstream lookups needed when a subscription names an address we have never seen.
#[cfg_attr(any(test, feature = "mock"), automock)]
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Display metadata of a token mint. `Ok(None)` when the asset carries none.
    async fn asset_metadata(&self, address: &str) -> Result<Option<AssetMetadata>>;

    /// Program that owns the account, base58 encoded.
    async fn account_owner(&self, address: &str) -> Result<String>;
}
