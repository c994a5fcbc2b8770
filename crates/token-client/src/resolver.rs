//! Signing-metadata resolution.
//!
//! Hardware devices only display contract calls they can decode. Before a
//! payload is sent to the device it is resolved against a service that
//! returns the plugin and token descriptors the device needs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Which kinds of descriptors to resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionConfig {
    pub nft: bool,
    pub erc20: bool,
    pub external_plugins: bool,
}

impl ResolutionConfig {
    /// NFT-category calls: approvals, transfers, mints and bundle updates.
    pub fn nft() -> Self {
        Self {
            nft: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalPlugin {
    pub payload: String,
    pub signature: String,
}

/// Descriptors handed to the device together with the payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    #[serde(default)]
    pub erc20_tokens: Vec<String>,
    #[serde(default)]
    pub nfts: Vec<String>,
    #[serde(default)]
    pub external_plugin: Vec<ExternalPlugin>,
    #[serde(default)]
    pub plugin: Vec<String>,
    #[serde(default)]
    pub domains: Vec<serde_json::Value>,
}

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("resolution request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("resolution service returned {status}: {body}")]
    Status { status: u16, body: String },
}

#[async_trait]
pub trait TransactionResolver: Send + Sync {
    /// Resolves a hex signing payload (no `0x`).
    async fn resolve(
        &self,
        raw_tx_hex: &str,
        config: &ResolutionConfig,
    ) -> Result<Resolution, ResolverError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolveRequest<'a> {
    raw_tx: &'a str,
    config: &'a ResolutionConfig,
}

/// Resolves payloads by POSTing them as JSON to a resolution endpoint.
#[derive(Debug, Clone)]
pub struct HttpResolver {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpResolver {
    pub fn new(endpoint: Url) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(client: reqwest::Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl TransactionResolver for HttpResolver {
    async fn resolve(
        &self,
        raw_tx_hex: &str,
        config: &ResolutionConfig,
    ) -> Result<Resolution, ResolverError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&ResolveRequest {
                raw_tx: raw_tx_hex,
                config,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ResolverError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<Resolution>().await?)
    }
}

/// Resolves every payload to an empty [`Resolution`], for devices that
/// display raw contract data.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolution;

#[async_trait]
impl TransactionResolver for NoResolution {
    async fn resolve(
        &self,
        _raw_tx_hex: &str,
        _config: &ResolutionConfig,
    ) -> Result<Resolution, ResolverError> {
        Ok(Resolution::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_shape() {
        let config = ResolutionConfig::nft();
        let body = serde_json::to_value(ResolveRequest {
            raw_tx: "e8808504",
            config: &config,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "rawTx": "e8808504",
                "config": { "nft": true, "erc20": false, "externalPlugins": false }
            })
        );
    }

    #[test]
    fn resolution_parses_partial_responses() {
        let json = r#"{"nfts":["0a0b"],"plugin":["1c"],"externalPlugin":[{"payload":"aa","signature":"bb"}]}"#;
        let resolution: Resolution = serde_json::from_str(json).unwrap();
        assert_eq!(resolution.nfts, vec!["0a0b".to_string()]);
        assert!(resolution.erc20_tokens.is_empty());
        assert!(resolution.domains.is_empty());
        assert_eq!(resolution.external_plugin[0].signature, "bb");
    }

    #[tokio::test]
    async fn no_resolution_is_empty() {
        let resolution = NoResolution
            .resolve("00", &ResolutionConfig::nft())
            .await
            .unwrap();
        assert_eq!(resolution, Resolution::default());
    }
}
