//! HTTP adapter for the upstream catalog service.
//!
//! # Responsibilities
//! - Hold one pooled reqwest client for the process
//! - Map HTTP status codes and transport failures to `UpstreamCallError`
//! - Decode JSON bodies, treating an empty or `null` body as absent
//! - Drop individual malformed similar ids and invalid details with a warning

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::config::UpstreamConfig;
use crate::domain::{ProductDetail, ProductId};
use crate::upstream::client::{UpstreamCallError, UpstreamClient, UpstreamResult};

/// Catalog client over HTTP.
#[derive(Clone)]
pub struct HttpUpstreamClient {
    client: Client,
    base_url: Url,
}

impl HttpUpstreamClient {
    /// Create a new client from configuration.
    pub fn new(config: &UpstreamConfig) -> UpstreamResult<Self> {
        let mut base_url = Url::parse(&config.base_url).map_err(|e| {
            UpstreamCallError::Transport(format!("invalid upstream URL '{}': {}", config.base_url, e))
        })?;
        // Relative joins must append to the base path, not replace its last segment.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.read_timeout())
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
            .build()
            .map_err(|e| UpstreamCallError::Transport(e.to_string()))?;

        tracing::info!(
            base_url = %base_url,
            connect_timeout_ms = config.connect_timeout_ms,
            read_timeout_ms = config.read_timeout_ms,
            "Upstream client initialized"
        );

        Ok(Self { client, base_url })
    }

    fn url_for(&self, path: &str) -> UpstreamResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| UpstreamCallError::Transport(format!("invalid path '{}': {}", path, e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: String) -> UpstreamResult<Option<T>> {
        let url = self.url_for(&path)?;

        let response = self.client.get(url).send().await.map_err(map_transport)?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            tracing::warn!(resource = %path, "Upstream resource not found");
            return Err(UpstreamCallError::NotFound { resource: path });
        }
        if !status.is_success() {
            return Err(UpstreamCallError::Status {
                status: status.as_u16(),
                resource: path,
            });
        }

        let body = response.bytes().await.map_err(map_transport)?;
        decode_optional(&body)
    }
}

fn map_transport(err: reqwest::Error) -> UpstreamCallError {
    if err.is_timeout() {
        UpstreamCallError::Timeout
    } else if err.is_decode() {
        UpstreamCallError::Decode(err.to_string())
    } else {
        UpstreamCallError::Transport(err.to_string())
    }
}

fn decode_optional<T: DeserializeOwned>(body: &[u8]) -> UpstreamResult<Option<T>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice::<Option<T>>(body).map_err(|e| UpstreamCallError::Decode(e.to_string()))
}

/// Keep the usable entries of a similar-ids list, in order.
fn decode_similar_ids(root: &ProductId, raw: Vec<Value>) -> Vec<ProductId> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(position, value)| match serde_json::from_value::<ProductId>(value.clone()) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(
                    product_id = %root,
                    position,
                    value = %value,
                    error = %e,
                    "Dropping malformed similar id"
                );
                None
            }
        })
        .collect()
}

#[async_trait]
impl UpstreamClient for HttpUpstreamClient {
    async fn similar_ids(&self, id: &ProductId) -> UpstreamResult<Option<Vec<ProductId>>> {
        let raw: Option<Vec<Value>> = self.get_json(format!("product/{}/similarids", id)).await?;
        Ok(raw.map(|values| decode_similar_ids(id, values)))
    }

    async fn details_by_id(&self, id: &ProductId) -> UpstreamResult<Option<ProductDetail>> {
        let detail: Option<ProductDetail> = self.get_json(format!("product/{}", id)).await?;
        match detail {
            Some(detail) if !detail.has_valid_price() => {
                tracing::warn!(
                    product_id = %id,
                    price = ?detail.price,
                    "Discarding product detail with negative price"
                );
                Ok(None)
            }
            other => Ok(other),
        }
    }
}

impl std::fmt::Debug for HttpUpstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpUpstreamClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_null_and_empty_as_absent() {
        assert_eq!(decode_optional::<Vec<ProductId>>(b"").unwrap(), None);
        assert_eq!(decode_optional::<Vec<ProductId>>(b"null").unwrap(), None);
        assert_eq!(decode_optional::<Vec<ProductId>>(b" \n").unwrap(), None);

        let ids = decode_optional::<Vec<ProductId>>(br#"["2","3"]"#).unwrap().unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[1].as_str(), "3");
    }

    #[test]
    fn test_decode_garbage_is_decode_error() {
        let err = decode_optional::<Vec<ProductId>>(b"<html>").unwrap_err();
        assert!(matches!(err, UpstreamCallError::Decode(_)));
    }

    #[test]
    fn test_similar_ids_accept_integers_and_skip_bad_entries() {
        let root = ProductId::new("1").unwrap();
        let raw: Vec<Value> = serde_json::from_str(r#"[2,"","3",null,{"id":4},"5"]"#).unwrap();

        let ids = decode_similar_ids(&root, raw);
        let ids: Vec<&str> = ids.iter().map(ProductId::as_str).collect();
        assert_eq!(ids, vec!["2", "3", "5"]);
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let config = UpstreamConfig {
            base_url: "not a url".into(),
            ..UpstreamConfig::default()
        };
        assert!(HttpUpstreamClient::new(&config).is_err());
    }

    #[test]
    fn test_base_path_is_preserved() {
        let config = UpstreamConfig {
            base_url: "http://gateway/catalog".into(),
            ..UpstreamConfig::default()
        };
        let client = HttpUpstreamClient::new(&config).unwrap();
        assert_eq!(
            client.url_for("product/1").unwrap().as_str(),
            "http://gateway/catalog/product/1"
        );
    }

    #[test]
    fn test_paths_join_under_base() {
        let config = UpstreamConfig {
            base_url: "http://catalog:3001/".into(),
            ..UpstreamConfig::default()
        };
        let client = HttpUpstreamClient::new(&config).unwrap();
        assert_eq!(
            client.url_for("product/7/similarids").unwrap().as_str(),
            "http://catalog:3001/product/7/similarids"
        );
    }
}
