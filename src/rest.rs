//! HTTP adapter for fetching the catalog from the shuttle backend.

use serde::Deserialize;
use tracing::{debug, info};

use crate::catalog::CatalogData;
use crate::error::DispatchResult;
use crate::traits::CatalogSource;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RestCatalogConfig {
    pub base_url: String,
    /// Path of the catalog resource relative to `base_url`.
    pub catalog_path: String,
    pub timeout_secs: u64,
}

impl Default for RestCatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            catalog_path: "api/dispatch/catalog".to_string(),
            timeout_secs: 10,
        }
    }
}

impl RestCatalogConfig {
    pub fn url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.catalog_path.trim_start_matches('/')
        )
    }
}

#[derive(Debug, Clone)]
pub struct RestCatalogClient {
    config: RestCatalogConfig,
    client: reqwest::blocking::Client,
}

impl RestCatalogClient {
    pub fn new(config: RestCatalogConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }
}

impl CatalogSource for RestCatalogClient {
    /// Fetch the catalog with one GET. Transport and decode failures are
    /// returned as [`crate::DispatchError::Http`].
    fn load_catalog(&self) -> DispatchResult<CatalogData> {
        let url = self.config.url();
        debug!(%url, "fetching catalog");

        let data = self
            .client
            .get(&url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<CatalogData>())?;

        info!(
            drivers = data.drivers.len(),
            passengers = data.passengers.len(),
            "catalog fetched"
        );
        Ok(data)
    }
}
