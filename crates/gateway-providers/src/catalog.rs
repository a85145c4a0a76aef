//! Model catalog aggregation.
//!
//! Every backend's model listing is fetched concurrently. A backend that
//! fails contributes nothing; the aggregate call itself never fails.

use crate::registry::RegistryHandle;
use futures::future::join_all;
use gateway_config::BackendConfig;
use gateway_core::{GatewayError, GatewayResult, ModelCatalogEntry, ModelReference};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use url::Url;

/// Default per-backend listing deadline
pub const DEFAULT_MODELS_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches and merges the model listings of all registered backends
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    registry: RegistryHandle,
    client: Client,
    timeout: Duration,
}

impl ModelCatalog {
    /// Create a catalog over a registry
    #[must_use]
    pub fn new(registry: RegistryHandle, client: Client) -> Self {
        Self {
            registry,
            client,
            timeout: DEFAULT_MODELS_TIMEOUT,
        }
    }

    /// Set the per-backend deadline
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// List the models of every backend, namespaced by backend.
    ///
    /// Entries are ordered by backend name, then by the order the backend
    /// returned them.
    #[instrument(skip(self))]
    pub async fn list_models(&self) -> Vec<ModelCatalogEntry> {
        let registry = self.registry.load();
        let results = join_all(registry.iter().map(|backend| self.backend_models(backend))).await;

        let mut failed = 0usize;
        let mut entries = Vec::new();
        for result in results {
            match result {
                Ok(models) => entries.extend(models),
                Err(_) => failed += 1,
            }
        }

        info!(
            backends = registry.len(),
            failed,
            models = entries.len(),
            "Model catalog aggregated"
        );
        entries
    }

    async fn backend_models(&self, backend: &BackendConfig) -> GatewayResult<Vec<ModelCatalogEntry>> {
        let result = self.fetch_models(backend).await;
        if let Err(e) = &result {
            error!(backend = %backend.name(), error = %e, "Failed to list backend models");
        }
        result
    }

    async fn fetch_models(&self, backend: &BackendConfig) -> GatewayResult<Vec<ModelCatalogEntry>> {
        let name = backend.name();
        let url = models_url(backend.api_url());
        debug!(backend = %name, url = %url, "Requesting model list");

        let mut request = self.client.get(url).timeout(self.timeout);
        if let Some(key) = backend.api_key() {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::timeout(name, self.timeout)
            } else {
                GatewayError::upstream(name, None, e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::upstream(name, Some(status.as_u16()), body));
        }

        let listing: UpstreamModelList = response.json().await.map_err(|e| {
            GatewayError::upstream(name, Some(status.as_u16()), format!("Invalid model list: {e}"))
        })?;

        Ok(listing
            .data
            .into_iter()
            .map(|model| {
                ModelCatalogEntry::new(
                    ModelReference::namespaced(name, &model.id),
                    name,
                    model.created,
                )
            })
            .collect())
    }
}

/// Derive a backend's model listing URL from its completions URL.
///
/// `.../chat/completions` and `.../completions` become `.../models`; any
/// other path gets `/models` appended. Query parameters are kept.
#[must_use]
pub fn models_url(api_url: &Url) -> Url {
    let path = api_url.path().trim_end_matches('/');
    let base = path
        .strip_suffix("/chat/completions")
        .or_else(|| path.strip_suffix("/completions"))
        .unwrap_or(path);

    let mut url = api_url.clone();
    url.set_path(&format!("{base}/models"));
    url
}

#[derive(Debug, Deserialize)]
struct UpstreamModelList {
    #[serde(default)]
    data: Vec<UpstreamModel>,
}

#[derive(Debug, Deserialize)]
struct UpstreamModel {
    id: String,
    #[serde(default)]
    created: Option<i64>,
}
