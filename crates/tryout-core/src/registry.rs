//! Registry metadata queries.
//!
//! Used when a cached package has no readable `package.json`. The response is
//! the registry's version document, which shares field names with the local
//! manifest.

use async_trait::async_trait;
use reqwest::Client;
use tryout_schema::{PackageManifest, PackageName};

use crate::TryoutError;

#[async_trait]
pub trait Registry: Send + Sync {
    /// Fetch the version document for `name` at `version` (or `latest`).
    async fn fetch(
        &self,
        name: &PackageName,
        version: Option<&str>,
    ) -> Result<PackageManifest, TryoutError>;
}

/// npm-compatible registry over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRegistry {
    client: Client,
    base: String,
}

impl HttpRegistry {
    pub fn new(base: impl Into<String>) -> Self {
        let client = Client::builder()
            .user_agent(crate::USER_AGENT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Document URL; scoped names encode their slash.
    pub fn document_url(&self, name: &PackageName, version: Option<&str>) -> String {
        let encoded = name.as_str().replace('/', "%2F");
        format!("{}/{encoded}/{}", self.base, version.unwrap_or("latest"))
    }
}

#[async_trait]
impl Registry for HttpRegistry {
    async fn fetch(
        &self,
        name: &PackageName,
        version: Option<&str>,
    ) -> Result<PackageManifest, TryoutError> {
        let url = self.document_url(name, version);
        tracing::debug!(%url, "querying registry");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| TryoutError::metadata(name, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TryoutError::metadata(name, format!("registry returned {status}")));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TryoutError::metadata(name, e))?;

        PackageManifest::from_registry_value(value).map_err(|e| TryoutError::metadata(name, e))
    }
}
