//! External tabular store access
//!
//! Batch mode reads its work list from an HTTP tabular store: one row per
//! tenant with a display name, a target URL, and an optional selector (or
//! markup fragment) hint. Rows are consumed read-only.

use crate::batch::BatchError;
use serde::Deserialize;
use std::time::Duration;

/// Environment variable carrying the store's service URL
pub const STORE_URL_VAR: &str = "DEMENTOR_STORE_URL";

/// Environment variable carrying the store's access key
pub const STORE_KEY_VAR: &str = "DEMENTOR_STORE_KEY";

/// Table queried for tenant rows
const TENANTS_TABLE: &str = "tenants";

/// One tenant row from the store
#[derive(Debug, Clone, Deserialize)]
pub struct TenantRow {
    /// Display name; slugified into the per-tenant sitemap filename
    pub name: String,

    /// Target page URL
    pub url: String,

    /// Optional selector or markup-fragment hint restricting extraction
    #[serde(default)]
    pub selector: Option<String>,
}

/// Read-only client for the tenant store
pub struct BatchStore {
    service_url: String,
    access_key: String,
}

impl BatchStore {
    /// Builds a store client from the environment
    ///
    /// Returns `None` unless both the service URL and the access key are
    /// present; their presence is what switches the top level into batch
    /// mode.
    pub fn from_env() -> Option<Self> {
        let service_url = std::env::var(STORE_URL_VAR).ok()?;
        let access_key = std::env::var(STORE_KEY_VAR).ok()?;

        if service_url.trim().is_empty() || access_key.trim().is_empty() {
            return None;
        }

        Some(Self {
            service_url: service_url.trim_end_matches('/').to_string(),
            access_key,
        })
    }

    /// Creates a client against an explicit endpoint (tests)
    pub fn new(service_url: &str, access_key: &str) -> Self {
        Self {
            service_url: service_url.trim_end_matches('/').to_string(),
            access_key: access_key.to_string(),
        }
    }

    /// Fetches all tenant rows
    pub async fn fetch_rows(&self) -> Result<Vec<TenantRow>, BatchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        let url = format!(
            "{}/rest/v1/{}?select=name,url,selector",
            self.service_url, TENANTS_TABLE
        );

        let response = client
            .get(&url)
            .header("apikey", &self.access_key)
            .bearer_auth(&self.access_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BatchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let rows: Vec<TenantRow> = serde_json::from_str(&body)?;
        tracing::info!("Store returned {} tenant rows", rows.len());
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_row_deserialization() {
        let row: TenantRow = serde_json::from_str(
            r#"{"name": "Acme Dental", "url": "https://acme.test/", "selector": "div.list"}"#,
        )
        .unwrap();
        assert_eq!(row.name, "Acme Dental");
        assert_eq!(row.selector.as_deref(), Some("div.list"));
    }

    #[test]
    fn test_row_selector_optional() {
        let row: TenantRow =
            serde_json::from_str(r#"{"name": "Acme", "url": "https://acme.test/"}"#).unwrap();
        assert!(row.selector.is_none());
    }

    #[test]
    fn test_from_env_requires_both_variables() {
        std::env::remove_var(STORE_URL_VAR);
        std::env::remove_var(STORE_KEY_VAR);
        assert!(BatchStore::from_env().is_none());

        std::env::set_var(STORE_URL_VAR, "https://store.test");
        assert!(BatchStore::from_env().is_none());

        std::env::set_var(STORE_KEY_VAR, "secret");
        assert!(BatchStore::from_env().is_some());

        std::env::remove_var(STORE_URL_VAR);
        std::env::remove_var(STORE_KEY_VAR);
    }

    #[tokio::test]
    async fn test_fetch_rows_sends_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/tenants"))
            .and(header("apikey", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"[{"name": "A", "url": "https://a.test/", "selector": null}]"#,
            ))
            .mount(&server)
            .await;

        let store = BatchStore::new(&server.uri(), "secret");
        let rows = store.fetch_rows().await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "A");
    }

    #[tokio::test]
    async fn test_fetch_rows_surfaces_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let store = BatchStore::new(&server.uri(), "wrong");
        let result = store.fetch_rows().await;

        assert!(matches!(result, Err(BatchError::Status(401))));
    }
}
