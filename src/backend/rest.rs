//! PostgREST-style HTTP backend.
//!
//! Talks to `{url}/rest/v1/{table}` with the project key sent both as
//! `apikey` and as a bearer token.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Request, Response};
use serde_json::Value;
use tracing::debug;

use super::{RemoteStore, Table};
use crate::config::BackendConfig;
use crate::error::{CrmError, IntoCrmError, Result};

const REST_PATH: &str = "rest/v1";

/// HTTP client for a hosted table backend.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
}

impl RestStore {
    /// Build a client from a configured backend. Fails if the URL or key is
    /// missing.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        config.validate()?;
        let (Some(base_url), Some(key)) = (config.base_url(), config.anon_key.as_deref()) else {
            return Err(CrmError::config("backend url and key are required for live mode"));
        };

        let client = Client::builder()
            .default_headers(auth_headers(key)?)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .into_crm_config()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/{REST_PATH}/{}", self.base_url, table.name())
    }

    pub(crate) fn select_request(&self, table: Table, column: &str, descending: bool) -> Result<Request> {
        let direction = if descending { "desc" } else { "asc" };
        self.client
            .get(self.table_url(table))
            .query(&[("select", "*".to_string()), ("order", format!("{column}.{direction}"))])
            .build()
            .into_crm_backend(table.name())
    }

    pub(crate) fn insert_request(&self, table: Table, row: &Value) -> Result<Request> {
        self.client
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .json(row)
            .build()
            .into_crm_backend(table.name())
    }

    pub(crate) fn update_request(&self, table: Table, id: &str, row: &Value) -> Result<Request> {
        self.client
            .patch(self.table_url(table))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(row)
            .build()
            .into_crm_backend(table.name())
    }

    pub(crate) fn delete_request(&self, table: Table, id: &str) -> Result<Request> {
        self.client
            .request(Method::DELETE, self.table_url(table))
            .query(&[("id", format!("eq.{id}"))])
            .build()
            .into_crm_backend(table.name())
    }

    async fn send(&self, table: Table, request: Request) -> Result<Response> {
        debug!("{} {}", request.method(), request.url());
        let response = self.client.execute(request).await.into_crm_backend(table.name())?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CrmError::BackendStatus {
                table: table.name().to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn rows(&self, table: Table, response: Response) -> Result<Vec<Value>> {
        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| CrmError::decode(table.name(), format!("expected a row array: {e}")))
    }

    async fn first_row(&self, table: Table, response: Response) -> Result<Value> {
        self.rows(table, response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CrmError::decode(table.name(), "no row returned"))
    }
}

fn auth_headers(key: &str) -> Result<HeaderMap> {
    let invalid = |e: reqwest::header::InvalidHeaderValue| CrmError::InvalidConfig {
        field: "backend.anonKey".to_string(),
        reason: e.to_string(),
    };

    let mut headers = HeaderMap::new();
    headers.insert("apikey", HeaderValue::from_str(key).map_err(invalid)?);
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {key}")).map_err(invalid)?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

#[async_trait]
impl RemoteStore for RestStore {
    async fn select_ordered(&self, table: Table, column: &str, descending: bool) -> Result<Vec<Value>> {
        let request = self.select_request(table, column, descending)?;
        let response = self.send(table, request).await?;
        self.rows(table, response).await
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value> {
        let request = self.insert_request(table, &row)?;
        let response = self.send(table, request).await?;
        self.first_row(table, response).await
    }

    async fn update(&self, table: Table, id: &str, row: Value) -> Result<Value> {
        let request = self.update_request(table, id, &row)?;
        let response = self.send(table, request).await?;
        self.first_row(table, response).await
    }

    async fn delete(&self, table: Table, id: &str) -> Result<()> {
        let request = self.delete_request(table, id)?;
        self.send(table, request).await?;
        Ok(())
    }
}
