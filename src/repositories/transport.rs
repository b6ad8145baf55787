use async_trait::async_trait;
use log::error;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::errors::{Error, Result, TransportError};
use crate::repositories::repository_traits::EntityKind;

/// Per-entity HTTP collaborator: CRUD over a REST resource, returning
/// parsed JSON. The remote repositories depend on this seam, never on the
/// HTTP client directly, so tests can substitute a recording double.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn create(&self, resource: &str, body: Value) -> Result<Value>;
    async fn get_all(&self, resource: &str) -> Result<Value>;
    async fn get_by_id(&self, resource: &str, id: &str) -> Result<Value>;
    async fn update(&self, resource: &str, id: &str, body: Value) -> Result<Value>;
    async fn delete(&self, resource: &str, id: &str) -> Result<Value>;
}

/// reqwest-backed transport against `<base_url>/<resource>[/<id>]` with
/// JSON bodies, snake_case field names on the wire.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpTransport {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn collection_url(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url, resource)
    }

    fn item_url(&self, resource: &str, id: &str) -> String {
        format!("{}/{}/{}", self.base_url, resource, id)
    }

    fn kind_for(resource: &str) -> EntityKind {
        match resource {
            "categories" => EntityKind::Category,
            "budgets" => EntityKind::Budget,
            "users" => EntityKind::User,
            _ => EntityKind::Transaction,
        }
    }

    async fn decode(
        url: &str,
        kind: EntityKind,
        id: Option<&str>,
        response: reqwest::Response,
    ) -> Result<Value> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(kind, id.unwrap_or_default().to_string()));
        }
        if !status.is_success() {
            error!("Unexpected status {} from {}", status, url);
            return Err(TransportError::UnexpectedStatus {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        response.json::<Value>().await.map_err(|e| {
            TransportError::DecodeFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    fn request_failed(url: &str, e: reqwest::Error) -> Error {
        TransportError::RequestFailed {
            url: url.to_string(),
            reason: e.to_string(),
        }
        .into()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn create(&self, resource: &str, body: Value) -> Result<Value> {
        let url = self.collection_url(resource);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::request_failed(&url, e))?;
        Self::decode(&url, Self::kind_for(resource), None, response).await
    }

    async fn get_all(&self, resource: &str) -> Result<Value> {
        let url = self.collection_url(resource);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::request_failed(&url, e))?;
        Self::decode(&url, Self::kind_for(resource), None, response).await
    }

    async fn get_by_id(&self, resource: &str, id: &str) -> Result<Value> {
        let url = self.item_url(resource, id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::request_failed(&url, e))?;
        Self::decode(&url, Self::kind_for(resource), Some(id), response).await
    }

    async fn update(&self, resource: &str, id: &str, body: Value) -> Result<Value> {
        let url = self.item_url(resource, id);
        let response = self
            .client
            .patch(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::request_failed(&url, e))?;
        Self::decode(&url, Self::kind_for(resource), Some(id), response).await
    }

    async fn delete(&self, resource: &str, id: &str) -> Result<Value> {
        let url = self.item_url(resource, id);
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| Self::request_failed(&url, e))?;
        Self::decode(&url, Self::kind_for(resource), Some(id), response).await
    }
}
