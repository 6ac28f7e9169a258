//! REST client for the AgroSmart domain resources
//!
//! Farms, fields, crops, schedules, weather records, smart insights and
//! users are all plain CRUD resources; payloads are opaque JSON. Every
//! failure is routed through the connectivity store's `handle_api_error`
//! so the connectivity-vs-application distinction is made in one place.

use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::classifier::{CallError, Classification, SERVER_UNREACHABLE_MESSAGE};
use crate::io::{HttpClient, HttpResponse};
use crate::state::StoreHandle;

/// Result of a domain call: the payload, or a classification the screen
/// can render (offline state, local error message, or nothing for a
/// cancellation).
pub type ApiResult = std::result::Result<Value, Classification>;

pub struct AgroClient {
    base_url: String,
    http: Arc<dyn HttpClient>,
    store: StoreHandle,
}

impl AgroClient {
    pub fn new(base_url: &str, http: Arc<dyn HttpClient>, store: StoreHandle) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            store,
        }
    }

    fn collection_url(&self, resource: &str) -> String {
        format!("{}/api/{}", self.base_url, resource)
    }

    fn item_url(&self, resource: &str, id: &str) -> String {
        format!("{}/api/{}/{}", self.base_url, resource, id)
    }

    /// List a resource collection.
    ///
    /// Gated on the initial connectivity check: no request goes out
    /// before the first probe completes, and a known-offline backend is
    /// reported without a request at all.
    pub async fn list(&self, resource: &str, cancel: &CancellationToken) -> ApiResult {
        self.store.wait_until_checked().await;
        if !self.store.snapshot().server_online {
            return Err(Classification::ServerDown {
                message: SERVER_UNREACHABLE_MESSAGE.to_string(),
            });
        }

        let url = self.collection_url(resource);
        let result = tokio::select! {
            _ = cancel.cancelled() => Err(CallError::Cancelled),
            r = self.http.get(&url) => r,
        };
        self.complete(result)
    }

    pub async fn get(&self, resource: &str, id: &str, cancel: &CancellationToken) -> ApiResult {
        let url = self.item_url(resource, id);
        let result = tokio::select! {
            _ = cancel.cancelled() => Err(CallError::Cancelled),
            r = self.http.get(&url) => r,
        };
        self.complete(result)
    }

    pub async fn create(
        &self,
        resource: &str,
        payload: &Value,
        cancel: &CancellationToken,
    ) -> ApiResult {
        let url = self.collection_url(resource);
        let result = tokio::select! {
            _ = cancel.cancelled() => Err(CallError::Cancelled),
            r = self.http.post_json(&url, payload) => r,
        };
        self.complete(result)
    }

    pub async fn update(
        &self,
        resource: &str,
        id: &str,
        payload: &Value,
        cancel: &CancellationToken,
    ) -> ApiResult {
        let url = self.item_url(resource, id);
        let result = tokio::select! {
            _ = cancel.cancelled() => Err(CallError::Cancelled),
            r = self.http.put_json(&url, payload) => r,
        };
        self.complete(result)
    }

    pub async fn delete(&self, resource: &str, id: &str, cancel: &CancellationToken) -> ApiResult {
        let url = self.item_url(resource, id);
        let result = tokio::select! {
            _ = cancel.cancelled() => Err(CallError::Cancelled),
            r = self.http.delete(&url) => r,
        };
        self.complete(result)
    }

    fn complete(&self, result: Result<HttpResponse, CallError>) -> ApiResult {
        let response = match result {
            Ok(response) => response,
            Err(error) => return Err(self.store.handle_api_error(&error)),
        };

        if response.status >= 400 {
            let error = CallError::Http {
                status: response.status,
                body: response.body,
            };
            return Err(self.store.handle_api_error(&error));
        }

        if response.body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&response.body).map_err(|e| {
            tracing::debug!("Unparseable success body: {}", e);
            Classification::Application {
                status: response.status,
                message: crate::classifier::GENERIC_ERROR_MESSAGE.to_string(),
            }
        })
    }
}
