//! HTTP client abstraction for testability

use std::time::Duration;

use async_trait::async_trait;

use crate::classifier::CallError;

/// HTTP response from a request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Abstraction over HTTP client for dependency injection.
///
/// A response with an error status is still `Ok` here; mapping non-2xx
/// statuses to [`CallError::Http`] is the caller's job. `Err` means no
/// usable response arrived at all.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait HttpClient: Send + Sync {
    /// Send a GET request to the given URL
    async fn get(&self, url: &str) -> Result<HttpResponse, CallError>;

    /// Send a POST request with a JSON body
    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, CallError>;

    /// Send a PUT request with a JSON body
    async fn put_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, CallError>;

    /// Send a DELETE request to the given URL
    async fn delete(&self, url: &str) -> Result<HttpResponse, CallError>;
}

/// Production HTTP client using reqwest with a bounded request timeout
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Build a client whose requests fail after `timeout`.
    ///
    /// A timed-out request surfaces as [`CallError::Network`], the same
    /// as a refused connection.
    pub fn new(timeout: Duration) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| crate::UplinkError::Http(format!("Building HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    async fn read_response(
        method: &str,
        url: &str,
        response: reqwest::Response,
    ) -> Result<HttpResponse, CallError> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| CallError::Network(format!("Reading response body: {}", e)))?;
        tracing::debug!("{} {} -> {} ({} bytes)", method, url, status, body.len());
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, CallError> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CallError::Network(format!("GET {} failed: {}", url, e)))?;
        Self::read_response("GET", url, response).await
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, CallError> {
        tracing::debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| CallError::Network(format!("POST {} failed: {}", url, e)))?;
        Self::read_response("POST", url, response).await
    }

    async fn put_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, CallError> {
        tracing::debug!("PUT {}", url);
        let response = self
            .client
            .put(url)
            .json(body)
            .send()
            .await
            .map_err(|e| CallError::Network(format!("PUT {} failed: {}", url, e)))?;
        Self::read_response("PUT", url, response).await
    }

    async fn delete(&self, url: &str) -> Result<HttpResponse, CallError> {
        tracing::debug!("DELETE {}", url);
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|e| CallError::Network(format!("DELETE {} failed: {}", url, e)))?;
        Self::read_response("DELETE", url, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A URL that will always refuse connections (port 1 is reserved and unbound)
    const UNREACHABLE_URL: &str = "http://127.0.0.1:1/test";

    fn test_client() -> ReqwestHttpClient {
        ReqwestHttpClient::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn get_connection_refused_returns_network_error() {
        let err = test_client().get(UNREACHABLE_URL).await.unwrap_err();

        match &err {
            CallError::Network(msg) => {
                assert!(
                    msg.starts_with("GET http://127.0.0.1:1/test failed:"),
                    "{msg}"
                );
            }
            other => panic!("expected CallError::Network, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn post_json_connection_refused_returns_network_error() {
        let err = test_client()
            .post_json(UNREACHABLE_URL, &serde_json::json!({"name": "North Field"}))
            .await
            .unwrap_err();

        match &err {
            CallError::Network(msg) => {
                assert!(
                    msg.starts_with("POST http://127.0.0.1:1/test failed:"),
                    "{msg}"
                );
            }
            other => panic!("expected CallError::Network, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn put_json_connection_refused_returns_network_error() {
        let err = test_client()
            .put_json(UNREACHABLE_URL, &serde_json::json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, CallError::Network(_)));
    }

    #[tokio::test]
    async fn delete_connection_refused_returns_network_error() {
        let err = test_client().delete(UNREACHABLE_URL).await.unwrap_err();

        assert!(matches!(err, CallError::Network(_)));
    }
}
