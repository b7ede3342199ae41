//! JSON-RPC over HTTP POST.
//!
//! Connection failures, timeouts and non-2xx statuses are transient and go
//! through the retry budget. An error envelope is a real answer from the node
//! and is handed back untouched.

use std::time::Duration;

use async_trait::async_trait;

use stackwatch_core::error::TransportError;
use stackwatch_core::policy::{RetryConfig, RetryPolicy};
use stackwatch_core::request::{JsonRpcRequest, JsonRpcResponse};
use stackwatch_core::transport::RpcTransport;

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub retry: RetryConfig,
    /// Covers connect, send and body read of a single attempt. `None` waits
    /// for as long as the endpoint takes.
    pub request_timeout: Option<Duration>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            request_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl HttpClientConfig {
    /// For endpoints that answer only once a person acts, such as a wallet
    /// prompt: one attempt and no timeout, so the prompt is never re-sent.
    pub fn interactive() -> Self {
        Self {
            retry: RetryConfig::none(),
            request_timeout: None,
        }
    }
}

pub struct HttpRpcClient {
    url: String,
    http: reqwest::Client,
    retry: RetryPolicy,
    request_timeout: Option<Duration>,
}

impl HttpRpcClient {
    pub fn new(url: impl Into<String>, config: HttpClientConfig) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;
        Ok(Self {
            url: url.into(),
            http,
            retry: RetryPolicy::new(config.retry),
            request_timeout: config.request_timeout,
        })
    }

    pub fn default_for(url: impl Into<String>) -> Result<Self, TransportError> {
        Self::new(url, HttpClientConfig::default())
    }

    fn transport_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout {
                ms: self.request_timeout.map_or(0, |t| t.as_millis() as u64),
            }
        } else {
            TransportError::Http(err.to_string())
        }
    }

    async fn post(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        let resp = self
            .http
            .post(&self.url)
            .json(req)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(TransportError::Http(format!("HTTP {}: {detail}", status.as_u16())));
        }

        let body = resp.bytes().await.map_err(|e| self.transport_error(e))?;
        serde_json::from_slice(&body).map_err(TransportError::Deserialization)
    }
}

#[async_trait]
impl RpcTransport for HttpRpcClient {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        let mut attempt = 1u32;
        loop {
            let err = match self.post(&req).await {
                Ok(resp) => return Ok(resp),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => e,
            };
            let Some(delay) = self.retry.next_delay(attempt) else {
                tracing::debug!(url = %self.url, method = %req.method, attempt, error = %err, "retry budget spent");
                return Err(err);
            };
            tracing::warn!(
                url = %self.url,
                method = %req.method,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "transient HTTP failure, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    fn url(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// Accepts connections and reads requests but never answers. Returns the
    /// endpoint URL and a count of POSTs received.
    async fn silent_endpoint() -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let posts = Arc::new(AtomicUsize::new(0));
        let seen = posts.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let seen = seen.clone();
                tokio::spawn(async move {
                    let mut buf = [0u8; 8192];
                    while let Ok(n) = socket.read(&mut buf).await {
                        if n == 0 {
                            return;
                        }
                        if buf[..n].starts_with(b"POST ") {
                            seen.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                });
            }
        });
        (url, posts)
    }

    #[test]
    fn default_client_targets_url() {
        let client = HttpRpcClient::default_for("http://127.0.0.1:8545").unwrap();
        assert_eq!(client.url(), "http://127.0.0.1:8545");
        assert_eq!(client.request_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn interactive_config_never_times_out_or_retries() {
        let config = HttpClientConfig::interactive();
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.retry.max_retries, 0);
    }

    #[tokio::test]
    async fn closed_port_is_transient() {
        let client = HttpRpcClient::new(
            "http://127.0.0.1:9",
            HttpClientConfig {
                retry: RetryConfig::none(),
                request_timeout: Some(Duration::from_secs(2)),
            },
        )
        .unwrap();
        let err = client
            .send(JsonRpcRequest::new(1, "eth_chainId", vec![]))
            .await
            .unwrap_err();
        assert!(err.is_retryable(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn timed_out_attempts_are_sent_again() {
        let (url, posts) = silent_endpoint().await;
        let client = HttpRpcClient::new(
            url,
            HttpClientConfig {
                retry: RetryConfig::bounded(2, Duration::from_millis(10), Duration::from_millis(10)),
                request_timeout: Some(Duration::from_millis(200)),
            },
        )
        .unwrap();
        let err = client
            .send(JsonRpcRequest::new(1, "eth_chainId", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Timeout { ms: 200 }), "{err}");
        assert_eq!(posts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn interactive_client_sends_once_and_keeps_waiting() {
        let (url, posts) = silent_endpoint().await;
        let client = HttpRpcClient::new(url, HttpClientConfig::interactive()).unwrap();
        let pending = tokio::time::timeout(
            Duration::from_secs(1),
            client.send(JsonRpcRequest::new(1, "wallet_addEthereumChain", vec![])),
        )
        .await;
        assert!(pending.is_err(), "request must still be waiting");
        assert_eq!(posts.load(Ordering::SeqCst), 1);
    }
}
