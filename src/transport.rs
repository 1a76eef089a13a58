// JSON-over-HTTP transport used by the request pipeline

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("Client error: {0}")]
    ClientError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub params: Vec<(String, String)>,
    pub data: Option<Value>,
    pub headers: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub status: u16,
    pub data: Value,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// Port for the HTTP helper; returns any status, fails only when no response arrived
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn fetch_json(&self, url: &str, request: FetchRequest)
        -> Result<FetchResponse, TransportError>;
}

pub struct ReqwestTransport {
    http: reqwest::Client,
    timeout_ms: u64,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::ClientError(e.to_string()))?;
        Ok(Self {
            http,
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn fetch_json(
        &self,
        url: &str,
        request: FetchRequest,
    ) -> Result<FetchResponse, TransportError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        };
        let mut builder = self.http.request(method, url).query(&request.params);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(data) = &request.data {
            builder = builder.json(data);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(self.timeout_ms)
            } else {
                TransportError::NetworkError(e.to_string())
            }
        })?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::NetworkError(e.to_string()))?;

        // Non-JSON bodies are kept verbatim so callers can still report them
        let data = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        Ok(FetchResponse { status, data })
    }
}

// Canned-response transport for tests
#[cfg(test)]
pub(crate) mod mock_transport {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    #[derive(Debug, Clone)]
    pub struct RecordedRequest {
        pub method: Method,
        pub url: String,
        pub params: Vec<(String, String)>,
        pub data: Option<Value>,
        pub headers: Vec<(String, String)>,
    }

    impl RecordedRequest {
        pub fn param(&self, name: &str) -> Option<&str> {
            self.params
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        }

        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str())
        }
    }

    struct Route {
        method: Method,
        path: String,
        responses: VecDeque<Option<FetchResponse>>,
    }

    #[derive(Default)]
    pub struct MockTransport {
        routes: Mutex<Vec<Route>>,
        requests: Mutex<Vec<RecordedRequest>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        // Queued responses are served in order; the last one repeats
        pub fn respond(&self, method: Method, path: &str, status: u16, data: Value) {
            self.push(method, path, Some(FetchResponse { status, data }));
        }

        // Simulates a request that never got a response
        pub fn fail(&self, method: Method, path: &str) {
            self.push(method, path, None);
        }

        fn push(&self, method: Method, path: &str, response: Option<FetchResponse>) {
            let mut routes = self.routes.lock();
            match routes
                .iter_mut()
                .find(|route| route.method == method && route.path == path)
            {
                Some(route) => route.responses.push_back(response),
                None => routes.push(Route {
                    method,
                    path: path.to_string(),
                    responses: VecDeque::from([response]),
                }),
            }
        }

        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().clone()
        }

        pub fn requests_to(&self, method: Method, path: &str) -> Vec<RecordedRequest> {
            self.requests()
                .into_iter()
                .filter(|r| r.method == method && r.url.contains(path))
                .collect()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn fetch_json(
            &self,
            url: &str,
            request: FetchRequest,
        ) -> Result<FetchResponse, TransportError> {
            self.requests.lock().push(RecordedRequest {
                method: request.method,
                url: url.to_string(),
                params: request.params.clone(),
                data: request.data.clone(),
                headers: request.headers.clone(),
            });

            let mut routes = self.routes.lock();
            let route = routes
                .iter_mut()
                .filter(|route| route.method == request.method && url.contains(&route.path))
                .max_by_key(|route| route.path.len());
            let response = match route {
                Some(route) if route.responses.len() > 1 => route.responses.pop_front().flatten(),
                Some(route) => route.responses.front().cloned().flatten(),
                None => Some(FetchResponse {
                    status: 404,
                    data: Value::Null,
                }),
            };
            response.ok_or_else(|| TransportError::NetworkError("connection reset".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock_transport::MockTransport;
    use super::*;
    use serde_json::json;

    fn get() -> FetchRequest {
        FetchRequest {
            method: Method::Get,
            params: vec![],
            data: None,
            headers: vec![],
        }
    }

    #[tokio::test]
    async fn test_mock_transport_serves_queue_then_repeats_last() {
        let transport = MockTransport::new();
        transport.respond(Method::Get, "/a", 500, json!({}));
        transport.respond(Method::Get, "/a", 200, json!({"ok": true}));

        let first = transport.fetch_json("https://x/a", get()).await.unwrap();
        let second = transport.fetch_json("https://x/a", get()).await.unwrap();
        let third = transport.fetch_json("https://x/a", get()).await.unwrap();
        assert_eq!(first.status, 500);
        assert!(second.is_success());
        assert_eq!(third, second);
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_mock_transport_prefers_longest_path_and_defaults_to_404() {
        let transport = MockTransport::new();
        transport.respond(Method::Get, "/api", 200, json!("short"));
        transport.respond(Method::Get, "/api/v1/guests", 200, json!("long"));
        transport.fail(Method::Delete, "/api");

        let long = transport
            .fetch_json("https://x/api/v1/guests", get())
            .await
            .unwrap();
        assert_eq!(long.data, json!("long"));

        let missing = transport.fetch_json("https://x/other", get()).await.unwrap();
        assert_eq!(missing.status, 404);

        let delete = FetchRequest {
            method: Method::Delete,
            ..get()
        };
        assert!(transport.fetch_json("https://x/api", delete).await.is_err());
    }

    #[test]
    fn test_reported_timeout_saturates() {
        let transport = ReqwestTransport::new(Duration::from_millis(2500)).unwrap();
        assert_eq!(transport.timeout_ms, 2500);

        let transport = ReqwestTransport::new(Duration::MAX).unwrap();
        assert_eq!(transport.timeout_ms, u64::MAX);
    }
}
