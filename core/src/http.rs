//! HTTP transport types and the swappable transport seam.
//!
//! # Design
//! Requests and responses are plain data. `JotformClient` builds an
//! `HttpRequest`, hands it to an `HttpTransport`, and interprets the
//! returned `HttpResponse`. Anything that can execute a request can stand in
//! for the network: `UreqTransport` for real traffic, or a closure in tests.
//!
//! Bodies are raw bytes because some endpoints return PDF files rather than
//! JSON.

use std::fmt;
use std::time::Duration;

/// Error produced by a transport. Surfaced to callers unchanged.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Largest response body the default transport will read.
const MAX_BODY_BYTES: u64 = 256 * 1024 * 1024;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully formed HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Absolute URL including any query string.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// First header value whose name matches `name` case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response with its body fully read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status < 300
    }
}

/// Executes one request and returns the complete response.
///
/// Implementations must return non-2xx responses as `Ok`; status codes are
/// interpreted by the client. Only failures to complete the exchange
/// (connect, TLS, timeout, body read) are errors.
pub trait HttpTransport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<F> HttpTransport for F
where
    F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync,
{
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self(request)
    }
}

/// Blocking transport backed by `ureq`.
///
/// Applies a global per-request timeout and keeps no idle connections, so
/// every call opens a fresh connection.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .max_idle_connections(0)
            .max_idle_connections_per_host(0)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl HttpTransport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let body = request.body.as_deref().unwrap_or_default();

        let mut response = match request.method {
            HttpMethod::Get => with_headers(self.agent.get(&request.url), &request.headers).call()?,
            HttpMethod::Delete => {
                with_headers(self.agent.delete(&request.url), &request.headers).call()?
            }
            HttpMethod::Post => {
                with_headers(self.agent.post(&request.url), &request.headers).send(body)?
            }
            HttpMethod::Put => {
                with_headers(self.agent.put(&request.url), &request.headers).send(body)?
            }
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_vec()?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_display_is_uppercase() {
        assert_eq!(HttpMethod::Get.to_string(), "GET");
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = HttpRequest {
            method: HttpMethod::Get,
            url: "https://api.jotform.com/v1/user".to_string(),
            headers: vec![("apiKey".to_string(), "secret".to_string())],
            body: None,
        };
        assert_eq!(req.header("APIKEY"), Some("secret"));
        assert_eq!(req.header("content-type"), None);
    }

    #[test]
    fn closures_act_as_transports() {
        let transport = |_: &HttpRequest| -> Result<HttpResponse, TransportError> {
            Ok(HttpResponse::new(204, Vec::new()))
        };
        let req = HttpRequest {
            method: HttpMethod::Delete,
            url: "http://localhost/v1/form/1".to_string(),
            headers: Vec::new(),
            body: None,
        };
        let resp = transport.execute(&req).unwrap();
        assert_eq!(resp.status, 204);
        assert!(resp.is_success());
    }
}
