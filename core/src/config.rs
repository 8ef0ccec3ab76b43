//! Client configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ApiError;

/// Public Jotform API origin.
pub const DEFAULT_BASE_URL: &str = "https://api.jotform.com";

/// Path segment inserted between the base URL and every resource path.
pub const API_VERSION: &str = "v1";

/// Request timeout used by the default transport.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Response format requested from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputType {
    #[default]
    Json,
    Xml,
}

impl OutputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputType::Json => "json",
            OutputType::Xml => "xml",
        }
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputType::Json),
            "xml" => Ok(OutputType::Xml),
            other => Err(ApiError::InvalidConfig(format!(
                "unknown output type '{other}', expected 'json' or 'xml'"
            ))),
        }
    }
}

/// Configuration for `JotformClient`.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API key sent with every request in the `apiKey` header
    pub api_key: String,
    /// API origin (default: `https://api.jotform.com`)
    pub base_url: String,
    /// Response format (default: JSON)
    pub output_type: OutputType,
    /// Log every request URL and parameter set
    pub debug: bool,
    /// Timeout applied by the default transport (default: 60s)
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            output_type: OutputType::Json,
            debug: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Point the client at another origin, e.g. an enterprise deployment.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_output_type(mut self, output_type: OutputType) -> Self {
        self.output_type = output_type;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check required fields and normalize the base URL.
    pub(crate) fn validated(mut self) -> Result<Self, ApiError> {
        if self.api_key.trim().is_empty() {
            return Err(ApiError::InvalidConfig("API key must not be empty".to_string()));
        }
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();
        if self.base_url.is_empty() {
            return Err(ApiError::InvalidConfig("base URL must not be empty".to_string()));
        }
        Ok(self)
    }
}

// The API key stays out of debug output.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("output_type", &self.output_type)
            .field("debug", &self.debug)
            .field("timeout", &self.timeout)
            .finish()
    }
}
