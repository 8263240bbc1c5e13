//! Runtime configuration for the backend transport.

use std::time::Duration;

/// Where and how to reach the execution backend.
///
/// Resolution order for the endpoint: explicit value, then the
/// `LOOMFLOW_ENDPOINT` environment variable (a `.env` file is honored),
/// then the local development default.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Base URL of the execution backend, without a trailing slash.
    pub endpoint: String,
    /// Timeout for establishing the run request connection. Never applied
    /// to the event stream itself, which stays open for the whole run.
    pub connect_timeout: Duration,
}

impl RuntimeConfig {
    pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8787";
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    fn resolve_endpoint(provided: Option<String>) -> String {
        if let Some(endpoint) = provided {
            return endpoint;
        }
        dotenvy::dotenv().ok();
        std::env::var("LOOMFLOW_ENDPOINT").unwrap_or_else(|_| Self::DEFAULT_ENDPOINT.to_string())
    }

    /// Configuration with an explicit endpoint.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: Self::resolve_endpoint(Some(endpoint.into())),
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// URL the run request is posted to.
    #[must_use]
    pub fn run_url(&self) -> String {
        format!("{}/api/runs", self.endpoint.trim_end_matches('/'))
    }

    /// URL that cancels the given execution.
    #[must_use]
    pub fn stop_url(&self, execution_id: &str) -> String {
        format!(
            "{}/api/runs/{execution_id}/stop",
            self.endpoint.trim_end_matches('/')
        )
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            endpoint: Self::resolve_endpoint(None),
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_tolerate_trailing_slash() {
        let config = RuntimeConfig::new("http://host:9000/");
        assert_eq!(config.run_url(), "http://host:9000/api/runs");
        assert_eq!(config.stop_url("e1"), "http://host:9000/api/runs/e1/stop");
    }
}
