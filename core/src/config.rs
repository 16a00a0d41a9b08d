//! Client configuration.
//!
//! The base URL is an explicit value carried from construction, never a
//! default argument on individual calls. The timeout applies at the
//! transport boundary and covers the whole request.

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
