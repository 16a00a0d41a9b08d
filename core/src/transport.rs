//! The I/O seam between `PollClient` and the network.
//!
//! # Design
//! `Transport` executes one `HttpRequest` and hands back whatever the server
//! said, including 4xx/5xx statuses. Only failures to obtain a response are
//! errors here, and they are always `ApiError::Transport`. Status
//! interpretation stays in `PollClient::parse`.
//!
//! Bodies are read as bytes. Error bodies are truncated rather than
//! rejected, so an oversized or non-UTF-8 error page still reaches the
//! caller as `HttpStatus`.

use std::fmt;
use std::io::Read;
use std::time::Duration;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Largest 2xx body accepted.
pub const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;
/// Non-2xx bodies are cut off here; they are only diagnostic.
pub const MAX_ERROR_BODY_BYTES: u64 = 1024 * 1024;

/// Executes a single HTTP round-trip.
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Blocking transport backed by a `ureq` agent.
///
/// The agent is configured so 4xx/5xx responses come back as data rather
/// than `Err`. Cloning shares the underlying connection pool.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

impl UreqTransport {
    pub fn new(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        tracing::debug!(method = request.method.as_str(), url = %request.url, "sending request");

        let mut response = match request.method {
            HttpMethod::Get => {
                let mut builder = self.agent.get(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()?
            }
            HttpMethod::Post => {
                let mut builder = self.agent.post(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                match &request.body {
                    Some(body) => builder.send(body.as_bytes())?,
                    None => builder.send_empty()?,
                }
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
        let body = if (200..300).contains(&status) {
            response
                .body_mut()
                .with_config()
                .limit(MAX_BODY_BYTES)
                .read_to_vec()?
        } else {
            let mut body = Vec::new();
            response
                .body_mut()
                .as_reader()
                .take(MAX_ERROR_BODY_BYTES)
                .read_to_end(&mut body)
                .map_err(|e| ApiError::Transport(e.to_string()))?;
            body
        };

        tracing::debug!(status, url = %request.url, "received response");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
