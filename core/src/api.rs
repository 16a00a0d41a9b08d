//! One blocking call per polling API operation.
//!
//! # Design
//! `PollApi` pairs a `PollClient` with a `Transport`: build, execute, parse.
//! It holds no mutable state, so a single instance can be shared across
//! threads when the transport allows it. Errors from any stage propagate
//! unchanged; nothing is retried.

use serde_json::Value;

use crate::client::PollClient;
use crate::config::ClientConfig;
use crate::error::{ApiError, Endpoint};
use crate::http::HttpRequest;
use crate::transport::{Transport, UreqTransport};
use crate::types::{AuthToken, Credentials, NewPoll, PollPage, Vote};

#[derive(Debug, Clone)]
pub struct PollApi<T = UreqTransport> {
    client: PollClient,
    transport: T,
}

impl Default for PollApi<UreqTransport> {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

impl PollApi<UreqTransport> {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            client: PollClient::new(&config.base_url),
            transport: UreqTransport::new(config.timeout),
        }
    }
}

impl<T: Transport> PollApi<T> {
    /// Use a custom transport, e.g. a recording stub in tests.
    pub fn with_transport(base_url: &str, transport: T) -> Self {
        Self {
            client: PollClient::new(base_url),
            transport,
        }
    }

    pub fn client(&self) -> &PollClient {
        &self.client
    }

    pub fn register(&self, username: &str, password: &str) -> Result<Value, ApiError> {
        let request = self
            .client
            .build_register(&Credentials::new(username, password))?;
        self.call(Endpoint::Register, request)
    }

    /// Returns the raw login response; see `AuthToken::from_login`.
    pub fn login(&self, username: &str, password: &str) -> Result<Value, ApiError> {
        let request = self.client.build_login(&Credentials::new(username, password));
        self.call(Endpoint::Login, request)
    }

    pub fn list_polls(&self, skip: u32, limit: u32) -> Result<Value, ApiError> {
        self.list_polls_page(PollPage { skip, limit })
    }

    pub fn list_polls_page(&self, page: PollPage) -> Result<Value, ApiError> {
        let request = self.client.build_list_polls(page);
        self.call(Endpoint::ListPolls, request)
    }

    pub fn create_poll<S: AsRef<str>>(
        &self,
        question: &str,
        options: &[S],
        token: &AuthToken,
    ) -> Result<Value, ApiError> {
        let poll = NewPoll::new(question, options.iter().map(|o| o.as_ref()));
        let request = self.client.build_create_poll(&poll, token)?;
        self.call(Endpoint::CreatePoll, request)
    }

    pub fn cast_vote(
        &self,
        poll_id: i64,
        option_id: i64,
        token: &AuthToken,
    ) -> Result<Value, ApiError> {
        let request = self
            .client
            .build_cast_vote(poll_id, Vote { option_id }, token)?;
        self.call(Endpoint::CastVote, request)
    }

    pub fn poll_results(&self, poll_id: i64) -> Result<Value, ApiError> {
        let request = self.client.build_poll_results(poll_id);
        self.call(Endpoint::PollResults, request)
    }

    fn call(&self, endpoint: Endpoint, request: HttpRequest) -> Result<Value, ApiError> {
        let response = self.transport.execute(request).inspect_err(|err| {
            tracing::warn!(endpoint = endpoint.name(), error = %err, "request did not complete");
        })?;
        self.client.parse(endpoint, response)
    }
}
