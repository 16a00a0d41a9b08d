//! Stateless HTTP request builder and response parser for the polling API.
//!
//! # Design
//! `PollClient` holds only a `base_url` and carries no mutable state between
//! calls. Each operation has a `build_*` method producing an `HttpRequest`;
//! every response goes through `parse`, which applies the same
//! status/decode rules to all endpoints. The caller (usually `PollApi`)
//! executes the round-trip in between.

use serde::Serialize;
use serde_json::Value;

use crate::config::DEFAULT_BASE_URL;
use crate::error::{ApiError, Endpoint};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{AuthToken, Credentials, NewPoll, PollPage, Vote};

const CONTENT_TYPE: &str = "content-type";
const AUTHORIZATION: &str = "authorization";
const JSON: &str = "application/json";
const FORM: &str = "application/x-www-form-urlencoded";

/// Synchronous, stateless request builder / response parser.
#[derive(Debug, Clone)]
pub struct PollClient {
    base_url: String,
}

impl Default for PollClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl PollClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_register(&self, credentials: &Credentials) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: format!("{}/register", self.base_url),
            headers: vec![header(CONTENT_TYPE, JSON)],
            body: Some(to_json(credentials)?),
        })
    }

    /// Login is the one form-encoded endpoint.
    pub fn build_login(&self, credentials: &Credentials) -> HttpRequest {
        let body = format!(
            "username={}&password={}",
            urlencoding::encode(&credentials.username),
            urlencoding::encode(&credentials.password)
        );
        HttpRequest {
            method: HttpMethod::Post,
            url: format!("{}/login", self.base_url),
            headers: vec![header(CONTENT_TYPE, FORM)],
            body: Some(body),
        }
    }

    pub fn build_list_polls(&self, page: PollPage) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: format!(
                "{}/polls?skip={}&limit={}",
                self.base_url, page.skip, page.limit
            ),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_create_poll(
        &self,
        poll: &NewPoll,
        token: &AuthToken,
    ) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: format!("{}/polls", self.base_url),
            headers: vec![header(CONTENT_TYPE, JSON), header(AUTHORIZATION, &token.bearer())],
            body: Some(to_json(poll)?),
        })
    }

    pub fn build_cast_vote(
        &self,
        poll_id: i64,
        vote: Vote,
        token: &AuthToken,
    ) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: format!("{}/polls/{poll_id}/vote", self.base_url),
            headers: vec![header(CONTENT_TYPE, JSON), header(AUTHORIZATION, &token.bearer())],
            body: Some(to_json(&vote)?),
        })
    }

    pub fn build_poll_results(&self, poll_id: i64) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: format!("{}/polls/{poll_id}/results", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Turn a response into the JSON body, or the matching `ApiError`.
    ///
    /// Any 2xx is success and the body is returned unchanged. A non-2xx
    /// status yields `HttpStatus` with the endpoint's hint, if any.
    pub fn parse(&self, endpoint: Endpoint, response: HttpResponse) -> Result<Value, ApiError> {
        check_status(endpoint, &response)?;
        serde_json::from_slice(&response.body).map_err(|e| {
            tracing::debug!(
                endpoint = endpoint.name(),
                status = response.status,
                content_type = response.header(CONTENT_TYPE).unwrap_or("none"),
                "response body is not JSON"
            );
            ApiError::Decode(e.to_string())
        })
    }
}

fn header(name: &str, value: &str) -> (String, String) {
    (name.to_string(), value.to_string())
}

fn to_json<T: Serialize>(payload: &T) -> Result<String, ApiError> {
    serde_json::to_string(payload).map_err(|e| ApiError::Serialization(e.to_string()))
}

fn check_status(endpoint: Endpoint, response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    let hint = endpoint.hint(response.status);
    match hint {
        Some(hint) => tracing::warn!(
            endpoint = endpoint.name(),
            status = response.status,
            hint = hint.message(),
            "request failed"
        ),
        None => tracing::debug!(
            endpoint = endpoint.name(),
            status = response.status,
            "request failed"
        ),
    }
    Err(ApiError::HttpStatus {
        status: response.status,
        body: response.body_text(),
        hint,
    })
}
