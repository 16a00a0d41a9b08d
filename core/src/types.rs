//! Payloads for the polling API.
//!
//! # Design
//! Request payloads are serialized exactly as the server expects them, with
//! fields in declaration order. Response shapes are owned by the server; the
//! client returns raw `serde_json::Value`s and only offers typed views
//! (`Poll`, `AuthToken::from_login`) for callers that want them.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_SKIP: u32 = 0;
pub const DEFAULT_LIMIT: u32 = 10;

/// Username and password, built per call and never retained.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Request payload for creating a poll.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewPoll {
    pub question: String,
    pub options: Vec<String>,
}

impl NewPoll {
    pub fn new<I, S>(question: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            question: question.into(),
            options: options.into_iter().map(Into::into).collect(),
        }
    }
}

/// Request payload for casting a vote.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vote {
    pub option_id: i64,
}

/// Pagination for `list_polls`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPage {
    pub skip: u32,
    pub limit: u32,
}

impl Default for PollPage {
    fn default() -> Self {
        Self {
            skip: DEFAULT_SKIP,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Opaque bearer token returned by login.
///
/// `Debug` is redacted so tokens do not leak into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Extract `access_token` from a login response. Missing, non-string and
    /// empty values all yield `None`.
    pub fn from_login(response: &Value) -> Option<Self> {
        response
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(Self::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// A poll as returned by create-poll and list-polls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Poll {
    pub id: i64,
    pub question: String,
    #[serde(default)]
    pub options: Vec<PollOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollOption {
    pub id: i64,
    pub text: String,
}
