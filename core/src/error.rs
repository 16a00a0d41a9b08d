//! Error types for the polling API client.
//!
//! # Design
//! Three failure kinds reach the caller and stay distinct: the server
//! answered with a non-2xx status (`HttpStatus`), no usable response arrived
//! (`Transport`), or a 2xx body was not JSON (`Decode`). Known status codes
//! carry a `Hint`; the hint never changes which variant is returned.

use std::fmt;

use thiserror::Error;

/// Identifies one of the six API operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Register,
    Login,
    ListPolls,
    CreatePoll,
    CastVote,
    PollResults,
}

impl Endpoint {
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Register => "register",
            Endpoint::Login => "login",
            Endpoint::ListPolls => "list_polls",
            Endpoint::CreatePoll => "create_poll",
            Endpoint::CastVote => "cast_vote",
            Endpoint::PollResults => "poll_results",
        }
    }

    /// Diagnostic hint for a failed status on this endpoint, if one is known.
    pub fn hint(&self, status: u16) -> Option<Hint> {
        match (self, status) {
            (Endpoint::Register, 400) => Some(Hint::AlreadyRegistered),
            (Endpoint::Login, 400) => Some(Hint::IncorrectCredentials),
            (Endpoint::CreatePoll | Endpoint::CastVote, 401) => Some(Hint::Unauthorized),
            (Endpoint::CastVote | Endpoint::PollResults, 404) => Some(Hint::NotFound),
            _ => None,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Human-readable explanation attached to well-known failure statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hint {
    AlreadyRegistered,
    IncorrectCredentials,
    Unauthorized,
    NotFound,
}

impl Hint {
    pub fn message(&self) -> &'static str {
        match self {
            Hint::AlreadyRegistered => "username already registered",
            Hint::IncorrectCredentials => "incorrect credentials",
            Hint::Unauthorized => "unauthorized or invalid token",
            Hint::NotFound => "poll or option not found",
        }
    }
}

impl fmt::Display for Hint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Errors returned by `PollClient` parse methods and `PollApi` operations.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}{}: {body}", hint_suffix(.hint))]
    HttpStatus {
        status: u16,
        body: String,
        hint: Option<Hint>,
    },

    /// No response was received: DNS, refused connection, timeout, or a
    /// response that could not be read.
    #[error("transport failed: {0}")]
    Transport(String),

    /// A 2xx response body was not valid JSON.
    #[error("decoding response failed: {0}")]
    Decode(String),

    /// The request payload could not be serialized.
    #[error("serializing request failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// Status code for `HttpStatus` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn hint(&self) -> Option<Hint> {
        match self {
            ApiError::HttpStatus { hint, .. } => *hint,
            _ => None,
        }
    }
}

fn hint_suffix(hint: &Option<Hint>) -> String {
    hint.map(|h| format!(" ({h})")).unwrap_or_default()
}

impl From<ureq::Error> for ApiError {
    fn from(err: ureq::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}
