//! Synchronous client for the polling service API.
//!
//! # Overview
//! Wraps the six endpoints of the polling service: register, login, list
//! polls, create poll, cast vote and poll results. Every operation is one
//! blocking HTTP call that returns the response JSON unchanged or an
//! `ApiError`.
//!
//! # Design
//! - `PollClient` is stateless and does no I/O; it builds `HttpRequest`
//!   values and parses `HttpResponse` values.
//! - `Transport` executes the round-trip. `UreqTransport` is the default.
//! - `PollApi` composes the two into one call per operation.
//! - Known failure statuses carry a `Hint`, logged through `tracing`, but the
//!   error still reaches the caller.
//!
//! ```no_run
//! use poll_core::{AuthToken, ClientConfig, PollApi};
//!
//! # fn main() -> Result<(), poll_core::ApiError> {
//! let api = PollApi::from_config(&ClientConfig::default());
//! api.register("alice", "s3cret")?;
//! let login = api.login("alice", "s3cret")?;
//! let token = AuthToken::from_login(&login).expect("login returns a token");
//! let poll = api.create_poll("Tabs or spaces?", &["Tabs", "Spaces"], &token)?;
//! println!("{poll}");
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use api::PollApi;
pub use client::PollClient;
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use error::{ApiError, Endpoint, Hint};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
pub use types::{AuthToken, Credentials, NewPoll, Poll, PollOption, PollPage, Vote};
