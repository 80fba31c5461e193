//! Synchronous REST client for a search-engine cluster.
//!
//! # Overview
//! `RestClient` joins a base URL with an endpoint, sends GET/POST requests
//! with optional basic-auth credentials, and turns non-2xx responses into
//! `ApiError::ServerDefined` carrying the server's own JSON error payload.
//!
//! # Design
//! - Request building (`build_get` / `build_post`) and response parsing
//!   (`parse_response`) are pure and never touch the network.
//! - A `Transport` executes the round trip; `UreqTransport` is the blocking
//!   default. `get` / `post` compose build, execute and parse.
//! - The client holds only its `ClientConfig` and transport, so every call is
//!   independent of the previous one.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;

pub use client::RestClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{basic_auth_header, HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
