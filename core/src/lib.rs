//! Blocking, typed client for the Uptime.com REST API.
//!
//! # Overview
//! `UptimeClient` owns the base URL, credentials and a `Transport`. It builds
//! authenticated `HttpRequest` values, lets the transport execute them, and
//! classifies each `HttpResponse` into a body or an `ApiError`. Resource types
//! such as `CheckTag` get create/get/list/update/delete through the generic
//! `Resources` handle.
//!
//! ```no_run
//! use uptime_core::{CheckTag, ClientConfig, UptimeClient};
//!
//! let client = UptimeClient::new(ClientConfig::from_env())?;
//! let pk = client.check_tags().create(&CheckTag::new("production", "#ff0000"))?;
//! let tag = client.check_tags().get(pk)?;
//! println!("{} -> {}", tag.name, tag.url);
//! # Ok::<(), uptime_core::ApiError>(())
//! ```
//!
//! # Design
//! - The client is immutable after construction; one call is one round trip.
//! - Retries live in the transport (`UreqTransport` + `RetryPolicy`), not in
//!   the resource code.
//! - Pagination metadata is available through `Resources::list_page`;
//!   nothing follows cursors automatically.

pub mod check_tag;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod resource;
pub mod transport;
pub mod version;

#[cfg(test)]
mod testing;

pub use check_tag::{CheckTag, CheckTagFields};
pub use client::UptimeClient;
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use error::{ApiError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use resource::{CreateResult, ListResult, Resource, Resources};
pub use transport::{RetryPolicy, UreqTransport};
pub use version::BuildInfo;
