//! Async client for the Substack read API.
//!
//! # Overview
//! Exposes the posts surface of the API (single post, latest/top listings,
//! search) through a coalescing query layer. Connection parameters — base
//! URL, API key, publication — live in a per-client store that the request
//! executor re-reads on every call, so one compiled library serves many
//! differently-configured consumers without rebuilding or leaking
//! credentials between them.
//!
//! # Design
//! - `SubstackClient` is the composition root: fresh store, seeded
//!   synchronously at construction, one cache per endpoint.
//! - Endpoint definitions are pure parameter-to-request mappings; responses
//!   arrive wrapped in a transport `Envelope` that is unwrapped before the
//!   payload reaches the consumer.
//! - Cache keys include the effective base URL, so reconfiguring the host
//!   partitions cached results instead of serving stale cross-tenant data.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod query;
pub mod types;

pub use client::{ClientOptions, SubstackClient};
pub use config::{ConfigStore, ConfigUpdate, ConnectionConfig, DEFAULT_API_URL};
pub use endpoints::{ListParams, PostParams, SearchParams};
pub use error::ApiError;
pub use http::{ApiRequest, Executor, API_KEY_HEADER};
pub use query::{Query, QueryCache, QueryState, Tag};
pub use types::{ColorPalette, CoverImage, Envelope, ImageVariants, Post};
