//! Generic resource core
//!
//! Everything a facade needs to talk to the backend, independent of any
//! particular resource.
//!
//! # Module Structure
//!
//! - [`base`] - CRUD-shaped operations with outcome reporting
//! - [`error`] - Validation and transport errors
//! - [`http`] - Request descriptors and the reqwest-backed transport
//! - [`params`] - Query-string encoding
//!
//! # Example
//!
//! ```ignore
//! use drupal_services::client::{BaseResource, HttpClient, DEFAULT_TIMEOUT};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let base = BaseResource::new(HttpClient::new(DEFAULT_TIMEOUT, "example")?);
//!     let on_confirmed = |body: &serde_json::Value| println!("ok: {body}");
//!     let on_failed = |body: &serde_json::Value| eprintln!("failed: {body}");
//!     let term = base
//!         .retrieve("http://localhost/api/taxonomy_terms/1", (on_confirmed, on_failed))
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod base;
pub mod error;
pub mod http;
pub mod params;

pub use base::{BaseResource, OutcomeSink, PendingResult};
pub use error::{ResourceError, ValidationErrors};
pub use http::{HttpClient, HttpMethod, RequestDescriptor, DEFAULT_TIMEOUT};
pub use params::{FormatHint, ParamFragment};
