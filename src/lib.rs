//! Client for the Drupal 7 Services 3.x REST surface
//!
//! Each backend resource (system, user, taxonomy terms, views) has a facade
//! whose actions return a [`PendingResult`] and report their outcome on the
//! resource's notification channel: `<resource>.<action>.confirmed` or
//! `<resource>.<action>.failed`, exactly once per call.
//!
//! # Module Structure
//!
//! - [`client`] - request execution, errors and query encoding shared by all resources
//! - [`channel`] - per-resource publish/subscribe
//! - [`resources`] - the facades
//! - [`config`] - endpoint settings
//!
//! # Example
//!
//! ```ignore
//! use drupal_services::{ApiConfig, Services};
//! use drupal_services::channel::Outcome;
//! use drupal_services::resources::{TaxonomyTermsAction, TermRef};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let services = Services::new(&ApiConfig::load())?;
//!     services.taxonomy_terms.channel().subscribe(
//!         TaxonomyTermsAction::Retrieve,
//!         Outcome::Confirmed,
//!         |event| println!("term: {}", event.payload),
//!     );
//!     let term = services.taxonomy_terms.retrieve(&TermRef { tid: Some(42) }).await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod client;
pub mod config;
pub mod resources;
mod services;

pub use client::{PendingResult, ResourceError};
pub use config::ApiConfig;
pub use services::Services;
