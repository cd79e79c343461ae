//! Resource facades
//!
//! One facade per Services resource. Each action validates its input, builds
//! the URL from the resource path, builds the body or query and hands the
//! call to [`BaseResource`](crate::client::BaseResource) together with the
//! resource channel's publisher for that action.
//!
//! # Resources
//!
//! - [`system`] - connect, get/set/del variables
//! - [`user`] - retrieve, login, logout, CSRF token
//! - [`taxonomy_terms`] - term CRUD, index, selectNodes
//! - [`views`] - view retrieval

pub mod system;
pub mod taxonomy_terms;
pub mod user;
pub mod views;

pub use system::{DelVariable, GetVariable, SetVariable, SystemAction, SystemChannel, SystemResource};
pub use taxonomy_terms::{
    SelectNodes, TaxonomyTermsAction, TaxonomyTermsChannel, TaxonomyTermsResource, TermIndex, TermRef,
    UpdateTerm,
};
pub use user::{Login, UserAction, UserChannel, UserRef, UserResource};
pub use views::{ViewQuery, ViewsAction, ViewsChannel, ViewsResource};

use serde::Serialize;
use serde_json::{Map, Value};

/// Base URL of the Services endpoint, e.g. `http://example.com/api`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base_url: String,
}

impl Endpoint {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `<base>/<resource_path>[/<segment>...]`, segments URL-encoded
    pub fn url(&self, resource_path: &str, segments: &[&str]) -> String {
        let mut url = format!("{}/{}", self.base_url, resource_path);
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }
}

/// Null and empty strings count as missing
pub(crate) fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

pub(crate) fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.is_empty())
}

pub(crate) fn has_value(value: &Option<Value>) -> bool {
    value.as_ref().is_some_and(|v| !is_blank(v))
}

/// Ids of 0 are treated as missing, the backend never issues them
pub(crate) fn has_id(value: &Option<u64>) -> bool {
    matches!(value, Some(id) if *id > 0)
}

/// Serialize an input struct into an ordered JSON map, dropping `None` fields
pub(crate) fn to_params<T: Serialize>(input: &T) -> Map<String, Value> {
    match serde_json::to_value(input) {
        Ok(Value::Object(map)) => map.into_iter().filter(|(_, v)| !v.is_null()).collect(),
        _ => Map::new(),
    }
}
