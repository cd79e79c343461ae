//! Views resource
//!
//! `GET <endpoint>/views/{view_name}?...` with the view's display, arguments,
//! paging and exposed filters in the query string.

use super::{has_text, to_params, Endpoint};
use crate::channel::{ActionPublisher, ChannelAction, ResourceChannel};
use crate::client::params::{self, FormatHint};
use crate::client::{BaseResource, PendingResult, ValidationErrors};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

pub const RESOURCE_PATH: &str = "views";

const EXPOSED_FILTERS: &str = "exposed_filters";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewsAction {
    Retrieve,
}

impl ChannelAction for ViewsAction {
    fn name(self) -> &'static str {
        match self {
            Self::Retrieve => "retrieve",
        }
    }

    fn all() -> &'static [Self] {
        &[Self::Retrieve]
    }
}

pub type ViewsChannel = ResourceChannel<ViewsAction>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewQuery {
    /// Machine name of the view (required, sent in the path)
    #[serde(default)]
    pub view_name: Option<String>,
    #[serde(default)]
    pub display_id: Option<String>,
    /// Contextual filter arguments
    #[serde(default)]
    pub args: Option<Vec<Value>>,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
    /// Return themed output instead of raw results
    #[serde(default)]
    pub format_output: Option<bool>,
    /// Sent as one JSON document
    #[serde(default)]
    pub exposed_filters: Option<Map<String, Value>>,
    /// Exposed filter identifiers and sorts used directly,
    /// e.g. `sort_by=created&sort_order=ASC`
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ViewQuery {
    pub fn new(view_name: &str) -> Self {
        Self {
            view_name: Some(view_name.to_string()),
            ..Default::default()
        }
    }

    /// Encoded query string, without the view name
    pub fn query_string(&self) -> String {
        let mut query = to_params(self);
        query.shift_remove("view_name");
        params::build_query(&query, |key| {
            if key == EXPOSED_FILTERS {
                FormatHint::Structured
            } else {
                FormatHint::default()
            }
        })
    }
}

/// Facade for the `views` resource
#[derive(Clone)]
pub struct ViewsResource {
    base: BaseResource,
    endpoint: Endpoint,
    channel: Arc<ViewsChannel>,
}

impl ViewsResource {
    pub fn new(base: BaseResource, endpoint: Endpoint, channel: Arc<ViewsChannel>) -> Self {
        Self {
            base,
            endpoint,
            channel,
        }
    }

    pub fn channel(&self) -> &Arc<ViewsChannel> {
        &self.channel
    }

    /// GET `views/{view_name}?query`
    pub fn retrieve(&self, data: &ViewQuery) -> PendingResult {
        let action = ViewsAction::Retrieve;
        let publisher = ActionPublisher::new(Arc::clone(&self.channel), action);

        let mut errors = ValidationErrors::new();
        errors.require("view_name", has_text(&data.view_name));
        if !errors.is_empty() {
            return BaseResource::reject(errors, publisher);
        }

        let view_name = data.view_name.as_deref().unwrap_or_default();
        let url = self.endpoint.url(RESOURCE_PATH, &[view_name]);
        self.base
            .retrieve(params::append_query(&url, &data.query_string()), publisher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_string_encodes_each_key_by_its_own_hint() {
        let mut query = ViewQuery::new("front_page");
        query.display_id = Some("page_1".to_string());
        query.args = Some(vec![json!("news")]);
        query.exposed_filters = Some(json!({"nid": 12345}).as_object().unwrap().clone());
        query.limit = Some(10);
        query.extra.insert("sort_order".to_string(), json!("ASC"));

        assert_eq!(
            query.query_string(),
            "display_id=page_1&args[]=news&limit=10\
             &exposed_filters=%7B%22nid%22%3A12345%7D&sort_order=ASC"
        );
    }

    #[test]
    fn test_view_name_only_has_empty_query() {
        assert_eq!(ViewQuery::new("front_page").query_string(), "");
    }

    #[test]
    fn test_format_output_as_flag() {
        let mut query = ViewQuery::new("archive");
        query.format_output = Some(false);
        assert_eq!(query.query_string(), "format_output=0");
    }
}
