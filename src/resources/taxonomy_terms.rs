//! Taxonomy terms resource
//!
//! Term CRUD, listing and the `selectNodes` action under
//! `<endpoint>/taxonomy_terms`.

use super::{has_id, has_text, has_value, to_params, Endpoint};
use crate::channel::{ActionPublisher, ChannelAction, ResourceChannel};
use crate::client::{BaseResource, PendingResult, RequestDescriptor, ValidationErrors};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;

pub const RESOURCE_PATH: &str = "taxonomy_terms";

const SELECT_NODES: &str = "selectNodes";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxonomyTermsAction {
    Retrieve,
    Create,
    Update,
    Delete,
    Index,
    SelectNodes,
}

impl ChannelAction for TaxonomyTermsAction {
    fn name(self) -> &'static str {
        match self {
            Self::Retrieve => "retrieve",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Index => "index",
            Self::SelectNodes => "select_nodes",
        }
    }

    fn all() -> &'static [Self] {
        &[
            Self::Retrieve,
            Self::Create,
            Self::Update,
            Self::Delete,
            Self::Index,
            Self::SelectNodes,
        ]
    }
}

pub type TaxonomyTermsChannel = ResourceChannel<TaxonomyTermsAction>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TermRef {
    #[serde(default)]
    pub tid: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTerm {
    #[serde(default)]
    pub tid: Option<u64>,
    /// Term fields to change
    #[serde(default)]
    pub data: Option<Value>,
}

/// Query of the term listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TermIndex {
    /// Zero-based page
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub pagesize: Option<u64>,
    /// Comma separated field list
    #[serde(default)]
    pub fields: Option<String>,
    /// Property conditions, sent as `parameters[key]=value`
    #[serde(default)]
    pub parameters: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectNodes {
    /// Term ids, comma separated
    #[serde(default)]
    pub tid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pager: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<Value>,
}

/// Facade for the `taxonomy_terms` resource
#[derive(Clone)]
pub struct TaxonomyTermsResource {
    base: BaseResource,
    endpoint: Endpoint,
    channel: Arc<TaxonomyTermsChannel>,
}

impl TaxonomyTermsResource {
    pub fn new(base: BaseResource, endpoint: Endpoint, channel: Arc<TaxonomyTermsChannel>) -> Self {
        Self {
            base,
            endpoint,
            channel,
        }
    }

    pub fn channel(&self) -> &Arc<TaxonomyTermsChannel> {
        &self.channel
    }

    fn publisher(&self, action: TaxonomyTermsAction) -> ActionPublisher<TaxonomyTermsAction> {
        ActionPublisher::new(Arc::clone(&self.channel), action)
    }

    fn term_url(&self, tid: Option<u64>) -> String {
        let tid = tid.unwrap_or_default().to_string();
        self.endpoint.url(RESOURCE_PATH, &[&tid])
    }

    fn require_tid(&self, tid: &Option<u64>, action: TaxonomyTermsAction) -> Option<PendingResult> {
        let mut errors = ValidationErrors::new();
        errors.require("tid", has_id(tid));
        if errors.is_empty() {
            None
        } else {
            Some(BaseResource::reject(errors, self.publisher(action)))
        }
    }

    /// GET `taxonomy_terms/{tid}`
    pub fn retrieve(&self, data: &TermRef) -> PendingResult {
        let action = TaxonomyTermsAction::Retrieve;
        if let Some(rejected) = self.require_tid(&data.tid, action) {
            return rejected;
        }

        self.base.retrieve(self.term_url(data.tid), self.publisher(action))
    }

    /// POST `taxonomy_terms` with `{term}`
    ///
    /// The backend runs the term form, so `term` must match its fields
    /// (`vid`, `name`, ...).
    pub fn create(&self, term: &Value) -> PendingResult {
        let action = TaxonomyTermsAction::Create;

        let mut errors = ValidationErrors::new();
        errors.require("term", term.is_object());
        if !errors.is_empty() {
            return BaseResource::reject(errors, self.publisher(action));
        }

        let url = self.endpoint.url(RESOURCE_PATH, &[]);
        self.base
            .create(json!({ "term": term }), url, self.publisher(action))
    }

    /// PUT `taxonomy_terms/{tid}` with `{term: data}`
    pub fn update(&self, data: &UpdateTerm) -> PendingResult {
        let action = TaxonomyTermsAction::Update;

        let mut errors = ValidationErrors::new();
        errors.require("tid", has_id(&data.tid));
        errors.require("data", has_value(&data.data));
        if !errors.is_empty() {
            return BaseResource::reject(errors, self.publisher(action));
        }

        let body = json!({ "term": data.data });
        self.base
            .update(body, self.term_url(data.tid), self.publisher(action))
    }

    /// DELETE `taxonomy_terms/{tid}`
    pub fn delete(&self, data: &TermRef) -> PendingResult {
        let action = TaxonomyTermsAction::Delete;
        if let Some(rejected) = self.require_tid(&data.tid, action) {
            return rejected;
        }

        self.base.delete(self.term_url(data.tid), self.publisher(action))
    }

    /// GET `taxonomy_terms?page=..&pagesize=..&fields=..&parameters[..]=..`
    pub fn index(&self, query: &TermIndex) -> PendingResult {
        let action = TaxonomyTermsAction::Index;
        let url = self.endpoint.url(RESOURCE_PATH, &[]);
        self.base
            .index(&to_params(query), &url, self.publisher(action))
    }

    /// Nodes tagged with the given terms
    ///
    /// POST `taxonomy_terms/selectNodes` with `{tid, pager?, limit?, order?}`
    pub fn select_nodes(&self, data: &SelectNodes) -> PendingResult {
        let action = TaxonomyTermsAction::SelectNodes;

        let mut errors = ValidationErrors::new();
        errors.require("tid", has_text(&data.tid));
        if !errors.is_empty() {
            return BaseResource::reject(errors, self.publisher(action));
        }

        let url = self.endpoint.url(RESOURCE_PATH, &[SELECT_NODES]);
        let request = RequestDescriptor::post(url).with_body(Value::Object(to_params(data)));
        self.base.request(request, self.publisher(action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Outcome;
    use crate::client::{HttpClient, DEFAULT_TIMEOUT};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn facade() -> TaxonomyTermsResource {
        let http = HttpClient::new(DEFAULT_TIMEOUT, "drupal-services-test").unwrap();
        TaxonomyTermsResource::new(
            BaseResource::new(http),
            Endpoint::new("http://127.0.0.1:9/api"),
            Arc::new(TaxonomyTermsChannel::new(RESOURCE_PATH)),
        )
    }

    #[tokio::test]
    async fn test_missing_tid_is_rejected_for_every_term_action() {
        let terms = facade();
        let failures = Arc::new(AtomicUsize::new(0));
        let confirmations = Arc::new(AtomicUsize::new(0));
        let (failed, confirmed) = (Arc::clone(&failures), Arc::clone(&confirmations));
        terms.channel().subscribe_all(move |event| {
            if event.topic.as_str().ends_with(".failed") {
                failed.fetch_add(1, Ordering::SeqCst);
            } else {
                confirmed.fetch_add(1, Ordering::SeqCst);
            }
        });

        assert!(terms.retrieve(&TermRef::default()).await.is_err());
        assert!(terms.delete(&TermRef::default()).await.is_err());
        assert!(terms.update(&UpdateTerm::default()).await.is_err());
        assert!(terms.select_nodes(&SelectNodes::default()).await.is_err());

        assert_eq!(failures.load(Ordering::SeqCst), 4);
        assert_eq!(confirmations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_update_lists_both_missing_fields() {
        let err = facade().update(&UpdateTerm::default()).await.unwrap_err();
        assert_eq!(
            err.payload(),
            json!(["Param tid is required.", "Param data is required."])
        );
    }

    #[tokio::test]
    async fn test_create_requires_term_object() {
        let terms = facade();
        let failed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&failed);
        terms
            .channel()
            .subscribe(TaxonomyTermsAction::Create, Outcome::Failed, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        let err = terms.create(&json!("Fruit")).await.unwrap_err();
        assert_eq!(err.payload(), json!(["Param term is required."]));
        assert_eq!(failed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_select_nodes_body_skips_unset_fields() {
        let data = SelectNodes {
            tid: Some("1,2".to_string()),
            limit: Some(10),
            ..Default::default()
        };
        assert_eq!(Value::Object(to_params(&data)), json!({"tid": "1,2", "limit": 10}));
    }
}
