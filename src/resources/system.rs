//! System resource
//!
//! Site connection state and `variable_get()` / `variable_set()` /
//! `variable_del()` over `POST <endpoint>/system/<action>`.

use super::{has_text, has_value, Endpoint};
use crate::channel::{ActionPublisher, ChannelAction, ResourceChannel};
use crate::client::{BaseResource, PendingResult, RequestDescriptor, ValidationErrors};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

pub const RESOURCE_PATH: &str = "system";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemAction {
    Connect,
    GetVariable,
    SetVariable,
    DelVariable,
}

impl ChannelAction for SystemAction {
    fn name(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::GetVariable => "get_variable",
            Self::SetVariable => "set_variable",
            Self::DelVariable => "del_variable",
        }
    }

    fn all() -> &'static [Self] {
        &[Self::Connect, Self::GetVariable, Self::SetVariable, Self::DelVariable]
    }
}

pub type SystemChannel = ResourceChannel<SystemAction>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetVariable {
    /// Variable to return (required)
    #[serde(default)]
    pub name: Option<String>,
    /// Returned when the variable has never been set
    #[serde(default)]
    pub default: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetVariable {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DelVariable {
    #[serde(default)]
    pub name: Option<String>,
}

/// Facade for the `system` resource
#[derive(Clone)]
pub struct SystemResource {
    base: BaseResource,
    endpoint: Endpoint,
    channel: Arc<SystemChannel>,
}

impl SystemResource {
    pub fn new(base: BaseResource, endpoint: Endpoint, channel: Arc<SystemChannel>) -> Self {
        Self {
            base,
            endpoint,
            channel,
        }
    }

    pub fn channel(&self) -> &Arc<SystemChannel> {
        &self.channel
    }

    fn publisher(&self, action: SystemAction) -> ActionPublisher<SystemAction> {
        ActionPublisher::new(Arc::clone(&self.channel), action)
    }

    fn action_url(&self, action: SystemAction) -> String {
        self.endpoint.url(RESOURCE_PATH, &[action.name()])
    }

    /// Logged in state of the current session
    ///
    /// POST `system/connect`
    pub fn connect(&self) -> PendingResult {
        let action = SystemAction::Connect;
        self.base
            .request(RequestDescriptor::post(self.action_url(action)), self.publisher(action))
    }

    /// Value of a system variable
    ///
    /// POST `system/get_variable` with `{name, default?}`
    pub fn get_variable(&self, data: &GetVariable) -> PendingResult {
        let action = SystemAction::GetVariable;

        let mut errors = ValidationErrors::new();
        errors.require("name", has_text(&data.name));
        if !errors.is_empty() {
            return BaseResource::reject(errors, self.publisher(action));
        }

        let mut body = json!({ "name": data.name });
        if has_value(&data.default) {
            body["default"] = data.default.clone().unwrap_or_default();
        }

        self.base
            .create(body, self.action_url(action), self.publisher(action))
    }

    /// POST `system/set_variable` with `{name, value}`
    pub fn set_variable(&self, data: &SetVariable) -> PendingResult {
        let action = SystemAction::SetVariable;

        let mut errors = ValidationErrors::new();
        errors.require("name", has_text(&data.name));
        errors.require("value", has_value(&data.value));
        if !errors.is_empty() {
            return BaseResource::reject(errors, self.publisher(action));
        }

        let body = json!({ "name": data.name, "value": data.value });
        self.base
            .create(body, self.action_url(action), self.publisher(action))
    }

    /// POST `system/del_variable` with `{name}`
    pub fn del_variable(&self, data: &DelVariable) -> PendingResult {
        let action = SystemAction::DelVariable;

        let mut errors = ValidationErrors::new();
        errors.require("name", has_text(&data.name));
        if !errors.is_empty() {
            return BaseResource::reject(errors, self.publisher(action));
        }

        let body = json!({ "name": data.name });
        self.base
            .create(body, self.action_url(action), self.publisher(action))
    }
}
