//! User resource
//!
//! Session handling against `<endpoint>/user`. Keeping the session cookie or
//! CSRF token between calls is left to the caller.

use super::{has_id, has_text, Endpoint};
use crate::channel::{ActionPublisher, ChannelAction, ResourceChannel};
use crate::client::{BaseResource, PendingResult, RequestDescriptor, ValidationErrors};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::sync::Arc;

pub const RESOURCE_PATH: &str = "user";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Retrieve,
    Login,
    Logout,
    Token,
}

impl ChannelAction for UserAction {
    fn name(self) -> &'static str {
        match self {
            Self::Retrieve => "retrieve",
            Self::Login => "login",
            Self::Logout => "logout",
            Self::Token => "token",
        }
    }

    fn all() -> &'static [Self] {
        &[Self::Retrieve, Self::Login, Self::Logout, Self::Token]
    }
}

pub type UserChannel = ResourceChannel<UserAction>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserRef {
    #[serde(default)]
    pub uid: Option<u64>,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Login {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

// Security: keep the password out of logs
impl fmt::Debug for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Login")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Facade for the `user` resource
#[derive(Clone)]
pub struct UserResource {
    base: BaseResource,
    endpoint: Endpoint,
    channel: Arc<UserChannel>,
}

impl UserResource {
    pub fn new(base: BaseResource, endpoint: Endpoint, channel: Arc<UserChannel>) -> Self {
        Self {
            base,
            endpoint,
            channel,
        }
    }

    pub fn channel(&self) -> &Arc<UserChannel> {
        &self.channel
    }

    fn publisher(&self, action: UserAction) -> ActionPublisher<UserAction> {
        ActionPublisher::new(Arc::clone(&self.channel), action)
    }

    /// GET `user/{uid}`
    pub fn retrieve(&self, data: &UserRef) -> PendingResult {
        let action = UserAction::Retrieve;

        let mut errors = ValidationErrors::new();
        errors.require("uid", has_id(&data.uid));
        if !errors.is_empty() {
            return BaseResource::reject(errors, self.publisher(action));
        }

        let uid = data.uid.unwrap_or_default().to_string();
        let url = self.endpoint.url(RESOURCE_PATH, &[&uid]);
        self.base.retrieve(url, self.publisher(action))
    }

    /// Open a session
    ///
    /// POST `user/login` with `{username, password}`
    pub fn login(&self, data: &Login) -> PendingResult {
        let action = UserAction::Login;

        let mut errors = ValidationErrors::new();
        errors.require("username", has_text(&data.username));
        errors.require("password", has_text(&data.password));
        if !errors.is_empty() {
            return BaseResource::reject(errors, self.publisher(action));
        }

        let body = json!({
            "username": data.username,
            "password": data.password,
        });
        let url = self.endpoint.url(RESOURCE_PATH, &[action.name()]);
        self.base.create(body, url, self.publisher(action))
    }

    /// POST `user/logout`
    pub fn logout(&self) -> PendingResult {
        let action = UserAction::Logout;
        let url = self.endpoint.url(RESOURCE_PATH, &[action.name()]);
        self.base
            .request(RequestDescriptor::post(url), self.publisher(action))
    }

    /// CSRF token of the current session
    ///
    /// POST `user/token`
    pub fn token(&self) -> PendingResult {
        let action = UserAction::Token;
        let url = self.endpoint.url(RESOURCE_PATH, &[action.name()]);
        self.base
            .request(RequestDescriptor::post(url), self.publisher(action))
    }
}
