//! Generic resource operations
//!
//! [`BaseResource`] runs the CRUD-shaped calls shared by every facade. Each
//! call reports its outcome to an [`OutcomeSink`] exactly once (confirmed on
//! success, failed otherwise) and hands back a [`PendingResult`] carrying the
//! same outcome.
//!
//! The network round-trip runs on a spawned tokio task, so dropping the
//! `PendingResult` does not cancel the request: it still completes and still
//! publishes. Calls must therefore be made from within a tokio runtime.

use super::error::{ResourceError, ValidationErrors};
use super::http::{HttpClient, RequestDescriptor};
use super::params::{self, FormatHint};
use serde_json::{Map, Value};
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::task::JoinHandle;

/// Receives the outcome of a resource call
pub trait OutcomeSink: Send + Sync + 'static {
    fn confirmed(&self, payload: &Value);
    fn failed(&self, payload: &Value);
}

/// A `(on_confirmed, on_failed)` pair of callbacks
impl<C, F> OutcomeSink for (C, F)
where
    C: Fn(&Value) + Send + Sync + 'static,
    F: Fn(&Value) + Send + Sync + 'static,
{
    fn confirmed(&self, payload: &Value) {
        (self.0)(payload)
    }

    fn failed(&self, payload: &Value) {
        (self.1)(payload)
    }
}

enum PendingState {
    Settled(Option<Result<Value, ResourceError>>),
    Running(JoinHandle<Result<Value, ResourceError>>),
}

/// Outcome of a resource call that may still be in flight
pub struct PendingResult {
    state: PendingState,
}

impl PendingResult {
    fn settled(result: Result<Value, ResourceError>) -> Self {
        Self {
            state: PendingState::Settled(Some(result)),
        }
    }

    fn running(handle: JoinHandle<Result<Value, ResourceError>>) -> Self {
        Self {
            state: PendingState::Running(handle),
        }
    }

    /// True once the outcome is known without awaiting
    pub fn is_settled(&self) -> bool {
        match &self.state {
            PendingState::Settled(_) => true,
            PendingState::Running(handle) => handle.is_finished(),
        }
    }
}

impl Future for PendingResult {
    type Output = Result<Value, ResourceError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.state {
            PendingState::Settled(result) => Poll::Ready(
                result
                    .take()
                    .unwrap_or_else(|| Err(ResourceError::Aborted("result already taken".to_string()))),
            ),
            PendingState::Running(handle) => Pin::new(handle)
                .poll(cx)
                .map(|joined| joined.unwrap_or_else(|e| Err(ResourceError::Aborted(e.to_string())))),
        }
    }
}

/// Report a finished call to its sink and pass the result through
///
/// A panicking sink is logged; the result is returned unchanged.
fn settle<S: OutcomeSink>(result: Result<Value, ResourceError>, sink: &S) -> Result<Value, ResourceError> {
    let notified = match &result {
        Ok(body) => catch_unwind(AssertUnwindSafe(|| sink.confirmed(body))),
        Err(e) => {
            tracing::debug!("request failed: {}", e);
            let payload = e.payload();
            catch_unwind(AssertUnwindSafe(|| sink.failed(&payload)))
        },
    };
    if notified.is_err() {
        tracing::warn!("outcome sink panicked, result passed through");
    }
    result
}

/// CRUD-shaped operations over an [`HttpClient`]
#[derive(Clone, Debug)]
pub struct BaseResource {
    http: HttpClient,
}

impl BaseResource {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// GET `url`
    pub fn retrieve(&self, url: impl Into<String>, sink: impl OutcomeSink) -> PendingResult {
        self.request(RequestDescriptor::get(url), sink)
    }

    /// POST `payload` to `url`
    pub fn create(&self, payload: Value, url: impl Into<String>, sink: impl OutcomeSink) -> PendingResult {
        self.request(RequestDescriptor::post(url).with_body(payload), sink)
    }

    /// PUT `payload` to `url`
    pub fn update(&self, payload: Value, url: impl Into<String>, sink: impl OutcomeSink) -> PendingResult {
        self.request(RequestDescriptor::put(url).with_body(payload), sink)
    }

    /// DELETE `url`, no body
    pub fn delete(&self, url: impl Into<String>, sink: impl OutcomeSink) -> PendingResult {
        self.request(RequestDescriptor::delete(url), sink)
    }

    /// GET `url` with `query_params` encoded into the query string
    pub fn index(&self, query_params: &Map<String, Value>, url: &str, sink: impl OutcomeSink) -> PendingResult {
        let query = params::build_query(query_params, |_| FormatHint::default());
        self.retrieve(params::append_query(url, &query), sink)
    }

    /// Execute a descriptor verbatim
    pub fn request(&self, request: RequestDescriptor, sink: impl OutcomeSink) -> PendingResult {
        let http = self.http.clone();
        let handle = tokio::spawn(async move {
            let result = http.execute(&request).await;
            settle(result, &sink)
        });
        PendingResult::running(handle)
    }

    /// Fail a call locally without touching the network
    pub fn reject(errors: ValidationErrors, sink: impl OutcomeSink) -> PendingResult {
        tracing::debug!("rejected before dispatch: {}", errors);
        PendingResult::settled(settle(Err(ResourceError::Validation(errors)), &sink))
    }
}
