//! Scripted transport for exercising stores without a controller.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::future::poll_fn;
use std::task::Poll;

use async_trait::async_trait;
use brewlink_api_models::{ApiResult, Command};
use brewlink_ui::{Transport, TransportError, TransportResult};
use serde_json::Value;

/// Transport that replays queued outcomes per command and records every call.
///
/// A command with an empty queue fails with [`TransportError::Network`].
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    root_url: String,
    suspend: Cell<bool>,
    replies: RefCell<HashMap<Command, VecDeque<TransportResult<ApiResult>>>>,
    calls: RefCell<Vec<(Command, Option<Value>)>>,
}

impl ScriptedTransport {
    /// Create a transport reporting `root_url`.
    #[must_use]
    pub fn new(root_url: impl Into<String>) -> Self {
        Self {
            root_url: root_url.into(),
            ..Self::default()
        }
    }

    /// Make every send return `Pending` once before replying, so callers
    /// can observe the store while the request is outstanding.
    #[must_use]
    pub fn suspending(self) -> Self {
        self.suspend.set(true);
        self
    }

    /// Queue the next outcome for `command`.
    pub fn push(&self, command: Command, outcome: TransportResult<ApiResult>) {
        self.replies
            .borrow_mut()
            .entry(command)
            .or_default()
            .push_back(outcome);
    }

    /// Queue a successful envelope carrying `data`.
    pub fn reply(&self, command: Command, data: Value) {
        self.push(command, Ok(ApiResult::ok(data)));
    }

    /// Commands sent so far, in order.
    #[must_use]
    pub fn commands(&self) -> Vec<Command> {
        self.calls.borrow().iter().map(|(command, _)| *command).collect()
    }

    /// Number of times `command` was sent.
    #[must_use]
    pub fn count(&self, command: Command) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|(sent, _)| *sent == command)
            .count()
    }
}

#[async_trait(?Send)]
impl Transport for ScriptedTransport {
    fn root_url(&self) -> &str {
        &self.root_url
    }

    async fn send(&self, command: Command, payload: Option<Value>) -> TransportResult<ApiResult> {
        self.calls.borrow_mut().push((command, payload));
        if self.suspend.get() {
            yield_once().await;
        }
        let next = self
            .replies
            .borrow_mut()
            .get_mut(&command)
            .and_then(VecDeque::pop_front);
        next.unwrap_or_else(|| {
            Err(TransportError::Network {
                command,
                detail: "no scripted reply".to_string(),
            })
        })
    }
}

async fn yield_once() {
    let mut yielded = false;
    poll_fn(|cx| {
        if yielded {
            Poll::Ready(())
        } else {
            yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    })
    .await;
}
