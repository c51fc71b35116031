//! HTTP fake of the controller's command endpoint.

use httpmock::prelude::*;
use httpmock::{Mock, MockServer};
use serde_json::Value;

use crate::fixtures::envelope;

/// Mock server answering `POST /api` per command name.
pub struct FakeController {
    server: MockServer,
}

impl FakeController {
    /// Start a fake controller on a random local port.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start_async().await,
        }
    }

    /// Root URL clients should be configured with (trailing slash included).
    #[must_use]
    pub fn root_url(&self) -> String {
        self.server.url("/")
    }

    /// Underlying mock server.
    #[must_use]
    pub const fn server(&self) -> &MockServer {
        &self.server
    }

    /// Answer `command` with a successful envelope carrying `data`.
    pub async fn reply(&self, command: &str, data: Value) -> Mock<'_> {
        self.reply_raw(command, 200, envelope(data).to_string()).await
    }

    /// Answer `command` with an arbitrary status and body.
    pub async fn reply_raw(&self, command: &str, status: u16, body: String) -> Mock<'_> {
        let needle = format!("\"command\":\"{command}\"");
        self.server
            .mock_async(move |when, then| {
                when.method(POST).path("/api").body_includes(needle);
                then.status(status)
                    .header("content-type", "application/json")
                    .body(body);
            })
            .await
    }
}
