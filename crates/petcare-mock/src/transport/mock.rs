use super::Transport;
use crate::error::{ClientError, MockError};
use crate::invoker::{MockResolver, Resolution};
use crate::mode::ModeGate;
use crate::request::ApiRequest;
use crate::response::ResponseEnvelope;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Answers requests from the route registry.
///
/// With the gate inactive every request goes to `inner` untouched. With it
/// active, unmatched requests fail; a handler's "no data" goes to `inner`
/// only when `fallthrough` is enabled.
pub struct MockTransport {
    gate: ModeGate,
    resolver: Arc<MockResolver>,
    inner: Arc<dyn Transport>,
    fallthrough: bool,
}

impl MockTransport {
    pub fn new(gate: ModeGate, resolver: Arc<MockResolver>, inner: Arc<dyn Transport>) -> Self {
        Self {
            gate,
            resolver,
            inner,
            fallthrough: false,
        }
    }

    pub fn with_fallthrough(mut self, fallthrough: bool) -> Self {
        self.fallthrough = fallthrough;
        self
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn send(&self, request: &ApiRequest) -> Result<ResponseEnvelope, ClientError> {
        if !self.gate.is_active() {
            return self.inner.send(request).await;
        }

        request.mark_attempted();
        match self.resolver.resolve(request).await {
            Ok(Resolution::Resolved(envelope)) => Ok(envelope),
            Ok(Resolution::NoData) if self.fallthrough => {
                debug!(
                    "No mock data for {} {}, passing to {} transport",
                    request.method,
                    request.path(),
                    self.inner.name()
                );
                self.inner.send(request).await
            }
            Ok(Resolution::NoData) => {
                warn!("No mock data for {} {}", request.method, request.path());
                Err(MockError::no_fixture(&request.method, request.path()).into())
            }
            Err(err) => {
                if let MockError::NoFixtureAvailable { method, path } = &err {
                    warn!("No mock route for {} {}", method, path);
                }
                Err(err.into())
            }
        }
    }
}
