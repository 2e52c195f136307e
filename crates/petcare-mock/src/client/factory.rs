use super::ApiClient;
use crate::config::MockConfig;
use crate::invoker::{HandlerInvoker, MockResolver};
use crate::latency::LatencySimulator;
use crate::mode::ModeGate;
use crate::registry::RouteRegistry;
use crate::transport::{MockTransport, RealTransport, Transport};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Builds [`ApiClient`]s that all share one gate, registry and real transport.
///
/// Every client gets a [`MockTransport`] wrapping the real one. The gate is
/// read per request, so a client built while interception was off is
/// intercepted as soon as it turns on, and passes straight through while off.
#[derive(Clone)]
pub struct ClientFactory {
    gate: ModeGate,
    resolver: Arc<MockResolver>,
    real: Arc<dyn Transport>,
    base_url: Option<String>,
    fallthrough: bool,
}

impl ClientFactory {
    pub fn new(gate: ModeGate, resolver: Arc<MockResolver>, real: Arc<dyn Transport>) -> Self {
        Self {
            gate,
            resolver,
            real,
            base_url: None,
            fallthrough: false,
        }
    }

    pub fn from_config(config: &MockConfig, registry: Arc<RouteRegistry>) -> anyhow::Result<Self> {
        let gate = ModeGate::from_override(config.force_real);
        let invoker = HandlerInvoker::new(LatencySimulator::new(config.latency));
        let resolver = Arc::new(MockResolver::new(registry, invoker));
        let real = RealTransport::new(Duration::from_secs(config.request_timeout_secs))
            .context("Failed to create HTTP client")?;

        let mut factory = Self::new(gate, resolver, Arc::new(real));
        factory.fallthrough = config.fallthrough_to_real;
        factory.base_url = config.effective_base_url();
        Ok(factory)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_fallthrough(mut self, fallthrough: bool) -> Self {
        self.fallthrough = fallthrough;
        self
    }

    pub fn gate(&self) -> &ModeGate {
        &self.gate
    }

    pub fn resolver(&self) -> &Arc<MockResolver> {
        &self.resolver
    }

    pub fn client(&self) -> ApiClient {
        let transport: Arc<dyn Transport> = Arc::new(
            MockTransport::new(
                self.gate.clone(),
                Arc::clone(&self.resolver),
                Arc::clone(&self.real),
            )
            .with_fallthrough(self.fallthrough),
        );
        info!(
            "Created API client over {} transport (interception {})",
            self.real.name(),
            if self.gate.is_active() { "on" } else { "off" }
        );

        let client =
            ApiClient::new(transport, self.gate.clone()).with_resolver(Arc::clone(&self.resolver));
        match &self.base_url {
            Some(base_url) => client.with_base_url(base_url.clone()),
            None => client,
        }
    }

    /// Client for another base URL, same interception.
    pub fn client_for(&self, base_url: impl Into<String>) -> ApiClient {
        self.client().with_base_url(base_url)
    }
}
