//! Handler invocation and full mock resolution of a request.

use crate::error::MockError;
use crate::handler::HandlerContext;
use crate::latency::LatencySimulator;
use crate::matcher::{PathMatcher, RouteMatch};
use crate::registry::RouteRegistry;
use crate::request::ApiRequest;
use crate::response::ResponseEnvelope;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error};

/// Runs a matched handler after the simulated latency.
#[derive(Debug, Clone, Copy, Default)]
pub struct HandlerInvoker {
    latency: LatencySimulator,
}

impl HandlerInvoker {
    pub fn new(latency: LatencySimulator) -> Self {
        Self { latency }
    }

    pub fn latency(&self) -> &LatencySimulator {
        &self.latency
    }

    /// Wait, then call the handler. `Ok(None)` is the handler's "no data".
    pub async fn invoke(
        &self,
        route: &RouteMatch,
        request: &ApiRequest,
    ) -> Result<Option<Value>, MockError> {
        self.latency.delay().await;

        let ctx = HandlerContext::new(request.snapshot(), route.clone());
        route.handler().handle(ctx).await.map_err(|source| {
            error!(
                "Mock handler {} failed for {} {}: {:#}",
                route.key(),
                request.method,
                route.path,
                source
            );
            MockError::FixtureLoadFailure {
                method: request.method.clone(),
                path: route.path.clone(),
                source,
            }
        })
    }
}

/// Result of resolving one request against the registry.
#[derive(Debug)]
pub enum Resolution {
    /// Matched and the handler produced data.
    Resolved(ResponseEnvelope),
    /// Matched, but the handler returned no data.
    NoData,
}

/// Path matcher plus handler invoker: the whole mock answer for a request.
#[derive(Debug, Clone)]
pub struct MockResolver {
    matcher: PathMatcher,
    invoker: HandlerInvoker,
}

impl MockResolver {
    pub fn new(registry: Arc<RouteRegistry>, invoker: HandlerInvoker) -> Self {
        Self {
            matcher: PathMatcher::new(registry),
            invoker,
        }
    }

    pub fn matcher(&self) -> &PathMatcher {
        &self.matcher
    }

    /// Unmatched requests fail with [`MockError::NoFixtureAvailable`].
    pub async fn resolve(&self, request: &ApiRequest) -> Result<Resolution, MockError> {
        let Some(route) = self.matcher.resolve_request(request) else {
            return Err(MockError::no_fixture(&request.method, request.path()));
        };

        debug!(
            "Mocking {} {} with {} ({:?})",
            request.method,
            route.path,
            route.key(),
            route.tier
        );

        match self.invoker.invoke(&route, request).await? {
            Some(data) => Ok(Resolution::Resolved(ResponseEnvelope::ok(
                data,
                request.snapshot(),
            ))),
            None => Ok(Resolution::NoData),
        }
    }
}
