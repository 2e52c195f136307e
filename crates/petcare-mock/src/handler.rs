//! Route handler contract.

use crate::matcher::RouteMatch;
use crate::request::RequestSnapshot;
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Everything a handler sees: the request and how its route matched.
#[derive(Debug, Clone)]
pub struct HandlerContext {
    pub request: RequestSnapshot,
    pub route: RouteMatch,
}

impl HandlerContext {
    pub fn new(request: RequestSnapshot, route: RouteMatch) -> Self {
        Self { request, route }
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.request.param(key)
    }

    /// Path segments left after a dynamic-suffix pattern, e.g. `["77", "comments"]`.
    pub fn segments(&self) -> Vec<&str> {
        self.route.remainder_segments()
    }

    /// Identifier from a `{id}` capture, or the first remainder segment.
    pub fn id(&self) -> Option<&str> {
        self.route
            .capture("id")
            .or_else(|| self.route.remainder_segments().first().copied())
    }
}

/// Produces mock data for a matched route.
///
/// `Ok(None)` means "matched, but no data": the caller falls through instead
/// of answering.
#[async_trait]
pub trait RouteHandler: Send + Sync {
    async fn handle(&self, ctx: HandlerContext) -> anyhow::Result<Option<Value>>;
}

/// Adapter turning an async closure into a [`RouteHandler`].
pub struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> RouteHandler for FnHandler<F>
where
    F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Option<Value>>> + Send + 'static,
{
    async fn handle(&self, ctx: HandlerContext) -> anyhow::Result<Option<Value>> {
        (self.0)(ctx).await
    }
}

pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn RouteHandler>
where
    F: Fn(HandlerContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Option<Value>>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// Handler that always answers with the same payload.
pub fn static_handler(payload: Value) -> Arc<dyn RouteHandler> {
    handler_fn(move |_ctx| {
        let payload = payload.clone();
        async move { anyhow::Ok(Some(payload)) }
    })
}
