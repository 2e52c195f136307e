//! API client used by application code.
//!
//! Every call shape (`get`, `post`, ..., `request`) reduces to
//! [`ApiClient::send`], which dispatches through the transport chosen when
//! the client was built. Failed requests get one recovery pass:
//!
//! 1. a placeholder request resolves or rejects with its attached outcome;
//! 2. otherwise, if interception is active and no mock resolution has been
//!    attempted for this request yet, one resolution is attempted;
//! 3. otherwise the original error is returned.

mod factory;

pub use factory::ClientFactory;

use crate::error::{ClientError, MockError};
use crate::invoker::{MockResolver, Resolution};
use crate::mode::ModeGate;
use crate::request::{ApiRequest, AttachedOutcome};
use crate::response::ResponseEnvelope;
use crate::transport::Transport;
use hyper::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of the recovery pass for a failed request.
#[derive(Debug)]
pub(crate) enum FallbackOutcome {
    Recovered(Result<ResponseEnvelope, ClientError>),
    /// A resolution already ran for this request; keep the original error.
    AlreadyAttempted,
    /// Interception inactive or no resolver configured.
    Skipped,
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: Option<String>,
    transport: Arc<dyn Transport>,
    gate: ModeGate,
    resolver: Option<Arc<MockResolver>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("transport", &self.transport.name())
            .field("active", &self.gate.is_active())
            .finish()
    }
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, gate: ModeGate) -> Self {
        Self {
            base_url: None,
            transport,
            gate,
            resolver: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Resolver used by the recovery pass.
    pub fn with_resolver(mut self, resolver: Arc<MockResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    pub async fn get(&self, url: &str) -> Result<ResponseEnvelope, ClientError> {
        self.send(ApiRequest::new(Method::GET, url)).await
    }

    pub async fn post(&self, url: &str, body: Value) -> Result<ResponseEnvelope, ClientError> {
        self.send(ApiRequest::new(Method::POST, url).with_body(body))
            .await
    }

    pub async fn put(&self, url: &str, body: Value) -> Result<ResponseEnvelope, ClientError> {
        self.send(ApiRequest::new(Method::PUT, url).with_body(body))
            .await
    }

    pub async fn patch(&self, url: &str, body: Value) -> Result<ResponseEnvelope, ClientError> {
        self.send(ApiRequest::new(Method::PATCH, url).with_body(body))
            .await
    }

    pub async fn delete(&self, url: &str) -> Result<ResponseEnvelope, ClientError> {
        self.send(ApiRequest::new(Method::DELETE, url)).await
    }

    pub async fn request(&self, method: Method, url: &str) -> Result<ResponseEnvelope, ClientError> {
        self.send(ApiRequest::new(method, url)).await
    }

    /// GET and deserialize `data`.
    pub async fn fetch<T: DeserializeOwned>(&self, url: &str) -> anyhow::Result<T> {
        let envelope = self.get(url).await?;
        Ok(envelope.json()?)
    }

    pub async fn send(&self, mut request: ApiRequest) -> Result<ResponseEnvelope, ClientError> {
        if request.base_url.is_none() {
            request.base_url = self.base_url.clone();
        }

        let outcome = if request.attached().is_some() {
            // Placeholders are never dispatched.
            Err(ClientError::Cancelled {
                method: request.method.clone(),
                path: request.path(),
            })
        } else {
            self.transport.send(&request).await
        };

        match outcome {
            Ok(envelope) => Ok(envelope),
            Err(err) => self.recover(&request, err).await,
        }
    }

    async fn recover(
        &self,
        request: &ApiRequest,
        err: ClientError,
    ) -> Result<ResponseEnvelope, ClientError> {
        if let Some(attached) = request.attached() {
            debug!(
                "Resolving placeholder {} {} from attached outcome",
                request.method,
                request.path()
            );
            return match attached {
                AttachedOutcome::Data(data) => {
                    Ok(ResponseEnvelope::ok(data.clone(), request.snapshot()))
                }
                AttachedOutcome::Error(message) => Err(ClientError::Attached {
                    message: message.clone(),
                }),
            };
        }

        match self.fallback(request).await {
            FallbackOutcome::Recovered(result) => result,
            FallbackOutcome::AlreadyAttempted | FallbackOutcome::Skipped => Err(err),
        }
    }

    pub(crate) async fn fallback(&self, request: &ApiRequest) -> FallbackOutcome {
        let Some(resolver) = self.resolver.as_ref() else {
            return FallbackOutcome::Skipped;
        };
        if !self.gate.is_active() {
            return FallbackOutcome::Skipped;
        }
        if !request.mark_attempted() {
            return FallbackOutcome::AlreadyAttempted;
        }

        warn!(
            "{} transport failed for {} {}, trying mock fallback",
            self.transport.name(),
            request.method,
            request.path()
        );
        let result = match resolver.resolve(request).await {
            Ok(Resolution::Resolved(envelope)) => Ok(envelope),
            Ok(Resolution::NoData) => {
                Err(MockError::no_fixture(&request.method, request.path()).into())
            }
            Err(err) => Err(err.into()),
        };
        FallbackOutcome::Recovered(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::static_handler;
    use crate::invoker::HandlerInvoker;
    use crate::latency::LatencySimulator;
    use crate::registry::RouteRegistry;
    use crate::transport::MockTransport;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails every request the way an unreachable backend would.
    #[derive(Default)]
    struct OfflineTransport {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transport for OfflineTransport {
        fn name(&self) -> &'static str {
            "offline"
        }

        async fn send(&self, request: &ApiRequest) -> Result<ResponseEnvelope, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ClientError::Status {
                method: request.method.clone(),
                path: request.path(),
                status: 503,
            })
        }
    }

    fn resolver() -> Arc<MockResolver> {
        let mut builder = RouteRegistry::builder();
        builder
            .register(Method::GET, "/api/users/me", static_handler(json!({"id": 1})))
            .unwrap();
        Arc::new(MockResolver::new(
            Arc::new(builder.build()),
            HandlerInvoker::new(LatencySimulator::none()),
        ))
    }

    #[tokio::test]
    async fn test_placeholder_resolves_with_attached_data() {
        let offline = Arc::new(OfflineTransport::default());
        let client = ApiClient::new(offline.clone(), ModeGate::active());

        let envelope = client
            .send(ApiRequest::get("/api/anything").with_attached_data(json!({"cached": true})))
            .await
            .unwrap();
        assert_eq!(envelope.data["cached"], true);
        assert_eq!(offline.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_placeholder_rejects_with_attached_error() {
        let client = ApiClient::new(Arc::new(OfflineTransport::default()), ModeGate::inactive());
        let err = client
            .send(ApiRequest::get("/api/anything").with_attached_error("session expired"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "session expired");
    }

    #[tokio::test]
    async fn test_client_built_before_activation_never_dispatches() {
        let gate = ModeGate::inactive();
        let resolver = resolver();
        let offline = Arc::new(OfflineTransport::default());
        let transport = Arc::new(MockTransport::new(
            gate.clone(),
            resolver.clone(),
            offline.clone(),
        ));
        let client = ApiClient::new(transport, gate.clone()).with_resolver(resolver);
        gate.set_active(true);

        let envelope = client.get("/api/users/me").await.unwrap();
        assert_eq!(envelope.data["id"], 1);
        assert_eq!(offline.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fallback_recovers_failed_request_on_unwrapped_transport() {
        let offline = Arc::new(OfflineTransport::default());
        let client =
            ApiClient::new(offline.clone(), ModeGate::active()).with_resolver(resolver());

        let envelope = client.get("/api/users/me").await.unwrap();
        assert_eq!(envelope.data["id"], 1);
        assert_eq!(offline.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fallback_runs_at_most_once_per_request() {
        let client = ApiClient::new(Arc::new(OfflineTransport::default()), ModeGate::active())
            .with_resolver(resolver());
        let request = ApiRequest::get("/api/users/me");

        assert!(matches!(
            client.fallback(&request).await,
            FallbackOutcome::Recovered(Ok(_))
        ));
        assert!(matches!(
            client.fallback(&request).await,
            FallbackOutcome::AlreadyAttempted
        ));
    }

    #[tokio::test]
    async fn test_fallback_skipped_when_inactive() {
        let client = ApiClient::new(Arc::new(OfflineTransport::default()), ModeGate::inactive())
            .with_resolver(resolver());

        let err = client.get("/api/users/me").await.unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_mock_failure_is_not_retried_by_fallback() {
        let gate = ModeGate::active();
        let resolver = resolver();
        let offline: Arc<dyn Transport> = Arc::new(OfflineTransport::default());
        let transport = Arc::new(MockTransport::new(gate.clone(), resolver.clone(), offline));
        let client = ApiClient::new(transport, gate).with_resolver(resolver);

        let err = client
            .send(ApiRequest::new(Method::POST, "/api/unknown/path"))
            .await
            .unwrap_err();
        assert!(err.is_no_fixture());
        let message = err.to_string();
        assert!(message.contains("POST"));
        assert!(message.contains("/api/unknown/path"));
    }

    #[tokio::test]
    async fn test_every_call_shape_uses_base_url() {
        let gate = ModeGate::active();
        let resolver = resolver();
        let offline: Arc<dyn Transport> = Arc::new(OfflineTransport::default());
        let transport = Arc::new(MockTransport::new(gate.clone(), resolver, offline));
        let client = ApiClient::new(transport, gate).with_base_url("http://localhost:3000/");

        let via_get = client.get("/api/users/me").await.unwrap();
        let via_request = client.request(Method::GET, "api/users/me").await.unwrap();
        assert_eq!(via_get.data, via_request.data);
        assert_eq!(
            via_get.config.base_url.as_deref(),
            Some("http://localhost:3000/")
        );
        assert_eq!(via_request.config.path, "/api/users/me");
    }
}
