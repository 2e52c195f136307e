//! Mock API layer for the pet-care demo frontend.
//!
//! Requests made through an [`ApiClient`] are answered from a registry of
//! route handlers while the [`ModeGate`] is active, and go to the real API
//! otherwise.

pub mod client;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod handler;
pub mod invoker;
pub mod latency;
pub mod matcher;
pub mod mode;
pub mod petcare;
pub mod registry;
pub mod request;
pub mod response;
pub mod transport;

pub use client::{ApiClient, ClientFactory};
pub use config::MockConfig;
pub use error::{ClientError, MockError, RegistryError};
pub use handler::{handler_fn, static_handler, HandlerContext, RouteHandler};
pub use invoker::{HandlerInvoker, MockResolver, Resolution};
pub use latency::{LatencyProfile, LatencySimulator};
pub use matcher::{MatchTier, PathMatcher, RouteMatch};
pub use mode::ModeGate;
pub use registry::RouteRegistry;
pub use request::ApiRequest;
pub use response::ResponseEnvelope;
pub use transport::{MockTransport, RealTransport, Transport};
