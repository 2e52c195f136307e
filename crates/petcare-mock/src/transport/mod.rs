//! Transports: the single seam every request goes through.
//!
//! - `RealTransport`: sends the request over the network with `reqwest`
//! - `MockTransport`: answers from the route registry while the mode gate is
//!   active, delegating to a wrapped transport otherwise
//!
//! Clients from `ClientFactory` always get a `MockTransport` over the real one;
//! the gate is consulted on every request.

mod mock;
mod real;

pub use mock::MockTransport;
pub use real::RealTransport;

use crate::error::ClientError;
use crate::request::ApiRequest;
use crate::response::ResponseEnvelope;
use async_trait::async_trait;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn send(&self, request: &ApiRequest) -> Result<ResponseEnvelope, ClientError>;
}
