//! Error types surfaced by the mock layer and the API client.

use hyper::Method;
use thiserror::Error;

/// Failures produced while resolving a request against the route registry.
#[derive(Debug, Error)]
pub enum MockError {
    /// Interception is active and no route (or no data) answers the request.
    #[error("no fixture for {method} {path}")]
    NoFixtureAvailable { method: Method, path: String },

    /// A matched handler failed, usually while loading its fixture.
    #[error("fixture for {method} {path} failed")]
    FixtureLoadFailure {
        method: Method,
        path: String,
        #[source]
        source: anyhow::Error,
    },
}

impl MockError {
    pub fn no_fixture(method: &Method, path: impl Into<String>) -> Self {
        MockError::NoFixtureAvailable {
            method: method.clone(),
            path: path.into(),
        }
    }

    pub fn method(&self) -> &Method {
        match self {
            MockError::NoFixtureAvailable { method, .. }
            | MockError::FixtureLoadFailure { method, .. } => method,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            MockError::NoFixtureAvailable { path, .. }
            | MockError::FixtureLoadFailure { path, .. } => path,
        }
    }
}

/// Errors observed by callers of [`crate::client::ApiClient`].
///
/// Mock and real transports fail through the same type, so calling code keeps
/// a single error path regardless of which transport answered.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Mock(#[from] MockError),

    #[error("request {method} {url} failed")]
    Transport {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request {method} {path} returned status {status}")]
    Status {
        method: Method,
        path: String,
        status: u16,
    },

    /// Placeholder request cancelled before dispatch.
    #[error("request {method} {path} was cancelled")]
    Cancelled { method: Method, path: String },

    /// Error attached to a placeholder request by the caller.
    #[error("{message}")]
    Attached { message: String },
}

impl ClientError {
    pub fn is_no_fixture(&self) -> bool {
        matches!(self, ClientError::Mock(MockError::NoFixtureAvailable { .. }))
    }

    pub fn is_fixture_failure(&self) -> bool {
        matches!(self, ClientError::Mock(MockError::FixtureLoadFailure { .. }))
    }
}

/// Errors raised while building a route registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("route {0} is already registered")]
    DuplicateRoute(String),

    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}
