//! Ordered route registry.
//!
//! Entries are registered through [`RouteRegistryBuilder`] and frozen by
//! [`RouteRegistryBuilder::build`]. Registration order is kept: within a
//! fallback tier of the path matcher the earliest registered entry wins, so
//! specific patterns go before general ones that could also contain the path.

use crate::error::RegistryError;
use crate::handler::RouteHandler;
use crate::matcher::RoutePattern;
use hyper::Method;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// `"METHOD:/path"` lookup key.
pub fn route_key(method: &Method, pattern: &str) -> String {
    format!("{}:{}", method.as_str(), pattern)
}

/// Split a `"METHOD:/path"` key. The method is upper-cased.
pub fn parse_route_key(key: &str) -> Result<(Method, &str), RegistryError> {
    let invalid = |reason: &str| RegistryError::InvalidPattern {
        pattern: key.to_string(),
        reason: reason.to_string(),
    };
    let (method, pattern) = key
        .split_once(':')
        .ok_or_else(|| invalid("expected METHOD:/path"))?;
    let method = Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
        .map_err(|_| invalid("invalid HTTP method"))?;
    Ok((method, pattern))
}

pub struct RouteEntry {
    method: Method,
    pattern: RoutePattern,
    handler: Arc<dyn RouteHandler>,
}

impl RouteEntry {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    pub fn handler(&self) -> &Arc<dyn RouteHandler> {
        &self.handler
    }

    pub fn key(&self) -> String {
        route_key(&self.method, self.pattern.as_str())
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("method", &self.method)
            .field("pattern", &self.pattern.as_str())
            .finish_non_exhaustive()
    }
}

/// Immutable, ordered table of routes.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    entries: Vec<Arc<RouteEntry>>,
    index: HashMap<String, usize>,
}

impl RouteRegistry {
    pub fn builder() -> RouteRegistryBuilder {
        RouteRegistryBuilder::default()
    }

    /// Entries in registration order.
    pub fn entries(&self) -> &[Arc<RouteEntry>] {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&Arc<RouteEntry>> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    pub fn keys(&self) -> impl Iterator<Item = String> + '_ {
        self.entries.iter().map(|e| e.key())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct RouteRegistryBuilder {
    entries: Vec<Arc<RouteEntry>>,
    index: HashMap<String, usize>,
}

impl RouteRegistryBuilder {
    pub fn register(
        &mut self,
        method: Method,
        pattern: &str,
        handler: Arc<dyn RouteHandler>,
    ) -> Result<&mut Self, RegistryError> {
        let pattern = RoutePattern::parse(pattern)?;
        let key = route_key(&method, pattern.as_str());
        if self.index.contains_key(&key) {
            return Err(RegistryError::DuplicateRoute(key));
        }

        debug!("Registering mock route {}", key);
        self.index.insert(key, self.entries.len());
        self.entries.push(Arc::new(RouteEntry {
            method,
            pattern,
            handler,
        }));
        Ok(self)
    }

    /// Register from a `"METHOD:/path"` key.
    pub fn register_key(
        &mut self,
        key: &str,
        handler: Arc<dyn RouteHandler>,
    ) -> Result<&mut Self, RegistryError> {
        let (method, pattern) = parse_route_key(key)?;
        self.register(method, pattern, handler)
    }

    pub fn build(self) -> RouteRegistry {
        info!("Route registry built with {} routes", self.entries.len());
        RouteRegistry {
            entries: self.entries,
            index: self.index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::static_handler;
    use serde_json::json;

    #[test]
    fn test_registration_order_is_preserved() {
        let mut builder = RouteRegistry::builder();
        builder
            .register(Method::GET, "/api/users/me", static_handler(json!({})))
            .unwrap()
            .register(Method::GET, "/api/boards", static_handler(json!([])))
            .unwrap()
            .register(Method::DELETE, "/api/boards/", static_handler(json!({})))
            .unwrap();
        let registry = builder.build();

        let keys: Vec<String> = registry.keys().collect();
        assert_eq!(
            keys,
            vec!["GET:/api/users/me", "GET:/api/boards", "DELETE:/api/boards/"]
        );
        assert_eq!(registry.len(), 3);
        assert!(registry.get("GET:/api/boards").is_some());
        assert!(registry.get("POST:/api/boards").is_none());
    }

    #[test]
    fn test_duplicate_route_rejected() {
        let mut builder = RouteRegistry::builder();
        builder
            .register(Method::GET, "/api/pets", static_handler(json!([])))
            .unwrap();
        let err = builder
            .register_key("get:/api/pets", static_handler(json!([])))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateRoute("GET:/api/pets".into()));
    }

    #[test]
    fn test_parse_route_key() {
        let (method, pattern) = parse_route_key("delete:/api/boards/").unwrap();
        assert_eq!(method, Method::DELETE);
        assert_eq!(pattern, "/api/boards/");
        assert!(parse_route_key("/api/boards").is_err());
        assert!(parse_route_key("G ET:/api").is_err());
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let mut builder = RouteRegistry::builder();
        assert!(matches!(
            builder.register(Method::GET, "api/boards", static_handler(json!({}))),
            Err(RegistryError::InvalidPattern { .. })
        ));
    }
}
