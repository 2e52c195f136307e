//! Request descriptor shared by every transport.

use hyper::{Method, Uri};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Outcome attached to a placeholder request before it is sent.
#[derive(Debug, Clone, PartialEq)]
pub enum AttachedOutcome {
    Data(Value),
    Error(String),
}

/// An outgoing API request.
///
/// `attempted` marks that a mock resolution already ran for this request; it
/// lives on the request so it is never shared with another one.
#[derive(Debug)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub base_url: Option<String>,
    pub params: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
    attached: Option<AttachedOutcome>,
    attempted: AtomicBool,
}

impl Clone for ApiRequest {
    fn clone(&self) -> Self {
        Self {
            method: self.method.clone(),
            url: self.url.clone(),
            base_url: self.base_url.clone(),
            params: self.params.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
            attached: self.attached.clone(),
            attempted: AtomicBool::new(self.was_attempted()),
        }
    }
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            base_url: None,
            params: BTreeMap::new(),
            headers: BTreeMap::new(),
            body: None,
            attached: None,
            attempted: AtomicBool::new(false),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Turn this request into a placeholder that resolves with `data`.
    pub fn with_attached_data(mut self, data: Value) -> Self {
        self.attached = Some(AttachedOutcome::Data(data));
        self
    }

    /// Turn this request into a placeholder that rejects with `message`.
    pub fn with_attached_error(mut self, message: impl Into<String>) -> Self {
        self.attached = Some(AttachedOutcome::Error(message.into()));
        self
    }

    pub fn attached(&self) -> Option<&AttachedOutcome> {
        self.attached.as_ref()
    }

    /// Set the resolution marker. Returns `true` only for the call that set it.
    pub fn mark_attempted(&self) -> bool {
        !self.attempted.swap(true, Ordering::AcqRel)
    }

    pub fn was_attempted(&self) -> bool {
        self.attempted.load(Ordering::Acquire)
    }

    /// URL after joining the base URL, the way the HTTP client would.
    pub fn full_url(&self) -> String {
        match &self.base_url {
            Some(base) if !has_scheme(&self.url) => join_url(base, &self.url),
            _ => self.url.clone(),
        }
    }

    /// Path component of [`ApiRequest::full_url`], without scheme, host or query.
    pub fn path(&self) -> String {
        derive_path(&self.full_url()).0
    }

    /// Query pairs from the URL merged with `params`; explicit params win.
    pub fn query(&self) -> BTreeMap<String, String> {
        let (_, mut query) = derive_path(&self.full_url());
        query.extend(self.params.clone());
        query
    }

    pub fn snapshot(&self) -> RequestSnapshot {
        RequestSnapshot {
            method: self.method.to_string(),
            url: self.url.clone(),
            base_url: self.base_url.clone(),
            path: self.path(),
            params: self.query(),
            body: self.body.clone(),
        }
    }
}

/// Serializable view of a request, echoed as the `config` of a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSnapshot {
    pub method: String,
    pub url: String,
    #[serde(rename = "baseURL", skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub path: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl RequestSnapshot {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

pub fn has_scheme(url: &str) -> bool {
    url.find("://")
        .map(|idx| {
            idx > 0
                && url[..idx]
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
        })
        .unwrap_or(false)
}

pub fn join_url(base: &str, url: &str) -> String {
    if url.is_empty() {
        return base.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        url.trim_start_matches('/')
    )
}

/// Split a raw URL into its path and query pairs.
///
/// Absolute URLs are parsed; if parsing fails the raw string is returned
/// unmodified with no query pairs. Never fails.
pub fn derive_path(raw: &str) -> (String, BTreeMap<String, String>) {
    if has_scheme(raw) {
        return match raw.parse::<Uri>() {
            Ok(uri) => (
                uri.path().to_string(),
                parse_query_string(uri.query().unwrap_or("")),
            ),
            Err(_) => (raw.to_string(), BTreeMap::new()),
        };
    }

    let without_fragment = raw.split('#').next().unwrap_or(raw);
    match without_fragment.split_once('?') {
        Some((path, query)) => (path.to_string(), parse_query_string(query)),
        None => (without_fragment.to_string(), BTreeMap::new()),
    }
}

pub fn parse_query_string(query: &str) -> BTreeMap<String, String> {
    query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let decoded_key = urlencoding::decode(key).unwrap_or_default().into_owned();
            let decoded_value = urlencoding::decode(value).unwrap_or_default().into_owned();
            (decoded_key, decoded_value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_derive_path_relative() {
        let (path, query) = derive_path("/api/boards?page=1&size=5");
        assert_eq!(path, "/api/boards");
        assert_eq!(query.get("page").map(String::as_str), Some("1"));
        assert_eq!(query.get("size").map(String::as_str), Some("5"));
    }

    #[test]
    fn test_derive_path_absolute() {
        let (path, query) = derive_path("https://api.petcare.test/api/pets/3?expand=owner%2Cvet");
        assert_eq!(path, "/api/pets/3");
        assert_eq!(query.get("expand").map(String::as_str), Some("owner,vet"));
    }

    #[test]
    fn test_derive_path_unparseable_absolute_is_kept_raw() {
        let raw = "http://bad host/api/boards";
        let (path, query) = derive_path(raw);
        assert_eq!(path, raw);
        assert!(query.is_empty());
    }

    #[test]
    fn test_full_url_joins_base() {
        let req = ApiRequest::get("/api/boards").with_base_url("http://localhost:8080/");
        assert_eq!(req.full_url(), "http://localhost:8080/api/boards");
        assert_eq!(req.path(), "/api/boards");

        let absolute = ApiRequest::get("http://other/api/pets").with_base_url("http://localhost");
        assert_eq!(absolute.full_url(), "http://other/api/pets");
    }

    #[test]
    fn test_explicit_params_override_url_query() {
        let req = ApiRequest::get("/api/boards?page=1&sort=new").with_param("page", 3);
        let query = req.query();
        assert_eq!(query.get("page").map(String::as_str), Some("3"));
        assert_eq!(query.get("sort").map(String::as_str), Some("new"));
    }

    #[test]
    fn test_mark_attempted_only_once() {
        let req = ApiRequest::get("/api/boards");
        assert!(!req.was_attempted());
        assert!(req.mark_attempted());
        assert!(!req.mark_attempted());
        assert!(req.was_attempted());
        assert!(req.clone().was_attempted());
    }

    #[test]
    fn test_snapshot_serializes_base_url_key() {
        let req = ApiRequest::new(Method::POST, "/api/boards")
            .with_base_url("http://localhost")
            .with_body(json!({"title": "Lost cat"}));
        let value = serde_json::to_value(req.snapshot()).unwrap();
        assert_eq!(value["baseURL"], "http://localhost");
        assert_eq!(value["method"], "POST");
        assert_eq!(value["path"], "/api/boards");
        assert_eq!(value["body"]["title"], "Lost cat");
    }
}
