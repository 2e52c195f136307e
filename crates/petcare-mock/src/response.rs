//! Response envelope returned by every transport.

use crate::request::RequestSnapshot;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// `{data, status, statusText, headers, config}`, the same shape for mock and
/// real responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub data: Value,
    pub status: u16,
    pub status_text: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub config: RequestSnapshot,
}

impl ResponseEnvelope {
    /// Mock envelope: status 200, "OK", no headers.
    pub fn ok(data: Value, config: RequestSnapshot) -> Self {
        Self {
            data,
            status: 200,
            status_text: "OK".to_string(),
            headers: BTreeMap::new(),
            config,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Deserialize `data` into a typed payload.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.data)
    }
}
