use super::Transport;
use crate::error::ClientError;
use crate::request::ApiRequest;
use crate::response::ResponseEnvelope;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// Network transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct RealTransport {
    client: reqwest::Client,
}

impl RealTransport {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for RealTransport {
    fn name(&self) -> &'static str {
        "real"
    }

    async fn send(&self, request: &ApiRequest) -> Result<ResponseEnvelope, ClientError> {
        let url = request.full_url();
        debug!("Sending {} {}", request.method, url);

        let transport_error = |source: reqwest::Error| ClientError::Transport {
            method: request.method.clone(),
            url: url.clone(),
            source,
        };

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .query(&request.params);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let bytes = response.bytes().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(ClientError::Status {
                method: request.method.clone(),
                path: request.path(),
                status: status.as_u16(),
            });
        }

        let data = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        Ok(ResponseEnvelope {
            data,
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            headers,
            config: request.snapshot(),
        })
    }
}
