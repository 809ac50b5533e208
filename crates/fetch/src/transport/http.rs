//! reqwest-backed transport

use super::{Transport, TransportRequest, TransportResponse};
use async_trait::async_trait;
use mlit_config::ApiConfig;
use mlit_core::{classify_body, Error, Result, CREDENTIAL_HEADER};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Sends requests to the upstream API over HTTPS
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    /// Create a transport; `base_url` must end with `/` for endpoints to join beneath it
    pub fn new(base_url: Url, timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, base_url })
    }

    pub fn from_config(api: &ApiConfig) -> Result<Self> {
        Self::new(api.base_url.clone(), api.timeout, &api.user_agent)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join an endpoint beneath the base URL; the result must stay under it
    fn url_for(&self, endpoint: &str) -> Result<Url> {
        let url = self.base_url.join(endpoint).map_err(|e| {
            Error::invalid_parameter("endpoint", format!("cannot join '{endpoint}': {e}"))
        })?;
        let escapes = url.origin() != self.base_url.origin()
            || !url.path().starts_with(self.base_url.path());
        if escapes {
            return Err(Error::invalid_parameter(
                "endpoint",
                format!("'{endpoint}' resolves outside {}", self.base_url),
            ));
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, request: &TransportRequest) -> Result<TransportResponse> {
        let url = self.url_for(&request.endpoint)?;
        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .query(&request.query);

        if let Some(credential) = &request.credential {
            let mut value = HeaderValue::from_str(credential.expose()).map_err(|_| {
                Error::configuration("API key contains characters not allowed in an HTTP header")
            })?;
            value.set_sensitive(true);
            builder = builder.header(CREDENTIAL_HEADER, value);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::fetch(request.endpoint.as_str(), None, describe(&e)))?;

        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::fetch(request.endpoint.as_str(), Some(status), describe(&e)))?;

        tracing::debug!(
            endpoint = %request.endpoint,
            status,
            size_bytes = body.len(),
            content_type = content_type.as_deref().unwrap_or("-"),
            "received upstream response"
        );

        Ok(TransportResponse {
            status,
            headers,
            body: classify_body(content_type.as_deref(), body),
        })
    }
}

fn describe(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timed out: {error}")
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else {
        error.to_string()
    }
}
