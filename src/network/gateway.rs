use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::NetworkError;

const JSON_UTF8: &str = "application/json;charset=UTF-8";

/// Thin JSON-over-HTTP client. Builds URLs from the configured base, sends
/// JSON bodies and maps every failure onto `NetworkError`.
#[derive(Clone)]
pub struct Gateway {
    client: reqwest::Client,
    base_url: String,
}

impl Gateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, NetworkError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON_UTF8));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .user_agent(concat!("donmani/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| {
                warn!(error = %err, "failed to build the HTTP client");
                NetworkError::RequestFailed
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL plus path segments and query pairs. Segments are
    /// percent-encoded individually.
    pub fn url(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url, NetworkError> {
        build_url(&self.base_url, segments, query)
    }

    pub async fn get<R: DeserializeOwned>(&self, url: Url) -> Result<R, NetworkError> {
        let bytes = self.execute(Method::GET, url, None).await?;
        decode(&bytes)
    }

    pub async fn send<B, R>(&self, method: Method, url: Url, body: &B) -> Result<R, NetworkError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = encode(body)?;
        let bytes = self.execute(method, url, Some(body)).await?;
        decode(&bytes)
    }

    /// Request whose response body is ignored.
    pub async fn send_empty<B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<(), NetworkError>
    where
        B: Serialize + ?Sized,
    {
        let body = body.map(encode).transpose()?;
        self.execute(method, url, body).await.map(|_| ())
    }

    /// Raw download of an absolute URL (reward resources live off the API host).
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
        let url = Url::parse(url).map_err(|_| NetworkError::InvalidUrlString)?;
        self.execute(Method::GET, url, None).await
    }

    async fn execute(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, NetworkError> {
        let mut request = self.client.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request.body(body);
        }
        let response = request.send().await.map_err(|err| {
            warn!(%method, %url, error = %err, "request failed");
            NetworkError::RequestFailed
        })?;
        let status = response.status().as_u16();
        debug!(%method, %url, status, "response received");
        if status >= 400 {
            return Err(NetworkError::ServerError {
                status_code: status,
            });
        }
        let bytes = response.bytes().await.map_err(|err| {
            warn!(%method, %url, error = %err, "failed to read response body");
            NetworkError::RequestFailed
        })?;
        Ok(bytes.to_vec())
    }
}

fn build_url(base: &str, segments: &[&str], query: &[(&str, String)]) -> Result<Url, NetworkError> {
    let mut url = Url::parse(base).map_err(|_| NetworkError::InvalidUrlString)?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| NetworkError::InvalidUrlString)?;
        path.pop_if_empty();
        for segment in segments {
            for part in segment.split('/').filter(|part| !part.is_empty()) {
                path.push(part);
            }
        }
    }
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }
    Ok(url)
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Result<Vec<u8>, NetworkError> {
    serde_json::to_vec(body).map_err(|err| {
        warn!(error = %err, "failed to encode request body");
        NetworkError::EncodingFailed
    })
}

fn decode<R: DeserializeOwned>(bytes: &[u8]) -> Result<R, NetworkError> {
    serde_json::from_slice(bytes).map_err(|err| {
        warn!(error = %err, "failed to decode response body");
        NetworkError::DecodingFailed
    })
}
