//! HTTP client factory for the metrics endpoint.
//!
//! Builds a `reqwest` client from resolved [`PrometheusConfig`]: bearer token
//! attached to every request, certificate verification disabled for
//! self-signed cluster endpoints, proxy taken from the environment. Issuing
//! queries is left to the caller.

use harness_rs_config::PrometheusConfig;
use log::debug;
use reqwest::Url;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use std::time::Duration;
use thiserror::Error;

/// Timeout for establishing a connection, TLS handshake included.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// TCP keep-alive interval.
const KEEP_ALIVE: Duration = Duration::from_secs(30);

/// Errors returned while building a metrics client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No endpoint address is configured.
    #[error("metrics address is not configured")]
    MissingAddress,
    /// The endpoint address is not a valid URL.
    #[error("invalid metrics address {address:?}: {message}")]
    InvalidAddress { address: String, message: String },
    /// The bearer token cannot be sent as a header value.
    #[error("metrics bearer token contains characters not allowed in a header")]
    InvalidToken,
    /// The underlying HTTP client could not be built.
    #[error("failed to build metrics client: {0}")]
    Build(#[from] reqwest::Error),
}

/// HTTP client bound to a metrics endpoint.
#[derive(Debug, Clone)]
pub struct MetricsClient {
    address: Url,
    http: reqwest::Client,
}

impl MetricsClient {
    /// Base address of the endpoint.
    pub fn address(&self) -> &Url {
        &self.address
    }

    /// Configured HTTP client carrying the bearer token.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Join an API path onto the endpoint address.
    pub fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.address
            .join(path.trim_start_matches('/'))
            .map_err(|err| ClientError::InvalidAddress {
                address: format!("{}{path}", self.address),
                message: err.to_string(),
            })
    }
}

/// Build a client for the configured metrics endpoint.
pub fn create_client(config: &PrometheusConfig) -> Result<MetricsClient, ClientError> {
    let raw = config.address.trim();
    if raw.is_empty() {
        return Err(ClientError::MissingAddress);
    }
    let mut address = Url::parse(raw).map_err(|err| ClientError::InvalidAddress {
        address: raw.to_string(),
        message: err.to_string(),
    })?;
    if !address.path().ends_with('/') {
        let path = format!("{}/", address.path());
        address.set_path(&path);
    }

    let http = client_builder(config)?.build()?;
    debug!(
        "metrics client created (address={address}, auth={})",
        !config.bearer_token.is_empty()
    );
    Ok(MetricsClient { address, http })
}

/// Client settings shared by every metrics client: bearer auth, no
/// certificate verification, and bounded connection setup.
fn client_builder(config: &PrometheusConfig) -> Result<reqwest::ClientBuilder, ClientError> {
    let mut headers = HeaderMap::new();
    if !config.bearer_token.is_empty() {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", config.bearer_token))
            .map_err(|_| ClientError::InvalidToken)?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(reqwest::Client::builder()
        .default_headers(headers)
        .danger_accept_invalid_certs(true)
        .connect_timeout(CONNECT_TIMEOUT)
        .tcp_keepalive(KEEP_ALIVE))
}
