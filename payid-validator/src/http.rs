//! The diagnostic request layer.
//!
//! Issues the single primary GET against the discovery URL and, when the
//! Access-Control-Allow-Methods check asks for it, one secondary OPTIONS
//! preflight to the same URL. Captures status, headers, body, and the
//! wall-clock transfer time.

use crate::errors::map_request_error;
use crate::{Result, ValidatorError};
use reqwest::header::{HeaderMap, ACCEPT};
use reqwest::Method;
use std::time::{Duration, Instant};

/// User agent sent with every request the validator makes.
pub const USER_AGENT: &str = "PayIDValidator.com / 0.1.0";

/// Protocol version header name.
pub const PAYID_VERSION_HEADER: &str = "PayID-Version";

/// Protocol version sent with every request.
pub const PAYID_VERSION: &str = "1.0";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const TOTAL_TIMEOUT: Duration = Duration::from_secs(10);

/// A fully captured HTTP response, detached from the client.
#[derive(Clone, Debug)]
pub struct FetchedResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers as received.
    pub headers: HeaderMap,
    /// Response body text.
    pub body: String,
    /// Wall-clock time from send to fully read body.
    pub elapsed: Duration,
}

impl FetchedResponse {
    /// Whether the named header is present.
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    /// All values of the named header joined with `, `, or `None` when the
    /// header is absent.
    pub fn header_line(&self, name: &str) -> Option<String> {
        if !self.headers.contains_key(name) {
            return None;
        }
        let values: Vec<&str> = self
            .headers
            .get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect();
        Some(values.join(", "))
    }
}

/// Builds and issues the diagnostic requests for one validation session.
pub struct RequestOrchestrator {
    client: reqwest::Client,
}

impl RequestOrchestrator {
    /// Create the orchestrator with the protocol's fixed request profile.
    pub fn new() -> Result<Self> {
        // Certificate verification is disabled so servers with broken TLS
        // setups can still be diagnosed. Known operational risk.
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(TOTAL_TIMEOUT)
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| ValidatorError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Issue the primary discovery GET.
    pub async fn fetch(&self, url: &str, accept: &str) -> Result<FetchedResponse> {
        self.execute(Method::GET, url, accept).await
    }

    /// Issue the secondary OPTIONS preflight used to recheck
    /// `Access-Control-Allow-Methods`.
    pub async fn options_preflight(&self, url: &str, accept: &str) -> Result<FetchedResponse> {
        self.execute(Method::OPTIONS, url, accept).await
    }

    async fn execute(&self, method: Method, url: &str, accept: &str) -> Result<FetchedResponse> {
        let started = Instant::now();

        let response = self
            .client
            .request(method, url)
            .header(ACCEPT, accept)
            .header(PAYID_VERSION_HEADER, PAYID_VERSION)
            .send()
            .await
            .map_err(|e| map_request_error(e, url, TOTAL_TIMEOUT.as_millis() as u64))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|e| ValidatorError::Serialization(format!("failed to read body: {e}")))?;

        Ok(FetchedResponse {
            status,
            headers,
            body,
            elapsed: started.elapsed(),
        })
    }
}
