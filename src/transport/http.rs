use anyhow::{Context, Result};
use reqwest::blocking::Client;

use super::{Method, RequestInit};

/// Status and raw body of a completed HTTP exchange.
#[derive(Clone, Debug)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The one place that touches the network.
pub trait HttpFetch: Send + Sync {
    fn fetch(&self, url: &str, init: &RequestInit) -> Result<RawResponse>;
}

#[derive(Clone)]
pub struct ReqwestFetcher {
    http: Client,
}

impl ReqwestFetcher {
    /// No client-side timeout: the service's own request timeout is the bound.
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .timeout(None::<std::time::Duration>)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { http })
    }
}

impl HttpFetch for ReqwestFetcher {
    fn fetch(&self, url: &str, init: &RequestInit) -> Result<RawResponse> {
        let mut rb = match init.method {
            Method::Get => self.http.get(url),
            Method::Post => self.http.post(url),
        };
        for (name, value) in &init.headers {
            rb = rb.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &init.body {
            rb = rb.body(body.clone());
        }

        let resp = rb
            .send()
            .with_context(|| format!("{} {} failed", init.method.as_str(), url))?;
        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .with_context(|| format!("Failed to read response body from {url}"))?
            .to_vec();
        Ok(RawResponse { status, body })
    }
}

/// Canonical reason phrase for a status code, empty when unknown.
pub fn reason_phrase(status: u16) -> &'static str {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("")
}
