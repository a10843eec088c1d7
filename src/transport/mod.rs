// Transport layer: one interface, two strategies.
// - DirectTransport: fetch from this context
// - ProxiedTransport: hand the request to the background proxy (restricted pages)

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::platform::ExecutionContext;
use crate::proxy::ProxyHandle;

mod direct;
mod envelope;
mod error;
mod http;
mod proxied;

#[cfg(test)]
pub mod fake;

pub use direct::DirectTransport;
pub use envelope::unwrap_envelope;
pub use error::TransportError;
pub use http::{reason_phrase, HttpFetch, RawResponse, ReqwestFetcher};
pub use proxied::ProxiedTransport;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// Serializable request options; crosses the proxy boundary as-is.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestInit {
    pub method: Method,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl RequestInit {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post_json<T: Serialize>(body: &T) -> serde_json::Result<Self> {
        Ok(Self {
            method: Method::Post,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Some(serde_json::to_string(body)?),
        })
    }
}

/// What a strategy hands back before envelope handling.
#[derive(Clone, Debug, PartialEq)]
pub struct HttpReply {
    pub ok: bool,
    pub status: u16,
    /// Parsed JSON body; `None` when the body was not JSON.
    pub data: Option<serde_json::Value>,
}

pub trait Transport: Send + Sync {
    fn send(&self, url: &str, init: &RequestInit) -> Result<HttpReply, TransportError>;

    fn name(&self) -> &'static str;
}

/// Pick the strategy for `ctx`. Restricted contexts always go through the
/// proxy; without a running proxy every call fails as a network error.
pub fn select_transport(
    ctx: &ExecutionContext,
    fetcher: Arc<dyn HttpFetch>,
    proxy: Option<ProxyHandle>,
) -> Arc<dyn Transport> {
    if ctx.is_restricted() {
        let handle = proxy.unwrap_or_else(|| {
            tracing::warn!("restricted context without a background proxy");
            ProxyHandle::disconnected()
        });
        tracing::debug!(?ctx, "routing service calls through the background proxy");
        Arc::new(ProxiedTransport::new(handle))
    } else {
        tracing::debug!(?ctx, "routing service calls directly");
        Arc::new(DirectTransport::new(fetcher))
    }
}

#[cfg(test)]
mod tests {
    use super::fake::ScriptedFetcher;
    use super::*;

    #[test]
    fn secure_pages_get_the_proxy() {
        let fetcher: Arc<dyn HttpFetch> = Arc::new(ScriptedFetcher::new());

        let page = ExecutionContext::Page {
            origin: "https://github.com".into(),
        };
        assert_eq!(select_transport(&page, fetcher.clone(), None).name(), "proxy");

        let plain = ExecutionContext::Page {
            origin: "http://intranet.local".into(),
        };
        assert_eq!(select_transport(&plain, fetcher.clone(), None).name(), "direct");

        assert_eq!(
            select_transport(&ExecutionContext::Privileged, fetcher, None).name(),
            "direct"
        );
    }

    #[test]
    fn restricted_without_proxy_fails_as_network() {
        let fetcher: Arc<dyn HttpFetch> = Arc::new(ScriptedFetcher::new());
        let page = ExecutionContext::Page {
            origin: "https://github.com".into(),
        };
        let t = select_transport(&page, fetcher, None);
        let err = t.send("http://localhost:8080/api/config", &RequestInit::get()).unwrap_err();
        assert!(err.is_network());
    }

    #[test]
    fn post_json_sets_content_type() {
        let init = RequestInit::post_json(&serde_json::json!({"a": 1})).unwrap();
        assert_eq!(init.method, Method::Post);
        assert_eq!(init.body.as_deref(), Some(r#"{"a":1}"#));
        assert!(init
            .headers
            .iter()
            .any(|(k, v)| k == "Content-Type" && v == "application/json"));
    }
}
