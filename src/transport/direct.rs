use std::sync::Arc;

use super::{HttpFetch, HttpReply, RequestInit, Transport, TransportError};

/// Fetches from the current context.
pub struct DirectTransport {
    fetcher: Arc<dyn HttpFetch>,
}

impl DirectTransport {
    pub fn new(fetcher: Arc<dyn HttpFetch>) -> Self {
        Self { fetcher }
    }
}

impl Transport for DirectTransport {
    fn send(&self, url: &str, init: &RequestInit) -> Result<HttpReply, TransportError> {
        let raw = self
            .fetcher
            .fetch(url, init)
            .map_err(|e| TransportError::network(format!("network error: {:#}", e)))?;

        Ok(HttpReply {
            ok: raw.is_success(),
            status: raw.status,
            data: serde_json::from_slice(&raw.body).ok(),
        })
    }

    fn name(&self) -> &'static str {
        "direct"
    }
}

#[cfg(test)]
mod tests {
    use super::super::fake::ScriptedFetcher;
    use super::*;

    #[test]
    fn json_and_non_json_bodies() {
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .reply("http://s/json", 200, r#"{"code":0,"data":1}"#)
                .reply("http://s/html", 502, "<html>bad gateway</html>"),
        );
        let t = DirectTransport::new(fetcher.clone());

        let ok = t.send("http://s/json", &RequestInit::get()).unwrap();
        assert!(ok.ok);
        assert_eq!(ok.data, Some(serde_json::json!({"code": 0, "data": 1})));

        let html = t.send("http://s/html", &RequestInit::get()).unwrap();
        assert!(!html.ok);
        assert_eq!(html.status, 502);
        assert!(html.data.is_none());

        assert_eq!(fetcher.calls(), vec!["GET http://s/json", "GET http://s/html"]);
    }

    #[test]
    fn connection_failures_are_network_errors() {
        let t = DirectTransport::new(Arc::new(ScriptedFetcher::new()));
        let err = t.send("http://nowhere/api", &RequestInit::get()).unwrap_err();
        assert!(err.is_network());
        assert!(err.to_string().starts_with("network error:"), "{err}");
    }
}
