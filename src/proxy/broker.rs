use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::{Context, Result};

use crate::transport::{HttpFetch, RequestInit, TransportError};

use super::types::*;

/// A serialized request plus the channel its single reply goes back on.
pub struct ProxyMessage {
    pub frame: String,
    pub reply: mpsc::Sender<String>,
}

pub struct ProxyBroker {
    fetcher: Arc<dyn HttpFetch>,
}

impl ProxyBroker {
    pub fn new(fetcher: Arc<dyn HttpFetch>) -> Self {
        Self { fetcher }
    }

    /// Fetch and parse; never fails, errors become `{error}` replies.
    pub fn exec(&self, req: &ProxyRequest) -> ProxyReply {
        tracing::debug!(id = req.id, url = %req.url, "proxy fetch");
        match self.fetch_json(req) {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(id = req.id, url = %req.url, "proxy fetch failed: {:#}", e);
                ProxyReply::Failed {
                    error: format!("{:#}", e),
                }
            }
        }
    }

    fn fetch_json(&self, req: &ProxyRequest) -> Result<ProxyReply> {
        let raw = self.fetcher.fetch(&req.url, &req.options)?;
        let data: serde_json::Value = serde_json::from_slice(&raw.body)
            .with_context(|| format!("response from {} is not JSON (status {})", req.url, raw.status))?;
        Ok(ProxyReply::Fetched {
            ok: raw.is_success(),
            status: raw.status,
            data,
        })
    }

    /// Start the listener thread. It runs until every handle is dropped.
    pub fn spawn(self) -> Result<(ProxyHandle, JoinHandle<()>)> {
        let (tx, rx) = mpsc::channel::<ProxyMessage>();
        let broker = Arc::new(self);
        let join = std::thread::Builder::new()
            .name("goloc-proxy".to_string())
            .spawn(move || serve(broker, rx))
            .context("Failed to start background proxy thread")?;
        Ok((ProxyHandle::new(tx), join))
    }
}

fn serve(broker: Arc<ProxyBroker>, rx: mpsc::Receiver<ProxyMessage>) {
    for msg in rx {
        let req: ProxyRequest = match serde_json::from_str(&msg.frame) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("dropping malformed proxy frame: {e}");
                continue;
            }
        };
        if req.kind != FETCH_REQUEST {
            tracing::debug!(kind = %req.kind, "ignoring proxy message");
            continue;
        }

        // Each request gets its own worker; the reply sender lives until the
        // fetch resolves, so the caller's channel stays open for the answer.
        let broker = broker.clone();
        std::thread::spawn(move || {
            let reply = broker.exec(&req);
            let frame = ProxyResponse { id: req.id, reply };
            match serde_json::to_string(&frame) {
                Ok(text) => {
                    if msg.reply.send(text).is_err() {
                        tracing::debug!(id = req.id, "caller went away before the reply");
                    }
                }
                Err(e) => tracing::warn!(id = req.id, "failed to encode proxy reply: {e}"),
            }
        });
    }
    tracing::debug!("background proxy stopped");
}

/// Client side of the proxy channel, cheap to clone.
#[derive(Clone)]
pub struct ProxyHandle {
    tx: mpsc::Sender<ProxyMessage>,
    next_id: Arc<AtomicU64>,
}

impl ProxyHandle {
    fn new(tx: mpsc::Sender<ProxyMessage>) -> Self {
        Self {
            tx,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// A handle whose proxy is gone; every call fails.
    pub fn disconnected() -> Self {
        let (tx, _rx) = mpsc::channel();
        Self::new(tx)
    }

    /// Send one request and block for its one reply. Channel failures are
    /// network errors; fetch failures come back as `ProxyReply::Failed`.
    pub fn fetch(&self, url: &str, options: &RequestInit) -> Result<ProxyReply, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let frame = serde_json::to_string(&ProxyRequest::fetch(id, url, options))
            .map_err(|e| TransportError::network(format!("failed to encode proxy request: {e}")))?;

        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(ProxyMessage {
                frame,
                reply: reply_tx,
            })
            .map_err(|_| TransportError::network("network error: background proxy unavailable"))?;

        let text = reply_rx.recv().map_err(|_| {
            TransportError::network("network error: background proxy closed without replying")
        })?;
        let resp: ProxyResponse = serde_json::from_str(&text)
            .map_err(|e| TransportError::network(format!("network error: malformed proxy reply: {e}")))?;
        if resp.id != id {
            return Err(TransportError::network(format!(
                "network error: proxy reply {} does not match request {}",
                resp.id, id
            )));
        }
        Ok(resp.reply)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::transport::fake::ScriptedFetcher;
    use crate::transport::{ProxiedTransport, Transport};

    fn spawn(fetcher: ScriptedFetcher) -> ProxyHandle {
        let (handle, _join) = ProxyBroker::new(Arc::new(fetcher)).spawn().unwrap();
        handle
    }

    #[test]
    fn relays_status_and_parsed_body() {
        let handle = spawn(ScriptedFetcher::new().reply("http://s/api/config", 200, r#"{"code":0,"data":{}}"#));
        let reply = handle.fetch("http://s/api/config", &RequestInit::get()).unwrap();
        assert_eq!(
            reply,
            ProxyReply::Fetched {
                ok: true,
                status: 200,
                data: serde_json::json!({"code": 0, "data": {}})
            }
        );
    }

    #[test]
    fn fetch_and_parse_failures_become_error_replies() {
        let handle = spawn(ScriptedFetcher::new().reply("http://s/html", 200, "<html/>"));

        match handle.fetch("http://s/html", &RequestInit::get()).unwrap() {
            ProxyReply::Failed { error } => assert!(error.contains("not JSON"), "{error}"),
            other => panic!("unexpected {other:?}"),
        }
        match handle.fetch("http://down/api", &RequestInit::get()).unwrap() {
            ProxyReply::Failed { error } => assert!(error.contains("connection refused"), "{error}"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn proxy_error_surfaces_as_single_failure_with_its_message() {
        let t = ProxiedTransport::new(spawn(ScriptedFetcher::new()));
        let err = t.send("http://down/api", &RequestInit::get()).unwrap_err();
        assert!(matches!(err, TransportError::Proxy(_)));
        assert!(err.is_network());
        assert!(err.to_string().contains("connection refused"));
    }

    struct TimingOut;

    impl HttpFetch for TimingOut {
        fn fetch(&self, _url: &str, _init: &RequestInit) -> Result<crate::transport::RawResponse> {
            anyhow::bail!("timeout")
        }
    }

    #[test]
    fn proxy_timeout_reaches_the_caller_verbatim() {
        let (handle, _join) = ProxyBroker::new(Arc::new(TimingOut)).spawn().unwrap();
        let t = ProxiedTransport::new(handle);
        let err = t.send("http://s/api/analyze", &RequestInit::get()).unwrap_err();
        assert_eq!(err, TransportError::Proxy("timeout".into()));
        assert_eq!(err.to_string(), "timeout");
    }

    #[test]
    fn dead_proxy_is_a_network_error() {
        let err = ProxyHandle::disconnected()
            .fetch("http://s/api", &RequestInit::get())
            .unwrap_err();
        assert!(matches!(err, TransportError::Network { .. }));
        assert!(err.to_string().contains("unavailable"));
    }

    #[test]
    fn concurrent_requests_get_their_own_replies() {
        let handle = spawn(
            ScriptedFetcher::new()
                .reply_after("http://s/slow", 200, r#"{"which":"slow"}"#, Duration::from_millis(150))
                .reply("http://s/fast", 200, r#"{"which":"fast"}"#),
        );

        let slow = {
            let h = handle.clone();
            std::thread::spawn(move || h.fetch("http://s/slow", &RequestInit::get()).unwrap())
        };
        std::thread::sleep(Duration::from_millis(20));
        let fast = handle.fetch("http://s/fast", &RequestInit::get()).unwrap();
        let slow = slow.join().unwrap();

        let which = |r: &ProxyReply| match r {
            ProxyReply::Fetched { data, .. } => data["which"].as_str().unwrap().to_string(),
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(which(&fast), "fast");
        assert_eq!(which(&slow), "slow");
    }

    #[test]
    fn foreign_messages_get_no_reply() {
        let (handle, _join) = ProxyBroker::new(Arc::new(ScriptedFetcher::new())).spawn().unwrap();
        let (reply_tx, reply_rx) = mpsc::channel();
        handle
            .tx
            .send(ProxyMessage {
                frame: r#"{"type":"PING","id":1,"url":""}"#.to_string(),
                reply: reply_tx,
            })
            .unwrap();
        assert!(reply_rx.recv().is_err());
    }
}
