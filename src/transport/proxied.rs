use crate::proxy::{ProxyHandle, ProxyReply};

use super::{HttpReply, RequestInit, Transport, TransportError};

/// Sends every request to the background proxy and waits for its reply.
pub struct ProxiedTransport {
    handle: ProxyHandle,
}

impl ProxiedTransport {
    pub fn new(handle: ProxyHandle) -> Self {
        Self { handle }
    }
}

impl Transport for ProxiedTransport {
    fn send(&self, url: &str, init: &RequestInit) -> Result<HttpReply, TransportError> {
        match self.handle.fetch(url, init)? {
            ProxyReply::Fetched { ok, status, data } => Ok(HttpReply {
                ok,
                status,
                data: Some(data),
            }),
            ProxyReply::Failed { error } => Err(TransportError::Proxy(error)),
        }
    }

    fn name(&self) -> &'static str {
        "proxy"
    }
}
