use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Result};

use super::{HttpFetch, RawResponse, RequestInit};

/// Canned responses keyed by URL; unknown URLs fail like a refused connection.
#[derive(Default)]
pub struct ScriptedFetcher {
    replies: HashMap<String, (u16, String, Duration)>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, url: &str, status: u16, body: &str) -> Self {
        self.reply_after(url, status, body, Duration::ZERO)
    }

    pub fn reply_after(mut self, url: &str, status: u16, body: &str, delay: Duration) -> Self {
        self.replies
            .insert(url.to_string(), (status, body.to_string(), delay));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl HttpFetch for ScriptedFetcher {
    fn fetch(&self, url: &str, init: &RequestInit) -> Result<RawResponse> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", init.method.as_str(), url));

        let (status, body, delay) = self
            .replies
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("connection refused: {url}"))?;
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        Ok(RawResponse {
            status,
            body: body.into_bytes(),
        })
    }
}
