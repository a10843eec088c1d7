use serde::{Deserialize, Serialize};

use crate::transport::RequestInit;

pub const FETCH_REQUEST: &str = "FETCH_REQUEST";

/// Frame sent from a restricted context to the proxy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProxyRequest {
    #[serde(rename = "type")]
    pub kind: String,
    /// Correlation id, echoed in the reply.
    pub id: u64,
    pub url: String,
    #[serde(default)]
    pub options: RequestInit,
}

impl ProxyRequest {
    pub fn fetch(id: u64, url: &str, options: &RequestInit) -> Self {
        Self {
            kind: FETCH_REQUEST.to_string(),
            id,
            url: url.to_string(),
            options: options.clone(),
        }
    }
}

/// `{ok, status, data}` on a completed fetch, `{error}` otherwise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProxyReply {
    Fetched {
        ok: bool,
        status: u16,
        data: serde_json::Value,
    },
    Failed {
        error: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProxyResponse {
    pub id: u64,
    #[serde(flatten)]
    pub reply: ProxyReply,
}
