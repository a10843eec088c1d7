use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{reason_phrase, HttpReply, TransportError};

#[derive(Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    data: serde_json::Value,
    #[serde(default)]
    message: Option<String>,
}

fn unreadable(status: u16) -> TransportError {
    let reason = reason_phrase(status);
    let message = if reason.is_empty() {
        format!("network error: {status}")
    } else {
        format!("network error: {status} {reason}")
    };
    TransportError::Network {
        message,
        status: Some(status),
    }
}

/// `{code, data, message}`: code 0 unwraps to `data`, anything else is a
/// service error. Bodies that are not an envelope are network errors.
pub fn unwrap_envelope<T: DeserializeOwned>(reply: HttpReply) -> Result<T, TransportError> {
    let status = reply.status;
    let Some(body) = reply.data else {
        return Err(unreadable(status));
    };
    let env: Envelope = serde_json::from_value(body).map_err(|_| unreadable(status))?;

    if env.code != 0 {
        let message = env
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("request failed: error code {}", env.code));
        return Err(TransportError::Service {
            code: env.code,
            message,
        });
    }

    serde_json::from_value(env.data).map_err(|e| TransportError::Network {
        message: format!("unexpected response payload: {e}"),
        status: Some(status),
    })
}
