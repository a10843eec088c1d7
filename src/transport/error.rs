use std::fmt;

/// Every way a service call can fail, as seen by callers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportError {
    /// Connection failure, unreadable body, or a broken proxy channel.
    Network { message: String, status: Option<u16> },
    /// Well-formed envelope with a non-zero code.
    Service { code: i64, message: String },
    /// Failure reported by the background proxy while fetching.
    Proxy(String),
}

impl TransportError {
    pub fn network(message: impl Into<String>) -> Self {
        TransportError::Network {
            message: message.into(),
            status: None,
        }
    }

    /// Proxy failures are reported to callers the same way as network ones.
    pub fn is_network(&self) -> bool {
        !matches!(self, TransportError::Service { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Network { status, .. } => *status,
            _ => None,
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Network { message, .. } => f.write_str(message),
            TransportError::Service { message, .. } => f.write_str(message),
            TransportError::Proxy(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for TransportError {}
