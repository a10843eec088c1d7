// Background proxy: a privileged, long-lived worker that performs fetches on
// behalf of restricted contexts and answers over a message channel.

mod broker;
mod types;

pub use broker::{ProxyBroker, ProxyHandle};
pub use types::ProxyReply;
