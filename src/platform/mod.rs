use anyhow::Result;
use std::path::PathBuf;

use crate::app::layout::Viewport;

/// Where the client code is running, as far as network access is concerned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecutionContext {
    /// Extension-owned page or standalone process; not bound by any page policy.
    Privileged,
    /// Injected into a host page served from `origin`.
    Page { origin: String },
}

impl ExecutionContext {
    /// A secure host page may block requests to an arbitrary (often plain
    /// http) analysis server, so such contexts must not fetch directly.
    pub fn is_restricted(&self) -> bool {
        match self {
            ExecutionContext::Privileged => false,
            ExecutionContext::Page { origin } => origin
                .trim()
                .to_ascii_lowercase()
                .starts_with("https://"),
        }
    }
}

/// All environment specific behavior belongs here.
///
/// - Native: app-data dir on disk, system theme from the environment
/// - Web (embedded in a host page): no disk, restricted networking
pub trait Platform: Send + Sync {
    fn execution_context(&self) -> ExecutionContext;

    /// App-specific data dir for persisted settings.
    fn app_data_dir(&self, app_name: &str) -> Result<PathBuf>;

    /// System colour-scheme preference, consulted for the `auto` theme.
    fn prefers_dark(&self) -> bool;

    fn viewport(&self) -> Viewport;
}

pub mod native;
pub mod web;
