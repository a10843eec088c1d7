use anyhow::{bail, Result};
use std::path::PathBuf;

use crate::app::layout::Viewport;

use super::{ExecutionContext, Platform};

/// Code injected into a host page.
///
/// In a page you can't:
/// - reach the extension's app-data dir (settings fall back to page-local storage)
/// - assume direct network access when the page is served over https
#[derive(Clone, Debug)]
pub struct WebPlatform {
    origin: String,
    viewport: Viewport,
    prefers_dark: bool,
}

impl WebPlatform {
    pub fn new(origin: impl Into<String>, viewport: Viewport, prefers_dark: bool) -> Self {
        Self {
            origin: origin.into(),
            viewport,
            prefers_dark,
        }
    }
}

impl Platform for WebPlatform {
    fn execution_context(&self) -> ExecutionContext {
        ExecutionContext::Page {
            origin: self.origin.clone(),
        }
    }

    fn app_data_dir(&self, _app_name: &str) -> Result<PathBuf> {
        bail!("app_data_dir is not available inside a host page")
    }

    fn prefers_dark(&self) -> bool {
        self.prefers_dark
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }
}
