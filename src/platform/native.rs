use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

use crate::app::layout::Viewport;

use super::{ExecutionContext, Platform};

#[derive(Clone, Debug)]
pub struct NativePlatform {
    viewport: Viewport,
}

impl NativePlatform {
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport }
    }
}

impl Platform for NativePlatform {
    fn execution_context(&self) -> ExecutionContext {
        ExecutionContext::Privileged
    }

    fn app_data_dir(&self, app_name: &str) -> Result<PathBuf> {
        // org/qualifier can be anything stable for the app. Keep it constant.
        let pd = ProjectDirs::from("dev", "GoLoc", app_name)
            .context("Failed to resolve platform app data directory (ProjectDirs::from)")?;
        Ok(pd.data_dir().to_path_buf())
    }

    fn prefers_dark(&self) -> bool {
        std::env::var("GOLOC_THEME")
            .map(|v| v.trim().eq_ignore_ascii_case("dark"))
            .unwrap_or(false)
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }
}
