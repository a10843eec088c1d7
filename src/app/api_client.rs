// src/app/api_client.rs
// Analysis service client:
// - get_config() / update_config(): service-side analysis settings
// - analyze(): run (or fetch cached) line statistics for one repository
// Every call resolves the server URL from the settings store, so edits made
// elsewhere apply to the next request.

use std::sync::Arc;

use anyhow::{Context, Result};
use regex::Regex;
use serde::de::DeserializeOwned;

use crate::analyze;
use crate::app::settings_store::{SettingsStore, DEFAULT_SERVER_URL};
use crate::model::{AnalyzeRequest, AnalyzeResponse, AppConfig};
use crate::transport::{unwrap_envelope, RequestInit, Transport, TransportError};

/// Every endpoint lives under this prefix.
pub const API_PREFIX: &str = "/api";

const API_SUFFIX: &str = r"/api/?$";

/// Strip trailing slashes and a redundant `/api` the user may have typed.
pub fn normalize_server_url(raw: &str) -> Result<String> {
    let re = Regex::new(API_SUFFIX).with_context(|| format!("Bad server url regex '{API_SUFFIX}'"))?;
    let trimmed = raw.trim().trim_end_matches('/');
    let url = re.replace(trimmed, "");
    let url = url.trim_end_matches('/');
    if url.is_empty() {
        Ok(DEFAULT_SERVER_URL.to_string())
    } else {
        Ok(url.to_string())
    }
}

#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    settings: SettingsStore,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, settings: SettingsStore) -> Self {
        Self {
            transport,
            settings,
        }
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    pub fn server_url(&self) -> Result<String> {
        normalize_server_url(&self.settings.get_settings().server_url)
    }

    /// `{server}/api{path}` through the selected transport, envelope unwrapped.
    pub fn call<T: DeserializeOwned>(&self, path: &str, init: &RequestInit) -> Result<T, TransportError> {
        let base = self
            .server_url()
            .map_err(|e| TransportError::network(format!("{:#}", e)))?;
        let url = format!("{}{}{}", base, API_PREFIX, path);
        tracing::debug!(url = %url, method = init.method.as_str(), via = self.transport.name(), "service call");
        let reply = self.transport.send(&url, init)?;
        unwrap_envelope(reply)
    }

    pub fn get_config(&self) -> Result<AppConfig, TransportError> {
        self.call("/config", &RequestInit::get())
    }

    /// Persist `config` on the service; returns what the service stored.
    pub fn update_config(&self, config: &AppConfig) -> Result<AppConfig, TransportError> {
        let init = RequestInit::post_json(config)
            .map_err(|e| TransportError::network(format!("failed to encode config: {e}")))?;
        self.call("/config", &init)
    }

    pub fn analyze(&self, req: &AnalyzeRequest) -> Result<AnalyzeResponse, TransportError> {
        let init = RequestInit::post_json(req)
            .map_err(|e| TransportError::network(format!("failed to encode request: {e}")))?;
        let resp: AnalyzeResponse = self.call("/analyze", &init)?;

        // The service is trusted; anomalies are logged, not rejected.
        if let Err(e) = analyze::validate_tree(&resp.data) {
            tracing::warn!(repo = %resp.repo, "{:#}", e);
        }
        Ok(resp)
    }
}
