// src/app/state.rs
use std::collections::HashMap;
use std::sync::mpsc;

use crate::app::api_client::ApiClient;
use crate::app::settings_store::{SettingsStore, StorageChange};
use crate::model::{AnalyzeResponse, AppConfig, LanguageStat, Position, Theme, UserSettings};
use crate::page::PageContext;
use crate::platform::Platform;
use crate::transport::TransportError;

use super::actions::{AnalyzeStatus, StateEvent};
use super::layout::{DragSession, Viewport, DEFAULT_PANEL_HEIGHT, DEFAULT_PANEL_WIDTH};
use super::theme::{self, ResolvedTheme};

/// Completion of one analysis request, tagged with its sequence number.
pub struct AnalysisOutcome {
    pub seq: u64,
    pub result: Result<AnalyzeResponse, TransportError>,
}

pub struct AnalysisState {
    pub status: AnalyzeStatus,
    pub result: Option<AnalyzeResponse>,
    /// Languages for `result` (service-provided when available).
    pub languages: Vec<LanguageStat>,
    pub error: Option<String>,

    /// Sequence number of the most recent request; completions carrying any
    /// other number are stale and dropped.
    pub seq: u64,

    /// Workers report here; polled by the owner.
    pub(crate) tx: mpsc::Sender<AnalysisOutcome>,
    pub(crate) rx: mpsc::Receiver<AnalysisOutcome>,
}

impl AnalysisState {
    fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            status: AnalyzeStatus::Idle,
            result: None,
            languages: vec![],
            error: None,
            seq: 0,
            tx,
            rx,
        }
    }
}

/// Session-only flags for one host page (keyed by path).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PageState {
    pub panel_expanded: bool,
}

pub struct UiState {
    pub theme: Theme,
    pub effective_theme: ResolvedTheme,
    pub prefers_dark: bool,

    pub panel_expanded: bool,
    /// Floating control position; the panel is always derived from it.
    pub anchor: Position,
    pub panel_width: f64,
    pub panel_height: f64,
    pub viewport: Viewport,

    pub page_states: HashMap<String, PageState>,

    pub drag: Option<DragSession>,
    /// Set when a drag ends so the release doesn't also count as a click.
    pub suppress_click: bool,
}

pub struct AppState {
    pub client: ApiClient,
    pub store: SettingsStore,

    pub page: PageContext,

    pub analysis: AnalysisState,
    pub ui: UiState,

    /// Last settings read from the store; `None` until loaded.
    pub settings: Option<UserSettings>,
    /// Service configuration; `None` when it could not be fetched.
    pub config: Option<AppConfig>,

    storage_rx: mpsc::Receiver<StorageChange>,
    subscribers: Vec<mpsc::Sender<StateEvent>>,
}

impl AppState {
    /// `platform` is only consulted for the initial theme preference and viewport.
    pub fn new(platform: &dyn Platform, client: ApiClient, store: SettingsStore, page: PageContext) -> Self {
        let defaults = store.defaults().clone();
        let prefers_dark = platform.prefers_dark();
        let viewport = platform.viewport();
        let storage_rx = store.subscribe();

        Self {
            client,
            store,
            page,

            analysis: AnalysisState::new(),

            ui: UiState {
                theme: defaults.theme,
                effective_theme: theme::resolve(defaults.theme, prefers_dark),
                prefers_dark,
                panel_expanded: false,
                anchor: defaults.panel_position,
                panel_width: defaults.panel_width.unwrap_or(DEFAULT_PANEL_WIDTH),
                panel_height: DEFAULT_PANEL_HEIGHT,
                viewport,
                page_states: HashMap::new(),
                drag: None,
                suppress_click: false,
            },

            settings: None,
            config: None,

            storage_rx,
            subscribers: vec![],
        }
    }

    /// Observe state changes. Dropped receivers are pruned on the next event.
    pub fn subscribe(&mut self) -> mpsc::Receiver<StateEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub(crate) fn emit(&mut self, event: StateEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub(crate) fn storage_changes(&self) -> Vec<StorageChange> {
        self.storage_rx.try_iter().collect()
    }

    /// Navigate to another host page; the expanded flag follows the page.
    pub fn set_page(&mut self, page: PageContext) {
        self.page = page;
        let expanded = self
            .ui
            .page_states
            .get(self.page.key())
            .map(|p| p.panel_expanded)
            .unwrap_or(false);
        if expanded != self.ui.panel_expanded {
            self.ui.panel_expanded = expanded;
            self.emit(StateEvent::PanelExpanded(expanded));
        }
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Arc;

    use super::*;
    use crate::app::api_client::testing::{memory_settings, FakeService};
    use crate::platform::web::WebPlatform;

    pub const TEST_VIEWPORT: Viewport = Viewport {
        width: 1000.0,
        height: 800.0,
    };

    pub fn state_with(service: Arc<FakeService>, page: &str) -> AppState {
        let store = memory_settings();
        let client = ApiClient::new(service, store.clone());
        let platform = WebPlatform::new("https://github.com", TEST_VIEWPORT, false);
        AppState::new(&platform, client, store, PageContext::new(page, None))
    }

    pub fn state() -> AppState {
        state_with(Arc::new(FakeService::default()), "/o/r")
    }
}
