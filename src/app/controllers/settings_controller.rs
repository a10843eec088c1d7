// src/app/controllers/settings_controller.rs

use crate::app::actions::{Action, StateEvent};
use crate::app::layout::{clamp_to_viewport, DEFAULT_PANEL_WIDTH, FAB_SIZE};
use crate::app::settings_store::SETTINGS_KEY;
use crate::app::state::AppState;
use crate::app::theme;
use crate::model::{AppConfig, SettingsPatch, Theme};
use crate::transport::TransportError;

/// Groups shown on the settings surface, in display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsSection {
    Appearance,
    Behavior,
    Server,
    /// Only when the service configuration could be loaded.
    Analysis,
}

impl SettingsSection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingsSection::Appearance => "appearance",
            SettingsSection::Behavior => "behavior",
            SettingsSection::Server => "server",
            SettingsSection::Analysis => "analysis",
        }
    }
}

pub fn handle(state: &mut AppState, action: &Action) -> bool {
    match action {
        Action::SetTheme(t) => {
            state.set_theme(*t);
            true
        }
        Action::SetSystemPrefersDark(dark) => {
            state.ui.prefers_dark = *dark;
            state.refresh_effective_theme();
            true
        }
        Action::LoadSettings => {
            state.load_settings();
            true
        }
        Action::UpdateSettings(patch) => {
            state.store.save_settings(patch);
            state.load_settings();
            true
        }
        Action::LoadConfig => {
            state.load_config();
            true
        }
        Action::SyncStorage => {
            state.sync_storage();
            true
        }
        _ => false,
    }
}

impl AppState {
    fn set_theme(&mut self, t: Theme) {
        self.ui.theme = t;
        self.store.save_settings(&SettingsPatch {
            theme: Some(t),
            ..Default::default()
        });
        self.refresh_effective_theme();
    }

    fn refresh_effective_theme(&mut self) {
        let resolved = theme::resolve(self.ui.theme, self.ui.prefers_dark);
        if resolved != self.ui.effective_theme {
            self.ui.effective_theme = resolved;
            self.emit(StateEvent::ThemeChanged(resolved));
        }
    }

    pub(crate) fn load_settings(&mut self) {
        let s = self.store.get_settings();

        self.ui.theme = s.theme;
        self.refresh_effective_theme();

        // a drag in progress owns the anchor until release
        if self.ui.drag.is_none() {
            let anchor = clamp_to_viewport(s.panel_position, self.ui.viewport, [FAB_SIZE, FAB_SIZE]);
            if anchor != self.ui.anchor {
                self.ui.anchor = anchor;
                self.emit(StateEvent::AnchorMoved(anchor));
            }
        }
        self.ui.panel_width = s.panel_width.unwrap_or(DEFAULT_PANEL_WIDTH);
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

        self.settings = Some(s);
        self.emit(StateEvent::SettingsLoaded);
    }

    fn load_config(&mut self) {
        match self.client.get_config() {
            Ok(cfg) => {
                self.config = Some(cfg);
                self.emit(StateEvent::ConfigChanged);
            }
            Err(e) => {
                tracing::warn!("Failed to load service config: {}", e);
                self.config = None;
            }
        }
    }

    /// Store `config` on the service. Unlike loading, failures go back to the caller.
    pub fn update_config(&mut self, config: &AppConfig) -> Result<(), TransportError> {
        let stored = self.client.update_config(config)?;
        self.config = Some(stored);
        self.emit(StateEvent::ConfigChanged);
        Ok(())
    }

    fn sync_storage(&mut self) {
        let ours = self
            .storage_changes()
            .iter()
            .any(|c| c.key == SETTINGS_KEY);
        if ours && self.settings.is_some() {
            self.load_settings();
        }
    }

    pub fn settings_sections(&self) -> Vec<SettingsSection> {
        let mut out = vec![
            SettingsSection::Appearance,
            SettingsSection::Behavior,
            SettingsSection::Server,
        ];
        if self.config.is_some() {
            out.push(SettingsSection::Analysis);
        }
        out
    }
}
