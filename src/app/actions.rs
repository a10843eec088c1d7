use crate::app::layout::{DragTarget, Viewport};
use crate::model::{Position, SettingsPatch, Theme};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnalyzeStatus {
    Idle,
    Loading,
    Success,
    Error,
}

impl AnalyzeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyzeStatus::Idle => "idle",
            AnalyzeStatus::Loading => "loading",
            AnalyzeStatus::Success => "success",
            AnalyzeStatus::Error => "error",
        }
    }
}

/// Every mutation of `AppState` goes through one of these.
#[derive(Clone, Debug)]
pub enum Action {
    // Analysis lifecycle
    Analyze {
        repo_url: String,
        branch: Option<String>,
    },
    /// Analyze the repository of the current host page, if any.
    AnalyzeCurrentPage,
    /// Analyze the current page when the user enabled auto-analyze.
    MaybeAutoAnalyze,
    Reset,

    /// Floating control activated: expand and analyze, or collapse.
    ToggleFab,

    // Anchor / panel geometry
    SetAnchor {
        pos: Position,
        persist: bool,
    },
    SetPanelExpanded {
        expanded: bool,
        persist: bool,
    },
    SetPanelWidth(f64),
    SetViewport(Viewport),
    BeginDrag {
        target: DragTarget,
        pointer: Position,
    },
    DragTo {
        pointer: Position,
    },
    EndDrag,

    // Settings / theme / service config
    SetTheme(Theme),
    SetSystemPrefersDark(bool),
    LoadSettings,
    UpdateSettings(SettingsPatch),
    LoadConfig,
    /// Drain storage change events and reload settings if ours changed.
    SyncStorage,
}

/// Published to subscribers after a mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum StateEvent {
    StatusChanged(AnalyzeStatus),
    AnchorMoved(Position),
    PanelExpanded(bool),
    ThemeChanged(crate::app::theme::ResolvedTheme),
    SettingsLoaded,
    ConfigChanged,
}
