use super::actions::Action;
use super::controllers::{analysis_controller, layout_controller, settings_controller};
use super::state::AppState;

impl AppState {
    pub fn apply_action(&mut self, action: Action) {
        // Keep ordering stable (settings -> analysis -> layout)
        if settings_controller::handle(self, &action) {
            return;
        }
        if analysis_controller::handle(self, &action) {
            return;
        }
        if layout_controller::handle(self, &action) {
            return;
        }
        tracing::debug!(?action, "unhandled action");
    }

    /// Pick up finished background work and external storage changes.
    pub fn tick(&mut self) {
        self.poll_analysis();
        self.apply_action(Action::SyncStorage);
    }
}
