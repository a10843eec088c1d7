use crate::app::actions::{Action, StateEvent};
use crate::app::layout::{
    anchor_from_panel, clamp_to_viewport, dock_side, panel_position, DragSession, DragTarget, Viewport, FAB_SIZE,
};
use crate::app::state::{AppState, PageState};
use crate::model::{Position, SettingsPatch};

pub fn handle(state: &mut AppState, action: &Action) -> bool {
    match action {
        Action::SetAnchor { pos, persist } => {
            state.set_anchor(*pos, *persist);
            true
        }
        Action::SetPanelExpanded { expanded, persist } => {
            state.set_panel_expanded(*expanded, *persist);
            true
        }
        Action::SetPanelWidth(width) => {
            state.set_panel_width(*width);
            true
        }
        Action::SetViewport(viewport) => {
            state.set_viewport(*viewport);
            true
        }
        Action::BeginDrag { target, pointer } => {
            state.begin_drag(*target, *pointer);
            true
        }
        Action::DragTo { pointer } => {
            state.drag_to(*pointer);
            true
        }
        Action::EndDrag => {
            state.end_drag();
            true
        }
        _ => false,
    }
}

impl AppState {
    /// Move the anchor (clamped on screen). Persisting writes it as both the
    /// panel and the control position so either reader finds the same spot.
    pub(crate) fn set_anchor(&mut self, pos: Position, persist: bool) {
        let pos = clamp_to_viewport(pos, self.ui.viewport, [FAB_SIZE, FAB_SIZE]);
        let changed = pos != self.ui.anchor;
        self.ui.anchor = pos;

        if persist {
            tracing::debug!(x = pos.x, y = pos.y, "persisting anchor");
            self.store.save_settings(&SettingsPatch {
                panel_position: Some(pos),
                fab_position: Some(pos),
                ..Default::default()
            });
        }
        if changed {
            self.emit(StateEvent::AnchorMoved(pos));
        }
    }

    /// `persist` records the flag for the current page only.
    pub(crate) fn set_panel_expanded(&mut self, expanded: bool, persist: bool) {
        let changed = expanded != self.ui.panel_expanded;
        self.ui.panel_expanded = expanded;

        if persist {
            self.ui.page_states.insert(
                self.page.key().to_string(),
                PageState {
                    panel_expanded: expanded,
                },
            );
        }
        if changed {
            self.emit(StateEvent::PanelExpanded(expanded));
        }
    }

    fn set_panel_width(&mut self, width: f64) {
        if !width.is_finite() || width < FAB_SIZE {
            tracing::warn!(width, "ignoring panel width");
            return;
        }
        self.ui.panel_width = width;
        self.store.save_settings(&SettingsPatch {
            panel_width: Some(width),
            ..Default::default()
        });
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.ui.viewport = viewport;
        let anchor = self.ui.anchor;
        self.set_anchor(anchor, false);
    }

    /// Where the expanded panel is drawn for the current anchor.
    pub fn panel_render_position(&self) -> Position {
        let side = dock_side(self.ui.anchor, self.ui.viewport);
        panel_position(self.ui.anchor, side, self.ui.panel_width)
    }

    fn begin_drag(&mut self, target: DragTarget, pointer: Position) {
        let side = dock_side(self.ui.anchor, self.ui.viewport);
        let control = match target {
            DragTarget::Fab => self.ui.anchor,
            DragTarget::Panel => panel_position(self.ui.anchor, side, self.ui.panel_width),
        };
        self.ui.drag = Some(DragSession::begin(target, side, self.ui.anchor, control, pointer));
        self.ui.suppress_click = false;
    }

    fn drag_to(&mut self, pointer: Position) {
        let Some(mut session) = self.ui.drag else {
            return;
        };

        let size = match session.target {
            DragTarget::Fab => [FAB_SIZE, FAB_SIZE],
            DragTarget::Panel => [self.ui.panel_width, self.ui.panel_height],
        };
        let control = clamp_to_viewport(session.control_at(pointer), self.ui.viewport, size);
        let anchor = match session.target {
            DragTarget::Fab => control,
            // side stays as it was at press time
            DragTarget::Panel => anchor_from_panel(control, session.side, self.ui.panel_width),
        };

        self.set_anchor(anchor, false);
        session.note_pointer(pointer);
        self.ui.drag = Some(session);
    }

    fn end_drag(&mut self) {
        let Some(session) = self.ui.drag.take() else {
            return;
        };
        if session.moved {
            let anchor = self.ui.anchor;
            self.set_anchor(anchor, true);
            self.ui.suppress_click = true;
        } else {
            // below the threshold nothing is persisted, so nothing may move
            self.set_anchor(session.start_anchor, false);
        }
    }
}
