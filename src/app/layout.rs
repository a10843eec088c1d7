// Anchor geometry.
//
// The floating control's top-left corner is the anchor and the only persisted
// position. The expanded panel is placed relative to it: at the anchor when the
// anchor sits in the left half of the viewport, otherwise to the left of it with
// the panel's right edge lined up with the control's right edge.

use crate::model::Position;

pub const FAB_SIZE: f64 = 56.0;
pub const DEFAULT_PANEL_WIDTH: f64 = 400.0;
pub const DEFAULT_PANEL_HEIGHT: f64 = 560.0;

/// Pointer travel (px) above which a press-release counts as a drag.
pub const DRAG_THRESHOLD: f64 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DockSide {
    /// Panel top-left at the anchor.
    AtAnchor,
    /// Panel extends leftwards from the control's right edge.
    LeftOfAnchor,
}

pub fn dock_side(anchor: Position, viewport: Viewport) -> DockSide {
    if anchor.x > viewport.width / 2.0 {
        DockSide::LeftOfAnchor
    } else {
        DockSide::AtAnchor
    }
}

pub fn panel_position(anchor: Position, side: DockSide, panel_width: f64) -> Position {
    match side {
        DockSide::AtAnchor => anchor,
        DockSide::LeftOfAnchor => Position::new(anchor.x + FAB_SIZE - panel_width, anchor.y),
    }
}

/// Inverse of [`panel_position`].
pub fn anchor_from_panel(panel: Position, side: DockSide, panel_width: f64) -> Position {
    match side {
        DockSide::AtAnchor => panel,
        DockSide::LeftOfAnchor => Position::new(panel.x - FAB_SIZE + panel_width, panel.y),
    }
}

/// Keep a control of `size` fully inside the viewport.
pub fn clamp_to_viewport(pos: Position, viewport: Viewport, size: [f64; 2]) -> Position {
    let max_x = (viewport.width - size[0]).max(0.0);
    let max_y = (viewport.height - size[1]).max(0.0);
    Position::new(pos.x.clamp(0.0, max_x), pos.y.clamp(0.0, max_y))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragTarget {
    Fab,
    Panel,
}

/// One pointer gesture, from press to release.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragSession {
    pub target: DragTarget,
    /// Fixed for the gesture so the inverse transform stays consistent.
    pub side: DockSide,
    /// Pointer minus control top-left at press time.
    pub grab_offset: Position,
    pub start_pointer: Position,
    /// Anchor before the gesture; restored when it turns out to be a click.
    pub start_anchor: Position,
    pub moved: bool,
}

impl DragSession {
    pub fn begin(target: DragTarget, side: DockSide, anchor: Position, control: Position, pointer: Position) -> Self {
        Self {
            target,
            side,
            grab_offset: Position::new(pointer.x - control.x, pointer.y - control.y),
            start_pointer: pointer,
            start_anchor: anchor,
            moved: false,
        }
    }

    /// Control top-left for the current pointer, before clamping.
    pub fn control_at(&self, pointer: Position) -> Position {
        Position::new(pointer.x - self.grab_offset.x, pointer.y - self.grab_offset.y)
    }

    pub fn note_pointer(&mut self, pointer: Position) {
        let dx = pointer.x - self.start_pointer.x;
        let dy = pointer.y - self.start_pointer.y;
        if (dx * dx + dy * dy).sqrt() > DRAG_THRESHOLD {
            self.moved = true;
        }
    }
}
