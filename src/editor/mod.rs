//! Pointer-driven editing of a Custom certificate layout.
//!
//! The session never touches a `LayoutConfig` directly: every gesture is turned
//! into a [`LayoutUpdate`] handed to the caller's callback, which merges it with
//! [`LayoutConfig::apply`] or forwards it to a browser.

use crate::models::{ElementId, LabelKey, LayoutConfig, LayoutUpdate, Position, StyleProperty, MIN_ELEMENT_SCALE};

/// Horizontal distance from the centre line, in percent, that snaps to 50.
pub const CENTER_SNAP_TOLERANCE: f64 = 1.5;

/// Pixels of vertical pointer travel per unit of scale.
pub const RESIZE_PIXELS_PER_UNIT: f64 = 100.0;

/// Screen rectangle of the canvas container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragState {
    Idle,
    Moving {
        element: ElementId,
    },
    Resizing {
        element: ElementId,
        initial_y: f64,
        initial_scale: f64,
    },
}

#[derive(Debug, Clone)]
pub struct EditorSession {
    state: DragState,
    guide_visible: bool,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorSession {
    pub fn new() -> Self {
        EditorSession {
            state: DragState::Idle,
            guide_visible: false,
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn guide_visible(&self) -> bool {
        self.guide_visible
    }

    pub fn pointer_down_on_element(&mut self, element: ElementId) {
        self.state = DragState::Moving { element };
    }

    /// Starts a resize. Takes precedence over the move the same press would
    /// otherwise start on the element underneath.
    pub fn pointer_down_on_handle(&mut self, element: ElementId, pointer_y: f64, config: &LayoutConfig) {
        let initial_scale = config
            .element_styles
            .get(&element)
            .and_then(|style| style.scale)
            .unwrap_or(1.0);
        self.state = DragState::Resizing {
            element,
            initial_y: pointer_y,
            initial_scale,
        };
    }

    pub fn pointer_move(&mut self, pointer: Pointer, rect: &ContainerRect, emit: &mut impl FnMut(LayoutUpdate)) {
        match &self.state {
            DragState::Idle => {}
            DragState::Moving { element } => {
                let Some((position, snapped)) = drag_position(pointer, rect) else {
                    return;
                };
                self.guide_visible = snapped;
                emit(LayoutUpdate::Position {
                    element: element.clone(),
                    x: position.x,
                    y: position.y,
                });
            }
            DragState::Resizing {
                element,
                initial_y,
                initial_scale,
            } => {
                emit(LayoutUpdate::Style {
                    element: element.clone(),
                    property: StyleProperty::Scale(resize_scale(*initial_scale, *initial_y, pointer.y)),
                });
            }
        }
    }

    pub fn pointer_up(&mut self) {
        self.state = DragState::Idle;
        self.guide_visible = false;
    }

    /// Commits an inline caption edit; blank text keeps the previous caption.
    pub fn commit_label(&self, key: LabelKey, text: &str, previous: &str, emit: &mut impl FnMut(LayoutUpdate)) {
        let text = if text.trim().is_empty() { previous } else { text };
        emit(LayoutUpdate::Label {
            key,
            text: text.to_string(),
        });
    }

    pub fn hide(&self, element: ElementId, emit: &mut impl FnMut(LayoutUpdate)) {
        emit(LayoutUpdate::Visibility { element, visible: false });
    }
}

/// Pointer position as a clamped percentage of the container, snapping x to the
/// centre line when close enough. `None` for a collapsed container.
pub fn drag_position(pointer: Pointer, rect: &ContainerRect) -> Option<(Position, bool)> {
    if rect.width <= 0.0 || rect.height <= 0.0 {
        return None;
    }
    let position = Position::new(
        (pointer.x - rect.left) * 100.0 / rect.width,
        (pointer.y - rect.top) * 100.0 / rect.height,
    );
    if (position.x - 50.0).abs() <= CENTER_SNAP_TOLERANCE {
        Some((Position { x: 50.0, y: position.y }, true))
    } else {
        Some((position, false))
    }
}

/// Scale after dragging the handle from `initial_y` to `y`; upward grows.
pub fn resize_scale(initial_scale: f64, initial_y: f64, y: f64) -> f64 {
    (initial_scale + (initial_y - y) / RESIZE_PIXELS_PER_UNIT).max(MIN_ELEMENT_SCALE)
}
