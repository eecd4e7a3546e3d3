//! Device-level pointer input types
//!
//! Hosts translate their windowing/DOM events into [`DeviceEvent`]s; the
//! pointer router turns those into 3D pointer events.

use glam::Vec2;
use serde::{Deserialize, Serialize};

// ============================================================================
// Mouse Types
// ============================================================================

/// Mouse button that triggered an event. Touch input reports `Left`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButtonType {
    #[default]
    Left,
    Right,
    Middle,
}

// ============================================================================
// Pointer Events
// ============================================================================

/// Kind of a pointer event, shared by raw device events and the 3D events
/// dispatched into the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerEventKind {
    MouseDown,
    MouseUp,
    MouseMove,
    Click,
    DoubleClick,
    ContextMenu,
    MouseOver,
    MouseOut,
    Wheel,
    TouchStart,
    TouchMove,
    TouchEnd,
    TouchCancel,
    TouchLeave,
}

impl PointerEventKind {
    /// The pointer left the rendering surface.
    pub fn is_leave(self) -> bool {
        matches!(self, Self::MouseOut | Self::TouchLeave)
    }

    /// Starts a press that pins the pointer to its target.
    pub fn is_press(self) -> bool {
        matches!(self, Self::MouseDown | Self::TouchStart)
    }

    /// Ends a touch press. Mouse presses end on the click that follows
    /// the release; see [`DeviceEvent::releases_press`].
    pub fn is_touch_release(self) -> bool {
        matches!(self, Self::TouchEnd | Self::TouchCancel)
    }

    pub fn is_touch(self) -> bool {
        matches!(
            self,
            Self::TouchStart | Self::TouchMove | Self::TouchEnd | Self::TouchCancel | Self::TouchLeave
        )
    }
}

/// A raw input event in surface pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceEvent {
    pub kind: PointerEventKind,
    /// Pointer position in pixels, origin at the top-left corner
    pub position: Vec2,
    #[serde(default)]
    pub button: MouseButtonType,
    /// Number of active touches (0 for mouse input)
    #[serde(default)]
    pub touch_count: usize,
    /// Surface size in pixels
    pub viewport: Vec2,
}

impl DeviceEvent {
    pub fn mouse(kind: PointerEventKind, position: Vec2, button: MouseButtonType, viewport: Vec2) -> Self {
        Self {
            kind,
            position,
            button,
            touch_count: 0,
            viewport,
        }
    }

    /// Touch event positioned at the centroid of the active touches.
    ///
    /// When no touches remain (touch end) the last known position must be
    /// supplied as `fallback`.
    pub fn touch(kind: PointerEventKind, touches: &[Vec2], fallback: Vec2, viewport: Vec2) -> Self {
        let position = if touches.is_empty() {
            fallback
        } else {
            touches.iter().copied().sum::<Vec2>() / touches.len() as f32
        };
        Self {
            kind,
            position,
            button: MouseButtonType::Left,
            touch_count: touches.len(),
            viewport,
        }
    }

    /// Whether this event ends a press pinned to its target.
    ///
    /// A primary-button release stays pinned so the click that follows it
    /// reaches the same target. Right-button releases produce no click.
    pub fn releases_press(&self) -> bool {
        match self.kind {
            PointerEventKind::Click => true,
            PointerEventKind::MouseUp => self.button == MouseButtonType::Right,
            kind => kind.is_touch_release(),
        }
    }

    /// Normalized device coordinates, +Y up.
    pub fn ndc(&self) -> Vec2 {
        if self.viewport.x <= 0.0 || self.viewport.y <= 0.0 {
            return Vec2::ZERO;
        }
        Vec2::new(
            self.position.x / self.viewport.x * 2.0 - 1.0,
            -self.position.y / self.viewport.y * 2.0 + 1.0,
        )
    }
}
