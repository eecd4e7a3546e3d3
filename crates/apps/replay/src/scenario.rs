//! Scenario file format
//!
//! A scenario fixes the camera and surface size, then lists the steps to
//! feed through the client in order:
//!
//! ```json
//! {
//!   "camera": { "position": [0, 0, 10], "target": [0, 0, 0] },
//!   "viewport": [800, 600],
//!   "steps": [
//!     { "update": { "server_id": "/basic_controls", "type": 1, "markers": [] } },
//!     { "pointer": { "kind": "mouse_down", "x": 400, "y": 300 } },
//!     { "advance_ms": 300 },
//!     { "menu_select": { "marker": "box", "id": 2 } }
//!   ]
//! }
//! ```

use std::path::Path;

use anyhow::Context;
use glam::{Vec2, Vec3};
use marker_core::{Camera, DeviceEvent, MouseButtonType, PointerEventKind, DEFAULT_VFOV};
use marker_protocol::{InteractiveMarkerInit, InteractiveMarkerUpdate, TransformMsg};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CameraSetup {
    pub position: Vec3,
    #[serde(default)]
    pub target: Vec3,
    #[serde(default = "default_up")]
    pub up: Vec3,
    /// Vertical field of view in degrees
    #[serde(default)]
    pub fov: Option<f32>,
}

fn default_up() -> Vec3 {
    Vec3::Y
}

impl CameraSetup {
    pub fn to_camera(&self, viewport: Vec2) -> Camera {
        let mut camera = Camera::look_at(self.position, self.target, self.up);
        camera.vfov = self.fov.map(f32::to_radians).unwrap_or(DEFAULT_VFOV);
        if viewport.y > 0.0 {
            camera.aspect = viewport.x / viewport.y;
        }
        camera
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PointerStep {
    pub kind: PointerEventKind,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub button: MouseButtonType,
    /// Active touches for touch events; mouse input leaves this at 0
    #[serde(default)]
    pub touches: usize,
}

impl PointerStep {
    pub fn to_device_event(&self, viewport: Vec2) -> DeviceEvent {
        let mut event = DeviceEvent::mouse(self.kind, Vec2::new(self.x, self.y), self.button, viewport);
        event.touch_count = self.touches;
        event
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransformStep {
    pub frame_id: String,
    pub transform: TransformMsg,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MenuSelectStep {
    pub marker: String,
    pub id: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FrameStep {
    /// Move the camera before rendering the frame
    #[serde(default)]
    pub camera: Option<CameraSetup>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Update(InteractiveMarkerUpdate),
    Init(InteractiveMarkerInit),
    Transform(TransformStep),
    Pointer(PointerStep),
    Frame(FrameStep),
    AdvanceMs(u64),
    MenuSelect(MenuSelectStep),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub camera: CameraSetup,
    #[serde(default = "default_viewport")]
    pub viewport: Vec2,
    #[serde(default)]
    pub steps: Vec<Step>,
}

fn default_viewport() -> Vec2 {
    Vec2::new(800.0, 600.0)
}

impl Scenario {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        Self::from_json_str(&content).with_context(|| format!("Invalid scenario {}", path.display()))
    }

    pub fn from_json_str(content: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn camera(&self) -> Camera {
        self.camera.to_camera(self.viewport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"{
        "camera": { "position": [0, 0, 10] },
        "viewport": [640, 480],
        "steps": [
            { "update": { "server_id": "/basic_controls", "type": 1, "markers": [{ "name": "box", "header": { "frame_id": "base_link" } }] } },
            { "transform": { "frame_id": "base_link", "transform": { "translation": { "x": 1, "y": 0, "z": 0 } } } },
            { "frame": {} },
            { "pointer": { "kind": "mouse_down", "x": 320, "y": 240 } },
            { "pointer": { "kind": "touch_start", "x": 10, "y": 20, "touches": 1 } },
            { "advance_ms": 300 },
            { "menu_select": { "marker": "box", "id": 2 } }
        ]
    }"#;

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::from_json_str(SCENARIO).unwrap();
        assert_eq!(scenario.viewport, Vec2::new(640.0, 480.0));
        assert_eq!(scenario.steps.len(), 7);

        let Step::Update(update) = &scenario.steps[0] else {
            panic!("expected update step");
        };
        assert_eq!(update.markers[0].name, "box");

        let Step::Pointer(down) = &scenario.steps[3] else {
            panic!("expected pointer step");
        };
        assert_eq!(down.kind, PointerEventKind::MouseDown);
        assert_eq!(down.button, MouseButtonType::Left);
        assert_eq!(down.to_device_event(scenario.viewport).ndc(), Vec2::ZERO);

        let Step::Pointer(touch) = &scenario.steps[4] else {
            panic!("expected pointer step");
        };
        assert_eq!(touch.to_device_event(scenario.viewport).touch_count, 1);

        assert!(matches!(scenario.steps[5], Step::AdvanceMs(300)));
        assert!(matches!(&scenario.steps[6], Step::MenuSelect(s) if s.marker == "box" && s.id == 2));
    }

    #[test]
    fn test_camera_defaults() {
        let scenario = Scenario::from_json_str(r#"{ "camera": { "position": [0, 0, 10] } }"#).unwrap();
        let camera = scenario.camera();
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
        assert!((camera.vfov - DEFAULT_VFOV).abs() < 1e-6);
        assert!(camera.forward().abs_diff_eq(Vec3::NEG_Z, 1e-5));
        assert!(scenario.steps.is_empty());
    }

    #[test]
    fn test_unknown_step_rejected() {
        let result = Scenario::from_json_str(r#"{ "camera": { "position": [0, 0, 1] }, "steps": [{ "teleport": 1 }] }"#);
        assert!(result.is_err());
    }
}
