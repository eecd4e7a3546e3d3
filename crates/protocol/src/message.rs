//! Wire message types.
//!
//! Field names follow the interactive marker message definitions so the
//! JSON produced and consumed here matches a rosbridge connection. Every
//! struct defaults missing fields.

use glam::{Quat, Vec3, Vec4};
use marker_core::Pose;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};
use crate::modes::{FeedbackEventType, UpdateType};

/// Timestamp as seconds + nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Time {
    pub secs: u32,
    pub nsecs: u32,
}

impl Time {
    pub fn is_zero(&self) -> bool {
        self.secs == 0 && self.nsecs == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Header {
    pub seq: u32,
    pub stamp: Time,
    pub frame_id: String,
}

impl Header {
    pub fn new(frame_id: impl Into<String>) -> Self {
        Self {
            frame_id: frame_id.into(),
            ..Self::default()
        }
    }

    /// A zero stamp means "track this frame live" rather than "fixed at the
    /// time of the stamp".
    pub fn tracks_frame(&self) -> bool {
        self.stamp.is_zero()
    }
}

/// Point or vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointMsg {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl PointMsg {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl From<PointMsg> for Vec3 {
    fn from(p: PointMsg) -> Self {
        Vec3::new(p.x as f32, p.y as f32, p.z as f32)
    }
}

impl From<Vec3> for PointMsg {
    fn from(v: Vec3) -> Self {
        PointMsg::new(v.x as f64, v.y as f64, v.z as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuaternionMsg {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Default for QuaternionMsg {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }
}

/// Not normalized; see [`marker_core::normalize_quat`].
impl From<QuaternionMsg> for Quat {
    fn from(q: QuaternionMsg) -> Self {
        Quat::from_xyzw(q.x as f32, q.y as f32, q.z as f32, q.w as f32)
    }
}

impl From<Quat> for QuaternionMsg {
    fn from(q: Quat) -> Self {
        Self {
            x: q.x as f64,
            y: q.y as f64,
            z: q.z as f64,
            w: q.w as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseMsg {
    pub position: PointMsg,
    pub orientation: QuaternionMsg,
}

impl From<PoseMsg> for Pose {
    fn from(msg: PoseMsg) -> Self {
        Pose::new(msg.position.into(), msg.orientation.into())
    }
}

impl From<Pose> for PoseMsg {
    fn from(pose: Pose) -> Self {
        Self {
            position: pose.position.into(),
            orientation: pose.orientation.into(),
        }
    }
}

/// Frame transform as reported by the transform-lookup collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformMsg {
    pub translation: PointMsg,
    pub rotation: QuaternionMsg,
}

impl From<TransformMsg> for Pose {
    fn from(msg: TransformMsg) -> Self {
        Pose::new(msg.translation.into(), msg.rotation.into())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorRgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ColorRgba {
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn is_zero(&self) -> bool {
        self.r == 0.0 && self.g == 0.0 && self.b == 0.0 && self.a == 0.0
    }

    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(self.r, self.g, self.b, self.a)
    }
}

/// One visual primitive of a control.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerMsg {
    pub header: Header,
    pub ns: String,
    pub id: i32,
    #[serde(rename = "type")]
    pub marker_type: i32,
    pub action: i32,
    pub pose: PoseMsg,
    pub scale: PointMsg,
    pub color: ColorRgba,
    pub frame_locked: bool,
    pub points: Vec<PointMsg>,
    pub colors: Vec<ColorRgba>,
    pub text: String,
    pub mesh_resource: String,
    pub mesh_use_embedded_materials: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuEntryMsg {
    pub id: u32,
    pub parent_id: u32,
    pub title: String,
    pub command: String,
    pub command_type: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractiveMarkerControlMsg {
    pub name: String,
    pub orientation: QuaternionMsg,
    pub orientation_mode: u8,
    pub interaction_mode: u8,
    pub always_visible: bool,
    pub markers: Vec<MarkerMsg>,
    pub independent_marker_orientation: bool,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractiveMarkerMsg {
    pub header: Header,
    pub pose: PoseMsg,
    pub name: String,
    pub description: String,
    pub scale: f32,
    pub menu_entries: Vec<MenuEntryMsg>,
    pub controls: Vec<InteractiveMarkerControlMsg>,
}

/// Pose-only update for an existing marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractiveMarkerPose {
    pub header: Header,
    pub pose: PoseMsg,
    pub name: String,
}

/// Incremental update published by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractiveMarkerUpdate {
    pub server_id: String,
    pub seq_num: u64,
    #[serde(rename = "type")]
    pub update_type: u8,
    pub markers: Vec<InteractiveMarkerMsg>,
    pub poses: Vec<InteractiveMarkerPose>,
    pub erases: Vec<String>,
}

impl InteractiveMarkerUpdate {
    pub fn kind(&self) -> UpdateType {
        UpdateType::from(self.update_type)
    }
}

/// Full state snapshot returned by the init service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractiveMarkerInit {
    pub server_id: String,
    pub seq_num: u64,
    pub markers: Vec<InteractiveMarkerMsg>,
}

/// Outbound message reporting user interaction to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractiveMarkerFeedback {
    pub header: Header,
    pub client_id: String,
    pub marker_name: String,
    pub control_name: String,
    pub event_type: u8,
    pub pose: PoseMsg,
    pub menu_entry_id: u32,
    pub mouse_point: PointMsg,
    pub mouse_point_valid: bool,
}

impl InteractiveMarkerFeedback {
    pub fn event(&self) -> ProtocolResult<FeedbackEventType> {
        FeedbackEventType::try_from(self.event_type)
    }
}

/// Serialize a message to a JSON string.
pub fn to_json<T: Serialize>(message: &T) -> ProtocolResult<String> {
    serde_json::to_string(message).map_err(|e| ProtocolError::Serialization(e.to_string()))
}

/// Deserialize a message from a JSON string.
pub fn from_json<T: DeserializeOwned>(text: &str) -> ProtocolResult<T> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_from_partial_json() {
        let update: InteractiveMarkerUpdate = from_json(
            r#"{
                "server_id": "/basic_controls",
                "seq_num": 4,
                "type": 1,
                "markers": [{
                    "header": {"frame_id": "base_link"},
                    "name": "simple_6dof",
                    "pose": {"position": {"x": 1.0, "y": 2.0, "z": 0.0}},
                    "controls": [{"name": "move_x", "interaction_mode": 3}]
                }],
                "erases": ["old"]
            }"#,
        )
        .unwrap();

        assert_eq!(update.kind(), UpdateType::Update);
        assert_eq!(update.erases, vec!["old".to_string()]);
        let marker = &update.markers[0];
        assert_eq!(marker.header.frame_id, "base_link");
        assert!(marker.header.tracks_frame());
        assert_eq!(marker.pose.orientation, QuaternionMsg::default());
        assert_eq!(marker.controls[0].interaction_mode, 3);
    }

    #[test]
    fn test_marker_type_field_is_renamed() {
        let marker: MarkerMsg = from_json(r#"{"type": 2, "scale": {"x": 1, "y": 1, "z": 1}}"#).unwrap();
        assert_eq!(marker.marker_type, 2);
        let json = to_json(&marker).unwrap();
        assert!(json.contains(r#""type":2"#));
    }

    #[test]
    fn test_malformed_json_is_reported() {
        let result: ProtocolResult<InteractiveMarkerUpdate> = from_json("{not json");
        assert!(matches!(result, Err(ProtocolError::Deserialization(_))));
    }

    #[test]
    fn test_pose_conversion_normalizes() {
        let msg = PoseMsg {
            position: PointMsg::new(1.0, 0.0, 0.0),
            orientation: QuaternionMsg {
                x: 0.0,
                y: 0.0,
                z: 0.0,
                w: 2.0,
            },
        };
        let pose = Pose::from(msg);
        assert_eq!(pose.orientation, Quat::IDENTITY);
        assert_eq!(pose.position, Vec3::X);
    }
}
