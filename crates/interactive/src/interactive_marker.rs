//! Interactive marker
//!
//! Owns the controls of one marker, the drag session and the pose buffered
//! from the server while a drag is active. Drag math runs once per pointer
//! move and writes the marker's local pose; every change is queued as a
//! [`FeedbackEvent`] for the marker's handle.

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Quat, Vec3};
use marker_core::{
    closest_point_axis_to_screen_point, intersect_ray_plane, normalize_quat, Camera,
    MouseButtonType, Pose, Ray,
};
use marker_protocol::InteractiveMarkerMsg;

use crate::control::{Control, ControlAction, DragMotion};
use crate::error::{ClientError, Result};
use crate::menu::Menu;
use crate::pointer::PointerEvent;
use crate::scene::{MarkerId, NodeId, NodeTag, SceneGraph};
use crate::visual::VisualOptions;

/// Kind of a locally generated feedback event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    MouseDown,
    MouseUp,
    ButtonClick,
    PoseChange,
    MenuSelect(u32),
}

/// Feedback emitted by a marker, consumed by its handle.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackEvent {
    pub kind: FeedbackKind,
    pub control_name: String,
    /// Marker pose in the scene's fixed frame
    pub pose: Pose,
    /// World-space pointer hit that triggered the event
    pub mouse_point: Option<Vec3>,
}

/// Snapshot taken when a drag starts.
#[derive(Debug, Clone)]
pub struct DragSession {
    /// Pose relative to the marker's parent
    pub start_local: Pose,
    /// Pose decomposed from the world matrix
    pub start_world: Pose,
    /// Maps world coordinates into the marker's parent frame
    pub parent_world_inverse: Mat4,
    /// The press that started the drag
    pub start_event: PointerEvent,
    /// World-space point where the press hit the control
    pub start_point: Vec3,
}

#[derive(Debug)]
pub struct InteractiveMarker {
    id: MarkerId,
    name: String,
    pub description: String,
    pub scale: f32,
    node: NodeId,
    controls: Vec<Control>,
    menu: Option<Menu>,
    drag: Option<DragSession>,
    buffered_pose: Option<Pose>,
    feedback: Vec<FeedbackEvent>,
}

impl InteractiveMarker {
    /// Build a marker and its controls under the scene root at `pose`.
    pub fn new(
        id: MarkerId,
        msg: &InteractiveMarkerMsg,
        pose: Pose,
        scene: &mut SceneGraph,
        options: &VisualOptions,
    ) -> Self {
        let node = scene.add_node(scene.root(), msg.name.clone(), NodeTag::Marker(id));
        scene.set_local_pose(node, &pose);

        let controls = msg
            .controls
            .iter()
            .enumerate()
            .map(|(index, control)| Control::from_msg(control, id, index, node, scene, options))
            .collect();

        let menu = (!msg.menu_entries.is_empty()).then(|| Menu::from_entries(&msg.menu_entries));

        Self {
            id,
            name: msg.name.clone(),
            description: msg.description.clone(),
            scale: msg.scale,
            node,
            controls,
            menu,
            drag: None,
            buffered_pose: None,
            feedback: Vec::new(),
        }
    }

    pub fn id(&self) -> MarkerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn control(&self, name: &str) -> Option<&Control> {
        self.controls.iter().find(|c| c.name == name)
    }

    pub fn menu(&self) -> Option<&Menu> {
        self.menu.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn drag_session(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    pub fn buffered_pose(&self) -> Option<&Pose> {
        self.buffered_pose.as_ref()
    }

    /// Current pose relative to the marker's parent.
    pub fn pose(&self, scene: &SceneGraph) -> Pose {
        scene.local_pose(self.node).unwrap_or_default()
    }

    /// Per-frame refresh of control orientations.
    pub fn update(&mut self, scene: &mut SceneGraph, camera: &Camera) {
        for control in &mut self.controls {
            control.update_orientation(scene, camera);
        }
    }

    /// Take the feedback queued since the last call.
    pub fn drain_feedback(&mut self) -> Vec<FeedbackEvent> {
        std::mem::take(&mut self.feedback)
    }

    /// Handle an event delivered to one of this marker's nodes.
    pub fn handle_event(&mut self, node: NodeId, scene: &mut SceneGraph, event: &mut PointerEvent) {
        let Some(NodeTag::Control { index, .. }) = scene.get(node).map(|n| n.tag) else {
            return;
        };
        let Some(control) = self.controls.get_mut(index) else {
            return;
        };

        for action in control.handle_event(event) {
            match action {
                ControlAction::StartDrag => self.start_drag(index, scene, event),
                ControlAction::StopDrag => self.stop_drag(index, scene, event),
                ControlAction::ShowMenu => self.show_menu(index, event),
                ControlAction::ButtonClick => self.button_click(index, scene, event),
                ControlAction::Drag(motion) => self.drag(index, motion, scene, event),
            }
        }
    }

    pub fn start_drag(&mut self, index: usize, scene: &mut SceneGraph, event: &mut PointerEvent) {
        if event.button != MouseButtonType::Left {
            return;
        }
        event.stop_propagation();

        scene.update_subtree(self.node);
        let start_world = scene.world_pose(self.node);
        let start_local = self.pose(scene);
        let parent_world_inverse = scene.parent_world_matrix(self.node).inverse();
        let start_point = event.point().unwrap_or(start_world.position);

        tracing::debug!("Drag start on {}/{}", self.name, self.control_name(index));
        self.drag = Some(DragSession {
            start_local,
            start_world,
            parent_world_inverse,
            start_event: event.clone(),
            start_point,
        });
        self.emit(FeedbackKind::MouseDown, index, scene, event.point());
    }

    /// End the drag on a primary release. `MouseUp` feedback goes out on
    /// every primary release, with or without an active session.
    pub fn stop_drag(&mut self, index: usize, scene: &mut SceneGraph, event: &mut PointerEvent) {
        if event.button != MouseButtonType::Left {
            return;
        }
        event.stop_propagation();

        if self.drag.take().is_some() {
            tracing::debug!("Drag stop on {}/{}", self.name, self.control_name(index));
        }
        if let Some(pose) = self.buffered_pose.take() {
            tracing::debug!("Replaying buffered pose for {}", self.name);
            self.on_server_pose_update(pose, scene);
        }
        self.emit(FeedbackKind::MouseUp, index, scene, event.point());
    }

    /// Apply an authoritative pose, or buffer it while dragging. Only the
    /// most recent buffered pose survives.
    pub fn on_server_pose_update(&mut self, pose: Pose, scene: &mut SceneGraph) {
        if self.drag.is_some() {
            self.buffered_pose = Some(pose);
            return;
        }
        scene.set_local_pose(self.node, &pose);
    }

    pub fn show_menu(&mut self, index: usize, event: &mut PointerEvent) {
        let name = self.control_name(index).to_string();
        if let Some(menu) = &mut self.menu {
            menu.show(&name, event.ndc);
            event.stop_propagation();
        }
    }

    pub fn button_click(&mut self, index: usize, scene: &SceneGraph, event: &mut PointerEvent) {
        event.stop_propagation();
        self.emit(FeedbackKind::ButtonClick, index, scene, event.point());
    }

    /// Select a leaf of the open menu and emit a menu-select event.
    pub fn select_menu_entry(&mut self, id: u32, scene: &SceneGraph) -> Result<()> {
        let menu = self.menu.as_mut().filter(|m| m.is_open()).ok_or_else(|| {
            ClientError::MenuNotOpen {
                marker: self.name.clone(),
            }
        })?;
        let selection = menu.select(id).ok_or_else(|| ClientError::InvalidMenuSelection {
            marker: self.name.clone(),
            entry: id,
        })?;

        let event = FeedbackEvent {
            kind: FeedbackKind::MenuSelect(selection.id),
            control_name: selection.control_name,
            pose: self.pose(scene),
            mouse_point: None,
        };
        self.feedback.push(event);
        Ok(())
    }

    fn drag(&mut self, index: usize, motion: DragMotion, scene: &mut SceneGraph, event: &mut PointerEvent) {
        match motion {
            DragMotion::Axis(axis) => self.move_axis(index, axis, scene, event),
            DragMotion::Plane(normal) => self.move_plane(index, normal, scene, event),
            DragMotion::Rotate(offset) => self.rotate_axis(index, offset, scene, event),
            DragMotion::Move3D => {
                let offset = camera_facing_offset(&event.camera);
                self.move_plane(index, offset * Vec3::X, scene, event);
            }
            DragMotion::Rotate3D => {
                let offset = camera_facing_offset(&event.camera);
                self.rotate_axis(index, offset, scene, event);
            }
        }
    }

    /// Translate along `local_axis` (control frame) so the marker follows
    /// the pointer's projection onto the axis.
    pub fn move_axis(&mut self, index: usize, local_axis: Vec3, scene: &mut SceneGraph, event: &mut PointerEvent) {
        let Some(drag) = &self.drag else {
            return;
        };
        event.stop_propagation();

        let axis = self.current_orientation(index) * local_axis;
        let axis_world = drag.start_world.orientation * axis;
        let axis_ray = Ray::new(drag.start_point, axis_world);

        let Some(t) = closest_point_axis_to_screen_point(&axis_ray, &event.camera, event.ndc) else {
            return;
        };
        let position = drag.start_local.position + (drag.start_local.orientation * axis) * t;
        self.set_position(index, position, scene);
    }

    /// Translate within the plane with `local_normal` (control frame).
    pub fn move_plane(&mut self, index: usize, local_normal: Vec3, scene: &mut SceneGraph, event: &mut PointerEvent) {
        let Some(drag) = &self.drag else {
            return;
        };
        event.stop_propagation();

        let normal = self.current_orientation(index) * local_normal;
        let normal_world = drag.start_world.orientation * normal;

        let Some(hit) = intersect_ray_plane(&event.ray, drag.start_point, normal_world) else {
            return;
        };
        let world_position = drag.start_world.position + (hit - drag.start_point);
        let position = drag.parent_world_inverse.transform_point3(world_position);
        self.set_position(index, position, scene);
    }

    /// Rotate about the X axis of `offset` (control frame) by the angle the
    /// pointer swept around the rotation origin.
    pub fn rotate_axis(&mut self, index: usize, offset: Quat, scene: &mut SceneGraph, event: &mut PointerEvent) {
        let Some(drag) = &self.drag else {
            return;
        };
        event.stop_propagation();

        let orientation = self.current_orientation(index) * offset;
        let normal_world = (drag.start_world.orientation * (orientation * Vec3::X)).normalize();

        let Some(hit) = intersect_ray_plane(&event.ray, drag.start_point, normal_world) else {
            return;
        };
        let axis_ray = Ray::new(drag.start_world.position, normal_world);
        let Some(rotation_origin) = intersect_ray_plane(&axis_ray, drag.start_point, normal_world) else {
            return;
        };

        let to_plane = (drag.start_world.orientation * orientation).inverse();
        let current = to_plane * (hit - rotation_origin);
        let original = to_plane * (drag.start_point - rotation_origin);
        let angle = original.y.atan2(original.z) - current.y.atan2(current.z);

        let world = normalize_quat(Quat::from_axis_angle(normal_world, angle) * drag.start_world.orientation);
        let parent_inverse = Pose::from_mat4(&drag.parent_world_inverse).orientation;
        self.set_orientation(index, normalize_quat(parent_inverse * world), scene);
    }

    /// Remove the marker's nodes. Pending drag state and buffered poses are
    /// dropped with the marker.
    pub fn dispose(self, scene: &mut SceneGraph) {
        let removed = scene.remove_subtree(self.node);
        tracing::debug!("Disposed marker {} ({} nodes)", self.name, removed);
    }

    fn set_position(&mut self, index: usize, position: Vec3, scene: &mut SceneGraph) {
        let mut pose = self.pose(scene);
        pose.position = position;
        scene.set_local_pose(self.node, &pose);
        self.emit(FeedbackKind::PoseChange, index, scene, None);
    }

    fn set_orientation(&mut self, index: usize, orientation: Quat, scene: &mut SceneGraph) {
        let pose = Pose::new(self.pose(scene).position, orientation);
        scene.set_local_pose(self.node, &pose);
        self.emit(FeedbackKind::PoseChange, index, scene, None);
    }

    fn current_orientation(&self, index: usize) -> Quat {
        self.controls
            .get(index)
            .map(Control::current_orientation)
            .unwrap_or(Quat::IDENTITY)
    }

    fn control_name(&self, index: usize) -> &str {
        self.controls.get(index).map(|c| c.name.as_str()).unwrap_or("")
    }

    fn emit(&mut self, kind: FeedbackKind, index: usize, scene: &SceneGraph, mouse_point: Option<Vec3>) {
        let event = FeedbackEvent {
            kind,
            control_name: self.control_name(index).to_string(),
            pose: self.pose(scene),
            mouse_point,
        };
        self.feedback.push(event);
    }
}

/// Orientation whose X axis is the principal axis (X, Y or -Z) most aligned
/// with the camera's view direction.
fn camera_facing_offset(camera: &Camera) -> Quat {
    let forward = camera.forward().abs();
    if forward.y > forward.x && forward.y > forward.z {
        Quat::from_rotation_z(FRAC_PI_2)
    } else if forward.z > forward.x && forward.z > forward.y {
        Quat::from_rotation_y(FRAC_PI_2)
    } else {
        Quat::IDENTITY
    }
}
