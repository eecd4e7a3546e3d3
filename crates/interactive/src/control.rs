//! Interactive marker controls
//!
//! A control is one manipulation handle of a marker. It translates pointer
//! events into [`ControlAction`]s for its marker and keeps its orientation
//! in sync with the marker and the camera once per frame.

use std::f32::consts::FRAC_PI_2;

use glam::{EulerRot, Quat, Vec2, Vec3};
use marker_core::{normalize_quat, Camera, MouseButtonType, PointerEventKind};
use marker_protocol::{InteractionMode, InteractiveMarkerControlMsg, OrientationMode};

use crate::pointer::PointerEvent;
use crate::scene::{MarkerId, NodeId, NodeTag, SceneGraph};
use crate::visual::{MarkerVisual, VisualOptions};

/// Remaps the camera frame (-Z forward) so that a view-facing control's
/// X axis points away from the viewer.
fn view_facing_remap() -> Quat {
    Quat::from_euler(EulerRot::XYZ, -FRAC_PI_2, 0.0, FRAC_PI_2)
}

/// Continuous drag behaviour of a control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragMotion {
    /// Translate along a control-frame axis
    Axis(Vec3),
    /// Translate in the plane with this control-frame normal
    Plane(Vec3),
    /// Rotate about the X axis of this control-frame orientation
    Rotate(Quat),
    /// Translate in the principal plane facing the camera
    Move3D,
    /// Rotate about the principal axis facing the camera
    Rotate3D,
}

/// What a control asks its marker to do in response to an event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlAction {
    StartDrag,
    StopDrag,
    ShowMenu,
    ButtonClick,
    Drag(DragMotion),
}

#[derive(Debug, Clone)]
pub struct Control {
    pub name: String,
    pub description: String,
    pub node: NodeId,
    pub interaction_mode: InteractionMode,
    pub orientation_mode: OrientationMode,
    pub independent_marker_orientation: bool,
    pub always_visible: bool,
    /// Declared orientation of the control message
    orientation: Quat,
    /// Effective orientation relative to the marker, refreshed every frame
    current_orientation: Quat,
    hovered: bool,
    press_ndc: Option<Vec2>,
    visuals: Vec<(NodeId, MarkerVisual)>,
}

impl Control {
    /// Build a control and its scene nodes under `parent` (the marker node).
    ///
    /// Unknown mode codes are logged; the control then stays inert.
    pub fn from_msg(
        msg: &InteractiveMarkerControlMsg,
        marker: MarkerId,
        index: usize,
        parent: NodeId,
        scene: &mut SceneGraph,
        options: &VisualOptions,
    ) -> Self {
        let mut interaction_mode = InteractionMode::try_from(msg.interaction_mode).unwrap_or_else(|e| {
            tracing::warn!("Control {}: {}, treating as inert", msg.name, e);
            InteractionMode::None
        });
        let orientation_mode = OrientationMode::try_from(msg.orientation_mode).unwrap_or_else(|e| {
            tracing::warn!("Control {}: {}, treating as inert", msg.name, e);
            interaction_mode = InteractionMode::None;
            OrientationMode::Inherit
        });

        let node = scene.add_node(parent, msg.name.clone(), NodeTag::Control { marker, index });
        let visuals = msg
            .markers
            .iter()
            .filter_map(|m| MarkerVisual::from_msg(m, options))
            .map(|visual| {
                let id = scene.add_node(node, format!("{}/visual", msg.name), NodeTag::Visual);
                scene.set_local_pose(id, &visual.pose);
                if let Some(n) = scene.get_mut(id) {
                    n.pick_bounds = visual.local_bounds();
                }
                (id, visual)
            })
            .collect();

        Self {
            name: msg.name.clone(),
            description: msg.description.clone(),
            node,
            interaction_mode,
            orientation_mode,
            independent_marker_orientation: msg.independent_marker_orientation,
            always_visible: msg.always_visible,
            orientation: normalize_quat(msg.orientation.into()),
            current_orientation: Quat::IDENTITY,
            hovered: false,
            press_ndc: None,
            visuals,
        }
    }

    /// Declared control axis: X rotated by the control orientation.
    pub fn axis(&self) -> Vec3 {
        self.orientation * Vec3::X
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    pub fn current_orientation(&self) -> Quat {
        self.current_orientation
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn is_interactive(&self) -> bool {
        self.interaction_mode != InteractionMode::None
    }

    pub fn visuals(&self) -> impl Iterator<Item = &MarkerVisual> {
        self.visuals.iter().map(|(_, visual)| visual)
    }

    /// Continuous motion wired to pointer moves, if any.
    pub fn motion(&self) -> Option<DragMotion> {
        match self.interaction_mode {
            InteractionMode::MoveAxis => Some(DragMotion::Axis(self.axis())),
            InteractionMode::MovePlane | InteractionMode::MoveRotate => {
                Some(DragMotion::Plane(self.axis()))
            }
            InteractionMode::RotateAxis => Some(DragMotion::Rotate(self.orientation)),
            InteractionMode::Move3D | InteractionMode::MoveRotate3D => Some(DragMotion::Move3D),
            InteractionMode::Rotate3D => Some(DragMotion::Rotate3D),
            InteractionMode::None | InteractionMode::Menu | InteractionMode::Button => None,
        }
    }

    /// Recompute the current orientation from the orientation mode.
    ///
    /// Must run after the marker's world matrix is up to date and before
    /// any drag math of the frame.
    pub fn update_orientation(&mut self, scene: &mut SceneGraph, camera: &Camera) {
        let parent_rotation = marker_core::Pose::from_mat4(&scene.parent_world_matrix(self.node)).orientation;

        self.current_orientation = match self.orientation_mode {
            OrientationMode::Inherit => scene
                .local_pose(self.node)
                .map(|pose| pose.orientation)
                .unwrap_or(Quat::IDENTITY),
            OrientationMode::Fixed => {
                let rotation = normalize_quat(parent_rotation.inverse());
                scene.set_local_rotation(self.node, rotation);
                rotation
            }
            OrientationMode::ViewFacing => {
                let rotation =
                    normalize_quat(parent_rotation.inverse() * camera.rotation * view_facing_remap());
                if !self.independent_marker_orientation {
                    scene.set_local_rotation(self.node, rotation);
                }
                rotation
            }
        };
    }

    /// Translate a pointer event into marker actions.
    ///
    /// Single touches are handled as primary-button mouse input.
    pub fn handle_event(&mut self, event: &mut PointerEvent) -> Vec<ControlAction> {
        let mut actions = Vec::new();
        if !self.is_interactive() {
            return actions;
        }

        match event.kind {
            PointerEventKind::TouchStart if event.touch_count == 1 => {
                event.button = MouseButtonType::Left;
                self.handle_mouse(PointerEventKind::MouseDown, event, &mut actions);
            }
            PointerEventKind::TouchMove if event.touch_count == 1 => {
                self.handle_mouse(PointerEventKind::MouseMove, event, &mut actions);
            }
            PointerEventKind::TouchEnd if event.touch_count == 0 => {
                event.button = MouseButtonType::Left;
                self.handle_mouse(PointerEventKind::MouseUp, event, &mut actions);
                self.handle_mouse(PointerEventKind::Click, event, &mut actions);
            }
            kind => self.handle_mouse(kind, event, &mut actions),
        }
        actions
    }

    fn handle_mouse(
        &mut self,
        kind: PointerEventKind,
        event: &mut PointerEvent,
        actions: &mut Vec<ControlAction>,
    ) {
        match kind {
            PointerEventKind::MouseOver => {
                self.hovered = true;
                event.stop_propagation();
            }
            PointerEventKind::MouseOut => {
                self.hovered = false;
                event.stop_propagation();
            }
            PointerEventKind::Click => {
                if self.interaction_mode == InteractionMode::Button {
                    actions.push(ControlAction::ButtonClick);
                }
                event.stop_propagation();
            }
            PointerEventKind::MouseDown => {
                self.press_ndc = Some(event.ndc);
                if event.button == MouseButtonType::Left {
                    actions.push(ControlAction::StartDrag);
                }
            }
            PointerEventKind::MouseUp => {
                if event.button == MouseButtonType::Left {
                    actions.push(ControlAction::StopDrag);
                }
                // a release without motion opens the menu
                if self.press_ndc.take() == Some(event.ndc) {
                    actions.push(ControlAction::ShowMenu);
                }
            }
            PointerEventKind::ContextMenu => {
                actions.push(ControlAction::ShowMenu);
                event.stop_propagation();
            }
            PointerEventKind::MouseMove => {
                if let Some(motion) = self.motion() {
                    actions.push(ControlAction::Drag(motion));
                }
            }
            _ => {}
        }
    }
}
