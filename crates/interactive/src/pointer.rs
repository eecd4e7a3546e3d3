//! Pointer event routing
//!
//! Turns raw [`DeviceEvent`]s into 3D [`PointerEvent`]s and dispatches them
//! up the scene graph from whatever node is under (or owns) the pointer.
//!
//! While a press is held the target is pinned: every event goes to the node
//! that received the press, whatever the ray hits now, until a release.

use glam::{Vec2, Vec3};
use marker_core::{Camera, DeviceEvent, MouseButtonType, PointerEventKind, Ray};

use crate::scene::{Intersection, NodeId, SceneGraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Propagation {
    #[default]
    Bubble,
    Stopped,
    Continued,
}

/// A pointer event in scene space.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    /// Pointer position in normalized device coordinates
    pub ndc: Vec2,
    /// World-space ray from the camera through the pointer
    pub ray: Ray,
    pub camera: Camera,
    /// Most recent scene hit; carried over from earlier events while the
    /// pointer is pinned to a drag target
    pub intersection: Option<Intersection>,
    pub button: MouseButtonType,
    pub touch_count: usize,
    propagation: Propagation,
}

impl PointerEvent {
    pub fn new(kind: PointerEventKind, ndc: Vec2, camera: &Camera, ray_precision: f32) -> Self {
        Self {
            kind,
            ndc,
            ray: camera.ray_from_ndc(ndc).with_precision(ray_precision),
            camera: *camera,
            intersection: None,
            button: MouseButtonType::Left,
            touch_count: 0,
            propagation: Propagation::Bubble,
        }
    }

    pub fn from_device(device: &DeviceEvent, camera: &Camera, ray_precision: f32) -> Self {
        let mut event = Self::new(device.kind, device.ndc(), camera, ray_precision);
        event.button = device.button;
        event.touch_count = device.touch_count;
        event
    }

    pub fn with_intersection(mut self, intersection: Option<Intersection>) -> Self {
        self.intersection = intersection;
        self
    }

    /// World-space hit point, if any.
    pub fn point(&self) -> Option<Vec3> {
        self.intersection.map(|hit| hit.point)
    }

    /// Claim the event; the walk up the scene graph ends here.
    pub fn stop_propagation(&mut self) {
        self.propagation = Propagation::Stopped;
    }

    /// Let the event pass through without a hover transition.
    pub fn continue_propagation(&mut self) {
        self.propagation = Propagation::Continued;
    }

    pub fn is_stopped(&self) -> bool {
        self.propagation == Propagation::Stopped
    }

    fn reset_propagation(&mut self) {
        self.propagation = Propagation::Bubble;
    }
}

/// Result of walking an event up the ancestor chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A handler stopped propagation
    Accepted,
    /// Reached the root without anyone claiming the event
    Failed,
    /// A handler asked for pass-through
    Continued,
}

/// Receiver of dispatched events.
///
/// `handle_event` is called once per node on the ancestor chain, starting
/// at the target.
pub trait EventSink {
    fn scene(&self) -> &SceneGraph;
    fn handle_event(&mut self, node: NodeId, event: &mut PointerEvent);
}

/// Routes pointer input to scene nodes.
#[derive(Debug, Clone)]
pub struct PointerRouter {
    last_target: Option<NodeId>,
    last_intersection: Option<Intersection>,
    dragging: bool,
    fallback: Option<NodeId>,
    ray_precision: f32,
}

impl PointerRouter {
    pub fn new(fallback: Option<NodeId>, ray_precision: f32) -> Self {
        Self {
            last_target: None,
            last_intersection: None,
            dragging: false,
            fallback,
            ray_precision,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn last_target(&self) -> Option<NodeId> {
        self.last_target
    }

    /// Forget the current target if it is no longer part of the scene.
    pub fn release_missing(&mut self, scene: &SceneGraph) {
        if self.last_target.is_some_and(|target| !scene.contains(target)) {
            tracing::debug!("Pointer target {:?} removed, releasing", self.last_target);
            self.last_target = None;
            self.last_intersection = None;
            self.dragging = false;
        }
    }

    /// Walk `event` from `target` up to the root.
    pub fn notify<S: EventSink>(
        sink: &mut S,
        target: Option<NodeId>,
        kind: PointerEventKind,
        event: &mut PointerEvent,
    ) -> DispatchOutcome {
        let Some(target) = target else {
            return DispatchOutcome::Failed;
        };
        event.kind = kind;
        event.reset_propagation();

        let chain = sink.scene().ancestors(target);
        for node in chain {
            sink.handle_event(node, event);
            match event.propagation {
                Propagation::Stopped => return DispatchOutcome::Accepted,
                Propagation::Continued => return DispatchOutcome::Continued,
                Propagation::Bubble => {}
            }
        }
        DispatchOutcome::Failed
    }

    /// Process one raw input event. Returns the outcome of delivering the
    /// event itself to its resolved target.
    pub fn process<S: EventSink>(
        &mut self,
        sink: &mut S,
        camera: &Camera,
        device: &DeviceEvent,
    ) -> DispatchOutcome {
        let kind = device.kind;
        let mut event = PointerEvent::from_device(device, camera, self.ray_precision)
            .with_intersection(self.last_intersection);

        if kind.is_leave() {
            if self.dragging {
                Self::notify(sink, self.last_target, PointerEventKind::MouseUp, &mut event);
                self.dragging = false;
            }
            let outcome = Self::notify(sink, self.last_target, kind, &mut event);
            self.last_target = None;
            return outcome;
        }

        if self.dragging {
            let outcome = Self::notify(sink, self.last_target, kind, &mut event);
            if device.releases_press() {
                self.dragging = false;
            }
            return outcome;
        }

        let mut target = match sink.scene().raycast(&event.ray) {
            Some(hit) => {
                self.last_intersection = Some(hit);
                event.intersection = Some(hit);
                Some(hit.node)
            }
            None => self.fallback,
        };

        if target != self.last_target {
            match Self::notify(sink, target, PointerEventKind::MouseOver, &mut event) {
                DispatchOutcome::Accepted => {
                    Self::notify(sink, self.last_target, PointerEventKind::MouseOut, &mut event);
                }
                DispatchOutcome::Failed => {
                    target = self.fallback;
                    if target != self.last_target {
                        Self::notify(sink, target, PointerEventKind::MouseOver, &mut event);
                        Self::notify(sink, self.last_target, PointerEventKind::MouseOut, &mut event);
                    }
                }
                DispatchOutcome::Continued => {}
            }
        }

        tracing::trace!("Routing {:?} to {:?}", kind, target);
        let outcome = Self::notify(sink, target, kind, &mut event);
        if kind.is_press() {
            self.dragging = true;
        }
        self.last_target = target;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::NodeTag;
    use glam::Vec3;
    use marker_core::{Aabb, Pose};

    /// Records deliveries; nodes named "claim" stop propagation and nodes
    /// named "pass" let events continue without a hover transition.
    struct Recorder {
        scene: SceneGraph,
        log: Vec<(String, PointerEventKind)>,
    }

    impl EventSink for Recorder {
        fn scene(&self) -> &SceneGraph {
            &self.scene
        }

        fn handle_event(&mut self, node: NodeId, event: &mut PointerEvent) {
            let Some(n) = self.scene.get(node) else {
                return;
            };
            if n.name.starts_with("claim") {
                self.log.push((n.name.clone(), event.kind));
                event.stop_propagation();
            } else if n.name.starts_with("pass") {
                self.log.push((n.name.clone(), event.kind));
                event.continue_propagation();
            } else if n.name == "viewport" {
                self.log.push((n.name.clone(), event.kind));
            }
        }
    }

    fn setup() -> (Recorder, NodeId, NodeId, NodeId) {
        let mut scene = SceneGraph::new();
        let viewport = scene.add_node(scene.root(), "viewport", NodeTag::Viewport);
        let left = scene.add_node(scene.root(), "claim_left", NodeTag::Group);
        let right = scene.add_node(scene.root(), "claim_right", NodeTag::Group);
        for (id, x) in [(left, -2.0), (right, 2.0)] {
            scene.get_mut(id).unwrap().pick_bounds =
                Some(Aabb::from_center_size(Vec3::ZERO, Vec3::ONE));
            scene.set_local_pose(id, &Pose::from_position(Vec3::new(x, 0.0, 0.0)));
        }
        (
            Recorder {
                scene,
                log: Vec::new(),
            },
            viewport,
            left,
            right,
        )
    }

    fn camera() -> Camera {
        Camera::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y)
    }

    fn device(kind: PointerEventKind, camera: &Camera, world: Vec3) -> DeviceEvent {
        let viewport = glam::Vec2::new(800.0, 600.0);
        let ndc = camera.project(world);
        let px = glam::Vec2::new((ndc.x + 1.0) * 0.5 * viewport.x, (1.0 - ndc.y) * 0.5 * viewport.y);
        DeviceEvent::mouse(kind, px, MouseButtonType::Left, viewport)
    }

    #[test]
    fn test_hover_transitions() {
        let (mut sink, viewport, left, right) = setup();
        let camera = camera().with_aspect(800.0 / 600.0);
        let mut router = PointerRouter::new(Some(viewport), 1e-4);

        router.process(&mut sink, &camera, &device(PointerEventKind::MouseMove, &camera, Vec3::new(-2.0, 0.0, 0.5)));
        assert_eq!(router.last_target(), Some(left));

        router.process(&mut sink, &camera, &device(PointerEventKind::MouseMove, &camera, Vec3::new(2.0, 0.0, 0.5)));
        assert_eq!(router.last_target(), Some(right));

        let expected = [
            ("claim_left", PointerEventKind::MouseOver),
            ("claim_left", PointerEventKind::MouseMove),
            ("claim_right", PointerEventKind::MouseOver),
            ("claim_left", PointerEventKind::MouseOut),
            ("claim_right", PointerEventKind::MouseMove),
        ];
        let log: Vec<_> = sink.log.iter().map(|(n, k)| (n.as_str(), *k)).collect();
        assert_eq!(log, expected);

        // empty space falls back to the viewport
        router.process(&mut sink, &camera, &device(PointerEventKind::MouseMove, &camera, Vec3::new(0.0, 3.0, 0.0)));
        assert_eq!(router.last_target(), Some(viewport));
    }

    #[test]
    fn test_drag_pins_target() {
        let (mut sink, viewport, left, _right) = setup();
        let camera = camera().with_aspect(800.0 / 600.0);
        let mut router = PointerRouter::new(Some(viewport), 1e-4);

        router.process(&mut sink, &camera, &device(PointerEventKind::MouseDown, &camera, Vec3::new(-2.0, 0.0, 0.5)));
        assert!(router.is_dragging());
        sink.log.clear();

        router.process(&mut sink, &camera, &device(PointerEventKind::MouseMove, &camera, Vec3::new(2.0, 0.0, 0.5)));
        assert_eq!(sink.log, vec![("claim_left".to_string(), PointerEventKind::MouseMove)]);
        assert_eq!(router.last_target(), Some(left));

        // the primary release keeps the pin so the trailing click lands on
        // the pressed target
        router.process(&mut sink, &camera, &device(PointerEventKind::MouseUp, &camera, Vec3::new(2.0, 0.0, 0.5)));
        assert!(router.is_dragging());
        router.process(&mut sink, &camera, &device(PointerEventKind::Click, &camera, Vec3::new(2.0, 0.0, 0.5)));
        assert!(!router.is_dragging());

        assert_eq!(
            sink.log[1..],
            [
                ("claim_left".to_string(), PointerEventKind::MouseUp),
                ("claim_left".to_string(), PointerEventKind::Click),
            ]
        );
        assert_eq!(router.last_target(), Some(left));
    }

    #[test]
    fn test_right_release_ends_press() {
        let (mut sink, viewport, left, _right) = setup();
        let camera = camera().with_aspect(800.0 / 600.0);
        let mut router = PointerRouter::new(Some(viewport), 1e-4);

        let mut down = device(PointerEventKind::MouseDown, &camera, Vec3::new(-2.0, 0.0, 0.5));
        down.button = MouseButtonType::Right;
        router.process(&mut sink, &camera, &down);
        assert!(router.is_dragging());

        let mut up = device(PointerEventKind::MouseUp, &camera, Vec3::new(2.0, 0.0, 0.5));
        up.button = MouseButtonType::Right;
        router.process(&mut sink, &camera, &up);
        assert!(!router.is_dragging());
        assert_eq!(sink.log.last().unwrap(), &("claim_left".to_string(), PointerEventKind::MouseUp));
        assert_eq!(router.last_target(), Some(left));
    }

    #[test]
    fn test_continued_hover_skips_transition() {
        let (mut sink, viewport, _left, _right) = setup();
        let root = sink.scene.root();
        let pass = sink.scene.add_node(root, "pass_top", NodeTag::Group);
        sink.scene.get_mut(pass).unwrap().pick_bounds = Some(Aabb::from_center_size(Vec3::ZERO, Vec3::ONE));
        sink.scene.set_local_pose(pass, &Pose::from_position(Vec3::new(0.0, 2.0, 0.0)));

        let camera = camera().with_aspect(800.0 / 600.0);
        let mut router = PointerRouter::new(Some(viewport), 1e-4);

        router.process(&mut sink, &camera, &device(PointerEventKind::MouseMove, &camera, Vec3::new(-2.0, 0.0, 0.5)));
        sink.log.clear();

        let outcome =
            router.process(&mut sink, &camera, &device(PointerEventKind::MouseMove, &camera, Vec3::new(0.0, 2.0, 0.5)));
        assert_eq!(outcome, DispatchOutcome::Continued);
        assert_eq!(
            sink.log,
            vec![
                ("pass_top".to_string(), PointerEventKind::MouseOver),
                ("pass_top".to_string(), PointerEventKind::MouseMove),
            ]
        );
        assert!(!sink.log.iter().any(|(_, kind)| *kind == PointerEventKind::MouseOut));
    }

    #[test]
    fn test_leave_releases_drag() {
        let (mut sink, viewport, _left, _right) = setup();
        let camera = camera().with_aspect(800.0 / 600.0);
        let mut router = PointerRouter::new(Some(viewport), 1e-4);

        router.process(&mut sink, &camera, &device(PointerEventKind::MouseDown, &camera, Vec3::new(-2.0, 0.0, 0.5)));
        sink.log.clear();
        router.process(&mut sink, &camera, &device(PointerEventKind::MouseOut, &camera, Vec3::ZERO));

        assert_eq!(
            sink.log,
            vec![
                ("claim_left".to_string(), PointerEventKind::MouseUp),
                ("claim_left".to_string(), PointerEventKind::MouseOut),
            ]
        );
        assert!(!router.is_dragging());
        assert_eq!(router.last_target(), None);
    }

    #[test]
    fn test_notify_without_handler_fails() {
        let (mut sink, _viewport, _left, _right) = setup();
        let camera = camera();
        let root = sink.scene.root();
        let mut event = PointerEvent::new(PointerEventKind::Click, Vec2::ZERO, &camera, 1e-4);
        assert_eq!(
            PointerRouter::notify(&mut sink, Some(root), PointerEventKind::Click, &mut event),
            DispatchOutcome::Failed
        );
        assert_eq!(
            PointerRouter::notify(&mut sink, None, PointerEventKind::Click, &mut event),
            DispatchOutcome::Failed
        );
    }
}
