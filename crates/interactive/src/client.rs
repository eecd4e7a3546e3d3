//! Interactive marker client
//!
//! Keeps the set of live markers in sync with the server's update stream,
//! routes pointer input into them and forwards their feedback through each
//! marker's handle.

use std::collections::HashMap;
use std::time::Instant;

use marker_core::{Camera, DeviceEvent, Pose};
use marker_protocol::{
    FeedbackSink, InteractiveMarkerInit, InteractiveMarkerMsg, InteractiveMarkerUpdate,
    TransformSubscriber, UpdateType,
};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::handle::MarkerHandle;
use crate::interactive_marker::InteractiveMarker;
use crate::pointer::{DispatchOutcome, EventSink, PointerEvent, PointerRouter};
use crate::scene::{MarkerId, NodeId, NodeTag, SceneGraph};
use crate::visual::VisualOptions;

/// Scene plus the markers living in it; the dispatch target of the router.
#[derive(Debug)]
struct MarkerWorld {
    scene: SceneGraph,
    markers: HashMap<MarkerId, InteractiveMarker>,
    viewport: NodeId,
    viewport_events: Vec<PointerEvent>,
}

impl EventSink for MarkerWorld {
    fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    fn handle_event(&mut self, node: NodeId, event: &mut PointerEvent) {
        let Some(tag) = self.scene.get(node).map(|n| n.tag) else {
            return;
        };
        match tag {
            NodeTag::Control { marker, .. } => {
                if let Some(marker) = self.markers.get_mut(&marker) {
                    marker.handle_event(node, &mut self.scene, event);
                }
            }
            NodeTag::Viewport => {
                self.viewport_events.push(event.clone());
                event.stop_propagation();
            }
            NodeTag::Group | NodeTag::Marker(_) | NodeTag::Visual => {}
        }
    }
}

pub struct InteractiveMarkerClient<S, T> {
    config: ClientConfig,
    visual_options: VisualOptions,
    world: MarkerWorld,
    router: PointerRouter,
    handles: HashMap<MarkerId, MarkerHandle>,
    names: HashMap<String, MarkerId>,
    /// Latest transform of every frame reported so far
    frames: HashMap<String, Pose>,
    next_id: u32,
    camera: Camera,
    sink: S,
    transforms: T,
}

impl<S: FeedbackSink, T: TransformSubscriber> InteractiveMarkerClient<S, T> {
    pub fn new(config: ClientConfig, sink: S, transforms: T) -> Self {
        let mut scene = SceneGraph::new();
        let viewport = scene.add_node(scene.root(), "viewport", NodeTag::Viewport);
        let visual_options = VisualOptions {
            mesh_path: config.mesh_base(),
            max_list_items: config.max_list_items,
        };

        Self {
            router: PointerRouter::new(Some(viewport), config.ray_precision),
            config,
            visual_options,
            world: MarkerWorld {
                scene,
                markers: HashMap::new(),
                viewport,
                viewport_events: Vec::new(),
            },
            handles: HashMap::new(),
            names: HashMap::new(),
            frames: HashMap::new(),
            next_id: 0,
            camera: Camera::default(),
            sink,
            transforms,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.world.scene
    }

    pub fn router(&self) -> &PointerRouter {
        &self.router
    }

    pub fn viewport(&self) -> NodeId {
        self.world.viewport
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn transforms(&self) -> &T {
        &self.transforms
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn marker_names(&self) -> impl Iterator<Item = &str> {
        self.names.keys().map(String::as_str)
    }

    pub fn marker(&self, name: &str) -> Option<&InteractiveMarker> {
        let id = self.names.get(name)?;
        self.world.markers.get(id)
    }

    pub fn handle(&self, name: &str) -> Option<&MarkerHandle> {
        let id = self.names.get(name)?;
        self.handles.get(id)
    }

    /// Apply an incremental update: erases, then poses, then adds.
    pub fn process_update(&mut self, update: &InteractiveMarkerUpdate) {
        if update.kind() == UpdateType::KeepAlive {
            tracing::trace!("Keep-alive from {}", update.server_id);
            return;
        }

        for name in &update.erases {
            if let Err(e) = self.erase(name) {
                tracing::warn!("Cannot erase: {}", e);
            }
        }

        for entry in &update.poses {
            let Some(id) = self.names.get(&entry.name).copied() else {
                tracing::warn!("Pose update for unknown marker {}", entry.name);
                continue;
            };
            let Some(handle) = self.handles.get_mut(&id) else {
                continue;
            };
            let pose = handle.set_pose_from_server(entry.pose.into());
            if let Some(marker) = self.world.markers.get_mut(&id) {
                marker.on_server_pose_update(pose, &mut self.world.scene);
            }
        }

        for msg in &update.markers {
            self.add(msg);
        }
    }

    /// Replace every marker with the contents of an init snapshot.
    pub fn process_init(&mut self, init: &InteractiveMarkerInit) {
        tracing::info!("Init from {} with {} markers", init.server_id, init.markers.len());
        self.clear();
        for msg in &init.markers {
            self.add(msg);
        }
    }

    /// A tracked frame moved; re-place every marker in it.
    pub fn on_transform(&mut self, frame_id: &str, transform: Pose) {
        self.frames.insert(frame_id.to_string(), transform);

        for (id, handle) in &mut self.handles {
            if !handle.tracks_frame() || handle.frame_id() != frame_id {
                continue;
            }
            let pose = handle.on_transform(transform);
            if let Some(marker) = self.world.markers.get_mut(id) {
                marker.on_server_pose_update(pose, &mut self.world.scene);
            }
        }
    }

    /// Per-frame update: world matrices, then control orientations for
    /// this frame's camera.
    pub fn update(&mut self, camera: &Camera) {
        self.camera = *camera;
        self.world.scene.update_world_matrices();
        for marker in self.world.markers.values_mut() {
            marker.update(&mut self.world.scene, camera);
        }
    }

    pub fn handle_device_event(&mut self, event: &DeviceEvent) -> DispatchOutcome {
        self.handle_device_event_at(event, Instant::now())
    }

    /// Route one input event; feedback it produces is published with `now`
    /// as the reference time for repeat sends.
    pub fn handle_device_event_at(&mut self, event: &DeviceEvent, now: Instant) -> DispatchOutcome {
        let outcome = self.router.process(&mut self.world, &self.camera, event);
        self.flush_feedback(now);
        outcome
    }

    /// Fire due pose repeats. Returns the number of messages sent.
    pub fn poll(&mut self, now: Instant) -> usize {
        let mut sent = 0;
        for handle in self.handles.values_mut() {
            match handle.poll(now, &mut self.sink) {
                Ok(true) => sent += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!("Failed to repeat feedback for {}: {}", handle.name(), e),
            }
        }
        sent
    }

    pub fn select_menu_entry(&mut self, marker: &str, id: u32) -> Result<()> {
        let marker_id = self
            .names
            .get(marker)
            .copied()
            .ok_or_else(|| ClientError::UnknownMarker(marker.to_string()))?;
        let Some(interactive) = self.world.markers.get_mut(&marker_id) else {
            return Err(ClientError::UnknownMarker(marker.to_string()));
        };
        interactive.select_menu_entry(id, &self.world.scene)?;
        self.flush_feedback(Instant::now());
        Ok(())
    }

    /// Remove a marker: its frame subscription, pending repeat, buffered
    /// pose and scene nodes go with it.
    pub fn erase(&mut self, name: &str) -> Result<()> {
        let id = self
            .names
            .remove(name)
            .ok_or_else(|| ClientError::UnknownMarker(name.to_string()))?;

        if let Some(mut handle) = self.handles.remove(&id) {
            handle.cancel_repeat();
            if handle.tracks_frame() {
                self.transforms.unsubscribe(handle.frame_id());
            }
        }
        if let Some(marker) = self.world.markers.remove(&id) {
            marker.dispose(&mut self.world.scene);
        }
        self.router.release_missing(&self.world.scene);
        tracing::debug!("Erased marker {}", name);
        Ok(())
    }

    pub fn clear(&mut self) {
        let names: Vec<String> = self.names.keys().cloned().collect();
        for name in names {
            if let Err(e) = self.erase(&name) {
                tracing::warn!("Cannot erase: {}", e);
            }
        }
    }

    /// Events nobody in the scene claimed, for camera controls and the like.
    pub fn drain_viewport_events(&mut self) -> Vec<PointerEvent> {
        std::mem::take(&mut self.world.viewport_events)
    }

    fn add(&mut self, msg: &InteractiveMarkerMsg) {
        if self.names.contains_key(&msg.name) {
            if let Err(e) = self.erase(&msg.name) {
                tracing::warn!("Cannot replace marker: {}", e);
            }
        }

        let id = MarkerId(self.next_id);
        self.next_id += 1;

        let mut handle = MarkerHandle::new(msg, &self.config);
        if handle.tracks_frame() {
            self.transforms.subscribe(handle.frame_id());
            if let Some(transform) = self.frames.get(handle.frame_id()) {
                handle.on_transform(*transform);
            }
        }

        let mut marker = InteractiveMarker::new(
            id,
            msg,
            handle.marker_pose(),
            &mut self.world.scene,
            &self.visual_options,
        );
        marker.update(&mut self.world.scene, &self.camera);

        tracing::debug!(
            "Added marker {} in {} with {} controls",
            msg.name,
            handle.frame_id(),
            marker.controls().len()
        );
        self.names.insert(msg.name.clone(), id);
        self.handles.insert(id, handle);
        self.world.markers.insert(id, marker);
    }

    fn flush_feedback(&mut self, now: Instant) {
        for (id, marker) in &mut self.world.markers {
            let feedback = marker.drain_feedback();
            let Some(handle) = self.handles.get_mut(id) else {
                continue;
            };
            for event in &feedback {
                if let Err(e) = handle.handle_feedback(event, now, &mut self.sink) {
                    tracing::warn!("Failed to publish feedback for {}: {}", marker.name(), e);
                }
            }
        }
    }
}
