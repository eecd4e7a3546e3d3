//! Scene graph
//!
//! A small arena of transform nodes. Interactive markers, their controls and
//! the visuals under each control live here; the pointer router walks
//! parent links to bubble events and raycasts against node pick bounds.

use std::collections::HashMap;

use glam::{Mat4, Quat, Vec3};
use marker_core::{Aabb, Pose, Ray};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

/// Client-assigned identity of an interactive marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u32);

/// What a node belongs to; used to route pointer events to their owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeTag {
    Group,
    /// Receives events nothing in the scene claimed (camera controls).
    Viewport,
    Marker(MarkerId),
    Control { marker: MarkerId, index: usize },
    Visual,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub tag: NodeTag,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    /// Local-space bounds tested by [`SceneGraph::raycast`]
    pub pick_bounds: Option<Aabb>,
    pub visible: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    world: Mat4,
}

impl Node {
    fn new(name: String, tag: NodeTag, parent: Option<NodeId>) -> Self {
        Self {
            name,
            tag,
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            pick_bounds: None,
            visible: true,
            parent,
            children: Vec::new(),
            world: Mat4::IDENTITY,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    pub fn local_pose(&self) -> Pose {
        Pose::new(self.translation, self.rotation)
    }

    pub fn world_matrix(&self) -> Mat4 {
        self.world
    }
}

/// Nearest pickable node under a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub node: NodeId,
    /// World-space hit point
    pub point: Vec3,
    /// Distance from the ray origin
    pub distance: f32,
}

#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: HashMap<NodeId, Node>,
    next_id: u32,
    root: NodeId,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(root, Node::new("root".to_string(), NodeTag::Group, None));
        Self {
            nodes,
            next_id: 1,
            root,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Add a node under `parent`. A missing parent attaches to the root.
    pub fn add_node(&mut self, parent: NodeId, name: impl Into<String>, tag: NodeTag) -> NodeId {
        let parent = if self.nodes.contains_key(&parent) {
            parent
        } else {
            tracing::warn!("Parent node {:?} missing, attaching to root", parent);
            self.root
        };

        let id = NodeId(self.next_id);
        self.next_id += 1;

        let parent_world = self.world_matrix(parent);
        let mut node = Node::new(name.into(), tag, Some(parent));
        node.world = parent_world * node.local_matrix();
        self.nodes.insert(id, node);
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        id
    }

    /// Remove a node and everything below it. Returns the number of nodes
    /// removed. The root cannot be removed.
    pub fn remove_subtree(&mut self, id: NodeId) -> usize {
        if id == self.root {
            return 0;
        }
        let Some(parent) = self.nodes.get(&id).and_then(|n| n.parent) else {
            return 0;
        };
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.retain(|c| *c != id);
        }

        let mut removed = 0;
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                stack.extend(node.children);
                removed += 1;
            }
        }
        removed
    }

    pub fn set_local_pose(&mut self, id: NodeId, pose: &Pose) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.translation = pose.position;
            node.rotation = pose.orientation;
            self.update_subtree(id);
        }
    }

    pub fn set_local_rotation(&mut self, id: NodeId, rotation: Quat) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.rotation = rotation;
            self.update_subtree(id);
        }
    }

    pub fn set_scale(&mut self, id: NodeId, scale: Vec3) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.scale = scale;
            self.update_subtree(id);
        }
    }

    pub fn local_pose(&self, id: NodeId) -> Option<Pose> {
        self.nodes.get(&id).map(Node::local_pose)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    /// Cached world matrix; identity for unknown nodes.
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        self.nodes.get(&id).map(|n| n.world).unwrap_or(Mat4::IDENTITY)
    }

    pub fn world_pose(&self, id: NodeId) -> Pose {
        Pose::from_mat4(&self.world_matrix(id))
    }

    /// World matrix of the node's parent (identity for the root).
    pub fn parent_world_matrix(&self, id: NodeId) -> Mat4 {
        self.parent(id)
            .map(|p| self.world_matrix(p))
            .unwrap_or(Mat4::IDENTITY)
    }

    /// `id` followed by each ancestor up to the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = self.nodes.contains_key(&id).then_some(id);
        while let Some(node) = current {
            chain.push(node);
            current = self.parent(node);
        }
        chain
    }

    /// Recompute every world matrix from the root down.
    pub fn update_world_matrices(&mut self) {
        self.update_subtree(self.root);
    }

    /// Recompute world matrices of `id` and its descendants.
    pub fn update_subtree(&mut self, id: NodeId) {
        let parent_world = self.parent_world_matrix(id);
        let mut stack = vec![(id, parent_world)];
        while let Some((next, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(&next) else {
                continue;
            };
            node.world = parent_world * node.local_matrix();
            let world = node.world;
            stack.extend(node.children.iter().map(|c| (*c, world)));
        }
    }

    fn is_visible(&self, id: NodeId) -> bool {
        self.ancestors(id)
            .iter()
            .all(|n| self.nodes.get(n).is_some_and(|node| node.visible))
    }

    /// Nearest pickable, visible node hit by `ray`.
    pub fn raycast(&self, ray: &Ray) -> Option<Intersection> {
        let mut best: Option<Intersection> = None;

        for (id, node) in &self.nodes {
            let Some(bounds) = node.pick_bounds else {
                continue;
            };
            let inverse = node.world.inverse();
            if !inverse.is_finite() {
                continue;
            }
            let local = ray.transformed(&inverse);
            let Some(t) = bounds.intersect_ray(&local) else {
                continue;
            };

            let point = node.world.transform_point3(local.at(t));
            let distance = (point - ray.origin).length();
            if best.is_some_and(|b| b.distance <= distance) {
                continue;
            }
            if !self.is_visible(*id) {
                continue;
            }
            best = Some(Intersection {
                node: *id,
                point,
                distance,
            });
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_world_matrix_composes_parents() {
        let mut scene = SceneGraph::new();
        let parent = scene.add_node(scene.root(), "parent", NodeTag::Group);
        let child = scene.add_node(parent, "child", NodeTag::Group);

        scene.set_local_pose(parent, &Pose::new(Vec3::X, Quat::from_rotation_z(FRAC_PI_2)));
        scene.set_local_pose(child, &Pose::from_position(Vec3::X));

        let world = scene.world_pose(child);
        assert!(world.position.abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-5));
    }

    #[test]
    fn test_ancestors_walk_to_root() {
        let mut scene = SceneGraph::new();
        let a = scene.add_node(scene.root(), "a", NodeTag::Group);
        let b = scene.add_node(a, "b", NodeTag::Visual);
        assert_eq!(scene.ancestors(b), vec![b, a, scene.root()]);
    }

    #[test]
    fn test_remove_subtree() {
        let mut scene = SceneGraph::new();
        let a = scene.add_node(scene.root(), "a", NodeTag::Group);
        let b = scene.add_node(a, "b", NodeTag::Group);
        scene.add_node(b, "c", NodeTag::Visual);

        assert_eq!(scene.remove_subtree(a), 3);
        assert_eq!(scene.len(), 1);
        assert!(scene.get(scene.root()).unwrap().children().is_empty());
        assert_eq!(scene.remove_subtree(scene.root()), 0);
    }

    #[test]
    fn test_raycast_picks_nearest() {
        let mut scene = SceneGraph::new();
        let near = scene.add_node(scene.root(), "near", NodeTag::Visual);
        let far = scene.add_node(scene.root(), "far", NodeTag::Visual);
        for id in [near, far] {
            scene.get_mut(id).unwrap().pick_bounds =
                Some(Aabb::from_center_size(Vec3::ZERO, Vec3::ONE));
        }
        scene.set_local_pose(near, &Pose::from_position(Vec3::new(0.0, 0.0, 2.0)));
        scene.set_local_pose(far, &Pose::from_position(Vec3::new(0.0, 0.0, -2.0)));

        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        let hit = scene.raycast(&ray).unwrap();
        assert_eq!(hit.node, near);
        assert!(hit.point.abs_diff_eq(Vec3::new(0.0, 0.0, 2.5), 1e-5));
        assert!((hit.distance - 7.5).abs() < 1e-5);
    }

    #[test]
    fn test_raycast_respects_scale_and_visibility() {
        let mut scene = SceneGraph::new();
        let group = scene.add_node(scene.root(), "group", NodeTag::Group);
        let node = scene.add_node(group, "box", NodeTag::Visual);
        scene.get_mut(node).unwrap().pick_bounds =
            Some(Aabb::from_center_size(Vec3::ZERO, Vec3::ONE));
        scene.set_scale(node, Vec3::splat(4.0));

        let ray = Ray::new(Vec3::new(1.5, 0.0, 10.0), Vec3::NEG_Z);
        let hit = scene.raycast(&ray).unwrap();
        assert!((hit.point.z - 2.0).abs() < 1e-4);

        scene.get_mut(group).unwrap().visible = false;
        assert!(scene.raycast(&ray).is_none());
    }
}
