//! Rigid poses and frame transforms.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position plus unit orientation.
///
/// The same type doubles as a frame transform (translation + rotation), the
/// way the transform-lookup collaborator reports frames.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        orientation: Quat::IDENTITY,
    };

    /// Build a pose; the orientation is re-normalized.
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation: normalize_quat(orientation),
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }

    /// Express this pose through `transform`: rotate then translate.
    pub fn transformed_by(&self, transform: &Pose) -> Pose {
        Pose::new(
            transform.orientation * self.position + transform.position,
            transform.orientation * self.orientation,
        )
    }

    /// The transform that undoes `self`.
    pub fn inverse(&self) -> Pose {
        let rotation = self.orientation.inverse();
        Pose::new(-(rotation * self.position), rotation)
    }

    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position)
    }

    /// Decompose a matrix, dropping any scale.
    pub fn from_mat4(matrix: &Mat4) -> Pose {
        let (_, rotation, translation) = matrix.to_scale_rotation_translation();
        Pose::new(translation, rotation)
    }

    pub fn abs_diff_eq(&self, other: &Pose, max_abs_diff: f32) -> bool {
        self.position.abs_diff_eq(other.position, max_abs_diff)
            && (self.orientation.abs_diff_eq(other.orientation, max_abs_diff)
                || self.orientation.abs_diff_eq(-other.orientation, max_abs_diff))
    }
}

/// Normalize a quaternion, falling back to identity for a zero quaternion
/// (wire messages with an all-zero orientation are common).
pub fn normalize_quat(q: Quat) -> Quat {
    let len_sq = q.length_squared();
    if len_sq <= f32::EPSILON || !len_sq.is_finite() {
        Quat::IDENTITY
    } else {
        q.normalize()
    }
}
