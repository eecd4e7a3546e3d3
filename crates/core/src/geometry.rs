//! Geometry kernel
//!
//! Stateless routines used by the drag algorithms. Every function returns
//! `None` for degenerate configurations (parallel ray/plane, parallel lines,
//! an axis pointing straight into the screen) so callers can skip the frame.

use crate::camera::Camera;
use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Parallel-plane epsilon used for rays built in world space.
pub const DEFAULT_RAY_PRECISION: f32 = 1e-6;

/// Denominator below which two lines are treated as parallel.
pub const LINE_PARALLEL_THRESHOLD: f32 = 1e-4;

/// A half-infinite line with its own parallel-plane tolerance.
///
/// Rays derived from screen coordinates carry more error than rays built
/// from world geometry, so the epsilon travels with the ray instead of
/// being a global constant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub precision: f32,
}

impl Ray {
    /// Create a ray with the default world-space precision.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            precision: DEFAULT_RAY_PRECISION,
        }
    }

    pub fn with_precision(mut self, precision: f32) -> Self {
        self.precision = precision;
        self
    }

    /// Point at parameter `t` along the ray.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Transform the ray by an affine matrix. The direction is not
    /// re-normalized so that parameters stay comparable across spaces.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self {
            origin: matrix.transform_point3(self.origin),
            direction: matrix.transform_vector3(self.direction),
            precision: self.precision,
        }
    }
}

/// Intersect a ray with the plane through `plane_origin` with `plane_normal`.
///
/// Returns `None` when `|ray.direction · plane_normal|` is below the ray's
/// precision. The intersection may lie behind the ray origin.
pub fn intersect_ray_plane(ray: &Ray, plane_origin: Vec3, plane_normal: Vec3) -> Option<Vec3> {
    let dot = ray.direction.dot(plane_normal);
    if dot.abs() < ray.precision {
        return None;
    }
    let t = plane_normal.dot(plane_origin - ray.origin) / dot;
    Some(ray.at(t))
}

/// Parameter along `line_a` of the point closest to `line_b`.
///
/// Standard skew-line solution; `None` when the lines are (nearly) parallel.
pub fn closest_parameter_on_line_to_line(line_a: &Ray, line_b: &Ray) -> Option<f32> {
    let v13 = line_a.origin - line_b.origin;
    let v43 = line_b.direction;
    let v21 = line_a.direction;

    let d1343 = v13.dot(v43);
    let d4321 = v43.dot(v21);
    let d1321 = v13.dot(v21);
    let d4343 = v43.dot(v43);
    let d2121 = v21.dot(v21);

    let denom = d2121 * d4343 - d4321 * d4321;
    if denom.abs() <= LINE_PARALLEL_THRESHOLD {
        return None;
    }
    let numer = d1343 * d4321 - d1321 * d4343;
    Some(numer / denom)
}

/// Where along `axis` the user is pointing when the pointer sits at
/// `screen_point` (normalized device coordinates).
///
/// The axis is projected to the screen, the pointer is projected
/// perpendicularly onto that 2D segment, and the resulting screen point is
/// shot back into the scene as a camera ray. The answer is the closest
/// parameter on the axis to that ray.
pub fn closest_point_axis_to_screen_point(
    axis: &Ray,
    camera: &Camera,
    screen_point: Vec2,
) -> Option<f32> {
    let origin = camera.project(axis.origin).truncate();
    let tip = camera.project(axis.origin + axis.direction).truncate();

    let screen_dir = tip - origin;
    let len_sq = screen_dir.dot(screen_dir);
    if len_sq <= f32::EPSILON {
        // axis points straight at the camera
        return None;
    }

    let t = (screen_point - origin).dot(screen_dir) / len_sq;
    let projected = origin + screen_dir * t;
    let pointer_ray = camera.ray_from_ndc(projected);

    closest_parameter_on_line_to_line(axis, &pointer_ray)
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size.abs() * 0.5;
        Self::new(center - half, center + half)
    }

    /// Smallest box containing every point, `None` for an empty slice.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Self::new(*first, *first);
        for p in rest {
            bounds.min = bounds.min.min(*p);
            bounds.max = bounds.max.max(*p);
        }
        Some(bounds)
    }

    /// Grow the box by `pad` on every side.
    pub fn expanded(&self, pad: f32) -> Aabb {
        Aabb::new(self.min - Vec3::splat(pad), self.max + Vec3::splat(pad))
    }

    /// Slab test. Returns the ray parameter of the first hit in front of the
    /// origin (the exit parameter when the origin is inside the box).
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let dir = ray.direction[axis];
            if dir.abs() < f32::EPSILON {
                if origin < self.min[axis] || origin > self.max[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / dir;
            let mut t0 = (self.min[axis] - origin) * inv;
            let mut t1 = (self.max[axis] - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }

        if t_max < 0.0 {
            return None;
        }
        Some(if t_min >= 0.0 { t_min } else { t_max })
    }
}
