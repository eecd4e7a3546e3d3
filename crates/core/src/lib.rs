//! Core building blocks for interactive marker manipulation.
//!
//! This crate provides:
//! - The geometry kernel (ray/plane intersection, skew-line closest points,
//!   screen-space axis projection)
//! - Poses and frame transforms
//! - A perspective camera with project/unproject support
//! - Device-level pointer input types

pub mod camera;
pub mod geometry;
pub mod input;
pub mod pose;

pub use camera::{Camera, DEFAULT_VFOV};
pub use geometry::{
    closest_parameter_on_line_to_line, closest_point_axis_to_screen_point, intersect_ray_plane,
    Aabb, Ray, DEFAULT_RAY_PRECISION, LINE_PARALLEL_THRESHOLD,
};
pub use input::{DeviceEvent, MouseButtonType, PointerEventKind};
pub use pose::{normalize_quat, Pose};
