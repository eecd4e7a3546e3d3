//! Marker visuals
//!
//! Converts wire [`MarkerMsg`]s into renderable primitive descriptions. The
//! rendering layer owns meshes and materials; this module only decides what
//! to draw, where, and how large, and provides local bounds for picking.

use glam::{Vec3, Vec4};
use marker_core::{Aabb, Pose};
use marker_protocol::{ColorRgba, MarkerMsg, MarkerType};

const ARROW_HEAD_RATIO: f32 = 0.23;
const MESH_PREFIX: &str = "package://";
const SCALE_EPSILON: f32 = 1e-6;

/// Options that shape primitive construction.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualOptions {
    /// Base path (with trailing `/`) for mesh resources
    pub mesh_path: Option<String>,
    /// Cap on rendered cube/sphere list elements
    pub max_list_items: usize,
}

impl Default for VisualOptions {
    fn default() -> Self {
        Self {
            mesh_path: None,
            max_list_items: 1250,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListShape {
    Cube,
    Sphere,
}

/// What a marker draws, in marker-local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Arrow {
        origin: Vec3,
        /// Unit direction
        direction: Vec3,
        length: f32,
        head_length: f32,
        head_diameter: f32,
        shaft_diameter: f32,
    },
    Cube {
        size: Vec3,
    },
    Sphere {
        size: Vec3,
    },
    /// Axis along local Z
    Cylinder {
        size: Vec3,
    },
    Lines {
        points: Vec<Vec3>,
        colors: Vec<Vec4>,
        width: f32,
        /// Connected strip rather than independent segments
        strip: bool,
    },
    Points {
        points: Vec<Vec3>,
        colors: Vec<Vec4>,
        size: f32,
    },
    List {
        shape: ListShape,
        centers: Vec<Vec3>,
        colors: Vec<Vec4>,
        size: Vec3,
    },
    Text {
        text: String,
        height: f32,
    },
    Mesh {
        uri: String,
        scale: Vec3,
        /// `None` keeps the mesh's own materials
        color: Option<Vec4>,
    },
    Triangles {
        vertices: Vec<Vec3>,
        colors: Vec<Vec4>,
        scale: Vec3,
    },
}

/// One visual of a control.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerVisual {
    pub marker_type: MarkerType,
    /// Pose relative to the owning control
    pub pose: Pose,
    pub color: Vec4,
    pub scale: Vec3,
    pub primitive: Primitive,
    msg_color: ColorRgba,
    msg_mesh: String,
}

impl MarkerVisual {
    /// Build a visual from its wire message. Unknown types are logged and
    /// produce nothing.
    pub fn from_msg(msg: &MarkerMsg, options: &VisualOptions) -> Option<Self> {
        let marker_type = match MarkerType::try_from(msg.marker_type) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!("Skipping marker {}/{}: {}", msg.ns, msg.id, e);
                return None;
            }
        };

        let scale = Vec3::from(msg.scale);
        let color = msg.color.to_vec4();
        let msg_mesh = strip_package(&msg.mesh_resource).to_string();

        let primitive = match marker_type {
            MarkerType::Arrow => arrow(msg, scale),
            MarkerType::Cube => Primitive::Cube { size: scale },
            MarkerType::Sphere => Primitive::Sphere { size: scale },
            MarkerType::Cylinder => Primitive::Cylinder { size: scale },
            MarkerType::LineStrip | MarkerType::LineList => {
                let (points, colors) = points_and_colors(msg, 1);
                Primitive::Lines {
                    points,
                    colors,
                    width: scale.x,
                    strip: marker_type == MarkerType::LineStrip,
                }
            }
            MarkerType::Points => {
                let (points, colors) = points_and_colors(msg, 1);
                Primitive::Points {
                    points,
                    colors,
                    size: scale.x,
                }
            }
            MarkerType::CubeList | MarkerType::SphereList => {
                let step = list_step(msg.points.len(), options.max_list_items);
                let (centers, colors) = points_and_colors(msg, step);
                Primitive::List {
                    shape: if marker_type == MarkerType::CubeList {
                        ListShape::Cube
                    } else {
                        ListShape::Sphere
                    },
                    centers,
                    colors,
                    size: scale,
                }
            }
            MarkerType::TextViewFacing => {
                if msg.text.is_empty() {
                    return None;
                }
                Primitive::Text {
                    text: msg.text.clone(),
                    height: scale.x,
                }
            }
            MarkerType::MeshResource => Primitive::Mesh {
                uri: match &options.mesh_path {
                    Some(base) => format!("{}{}", base, msg_mesh),
                    None => msg_mesh.clone(),
                },
                scale,
                color: (!msg.color.is_zero()).then_some(color),
            },
            MarkerType::TriangleList => Primitive::Triangles {
                vertices: msg.points.iter().map(|p| Vec3::from(*p)).collect(),
                colors: msg.colors.iter().map(|c| c.to_vec4()).collect(),
                scale,
            },
        };

        Some(Self {
            marker_type,
            pose: msg.pose.into(),
            color,
            scale,
            primitive,
            msg_color: msg.color,
            msg_mesh,
        })
    }

    /// Apply an updated message in place.
    ///
    /// Returns `false` when the visual has to be rebuilt from `msg` instead.
    pub fn update(&mut self, msg: &MarkerMsg) -> bool {
        if msg.marker_type != self.marker_type as i32 {
            return false;
        }
        self.pose = msg.pose.into();

        if msg.color != self.msg_color {
            match self.marker_type {
                MarkerType::CubeList | MarkerType::SphereList => return false,
                MarkerType::MeshResource => {
                    if let Primitive::Mesh { color, .. } = &mut self.primitive {
                        *color = (!msg.color.is_zero()).then_some(msg.color.to_vec4());
                    }
                }
                _ => {}
            }
            self.color = msg.color.to_vec4();
            self.msg_color = msg.color;
        }

        let scale = Vec3::from(msg.scale);
        let scale_changed = !self.scale.abs_diff_eq(scale, SCALE_EPSILON);
        self.scale = scale;

        match self.marker_type {
            MarkerType::Cube | MarkerType::Sphere | MarkerType::Cylinder => !scale_changed,
            MarkerType::TextViewFacing => {
                let same_text = matches!(&self.primitive, Primitive::Text { text, .. } if *text == msg.text);
                !scale_changed && same_text
            }
            MarkerType::MeshResource => {
                !scale_changed && strip_package(&msg.mesh_resource) == self.msg_mesh
            }
            MarkerType::Arrow
            | MarkerType::LineStrip
            | MarkerType::LineList
            | MarkerType::CubeList
            | MarkerType::SphereList
            | MarkerType::Points
            | MarkerType::TriangleList => false,
        }
    }

    /// Bounds in the visual's own frame (before `pose`).
    pub fn local_bounds(&self) -> Option<Aabb> {
        match &self.primitive {
            Primitive::Arrow {
                origin,
                direction,
                length,
                head_diameter,
                ..
            } => {
                let tip = *origin + *direction * *length;
                Aabb::from_points(&[*origin, tip]).map(|b| b.expanded(head_diameter * 0.5))
            }
            Primitive::Cube { size } | Primitive::Sphere { size } | Primitive::Cylinder { size } => {
                Some(Aabb::from_center_size(Vec3::ZERO, *size))
            }
            Primitive::Lines { points, width, .. } => {
                Aabb::from_points(points).map(|b| b.expanded(width * 0.5))
            }
            Primitive::Points { points, size, .. } => {
                Aabb::from_points(points).map(|b| b.expanded(size * 0.5))
            }
            Primitive::List { centers, size, .. } => {
                let bounds = Aabb::from_points(centers)?;
                let half = size.abs() * 0.5;
                Some(Aabb::new(bounds.min - half, bounds.max + half))
            }
            Primitive::Text { text, height } => {
                // glyph width estimated at half the line height
                let width = text.chars().count() as f32 * height * 0.5;
                Some(Aabb::from_center_size(Vec3::ZERO, Vec3::new(width, *height, 0.0)))
            }
            // mesh geometry is not decoded; a unit box stands in
            Primitive::Mesh { scale, .. } => Some(Aabb::from_center_size(Vec3::ZERO, *scale)),
            Primitive::Triangles { vertices, scale, .. } => {
                let scaled: Vec<Vec3> = vertices.iter().map(|v| *v * *scale).collect();
                Aabb::from_points(&scaled)
            }
        }
    }
}

fn arrow(msg: &MarkerMsg, scale: Vec3) -> Primitive {
    if let [p1, p2] = msg.points.as_slice() {
        let origin = Vec3::from(*p1);
        let delta = Vec3::from(*p2) - origin;
        let length = delta.length();
        let head_length = if scale.z != 0.0 {
            scale.z
        } else {
            length * ARROW_HEAD_RATIO
        };
        return Primitive::Arrow {
            origin,
            direction: delta.try_normalize().unwrap_or(Vec3::X),
            length,
            head_length,
            head_diameter: scale.y,
            shaft_diameter: scale.x,
        };
    }

    Primitive::Arrow {
        origin: Vec3::ZERO,
        direction: Vec3::X,
        length: scale.x,
        head_length: scale.x * ARROW_HEAD_RATIO,
        head_diameter: scale.y,
        shaft_diameter: scale.y * 0.5,
    }
}

/// Every `step`-th point, with per-point colours only when the message
/// carries exactly one colour per point.
fn points_and_colors(msg: &MarkerMsg, step: usize) -> (Vec<Vec3>, Vec<Vec4>) {
    let per_point = msg.colors.len() == msg.points.len();
    let points = msg
        .points
        .iter()
        .step_by(step)
        .map(|p| Vec3::from(*p))
        .collect();
    let colors = if per_point {
        msg.colors.iter().step_by(step).map(|c| c.to_vec4()).collect()
    } else {
        Vec::new()
    };
    (points, colors)
}

fn list_step(count: usize, max_items: usize) -> usize {
    if max_items == 0 {
        return 1;
    }
    count.div_ceil(max_items).max(1)
}

fn strip_package(resource: &str) -> &str {
    resource.strip_prefix(MESH_PREFIX).unwrap_or(resource)
}

#[cfg(test)]
mod tests {
    use super::*;
    use marker_protocol::PointMsg;

    fn msg(marker_type: MarkerType, scale: Vec3) -> MarkerMsg {
        MarkerMsg {
            marker_type: marker_type as i32,
            scale: scale.into(),
            color: ColorRgba::new(1.0, 0.0, 0.0, 1.0),
            ..MarkerMsg::default()
        }
    }

    #[test]
    fn test_arrow_from_scale() {
        let visual = MarkerVisual::from_msg(&msg(MarkerType::Arrow, Vec3::new(2.0, 0.4, 0.4)), &VisualOptions::default()).unwrap();
        let Primitive::Arrow { length, head_length, shaft_diameter, direction, .. } = visual.primitive else {
            panic!("expected arrow");
        };
        assert_eq!(length, 2.0);
        assert!((head_length - 0.46).abs() < 1e-6);
        assert!((shaft_diameter - 0.2).abs() < 1e-6);
        assert_eq!(direction, Vec3::X);
    }

    #[test]
    fn test_arrow_from_two_points() {
        let mut m = msg(MarkerType::Arrow, Vec3::new(0.1, 0.2, 0.0));
        m.points = vec![PointMsg::new(1.0, 0.0, 0.0), PointMsg::new(1.0, 3.0, 0.0)];
        let visual = MarkerVisual::from_msg(&m, &VisualOptions::default()).unwrap();
        let Primitive::Arrow { origin, direction, length, head_length, shaft_diameter, head_diameter } = visual.primitive else {
            panic!("expected arrow");
        };
        assert_eq!(origin, Vec3::X);
        assert!(direction.abs_diff_eq(Vec3::Y, 1e-6));
        assert!((length - 3.0).abs() < 1e-6);
        assert!((head_length - 0.69).abs() < 1e-5);
        assert_eq!(shaft_diameter, 0.1);
        assert_eq!(head_diameter, 0.2);
    }

    #[test]
    fn test_list_decimation_and_colors() {
        let mut m = msg(MarkerType::CubeList, Vec3::splat(0.1));
        m.points = (0..3000).map(|i| PointMsg::new(i as f64, 0.0, 0.0)).collect();
        m.colors = vec![ColorRgba::new(0.0, 1.0, 0.0, 1.0); 3000];
        let visual = MarkerVisual::from_msg(&m, &VisualOptions::default()).unwrap();
        let Primitive::List { centers, colors, .. } = &visual.primitive else {
            panic!("expected list");
        };
        // ceil(3000 / 1250) = 3
        assert_eq!(centers.len(), 1000);
        assert_eq!(centers[1], Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(colors.len(), 1000);

        m.colors.pop();
        let visual = MarkerVisual::from_msg(&m, &VisualOptions::default()).unwrap();
        let Primitive::List { colors, .. } = &visual.primitive else {
            panic!("expected list");
        };
        assert!(colors.is_empty());
    }

    #[test]
    fn test_mesh_resource_path() {
        let mut m = msg(MarkerType::MeshResource, Vec3::ONE);
        m.mesh_resource = "package://robot/meshes/base.dae".into();
        m.color = ColorRgba::default();
        let options = VisualOptions {
            mesh_path: Some("http://host/".into()),
            ..VisualOptions::default()
        };
        let visual = MarkerVisual::from_msg(&m, &options).unwrap();
        assert_eq!(
            visual.primitive,
            Primitive::Mesh {
                uri: "http://host/robot/meshes/base.dae".into(),
                scale: Vec3::ONE,
                color: None,
            }
        );
    }

    #[test]
    fn test_empty_text_and_unknown_type_produce_nothing() {
        let options = VisualOptions::default();
        assert!(MarkerVisual::from_msg(&msg(MarkerType::TextViewFacing, Vec3::ONE), &options).is_none());

        let mut m = msg(MarkerType::Cube, Vec3::ONE);
        m.marker_type = 42;
        assert!(MarkerVisual::from_msg(&m, &options).is_none());
    }

    #[test]
    fn test_update_rules() {
        let options = VisualOptions::default();
        let mut m = msg(MarkerType::Cube, Vec3::ONE);
        let mut visual = MarkerVisual::from_msg(&m, &options).unwrap();

        m.pose.position = PointMsg::new(1.0, 2.0, 3.0);
        m.color = ColorRgba::new(0.0, 0.0, 1.0, 1.0);
        assert!(visual.update(&m));
        assert_eq!(visual.pose.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(visual.color, Vec4::new(0.0, 0.0, 1.0, 1.0));

        m.scale = Vec3::splat(2.0).into();
        assert!(!visual.update(&m));

        let mut lines = msg(MarkerType::LineStrip, Vec3::ONE);
        lines.points = vec![PointMsg::default(), PointMsg::new(1.0, 0.0, 0.0)];
        let mut visual = MarkerVisual::from_msg(&lines, &options).unwrap();
        assert!(!visual.update(&lines));
    }

    #[test]
    fn test_local_bounds() {
        let options = VisualOptions::default();
        let visual = MarkerVisual::from_msg(&msg(MarkerType::Cube, Vec3::new(2.0, 1.0, 1.0)), &options).unwrap();
        let bounds = visual.local_bounds().unwrap();
        assert_eq!(bounds.min, Vec3::new(-1.0, -0.5, -0.5));

        let arrow = MarkerVisual::from_msg(&msg(MarkerType::Arrow, Vec3::new(1.0, 0.2, 0.2)), &options).unwrap();
        let bounds = arrow.local_bounds().unwrap();
        assert!(bounds.min.abs_diff_eq(Vec3::splat(-0.1), 1e-6));
        assert!(bounds.max.abs_diff_eq(Vec3::new(1.1, 0.1, 0.1), 1e-6));
    }
}
