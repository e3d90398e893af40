pub mod bbox;

pub use bbox::{BoundingBox, BoxKind};

/// 2D point type, used for UV coordinates.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 4x4 transformation matrix.
pub type Matrix4 = nalgebra::Matrix4<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Coordinate space that point, normal and bounding box queries are made in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Space {
    /// Positions transformed by the mesh's object-to-world matrix.
    #[default]
    World,
    /// Raw positions as stored on the mesh.
    Object,
}
