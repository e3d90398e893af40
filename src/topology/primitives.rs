use crate::error::TopologyError;
use crate::math::{Point2, Point3};

use super::PolyMesh;

impl PolyMesh {
    /// Creates an axis-aligned cube centered at the origin.
    ///
    /// Eight vertices, twelve edges and six quads with outward normals. Each
    /// face gets its own four UVs, so the cube has six UV shells.
    ///
    /// # Errors
    ///
    /// Returns an error if `size` is not positive.
    pub fn cube(name: impl Into<String>, size: f64) -> Result<Self, TopologyError> {
        if size <= 0.0 {
            return Err(TopologyError::InvalidMesh("cube size must be positive".into()));
        }
        let h = size * 0.5;
        let points = vec![
            Point3::new(-h, -h, -h),
            Point3::new(h, -h, -h),
            Point3::new(h, h, -h),
            Point3::new(-h, h, -h),
            Point3::new(-h, -h, h),
            Point3::new(h, -h, h),
            Point3::new(h, h, h),
            Point3::new(-h, h, h),
        ];
        let faces = vec![
            vec![0, 3, 2, 1],
            vec![4, 5, 6, 7],
            vec![0, 1, 5, 4],
            vec![1, 2, 6, 5],
            vec![2, 3, 7, 6],
            vec![3, 0, 4, 7],
        ];

        let corners = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        let mut uvs = Vec::with_capacity(24);
        let mut face_uvs = Vec::with_capacity(6);
        for face in 0..6u32 {
            let offset = f64::from(face) * 1.25;
            face_uvs.push((0..4).map(|k| face * 4 + k).collect());
            uvs.extend(corners.iter().map(|c| Point2::new(c.x + offset, c.y)));
        }

        Self::new(name, points, faces)?.with_uvs(uvs, face_uvs)
    }

    /// Creates a grid plane in the XZ plane facing +Y.
    ///
    /// Vertices are numbered row by row, `width` spans X and `height` spans
    /// Z. UV ids equal vertex ids and form a single shell.
    ///
    /// # Errors
    ///
    /// Returns an error if a subdivision count is zero or a size is not
    /// positive.
    pub fn plane(
        name: impl Into<String>,
        width: f64,
        height: f64,
        subdivisions_x: u32,
        subdivisions_z: u32,
    ) -> Result<Self, TopologyError> {
        if subdivisions_x == 0 || subdivisions_z == 0 {
            return Err(TopologyError::InvalidMesh(
                "plane needs at least one subdivision per axis".into(),
            ));
        }
        if width <= 0.0 || height <= 0.0 {
            return Err(TopologyError::InvalidMesh("plane size must be positive".into()));
        }

        let columns = subdivisions_x + 1;
        let sx = f64::from(subdivisions_x);
        let sz = f64::from(subdivisions_z);
        let mut points = Vec::new();
        let mut uvs = Vec::new();
        for row in 0..=subdivisions_z {
            for col in 0..=subdivisions_x {
                let (u, v) = (f64::from(col) / sx, f64::from(row) / sz);
                points.push(Point3::new(
                    -width * 0.5 + u * width,
                    0.0,
                    height * 0.5 - v * height,
                ));
                uvs.push(Point2::new(u, v));
            }
        }

        let mut faces = Vec::new();
        for row in 0..subdivisions_z {
            for col in 0..subdivisions_x {
                let v0 = row * columns + col;
                faces.push(vec![v0, v0 + 1, v0 + 1 + columns, v0 + columns]);
            }
        }
        let face_uvs = faces.clone();

        Self::new(name, points, faces)?.with_uvs(uvs, face_uvs)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::{Space, Vector3};
    use crate::topology::ElementKind;
    use approx::assert_relative_eq;

    #[test]
    fn plane_counts_and_normal() {
        let mesh = PolyMesh::plane("pPlane1", 2.0, 2.0, 3, 2).unwrap();
        assert_eq!(mesh.count(ElementKind::Vertex), 12);
        assert_eq!(mesh.count(ElementKind::Face), 6);
        assert_eq!(mesh.count(ElementKind::Edge), 17);
        assert_eq!(mesh.uv_shells().1, 1);
        assert_relative_eq!(
            mesh.face_normal(0, Space::Object).unwrap(),
            Vector3::new(0.0, 1.0, 0.0)
        );
    }

    #[test]
    fn cube_faces_point_outward() {
        let mesh = PolyMesh::cube("pCube1", 2.0).unwrap();
        let expected = [
            Vector3::new(0.0, 0.0, -1.0),
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(0.0, -1.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(-1.0, 0.0, 0.0),
        ];
        for (face, normal) in (0..6).zip(expected) {
            assert_relative_eq!(mesh.face_normal(face, Space::Object).unwrap(), normal);
        }
        assert!((0..12).all(|e| !mesh.is_boundary_edge(e).unwrap()));
    }

    #[test]
    fn degenerate_sizes_are_rejected() {
        assert!(PolyMesh::cube("c", 0.0).is_err());
        assert!(PolyMesh::plane("p", 1.0, 1.0, 0, 1).is_err());
    }
}
