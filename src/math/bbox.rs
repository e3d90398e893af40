use super::{Point3, Vector3};

/// Whether a bounding box spans 3D positions or UV coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoxKind {
    #[default]
    Spatial,
    /// A 2D box over `(u, v)`; the z extent is always zero.
    Uv,
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
    /// Spatial or UV box.
    pub kind: BoxKind,
}

impl BoundingBox {
    /// Creates a bounding box from two corners.
    #[must_use]
    pub fn new(min: Point3, max: Point3, kind: BoxKind) -> Self {
        Self { min, max, kind }
    }

    /// Computes the bounding box of a set of points.
    ///
    /// Returns `None` if the iterator is empty.
    pub fn from_points<'p, I>(points: I, kind: BoxKind) -> Option<Self>
    where
        I: IntoIterator<Item = &'p Point3>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bbox = Self::new(first, first, kind);
        for point in iter {
            bbox.expand(point);
        }
        Some(bbox)
    }

    /// Grows the box so that it contains `point`.
    pub fn expand(&mut self, point: &Point3) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    /// Center of the box.
    #[must_use]
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Extent along each axis.
    #[must_use]
    pub fn size(&self) -> Vector3 {
        self.max - self.min
    }

    /// Returns `true` if `point` lies inside or on the box.
    #[must_use]
    pub fn contains(&self, point: &Point3) -> bool {
        (0..3).all(|axis| point[axis] >= self.min[axis] && point[axis] <= self.max[axis])
    }

    /// Returns `true` for UV boxes.
    #[must_use]
    pub fn is_uv(&self) -> bool {
        self.kind == BoxKind::Uv
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn from_points_spans_all() {
        let points = [p(1.0, -2.0, 0.5), p(-1.0, 3.0, 0.0), p(0.0, 0.0, 2.0)];
        let bbox = BoundingBox::from_points(&points, BoxKind::Spatial).unwrap();
        assert_relative_eq!(bbox.min, p(-1.0, -2.0, 0.0));
        assert_relative_eq!(bbox.max, p(1.0, 3.0, 2.0));
        assert_relative_eq!(bbox.center(), p(0.0, 0.5, 1.0));
        assert_relative_eq!(bbox.size(), Vector3::new(2.0, 5.0, 2.0));
        assert!(points.iter().all(|pt| bbox.contains(pt)));
        assert!(!bbox.contains(&p(5.0, 0.0, 0.0)));
    }

    #[test]
    fn from_empty_points_is_none() {
        let empty: [Point3; 0] = [];
        assert!(BoundingBox::from_points(&empty, BoxKind::Uv).is_none());
    }
}
