use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::error::{ComponentError, Result, TopologyError};
use crate::math::{BoundingBox, BoxKind, Point3, Vector3};
use crate::topology::{ConvertOptions, ElementKind};

use super::Component;

impl Component<'_> {
    /// Endpoints of every edge, keyed by edge index.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::KindMismatch`] unless this is an edge
    /// component, or an error if the mesh handle is stale.
    pub fn vertex_pairs(&self) -> Result<Rc<BTreeMap<u32, [u32; 2]>>> {
        self.expect_kind(ElementKind::Edge)?;
        self.cache.vertex_pairs.get_or_try_init(|| -> Result<_> {
            let mut pairs = BTreeMap::new();
            for edge in self.iter() {
                pairs.insert(edge, self.provider.edge_endpoints(self.mesh, edge)?);
            }
            Ok(Rc::new(pairs))
        })
    }

    /// Vertices of every face in winding order, keyed by face index.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::KindMismatch`] unless this is a face
    /// component, or an error if the mesh handle is stale.
    pub fn face_vertices(&self) -> Result<Rc<BTreeMap<u32, Vec<u32>>>> {
        self.expect_kind(ElementKind::Face)?;
        self.cache.face_vertices.get_or_try_init(|| -> Result<_> {
            let mut faces = BTreeMap::new();
            for face in self.iter() {
                faces.insert(face, self.provider.face_vertices(self.mesh, face)?);
            }
            Ok(Rc::new(faces))
        })
    }

    /// Vertex ids referenced by the component.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh handle is stale.
    pub fn vertex_ids(&self) -> Result<BTreeSet<u32>> {
        Ok(match self.kind {
            ElementKind::Vertex => self.indices.clone(),
            ElementKind::Edge => self.vertex_pairs()?.values().flatten().copied().collect(),
            ElementKind::Face => self.face_vertices()?.values().flatten().copied().collect(),
            ElementKind::UvPoint => self.to_vertex(ConvertOptions::new())?.indices,
        })
    }

    /// Positions in the component's space.
    ///
    /// Vertices, edges and faces map vertex ids to positions. UV points map
    /// UV ids to `(u, v, 0)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh handle is stale or an index is out of range.
    pub fn points(&self) -> Result<Rc<BTreeMap<u32, Point3>>> {
        self.cache.points.get_or_try_insert(&self.space, || -> Result<_> {
            tracing::trace!(space = ?self.space, "computing component points");
            let points: BTreeMap<u32, Point3> = if self.kind == ElementKind::UvPoint {
                let uvs = self.provider.uv_coordinates(self.mesh)?;
                self.iter()
                    .map(|uv| {
                        lookup(&uvs, ElementKind::UvPoint, uv).map(|p| (uv, Point3::new(p.x, p.y, 0.0)))
                    })
                    .collect::<Result<_>>()?
            } else {
                let positions = self.provider.points(self.mesh, self.space)?;
                self.vertex_ids()?
                    .into_iter()
                    .map(|v| lookup(&positions, ElementKind::Vertex, v).map(|p| (v, *p)))
                    .collect::<Result<_>>()?
            };
            Ok(Rc::new(points))
        })
    }

    /// Normals, angle-weighted if the component was built that way.
    ///
    /// # Errors
    ///
    /// See [`Component::normals_weighted`].
    pub fn normals(&self) -> Result<Rc<BTreeMap<u32, Vector3>>> {
        self.normals_weighted(self.angle_weighted)
    }

    /// Normals keyed by this component's indices.
    ///
    /// Vertices use vertex normals, edges the mean of their endpoint normals,
    /// faces the face normal and UV points the normal of their vertex.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh handle is stale or an index is out of range.
    pub fn normals_weighted(&self, angle_weighted: bool) -> Result<Rc<BTreeMap<u32, Vector3>>> {
        let key = (self.space, angle_weighted);
        self.cache.normals.get_or_try_insert(&key, || -> Result<_> {
            let mut normals = BTreeMap::new();
            if self.kind == ElementKind::Face {
                for face in self.iter() {
                    normals.insert(face, self.provider.face_normal(self.mesh, face, self.space)?);
                }
                return Ok(Rc::new(normals));
            }

            let vertex_normals = self
                .provider
                .vertex_normals(self.mesh, self.space, angle_weighted)?;
            let normal_of = |v: u32| lookup(&vertex_normals, ElementKind::Vertex, v).copied();
            match self.kind {
                ElementKind::Vertex => {
                    for v in self.iter() {
                        normals.insert(v, normal_of(v)?);
                    }
                }
                ElementKind::Edge => {
                    for (&edge, &[a, b]) in self.vertex_pairs()?.iter() {
                        normals.insert(edge, (normal_of(a)? + normal_of(b)?) * 0.5);
                    }
                }
                ElementKind::UvPoint => {
                    for uv in self.iter() {
                        let vertex = self.single(uv).to_vertex(ConvertOptions::new())?.index()?;
                        normals.insert(uv, normal_of(vertex)?);
                    }
                }
                ElementKind::Face => {}
            }
            Ok(Rc::new(normals))
        })
    }

    /// Per-corner normals of every face, in winding order.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::KindMismatch`] unless this is a face
    /// component, or an error if the mesh handle is stale.
    pub fn face_vertex_normals(&self) -> Result<BTreeMap<u32, Vec<Vector3>>> {
        self.expect_kind(ElementKind::Face)?;
        let vertex_normals =
            self.provider
                .vertex_normals(self.mesh, self.space, self.angle_weighted)?;
        let mut normals = BTreeMap::new();
        for face in self.iter() {
            let corners = self
                .provider
                .face_normal_ids(self.mesh, face)?
                .into_iter()
                .map(|id| lookup(&vertex_normals, ElementKind::Vertex, id).copied())
                .collect::<Result<Vec<_>>>()?;
            normals.insert(face, corners);
        }
        Ok(normals)
    }

    /// Bounding box of the component's points. UV components get a
    /// [`BoxKind::Uv`] box.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::Empty`] for an empty component, or an error
    /// if the mesh handle is stale.
    pub fn bbox(&self) -> Result<BoundingBox> {
        self.cache.bbox.get_or_try_insert(&self.space, || -> Result<_> {
            let kind = if self.kind == ElementKind::UvPoint {
                BoxKind::Uv
            } else {
                BoxKind::Spatial
            };
            let points = self.points()?;
            let bbox = BoundingBox::from_points(points.values(), kind).ok_or(ComponentError::Empty)?;
            Ok(bbox)
        })
    }

    fn expect_kind(&self, expected: ElementKind) -> Result<()> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(ComponentError::KindMismatch {
                expected,
                found: self.kind,
            }
            .into())
        }
    }
}

fn lookup<T>(values: &[T], kind: ElementKind, index: u32) -> Result<&T> {
    values.get(index as usize).ok_or_else(|| {
        TopologyError::ElementOutOfRange {
            kind,
            index,
            count: values.len(),
        }
        .into()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::PolycompError;
    use crate::math::{Matrix4, Space};
    use crate::test_meshes::{cube, plane_2x2, store_with};
    use crate::topology::{MeshStore, PolyMesh};
    use approx::assert_relative_eq;

    #[test]
    fn edge_points_are_keyed_by_vertex() {
        let (store, mesh) = store_with(plane_2x2());
        let edge = Component::from_indices(&store, mesh, ElementKind::Edge, [0]);
        let points = edge.points().unwrap();
        assert_eq!(points.keys().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert_relative_eq!(points[&0], Point3::new(-1.0, 0.0, 1.0));
        assert_eq!(edge.vertex_pairs().unwrap()[&0], [0, 1]);
    }

    #[test]
    fn uv_points_are_flat() {
        let (store, mesh) = store_with(plane_2x2());
        let uv = Component::from_indices(&store, mesh, ElementKind::UvPoint, [8]);
        assert_relative_eq!(uv.points().unwrap()[&8], Point3::new(1.0, 1.0, 0.0));
        let bbox = uv.bbox().unwrap();
        assert!(bbox.is_uv());
    }

    #[test]
    fn points_follow_space() {
        let mesh = plane_2x2()
            .with_transform(Matrix4::new_translation(&Vector3::new(0.0, 3.0, 0.0)));
        let (store, mesh) = store_with(mesh);
        let mut vertex = Component::from_indices(&store, mesh, ElementKind::Vertex, [4]);
        assert_relative_eq!(vertex.points().unwrap()[&4].y, 3.0);
        vertex.set_space(Space::Object);
        assert_relative_eq!(vertex.points().unwrap()[&4].y, 0.0);
        vertex.set_space(Space::World);
        assert_relative_eq!(vertex.bbox().unwrap().min.y, 3.0);
    }

    #[test]
    fn normals_per_kind() {
        let (store, mesh) = store_with(plane_2x2());
        let up = Vector3::new(0.0, 1.0, 0.0);
        let face = Component::from_indices(&store, mesh, ElementKind::Face, [1]);
        assert_relative_eq!(face.normals().unwrap()[&1], up);
        let edge = Component::from_indices(&store, mesh, ElementKind::Edge, [1]);
        assert_relative_eq!(edge.normals().unwrap()[&1], up);
        let uv = Component::from_indices(&store, mesh, ElementKind::UvPoint, [4]);
        assert_relative_eq!(uv.normals_weighted(true).unwrap()[&4], up);

        let corners = face.face_vertex_normals().unwrap();
        assert_eq!(corners[&1].len(), 4);
        assert!(edge.face_vertex_normals().is_err());
    }

    #[test]
    fn cube_corner_normal_is_diagonal() {
        let (store, mesh) = store_with(cube());
        let vertex = Component::from_indices(&store, mesh, ElementKind::Vertex, [6]);
        let normal = vertex.normals().unwrap()[&6];
        assert_relative_eq!(normal, Vector3::new(1.0, 1.0, 1.0).normalize(), epsilon = 1e-9);
    }

    #[test]
    fn bbox_of_faces() {
        let (store, mesh) = store_with(cube());
        let faces = Component::create(&store, mesh, ElementKind::Face)
            .get_complete()
            .unwrap();
        let bbox = faces.bbox().unwrap();
        assert_relative_eq!(bbox.size(), Vector3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(bbox.center(), Point3::origin());
    }

    #[test]
    fn bbox_of_empty_component_fails() {
        let (store, mesh) = store_with(cube());
        let empty = Component::create(&store, mesh, ElementKind::Vertex);
        assert!(matches!(
            empty.bbox(),
            Err(PolycompError::Component(ComponentError::Empty))
        ));
    }

    #[test]
    fn add_drops_cached_geometry() {
        let (store, mesh) = store_with(plane_2x2());
        let mut vertex = Component::from_indices(&store, mesh, ElementKind::Vertex, [0]);
        let points = vertex.points().unwrap();
        let bbox = vertex.bbox().unwrap();

        vertex.add([0]);
        assert!(Rc::ptr_eq(&points, &vertex.points().unwrap()));

        vertex.add([8]);
        assert!(!Rc::ptr_eq(&points, &vertex.points().unwrap()));
        assert_ne!(bbox, vertex.bbox().unwrap());
    }

    #[test]
    fn pair_queries_check_kind() {
        let (store, mesh) = store_with(cube());
        let face = Component::from_indices(&store, mesh, ElementKind::Face, [0]);
        assert!(face.vertex_pairs().is_err());
        assert_eq!(face.face_vertices().unwrap()[&0], vec![0, 3, 2, 1]);
    }

    #[test]
    fn stale_mesh_surfaces_as_error() {
        let mut store = MeshStore::new();
        let mesh = store.add_mesh(PolyMesh::cube("pCube2", 1.0).unwrap());
        store.remove_mesh(mesh);
        let vertex = Component::from_indices(&store, mesh, ElementKind::Vertex, [0]);
        assert!(matches!(vertex.points(), Err(PolycompError::Topology(_))));
    }
}
