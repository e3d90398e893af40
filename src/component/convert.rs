use std::collections::BTreeSet;

use crate::error::{Result, SelectionWarning};
use crate::topology::{ConvertOptions, ElementKind};

use super::Component;

impl<'a> Component<'a> {
    /// Converts to another element kind.
    ///
    /// Face to edge conversion with `border` also returns the selected faces'
    /// edges that lie on the mesh boundary, which the provider's straddle
    /// rule leaves out. An empty result for a non-empty component is logged.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh handle is stale or an index is out of range.
    pub fn convert_to(&self, target: ElementKind, options: ConvertOptions) -> Result<Self> {
        let mut indices =
            self.provider
                .convert_elements(self.mesh, &self.indices, self.kind, target, options)?;
        if options.border && self.kind == ElementKind::Face && target == ElementKind::Edge {
            indices.extend(self.mesh_boundary_edges()?);
        }
        if indices.is_empty() && !self.indices.is_empty() {
            tracing::warn!(
                warning = %SelectionWarning::EmptySelection,
                from = %self.kind,
                to = %target,
                "conversion produced no elements"
            );
        }
        Ok(self.rebind(target, indices))
    }

    /// Converts to vertices.
    ///
    /// # Errors
    ///
    /// See [`Component::convert_to`].
    pub fn to_vertex(&self, options: ConvertOptions) -> Result<Self> {
        self.convert_to(ElementKind::Vertex, options)
    }

    /// Converts to edges.
    ///
    /// # Errors
    ///
    /// See [`Component::convert_to`].
    pub fn to_edge(&self, options: ConvertOptions) -> Result<Self> {
        self.convert_to(ElementKind::Edge, options)
    }

    /// Converts to faces.
    ///
    /// # Errors
    ///
    /// See [`Component::convert_to`].
    pub fn to_face(&self, options: ConvertOptions) -> Result<Self> {
        self.convert_to(ElementKind::Face, options)
    }

    /// Converts to UV points.
    ///
    /// # Errors
    ///
    /// See [`Component::convert_to`].
    pub fn to_uv(&self, options: ConvertOptions) -> Result<Self> {
        self.convert_to(ElementKind::UvPoint, options)
    }

    /// Mesh-boundary edges of the selected faces.
    fn mesh_boundary_edges(&self) -> Result<BTreeSet<u32>> {
        let mut edges = BTreeSet::new();
        for face in self.iter() {
            if !self.provider.is_boundary_face(self.mesh, face)? {
                continue;
            }
            let face_edges = self.provider.convert_elements(
                self.mesh,
                &BTreeSet::from([face]),
                ElementKind::Face,
                ElementKind::Edge,
                ConvertOptions::new(),
            )?;
            for edge in face_edges {
                if self.provider.is_boundary_edge(self.mesh, edge)? {
                    edges.insert(edge);
                }
            }
        }
        Ok(edges)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_meshes::{cube, plane_2x2, set, store_with};

    #[test]
    fn border_of_whole_plane_is_its_outline() {
        let (store, mesh) = store_with(plane_2x2());
        let all = Component::create(&store, mesh, ElementKind::Face)
            .get_complete()
            .unwrap();
        let border = all.to_edge(ConvertOptions::border()).unwrap();
        assert_eq!(border.indices(), &set(&[0, 3, 4, 5, 8, 9, 10, 11]));
    }

    #[test]
    fn border_of_corner_face_is_its_ring() {
        let (store, mesh) = store_with(plane_2x2());
        let corner = Component::from_indices(&store, mesh, ElementKind::Face, [0]);
        let border = corner.to_edge(ConvertOptions::border()).unwrap();
        assert_eq!(border.indices(), &set(&[0, 1, 2, 3]));
        assert_eq!(border.kind(), ElementKind::Edge);
    }

    #[test]
    fn border_on_closed_mesh_needs_no_patch() {
        let (store, mesh) = store_with(cube());
        let face = Component::from_indices(&store, mesh, ElementKind::Face, [0]);
        assert_eq!(face.to_edge(ConvertOptions::border()).unwrap().len(), 4);
    }

    #[test]
    fn round_trip_is_a_superset() {
        let (store, mesh) = store_with(plane_2x2());
        let verts = Component::from_indices(&store, mesh, ElementKind::Vertex, [4]);
        let faces = verts.to_face(ConvertOptions::new()).unwrap();
        assert_eq!(faces.len(), 4);
        let back = faces.to_vertex(ConvertOptions::new()).unwrap();
        assert!(back.indices().is_superset(verts.indices()));
        assert_eq!(back.len(), 9);

        let face = Component::from_indices(&store, mesh, ElementKind::Face, [3]);
        let uvs = face.to_uv(ConvertOptions::new()).unwrap();
        let again = uvs.to_face(ConvertOptions::internal()).unwrap();
        assert!(again.indices().is_superset(face.indices()));
    }

    #[test]
    fn internal_vertex_to_edge() {
        let (store, mesh) = store_with(plane_2x2());
        let verts = Component::from_indices(&store, mesh, ElementKind::Vertex, [0, 1, 4]);
        let edges = verts.to_edge(ConvertOptions::internal()).unwrap();
        assert_eq!(edges.indices(), &set(&[0, 1]));
    }

    #[test]
    fn empty_conversion_yields_empty_component() {
        let (store, mesh) = store_with(plane_2x2());
        let verts = Component::from_indices(&store, mesh, ElementKind::Vertex, [0]);
        let faces = verts.to_face(ConvertOptions::internal()).unwrap();
        assert!(faces.is_empty());
        assert_eq!(faces.mesh(), mesh);
    }

    #[test]
    fn out_of_range_index_fails() {
        let (store, mesh) = store_with(cube());
        let bad = Component::from_indices(&store, mesh, ElementKind::Face, [6]);
        assert!(bad.to_vertex(ConvertOptions::new()).is_err());
    }
}
