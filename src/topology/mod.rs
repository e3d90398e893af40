pub mod kind;
pub mod mesh;
pub mod primitives;
pub mod provider;

pub use kind::ElementKind;
pub use mesh::PolyMesh;
pub use provider::{ConvertOptions, ProviderResult, TopologyProvider};

use std::collections::BTreeSet;

use crate::error::TopologyError;
use crate::math::{Point2, Point3, Space, Vector3};
use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Handle to a mesh in a [`MeshStore`].
    pub struct MeshId;
}

/// Central arena that owns every mesh.
///
/// Components refer to meshes through copyable [`MeshId`] handles. Removing a
/// mesh invalidates its handle; later queries through it fail with
/// [`TopologyError::StaleReference`].
#[derive(Debug, Default)]
pub struct MeshStore {
    meshes: SlotMap<MeshId, PolyMesh>,
}

impl MeshStore {
    /// Creates a new, empty mesh store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a mesh and returns its handle.
    pub fn add_mesh(&mut self, mesh: PolyMesh) -> MeshId {
        self.meshes.insert(mesh)
    }

    /// Removes a mesh, returning it if the handle was live.
    pub fn remove_mesh(&mut self, id: MeshId) -> Option<PolyMesh> {
        self.meshes.remove(id)
    }

    /// Returns a reference to the mesh, or an error if the handle is stale.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh is not in the store.
    pub fn mesh(&self, id: MeshId) -> Result<&PolyMesh, TopologyError> {
        self.meshes
            .get(id)
            .ok_or(TopologyError::StaleReference(id))
    }

    /// Number of meshes in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    /// Returns `true` if the store holds no meshes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

impl TopologyProvider for MeshStore {
    fn element_count(&self, mesh: MeshId, kind: ElementKind) -> ProviderResult<usize> {
        Ok(self.mesh(mesh)?.count(kind))
    }

    fn points(&self, mesh: MeshId, space: Space) -> ProviderResult<Vec<Point3>> {
        Ok(self.mesh(mesh)?.points(space))
    }

    fn uv_coordinates(&self, mesh: MeshId) -> ProviderResult<Vec<Point2>> {
        Ok(self.mesh(mesh)?.uvs().to_vec())
    }

    fn edge_endpoints(&self, mesh: MeshId, edge: u32) -> ProviderResult<[u32; 2]> {
        self.mesh(mesh)?.edge(edge)
    }

    fn face_vertices(&self, mesh: MeshId, face: u32) -> ProviderResult<Vec<u32>> {
        Ok(self.mesh(mesh)?.face(face)?.to_vec())
    }

    fn face_normal_ids(&self, mesh: MeshId, face: u32) -> ProviderResult<Vec<u32>> {
        // Normals are shared per vertex, so normal ids are vertex ids.
        self.face_vertices(mesh, face)
    }

    fn convert_elements(
        &self,
        mesh: MeshId,
        indices: &BTreeSet<u32>,
        from: ElementKind,
        to: ElementKind,
        options: ConvertOptions,
    ) -> ProviderResult<BTreeSet<u32>> {
        self.mesh(mesh)?.convert(indices, from, to, options)
    }

    fn is_boundary_face(&self, mesh: MeshId, face: u32) -> ProviderResult<bool> {
        self.mesh(mesh)?.is_boundary_face(face)
    }

    fn is_boundary_edge(&self, mesh: MeshId, edge: u32) -> ProviderResult<bool> {
        self.mesh(mesh)?.is_boundary_edge(edge)
    }

    fn boundary_loop_through_edge(
        &self,
        mesh: MeshId,
        edge: u32,
    ) -> ProviderResult<BTreeSet<u32>> {
        self.mesh(mesh)?.boundary_loop(edge)
    }

    fn faces_adjacent_across_shared_edge(
        &self,
        mesh: MeshId,
        face: u32,
    ) -> ProviderResult<BTreeSet<u32>> {
        self.mesh(mesh)?.adjacent_faces(face)
    }

    fn uv_shell_ids(&self, mesh: MeshId) -> ProviderResult<Vec<u32>> {
        Ok(self.mesh(mesh)?.uv_shells().0.to_vec())
    }

    fn uv_shell_count(&self, mesh: MeshId) -> ProviderResult<usize> {
        Ok(self.mesh(mesh)?.uv_shells().1)
    }

    fn vertex_normals(
        &self,
        mesh: MeshId,
        space: Space,
        angle_weighted: bool,
    ) -> ProviderResult<Vec<Vector3>> {
        Ok(self.mesh(mesh)?.vertex_normals(space, angle_weighted))
    }

    fn face_normal(&self, mesh: MeshId, face: u32, space: Space) -> ProviderResult<Vector3> {
        self.mesh(mesh)?.face_normal(face, space)
    }

    fn mesh_name(&self, mesh: MeshId) -> ProviderResult<String> {
        Ok(self.mesh(mesh)?.name().to_owned())
    }

    fn find_mesh(&self, name: &str) -> ProviderResult<MeshId> {
        self.meshes
            .iter()
            .find(|(_, mesh)| mesh.name() == name)
            .map(|(id, _)| id)
            .ok_or_else(|| TopologyError::UnknownMesh(name.to_owned()))
    }

    fn mesh_ids(&self) -> Vec<MeshId> {
        self.meshes.keys().collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_meshes::cube;

    #[test]
    fn removed_mesh_handle_is_stale() {
        let mut store = MeshStore::new();
        let id = store.add_mesh(cube());
        assert_eq!(store.element_count(id, ElementKind::Face).unwrap(), 6);
        assert!(store.remove_mesh(id).is_some());
        assert_eq!(
            store.element_count(id, ElementKind::Face),
            Err(TopologyError::StaleReference(id))
        );
        assert!(store.is_empty());
    }

    #[test]
    fn find_mesh_by_name() {
        let mut store = MeshStore::new();
        let id = store.add_mesh(cube());
        assert_eq!(store.find_mesh("pCube1").unwrap(), id);
        assert_eq!(store.mesh_name(id).unwrap(), "pCube1");
        assert!(matches!(
            store.find_mesh("pSphere1"),
            Err(TopologyError::UnknownMesh(_))
        ));
        assert_eq!(store.mesh_ids(), vec![id]);
    }
}
