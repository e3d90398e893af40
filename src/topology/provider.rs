use std::collections::BTreeSet;

use crate::error::TopologyError;
use crate::math::{Point2, Point3, Space, Vector3};

use super::{ElementKind, MeshId};

/// Result type for provider queries.
pub type ProviderResult<T> = std::result::Result<T, TopologyError>;

/// Flags accepted by [`TopologyProvider::convert_elements`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConvertOptions {
    /// Only include target elements whose every incident source element is
    /// part of the source set.
    pub internal: bool,
    /// Only include target elements on the boundary of the source set.
    pub border: bool,
}

impl ConvertOptions {
    /// Plain conversion: every target element touching the source set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Strict interior conversion.
    #[must_use]
    pub fn internal() -> Self {
        Self {
            internal: true,
            border: false,
        }
    }

    /// Boundary-only conversion.
    #[must_use]
    pub fn border() -> Self {
        Self {
            internal: false,
            border: true,
        }
    }
}

/// Geometry and adjacency queries supplied by the host mesh engine.
///
/// Every method takes the mesh handle it queries; a handle that no longer
/// resolves must produce [`TopologyError::StaleReference`]. Implementations
/// never mutate the mesh.
pub trait TopologyProvider {
    /// Number of elements of `kind` on `mesh`.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh handle is stale.
    fn element_count(&self, mesh: MeshId, kind: ElementKind) -> ProviderResult<usize>;

    /// Vertex positions in the requested space, indexed by vertex id.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh handle is stale.
    fn points(&self, mesh: MeshId, space: Space) -> ProviderResult<Vec<Point3>>;

    /// UV coordinates, indexed by UV id.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh handle is stale.
    fn uv_coordinates(&self, mesh: MeshId) -> ProviderResult<Vec<Point2>>;

    /// The two vertices of an edge.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh handle is stale or the edge does not exist.
    fn edge_endpoints(&self, mesh: MeshId, edge: u32) -> ProviderResult<[u32; 2]>;

    /// Vertices of a face in winding order.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh handle is stale or the face does not exist.
    fn face_vertices(&self, mesh: MeshId, face: u32) -> ProviderResult<Vec<u32>>;

    /// Normal ids of a face's corners, indexing into [`Self::vertex_normals`].
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh handle is stale or the face does not exist.
    fn face_normal_ids(&self, mesh: MeshId, face: u32) -> ProviderResult<Vec<u32>>;

    /// Maps `indices` of `from` kind to the equivalent set of `to` kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh handle is stale or an index is out of range.
    fn convert_elements(
        &self,
        mesh: MeshId,
        indices: &BTreeSet<u32>,
        from: ElementKind,
        to: ElementKind,
        options: ConvertOptions,
    ) -> ProviderResult<BTreeSet<u32>>;

    /// Returns `true` if the face has at least one mesh-boundary edge.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh handle is stale or the face does not exist.
    fn is_boundary_face(&self, mesh: MeshId, face: u32) -> ProviderResult<bool>;

    /// Returns `true` if the edge is used by exactly one face.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh handle is stale or the edge does not exist.
    fn is_boundary_edge(&self, mesh: MeshId, edge: u32) -> ProviderResult<bool>;

    /// All edges of the boundary loop through `edge`; empty if `edge` is not
    /// a boundary edge.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh handle is stale or the edge does not exist.
    fn boundary_loop_through_edge(&self, mesh: MeshId, edge: u32)
        -> ProviderResult<BTreeSet<u32>>;

    /// Faces sharing an edge with `face`.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh handle is stale or the face does not exist.
    fn faces_adjacent_across_shared_edge(
        &self,
        mesh: MeshId,
        face: u32,
    ) -> ProviderResult<BTreeSet<u32>>;

    /// Shell id of every UV, indexed by UV id.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh handle is stale.
    fn uv_shell_ids(&self, mesh: MeshId) -> ProviderResult<Vec<u32>>;

    /// Number of distinct UV shells.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh handle is stale.
    fn uv_shell_count(&self, mesh: MeshId) -> ProviderResult<usize>;

    /// Per-vertex normals, indexed by vertex id.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh handle is stale.
    fn vertex_normals(
        &self,
        mesh: MeshId,
        space: Space,
        angle_weighted: bool,
    ) -> ProviderResult<Vec<Vector3>>;

    /// Unit normal of a face.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh handle is stale or the face does not exist.
    fn face_normal(&self, mesh: MeshId, face: u32, space: Space) -> ProviderResult<Vector3>;

    /// Name of the mesh, used in component strings.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh handle is stale.
    fn mesh_name(&self, mesh: MeshId) -> ProviderResult<String>;

    /// Resolves a mesh by exact name.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::UnknownMesh`] if no mesh has that name.
    fn find_mesh(&self, name: &str) -> ProviderResult<MeshId>;

    /// Every live mesh handle.
    fn mesh_ids(&self) -> Vec<MeshId>;
}
