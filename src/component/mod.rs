mod connected;
mod convert;
mod geometry;
mod multi;
mod shells;

pub use multi::MultiComponent;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::cache::{InvalidateCache, Lazy, Memo};
use crate::error::{ComponentError, Result, SelectionWarning};
use crate::math::{BoundingBox, Point3, Space, Vector3};
use crate::topology::{ConvertOptions, ElementKind, MeshId, TopologyProvider};

/// A component without its provider binding: the raw `(mesh, kind, indices)`
/// triple stored by selection lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawComponent {
    pub mesh: MeshId,
    pub kind: ElementKind,
    pub indices: BTreeSet<u32>,
}

impl RawComponent {
    /// Creates a raw component from any collection of indices.
    pub fn new(mesh: MeshId, kind: ElementKind, indices: impl IntoIterator<Item = u32>) -> Self {
        Self {
            mesh,
            kind,
            indices: indices.into_iter().collect(),
        }
    }

    /// Returns `true` if both are bound to the same mesh and kind.
    #[must_use]
    pub fn same_binding(&self, other: &RawComponent) -> bool {
        self.mesh == other.mesh && self.kind == other.kind
    }
}

impl From<&Component<'_>> for RawComponent {
    fn from(component: &Component<'_>) -> Self {
        component.to_raw()
    }
}

/// Derived values of a component. Every field depends on the index set.
#[derive(Clone, Default)]
struct ComponentCache<'a> {
    points: Memo<Space, Rc<BTreeMap<u32, Point3>>>,
    normals: Memo<(Space, bool), Rc<BTreeMap<u32, Vector3>>>,
    bbox: Memo<Space, BoundingBox>,
    mesh_shells: Lazy<Rc<BTreeMap<usize, Component<'a>>>>,
    uv_shells: Lazy<Rc<BTreeMap<u32, Component<'a>>>>,
    vertex_pairs: Lazy<Rc<BTreeMap<u32, [u32; 2]>>>,
    face_vertices: Lazy<Rc<BTreeMap<u32, Vec<u32>>>>,
}

impl InvalidateCache for ComponentCache<'_> {
    fn invalidate_cache(&mut self) {
        self.points.invalidate();
        self.normals.invalidate();
        self.bbox.invalidate();
        self.mesh_shells.invalidate();
        self.uv_shells.invalidate();
        self.vertex_pairs.invalidate();
        self.face_vertices.invalidate();
    }
}

/// A set of element indices of one [`ElementKind`], bound to a mesh.
///
/// Two components are equal when they share mesh, kind and index set.
#[derive(Clone)]
pub struct Component<'a> {
    provider: &'a dyn TopologyProvider,
    mesh: MeshId,
    kind: ElementKind,
    indices: BTreeSet<u32>,
    space: Space,
    angle_weighted: bool,
    cache: ComponentCache<'a>,
}

impl<'a> Component<'a> {
    /// Creates an empty component bound to `mesh` and `kind`.
    #[must_use]
    pub fn create(provider: &'a dyn TopologyProvider, mesh: MeshId, kind: ElementKind) -> Self {
        Self {
            provider,
            mesh,
            kind,
            indices: BTreeSet::new(),
            space: Space::default(),
            angle_weighted: false,
            cache: ComponentCache::default(),
        }
    }

    /// Creates a populated component.
    pub fn from_indices(
        provider: &'a dyn TopologyProvider,
        mesh: MeshId,
        kind: ElementKind,
        indices: impl IntoIterator<Item = u32>,
    ) -> Self {
        let mut component = Self::create(provider, mesh, kind);
        component.indices = indices.into_iter().collect();
        component
    }

    /// Binds a raw triple to a provider.
    #[must_use]
    pub fn from_raw(provider: &'a dyn TopologyProvider, raw: RawComponent) -> Self {
        Self::from_indices(provider, raw.mesh, raw.kind, raw.indices)
    }

    /// An empty component with the same mesh, kind and settings.
    #[must_use]
    pub fn new_empty(&self) -> Self {
        Self::create(self.provider, self.mesh, self.kind)
            .with_space(self.space)
            .with_angle_weighted_normals(self.angle_weighted)
    }

    /// A component holding only `index`, with the same binding.
    #[must_use]
    pub fn single(&self, index: u32) -> Self {
        let mut component = self.new_empty();
        component.indices.insert(index);
        component
    }

    /// A copy bound to `indices` instead of this component's own.
    fn with_indices(&self, indices: BTreeSet<u32>) -> Self {
        self.rebind(self.kind, indices)
    }

    /// A component on the same mesh with the same settings, holding
    /// `indices` of `kind`.
    pub(crate) fn rebind(&self, kind: ElementKind, indices: BTreeSet<u32>) -> Self {
        let mut component = Self::create(self.provider, self.mesh, kind)
            .with_space(self.space)
            .with_angle_weighted_normals(self.angle_weighted);
        component.indices = indices;
        component
    }

    /// Sets the coordinate space and returns the component.
    #[must_use]
    pub fn with_space(mut self, space: Space) -> Self {
        self.space = space;
        self
    }

    /// Makes [`Component::normals`] weight face normals by corner angle.
    #[must_use]
    pub fn with_angle_weighted_normals(mut self, weighted: bool) -> Self {
        self.angle_weighted = weighted;
        self
    }

    /// Changes the coordinate space. Space-keyed caches stay valid, since
    /// they are stored per space.
    pub fn set_space(&mut self, space: Space) {
        self.space = space;
    }

    /// The provider this component queries.
    #[must_use]
    pub fn provider(&self) -> &'a dyn TopologyProvider {
        self.provider
    }

    /// Handle of the mesh this component is bound to.
    #[must_use]
    pub fn mesh(&self) -> MeshId {
        self.mesh
    }

    /// Element kind of the indices.
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Coordinate space for point, normal and bounding box queries.
    #[must_use]
    pub fn space(&self) -> Space {
        self.space
    }

    /// The index set.
    #[must_use]
    pub fn indices(&self) -> &BTreeSet<u32> {
        &self.indices
    }

    /// Iterates indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.indices.iter().copied()
    }

    /// Number of indices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns `true` if the component holds no indices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Returns `true` if `index` is part of the component.
    #[must_use]
    pub fn contains(&self, index: u32) -> bool {
        self.indices.contains(&index)
    }

    /// Returns `true` if the component is of `kind`.
    #[must_use]
    pub fn is_kind(&self, kind: ElementKind) -> bool {
        self.kind == kind
    }

    /// The lowest index.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::Empty`] if there are no indices.
    pub fn index(&self) -> Result<u32> {
        Ok(self.indices.first().copied().ok_or(ComponentError::Empty)?)
    }

    /// The `position`-th index as a single-index component.
    ///
    /// # Errors
    ///
    /// Returns an error if `position` is past the end.
    pub fn nth(&self, position: usize) -> Result<Self> {
        let index = self.indices.iter().nth(position).copied().ok_or(
            ComponentError::IndexOutOfRange {
                index: position,
                len: self.len(),
            },
        )?;
        Ok(self.single(index))
    }

    /// Unbinds the component into a raw triple.
    #[must_use]
    pub fn to_raw(&self) -> RawComponent {
        RawComponent {
            mesh: self.mesh,
            kind: self.kind,
            indices: self.indices.clone(),
        }
    }

    /// Adds indices. Caches are dropped only if the set actually grows.
    pub fn add(&mut self, indices: impl IntoIterator<Item = u32>) -> &mut Self {
        let new: Vec<u32> = indices
            .into_iter()
            .filter(|i| !self.indices.contains(i))
            .collect();
        if !new.is_empty() {
            self.invalidate_cache();
            self.indices.extend(new);
        }
        self
    }

    /// Adds every index of `other`.
    ///
    /// # Errors
    ///
    /// Returns an error if `other` is bound to another mesh or kind.
    pub fn merge(&mut self, other: &Component<'_>) -> Result<()> {
        self.check_binding(other)?;
        self.add(other.iter());
        Ok(())
    }

    fn check_binding(&self, other: &Component<'_>) -> Result<()> {
        if self.mesh != other.mesh {
            return Err(ComponentError::MeshMismatch.into());
        }
        if self.kind != other.kind {
            return Err(ComponentError::KindMismatch {
                expected: self.kind,
                found: other.kind,
            }
            .into());
        }
        Ok(())
    }

    /// Number of elements of this component's kind on the mesh.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh handle is stale.
    pub fn element_count(&self) -> Result<usize> {
        Ok(self.provider.element_count(self.mesh, self.kind)?)
    }

    /// Returns `true` if the mesh is live and every index is in range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.element_count().is_ok_and(|count| {
            self.indices
                .last()
                .map_or(true, |&last| (last as usize) < count)
        })
    }

    /// A component holding every element of this kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh handle is stale.
    pub fn get_complete(&self) -> Result<Self> {
        let count = u32::try_from(self.element_count()?).unwrap_or(u32::MAX);
        Ok(self.with_indices((0..count).collect()))
    }

    /// Returns `true` if the component holds every element of its kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh handle is stale.
    pub fn is_complete(&self) -> Result<bool> {
        Ok(self.element_count()? == self.len())
    }

    /// Returns `true` if element `index` lies on the mesh boundary.
    ///
    /// Faces and edges ask the provider directly. A vertex or UV is on the
    /// boundary when any edge it touches is.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh handle is stale or `index` is out of range.
    pub fn is_border(&self, index: u32) -> Result<bool> {
        match self.kind {
            ElementKind::Face => Ok(self.provider.is_boundary_face(self.mesh, index)?),
            ElementKind::Edge => Ok(self.provider.is_boundary_edge(self.mesh, index)?),
            ElementKind::Vertex | ElementKind::UvPoint => {
                let edges = self.single(index).to_edge(ConvertOptions::new())?;
                for edge in edges.iter() {
                    if self.provider.is_boundary_edge(self.mesh, edge)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    /// The subset of indices that lie on the mesh boundary.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh handle is stale.
    pub fn border_indices(&self) -> Result<Self> {
        let mut border = BTreeSet::new();
        for index in self.iter() {
            if self.is_border(index)? {
                border.insert(index);
            }
        }
        Ok(self.with_indices(border))
    }

    /// Symmetric difference with `other`, or with the complete set of this
    /// kind when `other` is `None`.
    ///
    /// Toggling against a component on another mesh or of another kind is
    /// logged and returns an unchanged copy.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh handle is stale.
    pub fn toggle(&self, other: Option<&Component<'_>>) -> Result<Self> {
        let against = match other {
            Some(other) => {
                if self.check_binding(other).is_err() {
                    tracing::warn!(
                        warning = %SelectionWarning::MixedMesh,
                        "cannot toggle {self} against {other}"
                    );
                    return Ok(self.with_indices(self.indices.clone()));
                }
                other.indices.clone()
            }
            None => self.get_complete()?.indices,
        };
        Ok(self.with_indices(
            self.indices
                .symmetric_difference(&against)
                .copied()
                .collect(),
        ))
    }

    /// Maya-style selection strings, e.g. `["pCube1.f[0:2]", "pCube1.f[5]"]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh handle is stale.
    pub fn selection_strings(&self) -> Result<Vec<String>> {
        let name = self.provider.mesh_name(self.mesh)?;
        Ok(index_ranges(&self.indices)
            .into_iter()
            .map(|(start, end)| {
                if start == end {
                    format!("{name}.{}[{start}]", self.kind.tag())
                } else {
                    format!("{name}.{}[{start}:{end}]", self.kind.tag())
                }
            })
            .collect())
    }
}

impl InvalidateCache for Component<'_> {
    fn invalidate_cache(&mut self) {
        tracing::trace!("invalidating component cache");
        self.cache.invalidate_cache();
    }
}

impl PartialEq for Component<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.mesh == other.mesh && self.kind == other.kind && self.indices == other.indices
    }
}

impl Eq for Component<'_> {}

impl Hash for Component<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.mesh.hash(state);
        self.kind.hash(state);
        self.indices.hash(state);
    }
}

impl fmt::Display for Component<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.kind.tag())?;
        for (i, (start, end)) in index_ranges(&self.indices).into_iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            if start == end {
                write!(f, "{start}")?;
            } else {
                write!(f, "{start}:{end}")?;
            }
        }
        f.write_str("]")
    }
}

impl fmt::Debug for Component<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("mesh", &self.mesh)
            .field("kind", &self.kind)
            .field("indices", &self.indices)
            .field("space", &self.space)
            .finish_non_exhaustive()
    }
}

impl<'c> IntoIterator for &'c Component<'_> {
    type Item = u32;
    type IntoIter = std::iter::Copied<std::collections::btree_set::Iter<'c, u32>>;

    fn into_iter(self) -> Self::IntoIter {
        self.indices.iter().copied()
    }
}

/// Collapses sorted indices into inclusive `(start, end)` runs.
pub(crate) fn index_ranges(indices: &BTreeSet<u32>) -> Vec<(u32, u32)> {
    let mut ranges: Vec<(u32, u32)> = Vec::new();
    for &index in indices {
        match ranges.last_mut() {
            Some((_, end)) if end.checked_add(1) == Some(index) => *end = index,
            _ => ranges.push((index, index)),
        }
    }
    ranges
}
