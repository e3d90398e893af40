use std::ops::RangeBounds;
use std::rc::Rc;

use crate::cache::{InvalidateCache, PositionCache};
use crate::component::Component;
use crate::error::{ComponentError, Result, SelectionWarning};
use crate::math::{BoundingBox, BoxKind, Space};
use crate::topology::{ElementKind, MeshId, TopologyProvider};

use super::{pattern, position, SelectionState};

/// A mesh as a whole, looked up by handle.
#[derive(Clone)]
pub struct MeshNode<'a> {
    provider: &'a dyn TopologyProvider,
    id: MeshId,
    name: String,
}

impl<'a> MeshNode<'a> {
    /// Looks up the mesh behind `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is stale.
    pub fn resolve(provider: &'a dyn TopologyProvider, id: MeshId) -> Result<Self> {
        let name = provider.mesh_name(id)?;
        Ok(Self { provider, id, name })
    }

    #[must_use]
    pub fn id(&self) -> MeshId {
        self.id
    }

    /// Name at the time the node was resolved.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of elements of `kind`.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is stale.
    pub fn element_count(&self, kind: ElementKind) -> Result<usize> {
        Ok(self.provider.element_count(self.id, kind)?)
    }

    /// An empty component of `kind` on this mesh.
    #[must_use]
    pub fn component(&self, kind: ElementKind) -> Component<'a> {
        Component::create(self.provider, self.id, kind)
    }

    /// Every element of `kind` on this mesh.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is stale.
    pub fn complete(&self, kind: ElementKind) -> Result<Component<'a>> {
        self.component(kind).get_complete()
    }

    /// Bounding box of every vertex.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is stale or the mesh has no vertices.
    pub fn bbox(&self, space: Space) -> Result<BoundingBox> {
        let points = self.provider.points(self.id, space)?;
        Ok(BoundingBox::from_points(&points, BoxKind::Spatial).ok_or(ComponentError::Empty)?)
    }

    /// Returns `true` while the handle is live.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.provider.mesh_name(self.id).is_ok()
    }
}

impl PartialEq for MeshNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl std::fmt::Debug for MeshNode<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshNode")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// An ordered list of whole meshes.
///
/// Entries are mesh handles; the [`MeshNode`] at a position is resolved on
/// first access and cached until that position changes.
pub struct MeshList<'a> {
    provider: &'a dyn TopologyProvider,
    entries: Vec<MeshId>,
    cache: PositionCache<Rc<MeshNode<'a>>>,
}

impl<'a> MeshList<'a> {
    /// Creates an empty list.
    #[must_use]
    pub fn new(provider: &'a dyn TopologyProvider) -> Self {
        Self {
            provider,
            entries: Vec::new(),
            cache: PositionCache::new(),
        }
    }

    /// Builds a list from handles, in order.
    pub fn from_ids(provider: &'a dyn TopologyProvider, ids: impl IntoIterator<Item = MeshId>) -> Self {
        let mut list = Self::new(provider);
        list.entries.extend(ids);
        list
    }

    /// Meshes whose name matches `name`, which may contain `*` wildcards.
    ///
    /// # Errors
    ///
    /// Returns an error if a name without wildcards names no mesh.
    pub fn from_name(provider: &'a dyn TopologyProvider, name: &str) -> Result<Self> {
        let ids = pattern::matching_meshes(provider, name)?;
        if ids.is_empty() {
            tracing::warn!(warning = %SelectionWarning::EmptySelection, name, "no mesh matched");
        }
        Ok(Self::from_ids(provider, ids))
    }

    /// Every mesh with a selected component, in the order first selected.
    #[must_use]
    pub fn from_selection(provider: &'a dyn TopologyProvider, state: &SelectionState) -> Self {
        let mut list = Self::new(provider);
        for raw in state.entries() {
            if !list.contains(raw.mesh) {
                list.entries.push(raw.mesh);
            }
        }
        list
    }

    /// The node at `index`, resolved on first access.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::IndexOutOfRange`](crate::error::SelectionError::IndexOutOfRange) past the end, or an
    /// error if the handle is stale.
    pub fn get(&self, index: usize) -> Result<Rc<MeshNode<'a>>> {
        position::check(index, self.len())?;
        if let Some(cached) = self.cache.get(index) {
            return Ok(cached);
        }
        let node = Rc::new(MeshNode::resolve(self.provider, self.entries[index])?);
        Ok(self.cache.get_or_insert_with(index, || node))
    }

    /// Iterates the live nodes in order; stale handles are skipped.
    pub fn iter(&self) -> impl Iterator<Item = Rc<MeshNode<'a>>> + '_ {
        (0..self.len()).filter_map(|i| self.get(i).ok())
    }

    /// The handles in order.
    #[must_use]
    pub fn ids(&self) -> &[MeshId] {
        &self.entries
    }

    /// Names of every entry, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if a handle is stale.
    pub fn names(&self) -> Result<Vec<String>> {
        (0..self.len())
            .map(|i| Ok(self.get(i)?.name().to_owned()))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds `id` as a new last entry.
    pub fn append(&mut self, id: MeshId) {
        self.entries.push(id);
    }

    /// Appends every handle.
    pub fn extend(&mut self, ids: impl IntoIterator<Item = MeshId>) {
        self.entries.extend(ids);
    }

    /// Replaces the entry at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::IndexOutOfRange`](crate::error::SelectionError::IndexOutOfRange) past the end.
    pub fn replace(&mut self, index: usize, id: MeshId) -> Result<()> {
        position::check(index, self.len())?;
        self.cache.pop(index);
        self.entries[index] = id;
        Ok(())
    }

    /// Removes the entry at `index`; later entries move down.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::IndexOutOfRange`](crate::error::SelectionError::IndexOutOfRange) past the end.
    pub fn remove(&mut self, index: usize) -> Result<MeshId> {
        position::check(index, self.len())?;
        self.cache.remove_and_shift(index);
        Ok(self.entries.remove(index))
    }

    /// Removes and returns the node at `index`, or the last one.
    ///
    /// # Errors
    ///
    /// Returns an error past the end, on an empty list, or if the handle is
    /// stale. A stale entry stays in the list.
    pub fn pop(&mut self, index: Option<usize>) -> Result<Rc<MeshNode<'a>>> {
        let index = index.unwrap_or_else(|| position::last_or_zero(self.len()));
        let node = self.get(index)?;
        self.remove(index)?;
        Ok(node)
    }

    /// A new list over the entries in `range`, clamped to the list.
    #[must_use]
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Self {
        Self::from_ids(
            self.provider,
            self.entries[position::clamp(&range, self.len())].iter().copied(),
        )
    }

    #[must_use]
    pub fn contains(&self, id: MeshId) -> bool {
        self.entries.contains(&id)
    }

    /// Returns `true` if every handle is live.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.entries
            .iter()
            .all(|&id| self.provider.mesh_name(id).is_ok())
    }
}

impl InvalidateCache for MeshList<'_> {
    fn invalidate_cache(&mut self) {
        self.cache.clear();
    }
}

impl PartialEq for MeshList<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl std::fmt::Debug for MeshList<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshList")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}
