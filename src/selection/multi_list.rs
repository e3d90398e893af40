use std::ops::RangeBounds;
use std::rc::Rc;

use crate::cache::{InvalidateCache, PositionCache};
use crate::component::{Component, MultiComponent, RawComponent};
use crate::error::{Result, SelectionWarning};
use crate::math::Space;
use crate::topology::{MeshId, TopologyProvider};

use super::{position, ComponentList, ComponentPattern, SelectionState};

/// Raw parts of one entry: a mesh and at most one triple per kind.
#[derive(Debug, Clone, PartialEq)]
struct MultiEntry {
    mesh: MeshId,
    parts: Vec<RawComponent>,
}

impl MultiEntry {
    fn new(mesh: MeshId) -> Self {
        Self {
            mesh,
            parts: Vec::new(),
        }
    }

    fn merge(&mut self, raw: RawComponent) {
        if raw.indices.is_empty() {
            return;
        }
        match self.parts.iter_mut().find(|part| part.kind == raw.kind) {
            Some(part) => part.indices.extend(raw.indices),
            None => {
                self.parts.push(raw);
                self.parts.sort_by_key(|part| part.kind);
            }
        }
    }

    fn overlaps(&self, other: &RawComponent) -> bool {
        self.parts
            .iter()
            .any(|part| part.same_binding(other) && !part.indices.is_disjoint(&other.indices))
    }
}

/// An ordered list whose entries group every kind of component picked on
/// one mesh.
///
/// Built from mixed selections such as a face and a few vertices on the
/// same mesh. Each position holds a [`MultiComponent`], built on first
/// access and cached until that position changes.
pub struct MultiComponentList<'a> {
    provider: &'a dyn TopologyProvider,
    entries: Vec<MultiEntry>,
    space: Space,
    cache: PositionCache<Rc<MultiComponent<'a>>>,
}

impl<'a> MultiComponentList<'a> {
    /// Creates an empty list.
    #[must_use]
    pub fn new(provider: &'a dyn TopologyProvider) -> Self {
        Self {
            provider,
            entries: Vec::new(),
            space: Space::default(),
            cache: PositionCache::new(),
        }
    }

    /// Groups raw triples by mesh, in the order meshes are first seen.
    pub fn from_raw(
        provider: &'a dyn TopologyProvider,
        raws: impl IntoIterator<Item = RawComponent>,
    ) -> Self {
        let mut list = Self::new(provider);
        for raw in raws {
            list.merge_raw(raw);
        }
        list
    }

    /// The host's active selection, grouped by mesh.
    #[must_use]
    pub fn from_selection(provider: &'a dyn TopologyProvider, state: &SelectionState) -> Self {
        let list = Self::from_raw(provider, state.entries().iter().cloned());
        if list.is_empty() {
            tracing::warn!(warning = %SelectionWarning::EmptySelection, "nothing selected");
        }
        list.with_space(state.prefs().space)
    }

    /// Builds a list from component strings such as `pCube1.f[0:3]`.
    ///
    /// # Errors
    ///
    /// Returns an error if a string does not parse or does not resolve.
    pub fn from_strings<S: AsRef<str>>(
        provider: &'a dyn TopologyProvider,
        strings: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let mut raws = Vec::new();
        for string in strings {
            raws.extend(ComponentPattern::parse(string.as_ref())?.resolve(provider)?);
        }
        Ok(Self::from_raw(provider, raws))
    }

    /// Regroups the entries of a [`ComponentList`] by mesh.
    #[must_use]
    pub fn from_list(list: &ComponentList<'a>) -> Self {
        Self::from_raw(list.provider(), list.raw_entries().iter().cloned())
            .with_space(list.space())
    }

    /// Sets the coordinate space of multi-components built from this list.
    #[must_use]
    pub fn with_space(mut self, space: Space) -> Self {
        self.space = space;
        self.invalidate_cache();
        self
    }

    fn build(&self, entry: &MultiEntry) -> Result<Rc<MultiComponent<'a>>> {
        let parts = entry
            .parts
            .iter()
            .map(|raw| Component::from_raw(self.provider, raw.clone()));
        let multi = MultiComponent::from_parts(self.provider, entry.mesh, parts)?;
        Ok(Rc::new(multi.with_space(self.space)))
    }

    /// The multi-component at `index`, built on first access.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::IndexOutOfRange`](crate::error::SelectionError::IndexOutOfRange) past the end.
    pub fn get(&self, index: usize) -> Result<Rc<MultiComponent<'a>>> {
        position::check(index, self.len())?;
        if let Some(cached) = self.cache.get(index) {
            return Ok(cached);
        }
        let built = self.build(&self.entries[index])?;
        Ok(self.cache.get_or_insert_with(index, || built))
    }

    /// The last multi-component, if any.
    #[must_use]
    pub fn last(&self) -> Option<Rc<MultiComponent<'a>>> {
        self.len().checked_sub(1).and_then(|i| self.get(i).ok())
    }

    /// Iterates the multi-components in order.
    pub fn iter(&self) -> impl Iterator<Item = Rc<MultiComponent<'a>>> + '_ {
        (0..self.len()).filter_map(|i| self.get(i).ok())
    }

    /// Mesh of every entry, in order.
    #[must_use]
    pub fn meshes(&self) -> Vec<MeshId> {
        self.entries.iter().map(|entry| entry.mesh).collect()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the list has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds `multi` as a new last entry, even if its mesh is already listed.
    pub fn append(&mut self, multi: MultiComponent<'a>) {
        let position = self.entries.len();
        self.entries.push(entry_of(&multi));
        self.cache.insert(position, Rc::new(multi));
    }

    /// Merges `component` into the first entry on its mesh, or appends a new
    /// entry for it.
    pub fn update(&mut self, component: &Component<'_>) {
        self.invalidate_cache();
        self.merge_raw(component.to_raw());
    }

    fn merge_raw(&mut self, raw: RawComponent) {
        match self.entries.iter_mut().find(|entry| entry.mesh == raw.mesh) {
            Some(entry) => entry.merge(raw),
            None => {
                let mut entry = MultiEntry::new(raw.mesh);
                entry.merge(raw);
                self.entries.push(entry);
            }
        }
    }

    /// Replaces the entry at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::IndexOutOfRange`](crate::error::SelectionError::IndexOutOfRange) past the end.
    pub fn replace(&mut self, index: usize, multi: MultiComponent<'a>) -> Result<()> {
        position::check(index, self.len())?;
        self.entries[index] = entry_of(&multi);
        self.cache.insert(index, Rc::new(multi));
        Ok(())
    }

    /// Removes the entry at `index`; later entries move down.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::IndexOutOfRange`](crate::error::SelectionError::IndexOutOfRange) past the end.
    pub fn remove(&mut self, index: usize) -> Result<Vec<RawComponent>> {
        position::check(index, self.len())?;
        self.cache.remove_and_shift(index);
        Ok(self.entries.remove(index).parts)
    }

    /// Removes and returns the multi-component at `index`, or the last one.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::IndexOutOfRange`](crate::error::SelectionError::IndexOutOfRange) past the end or on an
    /// empty list.
    pub fn pop(&mut self, index: Option<usize>) -> Result<Rc<MultiComponent<'a>>> {
        let index = index.unwrap_or_else(|| position::last_or_zero(self.len()));
        let multi = self.get(index)?;
        self.remove(index)?;
        Ok(multi)
    }

    /// A new list over the entries in `range`, clamped to the list.
    #[must_use]
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Self {
        let mut sliced = Self::new(self.provider).with_space(self.space);
        sliced.entries = self.entries[position::clamp(&range, self.len())].to_vec();
        sliced
    }

    /// Returns `true` if any entry has a part on the same mesh and kind that
    /// shares an index with `raw`.
    #[must_use]
    pub fn contains(&self, raw: &RawComponent) -> bool {
        self.entries.iter().any(|entry| entry.overlaps(raw))
    }

    /// Selection strings of every entry, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if a mesh handle is stale.
    pub fn selection_strings(&self) -> Result<Vec<String>> {
        let mut strings = Vec::new();
        for index in 0..self.len() {
            strings.extend(self.get(index)?.selection_strings()?);
        }
        Ok(strings)
    }
}

fn entry_of(multi: &MultiComponent<'_>) -> MultiEntry {
    MultiEntry {
        mesh: multi.mesh(),
        parts: multi.to_raw_parts(),
    }
}

impl InvalidateCache for MultiComponentList<'_> {
    fn invalidate_cache(&mut self) {
        self.cache.clear();
    }
}

impl PartialEq for MultiComponentList<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl std::fmt::Debug for MultiComponentList<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiComponentList")
            .field("entries", &self.entries)
            .field("space", &self.space)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::{PolycompError, SelectionError};
    use crate::selection::SelectionPrefs;
    use crate::test_meshes::{cube, init_tracing, plane_2x2, set};
    use crate::topology::{ElementKind, MeshStore};

    fn two_meshes() -> (MeshStore, MeshId, MeshId) {
        init_tracing();
        let mut store = MeshStore::new();
        let cube_id = store.add_mesh(cube());
        let plane_id = store.add_mesh(plane_2x2());
        (store, cube_id, plane_id)
    }

    #[test]
    fn mixed_selection_groups_by_mesh() {
        let (store, cube_id, plane_id) = two_meshes();
        let mut state = SelectionState::new(SelectionPrefs::new());
        state.select(RawComponent::new(cube_id, ElementKind::Face, [0]));
        state.select(RawComponent::new(plane_id, ElementKind::Vertex, [4]));
        state.select(RawComponent::new(cube_id, ElementKind::Vertex, [2, 3]));
        state.select(RawComponent::new(cube_id, ElementKind::Face, [5]));

        let list = MultiComponentList::from_selection(&store, &state);
        assert_eq!(list.meshes(), vec![cube_id, plane_id]);
        let first = list.get(0).unwrap();
        assert_eq!(
            first.kinds().collect::<Vec<_>>(),
            vec![ElementKind::Vertex, ElementKind::Face]
        );
        assert_eq!(first.get(ElementKind::Face).unwrap().indices(), &set(&[0, 5]));
        assert!(Rc::ptr_eq(&first, &list.get(0).unwrap()));
        assert_eq!(list.last().unwrap().mesh(), plane_id);
    }

    #[test]
    fn append_keeps_separate_entries_but_update_merges() {
        let (store, cube_id, _) = two_meshes();
        let mut list = MultiComponentList::new(&store);
        let multi = MultiComponent::from_parts(
            &store,
            cube_id,
            [Component::from_indices(&store, cube_id, ElementKind::Edge, [1])],
        )
        .unwrap();
        list.append(multi.clone());
        list.append(multi);
        assert_eq!(list.len(), 2);

        list.update(&Component::from_indices(&store, cube_id, ElementKind::Vertex, [7]));
        assert_eq!(list.len(), 2);
        assert_eq!(list.get(0).unwrap().len(), 2);
        assert_eq!(list.get(1).unwrap().len(), 1);
    }

    #[test]
    fn positions_shift_on_remove() {
        let (store, cube_id, plane_id) = two_meshes();
        let mut list = MultiComponentList::from_strings(
            &store,
            ["pCube1.f[1]", "pPlane1.e[0]", "pCube1.vtx[0]"],
        )
        .unwrap();
        assert_eq!(list.len(), 2);
        let plane = list.get(1).unwrap();
        let removed = list.remove(0).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(Rc::ptr_eq(&plane, &list.get(0).unwrap()));

        let popped = list.pop(None).unwrap();
        assert_eq!(popped.mesh(), plane_id);
        assert!(list.is_empty());
        assert!(matches!(
            list.pop(None),
            Err(PolycompError::Selection(SelectionError::IndexOutOfRange { index: 0, len: 0 }))
        ));
        assert!(!list.contains(&RawComponent::new(cube_id, ElementKind::Face, [1])));
    }

    #[test]
    fn replace_slice_and_contains() {
        let (store, cube_id, plane_id) = two_meshes();
        let mut list = MultiComponentList::from_raw(
            &store,
            [
                RawComponent::new(cube_id, ElementKind::Face, [0, 1]),
                RawComponent::new(plane_id, ElementKind::Face, [3]),
            ],
        );
        assert!(list.contains(&RawComponent::new(cube_id, ElementKind::Face, [1, 4])));
        assert!(!list.contains(&RawComponent::new(cube_id, ElementKind::Edge, [0])));

        let tail = list.slice(1..);
        assert_eq!(tail.meshes(), vec![plane_id]);
        assert!(list.slice(4..).is_empty());

        let replacement = MultiComponent::from_parts(
            &store,
            plane_id,
            [Component::from_indices(&store, plane_id, ElementKind::UvPoint, [2])],
        )
        .unwrap();
        list.replace(0, replacement).unwrap();
        assert_eq!(list.meshes(), vec![plane_id, plane_id]);
        assert_eq!(
            list.selection_strings().unwrap(),
            vec!["pPlane1.map[2]".to_owned(), "pPlane1.f[3]".to_owned()]
        );
    }

    #[test]
    fn regroups_a_component_list() {
        let (store, cube_id, _) = two_meshes();
        let flat = ComponentList::from_raw(
            &store,
            [
                RawComponent::new(cube_id, ElementKind::Face, [0]),
                RawComponent::new(cube_id, ElementKind::Edge, [3]),
            ],
            false,
        )
        .with_space(Space::Object);
        let grouped = MultiComponentList::from_list(&flat);
        assert_eq!(grouped.len(), 1);
        let multi = grouped.get(0).unwrap();
        assert_eq!(multi.len(), 2);
        assert!(multi.iter().all(|part| part.space() == Space::Object));
        assert_eq!(grouped, MultiComponentList::from_raw(&store, flat.raw_entries().to_vec()));
    }
}
