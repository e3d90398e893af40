use std::collections::BTreeSet;
use std::ops::RangeBounds;
use std::rc::Rc;

use crate::cache::{InvalidateCache, PositionCache};
use crate::component::{Component, RawComponent};
use crate::error::{ConfigurationError, Result, SelectionWarning};
use crate::math::Space;
use crate::topology::TopologyProvider;

use super::{position, ComponentPattern, LsFlags, SelectionState};

/// An ordered list of components, possibly spanning several meshes.
///
/// Entries are stored as raw `(mesh, kind, indices)` triples; the
/// [`Component`] at a position is built on first access and cached until
/// that position changes. A merged list holds at most one entry per mesh
/// and kind; an unmerged one keeps entries exactly as added.
pub struct ComponentList<'a> {
    provider: &'a dyn TopologyProvider,
    entries: Vec<RawComponent>,
    space: Space,
    angle_weighted: bool,
    cache: PositionCache<Rc<Component<'a>>>,
}

impl<'a> ComponentList<'a> {
    /// Creates an empty list.
    #[must_use]
    pub fn new(provider: &'a dyn TopologyProvider) -> Self {
        Self {
            provider,
            entries: Vec::new(),
            space: Space::default(),
            angle_weighted: false,
            cache: PositionCache::new(),
        }
    }

    /// Builds a list from raw triples. With `merge`, entries on the same
    /// mesh and kind are coalesced.
    pub fn from_raw(
        provider: &'a dyn TopologyProvider,
        raws: impl IntoIterator<Item = RawComponent>,
        merge: bool,
    ) -> Self {
        let mut list = Self::new(provider);
        for raw in raws {
            if merge {
                list.merge_raw(raw);
            } else {
                list.entries.push(raw);
            }
        }
        list
    }

    /// Builds a list from components. Unmerged lists keep the components
    /// themselves as the cached objects of their positions.
    pub fn from_components(
        provider: &'a dyn TopologyProvider,
        components: impl IntoIterator<Item = Component<'a>>,
        merge: bool,
    ) -> Self {
        let mut list = Self::new(provider);
        for component in components {
            if merge {
                list.update(&component);
            } else {
                list.append(component);
            }
        }
        list
    }

    /// The host's active selection, merged per mesh and kind.
    #[must_use]
    pub fn from_selection(provider: &'a dyn TopologyProvider, state: &SelectionState) -> Self {
        let prefs = state.prefs();
        Self::from_raw(provider, state.entries().iter().cloned(), true)
            .with_space(prefs.space)
            .with_angle_weighted_normals(prefs.angle_weighted_normals)
    }

    /// Builds a list from component strings such as `pCube1.f[0:3]`.
    ///
    /// # Errors
    ///
    /// Returns an error if a string does not parse or does not resolve.
    pub fn from_strings<S: AsRef<str>>(
        provider: &'a dyn TopologyProvider,
        strings: impl IntoIterator<Item = S>,
        merge: bool,
    ) -> Result<Self> {
        let mut raws = Vec::new();
        for string in strings {
            raws.extend(ComponentPattern::parse(string.as_ref())?.resolve(provider)?);
        }
        Ok(Self::from_raw(provider, raws, merge))
    }

    /// Queries components by pattern, optionally restricted to the active
    /// selection.
    ///
    /// Results merge unless the query is ordered or flattened; `flags.merge`
    /// overrides either way. With a selection flag and no patterns the whole
    /// selection is returned; with patterns, only selected elements that
    /// match one of them.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::OrderedSelectionNotTracked`] if an
    /// ordered or flattened query is made while selection order is not
    /// tracked, or an error if a pattern does not parse or resolve.
    pub fn from_ls(
        provider: &'a dyn TopologyProvider,
        state: &SelectionState,
        flags: LsFlags,
        patterns: &[&str],
    ) -> Result<Self> {
        let prefs = state.prefs();
        let mut merge = true;
        if flags.needs_selection_order() {
            if !prefs.track_selection_order {
                return Err(ConfigurationError::OrderedSelectionNotTracked.into());
            }
            merge = false;
        }
        if let Some(forced) = flags.merge {
            merge = forced;
        }

        let mut matched = Vec::new();
        for pattern in patterns {
            matched.extend(ComponentPattern::parse(pattern)?.resolve(provider)?);
        }

        let mut raws: Vec<RawComponent> = if flags.uses_selection() {
            if patterns.is_empty() {
                state.entries().to_vec()
            } else {
                state
                    .entries()
                    .iter()
                    .filter_map(|selected| {
                        let indices: BTreeSet<u32> = matched
                            .iter()
                            .filter(|m| m.same_binding(selected))
                            .flat_map(|m| m.indices.intersection(&selected.indices).copied())
                            .collect();
                        (!indices.is_empty()).then(|| RawComponent {
                            indices,
                            ..selected.clone()
                        })
                    })
                    .collect()
            }
        } else {
            matched
        };

        if flags.flatten {
            raws = raws
                .into_iter()
                .flat_map(|raw| {
                    raw.indices
                        .iter()
                        .map(|&index| RawComponent::new(raw.mesh, raw.kind, [index]))
                        .collect::<Vec<_>>()
                })
                .collect();
        }
        if raws.is_empty() {
            tracing::warn!(warning = %SelectionWarning::EmptySelection, ?patterns, "ls matched nothing");
        }

        Ok(Self::from_raw(provider, raws, merge)
            .with_space(prefs.space)
            .with_angle_weighted_normals(prefs.angle_weighted_normals))
    }

    /// Sets the coordinate space of components built from this list.
    #[must_use]
    pub fn with_space(mut self, space: Space) -> Self {
        self.space = space;
        self.invalidate_cache();
        self
    }

    /// Sets angle-weighted normals on components built from this list.
    #[must_use]
    pub fn with_angle_weighted_normals(mut self, weighted: bool) -> Self {
        self.angle_weighted = weighted;
        self.invalidate_cache();
        self
    }

    /// The provider every entry resolves against.
    #[must_use]
    pub fn provider(&self) -> &'a dyn TopologyProvider {
        self.provider
    }

    /// Coordinate space of components built from this list.
    #[must_use]
    pub fn space(&self) -> Space {
        self.space
    }

    fn build(&self, raw: &RawComponent) -> Rc<Component<'a>> {
        Rc::new(
            Component::from_raw(self.provider, raw.clone())
                .with_space(self.space)
                .with_angle_weighted_normals(self.angle_weighted),
        )
    }

    /// The component at `index`, built on first access.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::IndexOutOfRange`](crate::error::SelectionError::IndexOutOfRange) past the end.
    pub fn get(&self, index: usize) -> Result<Rc<Component<'a>>> {
        position::check(index, self.len())?;
        Ok(self
            .cache
            .get_or_insert_with(index, || self.build(&self.entries[index])))
    }

    /// The last component, if any.
    #[must_use]
    pub fn last(&self) -> Option<Rc<Component<'a>>> {
        self.len().checked_sub(1).and_then(|i| self.get(i).ok())
    }

    /// Iterates the components in order.
    pub fn iter(&self) -> impl Iterator<Item = Rc<Component<'a>>> + '_ {
        (0..self.len()).filter_map(|i| self.get(i).ok())
    }

    /// The raw entries in order.
    #[must_use]
    pub fn raw_entries(&self) -> &[RawComponent] {
        &self.entries
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

    /// Adds `component` as a new last entry without merging.
    pub fn append(&mut self, component: Component<'a>) {
        let position = self.entries.len();
        self.entries.push(component.to_raw());
        self.cache.insert(position, Rc::new(component));
    }

    /// Merges `component` into the entry on the same mesh and kind, or
    /// appends it if there is none.
    pub fn update(&mut self, component: &Component<'_>) {
        self.invalidate_cache();
        self.merge_raw(component.to_raw());
    }

    /// Merges every component, as [`ComponentList::update`] does.
    pub fn extend<'c>(&mut self, components: impl IntoIterator<Item = &'c Component<'c>>) {
        self.invalidate_cache();
        for component in components {
            self.merge_raw(component.to_raw());
        }
    }

    fn merge_raw(&mut self, raw: RawComponent) {
        match self.entries.iter_mut().find(|entry| entry.same_binding(&raw)) {
            Some(entry) => entry.indices.extend(raw.indices),
            None => self.entries.push(raw),
        }
    }

    /// Replaces the entry at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::IndexOutOfRange`](crate::error::SelectionError::IndexOutOfRange) past the end.
    pub fn replace(&mut self, index: usize, component: Component<'a>) -> Result<()> {
        position::check(index, self.len())?;
        self.cache.pop(index);
        self.entries[index] = component.to_raw();
        self.cache.insert(index, Rc::new(component));
        Ok(())
    }

    /// Removes the entry at `index`; later entries move down.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::IndexOutOfRange`](crate::error::SelectionError::IndexOutOfRange) past the end.
    pub fn remove(&mut self, index: usize) -> Result<RawComponent> {
        position::check(index, self.len())?;
        self.cache.remove_and_shift(index);
        Ok(self.entries.remove(index))
    }

    /// Removes and returns the component at `index`, or the last one.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::IndexOutOfRange`](crate::error::SelectionError::IndexOutOfRange) past the end or on an
    /// empty list.
    pub fn pop(&mut self, index: Option<usize>) -> Result<Rc<Component<'a>>> {
        let index = index.unwrap_or_else(|| position::last_or_zero(self.len()));
        let component = self.get(index)?;
        self.remove(index)?;
        Ok(component)
    }

    /// A new list over the entries in `range`, clamped to the list.
    #[must_use]
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Self {
        let entries = &self.entries[position::clamp(&range, self.len())];
        Self::from_raw(self.provider, entries.iter().cloned(), false)
            .with_space(self.space)
            .with_angle_weighted_normals(self.angle_weighted)
    }

    /// Returns `true` if any entry on the same mesh and kind shares an index
    /// with `other`.
    #[must_use]
    pub fn contains(&self, other: &RawComponent) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.same_binding(other) && !entry.indices.is_disjoint(&other.indices))
    }

    /// [`ComponentList::contains`] for a bound component.
    #[must_use]
    pub fn contains_component(&self, component: &Component<'_>) -> bool {
        self.contains(&component.to_raw())
    }

    /// Toggles `component`'s indices in the first entry on the same mesh and
    /// kind. Entries left empty are removed; without a matching entry the
    /// component is appended.
    pub fn toggle(&mut self, component: Component<'a>) {
        let raw = component.to_raw();
        let Some(position) = self.entries.iter().position(|e| e.same_binding(&raw)) else {
            self.append(component);
            return;
        };
        self.cache.pop(position);
        let entry = &mut self.entries[position];
        entry.indices = entry
            .indices
            .symmetric_difference(&raw.indices)
            .copied()
            .collect();
        if entry.indices.is_empty() {
            self.entries.remove(position);
            self.cache.remove_and_shift(position);
        }
    }

    /// Selection strings of every entry, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if a mesh handle is stale.
    pub fn selection_strings(&self) -> Result<Vec<String>> {
        let mut strings = Vec::new();
        for component in self.iter() {
            strings.extend(component.selection_strings()?);
        }
        Ok(strings)
    }

    /// A new list with, per entry, only the indices on the mesh boundary.
    /// Entries with no boundary indices are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if a mesh handle is stale.
    pub fn border_components(&self) -> Result<Self> {
        let mut borders = Self::new(self.provider)
            .with_space(self.space)
            .with_angle_weighted_normals(self.angle_weighted);
        for component in self.iter() {
            let border = component.border_indices()?;
            if !border.is_empty() {
                borders.append(border);
            }
        }
        Ok(borders)
    }
}

impl InvalidateCache for ComponentList<'_> {
    fn invalidate_cache(&mut self) {
        self.cache.clear();
    }
}

impl PartialEq for ComponentList<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && other.entries.iter().all(|entry| self.contains(entry))
    }
}

impl std::fmt::Debug for ComponentList<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentList")
            .field("entries", &self.entries)
            .field("space", &self.space)
            .finish_non_exhaustive()
    }
}
