use crate::component::{Component, RawComponent};
use crate::math::Space;

/// Host preferences that selection queries depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionPrefs {
    /// Whether the host records the order elements were selected in.
    /// Ordered and flattened queries need it.
    pub track_selection_order: bool,
    /// Coordinate space given to components built from the selection.
    pub space: Space,
    /// Whether vertex normals are weighted by corner angle.
    pub angle_weighted_normals: bool,
}

impl SelectionPrefs {
    /// Creates preferences with defaults: order not tracked, world space,
    /// evenly averaged normals.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether selection order is tracked.
    #[must_use]
    pub fn with_track_selection_order(mut self, track: bool) -> Self {
        self.track_selection_order = track;
        self
    }

    /// Sets the coordinate space.
    #[must_use]
    pub fn with_space(mut self, space: Space) -> Self {
        self.space = space;
        self
    }

    /// Sets angle-weighted vertex normals.
    #[must_use]
    pub fn with_angle_weighted_normals(mut self, weighted: bool) -> Self {
        self.angle_weighted_normals = weighted;
        self
    }
}

/// Flags for [`ComponentList::from_ls`](super::ComponentList::from_ls).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LsFlags {
    /// Restrict the result to the active selection.
    pub selection: bool,
    /// Active selection in click order, duplicates kept.
    pub ordered_selection: bool,
    /// One entry per element.
    pub flatten: bool,
    /// Overrides whether same-mesh entries are merged.
    pub merge: Option<bool>,
}

impl LsFlags {
    /// No flags: patterns resolve against every mesh, results merge.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the selection flag.
    #[must_use]
    pub fn with_selection(mut self, selection: bool) -> Self {
        self.selection = selection;
        self
    }

    /// Sets the ordered selection flag.
    #[must_use]
    pub fn with_ordered_selection(mut self, ordered: bool) -> Self {
        self.ordered_selection = ordered;
        self
    }

    /// Sets the flatten flag.
    #[must_use]
    pub fn with_flatten(mut self, flatten: bool) -> Self {
        self.flatten = flatten;
        self
    }

    /// Forces merging on or off.
    #[must_use]
    pub fn with_merge(mut self, merge: bool) -> Self {
        self.merge = Some(merge);
        self
    }

    /// Returns `true` if the query only makes sense with tracked selection
    /// order.
    #[must_use]
    pub fn needs_selection_order(&self) -> bool {
        self.ordered_selection || self.flatten
    }

    pub(crate) fn uses_selection(&self) -> bool {
        self.selection || self.ordered_selection
    }
}

/// The host's active selection, in the order it was made.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    entries: Vec<RawComponent>,
    prefs: SelectionPrefs,
}

impl SelectionState {
    /// Creates an empty selection.
    #[must_use]
    pub fn new(prefs: SelectionPrefs) -> Self {
        Self {
            entries: Vec::new(),
            prefs,
        }
    }

    /// Records a selection click.
    pub fn select(&mut self, raw: RawComponent) {
        tracing::trace!(kind = %raw.kind, count = raw.indices.len(), "selected");
        self.entries.push(raw);
    }

    /// Records a component as a selection click.
    pub fn select_component(&mut self, component: &Component<'_>) {
        self.select(component.to_raw());
    }

    /// Drops the whole selection.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Selection clicks in order.
    #[must_use]
    pub fn entries(&self) -> &[RawComponent] {
        &self.entries
    }

    /// Returns `true` if nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current preferences.
    #[must_use]
    pub fn prefs(&self) -> SelectionPrefs {
        self.prefs
    }

    /// Replaces the preferences.
    pub fn set_prefs(&mut self, prefs: SelectionPrefs) {
        self.prefs = prefs;
    }
}
