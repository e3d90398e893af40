use std::collections::BTreeMap;
use std::fmt;

use crate::error::{ComponentError, Result};
use crate::math::Space;
use crate::topology::{ElementKind, MeshId, TopologyProvider};

use super::{Component, RawComponent};

/// Components of several kinds on one mesh, at most one per kind.
#[derive(Clone)]
pub struct MultiComponent<'a> {
    provider: &'a dyn TopologyProvider,
    mesh: MeshId,
    parts: BTreeMap<ElementKind, Component<'a>>,
}

impl<'a> MultiComponent<'a> {
    /// Creates a multi-component with no parts.
    #[must_use]
    pub fn new(provider: &'a dyn TopologyProvider, mesh: MeshId) -> Self {
        Self {
            provider,
            mesh,
            parts: BTreeMap::new(),
        }
    }

    /// Builds a multi-component from parts on `mesh`.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::MeshMismatch`] if a part is bound to
    /// another mesh.
    pub fn from_parts(
        provider: &'a dyn TopologyProvider,
        mesh: MeshId,
        parts: impl IntoIterator<Item = Component<'a>>,
    ) -> Result<Self> {
        let mut multi = Self::new(provider, mesh);
        for part in parts {
            multi.add(part)?;
        }
        Ok(multi)
    }

    /// Adds a part, merging it into the part of the same kind. Empty
    /// components add nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::MeshMismatch`] if `component` is bound to
    /// another mesh.
    pub fn add(&mut self, component: Component<'a>) -> Result<()> {
        if component.mesh() != self.mesh {
            return Err(ComponentError::MeshMismatch.into());
        }
        if component.is_empty() {
            return Ok(());
        }
        match self.parts.get_mut(&component.kind()) {
            Some(part) => part.merge(&component)?,
            None => {
                self.parts.insert(component.kind(), component);
            }
        }
        Ok(())
    }

    /// Sets the coordinate space of every part.
    #[must_use]
    pub fn with_space(self, space: Space) -> Self {
        Self {
            parts: self
                .parts
                .into_iter()
                .map(|(kind, part)| (kind, part.with_space(space)))
                .collect(),
            ..self
        }
    }

    /// Handle of the mesh every part is bound to.
    #[must_use]
    pub fn mesh(&self) -> MeshId {
        self.mesh
    }

    /// The part of `kind`, if present.
    #[must_use]
    pub fn get(&self, kind: ElementKind) -> Option<&Component<'a>> {
        self.parts.get(&kind)
    }

    /// Kinds present, in [`ElementKind`] order.
    pub fn kinds(&self) -> impl Iterator<Item = ElementKind> + '_ + use<'_, 'a> {
        self.parts.keys().copied()
    }

    /// Parts in [`ElementKind`] order.
    pub fn iter(&self) -> impl Iterator<Item = &Component<'a>> {
        self.parts.values()
    }

    /// Number of kinds present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Returns `true` if there are no parts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Returns `true` if the part of `raw`'s kind shares an index with it.
    #[must_use]
    pub fn contains(&self, raw: &RawComponent) -> bool {
        raw.mesh == self.mesh
            && self
                .parts
                .get(&raw.kind)
                .is_some_and(|part| !part.indices().is_disjoint(&raw.indices))
    }

    /// Unbinds every part.
    #[must_use]
    pub fn to_raw_parts(&self) -> Vec<RawComponent> {
        self.parts.values().map(Component::to_raw).collect()
    }

    /// Returns `true` if the mesh is live and every part is valid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.provider.mesh_name(self.mesh).is_ok() && self.parts.values().all(Component::is_valid)
    }

    /// Selection strings of every part, in kind order.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh handle is stale.
    pub fn selection_strings(&self) -> Result<Vec<String>> {
        let mut strings = Vec::new();
        for part in self.parts.values() {
            strings.extend(part.selection_strings()?);
        }
        Ok(strings)
    }
}

impl PartialEq for MultiComponent<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.mesh == other.mesh && self.parts == other.parts
    }
}

impl fmt::Debug for MultiComponent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiComponent")
            .field("mesh", &self.mesh)
            .field("parts", &self.parts)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::PolycompError;
    use crate::test_meshes::{cube, plane_2x2, set, store_with};
    use crate::topology::MeshStore;

    #[test]
    fn parts_merge_per_kind() {
        let (store, mesh) = store_with(cube());
        let multi = MultiComponent::from_parts(
            &store,
            mesh,
            [
                Component::from_indices(&store, mesh, ElementKind::Face, [0]),
                Component::from_indices(&store, mesh, ElementKind::Vertex, [3]),
                Component::from_indices(&store, mesh, ElementKind::Face, [2]),
                Component::create(&store, mesh, ElementKind::Edge),
            ],
        )
        .unwrap();
        assert_eq!(multi.len(), 2);
        assert_eq!(
            multi.kinds().collect::<Vec<_>>(),
            vec![ElementKind::Vertex, ElementKind::Face]
        );
        assert_eq!(multi.get(ElementKind::Face).unwrap().indices(), &set(&[0, 2]));
        assert!(multi.get(ElementKind::Edge).is_none());
        assert_eq!(
            multi.selection_strings().unwrap(),
            vec!["pCube1.vtx[3]".to_owned(), "pCube1.f[0]".to_owned(), "pCube1.f[2]".to_owned()]
        );
    }

    #[test]
    fn parts_must_share_the_mesh() {
        let mut store = MeshStore::new();
        let a = store.add_mesh(cube());
        let b = store.add_mesh(plane_2x2());
        let mut multi = MultiComponent::new(&store, a);
        assert!(matches!(
            multi.add(Component::from_indices(&store, b, ElementKind::Face, [0])),
            Err(PolycompError::Component(ComponentError::MeshMismatch))
        ));
        assert!(multi.is_empty());
    }

    #[test]
    fn contains_checks_the_matching_part() {
        let (store, mesh) = store_with(cube());
        let mut multi = MultiComponent::new(&store, mesh);
        multi
            .add(Component::from_indices(&store, mesh, ElementKind::Edge, [1, 2]))
            .unwrap();
        assert!(multi.contains(&RawComponent::new(mesh, ElementKind::Edge, [2, 9])));
        assert!(!multi.contains(&RawComponent::new(mesh, ElementKind::Vertex, [1])));
        assert_eq!(multi.to_raw_parts().len(), 1);
        assert!(multi.is_valid());
    }

    #[test]
    fn space_reaches_every_part() {
        let (store, mesh) = store_with(cube());
        let multi = MultiComponent::from_parts(
            &store,
            mesh,
            [
                Component::from_indices(&store, mesh, ElementKind::Face, [0]),
                Component::from_indices(&store, mesh, ElementKind::Edge, [0]),
            ],
        )
        .unwrap()
        .with_space(Space::Object);
        assert!(multi.iter().all(|part| part.space() == Space::Object));
    }
}
