use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::error::{Result, TopologyError};
use crate::topology::{ConvertOptions, ElementKind};

use super::Component;

impl<'a> Component<'a> {
    /// Face-connected shells of the component, numbered by discovery order.
    ///
    /// The flood fill only crosses edges between faces of the component's
    /// own face set. Shells come back in this component's kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh handle is stale or an index is out of range.
    pub fn mesh_shells(&self) -> Result<Rc<BTreeMap<usize, Component<'a>>>> {
        self.cache.mesh_shells.get_or_try_init(|| -> Result<_> {
            let faces = match self.kind {
                ElementKind::Face => self.indices.clone(),
                _ => self.to_face(ConvertOptions::new())?.indices,
            };

            let mut unvisited = faces;
            let mut shells = BTreeMap::new();
            while let Some(seed) = unvisited.pop_first() {
                let mut shell = BTreeSet::new();
                let mut stack = vec![seed];
                while let Some(face) = stack.pop() {
                    shell.insert(face);
                    for next in self
                        .provider
                        .faces_adjacent_across_shared_edge(self.mesh, face)?
                    {
                        if unvisited.remove(&next) {
                            stack.push(next);
                        }
                    }
                }

                let shell = self.rebind(ElementKind::Face, shell);
                let shell = match self.kind {
                    ElementKind::Face => shell,
                    kind => shell.convert_to(kind, ConvertOptions::new())?,
                };
                shells.insert(shells.len(), shell);
            }
            tracing::debug!(shells = shells.len(), "computed mesh shells");
            Ok(Rc::new(shells))
        })
    }

    /// UV shells touched by the component, keyed by shell id.
    ///
    /// Each shell holds every UV of that shell on the mesh, so touching one
    /// UV selects its whole shell. Non-UV components are converted first.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh handle is stale or an index is out of range.
    pub fn uv_shells(&self) -> Result<Rc<BTreeMap<u32, Component<'a>>>> {
        self.cache.uv_shells.get_or_try_init(|| -> Result<_> {
            let uvs = match self.kind {
                ElementKind::UvPoint => self.clone(),
                _ => self.to_uv(ConvertOptions::new())?,
            };
            let shell_ids = self.provider.uv_shell_ids(self.mesh)?;

            let wanted: BTreeSet<u32> = if uvs.is_complete()? {
                let count = self.provider.uv_shell_count(self.mesh)?;
                (0..u32::try_from(count).unwrap_or(u32::MAX)).collect()
            } else {
                uvs.iter()
                    .map(|uv| {
                        shell_ids.get(uv as usize).copied().ok_or(
                            TopologyError::ElementOutOfRange {
                                kind: ElementKind::UvPoint,
                                index: uv,
                                count: shell_ids.len(),
                            },
                        )
                    })
                    .collect::<std::result::Result<_, _>>()?
            };

            let mut members: BTreeMap<u32, BTreeSet<u32>> =
                wanted.iter().map(|&id| (id, BTreeSet::new())).collect();
            for (uv, id) in (0u32..).zip(&shell_ids) {
                if let Some(shell) = members.get_mut(id) {
                    shell.insert(uv);
                }
            }

            let shells = members
                .into_iter()
                .map(|(id, indices)| (id, self.rebind(ElementKind::UvPoint, indices)))
                .collect();
            Ok(Rc::new(shells))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_meshes::{cube, diagonal_quads, plane_2x2, set, store_with};
    use crate::topology::TopologyProvider;

    #[test]
    fn plane_is_a_single_shell() {
        let (store, mesh) = store_with(plane_2x2());
        let all = Component::create(&store, mesh, ElementKind::Face)
            .get_complete()
            .unwrap();
        let shells = all.mesh_shells().unwrap();
        assert_eq!(shells.len(), 1);
        assert_eq!(shells[&0].len(), 4);
    }

    #[test]
    fn diagonal_quads_are_two_shells() {
        let (store, mesh) = store_with(diagonal_quads());
        let all = Component::create(&store, mesh, ElementKind::Face)
            .get_complete()
            .unwrap();
        let shells = all.mesh_shells().unwrap();
        assert_eq!(shells.len(), 2);

        let total: usize = shells.values().map(Component::len).sum();
        assert_eq!(total, all.element_count().unwrap());
        for shell in shells.values() {
            assert_eq!(shell.connected(true).unwrap().len(), 1);
        }
    }

    #[test]
    fn fill_stays_inside_the_selection() {
        let (store, mesh) = store_with(plane_2x2());
        let faces = Component::from_indices(&store, mesh, ElementKind::Face, [0, 3]);
        let shells = faces.mesh_shells().unwrap();
        assert_eq!(shells.len(), 2);
        assert_eq!(shells[&0].indices(), &set(&[0]));
        assert_eq!(shells[&1].indices(), &set(&[3]));
    }

    #[test]
    fn shells_come_back_in_original_kind() {
        let (store, mesh) = store_with(plane_2x2());
        let vertex = Component::from_indices(&store, mesh, ElementKind::Vertex, [0]);
        let shells = vertex.mesh_shells().unwrap();
        assert_eq!(shells[&0].kind(), ElementKind::Vertex);
        assert_eq!(shells[&0].indices(), &set(&[0, 1, 3, 4]));
    }

    #[test]
    fn touching_one_uv_selects_its_shell() {
        let (store, mesh) = store_with(cube());
        let uv = Component::from_indices(&store, mesh, ElementKind::UvPoint, [5]);
        let shells = uv.uv_shells().unwrap();
        assert_eq!(shells.len(), 1);
        assert_eq!(shells[&1].indices(), &set(&[4, 5, 6, 7]));

        let (store, mesh) = store_with(plane_2x2());
        let uv = Component::from_indices(&store, mesh, ElementKind::UvPoint, [0]);
        assert_eq!(uv.uv_shells().unwrap()[&0].len(), 9);
    }

    #[test]
    fn complete_uvs_cover_every_shell() {
        let (store, mesh) = store_with(cube());
        let all = Component::create(&store, mesh, ElementKind::UvPoint)
            .get_complete()
            .unwrap();
        let shells = all.uv_shells().unwrap();
        assert_eq!(shells.len(), store.uv_shell_count(mesh).unwrap());
        assert_eq!(shells.keys().copied().collect::<Vec<_>>(), (0..6).collect::<Vec<u32>>());
        assert!(shells.values().all(|s| s.len() == 4));
    }

    #[test]
    fn face_component_uv_shells() {
        let (store, mesh) = store_with(cube());
        let face = Component::from_indices(&store, mesh, ElementKind::Face, [2]);
        let shells = face.uv_shells().unwrap();
        assert_eq!(shells.keys().copied().collect::<Vec<_>>(), vec![2]);
        assert_eq!(shells[&2].kind(), ElementKind::UvPoint);
    }

    #[test]
    fn shells_are_cached_until_mutation() {
        let (store, mesh) = store_with(plane_2x2());
        let mut faces = Component::from_indices(&store, mesh, ElementKind::Face, [0]);
        let first = faces.mesh_shells().unwrap();
        assert!(Rc::ptr_eq(&first, &faces.mesh_shells().unwrap()));

        faces.add([]);
        assert!(Rc::ptr_eq(&first, &faces.mesh_shells().unwrap()));

        faces.add([3]);
        let after = faces.mesh_shells().unwrap();
        assert!(!Rc::ptr_eq(&first, &after));
        assert_eq!(after.len(), 2);
    }
}
