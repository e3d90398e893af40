use std::collections::{BTreeMap, BTreeSet};

use crate::error::Result;
use crate::operations::group_overlapping;
use crate::topology::{ConvertOptions, ElementKind};

use super::Component;

impl<'a> Component<'a> {
    /// Splits the component into groups of elements connected through
    /// shared vertices.
    ///
    /// Adjacency is tested on edges: vertices and UVs convert to the edges
    /// they fully span, faces to all their edges. Each vertex group is
    /// converted back to this component's kind unless `convert_back` is
    /// `false`, in which case the groups are vertex components.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh handle is stale or an index is out of range.
    pub fn connected(&self, convert_back: bool) -> Result<Vec<Self>> {
        let edges = match self.kind {
            ElementKind::Edge => self.clone(),
            ElementKind::Vertex | ElementKind::UvPoint => self.to_edge(ConvertOptions::internal())?,
            ElementKind::Face => self.to_edge(ConvertOptions::new())?,
        };

        // Edges sharing a first endpoint always end up in the same group, so
        // bucket them before the quadratic grow.
        let mut buckets: BTreeMap<u32, BTreeSet<u32>> = BTreeMap::new();
        for edge in edges.iter() {
            let [a, b] = self.provider.edge_endpoints(self.mesh, edge)?;
            buckets.entry(a).or_default().extend([a, b]);
        }
        let seeds: Vec<BTreeSet<u32>> = buckets.into_values().collect();
        let groups = group_overlapping(&seeds);
        tracing::debug!(edges = edges.len(), groups = groups.len(), "grouped connected elements");

        let back = match self.kind {
            ElementKind::Edge | ElementKind::Face => ConvertOptions::internal(),
            ElementKind::Vertex | ElementKind::UvPoint => ConvertOptions::new(),
        };
        groups
            .into_iter()
            .map(|vertices| {
                let group = self.rebind(ElementKind::Vertex, vertices);
                if convert_back {
                    group.convert_to(self.kind, back)
                } else {
                    Ok(group)
                }
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_meshes::{cube, diagonal_quads, plane_2x2, set, store_with};

    fn sorted_groups(groups: &[Component<'_>]) -> Vec<BTreeSet<u32>> {
        let mut sets: Vec<BTreeSet<u32>> = groups.iter().map(|g| g.indices().clone()).collect();
        sets.sort();
        sets
    }

    #[test]
    fn whole_plane_is_one_group() {
        let (store, mesh) = store_with(plane_2x2());
        let all = Component::create(&store, mesh, ElementKind::Face)
            .get_complete()
            .unwrap();
        let groups = all.connected(true).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0], all);
    }

    #[test]
    fn separate_vertex_runs_split() {
        let (store, mesh) = store_with(plane_2x2());
        let verts = Component::from_indices(&store, mesh, ElementKind::Vertex, [0, 1, 7, 8]);
        let groups = verts.connected(true).unwrap();
        assert_eq!(sorted_groups(&groups), vec![set(&[0, 1]), set(&[7, 8])]);
        assert!(groups.iter().all(|g| g.kind() == ElementKind::Vertex));
    }

    #[test]
    fn groups_partition_the_edge_image() {
        let (store, mesh) = store_with(cube());
        let edges = Component::from_indices(&store, mesh, ElementKind::Edge, [0, 1, 4, 9]);
        let groups = edges.connected(true).unwrap();

        let mut union = BTreeSet::new();
        let mut total = 0;
        for group in &groups {
            total += group.len();
            union.extend(group.iter());
        }
        assert_eq!(total, union.len());

        let image = edges
            .to_vertex(ConvertOptions::new())
            .unwrap()
            .to_edge(ConvertOptions::internal())
            .unwrap();
        assert_eq!(&union, image.indices());
    }

    #[test]
    fn faces_touching_at_a_vertex_are_connected() {
        let (store, mesh) = store_with(diagonal_quads());
        let all = Component::create(&store, mesh, ElementKind::Face)
            .get_complete()
            .unwrap();
        assert_eq!(all.connected(true).unwrap().len(), 1);

        let vertices = all.connected(false).unwrap();
        assert_eq!(vertices[0].kind(), ElementKind::Vertex);
        assert_eq!(vertices[0].len(), 7);
    }

    #[test]
    fn empty_component_has_no_groups() {
        let (store, mesh) = store_with(cube());
        let empty = Component::create(&store, mesh, ElementKind::Edge);
        assert!(empty.connected(true).unwrap().is_empty());
    }
}
