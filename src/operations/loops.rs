use std::collections::{BTreeSet, HashMap};

use crate::component::Component;
use crate::error::{ComponentError, Result, TopologyError};
use crate::topology::{ElementKind, MeshId, TopologyProvider};

/// Every edge of the mesh-boundary loop through `edge`, or an empty set if
/// `edge` is not a boundary edge.
///
/// # Errors
///
/// Returns an error if the mesh handle is stale or the edge does not exist.
pub fn border_loop_from_edge_index(
    provider: &dyn TopologyProvider,
    mesh: MeshId,
    edge: u32,
) -> Result<BTreeSet<u32>> {
    Ok(provider.boundary_loop_through_edge(mesh, edge)?)
}

/// The distinct boundary loops touched by an edge component, ordered by
/// their lowest edge. Edges off the boundary touch no loop.
///
/// # Errors
///
/// Returns [`ComponentError::KindMismatch`] for non-edge components, or an
/// error if the mesh handle is stale.
pub fn border_loops_from_edges<'a>(edges: &Component<'a>) -> Result<Vec<Component<'a>>> {
    expect_edges(edges)?;
    let mut seen: BTreeSet<u32> = BTreeSet::new();
    let mut loops = Vec::new();
    for edge in edges.iter() {
        if seen.contains(&edge) {
            continue;
        }
        let border = border_loop_from_edge_index(edges.provider(), edges.mesh(), edge)?;
        if border.is_empty() {
            continue;
        }
        seen.extend(&border);
        let mut component = edges.new_empty();
        component.add(border);
        loops.push(component);
    }
    loops.sort_by_key(|c| c.indices().first().copied());
    Ok(loops)
}

/// Splits an edge component into one component per boundary loop, each
/// holding only the component's own edges on that loop.
///
/// # Errors
///
/// Returns [`ComponentError::KindMismatch`] for non-edge components, or an
/// error if the mesh handle is stale.
pub fn indices_sharing_border_loop<'a>(edges: &Component<'a>) -> Result<Vec<Component<'a>>> {
    Ok(border_loops_from_edges(edges)?
        .into_iter()
        .map(|border| {
            let mut shared = edges.new_empty();
            shared.add(edges.iter().filter(|&e| border.contains(e)));
            shared
        })
        .collect())
}

/// The two ends of an edge row and its interior.
#[derive(Debug, Clone)]
pub struct EdgeRowSplit<'a> {
    /// One vertex component per end: the end vertex and its neighbour on
    /// the row.
    pub outer: Vec<Component<'a>>,
    /// Every other vertex of the row.
    pub inner: Component<'a>,
}

/// Finds the ends of a connected row of edges.
///
/// The two vertices used by the fewest edges are the ends; ties go to the
/// vertex met first walking edges in index order. Each end yields the
/// vertices of the first edge using it, so the pair points into the row.
///
/// # Errors
///
/// Returns [`ComponentError::KindMismatch`] for non-edge components,
/// [`ComponentError::Empty`] for an empty one, or an error if the mesh
/// handle is stale.
pub fn outer_and_inner_edges<'a>(edges: &Component<'a>) -> Result<EdgeRowSplit<'a>> {
    expect_edges(edges)?;
    if edges.is_empty() {
        return Err(ComponentError::Empty.into());
    }
    let pairs = edges.vertex_pairs()?;

    let mut counts: Vec<(u32, usize)> = Vec::new();
    for &vertex in pairs.values().flatten() {
        match counts.iter_mut().find(|(v, _)| *v == vertex) {
            Some((_, count)) => *count += 1,
            None => counts.push((vertex, 1)),
        }
    }
    // Stable sort keeps first-seen order among equal counts.
    counts.sort_by_key(|&(_, count)| count);

    let vertices = Component::create(edges.provider(), edges.mesh(), ElementKind::Vertex)
        .with_space(edges.space());
    let mut inner: BTreeSet<u32> = counts.iter().map(|&(v, _)| v).collect();
    let mut outer = Vec::new();
    for &(end, _) in counts.iter().take(2) {
        inner.remove(&end);
        if let Some(pair) = pairs.values().find(|pair| pair.contains(&end)) {
            let mut component = vertices.new_empty();
            component.add(*pair);
            outer.push(component);
        }
    }

    let mut interior = vertices;
    interior.add(inner);
    Ok(EdgeRowSplit {
        outer,
        inner: interior,
    })
}

/// Orders the vertices of a chain of edges from one end to the other.
///
/// An open chain starts at the end vertex met first in `pairs`. A closed
/// loop starts at `pairs[0][0]`, heads towards `pairs[0][1]` and does not
/// repeat its first vertex.
///
/// # Errors
///
/// Returns [`TopologyError::NotAChain`] if a vertex is shared by more than
/// two edges or the edges are not all connected.
pub fn vert_order_on_edge_row(pairs: &[[u32; 2]]) -> Result<Vec<u32>> {
    let Some(first) = pairs.first() else {
        return Ok(Vec::new());
    };

    let mut incident: HashMap<u32, Vec<usize>> = HashMap::new();
    let mut seen_order: Vec<u32> = Vec::new();
    for (i, pair) in pairs.iter().enumerate() {
        for &vertex in pair {
            let edges = incident.entry(vertex).or_default();
            if edges.is_empty() {
                seen_order.push(vertex);
            }
            edges.push(i);
            if edges.len() > 2 {
                return Err(TopologyError::NotAChain(format!(
                    "vertex {vertex} is shared by more than two edges"
                ))
                .into());
            }
        }
    }

    let ends: Vec<u32> = seen_order
        .iter()
        .copied()
        .filter(|v| incident.get(v).is_some_and(|edges| edges.len() == 1))
        .collect();
    let (start, closed) = match ends.as_slice() {
        [] => (first[0], true),
        [start, _] => (*start, false),
        _ => {
            return Err(TopologyError::NotAChain(format!(
                "{} open ends found, expected two",
                ends.len()
            ))
            .into())
        }
    };

    let mut used = vec![false; pairs.len()];
    let mut order = vec![start];
    let mut current = start;
    let mut next_edge = if closed { Some(0) } else { None };
    loop {
        let edge = match next_edge.take() {
            Some(edge) => edge,
            None => match incident
                .get(&current)
                .and_then(|edges| edges.iter().copied().find(|&e| !used[e]))
            {
                Some(edge) => edge,
                None => break,
            },
        };
        used[edge] = true;
        let [a, b] = pairs[edge];
        current = if a == current { b } else { a };
        if closed && current == start {
            break;
        }
        order.push(current);
    }

    if used.iter().any(|&u| !u) {
        return Err(TopologyError::NotAChain("edges are not all connected".into()).into());
    }
    Ok(order)
}

fn expect_edges(component: &Component<'_>) -> Result<()> {
    if component.kind() == ElementKind::Edge {
        Ok(())
    } else {
        Err(ComponentError::KindMismatch {
            expected: ElementKind::Edge,
            found: component.kind(),
        }
        .into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::PolycompError;
    use crate::test_meshes::{cube, plane_2x2, set, split_strip, store_with};

    #[test]
    fn plane_border_loop() {
        let (store, mesh) = store_with(plane_2x2());
        assert_eq!(
            border_loop_from_edge_index(&store, mesh, 3).unwrap(),
            set(&[0, 3, 4, 5, 8, 9, 10, 11])
        );
        assert!(border_loop_from_edge_index(&store, mesh, 1).unwrap().is_empty());
    }

    #[test]
    fn separate_loops_are_found_once() {
        let (store, mesh) = store_with(split_strip());
        let edges = Component::from_indices(&store, mesh, ElementKind::Edge, [0, 2, 5]);
        let loops = border_loops_from_edges(&edges).unwrap();
        assert_eq!(loops.len(), 2);
        assert_eq!(loops[0].indices(), &set(&[0, 1, 2, 3]));
        assert_eq!(loops[1].indices(), &set(&[4, 5, 6, 7]));

        let shared = indices_sharing_border_loop(&edges).unwrap();
        assert_eq!(shared[0].indices(), &set(&[0, 2]));
        assert_eq!(shared[1].indices(), &set(&[5]));
    }

    #[test]
    fn interior_edges_touch_no_loop() {
        let (store, mesh) = store_with(cube());
        let edges = Component::from_indices(&store, mesh, ElementKind::Edge, [0, 1]);
        assert!(border_loops_from_edges(&edges).unwrap().is_empty());

        let faces = Component::from_indices(&store, mesh, ElementKind::Face, [0]);
        assert!(matches!(
            border_loops_from_edges(&faces),
            Err(PolycompError::Component(ComponentError::KindMismatch { .. }))
        ));
    }

    #[test]
    fn row_ends_and_interior() {
        let (store, mesh) = store_with(plane_2x2());
        // Bottom row: 0-1 (edge 0) and 1-2 (edge 4).
        let row = Component::from_indices(&store, mesh, ElementKind::Edge, [0, 4]);
        let split = outer_and_inner_edges(&row).unwrap();
        assert_eq!(split.outer.len(), 2);
        assert_eq!(split.outer[0].indices(), &set(&[0, 1]));
        assert_eq!(split.outer[1].indices(), &set(&[1, 2]));
        assert_eq!(split.inner.indices(), &set(&[1]));
        assert_eq!(split.inner.kind(), ElementKind::Vertex);
    }

    #[test]
    fn row_split_of_empty_component_fails() {
        let (store, mesh) = store_with(plane_2x2());
        let empty = Component::create(&store, mesh, ElementKind::Edge);
        assert!(outer_and_inner_edges(&empty).is_err());
    }

    #[test]
    fn open_chain_order() {
        let order = vert_order_on_edge_row(&[[2, 3], [0, 1], [1, 2]]).unwrap();
        assert_eq!(order, vec![3, 2, 1, 0]);
    }

    #[test]
    fn closed_loop_order() {
        let order = vert_order_on_edge_row(&[[0, 1], [2, 3], [3, 0], [1, 2]]).unwrap();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn rejects_branches_and_gaps() {
        assert!(matches!(
            vert_order_on_edge_row(&[[0, 1], [0, 2], [0, 3]]),
            Err(PolycompError::Topology(TopologyError::NotAChain(_)))
        ));
        assert!(matches!(
            vert_order_on_edge_row(&[[0, 1], [2, 3]]),
            Err(PolycompError::Topology(TopologyError::NotAChain(_)))
        ));
        // A closed triangle plus a separate closed triangle.
        assert!(vert_order_on_edge_row(&[[0, 1], [1, 2], [2, 0], [3, 4], [4, 5], [5, 3]]).is_err());
        assert!(vert_order_on_edge_row(&[]).unwrap().is_empty());
    }
}
